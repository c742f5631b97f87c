// Copyright (c) 2026 Spring83
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! A newline-delimited file of banned public keys, read as a sequence of
//! fixed 65-byte records (`{64 hex chars}\n`).

use std::fs;
use std::path::Path;

const RECORD_LEN: usize = 65;
const KEY_HEX_LEN: usize = 64;

/// A denylist backed by a flat file.
pub struct Denylist;

impl Denylist {
    /// Is `pubkey_hex` present in the denylist at `path`? A missing file is
    /// not an error — it means "nothing is denied."
    pub fn contains(path: &Path, pubkey_hex: &str) -> std::io::Result<bool> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if pubkey_hex.len() != KEY_HEX_LEN {
            return Ok(false);
        }
        let needle = pubkey_hex.as_bytes();

        Ok(bytes.chunks(RECORD_LEN).any(|record| record.len() == RECORD_LEN && &record[..KEY_HEX_LEN] == needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_denylist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("denylist.txt");
        assert!(!Denylist::contains(&path, &"a".repeat(64)).unwrap());
    }

    #[test]
    fn finds_banned_key_among_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("denylist.txt");
        let banned = "b".repeat(64);
        let other = "c".repeat(64);
        let contents = format!("{other}\n{banned}\n");
        fs::write(&path, contents).unwrap();

        assert!(Denylist::contains(&path, &banned).unwrap());
        assert!(Denylist::contains(&path, &other).unwrap());
        assert!(!Denylist::contains(&path, &"d".repeat(64)).unwrap());
    }
}
