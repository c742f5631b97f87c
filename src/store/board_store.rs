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

//! A flat directory of `{board_dir}/{pubkey_hex}` files, each holding a
//! 128-char hex signature, a newline, then the raw board bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::board::Board;

const SIGNATURE_HEX_LEN: usize = 128;

/// Board-store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry exists for the requested key.
    #[error("no stored board for this key")]
    NotFound,
    /// The entry exists but its on-disk shape is invalid (missing the
    /// signature/newline header, or its tail fails board validation).
    #[error("stored entry is corrupted")]
    Corrupted,
    /// An I/O error other than "file does not exist".
    #[error("storage io error")]
    Io,
}

/// Filesystem-backed board store.
pub struct BoardStore {
    board_dir: PathBuf,
}

impl BoardStore {
    /// Open (and create, if absent) the board directory.
    pub fn open(board_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let board_dir = board_dir.into();
        fs::create_dir_all(&board_dir)?;
        Ok(Self { board_dir })
    }

    fn path_for(&self, pubkey_hex: &str) -> PathBuf {
        self.board_dir.join(pubkey_hex)
    }

    /// Does a stored entry exist for this key (without validating it)?
    pub fn exists(&self, pubkey_hex: &str) -> bool {
        self.path_for(pubkey_hex).is_file()
    }

    /// Load the stored `(signature_hex, board)` pair for `pubkey_hex`.
    pub fn load(&self, pubkey_hex: &str) -> Result<(String, Board), StoreError> {
        let bytes = match fs::read(self.path_for(pubkey_hex)) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(_) => return Err(StoreError::Io),
        };

        if bytes.len() < SIGNATURE_HEX_LEN + 1 || bytes[SIGNATURE_HEX_LEN] != b'\n' {
            return Err(StoreError::Corrupted);
        }

        let sig_hex = std::str::from_utf8(&bytes[..SIGNATURE_HEX_LEN])
            .map_err(|_| StoreError::Corrupted)?
            .to_string();

        let board = Board::init(&bytes[SIGNATURE_HEX_LEN + 1..]).map_err(|_| StoreError::Corrupted)?;

        Ok((sig_hex, board))
    }

    /// Atomically replace (or create) the entry for `pubkey_hex`.
    pub fn replace(&self, pubkey_hex: &str, signature_hex: &str, board: &Board) -> Result<(), StoreError> {
        if signature_hex.len() != SIGNATURE_HEX_LEN {
            return Err(StoreError::Corrupted);
        }

        let final_path = self.path_for(pubkey_hex);
        let mut tmp_path = final_path.clone();
        tmp_path.set_extension("tmp");

        {
            let mut f = fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&tmp_path)
                .map_err(|_| StoreError::Io)?;
            f.write_all(signature_hex.as_bytes()).map_err(|_| StoreError::Io)?;
            f.write_all(b"\n").map_err(|_| StoreError::Io)?;
            f.write_all(board.as_bytes()).map_err(|_| StoreError::Io)?;
            f.sync_all().map_err(|_| StoreError::Io)?;
        }

        fs::rename(&tmp_path, &final_path).map_err(|_| StoreError::Io)?;
        Ok(())
    }

    /// The directory this store reads and writes.
    pub fn board_dir(&self) -> &Path {
        &self.board_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board(time: &str) -> Board {
        let content = format!("<time datetime=\"{time}\">hi").into_bytes();
        Board::init(&content).unwrap()
    }

    #[test]
    fn replace_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path()).unwrap();
        let board = sample_board("2024-06-01T00:00:00Z");
        let sig_hex = "ab".repeat(64);

        store.replace("deadbeef", &sig_hex, &board).unwrap();
        assert!(store.exists("deadbeef"));

        let (loaded_sig, loaded_board) = store.load("deadbeef").unwrap();
        assert_eq!(loaded_sig, sig_hex);
        assert_eq!(loaded_board.as_bytes(), board.as_bytes());
    }

    #[test]
    fn load_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path()).unwrap();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound)));
    }

    #[test]
    fn load_without_header_newline_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("badkey"), b"not a valid header at all").unwrap();
        assert!(matches!(store.load("badkey"), Err(StoreError::Corrupted)));
    }

    #[test]
    fn replace_overwrites_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path()).unwrap();
        let sig_hex = "cd".repeat(64);

        store.replace("k", &sig_hex, &sample_board("2024-06-01T00:00:00Z")).unwrap();
        store.replace("k", &sig_hex, &sample_board("2024-07-01T00:00:00Z")).unwrap();

        let (_, board) = store.load("k").unwrap();
        assert_eq!(board.get_timestamp().unwrap().to_canonical_string(), "2024-07-01T00:00:00Z");
    }
}
