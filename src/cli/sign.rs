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

//! `sign --board <path> --key-file <path> [--append-timestamp]`

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::core::board::{self, Board};
use crate::core::key::{self, ConformingKeyPair};
use crate::core::timestamp::Timestamp;

struct Args {
    board: PathBuf,
    key_file: PathBuf,
    append_timestamp: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut board = None;
    let mut key_file = None;
    let mut append_timestamp = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--board" => {
                board = args.get(i + 1).cloned();
                i += 2;
            }
            "--key-file" => {
                key_file = args.get(i + 1).cloned();
                i += 2;
            }
            "--append-timestamp" => {
                append_timestamp = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    Ok(Args {
        board: board.map(PathBuf::from).context("missing --board")?,
        key_file: key_file.map(PathBuf::from).context("missing --key-file")?,
        append_timestamp,
    })
}

/// Sign a board file, printing the 128-hex signature to stdout.
pub fn run(args: &[String]) -> Result<()> {
    let args = parse_args(args)?;

    let mut content = std::fs::read(&args.board).with_context(|| format!("failed to read {}", args.board.display()))?;
    if args.append_timestamp && !board::has_time_element(&content) {
        let mut stamped = format!("<time datetime=\"{}\">", Timestamp::now().to_canonical_string()).into_bytes();
        stamped.extend_from_slice(&content);
        content = stamped;
    }

    let secret_hex = std::fs::read_to_string(&args.key_file)
        .with_context(|| format!("failed to read {}", args.key_file.display()))?;
    let secret = key::secret_from_hex(secret_hex.trim()).map_err(|_| anyhow!("malformed key file"))?;
    let keypair = ConformingKeyPair::from_seed_unchecked(secret).map_err(|_| anyhow!("invalid secret key"))?;

    let board = Board::init(&content).map_err(|e| anyhow!("board failed validation: {e}"))?;
    println!("{}", hex::encode(keypair.sign(board.as_bytes())));
    Ok(())
}
