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

//! `push --server <host> --port <u16> --board <path> --key-file <path>`

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::core::board::Board;
use crate::core::key::{self, ConformingKeyPair};

struct Args {
    server: String,
    port: u16,
    board: PathBuf,
    key_file: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut server = None;
    let mut port = None;
    let mut board = None;
    let mut key_file = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                server = args.get(i + 1).cloned();
                i += 2;
            }
            "--port" => {
                port = args.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "--board" => {
                board = args.get(i + 1).cloned();
                i += 2;
            }
            "--key-file" => {
                key_file = args.get(i + 1).cloned();
                i += 2;
            }
            _ => i += 1,
        }
    }

    Ok(Args {
        server: server.context("missing --server")?,
        port: port.context("missing or invalid --port")?,
        board: board.map(PathBuf::from).context("missing --board")?,
        key_file: key_file.map(PathBuf::from).context("missing --key-file")?,
    })
}

/// Sign a board and PUT it to a running server, printing the status line.
pub fn run(args: &[String]) -> Result<()> {
    let args = parse_args(args)?;

    let content = std::fs::read(&args.board).with_context(|| format!("failed to read {}", args.board.display()))?;
    let secret_hex = std::fs::read_to_string(&args.key_file)
        .with_context(|| format!("failed to read {}", args.key_file.display()))?;
    let secret = key::secret_from_hex(secret_hex.trim()).map_err(|_| anyhow!("malformed key file"))?;
    let keypair = ConformingKeyPair::from_seed_unchecked(secret).map_err(|_| anyhow!("invalid secret key"))?;

    let board = Board::init(&content).map_err(|e| anyhow!("board failed validation: {e}"))?;
    let signature_hex = hex::encode(keypair.sign(board.as_bytes()));

    let request = format!(
        "PUT /{} HTTP/1.1\r\nHost: {}\r\nSpring-Signature: {signature_hex}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        keypair.public_hex(),
        args.server,
        board.as_bytes().len(),
    );

    let mut stream = TcpStream::connect((args.server.as_str(), args.port))
        .with_context(|| format!("failed to connect to {}:{}", args.server, args.port))?;
    stream.write_all(request.as_bytes())?;
    stream.write_all(board.as_bytes())?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    let status_line = response
        .split(|&b| b == b'\n')
        .next()
        .map(|line| String::from_utf8_lossy(line).trim().to_string())
        .unwrap_or_default();
    println!("{status_line}");
    Ok(())
}
