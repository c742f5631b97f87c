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

//! The four external subcommands: `server`, `key`, `sign`, `push`.
//! Argument parsing is deliberately minimal (plain `--flag value` scanning)
//! since the wire protocol never depends on it.

pub mod key;
pub mod push;
pub mod server;
pub mod sign;

use anyhow::{bail, Result};

/// Dispatch on `args[0]`.
pub fn run(args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("server") => server::run(&args[1..]),
        Some("key") => key::run(&args[1..]),
        Some("sign") => sign::run(&args[1..]),
        Some("push") => push::run(&args[1..]),
        Some(other) => bail!("unknown subcommand '{other}'"),
        None => bail!("usage: spring83 <server|key|sign|push> [args]"),
    }
}
