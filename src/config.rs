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

//! Runtime configuration: `--flag` overrides environment variables, which
//! override built-in defaults.

use std::path::PathBuf;

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to bind.
    pub port: u16,
    /// Directory holding one file per stored board.
    pub board_dir: PathBuf,
    /// Path to the denylist file (missing is treated as empty).
    pub denylist_path: PathBuf,
    /// Path to the static index page served at `GET /`.
    pub index_path: PathBuf,
    /// Number of long-lived client slots in the event loop's pool.
    pub slot_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 1783,
            board_dir: PathBuf::from("./data/boards"),
            denylist_path: PathBuf::from("./data/denylist.txt"),
            index_path: PathBuf::from("./static/index.html"),
            slot_count: 256,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_path_or(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

impl ServerConfig {
    /// Resolve from environment variables, then apply `args` (already-split
    /// `--flag value` pairs) on top.
    pub fn from_env_and_args(args: &[String]) -> Self {
        let defaults = Self::default();
        let mut cfg = Self {
            port: env_or("SPRING83_PORT", defaults.port),
            board_dir: env_path_or("SPRING83_BOARD_DIR", defaults.board_dir),
            denylist_path: env_path_or("SPRING83_DENYLIST", defaults.denylist_path),
            index_path: env_path_or("SPRING83_INDEX", defaults.index_path),
            slot_count: env_or("SPRING83_SLOTS", defaults.slot_count),
        };

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1);
            match (flag, value) {
                ("--port", Some(v)) => {
                    if let Ok(p) = v.parse() {
                        cfg.port = p;
                    }
                    i += 2;
                }
                ("--board-dir", Some(v)) => {
                    cfg.board_dir = PathBuf::from(v);
                    i += 2;
                }
                ("--denylist", Some(v)) => {
                    cfg.denylist_path = PathBuf::from(v);
                    i += 2;
                }
                ("--index", Some(v)) => {
                    cfg.index_path = PathBuf::from(v);
                    i += 2;
                }
                ("--slots", Some(v)) => {
                    if let Ok(n) = v.parse() {
                        cfg.slot_count = n;
                    }
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = vec!["--port".to_string(), "9999".to_string(), "--slots".to_string(), "16".to_string()];
        let cfg = ServerConfig::from_env_and_args(&args);
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.slot_count, 16);
    }
}
