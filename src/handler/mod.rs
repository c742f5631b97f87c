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

//! HTTP method dispatch: translates the wire request into the board
//! validation pipeline and maps domain errors to status codes.
//!
//! Ordering within `PUT` follows four rules: the reserved test key is
//! rejected outright, before the denylist is even consulted, since its
//! secret is public and a forged signature would otherwise sail through
//! every later check; the denylist is checked before any cryptographic
//! work; signature verification runs after the (cheap) board invariants so
//! malformed bodies fail fast; the existing-entry timestamp comparison runs
//! last so misbehaving clients get a precise diagnostic.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, warn};

use crate::core::board::{self, Board};
use crate::core::key::{self, ConformingKeyPair};
use crate::core::timestamp::Timestamp;
use crate::monitoring::Metrics;
use crate::net::http::{Request, Response};
use crate::store::{BoardStore, Denylist, StoreError};

const MAX_INDEX_LEN: usize = 2048;

fn load_index(path: &Path) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            bytes.truncate(MAX_INDEX_LEN);
            bytes
        }
        Err(e) => {
            warn!(?e, path = %path.display(), "failed to load static index; serving an empty body");
            Vec::new()
        }
    }
}

/// Ties together the store, denylist, and static index into the routing
/// table of `spec.md` §4.6.
pub struct RequestHandler {
    store: BoardStore,
    denylist_path: PathBuf,
    index: Vec<u8>,
    test_key: ConformingKeyPair,
    test_key_hex: String,
    metrics: Arc<Metrics>,
}

impl RequestHandler {
    /// Build a handler, eagerly loading the static index and deriving the
    /// reserved test keypair.
    pub fn new(store: BoardStore, denylist_path: PathBuf, index_path: PathBuf, metrics: Arc<Metrics>) -> Self {
        let index = load_index(&index_path);
        let test_key = key::test_keypair();
        let test_key_hex = test_key.public_hex();
        Self { store, denylist_path, index, test_key, test_key_hex, metrics }
    }

    /// Dispatch a parsed request to a response.
    pub fn handle(&self, req: &Request) -> Response {
        match req.method {
            "GET" => self.handle_get(req.path, req.header("if-modified-since")),
            "PUT" => self.handle_put(req.path, req.header("spring-signature"), req.body),
            "OPTIONS" => Self::handle_options(),
            _ => Response::new(405),
        }
    }

    fn handle_get(&self, path: &str, if_modified_since: Option<&str>) -> Response {
        let key_hex = path.trim_start_matches('/');

        if key_hex.is_empty() {
            return self.serve_index();
        }
        if key_hex.eq_ignore_ascii_case(&self.test_key_hex) {
            return self.serve_test_board();
        }

        let pubkey = match key::public_from_hex(key_hex) {
            Ok(k) => k,
            Err(_) => return Response::new(404),
        };
        if !key::is_valid(&pubkey) {
            return Response::new(404);
        }

        match Denylist::contains(&self.denylist_path, key_hex) {
            Ok(true) => return Response::new(404),
            Ok(false) => {}
            Err(e) => {
                error!(?e, key = key_hex, "denylist read failed");
                return Response::new(500);
            }
        }

        let (signature_hex, board) = match self.store.load(key_hex) {
            Ok(v) => v,
            Err(StoreError::NotFound) | Err(StoreError::Corrupted) => return Response::new(404),
            Err(StoreError::Io) => {
                error!(key = key_hex, "store read failed");
                return Response::new(500);
            }
        };

        let stored_ts = match board.get_timestamp() {
            Ok(t) => t,
            Err(_) => return Response::new(404),
        };

        if let Some(raw) = if_modified_since {
            if let Ok(ims) = Timestamp::parse(raw) {
                if ims.compare(&stored_ts) != std::cmp::Ordering::Less {
                    return Response::new(304).no_content_length();
                }
            }
        }

        Response::new(200)
            .with_header("Content-Type", "text/html;charset=utf-8")
            .with_header("Spring-Version", "83")
            .with_header("Spring-Signature", signature_hex)
            .with_body(board.as_bytes().to_vec())
    }

    fn serve_index(&self) -> Response {
        Response::new(200).with_header("Content-Type", "text/html").with_body(self.index.clone())
    }

    fn serve_test_board(&self) -> Response {
        let now = Timestamp::now().to_canonical_string();
        let content = format!(
            "<time datetime=\"{now}\">This is the Spring-83 reserved test key. Its secret is public; do not publish under it.</time>"
        )
        .into_bytes();

        let board = match Board::init(&content) {
            Ok(b) => b,
            Err(e) => {
                error!(?e, "reserved test board failed its own invariants");
                return Response::new(500);
            }
        };
        let signature = self.test_key.sign(board.as_bytes());

        Response::new(200)
            .with_header("Content-Type", "text/html;charset=utf-8")
            .with_header("Spring-Version", "83")
            .with_header("Spring-Signature", hex::encode(signature))
            .with_body(board.as_bytes().to_vec())
    }

    fn handle_put(&self, path: &str, signature_header: Option<&str>, body: &[u8]) -> Response {
        let key_hex = path.trim_start_matches('/');

        let signature_hex = match signature_header {
            Some(h) if !body.is_empty() => h,
            _ => return Response::new(400),
        };

        let pubkey = match key::public_from_hex(key_hex) {
            Ok(k) => k,
            Err(_) => return Response::new(403),
        };
        if key::keys_equal(&pubkey, self.test_key.public()) {
            return Response::new(403);
        }

        match Denylist::contains(&self.denylist_path, key_hex) {
            Ok(true) => return Response::new(403),
            Ok(false) => {}
            Err(e) => {
                error!(?e, key = key_hex, "denylist read failed");
                return Response::new(500);
            }
        }

        if body.len() > board::MAX_BOARD_LEN {
            return Response::new(413);
        }

        let new_board = match Board::init(body) {
            Ok(b) => b,
            Err(_) => return Response::new(400),
        };

        if !key::is_valid(&pubkey) {
            return Response::new(403);
        }
        if new_board.verify_signature(signature_hex, &pubkey).is_err() {
            return Response::new(403);
        }

        match self.store.load(key_hex) {
            Ok((_, existing)) => {
                let existing_ts = existing.get_timestamp().expect("a stored board was validated when written");
                let new_ts = new_board.get_timestamp().expect("checked by Board::init above");
                if existing_ts.compare(&new_ts) != std::cmp::Ordering::Less {
                    return Response::new(409);
                }
            }
            Err(StoreError::NotFound) | Err(StoreError::Corrupted) => {}
            Err(StoreError::Io) => {
                error!(key = key_hex, "store read failed");
                return Response::new(500);
            }
        }

        match self.store.replace(key_hex, signature_hex, &new_board) {
            Ok(()) => {
                self.metrics.boards_stored_total.inc();
                Response::new(201)
            }
            Err(e) => {
                error!(?e, key = key_hex, "store write failed");
                Response::new(500)
            }
        }
    }

    fn handle_options() -> Response {
        Response::new(204)
            .with_header("Access-Control-Allow-Methods", "GET, OPTIONS, PUT")
            .with_header("Access-Control-Allow-Origin", "*")
            .with_header("Access-Control-Allow-Headers", "Content-Type, If-Modified-Since, Spring-Signature, Spring-Version")
            .with_header("Access-Control-Expose-Headers", "Content-Type, Last-Modified, Spring-Signature, Spring-Version")
            .no_content_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::http::{self, ParseOutcome};

    fn handler_in(dir: &std::path::Path) -> RequestHandler {
        let store = BoardStore::open(dir.join("boards")).unwrap();
        RequestHandler::new(store, dir.join("denylist.txt"), dir.join("index.html"), Arc::new(Metrics::default()))
    }

    fn parse<'a>(raw: &'a [u8]) -> Request<'a> {
        match http::parse(raw).unwrap() {
            ParseOutcome::Complete(r) => r,
            ParseOutcome::Incomplete => panic!("expected a complete request"),
        }
    }

    #[test]
    fn get_root_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<h1>hi</h1>").unwrap();
        let handler = handler_in(dir.path());

        let req = parse(b"GET / HTTP/1.1\r\n\r\n");
        let resp = handler.handle(&req);
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn get_test_key_returns_live_signed_board() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let test_key_hex = key::test_keypair().public_hex();

        let raw = format!("GET /{test_key_hex} HTTP/1.1\r\n\r\n");
        let req = parse(raw.as_bytes());
        let resp = handler.handle(&req);
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn put_under_test_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let test_key_hex = key::test_keypair().public_hex();

        let body = b"<time datetime=\"2024-06-01T00:00:00Z\">hi";
        let raw = format!(
            "PUT /{test_key_hex} HTTP/1.1\r\nSpring-Signature: {}\r\nContent-Length: {}\r\n\r\n",
            "ab".repeat(64),
            body.len()
        );
        let mut full = raw.into_bytes();
        full.extend_from_slice(body);

        let req = parse(&full);
        let resp = handler.handle(&req);
        assert_eq!(resp.status(), 403);
    }

    #[test]
    fn put_under_test_key_with_genuine_signature_is_still_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let test_kp = key::test_keypair();

        let body = b"<time datetime=\"2024-06-01T00:00:00Z\">forged";
        let board = Board::init(body).unwrap();
        let sig_hex = hex::encode(test_kp.sign(board.as_bytes()));
        let raw = format!(
            "PUT /{} HTTP/1.1\r\nSpring-Signature: {sig_hex}\r\nContent-Length: {}\r\n\r\n",
            test_kp.public_hex(),
            body.len()
        );
        let mut full = raw.into_bytes();
        full.extend_from_slice(body);

        let resp = handler.handle(&parse(&full));
        assert_eq!(resp.status(), 403);
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let kp = key::generate_conforming(2);
        let body = b"<time datetime=\"2024-06-01T00:00:00Z\">hello";
        let board = Board::init(body).unwrap();
        let sig_hex = hex::encode(kp.sign(board.as_bytes()));

        let put_raw = format!(
            "PUT /{} HTTP/1.1\r\nSpring-Signature: {sig_hex}\r\nContent-Length: {}\r\n\r\n",
            kp.public_hex(),
            body.len()
        );
        let mut put_full = put_raw.into_bytes();
        put_full.extend_from_slice(body);
        let put_resp = handler.handle(&parse(&put_full));
        assert_eq!(put_resp.status(), 201);

        let get_raw = format!("GET /{} HTTP/1.1\r\n\r\n", kp.public_hex());
        let get_resp = handler.handle(&parse(get_raw.as_bytes()));
        assert_eq!(get_resp.status(), 200);
    }

    #[test]
    fn put_older_timestamp_after_newer_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let kp = key::generate_conforming(2);

        let put = |body: &[u8]| {
            let board = Board::init(body).unwrap();
            let sig_hex = hex::encode(kp.sign(board.as_bytes()));
            let raw = format!(
                "PUT /{} HTTP/1.1\r\nSpring-Signature: {sig_hex}\r\nContent-Length: {}\r\n\r\n",
                kp.public_hex(),
                body.len()
            );
            let mut full = raw.into_bytes();
            full.extend_from_slice(body);
            handler.handle(&parse(&full)).status()
        };

        assert_eq!(put(b"<time datetime=\"2024-06-01T00:00:00Z\">newer"), 201);
        assert_eq!(put(b"<time datetime=\"2024-05-01T00:00:00Z\">older"), 409);
    }

    #[test]
    fn put_with_non_conforming_key_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let body = b"<time datetime=\"2024-06-01T00:00:00Z\">hi";
        let raw = format!(
            "PUT /{} HTTP/1.1\r\nSpring-Signature: {}\r\nContent-Length: {}\r\n\r\n",
            "00".repeat(32),
            "ab".repeat(64),
            body.len()
        );
        let mut full = raw.into_bytes();
        full.extend_from_slice(body);
        assert_eq!(handler.handle(&parse(&full)).status(), 403);
    }

    #[test]
    fn put_over_max_len_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let kp = key::generate_conforming(2);
        let body = vec![b'x'; board::MAX_BOARD_LEN + 1];
        let raw = format!(
            "PUT /{} HTTP/1.1\r\nSpring-Signature: {}\r\nContent-Length: {}\r\n\r\n",
            kp.public_hex(),
            "ab".repeat(64),
            body.len()
        );
        let mut full = raw.into_bytes();
        full.extend_from_slice(&body);
        assert_eq!(handler.handle(&parse(&full)).status(), 413);
    }

    #[test]
    fn options_returns_exact_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        let resp = handler.handle(&parse(b"OPTIONS /anything HTTP/1.1\r\n\r\n"));
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.header("Access-Control-Allow-Methods"), Some("GET, OPTIONS, PUT"));
        assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
        assert!(resp.header("Access-Control-Allow-Headers").is_some());
        assert!(resp.header("Access-Control-Expose-Headers").is_some());
    }

    #[test]
    fn unknown_method_is_405() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(dir.path());
        assert_eq!(handler.handle(&parse(b"DELETE / HTTP/1.1\r\n\r\n")).status(), 405);
    }
}
