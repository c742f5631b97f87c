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

//! Boards: fixed-capacity signed HTML documents carrying an embedded
//! `<time datetime="...">` element.

use thiserror::Error;

use crate::core::key::{self, KeyError};
use crate::core::timestamp::{InvalidTimestamp, Timestamp};

/// Maximum board content length, in bytes.
pub const MAX_BOARD_LEN: usize = 2217;

const TIME_TAG_PREFIX: &[u8] = b"<time datetime=\"";

/// Board creation and signature-verification failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Content exceeded [`MAX_BOARD_LEN`].
    #[error("board content too large")]
    TooLarge,
    /// No `<time datetime="...Z">` element was found, or its value failed
    /// to parse, or it names a time later than now.
    #[error("invalid or missing board timestamp")]
    InvalidTimestamp,
}

impl From<InvalidTimestamp> for BoardError {
    fn from(_: InvalidTimestamp) -> Self {
        BoardError::InvalidTimestamp
    }
}

/// A signature that failed to verify against its claimed public key.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature or key hex was malformed.
    #[error("malformed signature or key encoding")]
    Malformed,
    /// The signature did not verify.
    #[error("signature does not verify")]
    Invalid,
}

impl From<KeyError> for SignatureError {
    fn from(_: KeyError) -> Self {
        SignatureError::Malformed
    }
}

/// A Spring-83 board: up to [`MAX_BOARD_LEN`] bytes of HTML content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    content: Vec<u8>,
}

/// Does `content` already contain a `<time datetime="` element?
pub fn has_time_element(content: &[u8]) -> bool {
    content.windows(TIME_TAG_PREFIX.len()).any(|w| w == TIME_TAG_PREFIX)
}

impl Board {
    /// Validate and wrap `content` per the protocol's board invariants.
    pub fn init(content: &[u8]) -> Result<Self, BoardError> {
        if content.len() > MAX_BOARD_LEN {
            return Err(BoardError::TooLarge);
        }

        let board = Self { content: content.to_vec() };
        let ts = board.get_timestamp()?;

        let now = Timestamp::now();
        if ts.compare(&now) == std::cmp::Ordering::Greater {
            return Err(BoardError::InvalidTimestamp);
        }
        // The second conjunct (`ts > ts - 22 days`) is always true by
        // construction; it exists only as a placeholder for a future TTL
        // policy (see spec's open questions) and is intentionally not
        // given any other meaning here.
        let _ttl_floor = ts.add_days(-22);

        Ok(board)
    }

    /// Raw content bytes (length `<= MAX_BOARD_LEN`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Find the first `<time datetime="...">` element and parse its value.
    pub fn get_timestamp(&self) -> Result<Timestamp, BoardError> {
        let pos = self
            .content
            .windows(TIME_TAG_PREFIX.len())
            .position(|w| w == TIME_TAG_PREFIX)
            .ok_or(BoardError::InvalidTimestamp)?;

        let start = pos + TIME_TAG_PREFIX.len();
        let end = start.checked_add(20).ok_or(BoardError::InvalidTimestamp)?;
        if end > self.content.len() {
            return Err(BoardError::InvalidTimestamp);
        }

        let raw = std::str::from_utf8(&self.content[start..end]).map_err(|_| BoardError::InvalidTimestamp)?;
        Ok(Timestamp::parse(raw)?)
    }

    /// Verify `signature_hex` (128 hex chars) against `pubkey` over this
    /// board's content.
    pub fn verify_signature(&self, signature_hex: &str, pubkey: &[u8; 32]) -> Result<(), SignatureError> {
        let sig = key::signature_from_hex(signature_hex)?;
        if key::verify(pubkey, &self.content, &sig) {
            Ok(())
        } else {
            Err(SignatureError::Invalid)
        }
    }
}
