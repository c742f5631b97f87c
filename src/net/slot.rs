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

//! A single client slot. `accepting` is represented by the slot pool
//! holding `None` rather than by a state on this struct — see
//! [`crate::net::server::NetCore`].

use std::time::Instant;

use mio::net::TcpStream;

/// Size of a slot's fixed read buffer.
pub const READ_BUF_LEN: usize = 4096;

/// Where a slot is in its `reading -> writing -> disconnecting` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Waiting for (more of) the request to arrive.
    Reading,
    /// Waiting to flush the response.
    Writing,
    /// Response flushed; waiting to be torn down and returned to the pool.
    Disconnecting,
}

/// A single occupied client connection.
pub struct ClientSlot {
    /// The underlying non-blocking socket.
    pub stream: TcpStream,
    /// Current lifecycle state.
    pub state: SlotState,
    /// Fixed-size request buffer, reused across reads within one request.
    pub read_buf: [u8; READ_BUF_LEN],
    /// Number of valid bytes at the front of `read_buf`.
    pub read_len: usize,
    /// Response bytes pending write; cleared and refilled per request.
    pub write_buf: Vec<u8>,
    /// Number of bytes of `write_buf` already flushed to the socket.
    pub write_pos: usize,
    start_ts: Instant,
}

impl ClientSlot {
    /// Build a freshly-accepted slot, ready to read.
    pub fn accepted(stream: TcpStream) -> Self {
        Self {
            stream,
            state: SlotState::Reading,
            read_buf: [0u8; READ_BUF_LEN],
            read_len: 0,
            write_buf: Vec::new(),
            write_pos: 0,
            start_ts: Instant::now(),
        }
    }

    /// How long this slot has been occupied, for the stuck-slot deadline.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_ts.elapsed()
    }
}
