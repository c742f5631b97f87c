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

//! In-process counters, logged periodically by the event loop. There is no
//! HTTP exporter surface: the protocol's routing table (see `handler`)
//! leaves no path free for a `/metrics` endpoint without breaking the
//! closed set of documented responses.

use std::sync::atomic::{AtomicU64, Ordering};

/// A single named counter.
#[derive(Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Increment by one.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Server-wide metrics, shared by `net` and `handler`.
#[derive(Default)]
pub struct Metrics {
    /// Total HTTP requests accepted and parsed.
    pub requests_total: Counter,
    /// Responses in `2xx`.
    pub responses_2xx_total: Counter,
    /// Responses in `3xx`.
    pub responses_3xx_total: Counter,
    /// Responses in `4xx`.
    pub responses_4xx_total: Counter,
    /// Responses in `5xx`.
    pub responses_5xx_total: Counter,
    /// Successful `PUT`s that stored a new board.
    pub boards_stored_total: Counter,
    /// Slots force-closed due to a syscall error or stuck state.
    pub slots_force_closed_total: Counter,
    /// Conforming keys found by `key::generate_conforming` across this
    /// process's lifetime (only non-zero for the `key` CLI subcommand).
    pub keys_generated_total: Counter,
}

impl Metrics {
    /// Record a response's status code against the correct bucket.
    pub fn record_status(&self, status: u16) {
        match status {
            200..=299 => self.responses_2xx_total.inc(),
            300..=399 => self.responses_3xx_total.inc(),
            400..=499 => self.responses_4xx_total.inc(),
            500..=599 => self.responses_5xx_total.inc(),
            _ => {}
        }
    }

    /// One-line summary suitable for a periodic `info!` log.
    pub fn summary(&self) -> String {
        format!(
            "requests={} 2xx={} 3xx={} 4xx={} 5xx={} boards_stored={} slots_force_closed={}",
            self.requests_total.get(),
            self.responses_2xx_total.get(),
            self.responses_3xx_total.get(),
            self.responses_4xx_total.get(),
            self.responses_5xx_total.get(),
            self.boards_stored_total.get(),
            self.slots_force_closed_total.get(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_status_buckets_correctly() {
        let m = Metrics::default();
        m.record_status(201);
        m.record_status(404);
        m.record_status(500);
        assert_eq!(m.responses_2xx_total.get(), 1);
        assert_eq!(m.responses_4xx_total.get(), 1);
        assert_eq!(m.responses_5xx_total.get(), 1);
    }
}
