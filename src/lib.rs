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

//! Spring-83 server core.
//!
//! This crate provides:
//! - Timestamp, key, and board primitives with the protocol's validation
//!   invariants (`core`)
//! - A flat-file board store and a denylist reader (`store`)
//! - A single-threaded, completion-style TCP event loop (`net`)
//! - The request-handling state machine that ties the above together
//!   (`handler`)
//! - In-process metrics and CLI subcommand glue (`monitoring`, `cli`)

/// Protocol primitives: timestamps, keys, boards.
pub mod core;
/// Filesystem-backed board storage and the denylist reader.
pub mod store;
/// Completion-style TCP event loop and HTTP parsing.
pub mod net;
/// Request dispatch and domain-error-to-status-code mapping.
pub mod handler;
/// In-process metrics counters.
pub mod monitoring;
/// Runtime configuration.
pub mod config;
/// CLI subcommand implementations (`server`, `key`, `sign`, `push`).
pub mod cli;
