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

//! Protocol primitives: timestamps, Ed25519 keys, and boards.

pub mod board;
pub mod key;
pub mod timestamp;

pub use board::Board;
pub use key::{ConformingKeyPair, KeyMonthYear};
pub use timestamp::Timestamp;
