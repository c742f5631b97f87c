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

//! `key [threads]` — search for a conforming keypair and print it. The
//! public half goes to stdout, the secret half to stderr, so a caller
//! piping only stdout never captures the secret.

use anyhow::Result;
use tracing::debug;

use crate::core::key;
use crate::monitoring::Metrics;

/// Generate and print a conforming keypair.
pub fn run(args: &[String]) -> Result<()> {
    let threads = args
        .first()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let metrics = Metrics::default();
    let keypair = key::generate_conforming(threads);
    metrics.keys_generated_total.inc();

    println!("{}", keypair.public_hex());
    eprintln!("{}", keypair.secret_hex());
    debug!(keys_generated = metrics.keys_generated_total.get(), "key search complete");
    Ok(())
}
