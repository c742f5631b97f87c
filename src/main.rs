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

//! `spring83 <server|key|sign|push> [args]`

use std::process::ExitCode;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt().with_target(false).with_level(true).compact().try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = spring83::cli::run(&args) {
        eprintln!("spring83: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
