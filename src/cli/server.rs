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

//! `server [--port <u16>] [--board-dir <path>] [--denylist <path>]
//! [--index <path>] [--slots <n>]`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ServerConfig;
use crate::handler::RequestHandler;
use crate::monitoring::Metrics;
use crate::net::NetCore;
use crate::store::BoardStore;

/// Run the server until interrupted.
pub fn run(args: &[String]) -> Result<()> {
    let config = ServerConfig::from_env_and_args(args);

    let store = BoardStore::open(&config.board_dir)
        .with_context(|| format!("CreateDirFailed: {}", config.board_dir.display()))?;
    let metrics = Arc::new(Metrics::default());
    let handler = RequestHandler::new(
        store,
        config.denylist_path.clone(),
        config.index_path.clone(),
        Arc::clone(&metrics),
    );

    let mut net = NetCore::bind(config.port, config.slot_count, Arc::clone(&metrics))
        .with_context(|| format!("BindFailed: 0.0.0.0:{}", config.port))?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::Release)).context("failed to install Ctrl-C handler")?;

    info!(
        port = config.port,
        board_dir = %config.board_dir.display(),
        slots = config.slot_count,
        "spring83 server starting"
    );

    net.run(&handler, &running).context("ListenFailed: event loop exited with an error")?;

    info!("spring83 server stopped");
    Ok(())
}
