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

//! A single-threaded, readiness-driven event loop over a fixed pool of
//! client slots. `mio` multiplexes onto epoll/kqueue/IOCP depending on
//! platform, giving one loop structure instead of maintaining separate
//! Windows/Linux completion-queue variants.

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use tracing::{info, warn};

use crate::handler::RequestHandler;
use crate::monitoring::Metrics;
use crate::net::http::{self, Response};
use crate::net::slot::{ClientSlot, SlotState};

const LISTENER_TOKEN: Token = Token(usize::MAX);
const POLL_TIMEOUT: Duration = Duration::from_millis(200);
const STATUS_INTERVAL: Duration = Duration::from_secs(5);
const SLOT_DEADLINE: Duration = Duration::from_secs(30);

/// The event loop: a listener, a poller, and a fixed pool of slots indexed
/// by `mio::Token`. A `None` entry is a free slot available to the next
/// `accept`.
pub struct NetCore {
    listener: TcpListener,
    poll: Poll,
    events: Events,
    slots: Vec<Option<ClientSlot>>,
    metrics: Arc<Metrics>,
}

impl NetCore {
    /// Bind `0.0.0.0:{port}` and build a pool of `slot_count` free slots.
    pub fn bind(port: u16, slot_count: usize, metrics: Arc<Metrics>) -> io::Result<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let mut listener = TcpListener::bind(addr)?;

        let poll = Poll::new()?;
        poll.registry().register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        Ok(Self {
            listener,
            poll,
            events: Events::with_capacity(1024),
            slots: (0..slot_count).map(|_| None).collect(),
            metrics,
        })
    }

    /// Run until `running` is cleared (typically by a `ctrlc` handler).
    pub fn run(&mut self, handler: &RequestHandler, running: &AtomicBool) -> io::Result<()> {
        let mut last_status = Instant::now();

        while running.load(Ordering::Acquire) {
            self.poll.poll(&mut self.events, Some(POLL_TIMEOUT))?;

            let tokens: Vec<Token> = self.events.iter().map(|e| e.token()).collect();
            for token in tokens {
                if token == LISTENER_TOKEN {
                    self.accept_all()?;
                } else {
                    self.service_slot(token.0, handler);
                }
            }

            self.reap_stuck_slots();

            if last_status.elapsed() >= STATUS_INTERVAL {
                info!(metrics = %self.metrics.summary(), "status");
                last_status = Instant::now();
            }
        }

        Ok(())
    }

    fn accept_all(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, _addr)) => match self.free_slot_index() {
                    Some(idx) => {
                        self.poll.registry().register(&mut stream, Token(idx), Interest::READABLE)?;
                        self.slots[idx] = Some(ClientSlot::accepted(stream));
                    }
                    None => drop(stream),
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn free_slot_index(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    fn service_slot(&mut self, idx: usize, handler: &RequestHandler) {
        let state = match self.slots.get(idx).and_then(|s| s.as_ref()) {
            Some(slot) => slot.state,
            None => return,
        };
        match state {
            SlotState::Reading => self.do_read(idx, handler),
            SlotState::Writing => self.do_write(idx),
            SlotState::Disconnecting => self.close_slot(idx),
        }
    }

    fn do_read(&mut self, idx: usize, handler: &RequestHandler) {
        loop {
            let outcome = {
                let slot = match self.slots[idx].as_mut() {
                    Some(s) => s,
                    None => return,
                };
                if slot.read_len >= slot.read_buf.len() {
                    None
                } else {
                    Some(slot.stream.read(&mut slot.read_buf[slot.read_len..]))
                }
            };

            match outcome {
                None => {
                    self.force_close(idx, "request exceeded the read buffer");
                    return;
                }
                Some(Ok(0)) => {
                    self.close_slot(idx);
                    return;
                }
                Some(Ok(n)) => {
                    self.slots[idx].as_mut().unwrap().read_len += n;
                }
                Some(Err(e)) if e.kind() == io::ErrorKind::WouldBlock => break,
                Some(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Some(Err(_)) => {
                    self.force_close(idx, "read error");
                    return;
                }
            }
        }

        let response = {
            let slot = match self.slots[idx].as_ref() {
                Some(s) => s,
                None => return,
            };
            match http::parse(&slot.read_buf[..slot.read_len]) {
                Ok(http::ParseOutcome::Incomplete) => None,
                Ok(http::ParseOutcome::Complete(request)) => {
                    self.metrics.requests_total.inc();
                    Some(handler.handle(&request))
                }
                Err(_) => Some(Response::new(400)),
            }
        };

        if let Some(response) = response {
            self.metrics.record_status(response.status());
            if let Some(slot) = self.slots[idx].as_mut() {
                response.write_into(&mut slot.write_buf);
                slot.write_pos = 0;
                slot.state = SlotState::Writing;
            }
            self.reregister(idx, Interest::WRITABLE);
        }
    }

    fn do_write(&mut self, idx: usize) {
        loop {
            let outcome = {
                let slot = match self.slots[idx].as_mut() {
                    Some(s) => s,
                    None => return,
                };
                if slot.write_pos >= slot.write_buf.len() {
                    None
                } else {
                    Some(slot.stream.write(&slot.write_buf[slot.write_pos..]))
                }
            };

            match outcome {
                None => {
                    if let Some(slot) = self.slots[idx].as_mut() {
                        slot.state = SlotState::Disconnecting;
                    }
                    self.close_slot(idx);
                    return;
                }
                Some(Ok(0)) => {
                    self.force_close(idx, "write returned zero bytes");
                    return;
                }
                Some(Ok(n)) => {
                    self.slots[idx].as_mut().unwrap().write_pos += n;
                }
                Some(Err(e)) if e.kind() == io::ErrorKind::WouldBlock => return,
                Some(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Some(Err(_)) => {
                    self.force_close(idx, "write error");
                    return;
                }
            }
        }
    }

    fn reregister(&mut self, idx: usize, interest: Interest) {
        if let Some(slot) = self.slots[idx].as_mut() {
            let _ = self.poll.registry().reregister(&mut slot.stream, Token(idx), interest);
        }
    }

    fn close_slot(&mut self, idx: usize) {
        if let Some(mut slot) = self.slots[idx].take() {
            let _ = self.poll.registry().deregister(&mut slot.stream);
        }
    }

    fn force_close(&mut self, idx: usize, reason: &str) {
        warn!(slot = idx, reason, "force-closing slot");
        self.metrics.slots_force_closed_total.inc();
        self.close_slot(idx);
    }

    fn reap_stuck_slots(&mut self) {
        let stuck: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.elapsed() > SLOT_DEADLINE))
            .map(|(i, _)| i)
            .collect();
        for idx in stuck {
            self.force_close(idx, "slot exceeded the stuck-connection deadline");
        }
    }
}
