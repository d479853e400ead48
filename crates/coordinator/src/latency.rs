// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A single-threaded retry queue for probes racing network latency.
//!
//! A just-broadcast transaction may not be visible to a backend for several
//! seconds. Rather than blocking a handler thread or spawning a thread per
//! probe, deferred lookups are queued as [`Waiter`]s and retried on a fixed
//! tick until they succeed, their deadline passes, or the queue is stopped.
//!
//! Ordering across waiters is not guaranteed. Stopping the queue preempts
//! any fire that has not yet happened on the current tick; a waiter whose
//! `try_fn` returned [`TickResult::Done`] is never invoked again.

use std::{
	sync::atomic::{AtomicBool, Ordering},
	time::{Duration, Instant},
};

use crossbeam::channel::{Receiver, Sender, unbounded};
use tracing::debug;

use crate::unix_ms_now;

/// Outcome of one waiter probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
	/// The probe did not complete; retry on the next tick.
	TryAgain,
	/// The probe finished (successfully or terminally); do not retry.
	Done,
}

/// A deferred probe with an absolute deadline
pub struct Waiter {
	/// Wall-clock expiry, ms UTC. Once passed, `expire_fn` runs instead of
	/// further retries.
	pub expiration: u64,
	pub try_fn: Box<dyn FnMut() -> TickResult + Send>,
	pub expire_fn: Box<dyn FnOnce() + Send>,
}

/// Single-consumer ticker queue of [`Waiter`]s
///
/// `wait` may be called from any thread; `run` must be driven by exactly one
/// thread and returns when [`stop`](TickerQueue::stop) is called.
pub struct TickerQueue {
	intake_tx: Sender<Waiter>,
	intake_rx: Receiver<Waiter>,
	interval: Duration,
	stopped: AtomicBool,
}

impl TickerQueue {
	pub fn new(recheck_interval: Duration) -> Self {
		let (intake_tx, intake_rx) = unbounded();
		TickerQueue {
			intake_tx,
			intake_rx,
			interval: recheck_interval,
			stopped: AtomicBool::new(false),
		}
	}

	/// Enqueue a waiter. The first probe runs on the next tick.
	pub fn wait(&self, waiter: Waiter) {
		// The receiver lives as long as the queue, so this cannot fail.
		let _ = self.intake_tx.send(waiter);
	}

	/// Run the tick loop until stopped. Pending waiters are dropped without
	/// firing when the queue stops.
	pub fn run(&self) {
		let mut waiters: Vec<Waiter> = Vec::new();
		loop {
			// Sleep one interval, collecting new waiters as they arrive and
			// watching for stop.
			let deadline = Instant::now() + self.interval;
			loop {
				if self.stopped.load(Ordering::Relaxed) {
					debug!(pending = waiters.len(), "Coin waiter queue stopped");
					return;
				}
				let remaining = deadline.saturating_duration_since(Instant::now());
				if remaining.is_zero() {
					break;
				}
				let slice = remaining.min(Duration::from_millis(50));
				if let Ok(w) = self.intake_rx.recv_timeout(slice) {
					waiters.push(w);
				}
			}

			let now = unix_ms_now();
			let mut keep = Vec::with_capacity(waiters.len());
			for mut w in waiters.drain(..) {
				if self.stopped.load(Ordering::Relaxed) {
					debug!("Coin waiter queue stopped mid-tick");
					return;
				}
				match (w.try_fn)() {
					TickResult::Done => {}
					TickResult::TryAgain => {
						if now >= w.expiration {
							(w.expire_fn)();
						} else {
							keep.push(w);
						}
					}
				}
			}
			waiters = keep;
		}
	}

	/// Stop the tick loop. Safe to call from any thread, idempotent.
	pub fn stop(&self) {
		self.stopped.store(true, Ordering::Relaxed);
	}
}
