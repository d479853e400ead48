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

//! Per-order active-swap accounting.
//!
//! The tracker decides when an order is "successfully complete": no active
//! swaps remain, the order is off the book, and no swap involving it was
//! aborted through its owner's fault. This feeds cancellation-rate
//! computation without per-event database queries.

use std::{collections::HashMap, sync::Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use bosun_sdk::types::OrderId;

/// Swap accounting state for one order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSwapStat {
	/// Number of currently active swaps involving the order.
	pub swap_count: i32,
	/// True once the order can take no further matches. Never transitions
	/// back to false.
	pub off_book: bool,
	/// True if any swap involving the order was aborted by its owner's
	/// fault, or the order was canceled mid-swap.
	pub has_failed: bool,
}

/// Tracks active swap counts and failure flags per order
#[derive(Debug, Default)]
pub struct OrderSwapTracker {
	orders: Mutex<HashMap<OrderId, OrderSwapStat>>,
}

impl OrderSwapTracker {
	pub fn new() -> Self {
		OrderSwapTracker::default()
	}

	/// Register a new active swap for the order, flagging it off-book when
	/// this is the order's final possible swap.
	pub fn inc_active(&self, oid: OrderId, off_book: bool) {
		let mut orders = self.orders.lock().unwrap();
		match orders.get_mut(&oid) {
			Some(stat) => {
				stat.swap_count += 1;
				// off_book never goes true -> false.
				stat.off_book = stat.off_book || off_book;
			}
			None => {
				orders.insert(
					oid,
					OrderSwapStat {
						swap_count: 1,
						off_book,
						has_failed: false,
					},
				);
			}
		}
	}

	/// Decrement the active swap count for a successfully settled swap.
	/// Returns true iff the order is now successfully complete.
	pub fn swap_success(&self, oid: OrderId) -> bool {
		self.dec_active(oid, false)
	}

	/// Decrement the active swap count for a swap aborted by the order
	/// owner's fault, flagging the order as failed.
	pub fn swap_failure(&self, oid: OrderId) {
		self.dec_active(oid, true);
	}

	/// Mark an order canceled. An existing entry is flagged off-book and
	/// failed so completion of concurrently active swaps cannot count the
	/// order as successful. No entry is created: a canceled order can have
	/// no future swaps, so callers must `inc_active` new matches before
	/// flagging cancellations.
	pub fn canceled(&self, oid: OrderId) {
		let mut orders = self.orders.lock().unwrap();
		if let Some(stat) = orders.get_mut(&oid) {
			stat.off_book = true;
			stat.has_failed = true;
		}
	}

	fn dec_active(&self, oid: OrderId, failed: bool) -> bool {
		let mut orders = self.orders.lock().unwrap();
		let Some(stat) = orders.get_mut(&oid) else {
			// Already settled and removed; completion was reported then.
			warn!(order = %oid, "decrementing untracked order");
			return false;
		};

		stat.has_failed = stat.has_failed || failed;

		stat.swap_count -= 1;
		if stat.swap_count != 0 {
			return false;
		}

		let stat = *stat;
		// Drop the entry unless a failure must survive to punish a later
		// cancellation of the still-booked order.
		if !stat.has_failed || stat.off_book {
			orders.remove(&oid);
		}

		stat.off_book && !stat.has_failed
	}

	/// Export the stats map for the state snapshot.
	pub fn export(&self) -> HashMap<OrderId, OrderSwapStat> {
		self.orders.lock().unwrap().clone()
	}

	/// Replace the stats map from a restored snapshot.
	pub fn restore(&self, stats: HashMap<OrderId, OrderSwapStat>) {
		*self.orders.lock().unwrap() = stats;
	}

	#[cfg(test)]
	fn get(&self, oid: OrderId) -> Option<OrderSwapStat> {
		self.orders.lock().unwrap().get(&oid).copied()
	}
}
