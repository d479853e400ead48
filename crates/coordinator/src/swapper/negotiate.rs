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

//! Match intake from the matching engine.
//!
//! `negotiate` records new matches, locks order funding coins, starts
//! settlement tracking, and solicits signed match acknowledgements from both
//! parties. Cancel-taker matches are settled immediately: the target order
//! is removed and no tracker is created.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error, warn};

use super::{MatchGuard, Swapper};
use crate::registry::MatchTracker;
use crate::storage::MarketMatchId;
use crate::unix_ms_now;
use bosun_sdk::msgs::{
	Acknowledgement, ErrorCode, MatchNote, Message, ResponsePayload, Route, Signable,
};
use bosun_sdk::types::{AccountId, AssetId, MatchSet, MatchSide, MatchStatus, Order, OrderId};

/// A party's pending `match` acknowledgement
pub(crate) struct MatchAcker {
	user: AccountId,
	tracker: Arc<MatchTracker>,
	note: MatchNote,
	is_maker: bool,
}

impl Swapper {
	/// Take ownership of an epoch's match sets and begin swap negotiation.
	///
	/// The guard from [`begin_match_and_negotiate`] must span matching and
	/// this call, so that a swap completing concurrently cannot flag an
	/// order complete between matching and tracking here.
	///
	/// `final_swap` marks orders for which the matching engine will produce
	/// no further matches (fully filled or otherwise off the book).
	///
	/// [`begin_match_and_negotiate`]: Swapper::begin_match_and_negotiate
	pub fn negotiate(
		self: &Arc<Self>,
		_guard: &MatchGuard<'_>,
		match_sets: Vec<MatchSet>,
		final_swap: &HashMap<OrderId, bool>,
	) {
		// If the coordinator is stopping, the markets should be too, but
		// block this just in case.
		let stop = self.handler_stop.read().unwrap();
		if *stop {
			error!("negotiate called on stopped coordinator; matches lost");
			return;
		}

		// Get current optimal fee rates and verify asset support, dropping
		// match sets on unsupported assets. That should not happen if the
		// market is behaving.
		let mut fee_rates: HashMap<AssetId, u64> = HashMap::with_capacity(2);
		let mut supported = Vec::with_capacity(match_sets.len());
		let mut swap_orders: Vec<Order> = Vec::with_capacity(2 * match_sets.len());
		for set in match_sets {
			if self.fee_rate_unsupported(set.taker.base(), &mut fee_rates) {
				error!(asset = set.taker.base(), taker = %set.taker.id(), "unsupported asset");
				continue;
			}
			if self.fee_rate_unsupported(set.taker.quote(), &mut fee_rates) {
				error!(asset = set.taker.quote(), taker = %set.taker.id(), "unsupported asset");
				continue;
			}

			if !set.taker.is_cancel() {
				swap_orders.push(set.taker.clone());
				for maker in &set.makers {
					swap_orders.push(Order::Limit(maker.clone()));
				}
			}
			supported.push(set);
		}

		// Funding coins stay locked until a confirmed contract spends them
		// or the match is revoked.
		self.lock_orders_coins(&swap_orders);

		let now = unix_ms_now();
		let trackers = read_matches(&supported, &fee_rates, now);

		// Record the matches. If any DB update fails, no swaps proceed;
		// letting the rest continue would look like selective trickery to
		// the clients.
		for mt in &trackers {
			if let Err(e) = self.storage.insert_match(&mt.body) {
				error!(mid = %mt.id(), "inserting match failed: {e}");
				return;
			}
		}

		let mut user_matches: HashMap<AccountId, Vec<MatchAcker>> = HashMap::new();
		let mut add_user_match = |user: AccountId, tracker: Arc<MatchTracker>, mut note: MatchNote, is_maker: bool| {
			self.auth_mgr.sign(&mut note);
			user_matches.entry(user).or_default().push(MatchAcker {
				user,
				tracker,
				note,
				is_maker,
			});
		};

		let mut to_monitor = Vec::with_capacity(trackers.len());
		let mut canceled = Vec::new();
		for mt in trackers {
			if mt.body.is_cancellation() {
				// The canceled order must be flagged only after new swaps
				// are counted below.
				canceled.push(mt.body.maker.clone());

				// Nothing to track: remove the target order from storage.
				// The market has already unbooked it.
				if let Err(e) = self.storage.cancel_order(&mt.body.maker) {
					error!(order = %mt.body.maker.id, "failed to cancel order: {e}");
					return;
				}
				if let Order::Cancel(co) = &mt.body.taker {
					self.auth_mgr.record_cancel(co.user, co.id, co.target, now);
				}
			} else {
				to_monitor.push(mt.clone());
				let maker_id = mt.body.maker.id;
				let taker_id = mt.body.taker.id();
				self.orders
					.inc_active(maker_id, final_swap.get(&maker_id).copied().unwrap_or(false));
				self.orders
					.inc_active(taker_id, final_swap.get(&taker_id).copied().unwrap_or(false));
			}

			let (maker_note, taker_note) = match_notifications(&mt);
			add_user_match(mt.body.maker.user, mt.clone(), maker_note, true);
			add_user_match(mt.body.taker.user(), mt.clone(), taker_note, false);
		}

		// Flag canceled orders as failed and off-book if they are involved
		// in active swaps from this or previous epochs.
		for lo in &canceled {
			self.orders.canceled(lo.id);
		}

		for mt in to_monitor {
			self.registry.insert(mt);
		}

		// Solicit match acknowledgements, batched per user.
		for (user, ackers) in user_matches {
			let notes: Vec<MatchNote> = ackers.iter().map(|a| a.note.clone()).collect();
			let req = match Message::request(self.next_req_id(), Route::Match, &notes) {
				Ok(req) => req,
				Err(e) => {
					error!("error creating match notification request: {e}");
					continue;
				}
			};

			debug!(user = %user, matches = ackers.len(), "sending 'match' ack request");
			let swapper = self.clone();
			if let Err(e) = self.auth_mgr.request(
				user,
				req,
				Box::new(move |resp| swapper.process_match_acks(user, resp, ackers)),
			) {
				debug!(user = %user, "unable to send match request: {e}");
			}
		}
	}

	/// Resolve a fee rate for the asset into `cache`, falling back to the
	/// asset's max rate when the backend cannot answer sensibly. Returns
	/// true when the asset is not configured at all.
	fn fee_rate_unsupported(&self, asset_id: AssetId, cache: &mut HashMap<AssetId, u64>) -> bool {
		if cache.contains_key(&asset_id) {
			return false;
		}
		let Some(asset) = self.coins.get(&asset_id) else {
			return true;
		};
		let max_fee_rate = asset.backed.asset.max_fee_rate;
		let fee_rate = match asset.backed.backend.fee_rate() {
			Ok(0) => {
				warn!(asset = %asset.symbol(), "zero optimal fee rate reported, using max {max_fee_rate}");
				max_fee_rate
			}
			Ok(rate) if rate > max_fee_rate => {
				warn!(
					asset = %asset.symbol(),
					rate,
					max_fee_rate,
					"optimal fee rate above max, using max"
				);
				max_fee_rate
			}
			Ok(rate) => {
				debug!(asset = %asset.symbol(), rate, "optimal fee rate");
				rate
			}
			Err(e) => {
				warn!(
					asset = %asset.symbol(),
					"unable to determine optimal fee rate, using fallback of {max_fee_rate}: {e}"
				);
				max_fee_rate
			}
		};
		cache.insert(asset_id, fee_rate);
		false
	}

	/// Process a user's acknowledgements of a batched `match` request,
	/// validating count, per-index match id, and signatures before
	/// persisting them.
	pub(crate) fn process_match_acks(
		&self,
		user: AccountId,
		resp: Message,
		matches: Vec<MatchAcker>,
	) {
		let resp_route = resp.route;
		let acks: Vec<Acknowledgement> = match resp
			.parse::<ResponsePayload>()
			.ok()
			.and_then(|p| p.result)
			.and_then(|v| serde_json::from_value(v).ok())
		{
			Some(acks) => acks,
			None => {
				self.respond_error(
					resp.id,
					resp_route,
					user,
					ErrorCode::ParseError,
					"error parsing match request acknowledgment",
				);
				return;
			}
		};

		// Acks must arrive in the same order as the notes they answer.
		if acks.len() != matches.len() {
			self.respond_error(
				resp.id,
				resp_route,
				user,
				ErrorCode::AckCountError,
				format!("expected {} acknowledgements, got {}", matches.len(), acks.len()),
			);
			return;
		}

		debug!(user = %user, matches = matches.len(), "'match' acks received");

		for (i, (acker, ack)) in matches.iter().zip(acks.iter()).enumerate() {
			let match_id = acker.tracker.id();
			if ack.match_id != match_id {
				self.respond_error(
					resp.id,
					resp_route,
					user,
					ErrorCode::IdMismatchError,
					format!("unexpected match ID at acknowledgment index {i}"),
				);
				return;
			}
			let sig_msg = acker.note.sig_msg();
			if let Err(e) = self.auth_mgr.auth(user, &sig_msg, &ack.sig) {
				warn!(user = %user, mid = %match_id, "'match' ack failed sig verification: {e}");
				self.respond_error(
					resp.id,
					resp_route,
					user,
					ErrorCode::SignatureError,
					format!("signature validation error: {e}"),
				);
				return;
			}

			// These must be on record before the init steps begin and swap
			// contracts are broadcast.
			acker.tracker.with_sigs(|sigs| {
				if acker.is_maker {
					sigs.maker_match = ack.sig.clone();
				} else {
					sigs.taker_match = ack.sig.clone();
				}
			});
		}

		for acker in &matches {
			let ack_sig = if acker.is_maker {
				acker.tracker.sigs().maker_match
			} else {
				acker.tracker.sigs().taker_match
			};
			let mmid = MarketMatchId::of(&acker.tracker.body);
			let stored = if acker.is_maker {
				self.storage.save_match_ack_sig_a(mmid, &ack_sig)
			} else {
				self.storage.save_match_ack_sig_b(mmid, &ack_sig)
			};
			if let Err(e) = stored {
				error!(
					mid = %acker.tracker.id(),
					maker = acker.is_maker,
					"saving match ack signature failed: {e}"
				);
				self.respond_error(
					resp.id,
					resp_route,
					acker.user,
					ErrorCode::UnknownMarketError,
					"internal server error",
				);
				return;
			}
		}
	}
}

/// Expand an epoch's match sets into trackers with current fee rates
/// stamped. Cancel-taker matches are created directly complete.
fn read_matches(
	match_sets: &[MatchSet],
	fee_rates: &HashMap<AssetId, u64>,
	now_ms: u64,
) -> Vec<Arc<MatchTracker>> {
	let mut trackers = Vec::with_capacity(match_sets.len());
	for set in match_sets {
		for mut m in set.matches() {
			m.fee_rate_base = fee_rates.get(&m.base()).copied().unwrap_or(0);
			m.fee_rate_quote = fee_rates.get(&m.quote()).copied().unwrap_or(0);
			let tracker = MatchTracker::new(m, now_ms);
			if tracker.body.is_cancellation() {
				// No swap follows a cancellation.
				tracker.set_status(MatchStatus::MatchComplete);
			}
			trackers.push(Arc::new(tracker));
		}
	}
	trackers
}

/// Build the per-party `match` notifications for a tracker. Each party sees
/// the counter-party's swap address.
fn match_notifications(mt: &MatchTracker) -> (MatchNote, MatchNote) {
	let body = &mt.body;
	let stamp = mt.match_time;
	let maker_note = MatchNote {
		order_id: body.maker.id,
		match_id: mt.id(),
		quantity: body.quantity,
		rate: body.rate,
		address: body
			.taker
			.trade()
			.map(|t| t.swap_address.clone())
			.unwrap_or_default(),
		server_time: stamp,
		fee_rate_base: body.fee_rate_base,
		fee_rate_quote: body.fee_rate_quote,
		side: MatchSide::Maker,
		sig: Vec::new(),
	};
	let taker_note = MatchNote {
		order_id: body.taker.id(),
		match_id: mt.id(),
		quantity: body.quantity,
		rate: body.rate,
		address: body.maker.trade.swap_address.clone(),
		server_time: stamp,
		fee_rate_base: body.fee_rate_base,
		fee_rate_quote: body.fee_rate_quote,
		side: MatchSide::Taker,
		sig: Vec::new(),
	};
	(maker_note, taker_note)
}
