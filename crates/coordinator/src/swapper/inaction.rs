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

//! Confirmation processing, inaction enforcement, and revocation.
//!
//! Two clocks govern a party's obligation to act: block-based deadlines
//! start when the previous swap reaches its required confirmation count;
//! event-based deadlines start at match arrival or at the maker's observed
//! redemption. Either sweep revokes a match whose next actor missed the
//! broadcast timeout, ascribing fault per the current status.

use tracing::{debug, error, info, warn};

use super::{BlockNote, Swapper};
use crate::auth::NoActionStep;
use crate::registry::{MatchTracker, SwapStatus};
use crate::storage::MarketMatchId;
use crate::unix_ms_now;
use bosun_sdk::msgs::{Message, RevokeMatch, Route};
use bosun_sdk::types::{MatchStatus, Order};

impl Swapper {
	/// Update confirmation times for matches touched by a new block. Once a
	/// relevant contract reaches its required confirmation count, the next
	/// actor has only the broadcast timeout to act; the deadline itself is
	/// evaluated by the block-based sweep, not here.
	pub(crate) fn process_block(&self, note: &BlockNote) {
		self.registry.with_all(|mt| {
			if !mt.involves_asset(note.asset_id) {
				return;
			}
			match mt.status() {
				MatchStatus::MakerSwapCast if mt.maker_status.swap_asset == note.asset_id => {
					// The taker's timeout starts once the maker's swap has
					// its required confirmations, and the maker's funding
					// coins are spent by the confirmed contract.
					if self.try_confirm_swap(&mt.maker_status, note.time) {
						self.unlock_order_coins(&Order::Limit(mt.body.maker.clone()));
					}
				}
				MatchStatus::TakerSwapCast if mt.taker_status.swap_asset == note.asset_id => {
					if self.try_confirm_swap(&mt.taker_status, note.time) {
						self.unlock_order_coins(&mt.body.taker);
					}
				}
				_ => {}
			}
		});
	}

	fn try_confirm_swap(&self, status: &SwapStatus, conf_time_ms: u64) -> bool {
		let Some(asset) = self.coins.get(&status.swap_asset) else {
			return false;
		};
		let swap_conf = asset.backed.asset.swap_conf;
		let symbol = asset.symbol().to_string();
		status.try_set_confirmed(conf_time_ms, |contract| match contract.confirmations() {
			Ok(confs) if confs >= i64::from(swap_conf) => {
				debug!(
					asset = %symbol,
					confs,
					required = swap_conf,
					"Swap contract reached required confirmations"
				);
				true
			}
			Ok(_) => false,
			// The transaction has become invalid. Nothing to do.
			Err(_) => false,
		})
	}

	/// Revoke matches whose next actor missed a confirmation-relative
	/// deadline on the given asset: a taker who did not post after the
	/// maker's swap confirmed, or a maker who did not redeem after the
	/// taker's swap confirmed. Running the sweep twice with no intervening
	/// event is a no-op.
	pub(crate) fn check_inaction_block_based(&self, asset_id: bosun_sdk::types::AssetId) {
		// If the DB is failing, do not penalize or start revocations.
		if let Some(err) = self.storage.last_err() {
			error!("DB in failing state: {err}");
			return;
		}

		let _guard = self.negotiate_mtx.lock().unwrap();
		let now = unix_ms_now();
		let b_timeout = self.b_timeout_ms();
		// A zero time means the event has not happened yet.
		let too_old = |evt: u64| evt != 0 && now.saturating_sub(evt) >= b_timeout;

		self.registry.sweep(|mt| {
			if !mt.involves_asset(asset_id) {
				return false;
			}
			let revoke = match mt.status() {
				MatchStatus::MakerSwapCast => too_old(mt.maker_status.swap_conf_time()),
				MatchStatus::TakerSwapCast => too_old(mt.taker_status.swap_conf_time()),
				_ => false,
			};
			if revoke {
				self.fail_match(mt);
			}
			revoke
		});
	}

	/// Revoke matches whose next actor missed a deadline relative to a
	/// non-confirmation event: a maker who never posted after the match
	/// request, or a taker who never redeemed after the maker's redemption
	/// was seen.
	pub(crate) fn check_inaction_event_based(&self) {
		if let Some(err) = self.storage.last_err() {
			error!("DB in failing state: {err}");
			return;
		}

		let _guard = self.negotiate_mtx.lock().unwrap();
		let now = unix_ms_now();
		let b_timeout = self.b_timeout_ms();
		let too_old = |evt: u64| evt != 0 && now.saturating_sub(evt) >= b_timeout;

		self.registry.sweep(|mt| {
			let revoke = match mt.status() {
				MatchStatus::NewlyMatched => too_old(mt.time),
				MatchStatus::MakerRedeemed => too_old(mt.maker_status.redeem_seen_time()),
				_ => false,
			};
			if revoke {
				self.fail_match(mt);
			}
			revoke
		});
	}

	/// Revoke a match: ascribe fault per the current status, unbook and
	/// penalize the at-fault order, settle both orders' swap accounting,
	/// and notify both parties. The caller removes the tracker from the
	/// registry.
	pub(crate) fn fail_match(&self, mt: &MatchTracker) {
		let status = mt.status();
		let (maker_fault, misstep, ref_time) = match status {
			MatchStatus::NewlyMatched => (true, NoActionStep::NoSwapAsMaker, mt.body.epoch_end),
			MatchStatus::MakerSwapCast => (
				false,
				NoActionStep::NoSwapAsTaker,
				// The confirmation time is not in the DB; the swap time is.
				mt.maker_status.swap_time(),
			),
			MatchStatus::TakerSwapCast => (
				true,
				NoActionStep::NoRedeemAsMaker,
				mt.taker_status.swap_time(),
			),
			MatchStatus::MakerRedeemed => (
				false,
				NoActionStep::NoRedeemAsTaker,
				mt.maker_status.redeem_seen_time(),
			),
			MatchStatus::MatchComplete => {
				error!(mid = %mt.id(), "invalid fail_match status {status}");
				return;
			}
		};

		let maker_order = Order::Limit(mt.body.maker.clone());
		let taker_order = mt.body.taker.clone();
		let (order_at_fault, other_order) = if maker_fault {
			(maker_order, taker_order)
		} else {
			(taker_order, maker_order)
		};

		debug!(
			mid = %mt.id(),
			maker_fault,
			%status,
			"failing match"
		);

		// Record the end of this match's processing.
		self.storage.set_match_inactive(MarketMatchId::of(&mt.body));

		// A still-booked at-fault limit order is unbooked, revoked, and
		// counted against the user's cancellation rate.
		if let Order::Limit(lo) = &order_at_fault {
			if (self.unbook_hook)(lo) {
				self.orders.canceled(lo.id);
			}
		}

		// One less active swap for the at-fault order, and a failure. The
		// counter-party's order gets a clean decrement, which may complete
		// it.
		self.orders.swap_failure(order_at_fault.id());
		if self.orders.swap_success(other_order.id()) {
			let comp_time = unix_ms_now();
			self.auth_mgr
				.record_completed_order(other_order.user(), other_order.id(), comp_time);
			if let Err(e) = self.storage.set_order_complete_time(&other_order, comp_time) {
				if e.is_general_failure() {
					error!(order = %other_order.id(), "fatal error recording order completion: {e}");
				} else {
					warn!(order = %other_order.id(), "recording order completion: {e}");
				}
			}
		}

		// Register the failure to act, adjusting the user's score.
		self.auth_mgr.inaction(
			order_at_fault.user(),
			misstep,
			MarketMatchId::of(&mt.body),
			mt.body.quantity,
			ref_time,
			order_at_fault.id(),
		);

		self.revoke(mt);
	}

	/// Send the signed `revoke_match` notification to both parties and
	/// release both orders' funding coins.
	pub(crate) fn revoke(&self, mt: &MatchTracker) {
		let mid = mt.id();
		info!(mid = %mid, "Sending revoke_match notification to each party");

		self.unlock_order_coins(&mt.body.taker);
		self.unlock_order_coins(&Order::Limit(mt.body.maker.clone()));

		let mut send_rev = |ord: &Order| {
			let mut params = RevokeMatch {
				order_id: ord.id(),
				match_id: mid,
				sig: Vec::new(),
			};
			self.auth_mgr.sign(&mut params);
			let ntfn = match Message::notification(Route::RevokeMatch, &params) {
				Ok(ntfn) => ntfn,
				Err(e) => {
					error!(user = %ord.user(), mid = %mid, "Failed to create revoke_match: {e}");
					return;
				}
			};
			if let Err(e) = self.auth_mgr.send(ord.user(), ntfn) {
				debug!(user = %ord.user(), mid = %mid, "Failed to send revoke_match: {e}");
			}
		};

		send_rev(&mt.body.taker);
		send_rev(&Order::Limit(mt.body.maker.clone()));
	}
}
