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

//! Process-local index of live matches.
//!
//! The registry owns every [`MatchTracker`]; the per-user index stores match
//! ids only, so sweeps can delete trackers without tombstoning. Lock order
//! is registry, then match tracker, then swap status; backend, storage, and
//! comms calls are never made while holding the registry write lock.

use std::{
	collections::{HashMap, HashSet},
	sync::{Arc, RwLock},
};

use tracing::error;

use crate::asset::{Contract, Redemption};
use bosun_sdk::types::{AccountId, AssetId, Match, MatchId, MatchStatus};

/// One party's progress through the settlement sequence
///
/// Times are ms UTC; zero means "not yet observed".
#[derive(Debug)]
pub struct SwapStatus {
	/// The asset to which this party broadcasts their swap transaction.
	pub swap_asset: AssetId,
	pub redeem_asset: AssetId,

	state: RwLock<SwapStatusState>,
}

#[derive(Default)]
struct SwapStatusState {
	/// First sighting of the party's swap contract.
	swap_time: u64,
	swap: Option<Arc<dyn Contract>>,
	/// Time of the block at which the contract reached its required
	/// confirmation count.
	swap_confirmed: u64,
	/// First sighting of the party's redemption.
	redeem_time: u64,
	redemption: Option<Arc<dyn Redemption>>,
}

impl std::fmt::Debug for SwapStatusState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SwapStatusState")
			.field("swap_time", &self.swap_time)
			.field("swap_confirmed", &self.swap_confirmed)
			.field("redeem_time", &self.redeem_time)
			.finish_non_exhaustive()
	}
}

impl SwapStatus {
	pub fn new(swap_asset: AssetId, redeem_asset: AssetId) -> Self {
		SwapStatus {
			swap_asset,
			redeem_asset,
			state: RwLock::new(SwapStatusState::default()),
		}
	}

	pub fn swap_time(&self) -> u64 {
		self.state.read().unwrap().swap_time
	}

	pub fn swap_conf_time(&self) -> u64 {
		self.state.read().unwrap().swap_confirmed
	}

	pub fn redeem_seen_time(&self) -> u64 {
		self.state.read().unwrap().redeem_time
	}

	pub fn contract(&self) -> Option<Arc<dyn Contract>> {
		self.state.read().unwrap().swap.clone()
	}

	pub fn redemption(&self) -> Option<Arc<dyn Redemption>> {
		self.state.read().unwrap().redemption.clone()
	}

	pub fn set_contract(&self, contract: Arc<dyn Contract>, time_ms: u64) {
		let mut state = self.state.write().unwrap();
		state.swap = Some(contract);
		state.swap_time = time_ms;
	}

	/// Record the confirmation time if the contract is present and not yet
	/// confirmed. Returns false when there is nothing to do.
	pub fn try_set_confirmed<F>(&self, conf_time_ms: u64, reached_conf: F) -> bool
	where
		F: FnOnce(&dyn Contract) -> bool,
	{
		let mut state = self.state.write().unwrap();
		if state.swap_time == 0 || state.swap_confirmed != 0 {
			return false;
		}
		let Some(swap) = state.swap.as_ref() else {
			return false;
		};
		if !reached_conf(swap.as_ref()) {
			return false;
		}
		state.swap_confirmed = conf_time_ms;
		true
	}

	/// Force the confirmation time, used when restoring saved state.
	pub fn set_confirmed(&self, conf_time_ms: u64) {
		self.state.write().unwrap().swap_confirmed = conf_time_ms;
	}

	pub fn set_redemption(&self, redemption: Arc<dyn Redemption>, time_ms: u64) {
		let mut state = self.state.write().unwrap();
		state.redemption = Some(redemption);
		state.redeem_time = time_ms;
	}
}

/// Acknowledgement signatures collected over the life of a match
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchSigs {
	pub maker_match: Vec<u8>,
	pub taker_match: Vec<u8>,
	pub maker_audit: Vec<u8>,
	pub taker_audit: Vec<u8>,
	pub taker_redeem: Vec<u8>,
}

struct MatchState {
	status: MatchStatus,
	sigs: MatchSigs,
}

/// A live match under settlement supervision
///
/// Wraps the immutable [`Match`] with the mutable negotiation state: the
/// settlement status, each party's swap status, and collected ack
/// signatures.
pub struct MatchTracker {
	pub body: Match,
	/// When the coordinator first saw the match, ms UTC.
	pub time: u64,
	/// The match's reference time: the end of its epoch, ms UTC.
	pub match_time: u64,
	pub maker_status: SwapStatus,
	pub taker_status: SwapStatus,

	state: RwLock<MatchState>,
}

impl MatchTracker {
	/// Track a fresh match in NewlyMatched. The maker contracts the base
	/// asset when selling, the quote asset when buying; the taker contracts
	/// the other side.
	pub fn new(body: Match, now_ms: u64) -> Self {
		let (maker_swap, taker_swap) = if body.maker.trade.sell {
			(body.base(), body.quote())
		} else {
			(body.quote(), body.base())
		};
		let match_time = body.epoch_end;
		MatchTracker {
			maker_status: SwapStatus::new(maker_swap, taker_swap),
			taker_status: SwapStatus::new(taker_swap, maker_swap),
			time: now_ms,
			match_time,
			body,
			state: RwLock::new(MatchState {
				status: MatchStatus::NewlyMatched,
				sigs: MatchSigs::default(),
			}),
		}
	}

	pub fn id(&self) -> MatchId {
		self.body.id()
	}

	pub fn status(&self) -> MatchStatus {
		self.state.read().unwrap().status
	}

	pub fn set_status(&self, status: MatchStatus) {
		self.state.write().unwrap().status = status;
	}

	pub fn sigs(&self) -> MatchSigs {
		self.state.read().unwrap().sigs.clone()
	}

	pub fn with_sigs<F: FnOnce(&mut MatchSigs)>(&self, f: F) {
		f(&mut self.state.write().unwrap().sigs);
	}

	/// The swap status of the requested party.
	pub fn status_of(&self, is_maker: bool) -> &SwapStatus {
		if is_maker {
			&self.maker_status
		} else {
			&self.taker_status
		}
	}

	/// Whether the block notification for `asset` concerns this match.
	pub fn involves_asset(&self, asset: AssetId) -> bool {
		self.maker_status.swap_asset == asset || self.taker_status.swap_asset == asset
	}
}

impl std::fmt::Debug for MatchTracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MatchTracker")
			.field("id", &self.id())
			.field("status", &self.status())
			.field("time", &self.time)
			.finish_non_exhaustive()
	}
}

#[derive(Default)]
struct RegistryInner {
	matches: HashMap<MatchId, Arc<MatchTracker>>,
	user_matches: HashMap<AccountId, HashSet<MatchId>>,
}

/// Owner of all live match trackers, indexed by match id and by user
#[derive(Default)]
pub struct MatchRegistry {
	inner: RwLock<RegistryInner>,
}

impl MatchRegistry {
	pub fn new() -> Self {
		MatchRegistry::default()
	}

	pub fn insert(&self, tracker: Arc<MatchTracker>) {
		let mid = tracker.id();
		let maker = tracker.body.maker.user;
		let taker = tracker.body.taker.user();

		let mut inner = self.inner.write().unwrap();
		inner.matches.insert(mid, tracker);
		inner.user_matches.entry(maker).or_default().insert(mid);
		if taker != maker {
			inner.user_matches.entry(taker).or_default().insert(mid);
		}
	}

	pub fn get(&self, mid: &MatchId) -> Option<Arc<MatchTracker>> {
		self.inner.read().unwrap().matches.get(mid).cloned()
	}

	/// Run `f` on the tracker while holding the registry read lock, if the
	/// match is still live. Handlers use this to store discovered coins and
	/// advance status atomically with respect to revocation sweeps.
	pub fn if_live<T, F: FnOnce(&Arc<MatchTracker>) -> T>(&self, mid: &MatchId, f: F) -> Option<T> {
		let inner = self.inner.read().unwrap();
		inner.matches.get(mid).map(f)
	}

	pub fn remove(&self, mid: &MatchId) -> Option<Arc<MatchTracker>> {
		let mut inner = self.inner.write().unwrap();
		let tracker = inner.matches.remove(mid)?;
		Self::unindex(&mut inner, &tracker, mid);
		Some(tracker)
	}

	fn unindex(inner: &mut RegistryInner, tracker: &Arc<MatchTracker>, mid: &MatchId) {
		let maker = tracker.body.maker.user;
		let taker = tracker.body.taker.user();
		for user in [maker, taker] {
			match inner.user_matches.get_mut(&user) {
				Some(set) => {
					set.remove(mid);
					if set.is_empty() {
						inner.user_matches.remove(&user);
					}
				}
				None => error!(user = %user, "no user index entry for live match"),
			}
			if maker == taker {
				break;
			}
		}
	}

	/// Visit every live match under the read lock.
	pub fn with_all<F: FnMut(&Arc<MatchTracker>)>(&self, mut f: F) {
		let inner = self.inner.read().unwrap();
		for tracker in inner.matches.values() {
			f(tracker);
		}
	}

	/// Visit every live match under the write lock, deleting those for
	/// which `f` returns true. Inaction sweeps run through here so their
	/// revocations are serialized.
	pub fn sweep<F: FnMut(&Arc<MatchTracker>) -> bool>(&self, mut f: F) {
		let mut inner = self.inner.write().unwrap();
		let doomed: Vec<(MatchId, Arc<MatchTracker>)> = inner
			.matches
			.iter()
			.filter(|(_, mt)| f(mt))
			.map(|(mid, mt)| (*mid, mt.clone()))
			.collect();
		for (mid, tracker) in doomed {
			inner.matches.remove(&mid);
			Self::unindex(&mut inner, &tracker, &mid);
		}
	}

	/// All live trackers, for the state snapshot.
	pub fn all(&self) -> Vec<Arc<MatchTracker>> {
		self.inner.read().unwrap().matches.values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.inner.read().unwrap().matches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Total quantity and count of the user's active swaps in the given
	/// market. The market uses this to bound a user's order size.
	pub fn user_swapping_amt(&self, user: AccountId, base: AssetId, quote: AssetId) -> (u64, u64) {
		let inner = self.inner.read().unwrap();
		let Some(mids) = inner.user_matches.get(&user) else {
			return (0, 0);
		};
		let mut amt = 0;
		let mut count = 0;
		for mid in mids {
			let Some(mt) = inner.matches.get(mid) else {
				continue;
			};
			if mt.body.base() == base && mt.body.quote() == quote {
				amt += mt.body.quantity;
				count += 1;
			}
		}
		(amt, count)
	}
}
