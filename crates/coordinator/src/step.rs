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

//! Settlement step resolution.
//!
//! Given a match and the user claiming to act, compute who must act next, on
//! which chain, with what expected value. The target computation itself is a
//! pure function of the status and the maker's side; the resolver wraps it
//! with registry lookup and actor validation.

use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::asset::{BackedAsset, LockableAsset};
use crate::registry::{MatchRegistry, MatchTracker};
use bosun_sdk::msgs::{ErrorCode, MsgError};
use bosun_sdk::types::{
	AccountId, AssetId, MatchId, MatchSide, MatchStatus, Order, base_to_quote,
};

/// The fixed geometry of one settlement step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTargets {
	/// Which party must act.
	pub actor_side: MatchSide,
	/// The status reached once the actor's transaction is discovered.
	pub next_step: MatchStatus,
	/// Whether the acting transaction lands on the market's base asset.
	pub is_base_asset: bool,
}

/// Compute the step geometry for a settlement status.
///
/// Maker-sell means the maker contracts base and the taker contracts quote;
/// maker-buy swaps those. Redemption is always on the counter-party's swap
/// asset. Returns None for a completed match.
pub fn step_targets(status: MatchStatus, maker_sell: bool) -> Option<StepTargets> {
	let (actor_side, next_step, is_base_asset) = match status {
		MatchStatus::NewlyMatched => (MatchSide::Maker, MatchStatus::MakerSwapCast, maker_sell),
		MatchStatus::MakerSwapCast => (MatchSide::Taker, MatchStatus::TakerSwapCast, !maker_sell),
		MatchStatus::TakerSwapCast => (MatchSide::Maker, MatchStatus::MakerRedeemed, !maker_sell),
		MatchStatus::MakerRedeemed => (MatchSide::Taker, MatchStatus::MatchComplete, maker_sell),
		MatchStatus::MatchComplete => return None,
	};
	Some(StepTargets {
		actor_side,
		next_step,
		is_base_asset,
	})
}

/// One party of a match, positioned for the current step
#[derive(Debug, Clone)]
pub struct StepActor {
	pub user: AccountId,
	pub order: Order,
	pub is_maker: bool,
	/// The asset to which this actor broadcasts their swap transaction.
	pub swap_asset: AssetId,
}

/// Everything a handler needs to validate the current step's transaction
pub struct StepInformation {
	pub tracker: Arc<MatchTracker>,
	/// The party expected to broadcast next.
	pub actor: StepActor,
	pub counter_party: StepActor,
	/// The backend for the acting asset.
	pub asset: BackedAsset,
	pub is_base_asset: bool,
	pub step: MatchStatus,
	pub next_step: MatchStatus,
	/// Expected trade amount in units of the acting asset.
	pub check_val: u64,
}

/// Resolve the current step of a match, verifying that `user` is the party
/// expected to act.
pub fn resolve_step(
	registry: &MatchRegistry,
	coins: &HashMap<AssetId, LockableAsset>,
	user: AccountId,
	match_id: MatchId,
) -> Result<StepInformation, MsgError> {
	let Some(tracker) = registry.get(&match_id) else {
		return Err(MsgError::new(ErrorCode::UnknownMatch, "unknown match ID"));
	};

	let body = &tracker.body;
	let status = tracker.status();
	let maker_sell = body.maker.trade.sell;

	let Some(targets) = step_targets(status, maker_sell) else {
		return Err(MsgError::new(
			ErrorCode::SettlementSequenceError,
			"match already complete",
		));
	};

	// Earlier acknowledgements are expected before this step begins;
	// their absence is suspicious but not disqualifying.
	let sigs = tracker.sigs();
	match status {
		MatchStatus::NewlyMatched if sigs.maker_match.is_empty() => {
			debug!(mid = %match_id, %status, "missing maker match ack before maker swap");
		}
		MatchStatus::MakerSwapCast if sigs.taker_match.is_empty() => {
			debug!(mid = %match_id, %status, "missing taker match ack before taker swap");
		}
		MatchStatus::TakerSwapCast if sigs.maker_audit.is_empty() => {
			debug!(mid = %match_id, %status, "missing maker audit ack before maker redeem");
		}
		_ => {}
	}

	let maker_order = Order::Limit(body.maker.clone());
	let taker_order = body.taker.clone();

	let (actor_order, cp_order, actor_is_maker) = match targets.actor_side {
		MatchSide::Maker => (maker_order, taker_order, true),
		MatchSide::Taker => (taker_order, maker_order, false),
	};

	if actor_order.user() != user {
		return Err(MsgError::new(
			ErrorCode::SettlementSequenceError,
			"expected other party to act",
		));
	}

	let (actor_swap_asset, cp_swap_asset, check_val) = if targets.is_base_asset {
		(body.base(), body.quote(), body.quantity)
	} else {
		(body.quote(), body.base(), base_to_quote(body.rate, body.quantity))
	};

	// The asset was verified present when the match was accepted.
	let Some(asset) = coins.get(&actor_swap_asset) else {
		return Err(MsgError::new(
			ErrorCode::UnknownMarketError,
			"unsupported asset",
		));
	};

	Ok(StepInformation {
		actor: StepActor {
			user,
			order: actor_order,
			is_maker: actor_is_maker,
			swap_asset: actor_swap_asset,
		},
		counter_party: StepActor {
			user: cp_order.user(),
			order: cp_order,
			is_maker: !actor_is_maker,
			swap_asset: cp_swap_asset,
		},
		asset: asset.backed.clone(),
		is_base_asset: targets.is_base_asset,
		step: status,
		next_step: targets.next_step,
		check_val,
		tracker,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_targets_maker_sell() {
		// Maker sells base: maker contracts base, taker contracts quote,
		// maker redeems quote, taker redeems base.
		let t = step_targets(MatchStatus::NewlyMatched, true).unwrap();
		assert_eq!(t.actor_side, MatchSide::Maker);
		assert_eq!(t.next_step, MatchStatus::MakerSwapCast);
		assert!(t.is_base_asset);

		let t = step_targets(MatchStatus::MakerSwapCast, true).unwrap();
		assert_eq!(t.actor_side, MatchSide::Taker);
		assert!(!t.is_base_asset);

		let t = step_targets(MatchStatus::TakerSwapCast, true).unwrap();
		assert_eq!(t.actor_side, MatchSide::Maker);
		assert_eq!(t.next_step, MatchStatus::MakerRedeemed);
		assert!(!t.is_base_asset);

		let t = step_targets(MatchStatus::MakerRedeemed, true).unwrap();
		assert_eq!(t.actor_side, MatchSide::Taker);
		assert_eq!(t.next_step, MatchStatus::MatchComplete);
		assert!(t.is_base_asset);
	}

	#[test]
	fn test_targets_maker_buy_flips_assets() {
		for (status, sell_base) in [
			(MatchStatus::NewlyMatched, true),
			(MatchStatus::MakerSwapCast, false),
			(MatchStatus::TakerSwapCast, false),
			(MatchStatus::MakerRedeemed, true),
		] {
			let sell = step_targets(status, true).unwrap();
			let buy = step_targets(status, false).unwrap();
			assert_eq!(sell.is_base_asset, sell_base);
			assert_eq!(buy.is_base_asset, !sell_base);
			// The acting party never depends on the maker's side.
			assert_eq!(sell.actor_side, buy.actor_side);
		}
	}

	#[test]
	fn test_targets_complete_is_none() {
		assert!(step_targets(MatchStatus::MatchComplete, true).is_none());
		assert!(step_targets(MatchStatus::MatchComplete, false).is_none());
	}
}
