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

//! Durable coordinator state for crash recovery.
//!
//! On graceful shutdown the coordinator writes its live match trackers,
//! order-swap stats, and in-flight handler messages to a versioned binary
//! file; the file's hash is recorded in the database so a truncated or
//! tampered file is detected on the next start.
//!
//! Trackers are stored in an asset-agnostic form: coin ids and scripts
//! rather than backend handles. Restoration asks the current backends to
//! resolve the stored coins again.

mod storage;

pub use storage::{
	StateFile, file_hash, latest_state_file, load_state_file, save_state_file,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{MatchSigs, MatchTracker};
use crate::tracker::OrderSwapStat;
use bosun_sdk::msgs::Message;
use bosun_sdk::types::{AccountId, AssetId, CoinId, Match, MatchId, MatchStatus, OrderId};

/// Current state file format version
pub const STATE_VERSION: u16 = 1;

/// Error types for snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error("state io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("state encoding error: {0}")]
	Encode(String),
	#[error("state decoding error: {0}")]
	Decode(String),
	#[error("not a swap state file")]
	BadMagic,
	#[error("unsupported state version {0} (expected {STATE_VERSION})")]
	VersionMismatch(u16),
}

/// Identity of an in-flight handler message: client message ids are not
/// globally unique, so the key pairs the id with the sending user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaiterKey {
	pub msg_id: u64,
	pub user: AccountId,
}

/// A received message retained so it can be replayed through its handler
/// after a restart, re-running full validation and waiter registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerArgs {
	pub user: AccountId,
	pub msg: Message,
}

/// One party's swap status in storable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStatusData {
	pub swap_asset: AssetId,
	pub redeem_asset: AssetId,
	/// Coin id of the party's contract output, empty if not yet seen.
	pub contract_coin: CoinId,
	pub contract_script: Vec<u8>,
	pub swap_time: u64,
	pub swap_confirm_time: u64,
	/// Coin id of the party's redemption, empty if not yet seen.
	pub redeem_coin: CoinId,
	pub redeem_time: u64,
}

/// A live match tracker in storable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTrackerData {
	pub body: Match,
	/// When the coordinator first saw the match, ms UTC.
	pub time: u64,
	pub status: MatchStatus,
	pub sigs: MatchSigs,
	pub maker_status: SwapStatusData,
	pub taker_status: SwapStatusData,
}

/// The complete durable coordinator state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
	/// Assets that must be configured to decode the trackers.
	pub assets: Vec<AssetId>,
	pub match_trackers: HashMap<MatchId, MatchTrackerData>,
	pub order_stats: HashMap<OrderId, OrderSwapStat>,
	pub live_waiters: HashMap<WaiterKey, HandlerArgs>,
}

/// Translate a live tracker into its storable form.
pub fn tracker_data(mt: &MatchTracker) -> MatchTrackerData {
	let status_data = |status: &crate::registry::SwapStatus| {
		let (contract_coin, contract_script) = match status.contract() {
			Some(c) => (c.id(), c.redeem_script()),
			None => (Vec::new(), Vec::new()),
		};
		let redeem_coin = status.redemption().map(|r| r.id()).unwrap_or_default();
		SwapStatusData {
			swap_asset: status.swap_asset,
			redeem_asset: status.redeem_asset,
			contract_coin,
			contract_script,
			swap_time: status.swap_time(),
			swap_confirm_time: status.swap_conf_time(),
			redeem_coin,
			redeem_time: status.redeem_seen_time(),
		}
	};

	MatchTrackerData {
		body: mt.body.clone(),
		time: mt.time,
		status: mt.status(),
		sigs: mt.sigs(),
		maker_status: status_data(&mt.maker_status),
		taker_status: status_data(&mt.taker_status),
	}
}
