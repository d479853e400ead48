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

//! Persistent match storage, consumed from the host's database layer.
//!
//! Party A is always the maker (the initiator, who reveals the secret);
//! party B is the taker.

use crossbeam::channel::Receiver;
use thiserror::Error;

use bosun_sdk::types::{AssetId, CoinId, LimitOrder, Match, MatchId, Order, OrderId};

/// A match id qualified by its market's asset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarketMatchId {
	pub match_id: MatchId,
	pub base: AssetId,
	pub quote: AssetId,
}

impl MarketMatchId {
	pub fn of(m: &Match) -> Self {
		MarketMatchId {
			match_id: m.id(),
			base: m.base(),
			quote: m.quote(),
		}
	}
}

/// Error types for storage operations
#[derive(Debug, Clone, Error)]
pub enum StorageError {
	/// The database itself is failing. The coordinator must not penalize
	/// users or start revocations while storage is in this state.
	#[error("general storage failure: {0}")]
	GeneralFailure(String),
	#[error("storage error: {0}")]
	Other(String),
}

impl StorageError {
	pub fn is_general_failure(&self) -> bool {
		matches!(self, StorageError::GeneralFailure(_))
	}
}

/// Match and order persistence
pub trait Storage: Send + Sync {
	/// The last storage error observed, if the database is unhealthy.
	fn last_err(&self) -> Option<StorageError>;

	/// A channel that closes when the database hits an unrecoverable
	/// failure. The main loop terminates when this fires.
	fn fatal(&self) -> Receiver<()>;

	/// Record a new match. Matches whose taker is a cancel order are stored
	/// complete and inactive, since no settlement follows.
	fn insert_match(&self, m: &Match) -> Result<(), StorageError>;

	/// Record the cancellation of a booked order.
	fn cancel_order(&self, lo: &LimitOrder) -> Result<(), StorageError>;

	/// Record the server-initiated revocation of an order, returning the
	/// generated cancel id and its timestamp.
	fn revoke_order(&self, ord: &Order) -> Result<(OrderId, u64), StorageError>;

	/// Record the time at which an order became successfully complete.
	fn set_order_complete_time(&self, ord: &Order, time_ms: u64) -> Result<(), StorageError>;

	fn save_contract_a(
		&self,
		mid: MarketMatchId,
		contract: &[u8],
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError>;

	fn save_contract_b(
		&self,
		mid: MarketMatchId,
		contract: &[u8],
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError>;

	/// The maker's redeem also records the revealed secret and moves the
	/// match to MakerRedeemed.
	fn save_redeem_a(
		&self,
		mid: MarketMatchId,
		coin_id: &CoinId,
		secret: &[u8],
		time_ms: u64,
	) -> Result<(), StorageError>;

	/// The taker's redeem completes the match and flags it inactive.
	fn save_redeem_b(
		&self,
		mid: MarketMatchId,
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError>;

	fn save_match_ack_sig_a(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError>;
	fn save_match_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError>;
	fn save_audit_ack_sig_a(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError>;
	fn save_audit_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError>;
	fn save_redeem_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError>;

	/// Flag a match as no longer actively settling.
	fn set_match_inactive(&self, mid: MarketMatchId);

	/// The recorded hash of the last written state file, empty if none.
	fn get_state_hash(&self) -> Result<Vec<u8>, StorageError>;

	/// Record the hash of a newly written state file.
	fn set_state_hash(&self, hash: &[u8]) -> Result<(), StorageError>;
}
