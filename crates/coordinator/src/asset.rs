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

//! Per-asset view of a blockchain.
//!
//! The coordinator never talks to a node directly; each configured asset
//! carries a [`Backend`] that resolves contracts and redemptions by coin id,
//! reports confirmations, and delivers block notifications. Backends own the
//! contract/redemption objects; the coordinator holds handles for the life
//! of a match tracker.

use std::{collections::HashMap, fmt, sync::Arc};

use crossbeam::channel::Receiver;
use thiserror::Error;

use bosun_sdk::types::{AssetId, CoinId, Order, OrderId};

/// Error types for backend operations
#[derive(Debug, Error)]
pub enum BackendError {
	/// The requested coin is not (yet) known to the chain. This is not a
	/// failure: callers retry until their deadline passes.
	#[error("coin not found")]
	CoinNotFound,
	#[error("invalid coin id: {0}")]
	InvalidCoinId(String),
	#[error("invalid contract: {0}")]
	InvalidContract(String),
	#[error("coin spent")]
	CoinSpent,
	#[error("node connection error: {0}")]
	Connection(String),
	#[error("backend failure: {0}")]
	Backend(String),
}

impl BackendError {
	pub fn is_coin_not_found(&self) -> bool {
		matches!(self, BackendError::CoinNotFound)
	}
}

/// A swap contract located on chain
pub trait Contract: Send + Sync + fmt::Debug {
	/// The coin id of the output holding the contract.
	fn id(&self) -> CoinId;
	/// Contract value in the asset's atomic units.
	fn value(&self) -> u64;
	/// The address the redeeming counter-party is paid to.
	fn swap_address(&self) -> String;
	/// Fee rate paid by the contract transaction.
	fn fee_rate(&self) -> u64;
	/// Absolute refund lock time, ms UTC.
	fn lock_time(&self) -> u64;
	/// The script that must be satisfied to redeem the contract.
	fn redeem_script(&self) -> Vec<u8>;
	/// Current confirmation count. May hit the node.
	fn confirmations(&self) -> Result<i64, BackendError>;
}

/// A redemption transaction located on chain
pub trait Redemption: Send + Sync + fmt::Debug {
	fn id(&self) -> CoinId;
	fn confirmations(&self) -> Result<i64, BackendError>;
}

/// A block notification from a backend
#[derive(Debug, Clone)]
pub struct BlockUpdate {
	/// Set when the backend is reporting a monitoring problem rather than a
	/// new block.
	pub err: Option<String>,
}

/// Chain access for one asset
pub trait Backend: Send + Sync {
	/// Locate the swap contract with the given coin id and redeem script.
	/// Returns [`BackendError::CoinNotFound`] while the transaction is
	/// unknown, so callers can retry.
	fn contract(&self, coin_id: &CoinId, script: &[u8]) -> Result<Arc<dyn Contract>, BackendError>;

	/// Locate the redemption with the given coin id, verifying that it
	/// spends the counter-party's contract output.
	fn redemption(
		&self,
		coin_id: &CoinId,
		contract_coin: &CoinId,
	) -> Result<Arc<dyn Redemption>, BackendError>;

	/// Check that a coin id is well-formed for this asset, returning a
	/// human-readable rendering.
	fn validate_coin_id(&self, coin_id: &CoinId) -> Result<String, BackendError>;

	/// Check that a contract script is well-formed for this asset.
	fn validate_contract(&self, script: &[u8]) -> Result<(), BackendError>;

	/// Whether the secret is the preimage committed to by the contract.
	fn validate_secret(&self, secret: &[u8], contract_script: &[u8]) -> bool;

	/// Verify that a coin exists and is unspent.
	fn verify_unspent_coin(&self, coin_id: &CoinId) -> Result<(), BackendError>;

	/// The current optimal fee rate.
	fn fee_rate(&self) -> Result<u64, BackendError>;

	/// Whether the backend's node is synced with the network.
	fn synced(&self) -> Result<bool, BackendError>;

	/// Subscribe to block notifications with the given channel capacity.
	fn block_channel(&self, capacity: usize) -> Receiver<BlockUpdate>;
}

/// Static parameters of a configured asset
#[derive(Debug, Clone)]
pub struct Asset {
	pub id: AssetId,
	pub symbol: String,
	/// Confirmations required before the counter-party's clock starts.
	pub swap_conf: u32,
	/// Upper bound on the fee rate required of swap transactions.
	pub max_fee_rate: u64,
}

/// An asset plus its chain backend
#[derive(Clone)]
pub struct BackedAsset {
	pub asset: Asset,
	pub backend: Arc<dyn Backend>,
}

impl fmt::Debug for BackedAsset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BackedAsset")
			.field("asset", &self.asset)
			.finish_non_exhaustive()
	}
}

/// Locks and unlocks order funding coins for one asset
///
/// Funding coins are locked at match creation and released when a swap is
/// fully confirmed (the contract spends them) or on revocation.
pub trait CoinLocker: Send + Sync {
	fn lock_order_coins(&self, orders: &[Order]);
	fn lock_coins(&self, coins: &HashMap<OrderId, Vec<CoinId>>);
	fn unlock_order_coins(&self, order_id: OrderId);
}

/// A backed asset paired with its coin locker
#[derive(Clone)]
pub struct LockableAsset {
	pub backed: BackedAsset,
	pub locker: Arc<dyn CoinLocker>,
}

impl LockableAsset {
	pub fn id(&self) -> AssetId {
		self.backed.asset.id
	}

	pub fn symbol(&self) -> &str {
		&self.backed.asset.symbol
	}
}
