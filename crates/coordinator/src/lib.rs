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

//! Bosun Swap Coordinator
//!
//! This crate supervises matched orders through atomic cross-chain swap
//! settlement: the four-step contract/redemption negotiation, block-driven
//! confirmation tracking, inaction enforcement with fault ascription, and a
//! durable state snapshot for crash recovery.
//!
//! Architecture:
//! - Thread-per-concern: block fan-in per asset, one coin-waiter ticker,
//!   one main loop, cooperating over bounded channels
//! - Handlers run on the host transport's threads behind a shutdown fence
//! - The match registry exclusively owns trackers; sweeps and handlers
//!   follow a fixed outer-to-inner lock order
//!
//! The order book, authentication primitives, chain node drivers, database,
//! and transport are external collaborators consumed through the traits in
//! [`asset`], [`auth`], and [`storage`].

pub mod asset;
pub mod auth;
pub mod config;
pub mod latency;
pub mod logging;
pub mod registry;
pub mod snapshot;
pub mod step;
pub mod storage;
pub mod swapper;
pub mod tracker;

pub use asset::{Asset, BackedAsset, Backend, BackendError, CoinLocker, LockableAsset};
pub use auth::{AuthManager, CommsError, NoActionStep};
pub use config::SwapperConfig;
pub use latency::{TickResult, TickerQueue, Waiter};
pub use registry::{MatchRegistry, MatchSigs, MatchTracker, SwapStatus};
pub use snapshot::{HandlerArgs, SnapshotError, State, WaiterKey};
pub use step::{StepInformation, StepTargets, resolve_step, step_targets};
pub use storage::{MarketMatchId, Storage, StorageError};
pub use swapper::{MatchGuard, Swapper, SwapperError, SwapperHandle, UnbookHook};
pub use tracker::{OrderSwapStat, OrderSwapTracker};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UTC time in whole milliseconds. All coordinator timestamps are
/// millisecond-truncated.
pub fn unix_ms_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("system clock before epoch")
		.as_millis() as u64
}
