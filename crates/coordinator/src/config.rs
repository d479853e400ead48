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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default log level for the coordinator
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Component name used in log file names
pub const LOG_COMPONENT_NAME: &str = "coordinator";
/// Whether console log output is enabled by default
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Swap coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapperConfig {
	/// Folder where swap state files are written on shutdown.
	pub data_dir: PathBuf,
	/// Accept a partial state restore when the configuration lacks assets
	/// required by the saved state. When false, a missing asset aborts
	/// startup.
	pub allow_partial_restore: bool,
	/// Grace period a party has to act after the triggering event, ms.
	pub broadcast_timeout_ms: u64,
	/// Minimum lock-time margin required of taker swap contracts, ms.
	pub lock_time_taker_ms: u64,
	/// Minimum lock-time margin required of maker swap contracts, ms.
	pub lock_time_maker_ms: u64,
	/// Longest a coin waiter may search for a transaction, ms. Clamped to
	/// `broadcast_timeout_ms` at construction.
	pub tx_wait_expiration_ms: u64,
	/// Coin waiter retry interval, ms.
	pub recheck_interval_ms: u64,
	/// Do not load the latest state file on startup.
	pub ignore_state: bool,
	/// Load state from this exact file instead of scanning the data
	/// directory. Supersedes `ignore_state`.
	pub state_path: Option<PathBuf>,
}

impl Default for SwapperConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			allow_partial_restore: false,
			broadcast_timeout_ms: 10 * 60 * 1000,
			lock_time_taker_ms: 8 * 60 * 60 * 1000,
			lock_time_maker_ms: 20 * 60 * 60 * 1000,
			tx_wait_expiration_ms: 2 * 60 * 1000,
			recheck_interval_ms: 3000,
			ignore_state: false,
			state_path: None,
		}
	}
}

impl SwapperConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("COORDINATOR"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("COORDINATOR"))
			.build()?;

		cfg.try_deserialize()
	}
}
