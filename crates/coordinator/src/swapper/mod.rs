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

//! The swap coordinator.
//!
//! The [`Swapper`] supervises every match through the four-step settlement
//! negotiation: it validates init and redeem reports against on-chain
//! discovery, tracks confirmations as blocks arrive, enforces per-step
//! inaction deadlines, ascribes fault on revocation, and persists enough
//! state to resume after a restart.
//!
//! Architecture (one process-lifetime run):
//! - one block fan-in thread per configured asset, feeding a bounded channel
//! - one coin-waiter thread draining the latency queue
//! - one main loop thread owning confirmation processing and both inaction
//!   sweeps
//!
//! Handlers run on the host transport's dispatcher threads. They hold a
//! shared read lock for the duration of validation and waiter registration;
//! shutdown write-locks it to fence new handlers before the waiter queue is
//! drained for the state snapshot.

mod handlers;
mod inaction;
mod negotiate;

use std::{
	cmp::Reverse,
	collections::{BinaryHeap, HashMap, HashSet},
	fs,
	path::PathBuf,
	sync::{
		Arc, Mutex, MutexGuard, RwLock,
		atomic::{AtomicBool, AtomicU64, Ordering},
	},
	thread::{self, JoinHandle},
	time::{Duration, Instant},
};

use crossbeam::channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded, select, tick};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::asset::{BackendError, LockableAsset};
use crate::auth::AuthManager;
use crate::config::SwapperConfig;
use crate::latency::TickerQueue;
use crate::registry::{MatchRegistry, MatchTracker, SwapStatus};
use crate::snapshot::{
	self, HandlerArgs, SnapshotError, State, SwapStatusData, WaiterKey, file_hash,
	latest_state_file, load_state_file, save_state_file,
};
use crate::storage::Storage;
use crate::tracker::OrderSwapTracker;
use crate::unix_ms_now;
use bosun_sdk::msgs::{ErrorCode, Message, MsgError, Route};
use bosun_sdk::types::{AccountId, AssetId, CoinId, LimitOrder, Order, OrderId};

/// Callback asking the match book to remove an order. Returns whether the
/// order was on the book.
pub type UnbookHook = Box<dyn Fn(&LimitOrder) -> bool + Send + Sync>;

/// Error types for coordinator construction and state restoration
#[derive(Debug, Error)]
pub enum SwapperError {
	#[error("data folder {0} does not exist")]
	MissingDataDir(PathBuf),
	#[error("path {0} is not a directory")]
	DataDirNotDir(PathBuf),
	#[error("max fee rate of 0 is invalid for asset {0}")]
	ZeroMaxFeeRate(String),
	#[error("state file error: {0}")]
	Snapshot(#[from] SnapshotError),
	#[error("error getting state hash: {0}")]
	StateHash(#[from] crate::storage::StorageError),
	#[error("latest swap state file {0} failed consistency check")]
	StateHashMismatch(PathBuf),
	#[error("unable to find backend for asset {0} in restore state")]
	MissingRestoreAsset(AssetId),
}

/// A block notification forwarded from an asset's fan-in thread
#[derive(Debug, Clone)]
pub(crate) struct BlockNote {
	pub time: u64,
	pub asset_id: AssetId,
	pub err: Option<String>,
}

/// Guard pairing match processing with negotiation, so a concurrent swap
/// completion cannot mark an order complete between matching and tracking.
/// Obtain with [`Swapper::begin_match_and_negotiate`]; drop after
/// [`Swapper::negotiate`] returns.
pub struct MatchGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

/// The swap coordinator
pub struct Swapper {
	data_dir: PathBuf,
	/// All configured assets: backends plus coin lockers.
	pub(crate) coins: HashMap<AssetId, LockableAsset>,
	pub(crate) storage: Arc<dyn Storage>,
	pub(crate) auth_mgr: Arc<dyn AuthManager>,
	pub(crate) unbook_hook: UnbookHook,
	pub(crate) registry: MatchRegistry,
	pub(crate) orders: OrderSwapTracker,
	pub(crate) b_timeout: Duration,
	pub(crate) lock_time_taker: Duration,
	pub(crate) lock_time_maker: Duration,
	/// Longest a coin waiter may search for a transaction. Never exceeds
	/// `b_timeout`.
	pub(crate) tx_wait_expiration: Duration,
	pub(crate) latency_q: TickerQueue,
	/// Serializes negotiation against order-completion accounting.
	pub(crate) negotiate_mtx: Mutex<()>,
	/// Read-locked by handlers and negotiate for their full duration;
	/// write-locked by shutdown before setting the flag, fencing new coin
	/// waiters so the live-waiter map is final when snapshotted.
	pub(crate) handler_stop: RwLock<bool>,
	pub(crate) live_waiters: Mutex<HashMap<WaiterKey, HandlerArgs>>,
	req_id: AtomicU64,
}

impl Swapper {
	/// Construct the coordinator: validate configuration, restore saved
	/// state if present, and register the init/redeem routes.
	pub fn new(
		cfg: SwapperConfig,
		assets: HashMap<AssetId, LockableAsset>,
		auth_mgr: Arc<dyn AuthManager>,
		storage: Arc<dyn Storage>,
		unbook_hook: UnbookHook,
	) -> Result<Arc<Self>, SwapperError> {
		match fs::metadata(&cfg.data_dir) {
			Err(_) => return Err(SwapperError::MissingDataDir(cfg.data_dir)),
			Ok(meta) if !meta.is_dir() => return Err(SwapperError::DataDirNotDir(cfg.data_dir)),
			Ok(_) => {}
		}

		for asset in assets.values() {
			if asset.backed.asset.max_fee_rate == 0 {
				return Err(SwapperError::ZeroMaxFeeRate(asset.symbol().to_string()));
			}
		}

		// A waiter searching past the inaction deadline would be useless.
		let tx_wait_ms = cfg.tx_wait_expiration_ms.min(cfg.broadcast_timeout_ms);

		let swapper = Arc::new(Swapper {
			data_dir: cfg.data_dir.clone(),
			coins: assets,
			storage: storage.clone(),
			auth_mgr: auth_mgr.clone(),
			unbook_hook,
			registry: MatchRegistry::new(),
			orders: OrderSwapTracker::new(),
			b_timeout: Duration::from_millis(cfg.broadcast_timeout_ms),
			lock_time_taker: Duration::from_millis(cfg.lock_time_taker_ms),
			lock_time_maker: Duration::from_millis(cfg.lock_time_maker_ms),
			tx_wait_expiration: Duration::from_millis(tx_wait_ms),
			latency_q: TickerQueue::new(Duration::from_millis(cfg.recheck_interval_ms)),
			negotiate_mtx: Mutex::new(()),
			handler_stop: RwLock::new(false),
			live_waiters: Mutex::new(HashMap::new()),
			req_id: AtomicU64::new(0),
		});

		let state = swapper.initial_state(&cfg)?;
		if let Some(state) = state {
			info!(
				matches = state.match_trackers.len(),
				waiters = state.live_waiters.len(),
				"Loaded swap state"
			);
			swapper.restore_state(state, cfg.allow_partial_restore)?;
		}

		// The coordinator handles exactly two client-originating routes.
		let s = swapper.clone();
		auth_mgr.route(
			Route::Init,
			Box::new(move |user, msg| s.handle_init(user, msg)),
		);
		let s = swapper.clone();
		auth_mgr.route(
			Route::Redeem,
			Box::new(move |user, msg| s.handle_redeem(user, msg)),
		);

		Ok(swapper)
	}

	/// Locate and load the saved state per configuration: an explicit path
	/// wins; otherwise the newest file in the data directory, verified
	/// against the database-recorded hash.
	fn initial_state(&self, cfg: &SwapperConfig) -> Result<Option<State>, SwapperError> {
		if let Some(path) = &cfg.state_path {
			info!(path = %path.display(), "Loading swap state from user-specified file");
			return Ok(Some(load_state_file(path)?));
		}
		if cfg.ignore_state {
			return Ok(None);
		}

		info!(dir = %self.data_dir.display(), "Searching for swap state files");
		let Some(state_file) = latest_state_file(&self.data_dir)? else {
			info!("No swap state files found");
			return Ok(None);
		};

		let state_hash = self.storage.get_state_hash()?;
		// An empty hash means no state was ever recorded; nothing to load.
		if state_hash.is_empty() {
			return Ok(None);
		}

		let computed = file_hash(&state_file.name)?;
		if computed != state_hash {
			return Err(SwapperError::StateHashMismatch(state_file.name));
		}

		let state = load_state_file(&state_file.name)?;
		info!(path = %state_file.name.display(), "Loaded the most recent swap state file");
		Ok(Some(state))
	}

	fn restore_state(
		self: &Arc<Self>,
		state: State,
		allow_partial: bool,
	) -> Result<(), SwapperError> {
		// Check that the assets required by the saved state are configured.
		let mut missing: HashSet<AssetId> = HashSet::new();
		for id in &state.assets {
			if !self.coins.contains_key(id) {
				if !allow_partial {
					return Err(SwapperError::MissingRestoreAsset(*id));
				}
				warn!(asset = id, "No backend for asset in restore state");
				missing.insert(*id);
			}
		}

		for (mid, mtd) in state.match_trackers {
			let maker_swap = mtd.maker_status.swap_asset;
			let maker_redeem = mtd.maker_status.redeem_asset;
			if missing.contains(&maker_swap) || missing.contains(&maker_redeem) {
				info!(%mid, "Skipping match with missing asset");
				continue;
			}

			let tracker = MatchTracker::new(mtd.body, mtd.time);
			tracker.set_status(mtd.status);
			tracker.with_sigs(|sigs| *sigs = mtd.sigs.clone());

			let cp_maker_coin = mtd.maker_status.contract_coin.clone();
			let cp_taker_coin = mtd.taker_status.contract_coin.clone();
			if let Err(e) =
				self.rehydrate_status(&tracker.maker_status, &mtd.maker_status, &cp_taker_coin)
			{
				error!(%mid, "Loading match failed: {e}");
				continue;
			}
			if let Err(e) =
				self.rehydrate_status(&tracker.taker_status, &mtd.taker_status, &cp_maker_coin)
			{
				error!(%mid, "Loading match failed: {e}");
				continue;
			}

			self.registry.insert(Arc::new(tracker));
		}

		// Order completion/failure tracking data.
		self.orders.restore(state.order_stats);

		// Replay each persisted handler message through full validation,
		// which re-registers the coin waiters naturally.
		for (_, args) in state.live_waiters {
			let route = args.msg.route;
			let result = match route {
				Route::Init => self.handle_init(args.user, args.msg),
				Route::Redeem => self.handle_redeem(args.user, args.msg),
				_ => {
					error!(
						route = route.as_str(),
						"not a route that starts coin waiters"
					);
					continue;
				}
			};
			if let Err(e) = result {
				error!(route = route.as_str(), "Failed to reprocess message: {e}");
			}
		}

		Ok(())
	}

	/// Re-resolve a saved swap status's coins through the current backends.
	fn rehydrate_status(
		&self,
		status: &SwapStatus,
		data: &SwapStatusData,
		cp_contract_coin: &CoinId,
	) -> Result<(), BackendError> {
		let backend_for = |asset: AssetId| {
			self.coins
				.get(&asset)
				.map(|lockable| lockable.backed.backend.clone())
				.ok_or_else(|| BackendError::Backend(format!("no backend for asset {asset}")))
		};

		if !data.contract_coin.is_empty() {
			let backend = backend_for(data.swap_asset)?;
			let contract = backend.contract(&data.contract_coin, &data.contract_script)?;
			status.set_contract(contract, data.swap_time);
		}

		if data.swap_confirm_time != 0 {
			status.set_confirmed(data.swap_confirm_time);
		}

		if !data.redeem_coin.is_empty() {
			let backend = backend_for(data.redeem_asset)?;
			let redemption = backend.redemption(&data.redeem_coin, cp_contract_coin)?;
			status.set_redemption(redemption, data.redeem_time);
		}

		Ok(())
	}

	/// Write the state snapshot and record its hash in the database.
	fn save_state(&self) {
		let trackers = self.registry.all();
		let mut needed_assets: HashSet<AssetId> = HashSet::new();
		let mut match_trackers = HashMap::with_capacity(trackers.len());
		for mt in &trackers {
			needed_assets.insert(mt.body.base());
			needed_assets.insert(mt.body.quote());
			match_trackers.insert(mt.id(), snapshot::tracker_data(mt));
		}

		// Handlers are fenced and the waiter queue is stopped, so the
		// live-waiter map is final.
		let live_waiters = self.live_waiters.lock().unwrap().clone();

		let state = State {
			assets: needed_assets.into_iter().collect(),
			match_trackers,
			order_stats: self.orders.export(),
			live_waiters,
		};

		let path = match save_state_file(&self.data_dir, &state) {
			Ok(path) => path,
			Err(e) => {
				error!("Failed to save swap state file: {e}");
				return;
			}
		};
		info!(
			path = %path.display(),
			matches = state.match_trackers.len(),
			waiters = state.live_waiters.len(),
			"Saved swap state"
		);

		// Record the file hash for the startup consistency check.
		let hash = match file_hash(&path) {
			Ok(hash) => hash,
			Err(e) => {
				error!("error hashing swap state file: {e}");
				return;
			}
		};
		if let Err(e) = self.storage.set_state_hash(&hash) {
			error!("error storing state hash: {e}");
		}
	}

	/// Start the block fan-in threads, the coin-waiter queue, and the main
	/// loop. The returned handle stops everything and writes the state
	/// snapshot on [`SwapperHandle::shutdown`] or drop.
	pub fn start(self: &Arc<Self>) -> SwapperHandle {
		let shutdown = Arc::new(AtomicBool::new(false));
		let (stop_tx, stop_rx) = bounded(1);
		let (block_tx, block_rx) = bounded(32 * self.coins.len().max(1));
		let mut threads = Vec::with_capacity(self.coins.len() + 2);

		for (asset_id, lockable) in &self.coins {
			let source = lockable.backed.backend.block_channel(32);
			let tx = block_tx.clone();
			let sd = shutdown.clone();
			let id = *asset_id;
			threads.push(
				thread::Builder::new()
					.name(format!("block-fanin-{id}"))
					.spawn(move || Self::run_block_fanin(id, source, tx, sd))
					.expect("Failed to spawn block fan-in thread"),
			);
		}

		let s = self.clone();
		threads.push(
			thread::Builder::new()
				.name("coin-waiter".to_string())
				.spawn(move || s.latency_q.run())
				.expect("Failed to spawn coin waiter thread"),
		);

		let s = self.clone();
		threads.push(
			thread::Builder::new()
				.name("swap-main".to_string())
				.spawn(move || s.run_main_loop(block_rx, stop_rx))
				.expect("Failed to spawn swap main loop thread"),
		);

		info!(broadcast_timeout = ?self.b_timeout, "Swap coordinator started");

		SwapperHandle {
			swapper: self.clone(),
			shutdown,
			stop_tx,
			threads,
		}
	}

	fn run_block_fanin(
		asset_id: AssetId,
		source: Receiver<crate::asset::BlockUpdate>,
		tx: Sender<BlockNote>,
		shutdown: Arc<AtomicBool>,
	) {
		loop {
			if shutdown.load(Ordering::Relaxed) {
				return;
			}
			match source.recv_timeout(Duration::from_millis(250)) {
				Ok(update) => {
					let note = BlockNote {
						time: unix_ms_now(),
						asset_id,
						err: update.err,
					};
					// Do not block forever on a stalled main loop.
					loop {
						if shutdown.load(Ordering::Relaxed) {
							return;
						}
						match tx.send_timeout(note.clone(), Duration::from_millis(250)) {
							Ok(()) => break,
							Err(SendTimeoutError::Timeout(_)) => continue,
							Err(SendTimeoutError::Disconnected(_)) => return,
						}
					}
				}
				Err(RecvTimeoutError::Timeout) => {}
				Err(RecvTimeoutError::Disconnected) => {
					// Should not happen. Park until shutdown.
					error!(asset = asset_id, "asset closed the block channel");
					while !shutdown.load(Ordering::Relaxed) {
						thread::sleep(Duration::from_millis(250));
					}
					return;
				}
			}
		}
	}

	/// The main loop: applies block notifications, arms the derived
	/// block-based inaction deadlines, and drives the event-based sweep.
	fn run_main_loop(&self, block_rx: Receiver<BlockNote>, stop_rx: Receiver<()>) {
		let fatal = self.storage.fatal();
		let event_tick = tick(self.b_timeout / 4);

		// Pending block-based inaction checks, soonest first.
		let mut deadlines: BinaryHeap<Reverse<(Instant, AssetId)>> = BinaryHeap::new();

		// On startup, schedule a check for each asset. Ideally these would
		// be armed relative to the best block times.
		let start = Instant::now();
		for asset_id in self.coins.keys() {
			deadlines.push(Reverse((start + self.b_timeout, *asset_id)));
		}

		debug!("Swap main loop running");
		loop {
			// Fire any due block-based checks before sleeping again.
			let now = Instant::now();
			while let Some(&Reverse((at, asset_id))) = deadlines.peek() {
				if at > now {
					break;
				}
				deadlines.pop();
				self.check_inaction_block_based(asset_id);
			}

			let timeout = deadlines
				.peek()
				.map(|&Reverse((at, _))| at.saturating_duration_since(Instant::now()))
				.unwrap_or(self.b_timeout)
				.min(self.b_timeout);

			select! {
				recv(fatal) -> _ => {
					error!("Storage signaled a fatal error; stopping main loop");
					return;
				}
				recv(stop_rx) -> _ => return,
				recv(block_rx) -> note => {
					let Ok(note) = note else { return };
					if let Some(err) = &note.err {
						error!(asset = note.asset_id, "block notification error: {err}");
						continue;
					}
					// A block must be fully processed before its derived
					// inaction deadline is armed. Confirmation checks must
					// stay quick: a hung backend here stalls settlement.
					self.process_block(&note);
					deadlines.push(Reverse((Instant::now() + self.b_timeout, note.asset_id)));
				}
				recv(event_tick) -> _ => {
					self.check_inaction_event_based();
				}
				default(timeout) => {}
			}
		}
	}

	/// Take the coordination lock pairing matching with negotiation. Call
	/// before matching; drop after [`negotiate`](Swapper::negotiate).
	pub fn begin_match_and_negotiate(&self) -> MatchGuard<'_> {
		MatchGuard(self.negotiate_mtx.lock().unwrap())
	}

	/// Total quantity and count of a user's active swaps in a market. The
	/// market uses this to compute a user's order size limit.
	pub fn user_swapping_amt(&self, user: AccountId, base: AssetId, quote: AssetId) -> (u64, u64) {
		self.registry.user_swapping_amt(user, base, quote)
	}

	/// Whether both of the market's backends report synced.
	pub fn chains_synced(&self, base: AssetId, quote: AssetId) -> Result<bool, BackendError> {
		let b = self
			.coins
			.get(&base)
			.ok_or_else(|| BackendError::Backend(format!("no backend found for {base}")))?;
		if !b.backed.backend.synced()? {
			return Ok(false);
		}
		let q = self
			.coins
			.get(&quote)
			.ok_or_else(|| BackendError::Backend(format!("no backend found for {quote}")))?;
		q.backed.backend.synced()
	}

	/// Verify a funding coin exists and is unspent.
	pub fn check_unspent(&self, asset: AssetId, coin_id: &CoinId) -> Result<(), BackendError> {
		let backend = self
			.coins
			.get(&asset)
			.ok_or_else(|| BackendError::Backend(format!("unknown asset {asset}")))?;
		backend.backed.backend.verify_unspent_coin(coin_id)
	}

	/// Lock the backing coins of the provided orders, grouped per funding
	/// asset.
	pub fn lock_orders_coins(&self, orders: &[Order]) {
		let mut by_asset: HashMap<AssetId, Vec<Order>> = HashMap::new();
		for ord in orders {
			let Some(asset) = ord.funding_asset() else {
				continue;
			};
			by_asset.entry(asset).or_default().push(ord.clone());
		}

		for (asset, orders) in by_asset {
			match self.coins.get(&asset) {
				Some(lockable) => lockable.locker.lock_order_coins(&orders),
				None => error!(asset, "unable to lock coins for unknown asset"),
			}
		}
	}

	/// Lock specific coins of one asset, keyed by owning order.
	pub fn lock_coins(&self, asset: AssetId, coins: &HashMap<OrderId, Vec<CoinId>>) {
		match self.coins.get(&asset) {
			Some(lockable) => lockable.locker.lock_coins(coins),
			None => error!(asset, "unable to lock coins for unknown asset"),
		}
	}

	/// Release an order's funding coins. Not public: only the coordinator
	/// knows when they unlock (contract confirmation or revocation).
	pub(crate) fn unlock_order_coins(&self, ord: &Order) {
		let Some(asset) = ord.funding_asset() else {
			return;
		};
		match self.coins.get(&asset) {
			Some(lockable) => lockable.locker.unlock_order_coins(ord.id()),
			None => error!(asset, "unable to unlock coins for unknown asset"),
		}
	}

	pub(crate) fn next_req_id(&self) -> u64 {
		self.req_id.fetch_add(1, Ordering::Relaxed) + 1
	}

	pub(crate) fn set_live_waiter(&self, user: AccountId, msg: &Message) {
		let key = WaiterKey {
			msg_id: msg.id,
			user,
		};
		self.live_waiters.lock().unwrap().insert(
			key,
			HandlerArgs {
				user,
				msg: msg.clone(),
			},
		);
	}

	pub(crate) fn rm_live_waiter(&self, user: AccountId, msg_id: u64) {
		self.live_waiters
			.lock()
			.unwrap()
			.remove(&WaiterKey { msg_id, user });
	}

	pub(crate) fn respond_error(
		&self,
		id: u64,
		route: Route,
		user: AccountId,
		code: ErrorCode,
		err_msg: impl Into<String>,
	) {
		let err = MsgError::new(code, err_msg);
		debug!(user = %user, code = ?err.code, "Error going to user: {}", err.message);
		let msg = match Message::response(id, route, None, Some(err)) {
			Ok(msg) => msg,
			Err(e) => {
				error!("Failed to create error response: {e}");
				return;
			}
		};
		if let Err(e) = self.auth_mgr.send(user, msg) {
			info!(user = %user, "Unable to send error response to disconnected user: {e}");
		}
	}

	pub(crate) fn respond_success(
		&self,
		id: u64,
		route: Route,
		user: AccountId,
		result: serde_json::Value,
	) {
		let msg = match Message::response(id, route, Some(result), None) {
			Ok(msg) => msg,
			Err(e) => {
				error!("failed to create success response: {e}");
				return;
			}
		};
		if let Err(e) = self.auth_mgr.send(user, msg) {
			info!(user = %user, "Unable to send success response to disconnected user: {e}");
		}
	}

	pub(crate) fn b_timeout_ms(&self) -> u64 {
		self.b_timeout.as_millis() as u64
	}
}

/// Handle to a running coordinator
///
/// Shutdown sequence: fence the handlers, stop the waiter queue and block
/// fan-in, close the main loop, then write the state snapshot.
pub struct SwapperHandle {
	swapper: Arc<Swapper>,
	shutdown: Arc<AtomicBool>,
	stop_tx: Sender<()>,
	threads: Vec<JoinHandle<()>>,
}

impl SwapperHandle {
	/// Stop all coordinator threads and write the state snapshot.
	pub fn shutdown(mut self) {
		self.stop_inner();
	}

	fn stop_inner(&mut self) {
		if self.threads.is_empty() {
			return;
		}
		info!("Shutting down swap coordinator");

		// Block until active handlers return, then prevent new handlers
		// from starting coin waiters.
		{
			let mut stop = self.swapper.handler_stop.write().unwrap();
			*stop = true;
		}

		// Stop the waiter queue and the block fan-in threads.
		self.swapper.latency_q.stop();
		self.shutdown.store(true, Ordering::Relaxed);

		// Now stop the main loop.
		let _ = self.stop_tx.try_send(());

		for handle in self.threads.drain(..) {
			if let Err(e) = handle.join() {
				warn!("coordinator thread panicked: {:?}", e);
			}
		}

		self.swapper.save_state();
		info!("Swap coordinator stopped");
	}
}

impl Drop for SwapperHandle {
	fn drop(&mut self) {
		self.stop_inner();
	}
}
