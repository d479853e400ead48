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

//! Shared mocks for coordinator integration tests: an in-memory chain
//! backend, a recording auth manager, and a recording storage.

#![allow(dead_code)]

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

use bosun_sdk::msgs::{
	Acknowledgement, Audit, Init, MatchNote, Message, MsgError, Redeem, Redemption, Route,
	Signable,
};
use bosun_sdk::signing::{sign_msg, verify_msg};
use bosun_sdk::types::{
	AccountId, AssetId, CoinId, LimitOrder, Match, MatchSet, Order, OrderId, Trade,
};
use bosun_swap::asset::{
	Asset, BackedAsset, Backend, BackendError, BlockUpdate, CoinLocker, Contract, LockableAsset,
	Redemption as RedemptionCoin,
};
use bosun_swap::auth::{
	AuthManager, CommsError, ExpireHandler, MsgHandler, NoActionStep, ResponseHandler,
};
use bosun_swap::storage::{MarketMatchId, Storage, StorageError};
use bosun_swap::{Swapper, SwapperConfig, SwapperError, UnbookHook};

pub const DCR: AssetId = 42;
pub const BTC: AssetId = 0;

/// 1 DCR in atoms.
pub const QTY: u64 = 1_0000_0000;
/// 0.0015 BTC/DCR in the encoded rate representation.
pub const RATE: u64 = 150_000;
/// The quote-side contract value for QTY at RATE.
pub const QUOTE_VAL: u64 = 150_000;

pub fn unix_ms_now() -> u64 {
	bosun_swap::unix_ms_now()
}

/// Poll `f` until it returns true or the timeout passes.
pub fn wait_for(timeout: Duration, mut f: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if f() {
			return true;
		}
		std::thread::sleep(Duration::from_millis(10));
	}
	f()
}

// ---------------------------------------------------------------------------
// Chain backend mock
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TestContract {
	pub coin_id: CoinId,
	pub value: u64,
	pub swap_address: String,
	pub fee_rate: u64,
	pub lock_time: u64,
	pub script: Vec<u8>,
	pub confs: Mutex<i64>,
}

impl Contract for TestContract {
	fn id(&self) -> CoinId {
		self.coin_id.clone()
	}

	fn value(&self) -> u64 {
		self.value
	}

	fn swap_address(&self) -> String {
		self.swap_address.clone()
	}

	fn fee_rate(&self) -> u64 {
		self.fee_rate
	}

	fn lock_time(&self) -> u64 {
		self.lock_time
	}

	fn redeem_script(&self) -> Vec<u8> {
		self.script.clone()
	}

	fn confirmations(&self) -> Result<i64, BackendError> {
		Ok(*self.confs.lock().unwrap())
	}
}

#[derive(Debug, Clone)]
pub struct TestRedemption {
	pub coin_id: CoinId,
	/// The contract output this redemption spends.
	pub spends: CoinId,
}

impl RedemptionCoin for TestRedemption {
	fn id(&self) -> CoinId {
		self.coin_id.clone()
	}

	fn confirmations(&self) -> Result<i64, BackendError> {
		Ok(1)
	}
}

/// An in-memory chain: contracts and redemptions by coin id, with optional
/// delayed visibility to exercise the coin waiters.
#[derive(Default)]
pub struct TestBackend {
	contracts: Mutex<HashMap<CoinId, Arc<TestContract>>>,
	redemptions: Mutex<HashMap<CoinId, TestRedemption>>,
	/// Coins that report "not found" this many more times before resolving.
	hidden: Mutex<HashMap<CoinId, u32>>,
	pub contract_calls: Mutex<u32>,
	pub fee_rate: Mutex<u64>,
	block_senders: Mutex<Vec<Sender<BlockUpdate>>>,
}

impl TestBackend {
	pub fn new(fee_rate: u64) -> Arc<Self> {
		Arc::new(TestBackend {
			fee_rate: Mutex::new(fee_rate),
			..TestBackend::default()
		})
	}

	pub fn add_contract(&self, contract: TestContract) {
		self.contracts
			.lock()
			.unwrap()
			.insert(contract.coin_id.clone(), Arc::new(contract));
	}

	pub fn add_redemption(&self, redemption: TestRedemption) {
		self.redemptions
			.lock()
			.unwrap()
			.insert(redemption.coin_id.clone(), redemption);
	}

	/// Make a coin report "not found" for the next `times` lookups.
	pub fn hide_coin(&self, coin_id: &CoinId, times: u32) {
		self.hidden.lock().unwrap().insert(coin_id.clone(), times);
	}

	/// Announce a new block to every subscriber.
	pub fn send_block(&self) {
		for tx in self.block_senders.lock().unwrap().iter() {
			let _ = tx.send(BlockUpdate { err: None });
		}
	}

	fn still_hidden(&self, coin_id: &CoinId) -> bool {
		let mut hidden = self.hidden.lock().unwrap();
		match hidden.get_mut(coin_id) {
			Some(0) | None => {
				hidden.remove(coin_id);
				false
			}
			Some(n) => {
				*n -= 1;
				true
			}
		}
	}
}

impl Backend for TestBackend {
	fn contract(
		&self,
		coin_id: &CoinId,
		script: &[u8],
	) -> Result<Arc<dyn Contract>, BackendError> {
		*self.contract_calls.lock().unwrap() += 1;
		if self.still_hidden(coin_id) {
			return Err(BackendError::CoinNotFound);
		}
		let contracts = self.contracts.lock().unwrap();
		let contract = contracts.get(coin_id).ok_or(BackendError::CoinNotFound)?;
		if contract.script != script {
			return Err(BackendError::InvalidContract("script mismatch".into()));
		}
		Ok(contract.clone())
	}

	fn redemption(
		&self,
		coin_id: &CoinId,
		contract_coin: &CoinId,
	) -> Result<Arc<dyn RedemptionCoin>, BackendError> {
		if self.still_hidden(coin_id) {
			return Err(BackendError::CoinNotFound);
		}
		let redemptions = self.redemptions.lock().unwrap();
		let redemption = redemptions.get(coin_id).ok_or(BackendError::CoinNotFound)?;
		if redemption.spends != *contract_coin {
			return Err(BackendError::Backend(
				"redemption does not spend the contract".into(),
			));
		}
		Ok(Arc::new(redemption.clone()))
	}

	fn validate_coin_id(&self, coin_id: &CoinId) -> Result<String, BackendError> {
		if coin_id.is_empty() {
			return Err(BackendError::InvalidCoinId("empty".into()));
		}
		Ok(hex::encode(coin_id))
	}

	fn validate_contract(&self, script: &[u8]) -> Result<(), BackendError> {
		if script.is_empty() {
			return Err(BackendError::InvalidContract("empty".into()));
		}
		Ok(())
	}

	fn validate_secret(&self, secret: &[u8], contract_script: &[u8]) -> bool {
		Sha256::digest(secret).as_slice() == contract_script
	}

	fn verify_unspent_coin(&self, _coin_id: &CoinId) -> Result<(), BackendError> {
		Ok(())
	}

	fn fee_rate(&self) -> Result<u64, BackendError> {
		Ok(*self.fee_rate.lock().unwrap())
	}

	fn synced(&self) -> Result<bool, BackendError> {
		Ok(true)
	}

	fn block_channel(&self, capacity: usize) -> Receiver<BlockUpdate> {
		let (tx, rx) = bounded(capacity);
		self.block_senders.lock().unwrap().push(tx);
		rx
	}
}

/// Records coin lock and unlock calls.
#[derive(Default)]
pub struct TestLocker {
	pub locked: Mutex<Vec<OrderId>>,
	pub unlocked: Mutex<Vec<OrderId>>,
}

impl TestLocker {
	pub fn unlocked_contains(&self, oid: OrderId) -> bool {
		self.unlocked.lock().unwrap().contains(&oid)
	}
}

impl CoinLocker for TestLocker {
	fn lock_order_coins(&self, orders: &[Order]) {
		let mut locked = self.locked.lock().unwrap();
		locked.extend(orders.iter().map(|o| o.id()));
	}

	fn lock_coins(&self, coins: &HashMap<OrderId, Vec<CoinId>>) {
		let mut locked = self.locked.lock().unwrap();
		locked.extend(coins.keys().copied());
	}

	fn unlock_order_coins(&self, order_id: OrderId) {
		self.unlocked.lock().unwrap().push(order_id);
	}
}

// ---------------------------------------------------------------------------
// Auth manager mock
// ---------------------------------------------------------------------------

pub struct PendingRequest {
	pub user: AccountId,
	pub msg: Message,
	pub handler: ResponseHandler,
}

/// Signature-checking, everything-recording auth manager.
pub struct TestAuthManager {
	server_key: SigningKey,
	user_keys: Mutex<HashMap<AccountId, [u8; 32]>>,
	routes: Mutex<HashMap<Route, MsgHandler>>,
	pub sent: Mutex<Vec<(AccountId, Message)>>,
	requests: Mutex<Vec<PendingRequest>>,
	pub swap_successes: Mutex<Vec<(AccountId, u64)>>,
	pub inactions: Mutex<Vec<(AccountId, NoActionStep, u64, OrderId)>>,
	pub completed_orders: Mutex<Vec<(AccountId, OrderId, u64)>>,
	pub cancels: Mutex<Vec<(AccountId, OrderId, OrderId)>>,
}

impl TestAuthManager {
	pub fn new() -> Arc<Self> {
		Arc::new(TestAuthManager {
			server_key: SigningKey::from_bytes(&[99; 32]),
			user_keys: Mutex::new(HashMap::new()),
			routes: Mutex::new(HashMap::new()),
			sent: Mutex::new(Vec::new()),
			requests: Mutex::new(Vec::new()),
			swap_successes: Mutex::new(Vec::new()),
			inactions: Mutex::new(Vec::new()),
			completed_orders: Mutex::new(Vec::new()),
			cancels: Mutex::new(Vec::new()),
		})
	}

	pub fn register_user(&self, user: AccountId, key: &SigningKey) {
		self.user_keys
			.lock()
			.unwrap()
			.insert(user, key.verifying_key().to_bytes());
	}

	/// Simulate an inbound client message on a registered route.
	pub fn deliver(&self, route: Route, user: AccountId, msg: Message) -> Result<(), MsgError> {
		let routes = self.routes.lock().unwrap();
		let handler = routes.get(&route).expect("route not registered");
		handler(user, msg)
	}

	pub fn pending_request_count(&self) -> usize {
		self.requests.lock().unwrap().len()
	}

	pub fn take_requests(&self) -> Vec<PendingRequest> {
		std::mem::take(&mut *self.requests.lock().unwrap())
	}

	/// Pop every pending outgoing request and answer it with a properly
	/// signed acknowledgement from the receiving user.
	pub fn ack_requests(&self, keys: &HashMap<AccountId, SigningKey>) -> usize {
		let pending = self.take_requests();
		let count = pending.len();
		for req in pending {
			let key = keys.get(&req.user).expect("no key for user");
			let resp = ack_response(&req.msg, key);
			(req.handler)(resp);
		}
		count
	}

	/// Routes of every request sent so far, in order.
	pub fn request_routes(&self) -> Vec<Route> {
		self.requests
			.lock()
			.unwrap()
			.iter()
			.map(|r| r.msg.route)
			.collect()
	}

	/// All notifications sent to `user` on `route`.
	pub fn notifications(&self, user: AccountId, route: Route) -> Vec<Message> {
		self.sent
			.lock()
			.unwrap()
			.iter()
			.filter(|(u, m)| {
				*u == user
					&& m.route == route
					&& m.mtype == bosun_sdk::msgs::MessageType::Notification
			})
			.map(|(_, m)| m.clone())
			.collect()
	}

	/// All response payloads sent to `user`.
	pub fn responses(&self, user: AccountId) -> Vec<bosun_sdk::msgs::ResponsePayload> {
		self.sent
			.lock()
			.unwrap()
			.iter()
			.filter(|(u, m)| *u == user && m.mtype == bosun_sdk::msgs::MessageType::Response)
			.filter_map(|(_, m)| m.parse().ok())
			.collect()
	}

	pub fn error_codes(&self, user: AccountId) -> Vec<bosun_sdk::msgs::ErrorCode> {
		self.responses(user)
			.into_iter()
			.filter_map(|p| p.error.map(|e| e.code))
			.collect()
	}
}

/// Build the signed acknowledgement response a client would return for an
/// audit, redemption, or match request.
fn ack_response(req: &Message, key: &SigningKey) -> Message {
	let result = match req.route {
		Route::Audit => {
			let params: Audit = req.parse().unwrap();
			let ack = Acknowledgement {
				match_id: params.match_id,
				sig: sign_msg(key, &params.sig_msg()),
			};
			serde_json::to_value(ack).unwrap()
		}
		Route::Redemption => {
			let params: Redemption = req.parse().unwrap();
			let ack = Acknowledgement {
				match_id: params.redeem.match_id,
				sig: sign_msg(key, &params.sig_msg()),
			};
			serde_json::to_value(ack).unwrap()
		}
		Route::Match => {
			let notes: Vec<MatchNote> = req.parse().unwrap();
			let acks: Vec<Acknowledgement> = notes
				.iter()
				.map(|note| Acknowledgement {
					match_id: note.match_id,
					sig: sign_msg(key, &note.sig_msg()),
				})
				.collect();
			serde_json::to_value(acks).unwrap()
		}
		other => panic!("unexpected request route {other:?}"),
	};
	Message::response(req.id, req.route, Some(result), None).unwrap()
}

impl AuthManager for TestAuthManager {
	fn route(&self, route: Route, handler: MsgHandler) {
		self.routes.lock().unwrap().insert(route, handler);
	}

	fn auth(&self, user: AccountId, msg: &[u8], sig: &[u8]) -> Result<(), MsgError> {
		let keys = self.user_keys.lock().unwrap();
		let key = keys.get(&user).ok_or_else(|| {
			MsgError::new(bosun_sdk::msgs::ErrorCode::SignatureError, "unknown user")
		})?;
		verify_msg(key, msg, sig).map_err(|e| {
			MsgError::new(bosun_sdk::msgs::ErrorCode::SignatureError, e.to_string())
		})
	}

	fn sign(&self, signable: &mut dyn Signable) {
		let sig = sign_msg(&self.server_key, &signable.sig_msg());
		signable.set_sig(sig);
	}

	fn send(&self, user: AccountId, msg: Message) -> Result<(), CommsError> {
		self.sent.lock().unwrap().push((user, msg));
		Ok(())
	}

	fn request(
		&self,
		user: AccountId,
		req: Message,
		handler: ResponseHandler,
	) -> Result<(), CommsError> {
		self.requests.lock().unwrap().push(PendingRequest {
			user,
			msg: req,
			handler,
		});
		Ok(())
	}

	fn request_with_timeout(
		&self,
		user: AccountId,
		req: Message,
		handler: ResponseHandler,
		_expire_timeout: Duration,
		_expire_fn: ExpireHandler,
	) -> Result<(), CommsError> {
		self.request(user, req, handler)
	}

	fn swap_success(&self, user: AccountId, _mmid: MarketMatchId, value: u64, _ref_time_ms: u64) {
		self.swap_successes.lock().unwrap().push((user, value));
	}

	fn inaction(
		&self,
		user: AccountId,
		misstep: NoActionStep,
		_mmid: MarketMatchId,
		_match_value: u64,
		ref_time_ms: u64,
		order_id: OrderId,
	) {
		self.inactions
			.lock()
			.unwrap()
			.push((user, misstep, ref_time_ms, order_id));
	}

	fn record_cancel(&self, user: AccountId, oid: OrderId, target: OrderId, _time_ms: u64) {
		self.cancels.lock().unwrap().push((user, oid, target));
	}

	fn record_completed_order(&self, user: AccountId, oid: OrderId, time_ms: u64) {
		self.completed_orders.lock().unwrap().push((user, oid, time_ms));
	}
}

// ---------------------------------------------------------------------------
// Storage mock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredContract {
	pub mid: MarketMatchId,
	pub contract: Vec<u8>,
	pub coin_id: CoinId,
	pub time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct StoredRedeem {
	pub mid: MarketMatchId,
	pub coin_id: CoinId,
	pub secret: Option<Vec<u8>>,
	pub time_ms: u64,
}

/// Records every persistence call; optionally fails contract saves.
pub struct TestStorage {
	fatal_tx: Sender<()>,
	fatal_rx: Receiver<()>,
	pub matches: Mutex<Vec<Match>>,
	pub canceled_orders: Mutex<Vec<OrderId>>,
	pub complete_times: Mutex<Vec<(OrderId, u64)>>,
	pub contracts_a: Mutex<Vec<StoredContract>>,
	pub contracts_b: Mutex<Vec<StoredContract>>,
	pub redeems_a: Mutex<Vec<StoredRedeem>>,
	pub redeems_b: Mutex<Vec<StoredRedeem>>,
	pub match_acks_a: Mutex<Vec<(MarketMatchId, Vec<u8>)>>,
	pub match_acks_b: Mutex<Vec<(MarketMatchId, Vec<u8>)>>,
	pub audit_acks_a: Mutex<Vec<(MarketMatchId, Vec<u8>)>>,
	pub audit_acks_b: Mutex<Vec<(MarketMatchId, Vec<u8>)>>,
	pub redeem_acks_b: Mutex<Vec<(MarketMatchId, Vec<u8>)>>,
	pub inactive: Mutex<Vec<MarketMatchId>>,
	pub state_hash: Mutex<Vec<u8>>,
}

impl TestStorage {
	pub fn new() -> Arc<Self> {
		let (fatal_tx, fatal_rx) = unbounded();
		Arc::new(TestStorage {
			fatal_tx,
			fatal_rx,
			matches: Mutex::new(Vec::new()),
			canceled_orders: Mutex::new(Vec::new()),
			complete_times: Mutex::new(Vec::new()),
			contracts_a: Mutex::new(Vec::new()),
			contracts_b: Mutex::new(Vec::new()),
			redeems_a: Mutex::new(Vec::new()),
			redeems_b: Mutex::new(Vec::new()),
			match_acks_a: Mutex::new(Vec::new()),
			match_acks_b: Mutex::new(Vec::new()),
			audit_acks_a: Mutex::new(Vec::new()),
			audit_acks_b: Mutex::new(Vec::new()),
			redeem_acks_b: Mutex::new(Vec::new()),
			inactive: Mutex::new(Vec::new()),
			state_hash: Mutex::new(Vec::new()),
		})
	}

	pub fn trigger_fatal(&self) {
		let _ = self.fatal_tx.send(());
	}
}

impl Storage for TestStorage {
	fn last_err(&self) -> Option<StorageError> {
		None
	}

	fn fatal(&self) -> Receiver<()> {
		self.fatal_rx.clone()
	}

	fn insert_match(&self, m: &Match) -> Result<(), StorageError> {
		self.matches.lock().unwrap().push(m.clone());
		Ok(())
	}

	fn cancel_order(&self, lo: &LimitOrder) -> Result<(), StorageError> {
		self.canceled_orders.lock().unwrap().push(lo.id);
		Ok(())
	}

	fn revoke_order(&self, _ord: &Order) -> Result<(OrderId, u64), StorageError> {
		Ok((OrderId([0; 32]), unix_ms_now()))
	}

	fn set_order_complete_time(&self, ord: &Order, time_ms: u64) -> Result<(), StorageError> {
		self.complete_times.lock().unwrap().push((ord.id(), time_ms));
		Ok(())
	}

	fn save_contract_a(
		&self,
		mid: MarketMatchId,
		contract: &[u8],
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError> {
		self.contracts_a.lock().unwrap().push(StoredContract {
			mid,
			contract: contract.to_vec(),
			coin_id: coin_id.clone(),
			time_ms,
		});
		Ok(())
	}

	fn save_contract_b(
		&self,
		mid: MarketMatchId,
		contract: &[u8],
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError> {
		self.contracts_b.lock().unwrap().push(StoredContract {
			mid,
			contract: contract.to_vec(),
			coin_id: coin_id.clone(),
			time_ms,
		});
		Ok(())
	}

	fn save_redeem_a(
		&self,
		mid: MarketMatchId,
		coin_id: &CoinId,
		secret: &[u8],
		time_ms: u64,
	) -> Result<(), StorageError> {
		self.redeems_a.lock().unwrap().push(StoredRedeem {
			mid,
			coin_id: coin_id.clone(),
			secret: Some(secret.to_vec()),
			time_ms,
		});
		Ok(())
	}

	fn save_redeem_b(
		&self,
		mid: MarketMatchId,
		coin_id: &CoinId,
		time_ms: u64,
	) -> Result<(), StorageError> {
		self.redeems_b.lock().unwrap().push(StoredRedeem {
			mid,
			coin_id: coin_id.clone(),
			secret: None,
			time_ms,
		});
		Ok(())
	}

	fn save_match_ack_sig_a(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError> {
		self.match_acks_a.lock().unwrap().push((mid, sig.to_vec()));
		Ok(())
	}

	fn save_match_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError> {
		self.match_acks_b.lock().unwrap().push((mid, sig.to_vec()));
		Ok(())
	}

	fn save_audit_ack_sig_a(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError> {
		self.audit_acks_a.lock().unwrap().push((mid, sig.to_vec()));
		Ok(())
	}

	fn save_audit_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError> {
		self.audit_acks_b.lock().unwrap().push((mid, sig.to_vec()));
		Ok(())
	}

	fn save_redeem_ack_sig_b(&self, mid: MarketMatchId, sig: &[u8]) -> Result<(), StorageError> {
		self.redeem_acks_b.lock().unwrap().push((mid, sig.to_vec()));
		Ok(())
	}

	fn set_match_inactive(&self, mid: MarketMatchId) {
		self.inactive.lock().unwrap().push(mid);
	}

	fn get_state_hash(&self) -> Result<Vec<u8>, StorageError> {
		Ok(self.state_hash.lock().unwrap().clone())
	}

	fn set_state_hash(&self, hash: &[u8]) -> Result<(), StorageError> {
		*self.state_hash.lock().unwrap() = hash.to_vec();
		Ok(())
	}
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
	pub swapper: Arc<Swapper>,
	pub auth: Arc<TestAuthManager>,
	pub storage: Arc<TestStorage>,
	pub dcr: Arc<TestBackend>,
	pub btc: Arc<TestBackend>,
	pub dcr_locker: Arc<TestLocker>,
	pub btc_locker: Arc<TestLocker>,
	pub unbooked: Arc<Mutex<Vec<OrderId>>>,
	pub dir: tempfile::TempDir,
	pub cfg: SwapperConfig,
	pub maker: AccountId,
	pub taker: AccountId,
	pub maker_key: SigningKey,
	pub taker_key: SigningKey,
	msg_id: Mutex<u64>,
}

impl Harness {
	pub fn new(broadcast_timeout_ms: u64, recheck_interval_ms: u64) -> Harness {
		let dir = tempfile::tempdir().unwrap();
		let cfg = SwapperConfig {
			data_dir: dir.path().to_path_buf(),
			broadcast_timeout_ms,
			recheck_interval_ms,
			lock_time_taker_ms: 60_000,
			lock_time_maker_ms: 120_000,
			..SwapperConfig::default()
		};

		let storage = TestStorage::new();
		let dcr = TestBackend::new(10);
		let btc = TestBackend::new(20);
		let dcr_locker = Arc::new(TestLocker::default());
		let btc_locker = Arc::new(TestLocker::default());
		let auth = TestAuthManager::new();

		let maker_key = SigningKey::from_bytes(&[1; 32]);
		let taker_key = SigningKey::from_bytes(&[2; 32]);
		let maker = AccountId([0x0A; 32]);
		let taker = AccountId([0x0B; 32]);
		auth.register_user(maker, &maker_key);
		auth.register_user(taker, &taker_key);

		let unbooked = Arc::new(Mutex::new(Vec::new()));
		let swapper = build_swapper(
			&cfg,
			full_assets(&dcr, &btc, &dcr_locker, &btc_locker),
			&auth,
			&storage,
			&unbooked,
		)
		.unwrap();

		Harness {
			swapper,
			auth,
			storage,
			dcr,
			btc,
			dcr_locker,
			btc_locker,
			unbooked,
			dir,
			cfg,
			maker,
			taker,
			maker_key,
			taker_key,
			msg_id: Mutex::new(100),
		}
	}

	pub fn keys(&self) -> HashMap<AccountId, SigningKey> {
		let mut keys = HashMap::new();
		keys.insert(self.maker, self.maker_key.clone());
		keys.insert(self.taker, self.taker_key.clone());
		keys
	}

	/// Construct a fresh swapper against the same storage, backends, and
	/// data directory, as a process restart would.
	pub fn respawn(&self) -> Result<(Arc<Swapper>, Arc<TestAuthManager>), SwapperError> {
		let auth = TestAuthManager::new();
		auth.register_user(self.maker, &self.maker_key);
		auth.register_user(self.taker, &self.taker_key);
		let swapper = build_swapper(
			&self.cfg,
			full_assets(&self.dcr, &self.btc, &self.dcr_locker, &self.btc_locker),
			&auth,
			&self.storage,
			&self.unbooked,
		)?;
		Ok((swapper, auth))
	}

	/// Respawn with only the DCR asset configured.
	pub fn respawn_partial(
		&self,
		allow_partial: bool,
	) -> Result<(Arc<Swapper>, Arc<TestAuthManager>), SwapperError> {
		let auth = TestAuthManager::new();
		auth.register_user(self.maker, &self.maker_key);
		auth.register_user(self.taker, &self.taker_key);
		let mut assets = HashMap::new();
		assets.insert(DCR, lockable(DCR, "DCR", &self.dcr, &self.dcr_locker));
		let cfg = SwapperConfig {
			allow_partial_restore: allow_partial,
			..self.cfg.clone()
		};
		let swapper = build_swapper(&cfg, assets, &auth, &self.storage, &self.unbooked)?;
		Ok((swapper, auth))
	}

	pub fn next_msg_id(&self) -> u64 {
		let mut id = self.msg_id.lock().unwrap();
		*id += 1;
		*id
	}

	pub fn maker_order(&self) -> LimitOrder {
		LimitOrder {
			id: OrderId([11; 32]),
			user: self.maker,
			base: DCR,
			quote: BTC,
			rate: RATE,
			trade: Trade {
				sell: true,
				quantity: QTY,
				swap_address: "maker-swap-addr".into(),
				funding_coins: vec![vec![0xAA]],
			},
		}
	}

	pub fn taker_order(&self) -> LimitOrder {
		LimitOrder {
			id: OrderId([22; 32]),
			user: self.taker,
			base: DCR,
			quote: BTC,
			rate: RATE,
			trade: Trade {
				sell: false,
				quantity: QTY,
				swap_address: "taker-swap-addr".into(),
				funding_coins: vec![vec![0xBB]],
			},
		}
	}

	pub fn the_match(&self) -> Match {
		Match {
			maker: self.maker_order(),
			taker: Order::Limit(self.taker_order()),
			quantity: QTY,
			rate: RATE,
			epoch_end: unix_ms_now(),
			fee_rate_base: 10,
			fee_rate_quote: 20,
		}
	}

	/// Negotiate a single maker/taker match, both orders on their final
	/// swap. Returns the match id and its epoch end time.
	pub fn negotiate_one(&self) -> (bosun_sdk::types::MatchId, u64) {
		let m = self.the_match();
		let epoch_end = m.epoch_end;
		let set = MatchSet {
			taker: m.taker.clone(),
			makers: vec![m.maker.clone()],
			amounts: vec![QTY],
			rates: vec![RATE],
			epoch_end,
		};
		let mut final_swap = HashMap::new();
		final_swap.insert(self.maker_order().id, true);
		final_swap.insert(self.taker_order().id, true);

		let guard = self.swapper.begin_match_and_negotiate();
		self.swapper.negotiate(&guard, vec![set], &final_swap);
		drop(guard);
		(m.id(), epoch_end)
	}

	/// Build a signed `init` message for the given party.
	pub fn init_msg(
		&self,
		key: &SigningKey,
		order_id: OrderId,
		match_id: bosun_sdk::types::MatchId,
		coin_id: CoinId,
		contract: Vec<u8>,
	) -> Message {
		let mut params = Init {
			order_id,
			match_id,
			coin_id,
			contract,
			sig: Vec::new(),
		};
		params.set_sig(sign_msg(key, &params.sig_msg()));
		Message::request(self.next_msg_id(), Route::Init, &params).unwrap()
	}

	/// Build a signed `redeem` message for the given party.
	pub fn redeem_msg(
		&self,
		key: &SigningKey,
		order_id: OrderId,
		match_id: bosun_sdk::types::MatchId,
		coin_id: CoinId,
		secret: Vec<u8>,
	) -> Message {
		let mut params = Redeem {
			order_id,
			match_id,
			coin_id,
			secret,
			sig: Vec::new(),
		};
		params.set_sig(sign_msg(key, &params.sig_msg()));
		Message::request(self.next_msg_id(), Route::Redeem, &params).unwrap()
	}
}

fn lockable(
	id: AssetId,
	symbol: &str,
	backend: &Arc<TestBackend>,
	locker: &Arc<TestLocker>,
) -> LockableAsset {
	LockableAsset {
		backed: BackedAsset {
			asset: Asset {
				id,
				symbol: symbol.to_string(),
				swap_conf: 1,
				max_fee_rate: 100,
			},
			backend: backend.clone(),
		},
		locker: locker.clone(),
	}
}

fn full_assets(
	dcr: &Arc<TestBackend>,
	btc: &Arc<TestBackend>,
	dcr_locker: &Arc<TestLocker>,
	btc_locker: &Arc<TestLocker>,
) -> HashMap<AssetId, LockableAsset> {
	let mut assets = HashMap::new();
	assets.insert(DCR, lockable(DCR, "DCR", dcr, dcr_locker));
	assets.insert(BTC, lockable(BTC, "BTC", btc, btc_locker));
	assets
}

fn build_swapper(
	cfg: &SwapperConfig,
	assets: HashMap<AssetId, LockableAsset>,
	auth: &Arc<TestAuthManager>,
	storage: &Arc<TestStorage>,
	unbooked: &Arc<Mutex<Vec<OrderId>>>,
) -> Result<Arc<Swapper>, SwapperError> {
	let unbooked = unbooked.clone();
	let hook: UnbookHook = Box::new(move |lo: &LimitOrder| {
		unbooked.lock().unwrap().push(lo.id);
		true
	});
	Swapper::new(cfg.clone(), assets, auth.clone(), storage.clone(), hook)
}

// ---------------------------------------------------------------------------
// Scenario drivers
// ---------------------------------------------------------------------------

pub const WAIT: Duration = Duration::from_secs(5);

/// Run a fresh match through negotiation and both parties' match acks.
pub fn negotiate_and_ack(h: &Harness) -> (bosun_sdk::types::MatchId, u64) {
	let (mid, epoch_end) = h.negotiate_one();
	assert!(
		wait_for(WAIT, || h.auth.pending_request_count() >= 2),
		"match ack requests not sent"
	);
	assert_eq!(h.auth.ack_requests(&h.keys()), 2);
	assert!(wait_for(WAIT, || {
		h.storage.match_acks_a.lock().unwrap().len() == 1
			&& h.storage.match_acks_b.lock().unwrap().len() == 1
	}));
	(mid, epoch_end)
}

/// Post the maker's DCR contract and drive it through discovery, the
/// taker's audit ack, and confirmation.
pub fn maker_swap(
	h: &Harness,
	mid: bosun_sdk::types::MatchId,
	epoch_end: u64,
	script: &[u8],
) -> CoinId {
	let maker_coin = vec![0xD1];
	let lock_time = epoch_end + h.cfg.lock_time_maker_ms + 60_000;
	h.dcr.add_contract(contract(
		maker_coin.clone(),
		QTY,
		"taker-swap-addr",
		lock_time,
		script.to_vec(),
	));
	let msg = h.init_msg(
		&h.maker_key,
		h.maker_order().id,
		mid,
		maker_coin.clone(),
		script.to_vec(),
	);
	h.auth.deliver(Route::Init, h.maker, msg).unwrap();

	// The taker is asked to audit the discovered contract.
	assert!(
		wait_for(WAIT, || h.auth.pending_request_count() >= 1),
		"audit request not sent"
	);
	assert_eq!(h.auth.request_routes(), vec![Route::Audit]);
	h.auth.ack_requests(&h.keys());
	assert!(wait_for(WAIT, || {
		h.storage.audit_acks_b.lock().unwrap().len() == 1
	}));

	// A DCR block confirms the maker's swap and frees their funding coins.
	h.dcr.send_block();
	assert!(
		wait_for(WAIT, || h.dcr_locker.unlocked_contains(h.maker_order().id)),
		"maker funding coins not unlocked after confirmation"
	);
	maker_coin
}

/// Post the taker's BTC contract and drive it through discovery, the
/// maker's audit ack, and confirmation.
pub fn taker_swap(
	h: &Harness,
	mid: bosun_sdk::types::MatchId,
	epoch_end: u64,
	script: &[u8],
) -> CoinId {
	let taker_coin = vec![0xB1];
	let lock_time = epoch_end + h.cfg.lock_time_taker_ms + 60_000;
	h.btc.add_contract(contract(
		taker_coin.clone(),
		QUOTE_VAL,
		"maker-swap-addr",
		lock_time,
		script.to_vec(),
	));
	let msg = h.init_msg(
		&h.taker_key,
		h.taker_order().id,
		mid,
		taker_coin.clone(),
		script.to_vec(),
	);
	h.auth.deliver(Route::Init, h.taker, msg).unwrap();

	assert!(
		wait_for(WAIT, || h.auth.pending_request_count() >= 1),
		"audit request not sent"
	);
	assert_eq!(h.auth.request_routes(), vec![Route::Audit]);
	h.auth.ack_requests(&h.keys());
	assert!(wait_for(WAIT, || {
		h.storage.audit_acks_a.lock().unwrap().len() == 1
	}));

	h.btc.send_block();
	assert!(
		wait_for(WAIT, || h.btc_locker.unlocked_contains(h.taker_order().id)),
		"taker funding coins not unlocked after confirmation"
	);
	taker_coin
}

/// The maker redeems the taker's contract, revealing the secret, and the
/// taker acknowledges the forwarded redemption.
pub fn maker_redeem(
	h: &Harness,
	mid: bosun_sdk::types::MatchId,
	taker_coin: &CoinId,
	secret: &[u8],
) {
	let redeem_coin = vec![0xE1];
	h.btc.add_redemption(TestRedemption {
		coin_id: redeem_coin.clone(),
		spends: taker_coin.clone(),
	});
	let msg = h.redeem_msg(
		&h.maker_key,
		h.maker_order().id,
		mid,
		redeem_coin,
		secret.to_vec(),
	);
	h.auth.deliver(Route::Redeem, h.maker, msg).unwrap();

	// The secret is forwarded to the taker in a redemption request.
	assert!(
		wait_for(WAIT, || h.auth.pending_request_count() >= 1),
		"redemption request not sent"
	);
	assert_eq!(h.auth.request_routes(), vec![Route::Redemption]);
	h.auth.ack_requests(&h.keys());
	assert!(wait_for(WAIT, || {
		h.storage.redeem_acks_b.lock().unwrap().len() == 1
	}));
}

/// The secret and the matching contract script used by both parties.
pub fn secret_and_script() -> (Vec<u8>, Vec<u8>) {
	let secret = b"super-secret-preimage".to_vec();
	let script = Sha256::digest(&secret).to_vec();
	(secret, script)
}

/// A contract paying `recipient` with sane fee and lock time.
pub fn contract(
	coin_id: CoinId,
	value: u64,
	recipient: &str,
	lock_time: u64,
	script: Vec<u8>,
) -> TestContract {
	TestContract {
		coin_id,
		value,
		swap_address: recipient.to_string(),
		fee_rate: 50,
		lock_time,
		script,
		confs: Mutex::new(1),
	}
}
