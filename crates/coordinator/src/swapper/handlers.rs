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

//! Client `init` and `redeem` request handling.
//!
//! A handler authenticates and validates the request, then registers a coin
//! waiter that probes the backend until the referenced transaction is
//! discovered or the deadline passes. Discovery advances the match status
//! and triggers the counter-party's audit or redemption request.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::Swapper;
use crate::latency::{TickResult, Waiter};
use crate::step::{StepInformation, resolve_step};
use crate::storage::MarketMatchId;
use crate::unix_ms_now;
use bosun_sdk::msgs::{
	Acknowledgement, Audit, ErrorCode, Init, Message, MsgError, Redeem, Redemption,
	ResponsePayload, Route, Signable,
};
use bosun_sdk::types::{AccountId, MatchStatus, Order};

fn maker_taker(is_maker: bool) -> &'static str {
	if is_maker { "maker" } else { "taker" }
}

/// The request whose acknowledgement is awaited from a counter-party
enum AckParams {
	Audit(Audit),
	Redemption(Redemption),
}

impl AckParams {
	fn sig_msg(&self) -> Vec<u8> {
		match self {
			AckParams::Audit(a) => a.sig_msg(),
			AckParams::Redemption(r) => r.sig_msg(),
		}
	}
}

/// Everything needed to process a counter-party's acknowledgement
pub(crate) struct MessageAcker {
	user: AccountId,
	tracker: Arc<crate::registry::MatchTracker>,
	params: AckParams,
	is_maker: bool,
}

impl Swapper {
	fn auth_user(&self, user: AccountId, params: &dyn Signable) -> Result<(), MsgError> {
		self.auth_mgr
			.auth(user, &params.sig_msg(), params.sig())
			.map_err(|_| {
				MsgError::new(
					ErrorCode::SignatureError,
					"error authenticating message params",
				)
			})
	}

	fn reject_if_stopping(stopped: bool) -> Result<(), MsgError> {
		if stopped {
			return Err(MsgError::new(
				ErrorCode::TryAgainLaterError,
				"The swap coordinator is stopping. Try again later.",
			));
		}
		Ok(())
	}

	/// Handle an `init` request reporting a newly broadcast swap contract.
	/// Validation and discovery run in a coin waiter; this method parses,
	/// authenticates, and enqueues.
	pub fn handle_init(self: &Arc<Self>, user: AccountId, msg: Message) -> Result<(), MsgError> {
		// Held for the handler's duration, blocking shutdown until the coin
		// waiter is registered.
		let stop = self.handler_stop.read().unwrap();
		Self::reject_if_stopping(*stop)?;

		let params: Init = msg
			.parse()
			.map_err(|_| MsgError::new(ErrorCode::ParseError, "error decoding 'init' params"))?;

		self.auth_user(user, &params)?;

		debug!(user = %user, mid = %params.match_id, oid = %params.order_id, "'init' received");

		let step = resolve_step(&self.registry, &self.coins, user, params.match_id)?;

		// Contracts are only expected in the first two statuses, in
		// sequence, from the expected party.
		match step.step {
			MatchStatus::NewlyMatched | MatchStatus::MakerSwapCast => {}
			_ => {
				return Err(MsgError::new(
					ErrorCode::SettlementSequenceError,
					"swap contract already provided",
				));
			}
		}

		// Sanity-check the coin id and contract script before committing a
		// waiter to the chain search.
		let coin_str = step
			.asset
			.backend
			.validate_coin_id(&params.coin_id)
			.map_err(|_| {
				MsgError::new(ErrorCode::ContractError, "invalid contract coinID or script")
			})?;
		step.asset
			.backend
			.validate_contract(&params.contract)
			.map_err(|e| {
				debug!(asset = %step.asset.asset.symbol, coin = %coin_str, "contract validation failure: {e}");
				MsgError::new(ErrorCode::ContractError, "invalid swap contract")
			})?;

		self.set_live_waiter(user, &msg);

		// Do not search past the inaction deadline: broadcast timeout after
		// the match request for the maker, or after the maker's swap
		// confirmed for the taker.
		let last_event = match step.step {
			MatchStatus::NewlyMatched => step.tracker.time,
			_ => step.tracker.maker_status.swap_conf_time(),
		};
		let mut expire_time = unix_ms_now() + self.tx_wait_expiration.as_millis() as u64;
		if last_event == 0 {
			warn!(
				party = maker_taker(step.actor.is_maker),
				status = %step.step,
				"prematurely received 'init'"
			);
		} else {
			expire_time = expire_time.min(last_event + self.b_timeout_ms());
		}
		debug!(
			mid = %params.match_id,
			party = maker_taker(step.actor.is_maker),
			expire_time,
			"waiting to locate contract"
		);

		let msg_id = msg.id;
		let try_fn = {
			let swapper = self.clone();
			Box::new(move || {
				let done = swapper.process_init(&msg, &params, &step);
				if done == TickResult::Done {
					// Either a live acker now, or terminally failed.
					swapper.rm_live_waiter(user, msg_id);
				}
				done
			}) as Box<dyn FnMut() -> TickResult + Send>
		};
		let expire_fn = {
			let swapper = self.clone();
			Box::new(move || {
				swapper.rm_live_waiter(user, msg_id);
				swapper.respond_error(
					msg_id,
					Route::Init,
					user,
					ErrorCode::TransactionUndiscovered,
					format!("failed to find contract coin {coin_str}"),
				);
			}) as Box<dyn FnOnce() + Send>
		};
		self.latency_q.wait(Waiter {
			expiration: expire_time,
			try_fn,
			expire_fn,
		});
		Ok(())
	}

	/// Validate a discovered swap contract, advance the match, acknowledge
	/// the actor, and request the counter-party's audit. Runs as a coin
	/// waiter probe.
	fn process_init(
		self: &Arc<Self>,
		msg: &Message,
		params: &Init,
		step: &StepInformation,
	) -> TickResult {
		let chain = &step.asset.backend;
		let actor = &step.actor;
		let cp = &step.counter_party;
		let match_id = step.tracker.id();

		let contract = match chain.contract(&params.coin_id, &params.contract) {
			Ok(contract) => contract,
			Err(e) if e.is_coin_not_found() => return TickResult::TryAgain,
			Err(e) => {
				warn!(
					mid = %match_id,
					user = %actor.user,
					"contract error for coin {}: {e}",
					hex::encode(&params.coin_id),
				);
				self.respond_error(
					msg.id,
					msg.route,
					actor.user,
					ErrorCode::ContractError,
					"contract error",
				);
				return TickResult::Done;
			}
		};

		let req_fee_rate = if step.is_base_asset {
			step.tracker.body.fee_rate_base
		} else {
			step.tracker.body.fee_rate_quote
		};
		if contract.fee_rate() < req_fee_rate {
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::ContractError,
				"low tx fee",
			);
			return TickResult::Done;
		}

		let cp_addr = cp
			.order
			.trade()
			.map(|t| t.swap_address.clone())
			.unwrap_or_default();
		if contract.swap_address() != cp_addr {
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::ContractError,
				format!(
					"incorrect recipient. expected {cp_addr}. got {}",
					contract.swap_address()
				),
			);
			return TickResult::Done;
		}

		if contract.value() != step.check_val {
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::ContractError,
				format!(
					"contract error. expected contract value to be {}, got {}",
					step.check_val,
					contract.value()
				),
			);
			return TickResult::Done;
		}

		let lock_margin = if actor.is_maker {
			self.lock_time_maker
		} else {
			self.lock_time_taker
		};
		// Sub-second precision is dropped on both sides of the comparison.
		let req_lock_time = drop_millis(step.tracker.match_time + lock_margin.as_millis() as u64);
		if contract.lock_time() < req_lock_time {
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::ContractError,
				format!(
					"contract error. expected lock time >= {req_lock_time}, got {}",
					contract.lock_time()
				),
			);
			return TickResult::Done;
		}

		let swap_time = unix_ms_now();
		let mmid = MarketMatchId::of(&step.tracker.body);

		// Failure to persist the contract is retried: continuing without a
		// record would leave the swap outcome unrecoverable.
		let stored = if actor.is_maker {
			self.storage
				.save_contract_a(mmid, &params.contract, &params.coin_id, swap_time)
		} else {
			self.storage
				.save_contract_b(mmid, &params.contract, &params.coin_id, swap_time)
		};
		if let Err(e) = stored {
			error!(
				mid = %match_id,
				maker = actor.is_maker,
				"saving swap contract failed: {e}"
			);
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::UnknownMarketError,
				"internal server error",
			);
			return TickResult::TryAgain;
		}

		// Store the status and times under the registry read lock so an
		// inaction sweep cannot observe the match in a stale state, and a
		// concurrent revocation is detected here.
		let live = self
			.registry
			.if_live(&match_id, |mt| {
				mt.status_of(actor.is_maker)
					.set_contract(contract.clone(), swap_time);
				mt.set_status(step.next_step);
			})
			.is_some();
		if !live {
			error!(
				mid = %match_id,
				maker = actor.is_maker,
				"contract txn located after match was revoked"
			);
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::ContractError,
				"match already revoked due to inaction",
			);
			return TickResult::Done;
		}

		debug!(
			mid = %match_id,
			asset = %step.asset.asset.symbol,
			party = maker_taker(actor.is_maker),
			fee_rate = contract.fee_rate(),
			from = %step.step,
			to = %step.next_step,
			"valid contract received"
		);

		// Positive acknowledgement to the actor: their params, server-signed.
		let mut signed = params.clone();
		self.auth_mgr.sign(&mut signed);
		self.ack_success(msg.id, msg.route, actor.user, match_id, signed.sig().to_vec());

		// Request the counter-party's audit of the contract.
		let mut audit = Audit {
			order_id: cp.order.id(),
			match_id,
			time: swap_time,
			coin_id: params.coin_id.clone(),
			contract: params.contract.clone(),
			sig: Vec::new(),
		};
		self.auth_mgr.sign(&mut audit);
		let req = match Message::request(self.next_req_id(), Route::Audit, &audit) {
			Ok(req) => req,
			Err(e) => {
				error!("error creating audit request: {e}");
				return TickResult::Done;
			}
		};

		let acker = MessageAcker {
			user: cp.user,
			tracker: step.tracker.clone(),
			params: AckParams::Audit(audit),
			is_maker: cp.is_maker,
		};
		debug!(
			mid = %match_id,
			user = %acker.user,
			party = maker_taker(acker.is_maker),
			"sending contract 'audit' request to counterparty"
		);

		// Auditing may require the counter-party to locate the contract
		// themselves, so they get the full broadcast timeout to respond.
		let swapper = self.clone();
		let cp_user = acker.user;
		let cp_is_maker = acker.is_maker;
		let sent = self.auth_mgr.request_with_timeout(
			cp.user,
			req,
			Box::new(move |resp| swapper.process_ack(resp, acker)),
			self.b_timeout,
			Box::new(move || {
				info!(
					mid = %match_id,
					user = %cp_user,
					party = maker_taker(cp_is_maker),
					"timeout waiting for contract 'audit' acknowledgement"
				);
			}),
		);
		if let Err(e) = sent {
			debug!(mid = %match_id, "unable to send audit request: {e}");
		}

		TickResult::Done
	}

	/// Handle a `redeem` request reporting a contract redemption.
	pub fn handle_redeem(self: &Arc<Self>, user: AccountId, msg: Message) -> Result<(), MsgError> {
		let stop = self.handler_stop.read().unwrap();
		Self::reject_if_stopping(*stop)?;

		let params: Redeem = msg
			.parse()
			.map_err(|_| MsgError::new(ErrorCode::ParseError, "error decoding 'redeem' params"))?;

		self.auth_user(user, &params)?;

		debug!(user = %user, mid = %params.match_id, oid = %params.order_id, "'redeem' received");

		let step = resolve_step(&self.registry, &self.coins, user, params.match_id)?;

		// Redemptions are only expected from the maker after the taker's
		// swap, or from the taker after the maker's redeem.
		match step.step {
			MatchStatus::TakerSwapCast | MatchStatus::MakerRedeemed => {}
			_ => {
				return Err(MsgError::new(
					ErrorCode::SettlementSequenceError,
					"no redemption expected in the current settlement state",
				));
			}
		}

		// The coin id must at least decode before a waiter is committed.
		let coin_str = step
			.asset
			.backend
			.validate_coin_id(&params.coin_id)
			.map_err(|_| MsgError::new(ErrorCode::ContractError, "invalid 'redeem' parameters"))?;

		self.set_live_waiter(user, &msg);

		// Deadline: broadcast timeout after the taker's swap confirmed for
		// the maker, or after the maker's redeem was seen for the taker.
		let last_event = match step.step {
			MatchStatus::TakerSwapCast => step.tracker.taker_status.swap_conf_time(),
			_ => step.tracker.maker_status.redeem_seen_time(),
		};
		let mut expire_time = unix_ms_now() + self.tx_wait_expiration.as_millis() as u64;
		if last_event == 0 {
			warn!(
				party = maker_taker(step.actor.is_maker),
				status = %step.step,
				"prematurely received 'redeem'"
			);
		} else {
			expire_time = expire_time.min(last_event + self.b_timeout_ms());
		}
		debug!(
			mid = %params.match_id,
			party = maker_taker(step.actor.is_maker),
			expire_time,
			"waiting to locate redemption"
		);

		let msg_id = msg.id;
		let try_fn = {
			let swapper = self.clone();
			Box::new(move || {
				let done = swapper.process_redeem(&msg, &params, &step);
				if done == TickResult::Done {
					swapper.rm_live_waiter(user, msg_id);
				}
				done
			}) as Box<dyn FnMut() -> TickResult + Send>
		};
		let expire_fn = {
			let swapper = self.clone();
			Box::new(move || {
				swapper.rm_live_waiter(user, msg_id);
				swapper.respond_error(
					msg_id,
					Route::Redeem,
					user,
					ErrorCode::TransactionUndiscovered,
					format!("failed to find redeemed coin {coin_str}"),
				);
			}) as Box<dyn FnOnce() + Send>
		};
		self.latency_q.wait(Waiter {
			expiration: expire_time,
			try_fn,
			expire_fn,
		});
		Ok(())
	}

	/// Validate a discovered redemption, advance the match, credit the
	/// actor, settle order accounting, and forward the secret to the taker
	/// when the maker redeemed. Runs as a coin waiter probe.
	fn process_redeem(
		self: &Arc<Self>,
		msg: &Message,
		params: &Redeem,
		step: &StepInformation,
	) -> TickResult {
		let actor = &step.actor;
		let cp = &step.counter_party;
		let match_id = step.tracker.id();
		let chain = &step.asset.backend;

		// The redemption must spend the counter-party's contract and reveal
		// the secret that contract commits to.
		let cp_status = step.tracker.status_of(cp.is_maker);
		let Some(cp_contract) = cp_status.contract() else {
			error!(mid = %match_id, "counterparty contract missing at redeem");
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::UnknownMarketError,
				"internal server error",
			);
			return TickResult::Done;
		};
		let cp_script = cp_contract.redeem_script();
		let cp_swap_coin = cp_contract.id();

		if !chain.validate_secret(&params.secret, &cp_script) {
			error!(
				mid = %match_id,
				maker = actor.is_maker,
				secret = %hex::encode(&params.secret),
				"secret validation failed"
			);
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::RedemptionError,
				"secret validation failed",
			);
			return TickResult::Done;
		}

		let redemption = match chain.redemption(&params.coin_id, &cp_swap_coin) {
			Ok(redemption) => redemption,
			// Could be network latency; check again on the next tick.
			Err(e) if e.is_coin_not_found() => return TickResult::TryAgain,
			Err(e) => {
				warn!(
					mid = %match_id,
					user = %actor.user,
					"redemption error for coin {}: {e}",
					hex::encode(&params.coin_id),
				);
				self.respond_error(
					msg.id,
					msg.route,
					actor.user,
					ErrorCode::RedemptionError,
					"redemption error",
				);
				return TickResult::Done;
			}
		};

		// NOTE: the redemption fee rate is not checked; the counter-party
		// is not inconvenienced by slow confirmation of a redemption.

		let new_status = step.next_step;
		let redeem_time = unix_ms_now();

		let live = self
			.registry
			.if_live(&match_id, |mt| {
				mt.status_of(actor.is_maker)
					.set_redemption(redemption.clone(), redeem_time);
				mt.set_status(new_status);
			})
			.is_some();
		if !live {
			error!(
				mid = %match_id,
				maker = actor.is_maker,
				"redeem txn found after match was revoked"
			);
			self.respond_error(
				msg.id,
				msg.route,
				actor.user,
				ErrorCode::RedemptionError,
				"match already revoked due to inaction",
			);
			return TickResult::Done;
		}

		debug!(
			mid = %match_id,
			asset = %step.asset.asset.symbol,
			party = maker_taker(actor.is_maker),
			from = %step.step,
			to = %new_status,
			"valid redemption received"
		);

		if new_status == MatchStatus::MatchComplete {
			// Settlement is done; the redeem-ack below is processed against
			// the tracker reference held by the acker.
			debug!(mid = %match_id, "deleting completed match");
			self.registry.remove(&match_id);
		}

		// Credit the swap. A self-matched user is credited once, on
		// completion only.
		if actor.user != cp.user || new_status == MatchStatus::MatchComplete {
			let mmid = MarketMatchId::of(&step.tracker.body);
			self.auth_mgr
				.swap_success(actor.user, mmid, step.tracker.body.quantity, redeem_time);
		}

		let mmid = MarketMatchId::of(&step.tracker.body);
		let stored = if actor.is_maker {
			// The maker's redeem reveals the secret; store it.
			self.storage
				.save_redeem_a(mmid, &params.coin_id, &params.secret, redeem_time)
		} else {
			self.storage.save_redeem_b(mmid, &params.coin_id, redeem_time)
		};
		if let Err(e) = stored {
			// Neither party's fault. Continue.
			error!(
				mid = %match_id,
				maker = actor.is_maker,
				"saving redeem transaction failed: {e}"
			);
		}

		let mut signed = params.clone();
		self.auth_mgr.sign(&mut signed);
		self.ack_success(msg.id, msg.route, actor.user, match_id, signed.sig().to_vec());

		// Settle the actor's order accounting, under the negotiation lock
		// so a fresh epoch's matches are counted first.
		let ord = if actor.is_maker {
			Order::Limit(step.tracker.body.maker.clone())
		} else {
			step.tracker.body.taker.clone()
		};
		{
			let _guard = self.negotiate_mtx.lock().unwrap();
			if self.orders.swap_success(ord.id()) {
				// Last swap for the order with no user-fault failures:
				// register the successful completion.
				self.auth_mgr
					.record_completed_order(actor.user, ord.id(), redeem_time);
				if let Err(e) = self.storage.set_order_complete_time(&ord, redeem_time) {
					if e.is_general_failure() {
						error!(order = %ord.id(), "fatal error recording order completion: {e}");
						self.respond_error(
							msg.id,
							msg.route,
							actor.user,
							ErrorCode::UnknownMarketError,
							"internal server error",
						);
						return TickResult::Done;
					}
					warn!(order = %ord.id(), "recording order completion: {e}");
				}
			}
		}

		// For the taker's redeem, that's the end.
		if !actor.is_maker {
			return TickResult::Done;
		}

		// For the maker's redeem, forward the secret to the taker.
		let mut rparams = Redemption {
			redeem: Redeem {
				order_id: cp.order.id(),
				match_id,
				coin_id: params.coin_id.clone(),
				secret: params.secret.clone(),
				sig: Vec::new(),
			},
			time: redeem_time,
			sig: Vec::new(),
		};
		self.auth_mgr.sign(&mut rparams);
		let req = match Message::request(self.next_req_id(), Route::Redemption, &rparams) {
			Ok(req) => req,
			Err(e) => {
				error!("error creating redemption request: {e}");
				return TickResult::Done;
			}
		};

		let acker = MessageAcker {
			user: cp.user,
			tracker: step.tracker.clone(),
			params: AckParams::Redemption(rparams),
			is_maker: cp.is_maker,
		};
		debug!(
			mid = %match_id,
			user = %acker.user,
			party = maker_taker(acker.is_maker),
			"sending 'redemption' request to counterparty"
		);

		// The taker does not need to locate the transaction themselves;
		// their ack clock runs from the observed redeem time.
		let deadline = (redeem_time + self.b_timeout_ms()).saturating_sub(unix_ms_now());
		let swapper = self.clone();
		let cp_user = acker.user;
		let cp_is_maker = acker.is_maker;
		let sent = self.auth_mgr.request_with_timeout(
			cp.user,
			req,
			Box::new(move |resp| swapper.process_ack(resp, acker)),
			std::time::Duration::from_millis(deadline),
			Box::new(move || {
				info!(
					mid = %match_id,
					user = %cp_user,
					party = maker_taker(cp_is_maker),
					"timeout waiting for 'redemption' acknowledgement"
				);
			}),
		);
		if let Err(e) = sent {
			debug!(mid = %match_id, "unable to send redemption request: {e}");
		}

		TickResult::Done
	}

	/// Process an acknowledgement of an audit or redemption request:
	/// validate the signature over the original payload and persist it as
	/// the party's proof.
	pub(crate) fn process_ack(&self, resp: Message, acker: MessageAcker) {
		let resp_route = resp.route;
		let ack: Acknowledgement = match resp
			.parse::<ResponsePayload>()
			.ok()
			.and_then(|p| p.result)
			.and_then(|v| serde_json::from_value(v).ok())
		{
			Some(ack) => ack,
			None => {
				self.respond_error(
					resp.id,
					resp_route,
					acker.user,
					ErrorCode::ParseError,
					"error parsing acknowledgment",
				);
				return;
			}
		};

		let sig_msg = acker.params.sig_msg();
		if let Err(e) = self.auth_mgr.auth(acker.user, &sig_msg, &ack.sig) {
			self.respond_error(
				resp.id,
				resp_route,
				acker.user,
				ErrorCode::SignatureError,
				format!("signature validation error: {e}"),
			);
			return;
		}

		let mmid = MarketMatchId::of(&acker.tracker.body);
		let match_id = acker.tracker.id();

		match &acker.params {
			AckParams::Audit(_) => {
				debug!(
					mid = %match_id,
					user = %acker.user,
					party = maker_taker(acker.is_maker),
					"received contract 'audit' acknowledgement"
				);
				// A maker audit ack covers the taker's contract and vice
				// versa. A storage failure here makes the backend go fatal.
				if acker.is_maker {
					acker.tracker.with_sigs(|sigs| sigs.maker_audit = ack.sig.clone());
					if let Err(e) = self.storage.save_audit_ack_sig_a(mmid, &ack.sig) {
						error!(mid = %match_id, "saving maker audit ack failed: {e}");
					}
				} else {
					acker.tracker.with_sigs(|sigs| sigs.taker_audit = ack.sig.clone());
					if let Err(e) = self.storage.save_audit_ack_sig_b(mmid, &ack.sig) {
						error!(mid = %match_id, "saving taker audit ack failed: {e}");
					}
				}
			}
			AckParams::Redemption(_) => {
				debug!(
					mid = %match_id,
					user = %acker.user,
					party = maker_taker(acker.is_maker),
					"received 'redemption' acknowledgement"
				);
				// Only the taker's redemption receipt is recorded; there is
				// no redemption request to the maker.
				if !acker.is_maker {
					acker.tracker.with_sigs(|sigs| sigs.taker_redeem = ack.sig.clone());
					if let Err(e) = self.storage.save_redeem_ack_sig_b(mmid, &ack.sig) {
						error!(mid = %match_id, "saving taker redeem ack failed: {e}");
						self.respond_error(
							resp.id,
							resp_route,
							acker.user,
							ErrorCode::UnknownMarketError,
							"internal server error",
						);
					}
				}
			}
		}
	}

	fn ack_success(
		&self,
		id: u64,
		route: Route,
		user: AccountId,
		match_id: bosun_sdk::types::MatchId,
		sig: Vec<u8>,
	) {
		match serde_json::to_value(Acknowledgement { match_id, sig }) {
			Ok(value) => self.respond_success(id, route, user, value),
			Err(e) => error!("failed to encode acknowledgement: {e}"),
		}
	}
}

/// Truncate a ms timestamp to whole seconds for lock-time comparison.
fn drop_millis(time_ms: u64) -> u64 {
	time_ms - time_ms % 1000
}
