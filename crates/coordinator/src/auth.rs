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

//! Client authentication and messaging, consumed from the host.
//!
//! The coordinator does not own the transport or the signing keys. The host
//! wires an [`AuthManager`] that registers message routes, verifies client
//! signatures, signs the coordinator's outgoing payloads, delivers messages,
//! and maintains user scores.

use std::time::Duration;

use thiserror::Error;

use crate::storage::MarketMatchId;
use bosun_sdk::msgs::{Message, MsgError, Route, Signable};
use bosun_sdk::types::{AccountId, OrderId};

/// The settlement step a penalized user failed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoActionStep {
	NoSwapAsMaker,
	NoSwapAsTaker,
	NoRedeemAsMaker,
	NoRedeemAsTaker,
}

/// Error types for message delivery
#[derive(Debug, Error)]
pub enum CommsError {
	#[error("user {0} not connected")]
	Disconnected(AccountId),
	#[error("send failed: {0}")]
	SendFailed(String),
}

/// Handler for an incoming request on a registered route
pub type MsgHandler = Box<dyn Fn(AccountId, Message) -> Result<(), MsgError> + Send + Sync>;

/// Handler for a response to an outgoing request
pub type ResponseHandler = Box<dyn FnOnce(Message) + Send>;

/// Invoked when an outgoing request times out without a response
pub type ExpireHandler = Box<dyn FnOnce() + Send>;

/// Client authentication, messaging, and scoring
pub trait AuthManager: Send + Sync {
	/// Register the handler for a client-originating route.
	fn route(&self, route: Route, handler: MsgHandler);

	/// Verify a user's signature over a serialized payload.
	fn auth(&self, user: AccountId, msg: &[u8], sig: &[u8]) -> Result<(), MsgError>;

	/// Sign an outgoing payload with the server key.
	fn sign(&self, signable: &mut dyn Signable);

	/// Deliver a message to a user.
	fn send(&self, user: AccountId, msg: Message) -> Result<(), CommsError>;

	/// Send a request and invoke the handler with the eventual response.
	fn request(
		&self,
		user: AccountId,
		req: Message,
		handler: ResponseHandler,
	) -> Result<(), CommsError>;

	/// Send a request; if no response arrives within `expire_timeout`,
	/// `expire_fn` runs instead of the handler.
	fn request_with_timeout(
		&self,
		user: AccountId,
		req: Message,
		handler: ResponseHandler,
		expire_timeout: Duration,
		expire_fn: ExpireHandler,
	) -> Result<(), CommsError>;

	/// Credit a completed swap to the user's score.
	fn swap_success(&self, user: AccountId, mmid: MarketMatchId, value: u64, ref_time_ms: u64);

	/// Penalize the user for failing to act at the given step.
	fn inaction(
		&self,
		user: AccountId,
		misstep: NoActionStep,
		mmid: MarketMatchId,
		match_value: u64,
		ref_time_ms: u64,
		order_id: OrderId,
	);

	/// Record an order cancellation for cancellation-rate accounting.
	fn record_cancel(&self, user: AccountId, oid: OrderId, target: OrderId, time_ms: u64);

	/// Record an order as successfully completed.
	fn record_completed_order(&self, user: AccountId, oid: OrderId, time_ms: u64);
}
