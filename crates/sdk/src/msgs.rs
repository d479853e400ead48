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

//! Wire messages exchanged between the coordinator and clients.
//!
//! Every signable payload serializes to a canonical byte string via
//! [`Signable::sig_msg`]; signatures always cover that serialization, never
//! the JSON encoding, so payloads can be re-encoded without invalidating
//! stored proofs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CoinId, MatchId, MatchSide, OrderId};

/// Message routes handled or produced by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
	Init,
	Redeem,
	Audit,
	Redemption,
	RevokeMatch,
	Match,
}

impl Route {
	pub fn as_str(&self) -> &'static str {
		match self {
			Route::Init => "init",
			Route::Redeem => "redeem",
			Route::Audit => "audit",
			Route::Redemption => "redemption",
			Route::RevokeMatch => "revoke_match",
			Route::Match => "match",
		}
	}
}

/// Message framing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
	Request,
	Response,
	Notification,
}

/// A framed message. The payload is kept as raw JSON bytes so that received
/// messages can be persisted and replayed byte-identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub mtype: MessageType,
	pub route: Route,
	pub id: u64,
	pub payload: Vec<u8>,
}

impl Message {
	pub fn request<T: Serialize>(id: u64, route: Route, payload: &T) -> Result<Self, MsgError> {
		Ok(Message {
			mtype: MessageType::Request,
			route,
			id,
			payload: encode_payload(payload)?,
		})
	}

	pub fn notification<T: Serialize>(route: Route, payload: &T) -> Result<Self, MsgError> {
		Ok(Message {
			mtype: MessageType::Notification,
			route,
			id: 0,
			payload: encode_payload(payload)?,
		})
	}

	pub fn response(
		id: u64,
		route: Route,
		result: Option<serde_json::Value>,
		error: Option<MsgError>,
	) -> Result<Self, MsgError> {
		Ok(Message {
			mtype: MessageType::Response,
			route,
			id,
			payload: encode_payload(&ResponsePayload { result, error })?,
		})
	}

	/// Decode the payload as the given type.
	pub fn parse<T: for<'de> Deserialize<'de>>(&self) -> Result<T, MsgError> {
		serde_json::from_slice(&self.payload)
			.map_err(|e| MsgError::new(ErrorCode::ParseError, format!("payload decode: {e}")))
	}
}

fn encode_payload<T: Serialize>(payload: &T) -> Result<Vec<u8>, MsgError> {
	serde_json::to_vec(payload)
		.map_err(|e| MsgError::new(ErrorCode::ParseError, format!("payload encode: {e}")))
}

/// Result-or-error body of a response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
	pub result: Option<serde_json::Value>,
	pub error: Option<MsgError>,
}

/// Wire error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
	ParseError,
	SignatureError,
	UnknownMatch,
	SettlementSequenceError,
	ContractError,
	RedemptionError,
	TransactionUndiscovered,
	UnknownMarketError,
	TryAgainLaterError,
	AckCountError,
	IdMismatchError,
}

impl ErrorCode {
	/// Stable numeric code carried on the wire.
	pub fn code(&self) -> u16 {
		match self {
			ErrorCode::ParseError => 1,
			ErrorCode::SignatureError => 2,
			ErrorCode::UnknownMatch => 3,
			ErrorCode::SettlementSequenceError => 4,
			ErrorCode::ContractError => 5,
			ErrorCode::RedemptionError => 6,
			ErrorCode::TransactionUndiscovered => 7,
			ErrorCode::UnknownMarketError => 8,
			ErrorCode::TryAgainLaterError => 9,
			ErrorCode::AckCountError => 10,
			ErrorCode::IdMismatchError => 11,
		}
	}
}

/// A client-facing error: a wire code plus a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?} ({}): {message}", .code.code())]
pub struct MsgError {
	pub code: ErrorCode,
	pub message: String,
}

impl MsgError {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		MsgError {
			code,
			message: message.into(),
		}
	}
}

/// A payload whose canonical serialization is signed by its sender
pub trait Signable {
	/// The canonical byte string covered by the signature.
	fn sig_msg(&self) -> Vec<u8>;
	fn sig(&self) -> &[u8];
	fn set_sig(&mut self, sig: Vec<u8>);
}

/// `init`: a party reports their broadcast swap contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
	pub order_id: OrderId,
	pub match_id: MatchId,
	pub coin_id: CoinId,
	pub contract: Vec<u8>,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for Init {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = Vec::with_capacity(64 + self.coin_id.len() + self.contract.len());
		b.extend_from_slice(self.order_id.as_bytes());
		b.extend_from_slice(self.match_id.as_bytes());
		b.extend_from_slice(&self.coin_id);
		b.extend_from_slice(&self.contract);
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// `redeem`: a party reports their redemption of the counter-party's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeem {
	pub order_id: OrderId,
	pub match_id: MatchId,
	pub coin_id: CoinId,
	pub secret: Vec<u8>,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for Redeem {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = Vec::with_capacity(64 + self.coin_id.len() + self.secret.len());
		b.extend_from_slice(self.order_id.as_bytes());
		b.extend_from_slice(self.match_id.as_bytes());
		b.extend_from_slice(&self.coin_id);
		b.extend_from_slice(&self.secret);
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// `audit`: request that the counter-party audit a discovered contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
	pub order_id: OrderId,
	pub match_id: MatchId,
	/// Contract first-sighting time, ms UTC
	pub time: u64,
	pub coin_id: CoinId,
	pub contract: Vec<u8>,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for Audit {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = Vec::with_capacity(72 + self.coin_id.len() + self.contract.len());
		b.extend_from_slice(self.order_id.as_bytes());
		b.extend_from_slice(self.match_id.as_bytes());
		b.extend_from_slice(&self.time.to_be_bytes());
		b.extend_from_slice(&self.coin_id);
		b.extend_from_slice(&self.contract);
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// `redemption`: forward the maker's redemption (and secret) to the taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
	pub redeem: Redeem,
	/// Redemption first-sighting time, ms UTC
	pub time: u64,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for Redemption {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = self.redeem.sig_msg();
		b.extend_from_slice(&self.time.to_be_bytes());
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// `revoke_match`: notify a party that a match has been revoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeMatch {
	pub order_id: OrderId,
	pub match_id: MatchId,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for RevokeMatch {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = Vec::with_capacity(64);
		b.extend_from_slice(self.order_id.as_bytes());
		b.extend_from_slice(self.match_id.as_bytes());
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// `match`: per-party notification of a new match soliciting an ack signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchNote {
	pub order_id: OrderId,
	pub match_id: MatchId,
	pub quantity: u64,
	pub rate: u64,
	/// Counter-party's swap address
	pub address: String,
	/// Server time of the match, ms UTC
	pub server_time: u64,
	pub fee_rate_base: u64,
	pub fee_rate_quote: u64,
	pub side: MatchSide,
	#[serde(default)]
	pub sig: Vec<u8>,
}

impl Signable for MatchNote {
	fn sig_msg(&self) -> Vec<u8> {
		let mut b = Vec::with_capacity(128 + self.address.len());
		b.extend_from_slice(self.order_id.as_bytes());
		b.extend_from_slice(self.match_id.as_bytes());
		b.extend_from_slice(&self.quantity.to_be_bytes());
		b.extend_from_slice(&self.rate.to_be_bytes());
		b.extend_from_slice(self.address.as_bytes());
		b.extend_from_slice(&self.server_time.to_be_bytes());
		b.extend_from_slice(&self.fee_rate_base.to_be_bytes());
		b.extend_from_slice(&self.fee_rate_quote.to_be_bytes());
		b.push(match self.side {
			MatchSide::Maker => 0,
			MatchSide::Taker => 1,
		});
		b
	}

	fn sig(&self) -> &[u8] {
		&self.sig
	}

	fn set_sig(&mut self, sig: Vec<u8>) {
		self.sig = sig;
	}
}

/// A party's signed acknowledgement of a request they received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
	pub match_id: MatchId,
	pub sig: Vec<u8>,
}
