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

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Asset identifier (BIP-0044 registered coin type)
pub type AssetId = u32;

/// Opaque backend-defined coin identifier (e.g. txid:vout encoding)
pub type CoinId = Vec<u8>;

/// Rate encoding factor for the quote-per-base rate representation.
///
/// A rate of `RATE_ENCODING_FACTOR` means one quote atom per base atom.
pub const RATE_ENCODING_FACTOR: u64 = 1_0000_0000;

/// Convert a quantity in base units to quote units at the given encoded rate.
pub fn base_to_quote(rate: u64, base_qty: u64) -> u64 {
	(rate as u128 * base_qty as u128 / RATE_ENCODING_FACTOR as u128) as u64
}

macro_rules! id_type {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		pub struct $name(pub [u8; 32]);

		impl $name {
			pub fn as_bytes(&self) -> &[u8] {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&hex::encode(self.0))
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!(stringify!($name), "({})"), self)
			}
		}

		impl From<[u8; 32]> for $name {
			fn from(b: [u8; 32]) -> Self {
				Self(b)
			}
		}
	};
}

id_type!(
	/// Account identifier of a client
	AccountId
);
id_type!(
	/// Order identifier
	OrderId
);
id_type!(
	/// Match identifier
	MatchId
);

/// Settlement status of a match
///
/// The negotiation sequence only moves forward:
/// NewlyMatched -> MakerSwapCast -> TakerSwapCast -> MakerRedeemed ->
/// MatchComplete. Matches whose taker is a cancel order are created directly
/// in MatchComplete since no swap follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
	NewlyMatched,
	MakerSwapCast,
	TakerSwapCast,
	MakerRedeemed,
	MatchComplete,
}

impl MatchStatus {
	/// Whether settlement negotiation has finished.
	pub fn is_terminal(&self) -> bool {
		*self == MatchStatus::MatchComplete
	}

	/// The party expected to broadcast the next transaction, or None for a
	/// completed match.
	pub fn next_actor(&self) -> Option<MatchSide> {
		match self {
			MatchStatus::NewlyMatched | MatchStatus::TakerSwapCast => Some(MatchSide::Maker),
			MatchStatus::MakerSwapCast | MatchStatus::MakerRedeemed => Some(MatchSide::Taker),
			MatchStatus::MatchComplete => None,
		}
	}
}

impl fmt::Display for MatchStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			MatchStatus::NewlyMatched => "NewlyMatched",
			MatchStatus::MakerSwapCast => "MakerSwapCast",
			MatchStatus::TakerSwapCast => "TakerSwapCast",
			MatchStatus::MakerRedeemed => "MakerRedeemed",
			MatchStatus::MatchComplete => "MatchComplete",
		};
		f.write_str(s)
	}
}

/// Side of a match: the booked party or the incoming counter-party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSide {
	Maker,
	Taker,
}

/// The trade fields common to limit and market orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
	/// True if the order sells the base asset
	pub sell: bool,
	/// Quantity in base units
	pub quantity: u64,
	/// The address to which the counter-party pays their swap contract
	pub swap_address: String,
	/// Backing coins funding the order
	pub funding_coins: Vec<CoinId>,
}

/// A booked (or bookable) limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
	pub id: OrderId,
	pub user: AccountId,
	pub base: AssetId,
	pub quote: AssetId,
	/// Encoded quote-per-base rate
	pub rate: u64,
	pub trade: Trade,
}

/// An immediate-execution market order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
	pub id: OrderId,
	pub user: AccountId,
	pub base: AssetId,
	pub quote: AssetId,
	pub trade: Trade,
}

/// An order cancellation targeting a booked limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
	pub id: OrderId,
	pub user: AccountId,
	pub base: AssetId,
	pub quote: AssetId,
	pub target: OrderId,
}

/// Any order the matching engine can pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
	Limit(LimitOrder),
	Market(MarketOrder),
	Cancel(CancelOrder),
}

impl Order {
	pub fn id(&self) -> OrderId {
		match self {
			Order::Limit(o) => o.id,
			Order::Market(o) => o.id,
			Order::Cancel(o) => o.id,
		}
	}

	pub fn user(&self) -> AccountId {
		match self {
			Order::Limit(o) => o.user,
			Order::Market(o) => o.user,
			Order::Cancel(o) => o.user,
		}
	}

	pub fn base(&self) -> AssetId {
		match self {
			Order::Limit(o) => o.base,
			Order::Market(o) => o.base,
			Order::Cancel(o) => o.base,
		}
	}

	pub fn quote(&self) -> AssetId {
		match self {
			Order::Limit(o) => o.quote,
			Order::Market(o) => o.quote,
			Order::Cancel(o) => o.quote,
		}
	}

	/// The trade fields, or None for a cancel order.
	pub fn trade(&self) -> Option<&Trade> {
		match self {
			Order::Limit(o) => Some(&o.trade),
			Order::Market(o) => Some(&o.trade),
			Order::Cancel(_) => None,
		}
	}

	pub fn is_cancel(&self) -> bool {
		matches!(self, Order::Cancel(_))
	}

	/// The asset of the order's backing coins: base when selling, quote when
	/// buying. None for a cancel order, which funds nothing.
	pub fn funding_asset(&self) -> Option<AssetId> {
		let trade = self.trade()?;
		Some(if trade.sell { self.base() } else { self.quote() })
	}
}

impl From<LimitOrder> for Order {
	fn from(o: LimitOrder) -> Self {
		Order::Limit(o)
	}
}

/// A maker/taker pairing produced by the matching engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
	pub maker: LimitOrder,
	pub taker: Order,
	/// Matched quantity in base units
	pub quantity: u64,
	/// Encoded execution rate
	pub rate: u64,
	/// End of the matching epoch that produced this match, ms UTC
	pub epoch_end: u64,
	/// Required fee rates captured at match time
	pub fee_rate_base: u64,
	pub fee_rate_quote: u64,
}

impl Match {
	/// The match id is a hash of the participating order ids and the epoch,
	/// so both parties and the server derive the same identifier.
	pub fn id(&self) -> MatchId {
		let mut hasher = Sha256::new();
		hasher.update(self.maker.id.as_bytes());
		hasher.update(self.taker.id().as_bytes());
		hasher.update(self.epoch_end.to_be_bytes());
		hasher.update(self.quantity.to_be_bytes());
		hasher.update(self.rate.to_be_bytes());
		MatchId(hasher.finalize().into())
	}

	pub fn base(&self) -> AssetId {
		self.maker.base
	}

	pub fn quote(&self) -> AssetId {
		self.maker.quote
	}

	/// True when the taker is a cancellation of the maker's order.
	pub fn is_cancellation(&self) -> bool {
		self.taker.is_cancel()
	}
}

/// One taker matched against one or more makers within an epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSet {
	pub taker: Order,
	pub makers: Vec<LimitOrder>,
	/// Matched base quantity per maker
	pub amounts: Vec<u64>,
	/// Execution rate per maker
	pub rates: Vec<u64>,
	pub epoch_end: u64,
}

impl MatchSet {
	/// Expand the set into individual matches. Fee rates are zero; the
	/// negotiator stamps current rates before tracking begins.
	pub fn matches(&self) -> Vec<Match> {
		self.makers
			.iter()
			.zip(self.amounts.iter().zip(self.rates.iter()))
			.map(|(maker, (&quantity, &rate))| Match {
				maker: maker.clone(),
				taker: self.taker.clone(),
				quantity,
				rate,
				epoch_end: self.epoch_end,
				fee_rate_base: 0,
				fee_rate_quote: 0,
			})
			.collect()
	}
}
