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

//! Bosun SDK - shared types for swap settlement
//!
//! This crate provides the domain types shared between the coordinator and
//! its collaborators: order and match structures, the settlement status
//! machine, wire message payloads with canonical signing serialization, and
//! Ed25519 signing helpers.
//!
//! The SDK is designed to be lightweight and embeddable:
//! - No background threads
//! - No runtime initialization
//! - No environment or configuration loading

pub mod msgs;
pub mod signing;
pub mod types;

pub use msgs::{
	Acknowledgement, Audit, ErrorCode, Init, MatchNote, Message, MessageType, MsgError, Redeem,
	Redemption, RevokeMatch, Route, Signable,
};
pub use signing::{SigningError, sign_msg, verify_msg};
pub use types::*;
