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

//! Ed25519 signing helpers for wire message payloads.
//!
//! The coordinator delegates user authentication to its host's auth manager;
//! these helpers provide the canonical sign/verify operations over
//! [`Signable::sig_msg`](crate::msgs::Signable::sig_msg) serializations used
//! by that manager and by the coordinator's own outgoing messages.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

/// Error types for signing operations
#[derive(Debug, Error)]
pub enum SigningError {
	#[error("Invalid public key: {0}")]
	InvalidPublicKey(String),
	#[error("Invalid signature encoding")]
	InvalidSignatureEncoding,
	#[error("Signature verification failed")]
	VerificationFailed,
}

/// Sign a canonical payload serialization.
pub fn sign_msg(key: &SigningKey, msg: &[u8]) -> Vec<u8> {
	key.sign(msg).to_bytes().to_vec()
}

/// Verify a signature over a canonical payload serialization.
pub fn verify_msg(public_key: &[u8; 32], msg: &[u8], sig: &[u8]) -> Result<(), SigningError> {
	let verifying_key = VerifyingKey::from_bytes(public_key)
		.map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
	let sig_bytes: [u8; 64] = sig
		.try_into()
		.map_err(|_| SigningError::InvalidSignatureEncoding)?;
	let signature = Signature::from_bytes(&sig_bytes);
	verifying_key
		.verify(msg, &signature)
		.map_err(|_| SigningError::VerificationFailed)
}
