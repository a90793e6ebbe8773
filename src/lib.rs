// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # zkbbs
//!
//! ## Description
//! zkbbs implements the **BBS+** pairing-based signature scheme over the
//! BLS12-381 curve, together with **selective-disclosure zero-knowledge
//! proofs**: a signer issues one signature over an ordered vector of `L`
//! messages, and the holder can later prove possession of that signature
//! while revealing any chosen subset of the messages and keeping the rest
//! hidden. Proofs can be verified one at a time or in randomized batches.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! zkbbs = "0.1"
//! ```
//!
//! ```rust
//! use rand::rngs::OsRng;
//! use zkbbs::bbsplus::ciphersuites::Bls12381Sha256;
//! use zkbbs::bbsplus::keys::KeyPair;
//! use zkbbs::bbsplus::proof::PoKSignature;
//! use zkbbs::bbsplus::signature::Signature;
//! use zkbbs::utils::message::BbsMessage;
//!
//! let mut rng = OsRng;
//! let keypair = KeyPair::random::<Bls12381Sha256>(3, &mut rng).unwrap();
//! let (sk, pk) = keypair.into_parts();
//!
//! let messages: Vec<BbsMessage> = [b"a".as_slice(), b"b", b"c"]
//!     .iter()
//!     .map(|m| BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(m).unwrap())
//!     .collect();
//!
//! let signature =
//!     Signature::sign::<Bls12381Sha256, _>(&sk, &pk, &messages, Some(b"ctx"), &mut rng).unwrap();
//! signature.verify::<Bls12381Sha256>(&pk, &messages, Some(b"ctx")).unwrap();
//!
//! let (proof, disclosed) = PoKSignature::proof_gen::<Bls12381Sha256, _>(
//!     &pk,
//!     &signature,
//!     &messages,
//!     &[0, 2],
//!     Some(b"ctx"),
//!     &mut rng,
//! )
//! .unwrap();
//! proof.proof_verify::<Bls12381Sha256>(&pk, &disclosed, Some(b"ctx")).unwrap();
//! ```
//!
//! ##### Available Ciphersuites:
//! - BLS12-381-SHA-256
//! - BLS12-381-SHAKE-256

#![warn(missing_docs)]
#![allow(non_snake_case)]

/// Errors module
pub mod errors;
/// Utils module
pub mod utils;

/// BBS+ signature scheme module
pub mod bbsplus;
