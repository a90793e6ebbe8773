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

use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd, ExpandMsgXof};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::Shake256;

/// Configuration of the hash and expansion primitives of the scheme.
///
/// Every hash used by the scheme (generator derivation, hash-to-scalar,
/// domain, Fiat-Shamir challenge) is namespaced by the ciphersuite DSTs, so
/// two suites never produce related outputs.
pub trait BbsCiphersuite: Eq + 'static {
    /// Ciphersuite identifier.
    const ID: &'static [u8];
    /// `ID || "H2G_HM2S_"`, prefix of every derived DST.
    const API_ID: &'static [u8];
    /// Seed label for generator derivation.
    const GENERATOR_SEED: &'static [u8] = b"MESSAGE_GENERATOR_SEED";
    /// DST of the generator seed expansion.
    const GENERATOR_SEED_DST: &'static [u8] = b"SIG_GENERATOR_SEED_";
    /// DST of the hash-to-curve step of generator derivation.
    const GENERATOR_DST: &'static [u8] = b"SIG_GENERATOR_DST_";
    /// DST suffix of message-to-scalar mapping.
    const MAP_MSG_SCALAR: &'static [u8] = b"MAP_MSG_TO_SCALAR_AS_HASH_";
    /// DST suffix of generic hash-to-scalar.
    const H2S: &'static [u8] = b"H2S_";
    /// DST suffix of the Fiat-Shamir challenge hash.
    const CHALLENGE: &'static [u8] = b"H2S_CHALLENGE_";
    /// DST suffix of key generation.
    const KEYGEN_DST: &'static [u8] = b"KEYGEN_DST_";

    /// The expand-message construction of the suite.
    type Expander: for<'a> ExpandMsg<'a>;
    /// Output length of every expand-message call.
    const EXPAND_LEN: usize = 48;
    /// Length of a serialized scalar.
    const OCTET_SCALAR_LEN: usize = 32;
    /// Minimum length of key material for deterministic key generation.
    const IKM_LEN: usize = 32;

    /// DST for key generation.
    fn keygen_dst() -> Vec<u8> {
        [Self::API_ID, Self::KEYGEN_DST].concat()
    }

    /// Seed prefix for generator derivation.
    fn generator_seed() -> Vec<u8> {
        [Self::API_ID, Self::GENERATOR_SEED].concat()
    }

    /// DST for the generator seed expansion.
    fn generator_seed_dst() -> Vec<u8> {
        [Self::API_ID, Self::GENERATOR_SEED_DST].concat()
    }

    /// DST for the hash-to-curve step of generator derivation.
    fn generator_dst() -> Vec<u8> {
        [Self::API_ID, Self::GENERATOR_DST].concat()
    }

    /// DST for the Fiat-Shamir challenge hash.
    fn challenge_dst() -> Vec<u8> {
        [Self::ID, Self::CHALLENGE].concat()
    }
}

/// BLS12-381 ciphersuite with SHAKE-256 expansion (XOF).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Bls12381Shake256 {}
/// BLS12-381 ciphersuite with SHA-256 expansion (XMD).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Bls12381Sha256 {}

impl BbsCiphersuite for Bls12381Shake256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_";
    const API_ID: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2G_HM2S_";
    type Expander = ExpandMsgXof<Shake256>;
}

impl BbsCiphersuite for Bls12381Sha256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_";
    const API_ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_";
    type Expander = ExpandMsgXmd<Sha256>;
}
