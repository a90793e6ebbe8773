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

use crate::bbsplus::ciphersuites::BbsCiphersuite;
use crate::errors::Error;
use crate::utils::util::{hash_to_scalar, random_scalar, ScalarExt};
use bls12_381_plus::Scalar;
use elliptic_curve::hash2curve::ExpandMsg;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// A signed message: a scalar mod r.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BbsMessage {
    /// The scalar value of the message.
    pub value: Scalar,
}

impl BbsMessage {
    /// Wraps an already-reduced scalar.
    pub fn new(value: Scalar) -> Self {
        Self { value }
    }

    /// map_message_to_scalar_as_hash(msg) -> msg_scalar
    ///
    /// Deterministic, DST-separated encoding of arbitrary bytes into a
    /// message scalar. Non-injective in the input bytes, but any two runs
    /// over the same bytes yield the same scalar.
    pub fn map_message_to_scalar_as_hash<CS: BbsCiphersuite>(data: &[u8]) -> Result<Self, Error>
    where
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let dst = [CS::ID, CS::MAP_MSG_SCALAR].concat();
        let value = hash_to_scalar::<CS>(data, &dst)?;
        Ok(Self { value })
    }

    /// Samples a random message.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, Error> {
        Ok(Self {
            value: random_scalar(rng)?,
        })
    }

    /// In Big Endian order
    pub fn to_bytes_be(&self) -> [u8; 32] {
        self.value.to_bytes_be()
    }

    /// Parses a canonical 32-byte big-endian message scalar.
    pub fn from_bytes_be(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            value: Scalar::from_bytes_be(bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};

    #[test]
    fn mapping_is_deterministic() {
        for data in [b"".as_slice(), b"hello", b"a longer message 123456789"] {
            let m1 = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(data).unwrap();
            let m2 = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(data).unwrap();
            assert_eq!(m1, m2);
        }
    }

    #[test]
    fn distinct_inputs_map_to_distinct_scalars() {
        let m1 = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(b"a").unwrap();
        let m2 = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(b"b").unwrap();
        assert_ne!(m1, m2);
    }

    #[test]
    fn ciphersuites_are_domain_separated() {
        let sha = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(b"msg").unwrap();
        let shake = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Shake256>(b"msg").unwrap();
        assert_ne!(sha, shake);
    }

    #[test]
    fn scalar_encoding_round_trip() {
        let m = BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(b"round trip").unwrap();
        assert_eq!(BbsMessage::from_bytes_be(&m.to_bytes_be()).unwrap(), m);
    }
}
