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
use crate::utils::util::i2osp;
use bls12_381_plus::G1Projective;
use elliptic_curve::group::Curve;
use elliptic_curve::hash2curve::{ExpandMsg, Expander};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// The derived public generators of a key with a fixed message count.
///
/// `Q1` carries the blinding scalar `s`, `Q2` the domain value, and
/// `message_generators[i]` the message in slot `i`. Each point is an
/// independent hash-to-curve output derived from the ciphersuite DSTs, the
/// generator role and the message count, so any two keys that agree on the
/// ciphersuite and the message count share byte-identical generators.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct Generators {
    /// Blinding-factor generator.
    pub q1: G1Projective,
    /// Domain generator.
    pub q2: G1Projective,
    /// One generator per message slot.
    pub message_generators: Vec<G1Projective>,
}

impl Serialize for Generators {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let message_generators: Vec<String> = self
            .message_generators
            .iter()
            .map(|item| hex::encode(item.to_affine().to_compressed()))
            .collect();

        let mut state = serializer.serialize_struct("Generators", 3)?;
        state.serialize_field("Q1", &hex::encode(self.q1.to_affine().to_compressed()))?;
        state.serialize_field("Q2", &hex::encode(self.q2.to_affine().to_compressed()))?;
        state.serialize_field("MsgGenerators", &message_generators)?;
        state.end()
    }
}

impl Generators {
    /// Derives the generators for a key signing `message_count` messages.
    pub fn create<CS>(message_count: usize) -> Result<Generators, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let q1 = Self::derive_generator::<CS>(b"Q_1", message_count, 0)?;
        let q2 = Self::derive_generator::<CS>(b"Q_2", message_count, 0)?;

        let mut message_generators = Vec::with_capacity(message_count);
        for i in 1..=message_count {
            message_generators.push(Self::derive_generator::<CS>(b"H", message_count, i)?);
        }

        Ok(Generators {
            q1,
            q2,
            message_generators,
        })
    }

    /// Hashes a seed encoding (role, message_count, index) onto G1.
    fn derive_generator<CS>(
        role: &[u8],
        message_count: usize,
        index: usize,
    ) -> Result<G1Projective, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let seed = [
            CS::generator_seed().as_slice(),
            role,
            &i2osp::<4>(message_count),
            &i2osp::<4>(index),
        ]
        .concat();

        let dst = CS::generator_seed_dst();
        let mut v = vec![0u8; CS::EXPAND_LEN];
        CS::Expander::expand_message(&[seed.as_slice()], &[dst.as_slice()], CS::EXPAND_LEN)
            .map_err(|_| Error::HashToScalarError)?
            .fill_bytes(&mut v);

        Ok(G1Projective::hash::<CS::Expander>(&v, &CS::generator_dst()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};

    #[test]
    fn derivation_is_deterministic() {
        let a = Generators::create::<Bls12381Sha256>(10).unwrap();
        let b = Generators::create::<Bls12381Sha256>(10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generators_are_pairwise_distinct() {
        let gens = Generators::create::<Bls12381Sha256>(8).unwrap();
        let mut all = vec![gens.q1, gens.q2];
        all.extend_from_slice(&gens.message_generators);

        for i in 0..all.len() {
            assert_ne!(all[i], G1Projective::IDENTITY);
            assert_ne!(all[i], G1Projective::GENERATOR);
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j]);
            }
        }
    }

    #[test]
    fn derivation_depends_on_message_count() {
        let small = Generators::create::<Bls12381Sha256>(2).unwrap();
        let large = Generators::create::<Bls12381Sha256>(3).unwrap();
        assert_ne!(small.q1, large.q1);
        assert_ne!(small.message_generators[0], large.message_generators[0]);
    }

    #[test]
    fn derivation_depends_on_ciphersuite() {
        let sha = Generators::create::<Bls12381Sha256>(2).unwrap();
        let shake = Generators::create::<Bls12381Shake256>(2).unwrap();
        assert_ne!(sha.q1, shake.q1);
        assert_ne!(sha.message_generators[0], shake.message_generators[0]);
    }

    #[test]
    fn boundary_message_counts() {
        let one = Generators::create::<Bls12381Sha256>(1).unwrap();
        assert_eq!(one.message_generators.len(), 1);

        let many = Generators::create::<Bls12381Sha256>(128).unwrap();
        assert_eq!(many.message_generators.len(), 128);
    }
}
