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
use crate::bbsplus::keys::{PublicKey, SecretKey};
use crate::errors::Error;
use crate::utils::message::BbsMessage;
use crate::utils::msm::{msm_g1, msm_g1_vartime};
use crate::utils::util::{calculate_domain, parse_g1_projective, random_scalar, ScalarExt};
use bls12_381_plus::{
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use elliptic_curve::group::Curve;
use elliptic_curve::hash2curve::ExpandMsg;
use ff::Field;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// A BBS+ signature `(A, e, s)` over an ordered vector of messages.
///
/// `A = [1/(x+e)] * B` with
/// `B = P1 + [s]Q1 + [domain]Q2 + sum([m_i]H_i)`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Signature {
    /// The signature point.
    pub A: G1Projective,
    /// The signature scalar `e`.
    pub e: Scalar,
    /// The blinding scalar `s`.
    pub s: Scalar,
}

impl Signature {
    /// Serialized length: `A || e || s` in fixed widths.
    pub const BYTES: usize = G1Affine::COMPRESSED_BYTES + 2 * Scalar::BYTES;

    /// Signs `messages` under `sk`, binding the optional context `header`.
    ///
    /// The scalars `e` and `s` are drawn from `rng`; `e` is resampled in the
    /// unreachable case `x + e = 0 mod r`.
    pub fn sign<CS, R>(
        sk: &SecretKey,
        pk: &PublicKey,
        messages: &[BbsMessage],
        header: Option<&[u8]>,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
    {
        if messages.len() != pk.message_count() {
            return Err(Error::WrongMessageCount);
        }

        let domain = calculate_domain::<CS>(pk, header)?;
        let s = random_scalar(rng)?;
        let e = loop {
            let e = random_scalar(rng)?;
            if !bool::from((sk.0 + e).is_zero()) {
                break e;
            }
        };

        core_sign(sk, pk, messages, domain, e, s)
    }

    /// Signs `messages` with `e` and `s` derived deterministically from the
    /// secret key, the domain, the messages and the header.
    ///
    /// Two calls with identical inputs produce identical signatures, which
    /// removes the need for a random source at signing time. `extra_entropy`
    /// is folded into the derivation when supplied.
    pub fn sign_deterministic<CS>(
        sk: &SecretKey,
        pk: &PublicKey,
        messages: &[BbsMessage],
        header: Option<&[u8]>,
        extra_entropy: Option<&[u8]>,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if messages.len() != pk.message_count() {
            return Err(Error::WrongMessageCount);
        }

        let domain = calculate_domain::<CS>(pk, header)?;

        let mut hasher = Sha256::new();
        hasher.update(sk.to_bytes());
        hasher.update(domain.to_bytes_be());
        for m in messages {
            hasher.update(m.to_bytes_be());
        }
        if let Some(header) = header {
            hasher.update(header);
        }
        if let Some(entropy) = extra_entropy {
            hasher.update(entropy);
        }
        let mut seed: [u8; 32] = hasher.finalize().into();

        let mut retry = 0u8;
        let signature = loop {
            let e = deterministic_scalar(&seed, b"BBS_PLUS_DETERMINISTIC_E", retry)?;
            let s = deterministic_scalar(&seed, b"BBS_PLUS_DETERMINISTIC_S", retry)?;
            if bool::from((sk.0 + e).is_zero()) {
                retry = retry.wrapping_add(1);
                continue;
            }
            break core_sign(sk, pk, messages, domain, e, s);
        };
        seed.zeroize();
        signature
    }

    /// Checks the signature over `messages` and `header` against `pk`.
    ///
    /// Accepts iff `e(A, W + [e]P2) * e(B, -P2) = 1` in GT, computed as one
    /// 2-term product pairing.
    pub fn verify<CS>(
        &self,
        pk: &PublicKey,
        messages: &[BbsMessage],
        header: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if messages.len() != pk.message_count() {
            return Err(Error::WrongMessageCount);
        }

        let domain = calculate_domain::<CS>(pk, header)?;
        let B = commitment_to_messages(pk, messages, domain, self.s, true)?;

        let A2 = pk.w + G2Projective::GENERATOR * self.e;

        let A_affine = self.A.to_affine();
        let B_affine = B.to_affine();
        let term1 = G2Prepared::from(A2.to_affine());
        let term2 = G2Prepared::from(-G2Affine::generator());

        let pairing = multi_miller_loop(&[(&A_affine, &term1), (&B_affine, &term2)])
            .final_exponentiation();

        if pairing == Gt::IDENTITY {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }

    /// Serializes as `A || e || s` in fixed widths.
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut bytes = [0u8; Self::BYTES];
        bytes[0..G1Affine::COMPRESSED_BYTES].copy_from_slice(&self.A.to_affine().to_compressed());
        let mut offset = G1Affine::COMPRESSED_BYTES;
        bytes[offset..offset + Scalar::BYTES].copy_from_slice(&self.e.to_bytes_be());
        offset += Scalar::BYTES;
        bytes[offset..offset + Scalar::BYTES].copy_from_slice(&self.s.to_bytes_be());
        bytes
    }

    /// Parses the [`Self::to_bytes`] layout.
    pub fn from_bytes(data: &[u8; Self::BYTES]) -> Result<Self, Error> {
        let A = parse_g1_projective(&data[0..G1Affine::COMPRESSED_BYTES])?;
        let mut offset = G1Affine::COMPRESSED_BYTES;
        let e = Scalar::from_bytes_be(&data[offset..offset + Scalar::BYTES])?;
        offset += Scalar::BYTES;
        let s = Scalar::from_bytes_be(&data[offset..offset + Scalar::BYTES])?;

        Ok(Self { A, e, s })
    }
}

/// `B = P1 + [s]Q1 + [domain]Q2 + sum([m_i]H_i)`.
///
/// Only verification, where every input is public, may pass `vartime`;
/// the signing side must not gate work on the secret scalars.
pub(super) fn commitment_to_messages(
    pk: &PublicKey,
    messages: &[BbsMessage],
    domain: Scalar,
    s: Scalar,
    vartime: bool,
) -> Result<G1Projective, Error> {
    let mut points = Vec::with_capacity(2 + messages.len());
    points.push(pk.generators.q1);
    points.push(pk.generators.q2);
    points.extend_from_slice(&pk.generators.message_generators);

    let mut scalars = Vec::with_capacity(2 + messages.len());
    scalars.push(s);
    scalars.push(domain);
    scalars.extend(messages.iter().map(|m| m.value));

    let sum = if vartime {
        msm_g1_vartime(&points, &scalars)?
    } else {
        msm_g1(&points, &scalars)?
    };
    Ok(G1Projective::GENERATOR + sum)
}

fn core_sign(
    sk: &SecretKey,
    pk: &PublicKey,
    messages: &[BbsMessage],
    domain: Scalar,
    e: Scalar,
    s: Scalar,
) -> Result<Signature, Error> {
    let B = commitment_to_messages(pk, messages, domain, s, false)?;

    // A = B * (1 / (SK + e)); the inverse is constant time
    let sk_e_inv = Option::<Scalar>::from((sk.0 + e).invert()).ok_or_else(|| {
        Error::SignatureGenerationError("x + e is not invertible".to_owned())
    })?;
    let A = B * sk_e_inv;

    if A == G1Projective::IDENTITY {
        return Err(Error::SignatureGenerationError(
            "A == Identity_G1".to_owned(),
        ));
    }

    Ok(Signature { A, e, s })
}

/// Expands `seed` into a scalar with HMAC-SHA-256 under `label`, in the
/// spirit of RFC 6979. `retry` separates resampling rounds.
fn deterministic_scalar(seed: &[u8; 32], label: &[u8], retry: u8) -> Result<Scalar, Error> {
    let mut okm = [0u8; 48];
    for counter in 0u8..2 {
        let mut mac =
            HmacSha256::new_from_slice(seed).map_err(|_| Error::HashToScalarError)?;
        mac.update(label);
        mac.update(&[retry, counter + 1]);
        let block = mac.finalize().into_bytes();

        let start = counter as usize * 32;
        let end = (start + 32).min(okm.len());
        okm[start..end].copy_from_slice(&block[..end - start]);
    }
    Ok(Scalar::from_okm(&okm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::Bls12381Sha256;
    use crate::bbsplus::keys::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_messages(n: usize) -> Vec<BbsMessage> {
        (0..n)
            .map(|i| {
                BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(
                    format!("message-{}", i).as_bytes(),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn sign_and_verify() {
        let mut rng = StdRng::seed_from_u64(21);
        let keypair = KeyPair::random::<Bls12381Sha256>(3, &mut rng).unwrap();
        let messages = test_messages(3);

        let signature = Signature::sign::<Bls12381Sha256, _>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            Some(b"header"),
            &mut rng,
        )
        .unwrap();

        signature
            .verify::<Bls12381Sha256>(keypair.public_key(), &messages, Some(b"header"))
            .unwrap();
    }

    #[test]
    fn wrong_message_count_rejected() {
        let mut rng = StdRng::seed_from_u64(22);
        let keypair = KeyPair::random::<Bls12381Sha256>(3, &mut rng).unwrap();
        let messages = test_messages(2);

        assert_eq!(
            Signature::sign::<Bls12381Sha256, _>(
                keypair.private_key(),
                keypair.public_key(),
                &messages,
                None,
                &mut rng,
            ),
            Err(Error::WrongMessageCount)
        );
    }

    #[test]
    fn deterministic_signing_is_reproducible() {
        let mut rng = StdRng::seed_from_u64(23);
        let keypair = KeyPair::random::<Bls12381Sha256>(2, &mut rng).unwrap();
        let messages = test_messages(2);

        let a = Signature::sign_deterministic::<Bls12381Sha256>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            Some(b"ctx"),
            None,
        )
        .unwrap();
        let b = Signature::sign_deterministic::<Bls12381Sha256>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            Some(b"ctx"),
            None,
        )
        .unwrap();
        assert_eq!(a, b);
        a.verify::<Bls12381Sha256>(keypair.public_key(), &messages, Some(b"ctx"))
            .unwrap();

        let c = Signature::sign_deterministic::<Bls12381Sha256>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            Some(b"ctx"),
            Some(b"entropy"),
        )
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = StdRng::seed_from_u64(24);
        let keypair = KeyPair::random::<Bls12381Sha256>(2, &mut rng).unwrap();
        let messages = test_messages(2);

        let signature = Signature::sign::<Bls12381Sha256, _>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            None,
            &mut rng,
        )
        .unwrap();

        let parsed = Signature::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(parsed, signature);
    }

    #[test]
    fn deterministic_scalar_labels_are_separated() {
        let seed = [1u8; 32];
        let e = deterministic_scalar(&seed, b"BBS_PLUS_DETERMINISTIC_E", 0).unwrap();
        let s = deterministic_scalar(&seed, b"BBS_PLUS_DETERMINISTIC_S", 0).unwrap();
        assert_ne!(e, s);
        assert_ne!(
            deterministic_scalar(&seed, b"BBS_PLUS_DETERMINISTIC_E", 1).unwrap(),
            e
        );
    }
}
