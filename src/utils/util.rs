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
use crate::bbsplus::keys::PublicKey;
use crate::errors::Error;
use bls12_381_plus::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use elliptic_curve::group::Curve;
use elliptic_curve::hash2curve::{ExpandMsg, Expander};
use ff::Field;
use rand::{CryptoRng, RngCore};

/// Integer-to-octet-string conversion, big endian, `N` bytes.
pub fn i2osp<const N: usize>(value: usize) -> [u8; N] {
    let be = (value as u64).to_be_bytes();
    let mut out = [0u8; N];
    out.copy_from_slice(&be[8 - N..]);
    out
}

/// hash_to_scalar(msg_octets, dst) -> hashed_scalar
///
/// Expands `msg_octets` with the ciphersuite expander under `dst` and reduces
/// the output into a [`Scalar`] with wide reduction.
pub fn hash_to_scalar<CS: BbsCiphersuite>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error>
where
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    if dst.len() > 255 {
        return Err(Error::HashToScalarError);
    }

    let mut uniform_bytes = vec![0u8; CS::EXPAND_LEN];
    CS::Expander::expand_message(&[msg_octets], &[dst], CS::EXPAND_LEN)
        .map_err(|_| Error::HashToScalarError)?
        .fill_bytes(&mut uniform_bytes);

    let okm: &[u8; 48] = uniform_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::HashToScalarError)?;
    Ok(Scalar::from_okm(okm))
}

/// Samples a uniform scalar from the supplied randomness source.
///
/// 48 uniform bytes are reduced with `Scalar::from_okm`, so the output is
/// statistically uniform in `[0, r)` without a rejection loop over secret
/// values. An RNG failure surfaces as [`Error::RandomnessFailure`].
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar, Error> {
    let mut okm = [0u8; 48];
    rng.try_fill_bytes(&mut okm)
        .map_err(|_| Error::RandomnessFailure)?;
    Ok(Scalar::from_okm(&okm))
}

/// Samples a uniform scalar in `[1, r)`.
pub fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar, Error> {
    loop {
        let s = random_scalar(rng)?;
        if !bool::from(s.is_zero()) {
            return Ok(s);
        }
    }
}

/// Samples `count` uniform scalars from the supplied randomness source.
pub fn calculate_random_scalars<R: RngCore + CryptoRng>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<Scalar>, Error> {
    let mut scalars = Vec::with_capacity(count);
    for _ in 0..count {
        scalars.push(random_scalar(rng)?);
    }
    Ok(scalars)
}

/// Big-endian canonical serialization of [`Scalar`].
pub trait ScalarExt: Sized {
    /// In Big Endian order
    fn to_bytes_be(&self) -> [u8; 32];
    /// Parses a canonical 32-byte big-endian scalar.
    fn from_bytes_be(bytes: &[u8]) -> Result<Self, Error>;
}

impl ScalarExt for Scalar {
    fn to_bytes_be(&self) -> [u8; 32] {
        self.to_be_bytes()
    }

    fn from_bytes_be(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; Scalar::BYTES] = bytes
            .try_into()
            .map_err(|_| Error::InvalidScalarEncoding)?;
        let s = Scalar::from_be_bytes(&bytes);
        if s.is_none().into() {
            return Err(Error::InvalidScalarEncoding);
        }
        Ok(s.unwrap())
    }
}

/// Parses a compressed G1 point, checking curve and subgroup membership.
pub fn parse_g1_projective(bytes: &[u8]) -> Result<G1Projective, Error> {
    let bytes: [u8; G1Affine::COMPRESSED_BYTES] = bytes
        .try_into()
        .map_err(|_| Error::InvalidPointEncoding)?;
    let p = G1Affine::from_compressed(&bytes);
    if p.is_none().into() {
        return Err(Error::InvalidPointEncoding);
    }
    Ok(G1Projective::from(p.unwrap()))
}

/// Parses a compressed G2 point, checking curve and subgroup membership.
pub fn parse_g2_projective(bytes: &[u8]) -> Result<G2Projective, Error> {
    let bytes: [u8; G2Affine::COMPRESSED_BYTES] = bytes
        .try_into()
        .map_err(|_| Error::InvalidPointEncoding)?;
    let p = G2Affine::from_compressed(&bytes);
    if p.is_none().into() {
        return Err(Error::InvalidPointEncoding);
    }
    Ok(G2Projective::from(p.unwrap()))
}

/// Compressed encoding of a G1 point.
pub fn g1_to_bytes(p: &G1Projective) -> [u8; G1Affine::COMPRESSED_BYTES] {
    p.to_affine().to_compressed()
}

/// Compressed encoding of a G2 point.
pub fn g2_to_bytes(p: &G2Projective) -> [u8; G2Affine::COMPRESSED_BYTES] {
    p.to_affine().to_compressed()
}

/// calculate_domain(PK, header) -> domain
///
/// Binds a signature to the public parameters and the optional context
/// header. The concatenation order is normative:
/// `u32be(L) || Q1 || Q2 || H_1 || ... || H_L || W || P1 || P2 || header`,
/// with every point in compressed form and a missing header encoded as the
/// empty string.
pub fn calculate_domain<CS: BbsCiphersuite>(
    pk: &PublicKey,
    header: Option<&[u8]>,
) -> Result<Scalar, Error>
where
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    let header = header.unwrap_or(b"");

    let mut dom_octets: Vec<u8> = Vec::new();
    dom_octets.extend_from_slice(&i2osp::<4>(pk.message_count()));
    dom_octets.extend_from_slice(&g1_to_bytes(&pk.generators.q1));
    dom_octets.extend_from_slice(&g1_to_bytes(&pk.generators.q2));
    for h_i in &pk.generators.message_generators {
        dom_octets.extend_from_slice(&g1_to_bytes(h_i));
    }
    dom_octets.extend_from_slice(&g2_to_bytes(&pk.w));
    dom_octets.extend_from_slice(&g1_to_bytes(&G1Projective::GENERATOR));
    dom_octets.extend_from_slice(&g2_to_bytes(&G2Projective::GENERATOR));
    dom_octets.extend_from_slice(header);

    let dst = [CS::API_ID, CS::H2S].concat();
    hash_to_scalar::<CS>(&dom_octets, &dst)
}

/// Returns the indexes in `[0, total)` that do not appear in `indexes`,
/// in ascending order.
pub fn get_remaining_indexes(total: usize, indexes: &[usize]) -> Vec<usize> {
    let mut revealed = vec![false; total];
    for i in indexes {
        if *i < total {
            revealed[*i] = true;
        }
    }
    (0..total).filter(|i| !revealed[*i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ORDER_BE_HEX: &str = "73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001";

    #[test]
    fn i2osp_lengths() {
        assert_eq!(i2osp::<4>(5), [0, 0, 0, 5]);
        assert_eq!(i2osp::<2>(0x0102), [1, 2]);
        assert_eq!(i2osp::<4>(u32::MAX as usize), [0xff; 4]);
    }

    #[test]
    fn scalar_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            let s = random_scalar(&mut rng).unwrap();
            let bytes = s.to_bytes_be();
            assert_eq!(Scalar::from_bytes_be(&bytes).unwrap(), s);
        }
    }

    #[test]
    fn non_canonical_scalar_rejected() {
        let order = hex::decode(ORDER_BE_HEX).unwrap();
        assert_eq!(
            Scalar::from_bytes_be(&order),
            Err(Error::InvalidScalarEncoding)
        );
        assert_eq!(
            Scalar::from_bytes_be(&[0xffu8; 32]),
            Err(Error::InvalidScalarEncoding)
        );
        assert_eq!(
            Scalar::from_bytes_be(&[0u8; 16]),
            Err(Error::InvalidScalarEncoding)
        );
    }

    #[test]
    fn point_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = G1Projective::GENERATOR * random_scalar(&mut rng).unwrap();
        assert_eq!(parse_g1_projective(&g1_to_bytes(&p)).unwrap(), p);

        let q = G2Projective::GENERATOR * random_scalar(&mut rng).unwrap();
        assert_eq!(parse_g2_projective(&g2_to_bytes(&q)).unwrap(), q);
    }

    #[test]
    fn truncated_point_rejected() {
        assert_eq!(
            parse_g1_projective(&[0u8; 47]),
            Err(Error::InvalidPointEncoding)
        );
        assert_eq!(
            parse_g2_projective(&[0u8; 95]),
            Err(Error::InvalidPointEncoding)
        );
    }

    #[test]
    fn remaining_indexes() {
        assert_eq!(get_remaining_indexes(5, &[0, 2]), vec![1, 3, 4]);
        assert_eq!(get_remaining_indexes(3, &[]), vec![0, 1, 2]);
        assert!(get_remaining_indexes(2, &[0, 1]).is_empty());
    }
}
