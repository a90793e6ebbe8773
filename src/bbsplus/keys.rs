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
use crate::bbsplus::generators::Generators;
use crate::errors::Error;
use crate::utils::util::{
    g1_to_bytes, g2_to_bytes, hash_to_scalar, i2osp, parse_g1_projective, parse_g2_projective,
    random_nonzero_scalar, ScalarExt,
};
use bls12_381_plus::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use elliptic_curve::group::Group;
use elliptic_curve::hash2curve::ExpandMsg;
use ff::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The issuer's secret: a scalar `x` in `[1, r)`.
///
/// Wiped on drop.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SecretKey(pub(crate) Scalar);

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0 = Scalar::ZERO;
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl SecretKey {
    /// In Big Endian order
    pub fn to_bytes(&self) -> [u8; Scalar::BYTES] {
        self.0.to_bytes_be()
    }

    /// Hex encoding of [`Self::to_bytes`].
    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses a canonical 32-byte big-endian secret scalar in `[1, r)`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let x = Scalar::from_bytes_be(bytes).map_err(|_| Error::InvalidKeyEncoding)?;
        if x.is_zero().into() {
            return Err(Error::InvalidKeyEncoding);
        }
        Ok(Self(x))
    }

    /// Derives the corresponding [`PublicKey`] for `message_count` messages.
    pub fn public_key<CS>(&self, message_count: usize) -> Result<PublicKey, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if message_count == 0 {
            return Err(Error::WrongMessageCount);
        }
        Ok(PublicKey {
            w: G2Projective::GENERATOR * self.0,
            message_count,
            generators: Generators::create::<CS>(message_count)?,
        })
    }
}

/// The issuer's public parameters for a fixed message count `L`.
///
/// Contains `W = [x]P2` and the derived generators `Q1, Q2, H_1..H_L`. The
/// base points `P1`/`P2` are the canonical curve generators. Immutable and
/// freely shareable.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PublicKey {
    /// Issuer identity `W = [x]P2`.
    pub w: G2Projective,
    pub(crate) message_count: usize,
    /// The generators derived from the message count.
    pub generators: Generators,
}

impl PublicKey {
    /// Number of messages a signature under this key covers.
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Serializes as
    /// `u32be(L) || W || P1 || P2 || Q1 || Q2 || H_1 || ... || H_L`
    /// with every point in compressed form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend_from_slice(&i2osp::<4>(self.message_count));
        bytes.extend_from_slice(&g2_to_bytes(&self.w));
        bytes.extend_from_slice(&G1Affine::generator().to_compressed());
        bytes.extend_from_slice(&G2Affine::generator().to_compressed());
        bytes.extend_from_slice(&g1_to_bytes(&self.generators.q1));
        bytes.extend_from_slice(&g1_to_bytes(&self.generators.q2));
        for h_i in &self.generators.message_generators {
            bytes.extend_from_slice(&g1_to_bytes(h_i));
        }
        bytes
    }

    /// Hex encoding of [`Self::to_bytes`].
    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses the [`Self::to_bytes`] layout, validating every point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        const G1_LEN: usize = G1Affine::COMPRESSED_BYTES;
        const G2_LEN: usize = G2Affine::COMPRESSED_BYTES;

        if bytes.len() < 4 {
            return Err(Error::InvalidKeyEncoding);
        }
        let message_count =
            u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
        if message_count == 0 {
            return Err(Error::InvalidKeyEncoding);
        }

        let expected = 4 + G2_LEN + G1_LEN + G2_LEN + G1_LEN * (2 + message_count);
        if bytes.len() != expected {
            return Err(Error::InvalidKeyEncoding);
        }

        let mut offset = 4;
        let w = parse_g2_projective(&bytes[offset..offset + G2_LEN])?;
        offset += G2_LEN;

        let p1 = parse_g1_projective(&bytes[offset..offset + G1_LEN])?;
        offset += G1_LEN;
        let p2 = parse_g2_projective(&bytes[offset..offset + G2_LEN])?;
        offset += G2_LEN;
        if p1 != G1Projective::GENERATOR || p2 != G2Projective::GENERATOR {
            return Err(Error::InvalidKeyEncoding);
        }

        let q1 = parse_g1_projective(&bytes[offset..offset + G1_LEN])?;
        offset += G1_LEN;
        let q2 = parse_g1_projective(&bytes[offset..offset + G1_LEN])?;
        offset += G1_LEN;

        let mut message_generators = Vec::with_capacity(message_count);
        for _ in 0..message_count {
            message_generators.push(parse_g1_projective(&bytes[offset..offset + G1_LEN])?);
            offset += G1_LEN;
        }

        Ok(Self {
            w,
            message_count,
            generators: Generators {
                q1,
                q2,
                message_generators,
            },
        })
    }

    /// Checks that the generators match the canonical derivation for the
    /// ciphersuite and message count. Deserialized keys should be validated
    /// once before use.
    pub fn validate<CS>(&self) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if bool::from(self.w.is_identity()) {
            return Err(Error::InvalidKeyEncoding);
        }
        let expected = Generators::create::<CS>(self.message_count)?;
        if self.generators != expected {
            return Err(Error::InvalidKeyEncoding);
        }
        Ok(())
    }
}

/// A key pair consisting of a public key and a secret key.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct KeyPair {
    pub(crate) public: PublicKey,
    pub(crate) private: SecretKey,
}

impl KeyPair {
    /// Generates a random keypair for `message_count` messages.
    pub fn random<CS>(
        message_count: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if message_count == 0 {
            return Err(Error::WrongMessageCount);
        }
        let private = SecretKey(random_nonzero_scalar(rng)?);
        let public = private.public_key::<CS>(message_count)?;
        Ok(Self { public, private })
    }

    /// Generates a keypair deterministically from a secret octet string.
    ///
    /// `key_material` MUST be at least [`BbsCiphersuite::IKM_LEN`] bytes of
    /// secret entropy; `key_info` is an optional public label folded into
    /// the derivation.
    pub fn generate<CS>(
        key_material: &[u8],
        key_info: Option<&[u8]>,
        message_count: usize,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if message_count == 0 {
            return Err(Error::WrongMessageCount);
        }
        if key_material.len() < CS::IKM_LEN {
            return Err(Error::KeyGenError(
                "length(key_material) < 32".to_owned(),
            ));
        }

        let key_info = key_info.unwrap_or(&[]);
        if key_info.len() > 65535 {
            return Err(Error::KeyGenError("length(key_info) > 65535".to_owned()));
        }

        let derive_input = [key_material, &i2osp::<2>(key_info.len()), key_info].concat();
        let x = hash_to_scalar::<CS>(&derive_input, &CS::keygen_dst())?;
        if x.is_zero().into() {
            return Err(Error::KeyGenError("derived key is zero".to_owned()));
        }

        let private = SecretKey(x);
        let public = private.public_key::<CS>(message_count)?;
        Ok(Self { public, private })
    }

    /// Returns a reference to the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Returns a reference to the private key.
    pub fn private_key(&self) -> &SecretKey {
        &self.private
    }

    /// Returns the couple `(sk, pk)`.
    pub fn into_parts(self) -> (SecretKey, PublicKey) {
        let Self { public, private } = self;
        (private, public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::Bls12381Sha256;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_keypair_round_trip() {
        let mut rng = StdRng::seed_from_u64(11);
        let keypair = KeyPair::random::<Bls12381Sha256>(5, &mut rng).unwrap();

        let pk_bytes = keypair.public_key().to_bytes();
        let parsed = PublicKey::from_bytes(&pk_bytes).unwrap();
        assert_eq!(&parsed, keypair.public_key());
        parsed.validate::<Bls12381Sha256>().unwrap();

        let sk_bytes = keypair.private_key().to_bytes();
        let parsed_sk = SecretKey::from_bytes(&sk_bytes).unwrap();
        assert_eq!(&parsed_sk, keypair.private_key());
    }

    #[test]
    fn zero_message_count_rejected() {
        let mut rng = StdRng::seed_from_u64(12);
        assert_eq!(
            KeyPair::random::<Bls12381Sha256>(0, &mut rng),
            Err(Error::WrongMessageCount)
        );
    }

    #[test]
    fn zero_secret_key_rejected() {
        assert_eq!(
            SecretKey::from_bytes(&[0u8; 32]),
            Err(Error::InvalidKeyEncoding)
        );
    }

    #[test]
    fn deterministic_generation_is_reproducible() {
        let ikm = [7u8; 32];
        let a = KeyPair::generate::<Bls12381Sha256>(&ikm, Some(b"info"), 3).unwrap();
        let b = KeyPair::generate::<Bls12381Sha256>(&ikm, Some(b"info"), 3).unwrap();
        assert_eq!(a.private_key(), b.private_key());
        assert_eq!(a.public_key(), b.public_key());

        let c = KeyPair::generate::<Bls12381Sha256>(&ikm, Some(b"other"), 3).unwrap();
        assert_ne!(a.private_key(), c.private_key());
    }

    #[test]
    fn short_key_material_rejected() {
        assert!(matches!(
            KeyPair::generate::<Bls12381Sha256>(&[0u8; 16], None, 3),
            Err(Error::KeyGenError(_))
        ));
    }

    #[test]
    fn tampered_generators_fail_validation() {
        let mut rng = StdRng::seed_from_u64(13);
        let keypair = KeyPair::random::<Bls12381Sha256>(3, &mut rng).unwrap();
        let mut pk = keypair.public_key().clone();
        pk.generators.message_generators[1] = pk.generators.q1;
        assert_eq!(
            pk.validate::<Bls12381Sha256>(),
            Err(Error::InvalidKeyEncoding)
        );
    }

    #[test]
    fn secret_key_zeroizes() {
        let mut sk = SecretKey::from_bytes(&{
            let mut b = [0u8; 32];
            b[31] = 42;
            b
        })
        .unwrap();
        sk.zeroize();
        assert_eq!(sk.to_bytes(), [0u8; 32]);
    }

    #[test]
    fn same_count_same_generators_across_keys() {
        let mut rng = StdRng::seed_from_u64(14);
        let a = KeyPair::random::<Bls12381Sha256>(4, &mut rng).unwrap();
        let b = KeyPair::random::<Bls12381Sha256>(4, &mut rng).unwrap();
        assert_eq!(
            a.public_key().generators,
            b.public_key().generators
        );
        assert_ne!(a.public_key().w, b.public_key().w);
    }
}
