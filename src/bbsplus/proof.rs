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
use crate::bbsplus::signature::{commitment_to_messages, Signature};
use crate::errors::Error;
use crate::utils::message::BbsMessage;
use crate::utils::msm::{msm_g1, msm_g1_vartime};
use crate::utils::util::{
    calculate_domain, calculate_random_scalars, g1_to_bytes, get_remaining_indexes,
    hash_to_scalar, i2osp, parse_g1_projective, random_nonzero_scalar, random_scalar, ScalarExt,
};
use bls12_381_plus::{
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, Gt, Scalar,
};
use elliptic_curve::group::Curve;
use elliptic_curve::hash2curve::ExpandMsg;
use ff::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

/// Workers used for the challenge-recomputation fan-out of batch
/// verification.
const BATCH_CONCURRENCY: usize = 4;

/// A proof of knowledge of a BBS+ signature with selective disclosure.
///
/// The commitments `(A', Abar, D)` randomize the signature; `c` is the
/// Fiat-Shamir challenge and the remaining scalars are the responses, with
/// one `(index, m_cap)` pair per undisclosed message in ascending index
/// order.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PoKSignature {
    A_prime: G1Projective,
    A_bar: G1Projective,
    D: G1Projective,
    c: Scalar,
    e_cap: Scalar,
    r2_cap: Scalar,
    r3_cap: Scalar,
    s_cap: Scalar,
    m_cap: Vec<(usize, Scalar)>,
}

/// One proof of an independent batch, with the parameters it verifies
/// against.
pub struct BatchEntry<'a> {
    /// The issuer key the proof was created under.
    pub public_key: &'a PublicKey,
    /// The proof itself.
    pub proof: &'a PoKSignature,
    /// The revealed positions and their message values.
    pub disclosed_messages: &'a BTreeMap<usize, BbsMessage>,
    /// The context header the signature was bound to.
    pub header: Option<&'a [u8]>,
}

impl PoKSignature {
    /// Creates a proof revealing exactly the messages at
    /// `disclosed_indexes` (0-based).
    ///
    /// The empty set (nothing revealed) and the full set (everything
    /// revealed) are both legal. Returns the proof together with the
    /// disclosed-message map the verifier needs.
    pub fn proof_gen<CS, R>(
        pk: &PublicKey,
        signature: &Signature,
        messages: &[BbsMessage],
        disclosed_indexes: &[usize],
        header: Option<&[u8]>,
        rng: &mut R,
    ) -> Result<(Self, BTreeMap<usize, BbsMessage>), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
    {
        let L = messages.len();
        if L != pk.message_count() {
            return Err(Error::WrongMessageCount);
        }

        let mut revealed = vec![false; L];
        for &i in disclosed_indexes {
            if i >= L || revealed[i] {
                return Err(Error::InvalidIndex(i));
            }
            revealed[i] = true;
        }
        let revealed_indexes: Vec<usize> = (0..L).filter(|&i| revealed[i]).collect();
        let undisclosed_indexes = get_remaining_indexes(L, &revealed_indexes);
        let U = undisclosed_indexes.len();

        let disclosed_map: BTreeMap<usize, BbsMessage> = revealed_indexes
            .iter()
            .map(|&i| (i, messages[i]))
            .collect();

        let domain = calculate_domain::<CS>(pk, header)?;

        let r1 = random_nonzero_scalar(rng)?;
        let r2 = random_scalar(rng)?;
        let mut blind_scalars = calculate_random_scalars(4 + U, rng)?;
        let e_tilde = blind_scalars[0];
        let r2_tilde = blind_scalars[1];
        let r3_tilde = blind_scalars[2];
        let s_tilde = blind_scalars[3];

        let B = commitment_to_messages(pk, messages, domain, signature.s, false)?;

        let r3 = Option::<Scalar>::from(r1.invert()).ok_or(Error::RandomnessFailure)?;

        let A_prime = signature.A * r1;
        let A_bar = A_prime * (-signature.e) + B * r1;
        let D = B * r1 + pk.generators.q1 * r2;
        let s_prime = r2 * r3 + signature.s;

        let C1 = A_prime * e_tilde + pk.generators.q1 * r2_tilde;

        // C2 = D * (-r3~) + Q1 * s~ + H_j1 * m~_1 + ... + H_jU * m~_U
        let mut points = Vec::with_capacity(2 + U);
        points.push(D);
        points.push(pk.generators.q1);
        for &j in &undisclosed_indexes {
            points.push(pk.generators.message_generators[j]);
        }
        let mut scalars = Vec::with_capacity(2 + U);
        scalars.push(-r3_tilde);
        scalars.push(s_tilde);
        scalars.extend_from_slice(&blind_scalars[4..]);
        let C2 = msm_g1(&points, &scalars)?;

        let c = calculate_challenge::<CS>(&A_prime, &A_bar, &D, &C1, &C2, &disclosed_map, domain)?;

        let e_cap = c * signature.e + e_tilde;
        let r2_cap = c * r2 + r2_tilde;
        let r3_cap = c * r3 + r3_tilde;
        let s_cap = c * s_prime + s_tilde;
        let m_cap: Vec<(usize, Scalar)> = undisclosed_indexes
            .iter()
            .zip(blind_scalars[4..].iter())
            .map(|(&j, m_t)| (j, c * messages[j].value + m_t))
            .collect();

        for blind in blind_scalars.iter_mut() {
            *blind = Scalar::ZERO;
        }
        for scalar in scalars.iter_mut() {
            *scalar = Scalar::ZERO;
        }

        let proof = Self {
            A_prime,
            A_bar,
            D,
            c,
            e_cap,
            r2_cap,
            r3_cap,
            s_cap,
            m_cap,
        };
        Ok((proof, disclosed_map))
    }

    /// Verifies the proof against the disclosed messages and header.
    ///
    /// The challenge recomputation runs first and short-circuits malformed
    /// proofs before the pairing is evaluated.
    pub fn proof_verify<CS>(
        &self,
        pk: &PublicKey,
        disclosed_messages: &BTreeMap<usize, BbsMessage>,
        header: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        self.challenge_checks::<CS>(pk, disclosed_messages, header)?;
        self.pairing_check(pk)
    }

    /// Everything except the pairing: index validation, commitment
    /// reconstruction and challenge recomputation.
    fn challenge_checks<CS>(
        &self,
        pk: &PublicKey,
        disclosed_messages: &BTreeMap<usize, BbsMessage>,
        header: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let L = pk.message_count();

        for &i in disclosed_messages.keys() {
            if i >= L {
                return Err(Error::InvalidIndex(i));
            }
        }
        if disclosed_messages.len() + self.m_cap.len() != L {
            return Err(Error::WrongMessageCount);
        }

        // the hidden positions carried by the proof must be exactly the
        // complement of the disclosed set
        let revealed_indexes: Vec<usize> = disclosed_messages.keys().copied().collect();
        let undisclosed_indexes = get_remaining_indexes(L, &revealed_indexes);
        for (&(i, _), &j) in self.m_cap.iter().zip(undisclosed_indexes.iter()) {
            if i != j {
                return Err(Error::InvalidIndex(i));
            }
        }

        let domain = calculate_domain::<CS>(pk, header)?;

        let C1 = (self.A_bar - self.D) * self.c
            + self.A_prime * self.e_cap
            + pk.generators.q1 * self.r2_cap;

        // T = P1 + Q2 * domain + sum of disclosed H_i * m_i
        let mut t_points = Vec::with_capacity(1 + disclosed_messages.len());
        t_points.push(pk.generators.q2);
        let mut t_scalars = Vec::with_capacity(1 + disclosed_messages.len());
        t_scalars.push(domain);
        for (&i, m) in disclosed_messages {
            t_points.push(pk.generators.message_generators[i]);
            t_scalars.push(m.value);
        }
        let T = G1Projective::GENERATOR + msm_g1_vartime(&t_points, &t_scalars)?;

        // C2 = T * c - D * r3^ + Q1 * s^ + sum of hidden H_j * m^_j
        let mut points = Vec::with_capacity(3 + self.m_cap.len());
        points.push(T);
        points.push(self.D);
        points.push(pk.generators.q1);
        let mut scalars = Vec::with_capacity(3 + self.m_cap.len());
        scalars.push(self.c);
        scalars.push(-self.r3_cap);
        scalars.push(self.s_cap);
        for &(j, m_hat) in &self.m_cap {
            points.push(pk.generators.message_generators[j]);
            scalars.push(m_hat);
        }
        let C2 = msm_g1_vartime(&points, &scalars)?;

        let cv = calculate_challenge::<CS>(
            &self.A_prime,
            &self.A_bar,
            &self.D,
            &C1,
            &C2,
            disclosed_messages,
            domain,
        )?;
        if cv != self.c {
            return Err(Error::ChallengeMismatch);
        }

        if self.A_prime == G1Projective::IDENTITY {
            return Err(Error::InvalidProof);
        }

        Ok(())
    }

    /// `e(A', W) * e(Abar, -P2) = 1`
    fn pairing_check(&self, pk: &PublicKey) -> Result<(), Error> {
        let A_prime_affine = self.A_prime.to_affine();
        let A_bar_affine = self.A_bar.to_affine();
        let w = G2Prepared::from(pk.w.to_affine());
        let neg_p2 = G2Prepared::from(-G2Affine::generator());

        let pairing = multi_miller_loop(&[(&A_prime_affine, &w), (&A_bar_affine, &neg_p2)])
            .final_exponentiation();

        if pairing == Gt::IDENTITY {
            Ok(())
        } else {
            Err(Error::InvalidProof)
        }
    }

    /// Serializes as
    /// `A' || Abar || D || c || e^ || r2^ || r3^ || s^ || u32be(U) || (idx, m^)*`
    /// where every component carries a u32 big-endian length prefix and the
    /// hidden indices appear in ascending order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::new();

        for point in [&self.A_prime, &self.A_bar, &self.D] {
            bytes.extend_from_slice(&i2osp::<4>(G1Affine::COMPRESSED_BYTES));
            bytes.extend_from_slice(&g1_to_bytes(point));
        }
        for scalar in [&self.c, &self.e_cap, &self.r2_cap, &self.r3_cap, &self.s_cap] {
            bytes.extend_from_slice(&i2osp::<4>(Scalar::BYTES));
            bytes.extend_from_slice(&scalar.to_bytes_be());
        }
        bytes.extend_from_slice(&i2osp::<4>(self.m_cap.len()));
        for (index, m_hat) in &self.m_cap {
            bytes.extend_from_slice(&i2osp::<4>(*index));
            bytes.extend_from_slice(&i2osp::<4>(Scalar::BYTES));
            bytes.extend_from_slice(&m_hat.to_bytes_be());
        }

        bytes
    }

    /// Parses the [`Self::to_bytes`] layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut offset = 0usize;

        let mut g1_points = [G1Projective::IDENTITY; 3];
        for point in g1_points.iter_mut() {
            let block = read_block(bytes, &mut offset, G1Affine::COMPRESSED_BYTES)?;
            *point = parse_g1_projective(block)?;
        }

        let mut scalar_values = [Scalar::ZERO; 5];
        for scalar in scalar_values.iter_mut() {
            let block = read_block(bytes, &mut offset, Scalar::BYTES)?;
            *scalar = Scalar::from_bytes_be(block)?;
        }

        let hidden_count = read_u32(bytes, &mut offset)? as usize;
        let mut m_cap = Vec::with_capacity(hidden_count);
        let mut previous: Option<usize> = None;
        for _ in 0..hidden_count {
            let index = read_u32(bytes, &mut offset)? as usize;
            if previous.map_or(false, |p| index <= p) {
                return Err(Error::InvalidProofEncoding);
            }
            previous = Some(index);

            let block = read_block(bytes, &mut offset, Scalar::BYTES)?;
            m_cap.push((index, Scalar::from_bytes_be(block)?));
        }

        if offset != bytes.len() {
            return Err(Error::InvalidProofEncoding);
        }

        Ok(Self {
            A_prime: g1_points[0],
            A_bar: g1_points[1],
            D: g1_points[2],
            c: scalar_values[0],
            e_cap: scalar_values[1],
            r2_cap: scalar_values[2],
            r3_cap: scalar_values[3],
            s_cap: scalar_values[4],
            m_cap,
        })
    }
}

/// Verifies a batch of independent proofs with one randomized product
/// pairing.
///
/// Every challenge is recomputed first, fanned out over a bounded pool of
/// worker threads; a failure there names the lowest failing batch index.
/// The final pairing combines all proofs under fresh random weights and
/// either accepts the whole batch or rejects it without pinpointing the bad
/// proof — callers needing a precise diagnosis re-verify individually.
pub fn batch_verify<CS>(
    entries: &[BatchEntry<'_>],
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(), Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    if entries.is_empty() {
        return Ok(());
    }
    if entries.len() == 1 {
        let entry = &entries[0];
        return entry
            .proof
            .proof_verify::<CS>(entry.public_key, entry.disclosed_messages, entry.header);
    }

    let workers = BATCH_CONCURRENCY.min(entries.len());
    let first_failure = thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, Error)>();
        for worker in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || {
                for (k, entry) in entries.iter().enumerate().skip(worker).step_by(workers) {
                    if let Err(err) = entry.proof.challenge_checks::<CS>(
                        entry.public_key,
                        entry.disclosed_messages,
                        entry.header,
                    ) {
                        let _ = tx.send((k, err));
                    }
                }
            });
        }
        drop(tx);

        let mut first: Option<(usize, Error)> = None;
        for (k, err) in rx {
            if first.as_ref().map_or(true, |(first_k, _)| k < *first_k) {
                first = Some((k, err));
            }
        }
        first
    });

    if let Some((k, err)) = first_failure {
        return Err(match err {
            Error::ChallengeMismatch => Error::BatchChallengeMismatch(k),
            other => other,
        });
    }

    // rho_k = 1 would void the randomization, so the weights are nonzero
    // scalars from the caller's cryptographic source
    let mut terms: Vec<(G1Affine, G2Prepared)> = Vec::with_capacity(2 * entries.len());
    for entry in entries {
        let rho = random_nonzero_scalar(rng)?;
        terms.push((
            (entry.proof.A_prime * rho).to_affine(),
            G2Prepared::from(entry.public_key.w.to_affine()),
        ));
        terms.push((
            (entry.proof.A_bar * rho).to_affine(),
            G2Prepared::from(-G2Affine::generator()),
        ));
    }
    let term_refs: Vec<(&G1Affine, &G2Prepared)> =
        terms.iter().map(|(g1, g2)| (g1, g2)).collect();

    let pairing = multi_miller_loop(&term_refs).final_exponentiation();
    if pairing == Gt::IDENTITY {
        Ok(())
    } else {
        Err(Error::BatchInvalid)
    }
}

/// Fiat-Shamir challenge over the commitments, the sorted disclosed
/// encoding and the domain:
/// `c = H2S( A' || Abar || D || C1 || C2 || u32be(R) ||
/// (u32be(i) || u32be(32) || m_i)* || domain )`
/// with disclosed indices in ascending order.
fn calculate_challenge<CS>(
    A_prime: &G1Projective,
    A_bar: &G1Projective,
    D: &G1Projective,
    C1: &G1Projective,
    C2: &G1Projective,
    disclosed_messages: &BTreeMap<usize, BbsMessage>,
    domain: Scalar,
) -> Result<Scalar, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    let mut c_octets: Vec<u8> = Vec::new();
    for point in [A_prime, A_bar, D, C1, C2] {
        c_octets.extend_from_slice(&g1_to_bytes(point));
    }
    c_octets.extend_from_slice(&i2osp::<4>(disclosed_messages.len()));
    for (&index, message) in disclosed_messages {
        c_octets.extend_from_slice(&i2osp::<4>(index));
        c_octets.extend_from_slice(&i2osp::<4>(Scalar::BYTES));
        c_octets.extend_from_slice(&message.to_bytes_be());
    }
    c_octets.extend_from_slice(&domain.to_bytes_be());

    hash_to_scalar::<CS>(&c_octets, &CS::challenge_dst())
}

fn read_u32(bytes: &[u8], offset: &mut usize) -> Result<u32, Error> {
    let end = offset
        .checked_add(4)
        .ok_or(Error::InvalidProofEncoding)?;
    if end > bytes.len() {
        return Err(Error::InvalidProofEncoding);
    }
    let value = u32::from_be_bytes(bytes[*offset..end].try_into().unwrap());
    *offset = end;
    Ok(value)
}

fn read_block<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    expected_len: usize,
) -> Result<&'a [u8], Error> {
    let len = read_u32(bytes, offset)? as usize;
    if len != expected_len {
        return Err(Error::InvalidProofEncoding);
    }
    let end = offset
        .checked_add(len)
        .ok_or(Error::InvalidProofEncoding)?;
    if end > bytes.len() {
        return Err(Error::InvalidProofEncoding);
    }
    let block = &bytes[*offset..end];
    *offset = end;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::Bls12381Sha256;
    use crate::bbsplus::keys::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(
        message_count: usize,
        seed: u64,
    ) -> (KeyPair, Vec<BbsMessage>, Signature, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let keypair = KeyPair::random::<Bls12381Sha256>(message_count, &mut rng).unwrap();
        let messages: Vec<BbsMessage> = (0..message_count)
            .map(|i| {
                BbsMessage::map_message_to_scalar_as_hash::<Bls12381Sha256>(
                    format!("attr-{}", i).as_bytes(),
                )
                .unwrap()
            })
            .collect();
        let signature = Signature::sign::<Bls12381Sha256, _>(
            keypair.private_key(),
            keypair.public_key(),
            &messages,
            Some(b"header"),
            &mut rng,
        )
        .unwrap();
        (keypair, messages, signature, rng)
    }

    #[test]
    fn serialization_round_trip() {
        let (keypair, messages, signature, mut rng) = setup(5, 31);
        let (proof, disclosed) = PoKSignature::proof_gen::<Bls12381Sha256, _>(
            keypair.public_key(),
            &signature,
            &messages,
            &[1, 3],
            Some(b"header"),
            &mut rng,
        )
        .unwrap();

        let parsed = PoKSignature::from_bytes(&proof.to_bytes()).unwrap();
        assert_eq!(parsed, proof);
        parsed
            .proof_verify::<Bls12381Sha256>(keypair.public_key(), &disclosed, Some(b"header"))
            .unwrap();
    }

    #[test]
    fn truncated_proof_rejected() {
        let (keypair, messages, signature, mut rng) = setup(3, 32);
        let (proof, _) = PoKSignature::proof_gen::<Bls12381Sha256, _>(
            keypair.public_key(),
            &signature,
            &messages,
            &[0],
            None,
            &mut rng,
        )
        .unwrap();

        let bytes = proof.to_bytes();
        assert_eq!(
            PoKSignature::from_bytes(&bytes[..bytes.len() - 1]),
            Err(Error::InvalidProofEncoding)
        );
        let mut extended = bytes.clone();
        extended.push(0);
        assert_eq!(
            PoKSignature::from_bytes(&extended),
            Err(Error::InvalidProofEncoding)
        );
    }

    #[test]
    fn out_of_order_hidden_indices_rejected() {
        let (keypair, messages, signature, mut rng) = setup(4, 33);
        let (proof, _) = PoKSignature::proof_gen::<Bls12381Sha256, _>(
            keypair.public_key(),
            &signature,
            &messages,
            &[1],
            None,
            &mut rng,
        )
        .unwrap();

        let mut swapped = proof.clone();
        swapped.m_cap.swap(0, 1);
        assert_eq!(
            PoKSignature::from_bytes(&swapped.to_bytes()),
            Err(Error::InvalidProofEncoding)
        );
    }

    #[test]
    fn duplicate_disclosed_index_rejected() {
        let (keypair, messages, signature, mut rng) = setup(3, 34);
        assert_eq!(
            PoKSignature::proof_gen::<Bls12381Sha256, _>(
                keypair.public_key(),
                &signature,
                &messages,
                &[1, 1],
                None,
                &mut rng,
            )
            .err(),
            Some(Error::InvalidIndex(1))
        );
        assert_eq!(
            PoKSignature::proof_gen::<Bls12381Sha256, _>(
                keypair.public_key(),
                &signature,
                &messages,
                &[3],
                None,
                &mut rng,
            )
            .err(),
            Some(Error::InvalidIndex(3))
        );
    }
}
