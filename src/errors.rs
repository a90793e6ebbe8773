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

use std::fmt;

/// Errors returned by the BBS+ operations.
///
/// Cryptographic verdicts ([`Error::InvalidSignature`], [`Error::InvalidProof`],
/// [`Error::ChallengeMismatch`], [`Error::BatchInvalid`]) carry no detail
/// beyond their kind.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// The number of messages does not match the public key's message count.
    WrongMessageCount,
    /// A disclosed index is out of range or duplicated.
    InvalidIndex(usize),
    /// A G1/G2 encoding is malformed, off-curve or outside the prime-order subgroup.
    InvalidPointEncoding,
    /// A scalar encoding is not canonical (not in `[0, r)`).
    InvalidScalarEncoding,
    /// A serialized proof has a malformed structure.
    InvalidProofEncoding,
    /// A serialized key has a malformed structure.
    InvalidKeyEncoding,
    /// The signature pairing equation did not hold.
    InvalidSignature,
    /// The proof pairing equation did not hold.
    InvalidProof,
    /// The recomputed Fiat-Shamir challenge disagrees with the one in the proof.
    ChallengeMismatch,
    /// Challenge recomputation failed for the proof at the given batch index.
    BatchChallengeMismatch(usize),
    /// The batched pairing equation did not hold.
    BatchInvalid,
    /// The supplied randomness source failed.
    RandomnessFailure,
    /// Multi-scalar multiplication received slices of different lengths.
    MismatchedLengths,
    /// Key generation failed.
    KeyGenError(String),
    /// Signature generation failed.
    SignatureGenerationError(String),
    /// The message expansion for hash-to-scalar failed.
    HashToScalarError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WrongMessageCount => write!(f, "wrong number of messages"),
            Self::InvalidIndex(i) => write!(f, "invalid disclosed index: {}", i),
            Self::InvalidPointEncoding => write!(f, "invalid point encoding"),
            Self::InvalidScalarEncoding => write!(f, "invalid scalar encoding"),
            Self::InvalidProofEncoding => write!(f, "invalid proof encoding"),
            Self::InvalidKeyEncoding => write!(f, "invalid key encoding"),
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::InvalidProof => write!(f, "invalid proof"),
            Self::ChallengeMismatch => write!(f, "challenge mismatch"),
            Self::BatchChallengeMismatch(k) => {
                write!(f, "challenge mismatch for proof {}", k)
            }
            Self::BatchInvalid => write!(f, "batch verification failed"),
            Self::RandomnessFailure => write!(f, "randomness source failure"),
            Self::MismatchedLengths => {
                write!(f, "mismatch between points and scalars length")
            }
            Self::KeyGenError(m) => write!(f, "key generation error: {}", m),
            Self::SignatureGenerationError(m) => {
                write!(f, "signature generation error: {}", m)
            }
            Self::HashToScalarError => write!(f, "hash to scalar error"),
        }
    }
}

impl std::error::Error for Error {}
