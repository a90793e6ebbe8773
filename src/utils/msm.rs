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

use crate::errors::Error;
use crate::utils::util::ScalarExt;
use bls12_381_plus::{G1Projective, Scalar};
use elliptic_curve::group::Group;
use ff::Field;

/// Below this size the bucket method costs more than it saves.
const PIPPENGER_CUTOFF: usize = 32;

/// Computes `sum(scalars[i] * points[i])` in constant time.
///
/// The empty sum is the group identity. Fails iff the slice lengths
/// disagree. Every term is multiplied with the library's constant-time
/// ladder; zero scalars and identity points are folded in like any other
/// term so that secret scalars never gate the amount of work done.
pub fn msm_g1(points: &[G1Projective], scalars: &[Scalar]) -> Result<G1Projective, Error> {
    if points.len() != scalars.len() {
        return Err(Error::MismatchedLengths);
    }

    let mut acc = G1Projective::IDENTITY;
    for (point, scalar) in points.iter().zip(scalars.iter()) {
        acc += *point * *scalar;
    }
    Ok(acc)
}

/// Computes `sum(scalars[i] * points[i])` in variable time.
///
/// Same contract as [`msm_g1`]. Only for public inputs (verification-side
/// reconstructions): the running time depends on the scalar bits. Inputs
/// larger than a few dozen points take the bucket (Pippenger) path.
pub fn msm_g1_vartime(points: &[G1Projective], scalars: &[Scalar]) -> Result<G1Projective, Error> {
    if points.len() != scalars.len() {
        return Err(Error::MismatchedLengths);
    }
    if points.is_empty() {
        return Ok(G1Projective::IDENTITY);
    }

    if points.len() < PIPPENGER_CUTOFF {
        let mut acc = G1Projective::IDENTITY;
        for (point, scalar) in points.iter().zip(scalars.iter()) {
            if bool::from(scalar.is_zero()) || bool::from(point.is_identity()) {
                continue;
            }
            acc += *point * *scalar;
        }
        return Ok(acc);
    }

    Ok(pippenger(points, scalars))
}

fn window_size(n: usize) -> usize {
    match n {
        0..=95 => 4,
        96..=383 => 5,
        384..=1535 => 6,
        1536..=6143 => 7,
        _ => 8,
    }
}

/// Reads `width` bits of a big-endian scalar encoding starting at
/// `start_bit`, where bit 0 is the least significant.
fn scalar_window(bytes: &[u8; 32], start_bit: usize, width: usize) -> usize {
    let mut acc = 0usize;
    for i in 0..width {
        let bit = start_bit + i;
        if bit >= 256 {
            break;
        }
        let byte = bytes[31 - bit / 8];
        acc |= (((byte >> (bit % 8)) & 1) as usize) << i;
    }
    acc
}

fn pippenger(points: &[G1Projective], scalars: &[Scalar]) -> G1Projective {
    let c = window_size(points.len());
    let windows = (255 + c - 1) / c;
    let encoded: Vec<[u8; 32]> = scalars.iter().map(|s| s.to_bytes_be()).collect();

    let mut result = G1Projective::IDENTITY;
    for w in (0..windows).rev() {
        for _ in 0..c {
            result = result.double();
        }

        let mut buckets = vec![G1Projective::IDENTITY; (1 << c) - 1];
        for (point, bytes) in points.iter().zip(encoded.iter()) {
            let idx = scalar_window(bytes, w * c, c);
            if idx != 0 {
                buckets[idx - 1] += *point;
            }
        }

        // running suffix sum weights bucket i by its window value i+1
        let mut running = G1Projective::IDENTITY;
        let mut window_sum = G1Projective::IDENTITY;
        for bucket in buckets.iter().rev() {
            running += *bucket;
            window_sum += running;
        }
        result += window_sum;
    }
    result
}
