use std::collections::BTreeSet;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::challenge::Seed;
use crate::error::{Error, Result};

// Picks `count` distinct block indices in [1, upper], ascending.
//
// The generator is reseeded from the first four bytes of the challenge seed
// only. Indices are public, so this is a commitment device rather than a
// secret, and the contract must stay fixed for prover and verifier to agree:
// the ChaCha20 key is those four bytes followed by zeros, and each draw is a
// raw `next_u64` reduced by rejection, independent of `rand`'s range sampling.
pub fn sample_indices(seed: &Seed, count: usize, upper: u64) -> Result<Vec<u64>> {
    if count as u64 > upper {
        return Err(Error::malformed(format!(
            "cannot sample {count} distinct indices from 1..={upper}"
        )));
    }

    let mut key = [0u8; 32];
    key[..4].copy_from_slice(&seed[..4]);
    let mut rng = ChaCha20Rng::from_seed(key);

    let mut chosen = BTreeSet::new();
    while chosen.len() < count {
        chosen.insert(draw_index(&mut rng, upper));
    }
    Ok(chosen.into_iter().collect())
}

// Uniform in [1, upper]. Words below 2^64 mod upper are redrawn so every
// residue has the same number of preimages. `upper` must be non-zero.
fn draw_index(rng: &mut ChaCha20Rng, upper: u64) -> u64 {
    let threshold = upper.wrapping_neg() % upper;
    loop {
        let word = rng.next_u64();
        if word >= threshold {
            return word % upper + 1;
        }
    }
}
