use bls12_381::Scalar;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::challenge::Seed;
use crate::context::{COEFFICIENT_DST, hash_to_scalar};

// Deterministic coefficient v_i for challenged block `index`.
//
// Prover and verifier both derive it from the challenge seed alone. The seed
// is read as a 256-bit big-endian integer offset by `index`, the sum seeds a
// ChaCha20 stream, and 256 drawn bits are hashed into Zr.
pub fn derive_coefficient(seed: &Seed, index: u64) -> Scalar {
    let mut rng = ChaCha20Rng::from_seed(offset_seed(seed, index));
    let mut draw = [0u8; 32];
    rng.fill_bytes(&mut draw);
    hash_to_scalar(COEFFICIENT_DST, &draw)
}

// seed + index mod 2^256
fn offset_seed(seed: &Seed, index: u64) -> Seed {
    let mut out = *seed;
    let mut carry = u128::from(index);
    for byte in out.iter_mut().rev() {
        if carry == 0 {
            break;
        }
        let sum = u128::from(*byte) + (carry & 0xff);
        *byte = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_carries() {
        let mut seed = [0u8; 32];
        seed[31] = 0xff;
        let out = offset_seed(&seed, 1);
        assert_eq!(out[31], 0);
        assert_eq!(out[30], 1);

        let all_ones = [0xffu8; 32];
        assert_eq!(offset_seed(&all_ones, 1), [0u8; 32]);
        assert_eq!(offset_seed(&all_ones, 0), all_ones);
    }

    #[test]
    fn offset_of_large_index() {
        let out = offset_seed(&[0u8; 32], u64::MAX);
        assert_eq!(&out[24..], &u64::MAX.to_be_bytes());
        assert!(out[..24].iter().all(|b| *b == 0));
    }

    #[test]
    fn deterministic_and_index_sensitive() {
        let seed = [9u8; 32];
        assert_eq!(derive_coefficient(&seed, 5), derive_coefficient(&seed, 5));
        assert_ne!(derive_coefficient(&seed, 5), derive_coefficient(&seed, 6));
        assert_ne!(derive_coefficient(&seed, 5), derive_coefficient(&[8u8; 32], 5));
    }
}
