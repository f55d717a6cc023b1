//! Challenges: a fresh random seed plus the fraction of blocks to sample.
//!
//! Only this compact value travels from verifier to prover. Both sides expand
//! it into the same sorted index set and the same per-index coefficients.

use bls12_381::Scalar;
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::coefficient::derive_coefficient;
use crate::error::{Error, Result};
use crate::sampler::sample_indices;

pub const SEED_SIZE: usize = 32;

pub type Seed = [u8; SEED_SIZE];

/// Largest index set a challenge expands to. Block counts come from files a
/// prover or verifier reads, so anything beyond this is refused as malformed
/// instead of being sampled.
pub const MAX_CHALLENGED_BLOCKS: u64 = 1 << 24;

#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    seed: Seed,
    ratio: f64,
}

impl Challenge {
    /// Builds a challenge from its parts.
    ///
    /// The ratio is kept at the six decimals the challenge file stores, so an
    /// in-memory challenge and its decoded file always expand identically.
    pub fn new(seed: Seed, ratio: f64) -> Result<Self> {
        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(Error::malformed(format!(
                "challenge ratio must lie in (0, 1], got {ratio}"
            )));
        }
        let ratio: f64 = format!("{ratio:.6}")
            .parse()
            .map_err(|_| Error::malformed("unrepresentable challenge ratio"))?;
        if ratio == 0.0 {
            return Err(Error::malformed("challenge ratio rounds to zero"));
        }
        Ok(Self { seed, ratio })
    }

    // ChallengeGen: a seed that is never reused, drawn from `rng`.
    pub fn generate<R: RngCore + CryptoRng>(ratio: f64, rng: &mut R) -> Result<Self> {
        let mut seed = [0u8; SEED_SIZE];
        rng.fill_bytes(&mut seed);
        let challenge = Self::new(seed, ratio)?;
        debug!(ratio = challenge.ratio, "generated challenge");
        Ok(challenge)
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// `round(ratio * block_count)`, never below one block.
    pub fn challenged_count(&self, block_count: u64) -> u64 {
        let count = (self.ratio * block_count as f64).round() as u64;
        count.clamp(1, block_count.max(1))
    }

    pub fn indices(&self, block_count: u64) -> Result<Vec<u64>> {
        let count = self.challenged_count(block_count);
        if count > MAX_CHALLENGED_BLOCKS {
            return Err(Error::malformed(format!(
                "challenge covers {count} of {block_count} blocks, more than the \
                 {MAX_CHALLENGED_BLOCKS} a proof may cover"
            )));
        }
        let count = usize::try_from(count)
            .map_err(|_| Error::malformed("challenge too large for this platform"))?;
        sample_indices(&self.seed, count, block_count)
    }

    pub fn coefficient(&self, index: u64) -> Scalar {
        derive_coefficient(&self.seed, index)
    }

    // 32 raw seed bytes, newline, ratio as decimal text, newline.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEED_SIZE + 10);
        out.extend_from_slice(&self.seed);
        out.push(b'\n');
        out.extend_from_slice(format!("{:.6}\n", self.ratio).as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SEED_SIZE + 1 {
            return Err(Error::malformed("challenge file too short for its seed"));
        }
        let (seed_bytes, rest) = bytes.split_at(SEED_SIZE);
        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(seed_bytes);

        let text = std::str::from_utf8(rest)
            .map_err(|_| Error::malformed("challenge ratio is not text"))?;
        let ratio: f64 = text
            .trim()
            .parse()
            .map_err(|_| Error::malformed(format!("challenge ratio {:?} is not a number", text.trim())))?;
        Self::new(seed, ratio)
    }
}
