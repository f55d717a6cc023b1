//! The algebraic context shared by every protocol phase.
//!
//! BLS12-381 is an asymmetric pairing, so the symmetric `e(G1, G1)` of the
//! scheme is carried out as `e(G1, G2)`: values that are hashed, tagged or
//! aggregated live in G1, values that only ever appear on the right-hand side
//! of a pairing (`g0`, the G2 half of public keys) live in G2.

use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{G1Projective, Scalar};
use sha2::{Digest, Sha256, Sha512};

use crate::config::{Config, DEFAULT_BLOCK_SIZE};
use crate::error::{Error, Result};

const IDENTITY_DST: &[u8] = b"IDPDP-V01-CS01-with-BLS12381G1_XMD:SHA-256_SSWU_RO_IDENTITY_";
const ANCHOR_DST: &[u8] = b"IDPDP-V01-CS01-with-BLS12381G1_XMD:SHA-256_SSWU_RO_ANCHOR_";
const BLOCK_DST: &[u8] = b"IDPDP-V01-BLOCK-TO-SCALAR_";
pub(crate) const COEFFICIENT_DST: &[u8] = b"IDPDP-V01-COEFFICIENT-TO-SCALAR_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgebraicContext {
    block_size: usize,
}

impl Default for AlgebraicContext {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl AlgebraicContext {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::with_block_size(config.block_size)
    }

    pub fn with_block_size(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Config("block_size must be positive".into()));
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks a file of `file_size` bytes is split into.
    ///
    /// The final block may be short or even empty, so an exact multiple of
    /// the block size still gets one extra block.
    pub fn block_count(&self, file_size: u64) -> u64 {
        file_size / self.block_size as u64 + 1
    }

    // H1: identity string -> G1
    pub fn hash_identity(&self, identity: &str) -> G1Projective {
        <G1Projective as HashToCurve<ExpandMsgXmd<Sha256>>>::hash_to_curve(
            identity.as_bytes(),
            IDENTITY_DST,
        )
    }

    // H2: per-block anchor W_i bound to the file identifier and the block index.
    // The index is the suffix after the last ':' so the encoding is unambiguous.
    pub fn hash_anchor(&self, identifier: &str, index: u64) -> G1Projective {
        let message = format!("{identifier}:{index}");
        <G1Projective as HashToCurve<ExpandMsgXmd<Sha256>>>::hash_to_curve(
            message.as_bytes(),
            ANCHOR_DST,
        )
    }

    // Hash of the raw block content into Zr.
    pub fn hash_block(&self, block: &[u8]) -> Scalar {
        hash_to_scalar(BLOCK_DST, block)
    }
}

// Wide hash-to-field: 512 bits of SHA-512 output reduced into the scalar field,
// which keeps the bias negligible.
pub(crate) fn hash_to_scalar(dst: &[u8], message: &[u8]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(dst);
    hasher.update([dst.len() as u8]);
    hasher.update(message);
    let hash = hasher.finalize();

    let mut wide_bytes = [0u8; 64];
    wide_bytes.copy_from_slice(&hash);
    Scalar::from_bytes_wide(&wide_bytes)
}
