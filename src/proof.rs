//! Proof generation and verification.
//!
//! With `v_i` the challenge coefficients and `I` the challenged indices, an
//! honest prover answers with
//!
//! ```text
//!     mu    = sum_{i in I} H(m_i) * v_i
//!     sigma = prod_{i in I} sigma_i^{v_i} * (Pc^{Be * sum v_i - Be})^{-1}
//! ```
//!
//! and the verifier accepts iff
//!
//! ```text
//!     e(sigma, g) == e(Qc^mu, g0) * e(prod W_i^{v_i} * Pe, Pc)
//! ```

use std::io::{BufReader, Read};
use std::time::Instant;

use bls12_381::{G1Affine, G1Projective, Scalar, pairing};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::block::BlockReader;
use crate::challenge::Challenge;
use crate::codec::{Element, ElementReader, read_encoding};
use crate::context::AlgebraicContext;
use crate::error::{Error, Result};
use crate::keys::{PublicKey, PublicParameters};
use crate::metadata::FileMetadata;

// Constant size whatever the number of challenged blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    mu: Scalar,
    sigma: G1Affine,
}

impl Proof {
    pub fn new(mu: Scalar, sigma: G1Affine) -> Self {
        Self { mu, sigma }
    }

    pub fn mu(&self) -> &Scalar {
        &self.mu
    }

    pub fn sigma(&self) -> &G1Affine {
        &self.sigma
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Scalar::LEN + G1Affine::LEN);
        self.mu.encode_into(&mut out);
        self.sigma.encode_into(&mut out);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "proof");
        let proof = Self {
            mu: reader.next()?,
            sigma: reader.next()?,
        };
        reader.finish()?;
        Ok(proof)
    }
}

/// ProofGen.
///
/// Walks the file blocks and their tags in lockstep, merging against the
/// ascending challenged indices, so both inputs are read exactly once.
/// `owner_secret` is the auditee's `beta` (Be), `csp_public` the provider's
/// public key (Pc).
pub fn generate_proof<R: Read, T: Read>(
    ctx: &AlgebraicContext,
    file: R,
    block_count: u64,
    tags: T,
    challenge: &Challenge,
    owner_secret: &Scalar,
    csp_public: &PublicKey,
) -> Result<Proof> {
    let started = Instant::now();
    let indices = challenge.indices(block_count)?;
    debug!(block_count, challenged = indices.len(), "expanded challenge");

    let mut pending = indices.iter().copied().peekable();
    let mut blocks = BlockReader::new(file, ctx.block_size());
    let mut tags = BufReader::new(tags);
    let mut block = Vec::with_capacity(ctx.block_size());
    let mut encoded_tag = [0u8; G1Affine::LEN];

    let mut mu = Scalar::zero();
    let mut aggregate = G1Projective::identity();
    let mut sum_v = Scalar::zero();

    while let Some(index) = blocks.next_block(&mut block)? {
        if index > block_count {
            return Err(Error::malformed(format!(
                "file has more than the expected {block_count} blocks"
            )));
        }
        if !read_encoding::<G1Affine, _>(&mut tags, &mut encoded_tag, "tags")? {
            return Err(Error::malformed(format!("tags end before block {index}")));
        }
        if pending.peek() != Some(&index) {
            continue;
        }
        pending.next();

        let tag = G1Affine::decode(&encoded_tag)
            .ok_or_else(|| Error::malformed(format!("tag {index} is not a valid G1 element")))?;
        let v = challenge.coefficient(index);
        mu += ctx.hash_block(&block) * v;
        aggregate += G1Projective::from(tag) * v;
        sum_v += *owner_secret * v;
    }

    let seen = blocks.next_index() - 1;
    if seen != block_count {
        return Err(Error::malformed(format!(
            "file has {seen} blocks but {block_count} were expected"
        )));
    }
    if read_encoding::<G1Affine, _>(&mut tags, &mut encoded_tag, "tags")? {
        return Err(Error::malformed("more tags than file blocks"));
    }

    let blinding = G1Projective::from(csp_public.g1_part()) * (sum_v - owner_secret);
    let sigma = G1Affine::from(aggregate - blinding);

    info!(
        block_count,
        challenged = indices.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "proof generation finished"
    );
    Ok(Proof { mu, sigma })
}

/// VerifyProof.
///
/// Needs no file content, only its metadata. `Ok(false)` means the provider
/// failed to prove possession; errors are reserved for unusable input such as
/// public keys whose two halves disagree.
#[allow(clippy::too_many_arguments)]
pub fn verify_proof(
    ctx: &AlgebraicContext,
    params: &PublicParameters,
    csp_public: &PublicKey,
    owner_public: &PublicKey,
    proof: &Proof,
    csp_identity: &str,
    challenge: &Challenge,
    metadata: &FileMetadata,
) -> Result<bool> {
    let started = Instant::now();
    if !csp_public.is_consistent(params) {
        return Err(Error::malformed("provider public key does not match the parameters"));
    }
    if !owner_public.is_consistent(params) {
        return Err(Error::malformed("owner public key does not match the parameters"));
    }

    let qc = ctx.hash_identity(csp_identity);
    let indices = challenge.indices(metadata.block_count())?;
    let identifier = metadata.identifier();

    let pro_w = indices
        .par_iter()
        .map(|&i| ctx.hash_anchor(identifier, i) * challenge.coefficient(i))
        .reduce(G1Projective::identity, |a, b| a + b);

    let b1 = pairing(&proof.sigma, params.g2());
    let b2 = pairing(&G1Affine::from(qc * proof.mu), params.g0());
    let b3 = pairing(
        &G1Affine::from(pro_w + G1Projective::from(owner_public.g1_part())),
        csp_public.g2_part(),
    );
    let accepted = b1 == b2 + b3;

    info!(
        identifier,
        challenged = indices.len(),
        accepted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "proof verification finished"
    );
    Ok(accepted)
}
