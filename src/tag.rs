use std::io::{Read, Write};
use std::time::Instant;

use bls12_381::{G1Affine, G1Projective, Scalar};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::block::BlockReader;
use crate::codec::Element;
use crate::context::AlgebraicContext;
use crate::error::Result;
use crate::keys::{FullPrivateKey, PublicKey};

// Blocks buffered and tagged in parallel per round trip to the reader.
const TAG_BATCH: usize = 256;

// Computes sigma_i = D^{h_i} * (W_i * Pe)^beta for one file.
pub struct TagGenerator<'a> {
    ctx: &'a AlgebraicContext,
    identifier: &'a str,
    d: G1Projective,
    owner: G1Projective,
    beta: Scalar,
}

impl<'a> TagGenerator<'a> {
    pub fn new(
        ctx: &'a AlgebraicContext,
        identifier: &'a str,
        csp_key: &FullPrivateKey,
        owner: &PublicKey,
    ) -> Self {
        Self {
            ctx,
            identifier,
            d: G1Projective::from(csp_key.partial()),
            owner: G1Projective::from(owner.g1_part()),
            beta: *csp_key.beta(),
        }
    }

    pub fn tag(&self, index: u64, block: &[u8]) -> G1Affine {
        let w = self.ctx.hash_anchor(self.identifier, index);
        let h = self.ctx.hash_block(block);
        G1Affine::from(self.d * h + (w + self.owner) * self.beta)
    }

    /// Tags every block of `reader` and writes the tags to `sink` in block
    /// order. Returns the number of blocks, which always equals
    /// `ctx.block_count(size)` for a stream of `size` bytes.
    pub fn generate<R: Read, W: Write>(&self, reader: R, sink: &mut W) -> Result<u64> {
        let started = Instant::now();
        let mut blocks = BlockReader::new(reader, self.ctx.block_size());
        let mut batch: Vec<(u64, Vec<u8>)> = Vec::with_capacity(TAG_BATCH);
        let mut total = 0u64;
        let mut exhausted = false;

        while !exhausted {
            batch.clear();
            while batch.len() < TAG_BATCH {
                let mut buf = Vec::with_capacity(self.ctx.block_size());
                match blocks.next_block(&mut buf)? {
                    Some(index) => batch.push((index, buf)),
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }

            let tags: Vec<G1Affine> = batch
                .par_iter()
                .map(|(index, block)| self.tag(*index, block))
                .collect();

            let mut encoded = Vec::with_capacity(tags.len() * G1Affine::LEN);
            for tag in &tags {
                tag.encode_into(&mut encoded);
            }
            sink.write_all(&encoded)?;
            total += tags.len() as u64;
            debug!(blocks = total, "tagged batch");
        }
        sink.flush()?;

        info!(
            identifier = self.identifier,
            blocks = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tag generation finished"
        );
        Ok(total)
    }
}
