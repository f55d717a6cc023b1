//! Identity-based provable data possession over BLS12-381.
//!
//! A data owner outsources a file to a storage provider and later checks,
//! without downloading it, that the provider still holds every block. Keys are
//! derived from identity strings by a key generation center, so no
//! certificates are involved, and per-block tags aggregate homomorphically so
//! one pairing equation covers any number of challenged blocks.
//!
//! The phases, in order:
//!
//! 1. [`setup`]: public parameters `(g, g0 = g^alpha)` and master secret `alpha`.
//! 2. [`partial_key_gen`]: `D = H1(ID)^alpha` for one identity.
//! 3. [`full_key_gen`]: authenticates `D` and completes the key pair with `beta`.
//! 4. [`TagGenerator`]: one tag per 1000-byte block of the file.
//! 5. [`Challenge::generate`]: fresh seed plus the fraction of blocks to sample.
//! 6. [`generate_proof`]: the provider's constant-size answer `(mu, sigma)`.
//! 7. [`verify_proof`]: one pairing equation, `Ok(true)` iff possession holds.

pub mod block;
pub mod challenge;
pub mod codec;
pub mod coefficient;
pub mod config;
pub mod context;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod proof;
pub mod sampler;
pub mod store;
pub mod tag;

pub use challenge::{Challenge, MAX_CHALLENGED_BLOCKS, SEED_SIZE, Seed};
pub use coefficient::derive_coefficient;
pub use config::Config;
pub use context::AlgebraicContext;
pub use error::{Error, Result};
pub use keys::{
    FullKeyPair, FullPrivateKey, MasterSecretKey, PartialKey, PublicKey, PublicParameters,
    full_key_gen, partial_key_gen, setup,
};
pub use metadata::FileMetadata;
pub use proof::{Proof, generate_proof, verify_proof};
pub use sampler::sample_indices;
pub use tag::TagGenerator;
