//! Identity-based key material.
//!
//! The key generation center runs `setup` once and issues a partial key
//! `D = H1(ID)^alpha` per identity. The identity owner authenticates `D`
//! against the public parameters and completes it with its own secret `beta`:
//!
//! ```text
//!     e(D, g) == e(H1(ID), g0)      // D really came from alpha
//!     P = g^beta                    // published as (g1^beta, g2^beta)
//! ```

use std::fmt;

use bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar, pairing};
use ff::Field;
use group::Group;
use rand::{CryptoRng, RngCore};
use tracing::{debug, warn};

use crate::codec::{Element, ElementReader};
use crate::context::AlgebraicContext;
use crate::error::{Error, Result};

// alpha. Never leaves the key generation center.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSecretKey(Scalar);

// (g, g0 = g^alpha) with g split into its G1 and G2 halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicParameters {
    g1: G1Affine,
    g2: G2Affine,
    g0: G2Affine,
}

// D = H1(ID)^alpha
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialKey(G1Affine);

// (beta, D)
#[derive(Clone, PartialEq, Eq)]
pub struct FullPrivateKey {
    beta: Scalar,
    d: G1Affine,
}

// P = g^beta, kept in both groups: the G1 half takes part in tag and proof
// arithmetic, the G2 half is paired against during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    p1: G1Affine,
    p2: G2Affine,
}

#[derive(Debug, Clone)]
pub struct FullKeyPair {
    pub secret: FullPrivateKey,
    pub public: PublicKey,
}

impl fmt::Debug for MasterSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecretKey(..)")
    }
}

impl fmt::Debug for FullPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullPrivateKey")
            .field("beta", &"..")
            .field("d", &self.d)
            .finish()
    }
}

/// Setup: samples the generator pair and the master secret `alpha`.
pub fn setup<R: RngCore + CryptoRng>(rng: &mut R) -> (MasterSecretKey, PublicParameters) {
    let g1 = G1Projective::random(&mut *rng);
    let g2 = G2Projective::random(&mut *rng);
    let alpha = Scalar::random(&mut *rng);
    let g0 = g2 * alpha;
    debug!("sampled public parameters and master secret");
    (
        MasterSecretKey(alpha),
        PublicParameters {
            g1: G1Affine::from(g1),
            g2: G2Affine::from(g2),
            g0: G2Affine::from(g0),
        },
    )
}

/// PartialKeyGen: `D = H1(ID)^alpha`.
pub fn partial_key_gen(ctx: &AlgebraicContext, msk: &MasterSecretKey, identity: &str) -> PartialKey {
    let q = ctx.hash_identity(identity);
    PartialKey(G1Affine::from(q * msk.0))
}

/// FullKeyGen: authenticates `D` against the identity, then draws `beta`.
///
/// A partial key that fails the pairing check yields
/// [`Error::Authentication`] and no key material at all.
pub fn full_key_gen<R: RngCore + CryptoRng>(
    ctx: &AlgebraicContext,
    params: &PublicParameters,
    partial: &PartialKey,
    identity: &str,
    rng: &mut R,
) -> Result<FullKeyPair> {
    if !partial.authenticates(ctx, params, identity) {
        warn!(identity, "partial private key does not match identity");
        return Err(Error::Authentication {
            identity: identity.to_owned(),
        });
    }

    let beta = Scalar::random(&mut *rng);
    let public = PublicKey {
        p1: G1Affine::from(G1Projective::from(params.g1) * beta),
        p2: G2Affine::from(G2Projective::from(params.g2) * beta),
    };
    debug!(identity, "issued full key pair");
    Ok(FullKeyPair {
        secret: FullPrivateKey { beta, d: partial.0 },
        public,
    })
}

// Key files are named after the identity up to its first '@'.
pub fn key_file_stem(identity: &str) -> &str {
    identity.split('@').next().unwrap_or(identity)
}

impl MasterSecretKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "master secret key");
        let alpha = reader.next()?;
        reader.finish()?;
        Ok(Self(alpha))
    }
}

impl PublicParameters {
    pub fn g1(&self) -> &G1Affine {
        &self.g1
    }

    pub fn g2(&self) -> &G2Affine {
        &self.g2
    }

    pub fn g0(&self) -> &G2Affine {
        &self.g0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(G1Affine::LEN + 2 * G2Affine::LEN);
        self.g1.encode_into(&mut out);
        self.g2.encode_into(&mut out);
        self.g0.encode_into(&mut out);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "public parameters");
        let params = Self {
            g1: reader.next()?,
            g2: reader.next()?,
            g0: reader.next()?,
        };
        reader.finish()?;
        Ok(params)
    }
}

impl PartialKey {
    pub fn point(&self) -> &G1Affine {
        &self.0
    }

    // e(D, g) == e(H1(ID), g0)
    pub fn authenticates(&self, ctx: &AlgebraicContext, params: &PublicParameters, identity: &str) -> bool {
        let q = G1Affine::from(ctx.hash_identity(identity));
        pairing(&self.0, &params.g2) == pairing(&q, &params.g0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "partial private key");
        let d = reader.next()?;
        reader.finish()?;
        Ok(Self(d))
    }
}

impl FullPrivateKey {
    pub fn beta(&self) -> &Scalar {
        &self.beta
    }

    pub fn partial(&self) -> &G1Affine {
        &self.d
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Scalar::LEN + G1Affine::LEN);
        self.beta.encode_into(&mut out);
        self.d.encode_into(&mut out);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "full private key");
        let key = Self {
            beta: reader.next()?,
            d: reader.next()?,
        };
        reader.finish()?;
        Ok(key)
    }
}

impl PublicKey {
    pub fn g1_part(&self) -> &G1Affine {
        &self.p1
    }

    pub fn g2_part(&self) -> &G2Affine {
        &self.p2
    }

    // Both halves carry the same exponent: e(P1, g2) == e(g1, P2).
    pub fn is_consistent(&self, params: &PublicParameters) -> bool {
        pairing(&self.p1, &params.g2) == pairing(&params.g1, &self.p2)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(G1Affine::LEN + G2Affine::LEN);
        self.p1.encode_into(&mut out);
        self.p2.encode_into(&mut out);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ElementReader::new(bytes, "public key");
        let key = Self {
            p1: reader.next()?,
            p2: reader.next()?,
        };
        reader.finish()?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn stems() {
        assert_eq!(key_file_stem("alice@example.com"), "alice");
        assert_eq!(key_file_stem("csp"), "csp");
        assert_eq!(key_file_stem("@host"), "");
    }

    #[test]
    fn key_files_round_trip() {
        let ctx = AlgebraicContext::default();
        let (msk, params) = setup(&mut OsRng);
        let partial = partial_key_gen(&ctx, &msk, "bob");
        let pair = full_key_gen(&ctx, &params, &partial, "bob", &mut OsRng).unwrap();

        assert_eq!(MasterSecretKey::from_bytes(&msk.to_bytes()).unwrap(), msk);
        assert_eq!(PublicParameters::from_bytes(&params.to_bytes()).unwrap(), params);
        assert_eq!(PartialKey::from_bytes(&partial.to_bytes()).unwrap(), partial);
        assert_eq!(FullPrivateKey::from_bytes(&pair.secret.to_bytes()).unwrap(), pair.secret);
        assert_eq!(PublicKey::from_bytes(&pair.public.to_bytes()).unwrap(), pair.public);
        assert_eq!(params.to_bytes().len(), 48 + 96 + 96);
        assert_eq!(pair.secret.to_bytes().len(), 32 + 48);
    }

    #[test]
    fn public_key_halves_agree() {
        let ctx = AlgebraicContext::default();
        let (msk, params) = setup(&mut OsRng);
        let partial = partial_key_gen(&ctx, &msk, "carol");
        let pair = full_key_gen(&ctx, &params, &partial, "carol", &mut OsRng).unwrap();
        assert!(pair.public.is_consistent(&params));

        let other = full_key_gen(&ctx, &params, &partial, "carol", &mut OsRng).unwrap();
        let mixed = PublicKey {
            p1: pair.public.p1,
            p2: other.public.p2,
        };
        assert!(!mixed.is_consistent(&params));
    }

    #[test]
    fn secrets_are_not_printed() {
        let (msk, _) = setup(&mut OsRng);
        assert_eq!(format!("{msk:?}"), "MasterSecretKey(..)");
    }
}
