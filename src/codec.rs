//! Fixed-length binary encoding of field and group elements.
//!
//! Files are positional: a sequence of encodings with no length prefixes, so a
//! reader has to know which element type comes next.

use std::io::{self, Read};

use bls12_381::{G1Affine, G2Affine, Scalar};

use crate::error::{Error, Result};

pub trait Element: Sized {
    const LEN: usize;
    const NAME: &'static str;

    fn encode_into(&self, out: &mut Vec<u8>);

    // None for non-canonical or off-curve encodings.
    fn decode(bytes: &[u8]) -> Option<Self>;

    fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        self.encode_into(&mut out);
        out
    }
}

impl Element for Scalar {
    const LEN: usize = 32;
    const NAME: &'static str = "Zr";

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 32] = bytes.try_into().ok()?;
        Option::from(Scalar::from_bytes(bytes))
    }
}

impl Element for G1Affine {
    const LEN: usize = 48;
    const NAME: &'static str = "G1";

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_compressed());
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 48] = bytes.try_into().ok()?;
        Option::from(G1Affine::from_compressed(bytes))
    }
}

impl Element for G2Affine {
    const LEN: usize = 96;
    const NAME: &'static str = "G2";

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_compressed());
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 96] = bytes.try_into().ok()?;
        Option::from(G2Affine::from_compressed(bytes))
    }
}

/// Cursor over a byte buffer holding concatenated element encodings.
pub struct ElementReader<'a> {
    bytes: &'a [u8],
    what: &'a str,
}

impl<'a> ElementReader<'a> {
    pub fn new(bytes: &'a [u8], what: &'a str) -> Self {
        Self { bytes, what }
    }

    pub fn next<E: Element>(&mut self) -> Result<E> {
        if self.bytes.len() < E::LEN {
            return Err(Error::malformed(format!(
                "{} truncated: expected {} more bytes for a {} element, found {}",
                self.what,
                E::LEN,
                E::NAME,
                self.bytes.len()
            )));
        }
        let (head, rest) = self.bytes.split_at(E::LEN);
        let element = E::decode(head).ok_or_else(|| {
            Error::malformed(format!("{} holds an invalid {} encoding", self.what, E::NAME))
        })?;
        self.bytes = rest;
        Ok(element)
    }

    // Rejects trailing garbage after the last expected element.
    pub fn finish(self) -> Result<()> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(Error::malformed(format!(
                "{} has {} unexpected trailing bytes",
                self.what,
                self.bytes.len()
            )))
        }
    }
}

/// Reads the next element from a stream of concatenated encodings.
/// Returns `Ok(None)` on a clean end of stream.
pub fn read_element<E: Element, R: Read>(reader: &mut R, what: &str) -> Result<Option<E>> {
    let mut buf = vec![0u8; E::LEN];
    if !read_encoding::<E, R>(reader, &mut buf, what)? {
        return Ok(None);
    }
    E::decode(&buf)
        .map(Some)
        .ok_or_else(|| Error::malformed(format!("{what} holds an invalid {} encoding", E::NAME)))
}

// Fills `buf` (E::LEN bytes) with the next raw encoding without decoding it.
// Returns false on a clean end of stream.
pub fn read_encoding<E: Element, R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<bool> {
    debug_assert_eq!(buf.len(), E::LEN);
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    match filled {
        0 => Ok(false),
        n if n < buf.len() => Err(Error::malformed(format!(
            "{what} ends inside a {} element ({n} of {} bytes)",
            E::NAME,
            E::LEN
        ))),
        _ => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff::Field;
    use group::{Curve, Group};
    use rand::rngs::OsRng;

    fn round_trip<E: Element + PartialEq + std::fmt::Debug>(value: E) {
        let bytes = value.to_vec();
        assert_eq!(bytes.len(), E::LEN);
        let decoded = E::decode(&bytes).unwrap();
        assert_eq!(decoded.to_vec(), bytes);
        assert_eq!(decoded, value);
    }

    #[test]
    fn elements_round_trip() {
        round_trip(Scalar::random(&mut OsRng));
        round_trip(bls12_381::G1Projective::random(&mut OsRng).to_affine());
        round_trip(bls12_381::G2Projective::random(&mut OsRng).to_affine());
        round_trip(G1Affine::identity());
    }

    #[test]
    fn reader_detects_truncation_and_trailing_bytes() {
        let s = Scalar::random(&mut OsRng);
        let mut bytes = s.to_vec();

        let mut reader = ElementReader::new(&bytes[..31], "key");
        assert!(matches!(reader.next::<Scalar>(), Err(Error::Malformed(_))));

        bytes.push(0);
        let mut reader = ElementReader::new(&bytes, "key");
        assert_eq!(reader.next::<Scalar>().unwrap(), s);
        assert!(matches!(reader.finish(), Err(Error::Malformed(_))));
    }

    #[test]
    fn non_canonical_scalar_rejected() {
        assert!(Scalar::decode(&[0xff; 32]).is_none());
    }

    #[test]
    fn stream_reader() {
        let g = G1Affine::generator();
        let mut bytes = g.to_vec();
        bytes.extend_from_slice(&g.to_vec()[..10]);
        let mut cursor = io::Cursor::new(bytes);
        assert_eq!(read_element::<G1Affine, _>(&mut cursor, "tags").unwrap(), Some(g));
        assert!(read_element::<G1Affine, _>(&mut cursor, "tags").is_err());

        let mut empty = io::Cursor::new(Vec::new());
        assert_eq!(read_element::<G1Affine, _>(&mut empty, "tags").unwrap(), None);
    }
}
