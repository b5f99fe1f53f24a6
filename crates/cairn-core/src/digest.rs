//! State digests and a deterministic hasher for producing them.
//!
//! A digest summarises the complete mutable state of a simulation at a
//! turn boundary. Two runs that applied the same commands must produce
//! byte-identical digests; any difference is a divergence.
//!
//! [`DigestHasher`] is an FNV-1a accumulator that simulations may use to
//! build digests. It is not cryptographically secure; it only needs to be
//! fast and stable across platforms and releases.

use std::fmt;

use smallvec::SmallVec;

use crate::error::CodecError;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Which flavour of digest a simulation computes.
///
/// Quick digests cover a cheaper subset of state. The two modes are never
/// comparable with each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestMode {
    /// Digest over the entire mutable state.
    Full,
    /// Digest over a cheaper, partial view of state.
    Quick,
}

impl DigestMode {
    /// `true` for [`DigestMode::Quick`].
    pub fn is_quick(self) -> bool {
        matches!(self, Self::Quick)
    }
}

impl fmt::Display for DigestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Quick => write!(f, "quick"),
        }
    }
}

/// Raw digest bytes.
///
/// Rendered and parsed as lowercase hexadecimal, which is how digests
/// appear in replay logs.
///
/// # Examples
///
/// ```
/// use cairn_core::StateDigest;
///
/// let d = StateDigest::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
/// assert_eq!(d.to_hex(), "deadbeef");
/// assert_eq!(StateDigest::from_hex("DEADBEEF").unwrap(), d);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateDigest(SmallVec<[u8; 32]>);

impl StateDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(SmallVec::from_slice(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hexadecimal rendering.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for b in &self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }

    /// Parse a hexadecimal digest (either case).
    pub fn from_hex(hex: &str) -> Result<Self, CodecError> {
        if hex.len() % 2 != 0 {
            return Err(CodecError::InvalidHex {
                detail: format!("odd length {}", hex.len()),
            });
        }
        let mut bytes = SmallVec::with_capacity(hex.len() / 2);
        for (i, pair) in hex.as_bytes().chunks(2).enumerate() {
            let hi = hex_nibble(pair[0]);
            let lo = hex_nibble(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => bytes.push((hi << 4) | lo),
                _ => {
                    return Err(CodecError::InvalidHex {
                        detail: format!("non-hex character at offset {}", i * 2),
                    })
                }
            }
        }
        Ok(Self(bytes))
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({})", self.to_hex())
    }
}

/// Incremental FNV-1a hasher producing an 8-byte [`StateDigest`].
///
/// Integers are folded in little-endian byte order so the digest does not
/// depend on the host platform.
///
/// # Examples
///
/// ```
/// use cairn_core::DigestHasher;
///
/// let mut a = DigestHasher::new();
/// a.write_u32(7);
/// a.write_str("cavalry");
///
/// let mut b = DigestHasher::new();
/// b.write_u32(7);
/// b.write_str("cavalry");
///
/// assert_eq!(a.finish(), b.finish());
/// ```
#[derive(Clone, Debug)]
pub struct DigestHasher {
    state: u64,
}

impl DigestHasher {
    /// A hasher at the FNV-1a offset basis.
    pub fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    /// Fold in one byte.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.state = (self.state ^ byte as u64).wrapping_mul(FNV_PRIME);
    }

    /// Fold in a byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_u8(b);
        }
    }

    /// Fold in a u32 as 4 LE bytes.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Fold in a u64 as 8 LE bytes.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Fold in a length-prefixed string, so adjacent strings cannot alias.
    pub fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    /// The current 64-bit hash state.
    pub fn value(&self) -> u64 {
        self.state
    }

    /// Finish into a big-endian 8-byte digest.
    pub fn finish(&self) -> StateDigest {
        StateDigest::from_bytes(&self.state.to_be_bytes())
    }
}

impl Default for DigestHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_hasher_is_fnv_offset() {
        let h = DigestHasher::new();
        assert_eq!(h.value(), FNV_OFFSET);
        assert_eq!(h.finish().to_hex(), "cbf29ce484222325");
    }

    #[test]
    fn order_matters() {
        let mut a = DigestHasher::new();
        a.write_u32(1);
        a.write_u32(2);
        let mut b = DigestHasher::new();
        b.write_u32(2);
        b.write_u32(1);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn strings_do_not_alias() {
        let mut a = DigestHasher::new();
        a.write_str("ab");
        a.write_str("c");
        let mut b = DigestHasher::new();
        b.write_str("a");
        b.write_str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn odd_length_hex_rejected() {
        assert!(matches!(
            StateDigest::from_hex("abc"),
            Err(CodecError::InvalidHex { .. })
        ));
    }

    #[test]
    fn non_hex_rejected() {
        assert!(StateDigest::from_hex("zz").is_err());
    }

    #[test]
    fn empty_digest_is_empty_hex() {
        let d = StateDigest::from_hex("").unwrap();
        assert!(d.as_bytes().is_empty());
        assert_eq!(d.to_hex(), "");
    }

    proptest! {
        #[test]
        fn hex_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let d = StateDigest::from_bytes(&bytes);
            let parsed = StateDigest::from_hex(&d.to_hex()).unwrap();
            prop_assert_eq!(parsed.as_bytes(), bytes.as_slice());
        }
    }
}
