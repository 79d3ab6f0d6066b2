//! Fingerprinting - SHA-256 for Formula Sources
//!
//! Provides deterministic, whitespace-insensitive identifiers for cached figures.

use sha2::{Sha256, Digest};
use std::fmt;

/// Number of leading hex digits of the digest kept in a fingerprint.
/// Eight hex digits always fit the ten decimal digits of the rendered form.
const FINGERPRINT_HEX_DIGITS: usize = 8;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Formula text with indentation and blank lines removed.
///
/// Every line is trimmed, empty lines are dropped and each remaining line
/// ends with exactly one `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Normalized(String);

impl Normalized {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw formula source as authored inside a page
pub fn normalize(raw: &str) -> Normalized {
    let mut out = String::with_capacity(raw.len());
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    Normalized(out)
}

/// Fixed-width numeric digest of normalized formula text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u32);

impl Fingerprint {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}", self.0)
    }
}

/// Compute the fingerprint of already-normalized formula text.
///
/// The preamble and font never take part: the same body renders to the
/// same file name whatever options are in effect.
pub fn fingerprint(normalized: &Normalized) -> Fingerprint {
    let digest = sha256_hex(normalized.as_str().as_bytes());
    let prefix = &digest[..FINGERPRINT_HEX_DIGITS];
    // Always valid: the prefix is lowercase hex produced above.
    let value = u32::from_str_radix(prefix, 16).unwrap_or_default();
    Fingerprint(value)
}

/// Normalize and fingerprint in one step
pub fn fingerprint_source(raw: &str) -> (Normalized, Fingerprint) {
    let normalized = normalize(raw);
    let fp = fingerprint(&normalized);
    (normalized, fp)
}

// We need hex encoding
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_drops_blank_lines() {
        let n = normalize("  \n    a + b \n\n\t  = c\t\n   ");
        assert_eq!(n.as_str(), "a + b\n= c\n");
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize(" \n\t\n").is_empty());
    }

    #[test]
    fn test_hash_deterministic() {
        let data = b"test data";
        let h1 = sha256_hex(data);
        let h2 = sha256_hex(data);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_fingerprint_is_ten_digits() {
        let (_, fp) = fingerprint_source("E = mc^2");
        assert_eq!(fp.to_string().len(), 10);
        assert!(fp.to_string().chars().all(|c| c.is_ascii_digit()));

        assert_eq!(Fingerprint::new(42).to_string(), "0000000042");
        assert_eq!(Fingerprint::new(u32::MAX).to_string(), "4294967295");
    }

    #[test]
    fn test_fingerprint_matches_digest_prefix() {
        // sha256("") = e3b0c442...
        let fp = fingerprint(&normalize(""));
        assert_eq!(fp.value(), 0xe3b0c442);
        assert_eq!(fp.to_string(), "3820012610");
    }

    #[test]
    fn test_fingerprint_ignores_layout() {
        let (_, a) = fingerprint_source("\\int_0^1 x\\,dx\n= \\frac{1}{2}");
        let (_, b) = fingerprint_source("\n    \\int_0^1 x\\,dx\n\n    = \\frac{1}{2}   \n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_sees_token_changes() {
        let (_, a) = fingerprint_source("E = mc^2");
        let (_, b) = fingerprint_source("E = mc^3");
        assert_ne!(a, b);
    }
}
