/// SHA-256 content fingerprinting.
///
/// A fingerprint is the lowercase hex digest of a source's content bytes.
/// The hex string itself — not the raw digest — is what gets embedded in
/// the on-chain note, so all comparisons happen on the 64-character string.
///
/// Hashing is byte-exact: no normalization, no salt. Trailing whitespace
/// or a different encoding of the same text produces a different
/// fingerprint, which is the point.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 64-character lowercase hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes of the hex string, as embedded in transaction notes.
    pub fn as_note_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint arbitrary content.
///
/// Pure and infallible; byte-identical input always yields the identical
/// hex string, including the empty string.
pub fn fingerprint(content: &str) -> Fingerprint {
    Fingerprint(hex::encode(Sha256::digest(content.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_deterministic() {
        let content = "Studies have shown that AI offers the promise of greater efficiency.";
        assert_eq!(fingerprint(content), fingerprint(content));
    }

    #[test]
    fn test_empty_string_digest() {
        assert_eq!(fingerprint("").as_str(), EMPTY_SHA256);
    }

    #[test]
    fn test_lowercase_hex_64_chars() {
        let fp = fingerprint("some news content");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_near_duplicates_differ() {
        assert_ne!(fingerprint("breaking news"), fingerprint("breaking news "));
        assert_ne!(fingerprint("breaking news"), fingerprint("Breaking news"));
        assert_ne!(fingerprint("breaking news"), fingerprint("breaking news\n"));
    }

    #[test]
    fn test_note_bytes_are_hex_string() {
        let fp = fingerprint("");
        assert_eq!(fp.as_note_bytes(), EMPTY_SHA256.as_bytes());
    }
}
