//! One-way digest for passcodes.
//!
//! Passcodes are stored and compared only as lowercase hex SHA-256 digests.
//! Comparison runs in constant time over the digest bytes.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a rendered digest in hex characters (256 bits).
pub const DIGEST_HEX_LEN: usize = 64;

/// Hash a secret into a lowercase hex SHA-256 digest.
#[must_use]
pub fn hash_secret(secret: &[u8]) -> String {
    format!("{:x}", Sha256::digest(secret))
}

/// Compare two digests without short-circuiting on the first differing byte.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hash_secret(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash_secret(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fixed_width_lowercase() {
        for input in [&b"123456"[..], b"a much longer passcode with spaces", b"\x00\xff"] {
            let digest = hash_secret(input);
            assert_eq!(digest.len(), DIGEST_HEX_LEN);
            assert!(digest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_deterministic_and_distinct() {
        assert_eq!(hash_secret(b"mypasscode"), hash_secret(b"mypasscode"));
        assert_ne!(hash_secret(b"mypasscode"), hash_secret(b"mypasscodf"));
    }

    #[test]
    fn test_digests_match() {
        let digest = hash_secret(b"mypasscode");
        assert!(digests_match(&digest, &hash_secret(b"mypasscode")));
        assert!(!digests_match(&digest, &hash_secret(b"other")));
        assert!(!digests_match(&digest, &digest[..10]));
    }
}
