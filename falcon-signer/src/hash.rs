//! Message hashing and key fingerprints.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

use crate::params::Q;

/// Largest multiple of `q` below 2^16; words at or above it are discarded.
const HASH_REJECTION_BOUND: u32 = 5 * Q;

/// Hash `nonce || message` to a polynomial with `n` coefficients in `[0, q)`.
pub(crate) fn hash_to_point(nonce: &[u8], message: &[u8], n: usize) -> Vec<u32> {
    let mut hasher = Shake256::default();
    hasher.update(nonce);
    hasher.update(message);
    let mut reader = hasher.finalize_xof();

    let mut out = Vec::with_capacity(n);
    let mut word = [0u8; 2];
    while out.len() < n {
        reader.read(&mut word);
        let w = u16::from_be_bytes(word) as u32;
        if w < HASH_REJECTION_BOUND {
            out.push(w % Q);
        }
    }
    out
}

/// Short hex identifier for an encoded public key, safe to log.
pub fn fingerprint(encoded_key: &[u8]) -> String {
    let mut hasher = Shake256::default();
    hasher.update(encoded_key);
    let mut digest = [0u8; 8];
    hasher.finalize_xof().read(&mut digest);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_to_point_range_and_determinism() {
        let nonce = [7u8; 40];
        let c = hash_to_point(&nonce, b"message", 512);
        assert_eq!(c.len(), 512);
        assert!(c.iter().all(|&x| x < Q));
        assert_eq!(c, hash_to_point(&nonce, b"message", 512));
        assert_ne!(c, hash_to_point(&nonce, b"messagf", 512));
        assert_ne!(c, hash_to_point(&[8u8; 40], b"message", 512));
    }

    #[test]
    fn test_nonce_and_message_are_concatenated() {
        assert_eq!(
            hash_to_point(b"ab", b"cd", 64),
            hash_to_point(b"abc", b"d", 64)
        );
    }

    #[test]
    fn test_fingerprint() {
        let fp = fingerprint(b"public key bytes");
        assert_eq!(fp.len(), 16);
        assert_eq!(fp, fingerprint(b"public key bytes"));
        assert_ne!(fp, fingerprint(b"other key bytes"));
    }
}
