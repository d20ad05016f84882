//! Detached signature container.

use crate::error::{FalconError, Result};
use crate::params::{ParameterSet, NONCE_LEN, SIGNATURE_OVERHEAD};

/// An encoded signature: header byte, nonce, compressed `s2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    params: ParameterSet,
    bytes: Vec<u8>,
}

impl Signature {
    pub(crate) fn from_encoded(params: ParameterSet, bytes: Vec<u8>) -> Self {
        Self { params, bytes }
    }

    /// Wrap signature bytes after checking the header and length bounds.
    ///
    /// This does not decode the compressed payload; [`crate::Verifier`]
    /// does that.
    pub fn from_bytes(params: ParameterSet, bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= SIGNATURE_OVERHEAD || bytes.len() > params.max_signature_len() {
            return Err(FalconError::MalformedSignature(format!(
                "length {} outside {}..={}",
                bytes.len(),
                SIGNATURE_OVERHEAD + 1,
                params.max_signature_len()
            )));
        }
        if bytes[0] != params.signature_header() {
            return Err(FalconError::MalformedSignature(format!(
                "unexpected header 0x{:02x} for {}",
                bytes[0],
                params.name()
            )));
        }
        Ok(Self {
            params,
            bytes: bytes.to_vec(),
        })
    }

    pub fn params(&self) -> ParameterSet {
        self.params
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn nonce(&self) -> &[u8] {
        &self.bytes[1..1 + NONCE_LEN]
    }

    /// Compressed `s2`.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[SIGNATURE_OVERHEAD..]
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_checks_layout() {
        let params = ParameterSet::Falcon512;
        let mut bytes = vec![0u8; 600];
        bytes[0] = 0x39;
        bytes[1] = 0xAA;
        let sig = Signature::from_bytes(params, &bytes).unwrap();
        assert_eq!(sig.len(), 600);
        assert_eq!(sig.nonce().len(), NONCE_LEN);
        assert_eq!(sig.nonce()[0], 0xAA);
        assert_eq!(sig.payload().len(), 600 - SIGNATURE_OVERHEAD);

        bytes[0] = 0x3A;
        assert!(matches!(
            Signature::from_bytes(params, &bytes),
            Err(FalconError::MalformedSignature(_))
        ));
        assert!(Signature::from_bytes(params, &[0x39; 41]).is_err());
        assert!(Signature::from_bytes(params, &[0x39; 667]).is_err());
    }
}
