/// Unified interface for signature schemes
use crate::error::Result;

/// Signature scheme handle
pub trait SignatureScheme {
    /// Generate keypair
    fn generate_keypair(&mut self) -> Result<()>;

    /// Sign message
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Verify signature
    ///
    /// `Ok(false)` covers both a wrong signature and a malformed one.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool>;

    /// Get encoded public key
    fn public_key(&self) -> &[u8];

    /// Algorithm name
    fn algorithm_name(&self) -> &str;
}
