//! Byte-oriented entry points.
//!
//! These functions speak only in encoded keys and signatures, for callers
//! that store or transmit keys and never need the typed API.

use zeroize::Zeroizing;

use crate::error::Result;
use crate::ffsampling::ExpandedKey;
use crate::keygen::{self, DEFAULT_KEYGEN_ATTEMPTS};
use crate::keys::{PrivateKey, PublicKey};
use crate::params::ParameterSet;
use crate::random::RandomSource;
use crate::sign::{self, DEFAULT_SIGN_ATTEMPTS};
use crate::verify::Verifier;

/// Generate a key pair and return `(public_key, private_key)` encodings.
///
/// # Example
///
/// ```rust,no_run
/// use falcon_signer::{api, OsRandom, ParameterSet};
///
/// let (pk, sk) = api::generate_keypair(ParameterSet::Falcon512, &OsRandom)?;
/// assert_eq!(pk.len(), 897);
/// assert_eq!(sk.len(), 1281);
/// # Ok::<(), falcon_signer::FalconError>(())
/// ```
pub fn generate_keypair(
    params: ParameterSet,
    random: &dyn RandomSource,
) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
    let keys = keygen::generate_with(params, random, DEFAULT_KEYGEN_ATTEMPTS)?;
    Ok((keys.public_key().to_bytes(), keys.private_key().to_bytes()))
}

/// Sign `message` with an encoded private key, writing the signature into
/// `signature_out` and returning its length.
///
/// `signature_out` must hold at least the maximum signature size of the
/// key's parameter set (666 bytes for Falcon-512, 1280 for Falcon-1024).
pub fn sign(
    private_key: &[u8],
    message: &[u8],
    signature_out: &mut [u8],
    random: &dyn RandomSource,
) -> Result<usize> {
    let key = PrivateKey::from_bytes(private_key)?;
    sign::check_capacity(key.params().max_signature_len(), signature_out.len())?;
    let expanded = ExpandedKey::new(&key)?;
    sign::sign_with(random, DEFAULT_SIGN_ATTEMPTS, &expanded, message, signature_out)
}

/// Verify a signature against an encoded public key.
///
/// Returns `false` for an invalid signature and for any malformed input,
/// including a malformed public key.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    match PublicKey::from_bytes(public_key) {
        Ok(key) => Verifier::verify(&key, message, signature),
        Err(e) => {
            tracing::debug!(error = %e, "Rejecting signature: unusable public key");
            false
        }
    }
}
