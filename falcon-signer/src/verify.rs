//! Signature verification.

use std::fmt;

use crate::codec;
use crate::error::FalconError;
use crate::hash::hash_to_point;
use crate::keys::PublicKey;
use crate::math::modq;
use crate::signature::Signature;

/// Stateless verifier.
///
/// Verification only needs the public key, so it can run where no private
/// key is present and from any number of threads at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct Verifier;

impl Verifier {
    /// Check `signature` over `message`.
    ///
    /// Every malformed input (bad header, wrong length, non-canonical
    /// compression, out-of-range coefficients) is reported as `false`.
    pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        match check(public_key, message, signature) {
            Ok(()) => {
                tracing::debug!(msg_len = message.len(), "Signature verification: valid=true");
                true
            }
            Err(reason) => {
                tracing::debug!(msg_len = message.len(), %reason, "Signature verification: valid=false");
                false
            }
        }
    }
}

/// Why a signature was turned down.
#[derive(Debug)]
enum Rejection {
    Malformed(FalconError),
    NormTooLarge { norm: i64, bound: i64 },
}

impl From<FalconError> for Rejection {
    fn from(e: FalconError) -> Self {
        Rejection::Malformed(e)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed(e) => write!(f, "{e}"),
            Rejection::NormTooLarge { norm, bound } => {
                write!(f, "norm {norm} exceeds bound {bound}")
            }
        }
    }
}

fn check(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), Rejection> {
    let params = public_key.params();
    let signature = Signature::from_bytes(params, signature)?;
    let n = params.degree();

    let s2 = codec::decompress(signature.payload(), n).ok_or_else(|| {
        FalconError::MalformedSignature("non-canonical compressed payload".to_string())
    })?;
    let c = hash_to_point(signature.nonce(), message, n);

    let h: Vec<u32> = public_key.coefficients().iter().map(|&x| x as u32).collect();
    let s2_h = modq::mul_poly(&modq::from_signed(&s2), &h);

    // the norm is accumulated over every coefficient before the one comparison
    let mut norm: i64 = 0;
    for ((&ci, &ti), &si) in c.iter().zip(&s2_h).zip(&s2) {
        let s1 = modq::center(modq::sub(ci, ti)) as i64;
        norm += s1 * s1 + si as i64 * si as i64;
    }

    let bound = params.signature_bound();
    if norm > bound {
        return Err(Rejection::NormTooLarge { norm, bound });
    }
    Ok(())
}
