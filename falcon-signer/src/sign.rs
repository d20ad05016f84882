//! Signature generation.

use std::sync::Arc;

use crate::codec;
use crate::error::{FalconError, Result};
use crate::ffsampling::ExpandedKey;
use crate::hash::hash_to_point;
use crate::keys::PrivateKey;
use crate::params::{NONCE_LEN, SIGNATURE_OVERHEAD};
use crate::random::{RandomSource, ShakePrng};
use crate::signature::Signature;

/// Default number of sampling attempts per signature.
pub const DEFAULT_SIGN_ATTEMPTS: u32 = 64;

/// Produces signatures with randomness from a shared [`RandomSource`].
///
/// A `Signer` holds no key material and can be shared between threads;
/// concurrent calls only contend on the random source.
#[derive(Clone)]
pub struct Signer {
    random: Arc<dyn RandomSource>,
    max_attempts: u32,
}

impl Signer {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self {
            random,
            max_attempts: DEFAULT_SIGN_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sign `message` into `out`, returning the number of bytes written.
    ///
    /// `out` must be at least the maximum signature size of the key's
    /// parameter set; this is checked before any work is done.
    ///
    /// # Errors
    /// - `BufferTooSmall` if `out` is shorter than the maximum signature size
    /// - `InvalidKey` if the key fails the NTRU consistency check
    /// - `EntropyUnavailable` if the random source fails
    /// - `SigningRetryExhausted` if no acceptable signature was found
    pub fn sign_into(&self, key: &PrivateKey, message: &[u8], out: &mut [u8]) -> Result<usize> {
        check_capacity(key.params().max_signature_len(), out.len())?;
        let expanded = ExpandedKey::new(key)?;
        sign_with(self.random.as_ref(), self.max_attempts, &expanded, message, out)
    }

    /// Same as [`Signer::sign_into`] with a key that is already expanded.
    pub fn sign_expanded_into(
        &self,
        key: &ExpandedKey,
        message: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        check_capacity(key.params().max_signature_len(), out.len())?;
        sign_with(self.random.as_ref(), self.max_attempts, key, message, out)
    }

    /// Sign `message` and return the signature in its own buffer.
    pub fn sign(&self, key: &PrivateKey, message: &[u8]) -> Result<Signature> {
        let expanded = ExpandedKey::new(key)?;
        self.sign_expanded(&expanded, message)
    }

    pub fn sign_expanded(&self, key: &ExpandedKey, message: &[u8]) -> Result<Signature> {
        let mut buf = vec![0u8; key.params().max_signature_len()];
        let len = self.sign_expanded_into(key, message, &mut buf)?;
        buf.truncate(len);
        Ok(Signature::from_encoded(key.params(), buf))
    }
}

pub(crate) fn check_capacity(required: usize, actual: usize) -> Result<()> {
    if actual < required {
        return Err(FalconError::BufferTooSmall { required, actual });
    }
    Ok(())
}

/// Sign into `out`, which the caller has checked with [`check_capacity`].
pub(crate) fn sign_with(
    random: &dyn RandomSource,
    max_attempts: u32,
    key: &ExpandedKey,
    message: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    sign_bounded(
        random,
        max_attempts,
        key,
        message,
        out,
        key.params().signature_bound(),
    )
}

/// Signing loop accepting candidates whose squared norm is at most `bound`.
fn sign_bounded(
    random: &dyn RandomSource,
    max_attempts: u32,
    key: &ExpandedKey,
    message: &[u8],
    out: &mut [u8],
    bound: i64,
) -> Result<usize> {
    let params = key.params();
    let capacity = params.max_signature_len();

    let nonce = random.next_bytes(NONCE_LEN)?;
    let mut prng = ShakePrng::from_source(random)?;
    let c = hash_to_point(&nonce, message, params.degree());

    for attempt in 1..=max_attempts {
        let Some((s1, s2)) = key.sample_preimage(&c, &mut prng) else {
            tracing::debug!(attempt, "Sampler gave up, retrying");
            continue;
        };

        let norm: i64 = s1
            .iter()
            .chain(&s2)
            .map(|&x| x as i64 * x as i64)
            .sum();
        if norm > bound {
            tracing::debug!(attempt, "Candidate signature too long, retrying");
            continue;
        }

        let Some(payload) = codec::compress(&s2, capacity - SIGNATURE_OVERHEAD) else {
            tracing::debug!(attempt, "Candidate signature does not compress, retrying");
            continue;
        };

        let len = SIGNATURE_OVERHEAD + payload.len();
        out[0] = params.signature_header();
        out[1..SIGNATURE_OVERHEAD].copy_from_slice(&nonce);
        out[SIGNATURE_OVERHEAD..len].copy_from_slice(&payload);

        tracing::debug!(
            msg_len = message.len(),
            sig_len = len,
            attempt,
            "Signed message"
        );
        return Ok(len);
    }

    tracing::warn!(
        attempts = max_attempts,
        params = params.name(),
        "Signing did not converge"
    );
    Err(FalconError::SigningRetryExhausted {
        attempts: max_attempts,
    })
}
