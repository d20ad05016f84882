//! Key pair generation.

use std::sync::Arc;

use crate::error::{FalconError, Result};
use crate::keys::{KeyPair, PrivateKey};
use crate::ntru;
use crate::params::ParameterSet;
use crate::random::{RandomSource, ShakePrng};

/// Default number of candidate bases tried before giving up.
pub const DEFAULT_KEYGEN_ATTEMPTS: u32 = 1000;

/// Generates Falcon key pairs.
#[derive(Clone)]
pub struct KeyGenerator {
    params: ParameterSet,
    random: Arc<dyn RandomSource>,
    max_attempts: u32,
}

impl KeyGenerator {
    pub fn new(params: ParameterSet, random: Arc<dyn RandomSource>) -> Self {
        Self {
            params,
            random,
            max_attempts: DEFAULT_KEYGEN_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Generate a fresh key pair.
    ///
    /// # Errors
    /// - `EntropyUnavailable` if the random source fails
    /// - `KeygenRetryExhausted` if no usable basis was found
    ///
    /// # Performance
    /// Dominated by the big-integer NTRU solver; a few hundred milliseconds
    /// for Falcon-512 in an optimized build.
    pub fn generate(&self) -> Result<KeyPair> {
        generate_with(self.params, self.random.as_ref(), self.max_attempts)
    }
}

pub(crate) fn generate_with(
    params: ParameterSet,
    random: &dyn RandomSource,
    max_attempts: u32,
) -> Result<KeyPair> {
    let mut prng = ShakePrng::from_source(random)?;

    for attempt in 1..=max_attempts {
        let basis = match ntru::try_generate(params, &mut prng) {
            Ok(basis) => basis,
            Err(reason) => {
                tracing::debug!(attempt, ?reason, "Rejected candidate basis");
                continue;
            }
        };

        let private = PrivateKey::from_basis(params, &basis);
        let public = private.public_key()?;

        tracing::info!(
            params = params.name(),
            attempt,
            pk_len = params.public_key_len(),
            sk_len = params.private_key_len(),
            fingerprint = %public.fingerprint(),
            "Generated Falcon keypair"
        );
        return Ok(KeyPair::new(public, private));
    }

    tracing::warn!(
        attempts = max_attempts,
        params = params.name(),
        "Key generation did not converge"
    );
    Err(FalconError::KeygenRetryExhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    #[test]
    fn test_generate_falcon512() {
        let random = Arc::new(SeededRandom::from_u64(1));
        let keys = KeyGenerator::new(ParameterSet::Falcon512, random)
            .generate()
            .unwrap();
        assert_eq!(keys.params(), ParameterSet::Falcon512);
        assert_eq!(keys.public_key().to_bytes().len(), 897);
        assert_eq!(keys.private_key().to_bytes().len(), 1281);
        assert_eq!(&keys.private_key().public_key().unwrap(), keys.public_key());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = KeyGenerator::new(ParameterSet::Falcon512, Arc::new(SeededRandom::from_u64(5)))
            .generate()
            .unwrap();
        let b = KeyGenerator::new(ParameterSet::Falcon512, Arc::new(SeededRandom::from_u64(5)))
            .generate()
            .unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.private_key().to_bytes(), b.private_key().to_bytes());
    }

    #[test]
    fn test_generation_gives_up_after_max_attempts() {
        // most single candidates fail the norm or invertibility checks
        let mut exhausted = 0;
        for seed in 0..20 {
            let random = Arc::new(SeededRandom::from_u64(seed));
            let result = KeyGenerator::new(ParameterSet::Falcon512, random)
                .with_max_attempts(1)
                .generate();
            match result {
                Ok(keys) => assert_eq!(keys.params(), ParameterSet::Falcon512),
                Err(FalconError::KeygenRetryExhausted { attempts }) => {
                    assert_eq!(attempts, 1);
                    exhausted += 1;
                }
                Err(e) => panic!("unexpected error for seed {seed}: {e}"),
            }
        }
        assert!(exhausted > 0, "no seed exhausted a single-attempt budget");
    }

    #[test]
    fn test_entropy_failure_is_propagated() {
        struct Broken;
        impl RandomSource for Broken {
            fn fill_bytes(&self, _dest: &mut [u8]) -> Result<()> {
                Err(FalconError::EntropyUnavailable("device unplugged".to_string()))
            }
        }

        let err = KeyGenerator::new(ParameterSet::Falcon512, Arc::new(Broken))
            .generate()
            .unwrap_err();
        assert!(matches!(err, FalconError::EntropyUnavailable(_)));
    }
}
