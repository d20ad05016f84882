//! High-level Falcon signer handle.
//!
//! # About Falcon
//!
//! Falcon is a lattice signature scheme over NTRU lattices, selected by
//! NIST for standardization. It has the smallest public key plus signature
//! size of the lattice schemes, at the cost of a floating-point signing
//! procedure.
//!
//! | Parameter set | Public key | Private key | Signature (max) | NIST level |
//! |---------------|------------|-------------|-----------------|------------|
//! | Falcon-512    | 897 bytes  | 1,281 bytes | 666 bytes       | 1          |
//! | Falcon-1024   | 1,793 bytes| 2,305 bytes | 1,280 bytes     | 5          |

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::config::{validate_config, FalconConfig};
use crate::error::{FalconError, Result};
use crate::ffsampling::ExpandedKey;
use crate::keygen::KeyGenerator;
use crate::keys::{PrivateKey, PublicKey};
use crate::params::{AlgorithmInfo, ParameterSet};
use crate::random::{OsRandom, RandomSource};
use crate::sign::Signer;
use crate::traits::SignatureScheme;
use crate::verify::Verifier;

/// Falcon signer
///
/// # Example
///
/// ```rust,no_run
/// use falcon_signer::{FalconSigner, SignatureScheme};
///
/// // Generate keypair
/// let mut signer = FalconSigner::default();
/// signer.generate_keypair().unwrap();
///
/// // Sign message
/// let message = b"Hello, world!";
/// let signature = signer.sign(message).unwrap();
///
/// // Verify signature
/// let is_valid = signer.verify(message, &signature).unwrap();
/// assert!(is_valid);
/// ```
#[derive(Clone)]
pub struct FalconSigner {
    config: FalconConfig,
    random: Arc<dyn RandomSource>,
    public_key: Option<PublicKey>,
    public_key_bytes: Vec<u8>,
    secret: Option<Arc<SecretState>>,
}

struct SecretState {
    key: PrivateKey,
    expanded: ExpandedKey,
}

impl FalconSigner {
    /// Create a signer without keys, drawing randomness from the OS.
    ///
    /// Call `generate_keypair()` or use `from_bytes()` to get keys.
    pub fn new(config: FalconConfig) -> Result<Self> {
        Self::with_random_source(config, Arc::new(OsRandom))
    }

    /// Create a signer without keys and with an explicit randomness source.
    pub fn with_random_source(config: FalconConfig, random: Arc<dyn RandomSource>) -> Result<Self> {
        validate_config(&config)?;
        Ok(Self {
            config,
            random,
            public_key: None,
            public_key_bytes: Vec::new(),
            secret: None,
        })
    }

    /// Restore a signer from encoded keys.
    ///
    /// # Errors
    /// - `MalformedKey` if either encoding is malformed
    /// - `InvalidKey` if the keys do not belong together or the private key
    ///   is inconsistent
    pub fn from_bytes(public_key: &[u8], secret_key: &[u8]) -> Result<Self> {
        let public = PublicKey::from_bytes(public_key)?;
        let private = PrivateKey::from_bytes(secret_key)?;
        if private.params() != public.params() {
            return Err(FalconError::InvalidKey(format!(
                "parameter set mismatch: public key is {}, private key is {}",
                public.params().name(),
                private.params().name()
            )));
        }

        let expanded = ExpandedKey::new(&private)?;
        if expanded.public_key() != &public {
            return Err(FalconError::InvalidKey(
                "public key does not match private key".to_string(),
            ));
        }

        let config = FalconConfig {
            parameter_set: public.params(),
            ..FalconConfig::default()
        };
        tracing::debug!(
            params = public.params().name(),
            fingerprint = %public.fingerprint(),
            "Restored FalconSigner from bytes"
        );
        Ok(Self {
            config,
            random: Arc::new(OsRandom),
            public_key_bytes: public_key.to_vec(),
            public_key: Some(public),
            secret: Some(Arc::new(SecretState {
                key: private,
                expanded,
            })),
        })
    }

    /// Create a verification-only signer from a public key.
    ///
    /// The result cannot sign; `sign()` returns `MissingKey`.
    ///
    /// # Errors
    /// - `MalformedKey` if the public key encoding is malformed
    pub fn from_public_key_only(public_key: &[u8]) -> Result<Self> {
        let public = PublicKey::from_bytes(public_key)?;

        tracing::debug!(
            pk_len = public_key.len(),
            fingerprint = %public.fingerprint(),
            "Created verification-only FalconSigner"
        );

        let config = FalconConfig {
            parameter_set: public.params(),
            ..FalconConfig::default()
        };
        Ok(Self {
            config,
            random: Arc::new(OsRandom),
            public_key_bytes: public_key.to_vec(),
            public_key: Some(public),
            secret: None,
        })
    }

    /// Replace the randomness source used for key generation and signing.
    pub fn set_random_source(&mut self, random: Arc<dyn RandomSource>) {
        self.random = random;
    }

    /// Encoded private key, for persistence.
    ///
    /// # Security Warning
    /// Store private keys securely; never log them or send them over the network.
    pub fn secret_key(&self) -> Option<Zeroizing<Vec<u8>>> {
        self.secret.as_ref().map(|s| s.key.to_bytes())
    }

    pub fn params(&self) -> ParameterSet {
        self.config.parameter_set
    }

    pub fn config(&self) -> &FalconConfig {
        &self.config
    }

    /// Return algorithm information
    pub fn algorithm_info(&self) -> AlgorithmInfo {
        self.config.parameter_set.info()
    }
}

impl Default for FalconSigner {
    fn default() -> Self {
        Self {
            config: FalconConfig::default(),
            random: Arc::new(OsRandom),
            public_key: None,
            public_key_bytes: Vec::new(),
            secret: None,
        }
    }
}

impl SignatureScheme for FalconSigner {
    /// Generate a new key pair for the configured parameter set.
    ///
    /// # Errors
    /// - `EntropyUnavailable` when the random source fails
    /// - `KeygenRetryExhausted` when no key was found within the attempt limit
    fn generate_keypair(&mut self) -> Result<()> {
        let keys = KeyGenerator::new(self.config.parameter_set, Arc::clone(&self.random))
            .with_max_attempts(self.config.keygen_max_attempts)
            .generate()?;
        let (public, private) = keys.into_parts();
        let expanded = ExpandedKey::new(&private)?;

        self.public_key_bytes = public.to_bytes();
        self.public_key = Some(public);
        self.secret = Some(Arc::new(SecretState {
            key: private,
            expanded,
        }));
        Ok(())
    }

    /// Sign a message.
    ///
    /// # Returns
    /// - Signature bytes (at most 666 bytes for Falcon-512)
    ///
    /// # Errors
    /// - `MissingKey` if no private key is loaded
    /// - `SigningRetryExhausted` if signing did not converge
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let secret = self.secret.as_ref().ok_or_else(|| {
            FalconError::MissingKey(
                "Secret key not initialized. Call generate_keypair() first.".to_string(),
            )
        })?;

        let signature = Signer::new(Arc::clone(&self.random))
            .with_max_attempts(self.config.sign_max_attempts)
            .sign_expanded(&secret.expanded, message)?;
        Ok(signature.into_bytes())
    }

    /// Verify a signature.
    ///
    /// # Returns
    /// - `Ok(true)`: Signature is valid
    /// - `Ok(false)`: Signature is invalid or malformed
    /// - `Err(MissingKey)`: no public key loaded
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        let public = self
            .public_key
            .as_ref()
            .ok_or_else(|| FalconError::MissingKey("Public key not initialized".to_string()))?;

        let is_valid = Verifier::verify(public, message, signature);
        if !is_valid {
            tracing::warn!(
                msg_len = message.len(),
                sig_len = signature.len(),
                "Falcon signature verification failed"
            );
        }
        Ok(is_valid)
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key_bytes
    }

    fn algorithm_name(&self) -> &str {
        self.config.parameter_set.name()
    }
}
