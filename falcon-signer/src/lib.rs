//! Falcon post-quantum signature library
//!
//! Native implementation of the Falcon lattice signature scheme (Falcon-512
//! and Falcon-1024) with byte encodings compatible with the reference
//! implementation. Randomness is always supplied by the caller through a
//! [`RandomSource`], which makes key generation and signing reproducible
//! under a seeded source and lets one source be shared across threads.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use falcon_signer::{KeyGenerator, OsRandom, ParameterSet, Signer, Verifier};
//!
//! let random = Arc::new(OsRandom);
//!
//! // Generate keypair
//! let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone()).generate()?;
//!
//! // Sign message
//! let message = b"Hello, world!";
//! let signature = Signer::new(random).sign(keys.private_key(), message)?;
//!
//! // Verify signature
//! assert!(Verifier::verify(keys.public_key(), message, signature.as_bytes()));
//! # Ok::<(), falcon_signer::FalconError>(())
//! ```
//!
//! # Security notes
//! - Private keys, expanded keys and sampler seeds are wiped on drop.
//!   Big-integer temporaries of the key generation solver are not.
//! - Signing uses native floating point and is not claimed to run in
//!   constant time.

pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod falcon;
pub mod ffsampling;
pub mod hash;
pub mod keygen;
pub mod keys;
pub mod params;
pub mod random;
pub mod sign;
pub mod signature;
pub mod traits;
pub mod verify;

mod math;
mod ntru;
mod sampler;

// Re-export commonly used types
pub use config::FalconConfig;
pub use error::{FalconError, Result};
pub use falcon::FalconSigner;
pub use ffsampling::ExpandedKey;
pub use keygen::KeyGenerator;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use params::{AlgorithmInfo, ParameterSet};
pub use random::{OsRandom, RandomSource, SeededRandom};
pub use sign::Signer;
pub use signature::Signature;
pub use traits::SignatureScheme;
pub use verify::Verifier;
