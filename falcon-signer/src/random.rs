//! Randomness sources.
//!
//! Key generation and signing never reach for ambient process state: they
//! take a [`RandomSource`] and draw a short seed from it, which is then
//! stretched with SHAKE256 for the Gaussian samplers. A single source can
//! therefore be shared behind an `Arc` by many threads while each operation
//! only touches it once or twice.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{FalconError, Result};

/// Seed length used to key the sampler stream.
pub(crate) const PRNG_SEED_LEN: usize = 48;

/// Supplier of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely, or fail with `EntropyUnavailable`.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;

    /// Return `n` fresh random bytes in a buffer that is wiped on drop.
    fn next_bytes(&self, n: usize) -> Result<Zeroizing<Vec<u8>>> {
        let mut buf = Zeroizing::new(vec![0u8; n]);
        self.fill_bytes(&mut buf)?;
        Ok(buf)
    }
}

/// Operating-system entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| FalconError::EntropyUnavailable(e.to_string()))
    }
}

/// Deterministic source for tests and reproducible runs.
///
/// Not suitable for production keys: anyone holding the seed can
/// regenerate every key and nonce drawn from it.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_seed(seed)),
        }
    }

    pub fn from_u64(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.fill_bytes(dest);
        Ok(())
    }
}

/// SHAKE256 rate in bytes.
const SHAKE256_RATE: usize = 136;

/// SHAKE256 output stream keyed by a seed from a [`RandomSource`].
///
/// The sponge is kept as raw Keccak lanes so the whole state, from which
/// every sampled secret can be replayed, is wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct ShakePrng {
    lanes: [u64; 25],
    offset: usize,
}

impl ShakePrng {
    pub(crate) fn from_seed(seed: &[u8]) -> Self {
        let mut prng = Self {
            lanes: [0; 25],
            offset: 0,
        };

        let mut blocks = seed.chunks_exact(SHAKE256_RATE);
        for block in &mut blocks {
            prng.absorb(block);
            keccak::f1600(&mut prng.lanes);
        }
        let rest = blocks.remainder();
        prng.absorb(rest);
        prng.xor_byte(rest.len(), 0x1F);
        prng.xor_byte(SHAKE256_RATE - 1, 0x80);
        keccak::f1600(&mut prng.lanes);
        prng
    }

    pub(crate) fn from_source(source: &dyn RandomSource) -> Result<Self> {
        let seed = source.next_bytes(PRNG_SEED_LEN)?;
        Ok(Self::from_seed(&seed))
    }

    pub(crate) fn fill(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_u8();
        }
    }

    pub(crate) fn next_u8(&mut self) -> u8 {
        if self.offset == SHAKE256_RATE {
            keccak::f1600(&mut self.lanes);
            self.offset = 0;
        }
        let byte = (self.lanes[self.offset / 8] >> (8 * (self.offset % 8))) as u8;
        self.offset += 1;
        byte
    }

    fn absorb(&mut self, block: &[u8]) {
        for (i, &b) in block.iter().enumerate() {
            self.xor_byte(i, b);
        }
    }

    fn xor_byte(&mut self, index: usize, b: u8) {
        self.lanes[index / 8] ^= (b as u64) << (8 * (index % 8));
    }
}
