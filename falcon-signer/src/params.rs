//! Falcon parameter sets.
//!
//! Values are the round-3 Falcon submission constants. Everything the
//! codecs, the samplers and the verifier need is kept here so that the two
//! sets can be switched at runtime.

use serde::{Deserialize, Serialize};

/// Prime modulus of the Falcon ring.
pub const Q: u32 = 12_289;

/// Length of the random nonce prepended to every signature.
pub const NONCE_LEN: usize = 40;

/// Header byte plus nonce.
pub const SIGNATURE_OVERHEAD: usize = 1 + NONCE_LEN;

/// Supported Falcon parameter sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterSet {
    #[default]
    #[serde(rename = "falcon-512")]
    Falcon512,
    #[serde(rename = "falcon-1024")]
    Falcon1024,
}

impl ParameterSet {
    /// All supported sets.
    pub const fn all() -> &'static [ParameterSet] {
        &[ParameterSet::Falcon512, ParameterSet::Falcon1024]
    }

    pub const fn from_logn(logn: u8) -> Option<Self> {
        match logn {
            9 => Some(ParameterSet::Falcon512),
            10 => Some(ParameterSet::Falcon1024),
            _ => None,
        }
    }

    pub const fn from_degree(degree: usize) -> Option<Self> {
        match degree {
            512 => Some(ParameterSet::Falcon512),
            1024 => Some(ParameterSet::Falcon1024),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ParameterSet::Falcon512 => "Falcon-512",
            ParameterSet::Falcon1024 => "Falcon-1024",
        }
    }

    pub const fn logn(self) -> u8 {
        match self {
            ParameterSet::Falcon512 => 9,
            ParameterSet::Falcon1024 => 10,
        }
    }

    /// Ring degree `n`.
    pub const fn degree(self) -> usize {
        1 << self.logn()
    }

    pub const fn public_key_len(self) -> usize {
        match self {
            ParameterSet::Falcon512 => 897,
            ParameterSet::Falcon1024 => 1_793,
        }
    }

    pub const fn private_key_len(self) -> usize {
        match self {
            ParameterSet::Falcon512 => 1_281,
            ParameterSet::Falcon1024 => 2_305,
        }
    }

    /// Worst-case signature size; also the required output buffer capacity.
    pub const fn max_signature_len(self) -> usize {
        match self {
            ParameterSet::Falcon512 => 666,
            ParameterSet::Falcon1024 => 1_280,
        }
    }

    /// Standard deviation of the signing sampler.
    pub const fn sigma(self) -> f64 {
        match self {
            ParameterSet::Falcon512 => 165.736_617_182_977_6,
            ParameterSet::Falcon1024 => 168.388_571_446_543_95,
        }
    }

    /// Smallest standard deviation the leaf samplers are asked for.
    pub const fn sigma_min(self) -> f64 {
        match self {
            ParameterSet::Falcon512 => 1.277_833_696_912_833_7,
            ParameterSet::Falcon1024 => 1.298_280_334_344_292,
        }
    }

    /// Acceptance bound on the squared norm of `(s1, s2)`.
    pub const fn signature_bound(self) -> i64 {
        match self {
            ParameterSet::Falcon512 => 34_034_726,
            ParameterSet::Falcon1024 => 70_265_242,
        }
    }

    /// Bit width of each `f` / `g` coefficient in the private key encoding.
    pub const fn fg_bits(self) -> u32 {
        match self {
            ParameterSet::Falcon512 => 6,
            ParameterSet::Falcon1024 => 5,
        }
    }

    /// Bit width of each `F` / `G` coefficient.
    pub const fn capital_fg_bits(self) -> u32 {
        8
    }

    pub const fn public_key_header(self) -> u8 {
        self.logn()
    }

    pub const fn private_key_header(self) -> u8 {
        0x50 | self.logn()
    }

    pub const fn signature_header(self) -> u8 {
        0x30 | self.logn()
    }

    pub const fn nist_level(self) -> u8 {
        match self {
            ParameterSet::Falcon512 => 1,
            ParameterSet::Falcon1024 => 5,
        }
    }

    pub const fn info(self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: self.name(),
            nist_level: self.nist_level(),
            public_key_size: self.public_key_len(),
            secret_key_size: self.private_key_len(),
            signature_size: self.max_signature_len(),
        }
    }
}

/// Algorithm information structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmInfo {
    /// Algorithm name
    pub name: &'static str,
    /// NIST security level
    pub nist_level: u8,
    /// Public key size (bytes)
    pub public_key_size: usize,
    /// Secret key size (bytes)
    pub secret_key_size: usize,
    /// Maximum signature size (bytes)
    pub signature_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_sizes_match_encodings() {
        for &set in ParameterSet::all() {
            let n = set.degree();
            assert_eq!(set.public_key_len(), 1 + 14 * n / 8);
            let fg = set.fg_bits() as usize * n / 8;
            assert_eq!(set.private_key_len(), 1 + 2 * fg + n);
        }
    }

    #[test]
    fn test_lookup_by_logn_and_degree() {
        assert_eq!(ParameterSet::from_logn(9), Some(ParameterSet::Falcon512));
        assert_eq!(ParameterSet::from_logn(10), Some(ParameterSet::Falcon1024));
        assert_eq!(ParameterSet::from_logn(8), None);
        assert_eq!(ParameterSet::from_degree(1024), Some(ParameterSet::Falcon1024));
        assert_eq!(ParameterSet::from_degree(256), None);
    }

    #[test]
    fn test_headers() {
        assert_eq!(ParameterSet::Falcon512.public_key_header(), 0x09);
        assert_eq!(ParameterSet::Falcon512.private_key_header(), 0x59);
        assert_eq!(ParameterSet::Falcon1024.signature_header(), 0x3A);
    }

    #[test]
    fn test_algorithm_info() {
        let info = ParameterSet::Falcon512.info();
        assert_eq!(info.name, "Falcon-512");
        assert_eq!(info.nist_level, 1);
        assert_eq!(info.public_key_size, 897);
        assert_eq!(info.secret_key_size, 1281);
        assert_eq!(info.signature_size, 666);
    }

    #[test]
    fn test_default_is_falcon512() {
        assert_eq!(ParameterSet::default(), ParameterSet::Falcon512);
    }
}
