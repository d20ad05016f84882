//! Key types.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::codec;
use crate::error::{FalconError, Result};
use crate::hash;
use crate::math::modq;
use crate::ntru::NtruBasis;
use crate::params::ParameterSet;
use crate::verify::Verifier;

/// Verification key `h = g / f mod q`.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    params: ParameterSet,
    h: Vec<u16>,
}

impl PublicKey {
    pub(crate) fn from_coefficients(params: ParameterSet, h: Vec<u16>) -> Self {
        debug_assert_eq!(h.len(), params.degree());
        Self { params, h }
    }

    pub fn params(&self) -> ParameterSet {
        self.params
    }

    /// Coefficients of `h`, each in `[0, q)`.
    pub fn coefficients(&self) -> &[u16] {
        &self.h
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_public(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode_public(bytes)
    }

    /// Short hex digest of the encoded key, for logs.
    pub fn fingerprint(&self) -> String {
        hash::fingerprint(&self.to_bytes())
    }

    /// Shorthand for [`Verifier::verify`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        Verifier::verify(self, message, signature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("params", &self.params)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Signing key `(f, g, F)`.
///
/// `G` is not stored: it is determined by the other three polynomials and
/// recomputed when the key is expanded for signing. All coefficients are
/// wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)]
    params: ParameterSet,
    f: Vec<i8>,
    g: Vec<i8>,
    big_f: Vec<i8>,
}

impl PrivateKey {
    pub(crate) fn from_parts(params: ParameterSet, f: Vec<i8>, g: Vec<i8>, big_f: Vec<i8>) -> Self {
        Self { params, f, g, big_f }
    }

    pub(crate) fn from_basis(params: ParameterSet, basis: &NtruBasis) -> Self {
        let narrow = |v: &[i32]| v.iter().map(|&c| c as i8).collect::<Vec<i8>>();
        Self {
            params,
            f: narrow(&basis.f),
            g: narrow(&basis.g),
            big_f: narrow(&basis.big_f),
        }
    }

    pub fn params(&self) -> ParameterSet {
        self.params
    }

    pub(crate) fn f(&self) -> &[i8] {
        &self.f
    }

    pub(crate) fn g(&self) -> &[i8] {
        &self.g
    }

    pub(crate) fn big_f(&self) -> &[i8] {
        &self.big_f
    }

    /// Encoded key in a buffer that is wiped on drop.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        codec::encode_private(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode_private(bytes)
    }

    /// Re-derive the matching public key.
    ///
    /// # Errors
    /// - `InvalidKey` if `f` is not invertible modulo `q`
    pub fn public_key(&self) -> Result<PublicKey> {
        let f = Zeroizing::new(to_modq(&self.f));
        let g = Zeroizing::new(to_modq(&self.g));
        let h = modq::div_poly(&g, &f).ok_or_else(|| {
            FalconError::InvalidKey("f is not invertible modulo q".to_string())
        })?;
        Ok(PublicKey::from_coefficients(
            self.params,
            h.into_iter().map(|c| c as u16).collect(),
        ))
    }
}

pub(crate) fn to_modq(values: &[i8]) -> Vec<u32> {
    values.iter().map(|&c| modq::reduce(c as i64)).collect()
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("params", &self.params)
            .field("coefficients", &"<redacted>")
            .finish()
    }
}

/// A freshly generated key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    pub(crate) fn new(public: PublicKey, private: PrivateKey) -> Self {
        Self { public, private }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn params(&self) -> ParameterSet {
        self.public.params
    }

    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}
