//! Expanded signing keys and fast-Fourier sampling.
//!
//! Expanding a [`PrivateKey`] recomputes `G`, checks the NTRU equation,
//! moves the basis `B = [[g, -f], [G, -F]]` into the FFT domain and builds
//! the LDL* tree of its Gram matrix. The expansion costs far more than a
//! signature, so callers that sign repeatedly keep the [`ExpandedKey`].

use std::fmt;

use num_complex::Complex64;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{FalconError, Result};
use crate::keys::{to_modq, PrivateKey, PublicKey};
use crate::math::fft::{
    add_fft, adj_fft, div_fft, fft, fft_i64, ifft, merge_fft, mul_fft, scale_fft, split_fft,
    sub_fft,
};
use crate::math::modq;
use crate::params::{ParameterSet, Q};
use crate::random::ShakePrng;
use crate::sampler;

/// LDL* decomposition of the Gram matrix, split recursively.
enum LdlTree {
    Node {
        l10: Vec<Complex64>,
        left: Box<LdlTree>,
        right: Box<LdlTree>,
    },
    /// Standard deviation to sample with at this leaf.
    Leaf(f64),
}

impl LdlTree {
    /// Build the tree for the self-adjoint 2x2 matrix `[[g00, g01], [adj(g01), g11]]`.
    fn build(g00: &[Complex64], g01: &[Complex64], g11: &[Complex64]) -> Self {
        let l10 = div_fft(&adj_fft(g01), g00);
        let d11 = sub_fft(g11, &mul_fft(&mul_fft(&l10, &adj_fft(&l10)), g00));

        if g00.len() == 2 {
            return LdlTree::Node {
                l10,
                left: Box::new(LdlTree::Leaf(g00[0].re)),
                right: Box::new(LdlTree::Leaf(d11[0].re)),
            };
        }

        let (d00_0, d00_1) = split_fft(g00);
        let (d11_0, d11_1) = split_fft(&d11);
        LdlTree::Node {
            l10,
            left: Box::new(LdlTree::build(&d00_0, &d00_1, &d00_0)),
            right: Box::new(LdlTree::build(&d11_0, &d11_1, &d11_0)),
        }
    }

    /// Replace every leaf value `d` with `sigma / sqrt(d)`.
    fn normalize(&mut self, sigma: f64) {
        match self {
            LdlTree::Node { left, right, .. } => {
                left.normalize(sigma);
                right.normalize(sigma);
            }
            LdlTree::Leaf(value) => *value = sigma / value.sqrt(),
        }
    }

    fn scrub(&mut self) {
        match self {
            LdlTree::Node { l10, left, right } => {
                scrub_complex(l10);
                left.scrub();
                right.scrub();
            }
            LdlTree::Leaf(value) => value.zeroize(),
        }
    }

    /// Sample `z` close to the target `(t0, t1)` in the lattice spanned by the tree.
    fn sample(
        &self,
        t0: &[Complex64],
        t1: &[Complex64],
        sigma_min: f64,
        prng: &mut ShakePrng,
    ) -> Option<(Vec<Complex64>, Vec<Complex64>)> {
        match self {
            LdlTree::Leaf(sigma) => {
                let z0 = sampler::sample(prng, t0[0].re, *sigma, sigma_min)?;
                let z1 = sampler::sample(prng, t1[0].re, *sigma, sigma_min)?;
                Some((
                    vec![Complex64::new(z0 as f64, 0.0)],
                    vec![Complex64::new(z1 as f64, 0.0)],
                ))
            }
            LdlTree::Node { l10, left, right } => {
                let (t1_0, t1_1) = split_fft(t1);
                let (z1_0, z1_1) = right.sample(&t1_0, &t1_1, sigma_min, prng)?;
                let z1 = merge_fft(&z1_0, &z1_1);

                let t0_shifted = add_fft(t0, &mul_fft(&sub_fft(t1, &z1), l10));
                let (t0_0, t0_1) = split_fft(&t0_shifted);
                let (z0_0, z0_1) = left.sample(&t0_0, &t0_1, sigma_min, prng)?;
                Some((merge_fft(&z0_0, &z0_1), z1))
            }
        }
    }
}

fn scrub_complex(values: &mut [Complex64]) {
    for v in values.iter_mut() {
        v.re.zeroize();
        v.im.zeroize();
    }
}

/// A private key prepared for fast repeated signing.
pub struct ExpandedKey {
    params: ParameterSet,
    public_key: PublicKey,
    /// FFT of `g`, `-f`, `G`, `-F`.
    b00: Vec<Complex64>,
    b01: Vec<Complex64>,
    b10: Vec<Complex64>,
    b11: Vec<Complex64>,
    tree: LdlTree,
}

fn widen(values: &[i8]) -> Vec<i64> {
    values.iter().map(|&c| c as i64).collect()
}

fn negate(values: &[i64]) -> Vec<i64> {
    values.iter().map(|&c| -c).collect()
}

/// Schoolbook product in `Z[x]/(x^n + 1)`; inputs are small.
fn ring_mul_exact(a: &[i64], b: &[i64]) -> Vec<i64> {
    let n = a.len();
    let mut out = vec![0i64; n];
    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            if i + j < n {
                out[i + j] += x * y;
            } else {
                out[i + j - n] -= x * y;
            }
        }
    }
    out
}

impl ExpandedKey {
    /// Expand `key` for signing.
    ///
    /// # Errors
    /// - `InvalidKey` if `f` is not invertible, `G` does not fit the
    ///   coefficient range, or `f G - g F != q`
    pub fn new(key: &PrivateKey) -> Result<Self> {
        let params = key.params();
        let f = Zeroizing::new(widen(key.f()));
        let g = Zeroizing::new(widen(key.g()));
        let big_f = Zeroizing::new(widen(key.big_f()));

        let public_key = key.public_key()?;
        let big_g = Zeroizing::new(recompute_big_g(key)?);

        let lhs = Zeroizing::new(ring_mul_exact(&f, &big_g));
        let rhs = Zeroizing::new(ring_mul_exact(&g, &big_f));
        let consistent = lhs[0] - rhs[0] == Q as i64
            && lhs[1..].iter().zip(&rhs[1..]).all(|(a, b)| a == b);
        if !consistent {
            return Err(FalconError::InvalidKey(
                "NTRU equation f*G - g*F = q does not hold".to_string(),
            ));
        }

        let b00 = fft_i64(&g);
        let b01 = fft_i64(&Zeroizing::new(negate(&f)));
        let b10 = fft_i64(&big_g);
        let b11 = fft_i64(&Zeroizing::new(negate(&big_f)));

        let mut g00 = add_fft(&mul_fft(&b00, &adj_fft(&b00)), &mul_fft(&b01, &adj_fft(&b01)));
        let mut g01 = add_fft(&mul_fft(&b00, &adj_fft(&b10)), &mul_fft(&b01, &adj_fft(&b11)));
        let mut g11 = add_fft(&mul_fft(&b10, &adj_fft(&b10)), &mul_fft(&b11, &adj_fft(&b11)));
        let mut tree = LdlTree::build(&g00, &g01, &g11);
        tree.normalize(params.sigma());
        scrub_complex(&mut g00);
        scrub_complex(&mut g01);
        scrub_complex(&mut g11);

        tracing::debug!(
            params = params.name(),
            fingerprint = %public_key.fingerprint(),
            "Expanded private key"
        );

        Ok(Self {
            params,
            public_key,
            b00,
            b01,
            b10,
            b11,
            tree,
        })
    }

    pub fn params(&self) -> ParameterSet {
        self.params
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sample a short `(s1, s2)` with `s1 + s2 h = c mod q`.
    ///
    /// `None` if a sampler call gave up; the caller retries.
    pub(crate) fn sample_preimage(
        &self,
        c: &[u32],
        prng: &mut ShakePrng,
    ) -> Option<(Vec<i32>, Vec<i32>)> {
        let c_real: Vec<f64> = c.iter().map(|&x| x as f64).collect();
        let c_fft = fft(&c_real);
        let inv_q = 1.0 / Q as f64;

        // target t = (c, 0) B^-1 = (c * (-F), -c * (-f)) / q
        let mut t0 = scale_fft(&mul_fft(&c_fft, &self.b11), inv_q);
        let mut t1 = scale_fft(&mul_fft(&c_fft, &self.b01), -inv_q);

        let sampled = self.tree.sample(&t0, &t1, self.params.sigma_min(), prng);
        scrub_complex(&mut t0);
        scrub_complex(&mut t1);
        let (mut z0, mut z1) = sampled?;

        let mut v0 = add_fft(&mul_fft(&z0, &self.b00), &mul_fft(&z1, &self.b10));
        let mut v1 = add_fft(&mul_fft(&z0, &self.b01), &mul_fft(&z1, &self.b11));
        scrub_complex(&mut z0);
        scrub_complex(&mut z1);

        let v0_real = Zeroizing::new(ifft(&v0));
        let v1_real = Zeroizing::new(ifft(&v1));
        scrub_complex(&mut v0);
        scrub_complex(&mut v1);

        let s1 = c
            .iter()
            .zip(v0_real.iter())
            .map(|(&ci, v)| ci as i32 - v.round() as i32)
            .collect();
        let s2 = v1_real.iter().map(|v| -(v.round() as i32)).collect();
        Some((s1, s2))
    }
}

/// `G = g F / f mod q`, centered, and required to fit on 8 bits.
fn recompute_big_g(key: &PrivateKey) -> Result<Vec<i64>> {
    let f = to_modq(key.f());
    let g = to_modq(key.g());
    let big_f = to_modq(key.big_f());
    let g_big_f = modq::mul_poly(&g, &big_f);
    let big_g = modq::div_poly(&g_big_f, &f)
        .ok_or_else(|| FalconError::InvalidKey("f is not invertible modulo q".to_string()))?;

    let limit = (1i64 << (key.params().capital_fg_bits() - 1)) - 1;
    big_g
        .into_iter()
        .map(|c| {
            let centered = modq::center(c) as i64;
            if centered.abs() > limit {
                Err(FalconError::InvalidKey(
                    "recomputed G is out of range".to_string(),
                ))
            } else {
                Ok(centered)
            }
        })
        .collect()
}

impl Drop for ExpandedKey {
    fn drop(&mut self) {
        scrub_complex(&mut self.b00);
        scrub_complex(&mut self.b01);
        scrub_complex(&mut self.b10);
        scrub_complex(&mut self.b11);
        self.tree.scrub();
    }
}

impl fmt::Debug for ExpandedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpandedKey")
            .field("params", &self.params)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_mul_exact() {
        // (1 + 2x) * (3 - x^3) = 3 + 6x - x^3 - 2x^4, and x^4 = -1
        let a = vec![1, 2, 0, 0];
        let b = vec![3, 0, 0, -1];
        assert_eq!(ring_mul_exact(&a, &b), vec![5, 6, 0, -1]);
    }

    #[test]
    fn test_inconsistent_key_is_rejected() {
        let mut f = vec![0i8; 512];
        f[0] = 1;
        let key = PrivateKey::from_parts(ParameterSet::Falcon512, f, vec![0; 512], vec![0; 512]);
        // G recomputes to zero, so f*G - g*F = 0 != q
        assert!(matches!(
            ExpandedKey::new(&key),
            Err(FalconError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_scrub_complex_clears_both_parts() {
        let mut values = vec![Complex64::new(1.5, -2.5); 16];
        scrub_complex(&mut values);
        assert!(values.iter().all(|v| v.re == 0.0 && v.im == 0.0));
        assert_eq!(values.len(), 16);
    }

    #[test]
    fn test_ldl_leaf_count() {
        fn leaves(tree: &LdlTree) -> usize {
            match tree {
                LdlTree::Leaf(_) => 1,
                LdlTree::Node { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        let ones = vec![Complex64::new(2.0, 0.0); 8];
        let zeros = vec![Complex64::new(0.0, 0.0); 8];
        let tree = LdlTree::build(&ones, &zeros, &ones);
        assert_eq!(leaves(&tree), 8);
    }
}
