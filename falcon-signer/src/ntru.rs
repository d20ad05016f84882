//! NTRU basis generation.
//!
//! Produces short `f, g` and completes them with `F, G` such that
//! `f G - g F = q` in `Z[x]/(x^n + 1)`. The completion follows the recursive
//! field-norm descent: solve the equation for the norms of `f` and `g` in
//! the half-degree ring, lift the solution back up, then shorten it with
//! Babai's nearest-plane reduction against `(f, g)`.
//!
//! Intermediate values reach thousands of bits, so the solver works on
//! [`BigInt`]. Those temporaries are not wiped when dropped; only the final
//! small-integer basis is.

use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{One, Signed, ToPrimitive, Zero};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::math::fft::{add_fft, adj_fft, div_fft, fft, ifft, mul_fft};
use crate::math::modq;
use crate::params::{ParameterSet, Q};
use crate::random::ShakePrng;
use crate::sampler;

/// `1.17 * sqrt(q / 8192)`
const KEYGEN_SIGMA: f64 = 1.433_009_805_287_73;

/// Upper bound on the squared Gram-Schmidt norm of the secret basis.
const GS_NORM_BOUND: f64 = 1.17 * 1.17 * Q as f64;

/// Largest `|F|`, `|G|` the private key encoding can hold.
const CAPITAL_FG_LIMIT: i32 = 127;

const MAX_REDUCE_ROUNDS: usize = 1024;

/// A complete secret basis `[[g, -f], [G, -F]]`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct NtruBasis {
    pub(crate) f: Vec<i32>,
    pub(crate) g: Vec<i32>,
    pub(crate) big_f: Vec<i32>,
    pub(crate) big_g: Vec<i32>,
}

/// Why a candidate `(f, g)` was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Sampler,
    GramSchmidtNorm,
    NotInvertible,
    OutOfRange,
    NoSolution,
}

/// Make one attempt at a basis for `params`.
pub(crate) fn try_generate(
    params: ParameterSet,
    prng: &mut ShakePrng,
) -> std::result::Result<NtruBasis, Rejection> {
    let n = params.degree();
    let mut f = gen_poly(n, prng).ok_or(Rejection::Sampler)?;
    let mut g = gen_poly(n, prng).ok_or(Rejection::Sampler)?;

    let verdict = check_candidate(params, &f, &g).and_then(|()| {
        let (big_f, big_g) = ntru_solve(&to_big(&f), &to_big(&g)).ok_or(Rejection::NoSolution)?;
        let big_f = to_small(&big_f, CAPITAL_FG_LIMIT).ok_or(Rejection::OutOfRange)?;
        let big_g = to_small(&big_g, CAPITAL_FG_LIMIT).ok_or(Rejection::OutOfRange)?;
        Ok((big_f, big_g))
    });

    match verdict {
        Ok((big_f, big_g)) => Ok(NtruBasis {
            f: std::mem::take(&mut f),
            g: std::mem::take(&mut g),
            big_f,
            big_g,
        }),
        Err(reason) => {
            f.zeroize();
            g.zeroize();
            Err(reason)
        }
    }
}

fn check_candidate(params: ParameterSet, f: &[i32], g: &[i32]) -> std::result::Result<(), Rejection> {
    let limit = (1i32 << (params.fg_bits() - 1)) - 1;
    if f.iter().chain(g).any(|c| c.abs() > limit) {
        return Err(Rejection::OutOfRange);
    }
    if gram_schmidt_norm(f, g) > GS_NORM_BOUND {
        return Err(Rejection::GramSchmidtNorm);
    }
    if !modq::is_invertible(&modq::from_signed(f)) {
        return Err(Rejection::NotInvertible);
    }
    Ok(())
}

/// Each coefficient is the sum of `4096 / n` narrow Gaussian samples, so
/// that the overall distribution does not depend on `n`.
fn gen_poly(n: usize, prng: &mut ShakePrng) -> Option<Vec<i32>> {
    let k = 4096 / n;
    let mut out = vec![0i32; n];
    for coeff in out.iter_mut() {
        for _ in 0..k {
            *coeff += sampler::sample(prng, 0.0, KEYGEN_SIGMA, KEYGEN_SIGMA - 0.001)?;
        }
    }
    Some(out)
}

fn sq_norm(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum()
}

/// Squared Gram-Schmidt norm of the basis generated by `(f, g)`.
fn gram_schmidt_norm(f: &[i32], g: &[i32]) -> f64 {
    let f_real: Vec<f64> = f.iter().map(|&x| x as f64).collect();
    let g_real: Vec<f64> = g.iter().map(|&x| x as f64).collect();
    let sqnorm_fg = sq_norm(&f_real) + sq_norm(&g_real);

    let f_fft = fft(&f_real);
    let g_fft = fft(&g_real);
    let ffgg = add_fft(&mul_fft(&f_fft, &adj_fft(&f_fft)), &mul_fft(&g_fft, &adj_fft(&g_fft)));
    let ft = ifft(&div_fft(&adj_fft(&g_fft), &ffgg));
    let gt = ifft(&div_fft(&adj_fft(&f_fft), &ffgg));
    let q = Q as f64;
    let sqnorm_fg_tilde = q * q * (sq_norm(&ft) + sq_norm(&gt));

    sqnorm_fg.max(sqnorm_fg_tilde)
}

fn to_big(values: &[i32]) -> Vec<BigInt> {
    values.iter().map(|&v| BigInt::from(v)).collect()
}

fn to_small(values: &[BigInt], limit: i32) -> Option<Vec<i32>> {
    values
        .iter()
        .map(|v| v.to_i32().filter(|x| x.abs() <= limit))
        .collect()
}

/// Extended Euclid: `(d, u, v)` with `u a + v b = d = gcd(a, b) >= 0`.
fn xgcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut r0, mut r1) = (a.abs(), b.abs());
    let (mut u0, mut u1) = (BigInt::one(), BigInt::zero());
    let (mut v0, mut v1) = (BigInt::zero(), BigInt::one());
    while !r1.is_zero() {
        let quot = &r0 / &r1;
        let r2 = &r0 - &quot * &r1;
        let u2 = &u0 - &quot * &u1;
        let v2 = &v0 - &quot * &v1;
        r0 = std::mem::replace(&mut r1, r2);
        u0 = std::mem::replace(&mut u1, u2);
        v0 = std::mem::replace(&mut v1, v2);
    }
    if a.is_negative() {
        u0 = -u0;
    }
    if b.is_negative() {
        v0 = -v0;
    }
    (r0, u0, v0)
}

/// Full product of two polynomials of equal power-of-two length.
fn karatsuba(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    if n == 1 {
        return vec![&a[0] * &b[0], BigInt::zero()];
    }
    let half = n / 2;
    let (a0, a1) = a.split_at(half);
    let (b0, b1) = b.split_at(half);
    let a_sum: Vec<BigInt> = a0.iter().zip(a1).map(|(x, y)| x + y).collect();
    let b_sum: Vec<BigInt> = b0.iter().zip(b1).map(|(x, y)| x + y).collect();

    let lo = karatsuba(a0, b0);
    let hi = karatsuba(a1, b1);
    let mut mid = karatsuba(&a_sum, &b_sum);
    for i in 0..n {
        mid[i] -= &lo[i] + &hi[i];
    }

    let mut out = vec![BigInt::zero(); 2 * n];
    for i in 0..n {
        out[i] += &lo[i];
        out[i + n] += &hi[i];
        out[i + half] += &mid[i];
    }
    out
}

/// Product in `Z[x]/(x^n + 1)`.
fn ring_mul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    let full = karatsuba(a, b);
    (0..n).map(|i| &full[i] - &full[i + n]).collect()
}

/// Norm from `Z[x]/(x^n + 1)` down to `Z[x]/(x^(n/2) + 1)`:
/// `N(f) = f0^2 - x f1^2` where `f(x) = f0(x^2) + x f1(x^2)`.
fn field_norm(f: &[BigInt]) -> Vec<BigInt> {
    let m = f.len() / 2;
    let f0: Vec<BigInt> = f.iter().step_by(2).cloned().collect();
    let f1: Vec<BigInt> = f.iter().skip(1).step_by(2).cloned().collect();
    let f0_sq = ring_mul(&f0, &f0);
    let f1_sq = ring_mul(&f1, &f1);

    let mut out = Vec::with_capacity(m);
    out.push(&f0_sq[0] + &f1_sq[m - 1]);
    for i in 1..m {
        out.push(&f0_sq[i] - &f1_sq[i - 1]);
    }
    out
}

/// `a(x) -> a(x^2)`
fn lift(a: &[BigInt]) -> Vec<BigInt> {
    let mut out = vec![BigInt::zero(); 2 * a.len()];
    for (i, c) in a.iter().enumerate() {
        out[2 * i] = c.clone();
    }
    out
}

/// `a(x) -> a(-x)`
fn galois_conjugate(a: &[BigInt]) -> Vec<BigInt> {
    a.iter()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 { c.clone() } else { -c })
        .collect()
}

/// Size in bits, rounded up to a whole byte.
fn byte_bitsize(a: &BigInt) -> u64 {
    a.bits().div_ceil(8) * 8
}

fn max_bitsize(polys: &[&[BigInt]]) -> u64 {
    polys
        .iter()
        .flat_map(|p| p.iter())
        .map(byte_bitsize)
        .fold(53, u64::max)
}

/// Top 53 bits of every coefficient, as floats, in the FFT domain.
fn truncated_fft(a: &[BigInt], shift: usize) -> Vec<Complex64> {
    let real: Vec<f64> = a
        .iter()
        .map(|c| (c >> shift).to_f64().unwrap_or(0.0))
        .collect();
    fft(&real)
}

/// Reduce `(F, G)` against `(f, g)` until it is no larger than `(f, g)`.
fn reduce(f: &[BigInt], g: &[BigInt], big_f: &mut [BigInt], big_g: &mut [BigInt]) -> Option<()> {
    let size = max_bitsize(&[f, g]);
    let fa = truncated_fft(f, (size - 53) as usize);
    let ga = truncated_fft(g, (size - 53) as usize);
    let den = add_fft(&mul_fft(&fa, &adj_fft(&fa)), &mul_fft(&ga, &adj_fft(&ga)));

    for _ in 0..MAX_REDUCE_ROUNDS {
        let big_size = max_bitsize(&[&*big_f, &*big_g]);
        if big_size < size {
            return Some(());
        }
        let shift = (big_size - 53) as usize;
        let big_fa = truncated_fft(big_f, shift);
        let big_ga = truncated_fft(big_g, shift);
        let num = add_fft(&mul_fft(&big_fa, &adj_fft(&fa)), &mul_fft(&big_ga, &adj_fft(&ga)));

        let k: Vec<BigInt> = ifft(&div_fft(&num, &den))
            .into_iter()
            .map(|x| BigInt::from(x.round() as i64))
            .collect();
        if k.iter().all(Zero::is_zero) {
            return Some(());
        }

        let fk = ring_mul(f, &k);
        let gk = ring_mul(g, &k);
        let scale = (big_size - size) as usize;
        for i in 0..f.len() {
            big_f[i] -= &fk[i] << scale;
            big_g[i] -= &gk[i] << scale;
        }
    }
    None
}

/// Solve `f G - g F = q`. `None` when the norms at the bottom of the
/// recursion are not coprime or the reduction does not settle.
fn ntru_solve(f: &[BigInt], g: &[BigInt]) -> Option<(Vec<BigInt>, Vec<BigInt>)> {
    let n = f.len();
    let q = BigInt::from(Q);
    if n == 1 {
        let (d, u, v) = xgcd(&f[0], &g[0]);
        if !d.is_one() {
            return None;
        }
        return Some((vec![-(&q * v)], vec![&q * u]));
    }

    let (fp, gp) = ntru_solve(&field_norm(f), &field_norm(g))?;
    let mut big_f = ring_mul(&lift(&fp), &galois_conjugate(g));
    let mut big_g = ring_mul(&lift(&gp), &galois_conjugate(f));
    reduce(f, g, &mut big_f, &mut big_g)?;
    Some((big_f, big_g))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    fn ntru_equation_holds(f: &[BigInt], g: &[BigInt], big_f: &[BigInt], big_g: &[BigInt]) -> bool {
        let lhs = ring_mul(f, big_g);
        let rhs = ring_mul(g, big_f);
        let diff: Vec<BigInt> = lhs.iter().zip(&rhs).map(|(a, b)| a - b).collect();
        diff[0] == BigInt::from(Q) && diff[1..].iter().all(Zero::is_zero)
    }

    #[test]
    fn test_xgcd() {
        let (d, u, v) = xgcd(&BigInt::from(240), &BigInt::from(-46));
        assert_eq!(d, BigInt::from(2));
        assert_eq!(u * 240 + v * -46, BigInt::from(2));
    }

    #[test]
    fn test_ring_mul_wraps_negatively() {
        // (1 + x^3) * x = x - 1 in Z[x]/(x^4 + 1)
        let a = small(&[1, 0, 0, 1]);
        let b = small(&[0, 1, 0, 0]);
        assert_eq!(ring_mul(&a, &b), small(&[-1, 1, 0, 0]));
    }

    #[test]
    fn test_field_norm_is_multiplicative() {
        let a = small(&[3, -1, 2, 0, 1, 1, -2, 4]);
        let b = small(&[1, 2, 0, -1, 0, 3, 1, 1]);
        assert_eq!(
            field_norm(&ring_mul(&a, &b)),
            ring_mul(&field_norm(&a), &field_norm(&b))
        );
    }

    #[test]
    fn test_ntru_solve_small_degree() {
        let mut prng = ShakePrng::from_seed(b"ntru solve");
        let mut solved = 0;
        for _ in 0..50 {
            let f: Vec<i64> = (0..16)
                .map(|_| sampler::sample(&mut prng, 0.0, 1.7, 1.3).unwrap() as i64)
                .collect();
            let g: Vec<i64> = (0..16)
                .map(|_| sampler::sample(&mut prng, 0.0, 1.7, 1.3).unwrap() as i64)
                .collect();
            let (f, g) = (small(&f), small(&g));
            if let Some((big_f, big_g)) = ntru_solve(&f, &g) {
                assert!(ntru_equation_holds(&f, &g, &big_f, &big_g));
                solved += 1;
            }
        }
        assert!(solved > 0);
    }

    #[test]
    fn test_generated_basis_is_valid() {
        let mut prng = ShakePrng::from_seed(b"falcon-512 basis");
        let params = ParameterSet::Falcon512;
        let basis = (0..200)
            .find_map(|_| try_generate(params, &mut prng).ok())
            .expect("no basis within 200 attempts");

        assert_eq!(basis.f.len(), 512);
        assert!(basis.f.iter().chain(&basis.g).all(|c| c.abs() <= 31));
        assert!(basis.big_f.iter().chain(&basis.big_g).all(|c| c.abs() <= 127));
        assert!(ntru_equation_holds(
            &to_big(&basis.f),
            &to_big(&basis.g),
            &to_big(&basis.big_f),
            &to_big(&basis.big_g)
        ));
    }
}
