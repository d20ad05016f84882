//! Complex FFT over `R[x]/(x^n + 1)`.
//!
//! A polynomial of degree `n` is represented by its evaluations at the `n`
//! primitive `2n`-th roots of unity. The ordering is the recursive one used
//! by Falcon's fast-Fourier sampling: entries `2i` and `2i + 1` are the
//! evaluations at `w` and `-w`, which is what makes [`split_fft`] and
//! [`merge_fft`] cheap.

use std::f64::consts::PI;
use std::sync::OnceLock;

use num_complex::Complex64;

const MAX_LOGN: usize = 10;

/// Evaluation points for a transform of length `n` (`2 <= n <= 1024`).
fn roots(n: usize) -> &'static [Complex64] {
    const EMPTY: OnceLock<Vec<Complex64>> = OnceLock::new();
    static ROOTS: [OnceLock<Vec<Complex64>>; MAX_LOGN + 1] = [EMPTY; MAX_LOGN + 1];

    assert!(
        n.is_power_of_two() && (2..=1 << MAX_LOGN).contains(&n),
        "unsupported FFT length {n}"
    );
    let logn = n.trailing_zeros() as usize;
    ROOTS[logn].get_or_init(|| {
        root_angles(n)
            .into_iter()
            .map(|a| Complex64::from_polar(1.0, a))
            .collect()
    })
}

/// Arguments of the evaluation points, kept in `(-pi, pi]`.
fn root_angles(n: usize) -> Vec<f64> {
    let mut angles = vec![PI / 2.0, -PI / 2.0];
    while angles.len() < n {
        angles = angles
            .iter()
            .flat_map(|&a| {
                let half = a / 2.0;
                let other = if half + PI > PI { half - PI } else { half + PI };
                [half, other]
            })
            .collect();
    }
    angles
}

/// Split a transformed polynomial `f(x) = f0(x^2) + x f1(x^2)` into the
/// transforms of `f0` and `f1`.
pub(crate) fn split_fft(f: &[Complex64]) -> (Vec<Complex64>, Vec<Complex64>) {
    let n = f.len();
    let w = roots(n);
    let mut f0 = Vec::with_capacity(n / 2);
    let mut f1 = Vec::with_capacity(n / 2);
    for i in 0..n / 2 {
        let (a, b) = (f[2 * i], f[2 * i + 1]);
        f0.push((a + b) * 0.5);
        f1.push((a - b) * 0.5 * w[2 * i].conj());
    }
    (f0, f1)
}

/// Inverse of [`split_fft`].
pub(crate) fn merge_fft(f0: &[Complex64], f1: &[Complex64]) -> Vec<Complex64> {
    let n = 2 * f0.len();
    let w = roots(n);
    let mut f = vec![Complex64::new(0.0, 0.0); n];
    for i in 0..n / 2 {
        let t = w[2 * i] * f1[i];
        f[2 * i] = f0[i] + t;
        f[2 * i + 1] = f0[i] - t;
    }
    f
}

/// Forward transform of a real polynomial (`n >= 2`).
pub(crate) fn fft(f: &[f64]) -> Vec<Complex64> {
    let n = f.len();
    if n == 2 {
        return vec![Complex64::new(f[0], f[1]), Complex64::new(f[0], -f[1])];
    }
    let even: Vec<f64> = f.iter().step_by(2).copied().collect();
    let odd: Vec<f64> = f.iter().skip(1).step_by(2).copied().collect();
    merge_fft(&fft(&even), &fft(&odd))
}

/// Inverse transform, returning the real coefficients.
pub(crate) fn ifft(f: &[Complex64]) -> Vec<f64> {
    let n = f.len();
    if n == 2 {
        return vec![f[0].re, f[0].im];
    }
    let (f0, f1) = split_fft(f);
    let even = ifft(&f0);
    let odd = ifft(&f1);
    let mut out = Vec::with_capacity(n);
    for (a, b) in even.into_iter().zip(odd) {
        out.push(a);
        out.push(b);
    }
    out
}

pub(crate) fn fft_i64(f: &[i64]) -> Vec<Complex64> {
    let real: Vec<f64> = f.iter().map(|&x| x as f64).collect();
    fft(&real)
}

pub(crate) fn add_fft(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub(crate) fn sub_fft(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub(crate) fn mul_fft(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

pub(crate) fn div_fft(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(x, y)| x / y).collect()
}

/// Hermitian adjoint `f*(x) = f(1/x)`.
pub(crate) fn adj_fft(a: &[Complex64]) -> Vec<Complex64> {
    a.iter().map(|x| x.conj()).collect()
}

pub(crate) fn scale_fft(a: &[Complex64], k: f64) -> Vec<Complex64> {
    a.iter().map(|&x| x * k).collect()
}
