//! Arithmetic in `Z_q[x]/(x^n + 1)` with `q = 12289`.
//!
//! Coefficients are kept in `[0, q)`. Ring products go through a negacyclic
//! NTT: the inputs are twisted by powers of a primitive `2n`-th root `psi`,
//! then a cyclic Cooley-Tukey transform of order `n` (root `psi^2`) is
//! applied.

use std::sync::OnceLock;

use crate::params::Q;

/// Generator of the multiplicative group of `Z_q`.
const GENERATOR: u32 = 11;

const MAX_LOGN: usize = 10;

pub(crate) fn add(a: u32, b: u32) -> u32 {
    let s = a + b;
    if s >= Q {
        s - Q
    } else {
        s
    }
}

pub(crate) fn sub(a: u32, b: u32) -> u32 {
    if a >= b {
        a - b
    } else {
        a + Q - b
    }
}

pub(crate) fn mul(a: u32, b: u32) -> u32 {
    ((a as u64 * b as u64) % Q as u64) as u32
}

pub(crate) fn pow(mut base: u32, mut exp: u32) -> u32 {
    let mut acc = 1;
    base %= Q;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul(acc, base);
        }
        base = mul(base, base);
        exp >>= 1;
    }
    acc
}

/// Multiplicative inverse, `None` for zero.
pub(crate) fn inv(a: u32) -> Option<u32> {
    if a % Q == 0 {
        None
    } else {
        Some(pow(a, Q - 2))
    }
}

/// Map any signed integer into `[0, q)`.
pub(crate) fn reduce(x: i64) -> u32 {
    x.rem_euclid(Q as i64) as u32
}

/// Map `[0, q)` onto the centered range `(-q/2, q/2]`.
pub(crate) fn center(a: u32) -> i32 {
    if a > Q / 2 {
        a as i32 - Q as i32
    } else {
        a as i32
    }
}

pub(crate) fn from_signed(values: &[i32]) -> Vec<u32> {
    values.iter().map(|&v| reduce(v as i64)).collect()
}

struct NttTables {
    psi_pows: Vec<u32>,
    psi_inv_pows: Vec<u32>,
    omega: u32,
    omega_inv: u32,
    n_inv: u32,
}

impl NttTables {
    fn build(logn: usize) -> Self {
        let n = 1usize << logn;
        let psi = pow(GENERATOR, (Q - 1) / (2 * n as u32));
        // psi generates the 2n-th roots since GENERATOR has full order.
        let psi_inv = pow(psi, Q - 2);

        let mut psi_pows = Vec::with_capacity(n);
        let mut psi_inv_pows = Vec::with_capacity(n);
        let (mut p, mut pi) = (1, 1);
        for _ in 0..n {
            psi_pows.push(p);
            psi_inv_pows.push(pi);
            p = mul(p, psi);
            pi = mul(pi, psi_inv);
        }

        let omega = mul(psi, psi);
        Self {
            psi_pows,
            psi_inv_pows,
            omega,
            omega_inv: pow(omega, Q - 2),
            n_inv: pow(n as u32, Q - 2),
        }
    }
}

fn tables(n: usize) -> &'static NttTables {
    const EMPTY: OnceLock<NttTables> = OnceLock::new();
    static TABLES: [OnceLock<NttTables>; MAX_LOGN + 1] = [EMPTY; MAX_LOGN + 1];

    assert!(
        n.is_power_of_two() && n <= 1 << MAX_LOGN,
        "unsupported ring degree {n}"
    );
    let logn = n.trailing_zeros() as usize;
    TABLES[logn].get_or_init(|| NttTables::build(logn))
}

fn bit_reverse(values: &mut [u32]) {
    let n = values.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            values.swap(i, j);
        }
    }
}

fn cyclic_transform(values: &mut [u32], root: u32) {
    let n = values.len();
    bit_reverse(values);

    let mut len = 2;
    while len <= n {
        let wlen = pow(root, (n / len) as u32);
        for chunk in values.chunks_mut(len) {
            let mut w = 1;
            for i in 0..len / 2 {
                let u = chunk[i];
                let v = mul(chunk[i + len / 2], w);
                chunk[i] = add(u, v);
                chunk[i + len / 2] = sub(u, v);
                w = mul(w, wlen);
            }
        }
        len <<= 1;
    }
}

/// In-place forward negacyclic NTT.
pub(crate) fn ntt(values: &mut [u32]) {
    let t = tables(values.len());
    for (v, &p) in values.iter_mut().zip(&t.psi_pows) {
        *v = mul(*v, p);
    }
    cyclic_transform(values, t.omega);
}

/// In-place inverse of [`ntt`].
pub(crate) fn intt(values: &mut [u32]) {
    let t = tables(values.len());
    cyclic_transform(values, t.omega_inv);
    for (v, &p) in values.iter_mut().zip(&t.psi_inv_pows) {
        *v = mul(mul(*v, t.n_inv), p);
    }
}

/// Product in `Z_q[x]/(x^n + 1)`.
pub(crate) fn mul_poly(a: &[u32], b: &[u32]) -> Vec<u32> {
    debug_assert_eq!(a.len(), b.len());
    let mut a_hat = a.to_vec();
    let mut b_hat = b.to_vec();
    ntt(&mut a_hat);
    ntt(&mut b_hat);
    for (x, &y) in a_hat.iter_mut().zip(&b_hat) {
        *x = mul(*x, y);
    }
    intt(&mut a_hat);
    a_hat
}

/// Quotient `a / b` in `Z_q[x]/(x^n + 1)`, or `None` when `b` is not invertible.
pub(crate) fn div_poly(a: &[u32], b: &[u32]) -> Option<Vec<u32>> {
    debug_assert_eq!(a.len(), b.len());
    let mut a_hat = a.to_vec();
    let mut b_hat = b.to_vec();
    ntt(&mut a_hat);
    ntt(&mut b_hat);
    for (x, &y) in a_hat.iter_mut().zip(&b_hat) {
        *x = mul(*x, inv(y)?);
    }
    intt(&mut a_hat);
    Some(a_hat)
}

pub(crate) fn is_invertible(a: &[u32]) -> bool {
    let mut a_hat = a.to_vec();
    ntt(&mut a_hat);
    a_hat.iter().all(|&x| x != 0)
}
