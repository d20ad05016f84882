//! Discrete Gaussian sampling over the integers.
//!
//! `SamplerZ(mu, sigma)` draws from the discrete Gaussian centered on `mu`
//! with standard deviation `sigma <= 1.8205`. A half-Gaussian base sampler
//! (reverse cumulative table, 72-bit precision) produces a candidate and a
//! Bernoulli trial with probability `exp(-x)` accepts or rejects it. The
//! exponential uses a fixed-point polynomial approximation so that the same
//! seed always gives the same output on every platform.
//!
//! The sampler is fed by a [`ShakePrng`]; it never touches the caller's
//! `RandomSource` directly.

use crate::random::ShakePrng;

/// `1 / (2 * 1.8205^2)`
const INV_2SQRSIGMA0: f64 = 0.150_865_048_875_372_721_532_312_163_019;

const LN2: f64 = 0.693_147_180_559_945_309_417_232_121_458;
const INV_LN2: f64 = 1.442_695_040_888_963_407_359_924_681_002;

/// Rejection rounds before a single draw gives up.
const MAX_ROUNDS: usize = 1024;

/// Reverse cumulative distribution of the half-Gaussian, scaled by 2^72.
const RCDT: [u128; 18] = [
    3_024_686_241_123_004_913_666,
    1_564_742_784_480_091_954_050,
    636_254_429_462_080_897_535,
    199_560_484_645_026_482_916,
    47_667_343_854_657_281_903,
    8_595_902_006_365_044_063,
    1_163_297_957_344_668_388,
    117_656_387_352_093_658,
    8_867_391_802_663_976,
    496_969_357_462_633,
    20_680_885_154_299,
    638_331_848_991,
    14_602_316_184,
    247_426_747,
    3_104_126,
    28_824,
    198,
    1,
];

/// Coefficients of the polynomial approximation of `exp(-x)` on `[0, ln 2)`,
/// scaled by 2^63.
const EXP_COEFFS: [u64; 13] = [
    0x0000_0004_7411_83A3,
    0x0000_0036_548C_FC06,
    0x0000_024F_DCBF_140A,
    0x0000_171D_939D_E045,
    0x0000_D00C_F58F_6F84,
    0x0006_8068_1CF7_96E3,
    0x002D_82D8_305B_0FEA,
    0x0111_1111_0E06_6FD0,
    0x0555_5555_5507_0F00,
    0x1555_5555_5581_FF00,
    0x4000_0000_0002_B400,
    0x7FFF_FFFF_FFFF_4800,
    0x8000_0000_0000_0000,
];

fn mulhi(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

/// `2^63 * ccs * exp(-x)` for `x` in `[0, ln 2)` and `ccs` in `[0, 1]`.
fn expm_p63(x: f64, ccs: f64) -> u64 {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    let z = ((x * TWO_POW_63) as u64) << 1;
    let mut y = EXP_COEFFS[0];
    for &c in &EXP_COEFFS[1..] {
        y = c.wrapping_sub(mulhi(z, y));
    }
    let z = ((ccs * TWO_POW_63) as u64) << 1;
    mulhi(z, y)
}

/// Sample `z0 >= 0` from the half-Gaussian of standard deviation 1.8205.
fn base_sample(prng: &mut ShakePrng) -> i32 {
    let mut bytes = [0u8; 9];
    prng.fill(&mut bytes);
    let mut lo = [0u8; 8];
    lo.copy_from_slice(&bytes[..8]);
    let u = u64::from_le_bytes(lo) as u128 | (bytes[8] as u128) << 64;
    RCDT.iter().filter(|&&threshold| u < threshold).count() as i32
}

/// Write `x = s ln 2 + r` with `r` in `[0, ln 2)`, then cap `s` at 63.
fn split_exponent(x: f64) -> (u32, f64) {
    let s = (x * INV_LN2) as i64;
    let r = x - s as f64 * LN2;
    (s.clamp(0, 63) as u32, r)
}

/// Bernoulli trial with success probability `ccs * exp(-x)`.
fn ber_exp(prng: &mut ShakePrng, x: f64, ccs: f64) -> bool {
    let (s, r) = split_exponent(x);
    let z = ((expm_p63(r, ccs) << 1).wrapping_sub(1)) >> s;

    let mut i = 64;
    loop {
        i -= 8;
        let w = prng.next_u8() as i32 - ((z >> i) & 0xFF) as i32;
        if w != 0 || i == 0 {
            return w < 0;
        }
    }
}

/// Draw an integer from the discrete Gaussian `D_{Z, mu, sigma}`.
///
/// `sigma_min` is the smallest standard deviation any caller uses for this
/// parameter set; it scales the acceptance probability so that the running
/// time does not depend on `sigma`. Returns `None` if no candidate was
/// accepted within a fixed number of rounds.
pub(crate) fn sample(prng: &mut ShakePrng, mu: f64, sigma: f64, sigma_min: f64) -> Option<i32> {
    let s = mu.floor();
    let r = mu - s;
    let dss = 1.0 / (2.0 * sigma * sigma);
    let ccs = sigma_min / sigma;

    for _ in 0..MAX_ROUNDS {
        let z0 = base_sample(prng);
        let b = (prng.next_u8() & 1) as i32;
        let z = b + (2 * b - 1) * z0;

        let dz = z as f64 - r;
        let x = dz * dz * dss - (z0 * z0) as f64 * INV_2SQRSIGMA0;
        if ber_exp(prng, x, ccs) {
            return Some(s as i32 + z);
        }
    }
    None
}
