//! Polynomial arithmetic.
//!
//! - [`modq`]: exact arithmetic in `Z_q[x]/(x^n + 1)` (public key, verification)
//! - [`fft`]: floating-point arithmetic in `R[x]/(x^n + 1)` (sampling, reduction)

pub(crate) mod fft;
pub(crate) mod modq;
