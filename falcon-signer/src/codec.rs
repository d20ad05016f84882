//! Byte encodings.
//!
//! | object      | header          | body                                          |
//! |-------------|-----------------|-----------------------------------------------|
//! | public key  | `0x00 + logn`   | `h`, 14 bits per coefficient                  |
//! | private key | `0x50 + logn`   | `f`, `g` on 6 (n=512) or 5 (n=1024) bits, `F` on 8 bits |
//! | signature   | `0x30 + logn`   | 40-byte nonce, then the compressed `s2`       |
//!
//! All bit strings are packed most-significant bit first. Decoders are
//! strict: a buffer is accepted only if re-encoding it gives the same bytes.

use zeroize::Zeroizing;

use crate::error::{FalconError, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::params::{ParameterSet, Q};

/// Largest magnitude a compressed coefficient may have.
const MAX_COMPRESSED_ABS: u32 = 2047;

struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    acc_len: u32,
}

impl BitWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            acc: 0,
            acc_len: 0,
        }
    }

    /// Append the low `bits` bits of `value` (`bits <= 24`).
    fn push(&mut self, value: u32, bits: u32) {
        self.acc = (self.acc << bits) | (value & ((1 << bits) - 1));
        self.acc_len += bits;
        while self.acc_len >= 8 {
            self.acc_len -= 8;
            self.out.push((self.acc >> self.acc_len) as u8);
        }
    }

    fn len(&self) -> usize {
        self.out.len() + usize::from(self.acc_len > 0)
    }

    /// Flush, padding the last byte with zero bits.
    fn finish(mut self) -> Vec<u8> {
        if self.acc_len > 0 {
            self.out.push((self.acc << (8 - self.acc_len)) as u8);
        }
        self.out
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    acc_len: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            acc_len: 0,
        }
    }

    /// Read `bits` bits (`bits <= 24`), or `None` past the end of input.
    fn read(&mut self, bits: u32) -> Option<u32> {
        while self.acc_len < bits {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u32;
            self.acc_len += 8;
        }
        self.acc_len -= bits;
        Some((self.acc >> self.acc_len) & ((1 << bits) - 1))
    }

    /// True when every byte was consumed and the leftover padding bits are zero.
    fn is_cleanly_exhausted(&self) -> bool {
        self.pos == self.data.len() && self.acc & ((1 << self.acc_len) - 1) == 0
    }
}

fn params_from_header(header: u8, tag: u8) -> Option<ParameterSet> {
    if header & 0xF0 != tag {
        return None;
    }
    ParameterSet::from_logn(header & 0x0F)
}

pub fn encode_public(key: &PublicKey) -> Vec<u8> {
    let params = key.params();
    let mut writer = BitWriter::with_capacity(params.public_key_len());
    writer.push(params.public_key_header() as u32, 8);
    for &h in key.coefficients() {
        writer.push(h as u32, 14);
    }
    writer.finish()
}

pub fn decode_public(bytes: &[u8]) -> Result<PublicKey> {
    let header = *bytes
        .first()
        .ok_or_else(|| FalconError::MalformedKey("empty public key".to_string()))?;
    let params = params_from_header(header, 0x00).ok_or_else(|| {
        FalconError::MalformedKey(format!("unrecognized public key header 0x{header:02x}"))
    })?;
    if bytes.len() != params.public_key_len() {
        return Err(FalconError::MalformedKey(format!(
            "Invalid public key length: expected {} bytes, got {}",
            params.public_key_len(),
            bytes.len()
        )));
    }

    let mut reader = BitReader::new(&bytes[1..]);
    let mut h = Vec::with_capacity(params.degree());
    for _ in 0..params.degree() {
        let value = reader
            .read(14)
            .ok_or_else(|| FalconError::MalformedKey("truncated public key".to_string()))?;
        if value >= Q {
            return Err(FalconError::MalformedKey(format!(
                "public key coefficient {value} out of range"
            )));
        }
        h.push(value as u16);
    }
    Ok(PublicKey::from_coefficients(params, h))
}

fn push_signed(writer: &mut BitWriter, values: &[i8], bits: u32) {
    for &v in values {
        writer.push(v as u8 as u32, bits);
    }
}

pub fn encode_private(key: &PrivateKey) -> Zeroizing<Vec<u8>> {
    let params = key.params();
    let mut writer = BitWriter::with_capacity(params.private_key_len());
    writer.push(params.private_key_header() as u32, 8);
    push_signed(&mut writer, key.f(), params.fg_bits());
    push_signed(&mut writer, key.g(), params.fg_bits());
    push_signed(&mut writer, key.big_f(), params.capital_fg_bits());
    Zeroizing::new(writer.finish())
}

fn read_signed(reader: &mut BitReader<'_>, n: usize, bits: u32) -> Result<Vec<i8>> {
    let forbidden = -(1i32 << (bits - 1));
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let raw = reader
            .read(bits)
            .ok_or_else(|| FalconError::MalformedKey("truncated private key".to_string()))?;
        // sign-extend
        let value = ((raw << (32 - bits)) as i32) >> (32 - bits);
        if value == forbidden {
            return Err(FalconError::MalformedKey(
                "private key coefficient uses the reserved value".to_string(),
            ));
        }
        out.push(value as i8);
    }
    Ok(out)
}

pub fn decode_private(bytes: &[u8]) -> Result<PrivateKey> {
    let header = *bytes
        .first()
        .ok_or_else(|| FalconError::MalformedKey("empty private key".to_string()))?;
    let params = params_from_header(header, 0x50).ok_or_else(|| {
        FalconError::MalformedKey(format!("unrecognized private key header 0x{header:02x}"))
    })?;
    if bytes.len() != params.private_key_len() {
        return Err(FalconError::MalformedKey(format!(
            "Invalid secret key length: expected {} bytes, got {}",
            params.private_key_len(),
            bytes.len()
        )));
    }

    let n = params.degree();
    let mut reader = BitReader::new(&bytes[1..]);
    let f = read_signed(&mut reader, n, params.fg_bits())?;
    let g = read_signed(&mut reader, n, params.fg_bits())?;
    let big_f = read_signed(&mut reader, n, params.capital_fg_bits())?;
    if !reader.is_cleanly_exhausted() {
        return Err(FalconError::MalformedKey(
            "trailing data in private key".to_string(),
        ));
    }
    Ok(PrivateKey::from_parts(params, f, g, big_f))
}

/// Golomb-Rice style compression of a signature vector.
///
/// Each coefficient is written as a sign bit, the seven low bits of its
/// magnitude, then the remaining high part in unary (that many zeros and a
/// terminating one). Returns `None` if a coefficient is out of range or the
/// result does not fit in `capacity` bytes.
pub(crate) fn compress(values: &[i32], capacity: usize) -> Option<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(capacity);
    for &v in values {
        let magnitude = v.unsigned_abs();
        if magnitude > MAX_COMPRESSED_ABS {
            return None;
        }
        writer.push(u32::from(v < 0), 1);
        writer.push(magnitude & 0x7F, 7);
        let high = magnitude >> 7;
        writer.push(1, high + 1);
        if writer.len() > capacity {
            return None;
        }
    }
    Some(writer.finish())
}

/// Inverse of [`compress`]; the whole input must be consumed.
pub(crate) fn decompress(data: &[u8], n: usize) -> Option<Vec<i32>> {
    let mut reader = BitReader::new(data);
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let negative = reader.read(1)? == 1;
        let mut magnitude = reader.read(7)?;
        while reader.read(1)? == 0 {
            magnitude += 128;
            if magnitude > MAX_COMPRESSED_ABS {
                return None;
            }
        }
        if negative && magnitude == 0 {
            return None;
        }
        let value = magnitude as i32;
        out.push(if negative { -value } else { value });
    }
    reader.is_cleanly_exhausted().then_some(out)
}
