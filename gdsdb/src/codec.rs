//!
//! # Gds Primitive Codec
//!
//! Big-endian fixed-width integers, GDSII's eight-byte floating-point format,
//! and even-padded ASCII strings: the payload primitives of every GDSII record.
//!
//! Each reader fails only on short or otherwise unreadable input, reported as a [GdsError::Stream].
//!

// Std-Lib Imports
use std::io::{Read, Write};

// Crates.io
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

// Local Imports
use crate::data::GdsFloat64;
use crate::error::{GdsError, GdsResult};

/// Read a big-endian `i16`
pub fn read_i16(rd: &mut impl Read) -> GdsResult<i16> {
    Ok(rd.read_i16::<BigEndian>()?)
}
/// Write a big-endian `i16`
pub fn write_i16(wr: &mut impl Write, val: i16) -> GdsResult<()> {
    Ok(wr.write_i16::<BigEndian>(val)?)
}
/// Read a big-endian `i32`
pub fn read_i32(rd: &mut impl Read) -> GdsResult<i32> {
    Ok(rd.read_i32::<BigEndian>()?)
}
/// Write a big-endian `i32`
pub fn write_i32(wr: &mut impl Write, val: i32) -> GdsResult<()> {
    Ok(wr.write_i32::<BigEndian>(val)?)
}
/// Read an eight-byte GDSII float, converted to `f64`
pub fn read_f64(rd: &mut impl Read) -> GdsResult<f64> {
    Ok(GdsFloat64::decode(rd.read_u64::<BigEndian>()?))
}
/// Write `val` in GDSII's eight-byte float format
pub fn write_f64(wr: &mut impl Write, val: f64) -> GdsResult<()> {
    Ok(wr.write_u64::<BigEndian>(GdsFloat64::encode(val))?)
}
/// Read exactly `len` bytes as an ASCII string.
/// NUL bytes, whether padding or embedded, are dropped.
pub fn read_str(rd: &mut impl Read, len: usize) -> GdsResult<String> {
    let mut bytes = vec![0; len];
    rd.read_exact(&mut bytes)?;
    bytes.retain(|b| *b != 0x00);
    Ok(String::from_utf8(bytes).map_err(|e| e.utf8_error())?)
}
/// Write string `s`, padding with a single NUL byte to an even length
pub fn write_str(wr: &mut impl Write, s: &str) -> GdsResult<()> {
    wr.write_all(s.as_bytes())?;
    if s.len() % 2 != 0 {
        wr.write_u8(0x00)?;
    }
    Ok(())
}
/// Encoded length of string `s`, including any padding
pub fn gds_strlen(s: &str) -> usize {
    s.len() + s.len() % 2
}

/// Decode a byte-slice into `i16`s. Fails if `bytes` does not hold exactly `N` of them.
pub fn decode_i16s<const N: usize>(bytes: &[u8]) -> GdsResult<[i16; N]> {
    if bytes.len() != 2 * N {
        return Err(GdsError::Str(format!(
            "Expected {} bytes of i16 data, found {}",
            2 * N,
            bytes.len()
        )));
    }
    let mut rv = [0; N];
    let mut rd = bytes;
    rd.read_i16_into::<BigEndian>(&mut rv)?;
    Ok(rv)
}
/// Decode a byte-slice into GDSII floats. Fails if `bytes` does not hold exactly `N` of them.
pub fn decode_f64s<const N: usize>(bytes: &[u8]) -> GdsResult<[f64; N]> {
    if bytes.len() != 8 * N {
        return Err(GdsError::Str(format!(
            "Expected {} bytes of f64 data, found {}",
            8 * N,
            bytes.len()
        )));
    }
    let mut rv = [0.0; N];
    let mut rd = bytes;
    for val in rv.iter_mut() {
        *val = read_f64(&mut rd)?;
    }
    Ok(rv)
}
