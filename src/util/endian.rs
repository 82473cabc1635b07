//! Conversion between the file's little-endian byte order and host order.
//!
//! Bytes are unaffected, 16- and 32-bit values are byte-reversed on
//! big-endian hosts. Floats travel in the 32-bit lane as their bit pattern.

use byteorder::{ByteOrder, LittleEndian};

/// Decode little-endian 32-bit words into host order.
pub fn words_from_file(bytes: &[u8]) -> Vec<u32> {
    let mut out = vec![0u32; bytes.len() / 4];
    LittleEndian::read_u32_into(&bytes[..out.len() * 4], &mut out);
    out
}

/// Decode little-endian 16-bit values into host order.
pub fn halves_from_file(bytes: &[u8]) -> Vec<u16> {
    let mut out = vec![0u16; bytes.len() / 2];
    LittleEndian::read_u16_into(&bytes[..out.len() * 2], &mut out);
    out
}

/// Encode host-order 32-bit words as little-endian bytes.
pub fn words_to_file(words: &[u32], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + words.len() * 4, 0);
    LittleEndian::write_u32_into(words, &mut out[start..]);
}

/// Encode host-order 16-bit values as little-endian bytes.
pub fn halves_to_file(halves: &[u16], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + halves.len() * 2, 0);
    LittleEndian::write_u16_into(halves, &mut out[start..]);
}
