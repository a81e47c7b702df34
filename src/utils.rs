//! Encoding helpers shared by the handlers.

use std::str;

use ring::constant_time::verify_slices_are_equal;

use crate::error::{Error, Result};

/// Characters of the standard base64 alphabet.
pub const B64_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard base64 alphabet plus the padding character.
pub const PADDED_B64_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Hexadecimal digits in either case.
pub const HEX_CHARS: &str = "0123456789abcdefABCDEF";

/// Lower-case hexadecimal digits.
pub const LOWER_HEX_CHARS: &str = "0123456789abcdef";

/// Encodes using the "adapted" base64 variant: the standard alphabet with `.` in place of `+`
/// and no trailing padding.
pub fn ab64_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::STANDARD_NO_PAD).replace('+', ".")
}

/// Decodes the output of [`ab64_encode`].
///
/// Input containing `+` or `=` is rejected; both are foreign to the adapted alphabet.
pub fn ab64_decode(data: &str) -> Option<Vec<u8>> {
    if data.bytes().any(|b| b == b'+' || b == b'=') {
        return None;
    }
    if data.len() % 4 == 1 {
        return None;
    }
    base64::decode_config(data.replace('.', "+"), base64::STANDARD_NO_PAD).ok()
}

/// Lower-case hexadecimal encoding.
pub fn hex_encode(data: &[u8]) -> String {
    let digits = LOWER_HEX_CHARS.as_bytes();
    let mut out = String::with_capacity(data.len() * 2);
    for &byte in data {
        out.push(char::from(digits[usize::from(byte >> 4)]));
        out.push(char::from(digits[usize::from(byte & 0x0f)]));
    }
    out
}

/// Compares two byte strings in time independent of where they differ.
///
/// Only the lengths leak; checksums of a given scheme have a public, fixed length.
pub fn consteq(left: &[u8], right: &[u8]) -> bool {
    verify_slices_are_equal(left, right).is_ok()
}

/// Bitwise XOR of two equal-length byte strings.
pub fn xor_bytes(left: &[u8], right: &[u8]) -> Vec<u8> {
    debug_assert_eq!(left.len(), right.len(), "xor_bytes operands differ in length");
    left.iter().zip(right).map(|(l, r)| l ^ r).collect()
}

/// Interprets `secret` as UTF-8 text.
pub fn to_unicode(secret: &[u8]) -> Result<&str> {
    str::from_utf8(secret).map_err(|_| Error::InvalidSecret("secret must be valid UTF-8"))
}

/// Splits a comma separated list, trimming whitespace and dropping empty elements.
pub fn splitcomma(source: &str) -> Vec<&str> {
    source
        .split(',')
        .map(str::trim)
        .filter(|elem| !elem.is_empty())
        .collect()
}

/// Returns the first byte of `value` not contained in `charset`, as a char.
pub(crate) fn first_foreign_char(value: &[u8], charset: &str) -> Option<char> {
    value
        .iter()
        .find(|b| !charset.as_bytes().contains(b))
        .map(|&b| char::from(b))
}
