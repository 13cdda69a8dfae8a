//! Small lexical helpers for decimal and hex digit recognition, reusing the
//! teacher crate's `nom`-based approach to parameter parsing (its
//! `raw.rs::signed_int_raw`/`str_to_int`) but adding saturating-on-overflow
//! behavior, since real-world RTF occasionally embeds parameters well past
//! `i32` range and the spec requires clamping rather than erroring.

use nom::character::complete::{digit1, hex_digit1};
use nom::combinator::all_consuming;

/// Accumulate an `i32` from an ASCII-digit byte slice, saturating at the
/// signed 32-bit bounds on overflow instead of erroring.
///
/// `digits` must already be validated as a non-empty run of ASCII digits;
/// this is re-checked with `nom`'s `digit1` as a defensive measure so a
/// caller bug surfaces as `0` rather than a panic.
pub fn saturating_parse_i32(negative: bool, digits: &[u8]) -> i32 {
    let validated: Result<(&[u8], &[u8]), nom::Err<nom::error::Error<&[u8]>>> =
        all_consuming(digit1::<&[u8], nom::error::Error<&[u8]>>)(digits);
    let Ok((_, digits)) = validated else { return 0 };

    let mut acc: i64 = 0;
    for &b in digits {
        acc = acc.saturating_mul(10).saturating_add(i64::from(b - b'0'));
        acc = acc.min(i32::MAX as i64 + 1);
    }
    if negative {
        (-acc).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    } else {
        acc.min(i32::MAX as i64) as i32
    }
}

/// Decode a validated two-byte hex digit pair (`\'HH`) into its byte value.
pub fn decode_hex_pair(bytes: [u8; 2]) -> Option<u8> {
    let validated: Result<(&[u8], &[u8]), nom::Err<nom::error::Error<&[u8]>>> =
        all_consuming(hex_digit1::<&[u8], nom::error::Error<&[u8]>>)(&bytes);
    validated.ok()?;
    let s = std::str::from_utf8(&bytes).ok()?;
    u8::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(saturating_parse_i32(false, b"1234"), 1234);
    }

    #[test]
    fn parses_negative() {
        assert_eq!(saturating_parse_i32(true, b"5"), -5);
    }

    #[test]
    fn saturates_on_overflow() {
        assert_eq!(saturating_parse_i32(false, b"99999999999999999999"), i32::MAX);
        assert_eq!(saturating_parse_i32(true, b"99999999999999999999"), i32::MIN);
    }

    #[test]
    fn decodes_hex_pair() {
        assert_eq!(decode_hex_pair(*b"e2"), Some(0xe2));
        assert_eq!(decode_hex_pair(*b"FF"), Some(0xff));
        assert_eq!(decode_hex_pair(*b"zz"), None);
    }
}
