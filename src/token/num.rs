//! Minimal signed integer items
//!
//! Integers travel as the payload of an ordinary push token, using the
//! little-endian sign-magnitude layout of script numbers: the magnitude is
//! written least-significant byte first, and the sign occupies the top bit
//! of the final byte. When the magnitude itself already needs that bit, an
//! extra `0x00` (positive) or `0x80` (negative) byte is appended. Zero is the
//! empty item.
//!
//! Values are arbitrary-precision, as nothing in the format bounds the
//! width of an integer item.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;

/// Returns the number of bytes in the minimal item encoding `value`
#[must_use]
pub fn item_len(value: &BigInt) -> usize {
    match value.sign() {
        Sign::NoSign => 0,
        // One extra bit is needed for the sign.
        _ => Integer::div_ceil(&(value.bits() + 1), &8) as usize,
    }
}

/// Encodes `value` as the shortest item that decodes back to it
#[must_use]
pub fn int_to_item(value: &BigInt) -> Vec<u8> {
    let (sign, magnitude) = value.to_bytes_le();
    if sign == Sign::NoSign {
        return Vec::new();
    }
    let negative = sign == Sign::Minus;

    let mut item = Vec::with_capacity(item_len(value));
    item.extend_from_slice(&magnitude);

    match item.last_mut() {
        Some(top) if *top & 0x80 != 0 => item.push(if negative { 0x80 } else { 0x00 }),
        Some(top) => {
            if negative {
                *top |= 0x80;
            }
        }
        None => unreachable!("non-zero BigInt with empty magnitude"),
    }
    debug_assert_eq!(item.len(), item_len(value));
    item
}

/// Interprets an item as a signed integer
///
/// Non-minimal items are accepted, including negative zero.
#[must_use]
pub fn item_to_int(item: &[u8]) -> BigInt {
    let Some((&top, _)) = item.split_last() else {
        return BigInt::default();
    };
    let mut magnitude = item.to_vec();
    if let Some(last) = magnitude.last_mut() {
        *last &= 0x7f;
    }
    let sign = if top & 0x80 != 0 {
        Sign::Minus
    } else {
        Sign::Plus
    };
    BigInt::from_biguint(sign, BigUint::from_bytes_le(&magnitude))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::hex_of_bytes;

    fn check(value: i64, hex: &str) {
        let n = BigInt::from(value);
        assert_eq!(hex_of_bytes(int_to_item(&n)), hex, "encoding {value}");
        assert_eq!(item_to_int(&int_to_item(&n)), n, "decoding {hex}");
        assert_eq!(item_len(&n), hex.len() / 2);
    }

    #[test]
    fn script_numbers() {
        check(0, "");
        check(1, "01");
        check(-1, "81");
        check(16, "10");
        check(127, "7f");
        check(128, "8000");
        check(-128, "8080");
        check(255, "ff00");
        check(256, "0001");
        check(-256, "0081");
        check(32767, "ff7f");
        check(32768, "008000");
        check(i64::MAX, "ffffffffffffff7f");
        check(i64::MIN + 1, "ffffffffffffffff");
    }

    #[test]
    fn lenient_items() {
        assert_eq!(item_to_int(&[0x80]), BigInt::default());
        assert_eq!(item_to_int(&[0x00, 0x00]), BigInt::default());
        assert_eq!(item_to_int(&[0x05, 0x00, 0x00]), BigInt::from(5));
        assert_eq!(item_to_int(&[0x05, 0x00, 0x80]), BigInt::from(-5));
    }

    #[test]
    fn beyond_i64() {
        let big = BigInt::from(u64::MAX) * BigInt::from(4);
        assert_eq!(item_to_int(&int_to_item(&big)), big);
        assert_eq!(item_to_int(&int_to_item(&-big.clone())), -big);
    }
}
