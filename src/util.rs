use crate::error::HexConvError;
use std::fmt::Write;

/// Formats a sequence of bytes as a `String` containing a hexadecimal blob
///
/// # Examples
///
/// ```
/// # use bsor::util::hex_of_bytes;
/// assert_eq!(hex_of_bytes(vec![0xde,0xad,0xbe,0xef]), String::from("deadbeef"));
/// ```
#[must_use]
pub fn hex_of_bytes<T>(val: T) -> String
where
    T: AsRef<[u8]>,
{
    let bytes = val.as_ref();
    let mut hex: String = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        // Writing into a String cannot fail.
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Attempt to parse a string-like type as a hexadecimal blob, returning
/// the sequence of bytes encoded if it is a valid hex-string.
///
/// # Examples
///
/// ```
/// # use bsor::util::bytes_of_hex;
/// assert_eq!(Ok(vec![0xde,0xad,0xbe,0xef]), bytes_of_hex("deadbeef"));
/// ```
pub fn bytes_of_hex<T>(src: &T) -> Result<Vec<u8>, HexConvError>
where
    T: AsRef<str> + ?Sized,
{
    let src: &str = src.as_ref();
    if src.len() % 2 != 0 {
        return Err(HexConvError::OddParity(src.to_owned()));
    }

    let n = src.len() / 2;
    let mut dst = Vec::with_capacity(n);

    for ix in 0..n {
        match src
            .get(ix * 2..(ix + 1) * 2)
            .filter(|pair| pair.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        {
            Some(word) => dst.push(word),
            None => return Err(HexConvError::NonHex(src.to_owned())),
        }
    }
    Ok(dst)
}
