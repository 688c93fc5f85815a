//! Fixed-width byte-strings
//!
//! [`FixedBytes<N>`] is the fixed-width analogue of [`Bytes`]: a field of
//! this type resolves to a Bytes descriptor with fixed length `N`, and its
//! payload is checked to be exactly `N` bytes wide when decoded.
//!
//! [`Bytes`]: crate::value::Bytes

use std::borrow::Borrow;

#[cfg(feature = "serde_impls")]
use serde::Serialize;

use crate::error::{DecodeError, DecodeResult, WidthError};
use crate::value::{FieldValue, Value};

/// Simple type for holding fixed-length binary sequences.
///
/// While [FixedBytes<N>] is naturally implemented around `[u8; N]`,
/// it is preferable to use this type instead, as `[u8; N]` is read by the
/// schema as a fixed-length *list* of `N` integers, each carried as its own
/// token, whereas `FixedBytes<N>` travels as a single push.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FixedBytes<const N: usize>([u8; N]);

#[cfg(feature = "serde_impls")]
impl<const N: usize> Serialize for FixedBytes<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<const N: usize> FixedBytes<N> {
    /// Constructs a [`FixedBytes<N>`] from a byte-array of length `N`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bsor::fixed::FixedBytes;
    /// assert_eq!(FixedBytes::from_array([1, 2, 3u8]).bytes(), &[1, 2, 3u8]);
    /// ```
    #[inline(always)]
    #[must_use]
    pub const fn from_array(arr: [u8; N]) -> FixedBytes<N> {
        Self(arr)
    }

    /// Returns an immutable reference to the raw bytes of this [`FixedBytes<N>`].
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Attempts to construct a [`FixedBytes<N>`] by copying the bytes of a
    /// byte-slice whose length is presumptively equal to `N`.
    ///
    /// # Errors
    ///
    /// Returns [`WidthError::WrongWidth`] if `bytes.len() != N`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bsor::fixed::FixedBytes;
    /// assert!(FixedBytes::<2>::try_from_slice(&[0xde, 0xad]).is_ok());
    /// assert!(FixedBytes::<2>::try_from_slice(&[0xde]).is_err());
    /// ```
    pub fn try_from_slice(bytes: &'_ [u8]) -> Result<FixedBytes<N>, WidthError> {
        <[u8; N]>::try_from(bytes)
            .map(Self)
            .map_err(|_| WidthError::WrongWidth {
                exact: N,
                actual: bytes.len(),
            })
    }

    /// Returns the length, in bytes, of this [FixedBytes<N>].
    ///
    /// # Note
    ///
    /// The return value will always be equal to `N`.
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    #[inline(always)]
    #[must_use]
    pub const fn to_array(self) -> [u8; N] {
        self.0
    }

    /// Returns a freshly-allocated [Vec<u8>] holding the binary contents of this [FixedBytes<N>].
    #[inline(always)]
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Borrow<[u8]> for FixedBytes<N> {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(value: [u8; N]) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<FixedBytes<N>> for [u8; N] {
    fn from(bytes: FixedBytes<N>) -> Self {
        bytes.0
    }
}

impl<const N: usize> TryFrom<&'_ [u8]> for FixedBytes<N> {
    type Error = WidthError;

    fn try_from(value: &'_ [u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(value)
    }
}

impl<const N: usize> FieldValue for FixedBytes<N> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.0.into())
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Bytes(bytes) => Ok(Self::try_from_slice(&bytes)?),
            other => Err(DecodeError::ValueMismatch {
                expected: "bytes",
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Bytes;

    #[test]
    fn width_checked() {
        let value = Value::Bytes(Bytes::from([1u8, 2, 3, 4]));
        assert_eq!(
            FixedBytes::<4>::from_value(value.clone()).unwrap().to_array(),
            [1, 2, 3, 4]
        );
        assert!(matches!(
            FixedBytes::<5>::from_value(value),
            Err(DecodeError::Width(WidthError::WrongWidth {
                exact: 5,
                actual: 4
            }))
        ));
    }

    #[test]
    fn to_value_is_bytes() {
        let fb = FixedBytes::from_array(*b"abc");
        assert_eq!(fb.to_value(), Value::Bytes(Bytes::from(b"abc")));
    }
}
