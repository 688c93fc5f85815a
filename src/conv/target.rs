//! Byte sinks for the encoder
//!
//! Every encoding function is generic over [`Target`]. Token emission is
//! layered on top of it by [`TokenSink`](crate::token::sink::TokenSink).

/// Append-only byte buffer
///
/// Unlike [`std::io::Write`], pushes cannot fail. The returned counts are
/// summed by the encoder into the encoded length of a structure, so each
/// push must return exactly the number of bytes it appended.
pub trait Target {
    /// Reserves room for `extra` more bytes, where that means anything
    fn anticipate(&mut self, extra: usize);

    fn create() -> Self
    where
        Self: Sized;

    /// Appends one byte, returning `1`
    fn push_one(&mut self, b: u8) -> usize;

    /// Appends an array, returning `N`
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    /// Appends a slice, returning its length
    fn push_all(&mut self, buf: &[u8]) -> usize;
}

/// Sink that only counts, used by [`encoded_len`](crate::encoded_len)
pub type ByteCounter = std::io::Sink;

impl Target for ByteCounter {
    #[inline(always)]
    fn anticipate(&mut self, _: usize) {}

    #[inline]
    fn create() -> Self {
        std::io::sink()
    }

    #[inline(always)]
    fn push_one(&mut self, _: u8) -> usize {
        1
    }

    #[inline(always)]
    fn push_many<const N: usize>(&mut self, _: [u8; N]) -> usize {
        N
    }

    #[inline(always)]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        buf.len()
    }
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn create() -> Self {
        Self::new()
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.extend_from_slice(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}
