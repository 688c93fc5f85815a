//! Token stream
//!
//! The codec never touches raw bytes directly; every scalar is carried as a
//! single *token*, which is either a push of some payload (an *item*) or any
//! other one-byte opcode. Tokens use the script push encoding, which is
//! already minimal: small numbers and the empty item collapse into single
//! opcodes, and longer payloads carry their own length prefix.
//!
//! # Layout
//!
//! This module defines [`Token`], the opcode constants the codec cares
//! about, the [`TokenSource`] trait that the decoder reads from, and
//! [`ScriptParser`], the implementation of `TokenSource` over a byte slice.
//! The sub-module [`num`] defines the integer layout of items, and [`sink`]
//! defines the write side as an extension of [`Target`].
//!
//! [`Target`]: crate::conv::target::Target

pub mod num;
pub mod sink;

use num_bigint::BigInt;
use tracing::trace;

use crate::error::{DecodeError, DecodeResult};

/// Pushes the empty item
pub const OP_0: u8 = 0x00;
/// Pushes the next `u8`-prefixed run of bytes
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Pushes the next `u16`-prefixed run of bytes
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Pushes the next `u32`-prefixed run of bytes
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Pushes the item `[0x81]`, i.e. the number `-1`
pub const OP_1NEGATE: u8 = 0x4f;
/// Pushes the item `[0x01]`
pub const OP_1: u8 = 0x51;
/// Pushes the item `[0x10]`
pub const OP_16: u8 = 0x60;

static SMALL_ITEMS: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
static NEGATIVE_ONE: [u8; 1] = [0x81];

/// A single token: an opcode, together with the item it pushes, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    op: u8,
    item: Option<&'a [u8]>,
}

impl<'a> Token<'a> {
    /// Constructs the token for a non-push opcode
    #[must_use]
    pub const fn opcode(op: u8) -> Self {
        Self { op, item: None }
    }

    /// Constructs a push token from its opcode and the item it pushes
    #[must_use]
    pub const fn push(op: u8, item: &'a [u8]) -> Self {
        Self {
            op,
            item: Some(item),
        }
    }

    #[must_use]
    pub const fn op(&self) -> u8 {
        self.op
    }

    /// Returns the pushed item, or `None` for opcodes that push nothing
    #[must_use]
    pub const fn item(&self) -> Option<&'a [u8]> {
        self.item
    }

    /// Returns the pushed item, failing on opcodes that push nothing
    pub fn payload(&self) -> DecodeResult<&'a [u8]> {
        self.item.ok_or(DecodeError::NullPayload { op: self.op })
    }
}

/// Sequential source of tokens
///
/// Implementors define [`next_token`](TokenSource::next_token); the typed
/// `take_*` helpers are built on top of it and should rarely need
/// overriding.
///
/// Reading is strictly forward: a token can only be observed by consuming
/// it. After any method returns an error the position of the source is
/// unspecified.
pub trait TokenSource {
    /// Consumes and returns the next token
    fn next_token(&mut self) -> DecodeResult<Token<'_>>;

    /// Number of bytes consumed so far
    fn offset(&self) -> usize;

    /// Number of bytes not yet consumed
    fn remainder(&self) -> usize;

    /// Returns `true` if no tokens remain
    fn is_exhausted(&self) -> bool {
        self.remainder() == 0
    }

    /// Consumes a push token and returns a copy of its item
    fn take_item(&mut self) -> DecodeResult<Vec<u8>> {
        Ok(self.next_token()?.payload()?.to_vec())
    }

    /// Consumes a push token and interprets its item as a signed integer
    fn take_int(&mut self) -> DecodeResult<BigInt> {
        Ok(num::item_to_int(self.next_token()?.payload()?))
    }

    /// Consumes an integer token that must be a non-negative `u64`
    ///
    /// `context` names what the integer is for, and is only used to
    /// describe the error if the value is out of range.
    fn take_u64(&mut self, context: &'static str) -> DecodeResult<u64> {
        let value = self.take_int()?;
        u64::try_from(&value).map_err(|_| DecodeError::OutOfRange { context, value })
    }

    /// Consumes the element- or field-count preceding a list or structure
    fn take_count(&mut self) -> DecodeResult<u64> {
        self.take_u64("count")
    }

    fn take_field_id(&mut self) -> DecodeResult<u64> {
        self.take_u64("field id")
    }

    /// Consumes the presence prefix of a nullable list slot
    ///
    /// Only `OP_0` (absent) and `OP_1` (present) are legal.
    fn take_presence(&mut self) -> DecodeResult<bool> {
        match self.next_token()?.op() {
            OP_0 => Ok(false),
            OP_1 => Ok(true),
            op => Err(DecodeError::InvalidPresence { op }),
        }
    }
}

/// Token parser over a borrowed byte slice
///
/// Items are returned as sub-slices of the original buffer, without copying.
#[derive(Debug, Clone)]
pub struct ScriptParser<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ScriptParser<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Consumes exactly `n` bytes, failing without consuming if fewer remain
    ///
    /// `start` is the offset of the token being parsed, for error reporting.
    fn consume(&mut self, start: usize, n: usize) -> DecodeResult<&'a [u8]> {
        let remaining = self.buf.len() - self.offset;
        if n > remaining {
            return Err(DecodeError::Truncated {
                offset: start,
                requested: n,
                remaining,
            });
        }
        let ret = &self.buf[self.offset..self.offset + n];
        self.offset += n;
        Ok(ret)
    }

    fn consume_arr<const N: usize>(&mut self, start: usize) -> DecodeResult<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.consume(start, N)?);
        Ok(arr)
    }
}

impl<'a> TokenSource for ScriptParser<'a> {
    fn next_token(&mut self) -> DecodeResult<Token<'_>> {
        let start = self.offset;
        let op = match self.buf.get(start) {
            Some(&op) => op,
            None => return Err(DecodeError::UnexpectedEnd { offset: start }),
        };
        self.offset += 1;

        let token = match op {
            OP_0 => Token::push(op, &[]),
            0x01..=0x4b => Token::push(op, self.consume(start, op as usize)?),
            OP_PUSHDATA1 => {
                let [len] = self.consume_arr::<1>(start)?;
                Token::push(op, self.consume(start, len as usize)?)
            }
            OP_PUSHDATA2 => {
                let len = u16::from_le_bytes(self.consume_arr::<2>(start)?);
                Token::push(op, self.consume(start, len as usize)?)
            }
            OP_PUSHDATA4 => {
                let len = u32::from_le_bytes(self.consume_arr::<4>(start)?);
                Token::push(op, self.consume(start, len as usize)?)
            }
            OP_1NEGATE => Token::push(op, &NEGATIVE_ONE),
            OP_1..=OP_16 => {
                let n = (op - OP_1) as usize;
                Token::push(op, &SMALL_ITEMS[n..=n])
            }
            _ => Token::opcode(op),
        };
        trace!(offset = start, op = token.op(), len = ?token.item().map(<[u8]>::len), "token");
        Ok(token)
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn remainder(&self) -> usize {
        self.buf.len() - self.offset
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::bytes_of_hex;

    fn tokens(hex: &str) -> Vec<(u8, Option<Vec<u8>>)> {
        let buf = bytes_of_hex(hex).unwrap();
        let mut p = ScriptParser::new(&buf);
        let mut ret = Vec::new();
        while !p.is_exhausted() {
            let tok = p.next_token().unwrap();
            ret.push((tok.op(), tok.item().map(<[u8]>::to_vec)));
        }
        ret
    }

    #[test]
    fn push_forms() {
        assert_eq!(
            tokens("00515f604f0203ff6a"),
            vec![
                (OP_0, Some(vec![])),
                (OP_1, Some(vec![1])),
                (0x5f, Some(vec![15])),
                (OP_16, Some(vec![16])),
                (OP_1NEGATE, Some(vec![0x81])),
                (0x02, Some(vec![0x03, 0xff])),
                (0x6a, None),
            ]
        );
    }

    #[test]
    fn pushdata_forms() {
        assert_eq!(tokens("4c02abcd"), vec![(OP_PUSHDATA1, Some(vec![0xab, 0xcd]))]);
        assert_eq!(tokens("4d0100ee"), vec![(OP_PUSHDATA2, Some(vec![0xee]))]);
        assert_eq!(tokens("4e00000000"), vec![(OP_PUSHDATA4, Some(vec![]))]);
    }

    #[test]
    fn truncated_push() {
        let buf = bytes_of_hex("0401020304").unwrap();
        let mut p = ScriptParser::new(&buf[..4]);
        assert!(matches!(
            p.next_token(),
            Err(DecodeError::Truncated {
                offset: 0,
                requested: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn exhausted() {
        let mut p = ScriptParser::new(&[]);
        assert!(matches!(
            p.next_token(),
            Err(DecodeError::UnexpectedEnd { offset: 0 })
        ));
    }

    #[test]
    fn typed_takes() {
        let buf = bytes_of_hex("02e803005152").unwrap();
        let mut p = ScriptParser::new(&buf);
        assert_eq!(p.take_count().unwrap(), 1000);
        assert!(!p.take_presence().unwrap());
        assert!(p.take_presence().unwrap());
        assert!(matches!(
            p.take_presence(),
            Err(DecodeError::InvalidPresence { op: 0x52 })
        ));
    }

    #[test]
    fn negative_count() {
        let mut p = ScriptParser::new(&[OP_1NEGATE]);
        assert!(matches!(
            p.take_count(),
            Err(DecodeError::OutOfRange { context: "count", .. })
        ));
    }
}
