//! Token emission over arbitrary [`Target`]s
//!
//! Every push written through this module takes the shortest form that
//! carries its item, which is what makes the encoding of a given value
//! unique.

use num_bigint::BigInt;

use super::num::int_to_item;
use super::{OP_0, OP_1, OP_1NEGATE, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use crate::conv::target::Target;

/// Extension trait for writing tokens to a [`Target`]
///
/// As with the `push_XXX` methods of `Target`, each method returns the
/// number of bytes written.
pub trait TokenSink: Target {
    /// Writes the minimal push of an arbitrary item
    fn push_item(&mut self, item: &[u8]) -> usize {
        let len = item.len();
        match item {
            [] => return self.push_one(OP_0),
            &[n @ 1..=16] => return self.push_one(OP_1 + n - 1),
            &[0x81] => return self.push_one(OP_1NEGATE),
            _ => {}
        }
        self.anticipate(len + 5);
        let prefix = if len < OP_PUSHDATA1 as usize {
            self.push_one(len as u8)
        } else if len <= 0xff {
            self.push_many([OP_PUSHDATA1, len as u8])
        } else if len <= 0xffff {
            self.push_one(OP_PUSHDATA2) + self.push_many((len as u16).to_le_bytes())
        } else {
            self.push_one(OP_PUSHDATA4) + self.push_many((len as u32).to_le_bytes())
        };
        prefix + self.push_all(item)
    }

    /// Writes an integer as the minimal push of its item
    fn push_int(&mut self, value: &BigInt) -> usize {
        self.push_item(&int_to_item(value))
    }

    /// Writes a small non-negative integer such as a count or field id
    fn push_u64(&mut self, value: u64) -> usize {
        self.push_int(&BigInt::from(value))
    }

    /// Writes the presence prefix of a nullable list slot
    fn push_presence(&mut self, present: bool) -> usize {
        self.push_one(if present { OP_1 } else { OP_0 })
    }
}

impl<T: Target + ?Sized> TokenSink for T {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conv::target::ByteCounter;
    use crate::token::{ScriptParser, TokenSource};
    use crate::util::hex_of_bytes;

    fn pushed(item: &[u8]) -> String {
        let mut buf = Vec::new();
        let n = buf.push_item(item);
        assert_eq!(n, buf.len());
        hex_of_bytes(buf)
    }

    #[test]
    fn minimal_pushes() {
        assert_eq!(pushed(&[]), "00");
        assert_eq!(pushed(&[0x00]), "0100");
        assert_eq!(pushed(&[0x01]), "51");
        assert_eq!(pushed(&[0x10]), "60");
        assert_eq!(pushed(&[0x11]), "0111");
        assert_eq!(pushed(&[0x81]), "4f");
        assert_eq!(pushed(b"hi"), "026869");
    }

    #[test]
    fn pushdata_boundaries() {
        assert!(pushed(&[7u8; 0x4b]).starts_with("4b07"));
        assert!(pushed(&[7u8; 0x4c]).starts_with("4c4c07"));
        assert!(pushed(&[7u8; 0x100]).starts_with("4d000107"));
        assert!(pushed(&[7u8; 0x10000]).starts_with("4e0000010007"));
    }

    #[test]
    fn pushes_parse_back() {
        let items: [&[u8]; 6] = [&[], &[3], &[0x81], &[0; 80], &[1; 300], b"abc"];
        let mut buf = Vec::new();
        for item in items {
            buf.push_item(item);
        }
        let mut p = ScriptParser::new(&buf);
        for item in items {
            assert_eq!(p.take_item().unwrap(), item);
        }
        assert!(p.is_exhausted());
    }

    #[test]
    fn counter_agrees() {
        let mut counter: ByteCounter = std::io::sink();
        assert_eq!(counter.push_int(&BigInt::from(-1000)), 3);
        assert_eq!(counter.push_u64(5), 1);
        assert_eq!(counter.push_presence(false), 1);
    }
}
