//! Minimal Type-Length-Value walker.
//!
//! Some tag memory formats wrap NDEF messages in a TLV container together
//! with other metadata blocks. [`TlvReader`] yields the raw `(type, value)`
//! blocks; [`NdefRecord::parse_tlv`] picks out the NDEF message blocks and
//! turns them into one concatenated record chain.

use std::sync::Arc;

use log::debug;

use crate::record::NdefRecord;

/// NULL TLV: a single type byte, no length and no value.
pub const TLV_NULL: u8 = 0x00;
/// TLV block carrying one NDEF message.
pub const TLV_NDEF_MESSAGE: u8 = 0x03;
/// Terminator TLV: ends the stream.
pub const TLV_TERMINATOR: u8 = 0xFE;

/// Iterator over the `(type, value)` blocks of a TLV stream.
///
/// NULL TLVs are skipped and a Terminator ends the walk. A one-byte length
/// of 0xFF escapes to a two-byte big-endian length. Any truncation ends
/// the walk; blocks seen before it are unaffected.
pub struct TlvReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TlvReader<'a> {
    pub fn new(buf: &'a [u8]) -> TlvReader<'a> {
        TlvReader { buf, pos: 0 }
    }

    /// Reads a length field: one byte, or 0xFF followed by two big-endian
    /// bytes.
    fn read_len(&mut self) -> Option<usize> {
        let &first = self.buf.get(self.pos)?;
        if first == 0xFF {
            let ext = self.buf.get(self.pos + 1..self.pos + 3)?;
            self.pos += 3;
            Some(u16::from_be_bytes([ext[0], ext[1]]) as usize)
        } else {
            self.pos += 1;
            Some(first as usize)
        }
    }
}

impl<'a> Iterator for TlvReader<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<(u8, &'a [u8])> {
        while self.pos < self.buf.len() {
            let t = self.buf[self.pos];
            self.pos += 1;
            if t == TLV_NULL {
                continue;
            }
            if t == TLV_TERMINATOR {
                break;
            }

            let Some(len) = self.read_len() else {
                debug!("TLV stream truncated inside a length field");
                break;
            };
            if self.buf.len() - self.pos < len {
                debug!("TLV value runs past the end of the stream");
                break;
            }
            let value = &self.buf[self.pos..self.pos + len];
            self.pos += len;
            return Some((t, value));
        }
        // Terminator, truncation or end of input: park at the end so the
        // iterator stays fused.
        self.pos = self.buf.len();
        None
    }
}

impl NdefRecord {
    /// Parses every NDEF message embedded in a TLV stream and returns the
    /// chains concatenated in stream order.
    ///
    /// Blocks of other types are passed over. An NDEF message block with a
    /// zero-length value contributes the empty record, the same way
    /// [`NdefRecord::parse`] treats zero-length input.
    pub fn parse_tlv(tlv: &[u8]) -> Option<Arc<NdefRecord>> {
        let mut records = Vec::new();
        for (t, value) in TlvReader::new(tlv) {
            if t != TLV_NDEF_MESSAGE {
                continue;
            }
            if value.is_empty() {
                records.push(NdefRecord::empty());
            } else {
                records.extend(NdefRecord::parse_records(value));
            }
        }
        NdefRecord::link(records)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::record::{RecordFlags, Rtd, TypeNameFormat};

    #[test]
    fn test_walk_blocks() {
        // NULL, a proprietary block, an NDEF block, then a Terminator
        let bytes = hex!("00 FD 02 0A 0B 03 01 0C FE 03 01 0D");
        let blocks: Vec<_> = TlvReader::new(&bytes).collect();
        assert_eq!(blocks, vec![(0xFD, &hex!("0A 0B")[..]), (0x03, &hex!("0C")[..])]);
    }

    #[test]
    fn test_walk_extended_length() {
        let mut bytes = hex!("03 FF 01 00").to_vec();
        bytes.extend_from_slice(&[0xAA; 256]);
        let blocks: Vec<_> = TlvReader::new(&bytes).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0, TLV_NDEF_MESSAGE);
        assert_eq!(blocks[0].1.len(), 256);
    }

    #[test]
    fn test_walk_zero_length_block() {
        let blocks: Vec<_> = TlvReader::new(&hex!("05 00 FE")).collect();
        assert_eq!(blocks, vec![(0x05, &[][..])]);
    }

    #[test_log::test]
    fn test_walk_stops_on_truncation() {
        // Length byte missing
        assert_eq!(TlvReader::new(&hex!("05")).count(), 0);
        // Extended length bytes missing
        assert_eq!(TlvReader::new(&hex!("05 FF 01")).count(), 0);
        // Value runs past the end
        assert_eq!(TlvReader::new(&hex!("05 04 0A 0B")).count(), 0);
        // Blocks before the truncation still come out
        let blocks: Vec<_> = TlvReader::new(&hex!("05 01 0A 06 04 0B")).collect();
        assert_eq!(blocks, vec![(0x05, &hex!("0A")[..])]);
    }

    #[test]
    fn test_parse_tlv_single_message() {
        let bytes = hex!("03 0C D1 01 08 55 01 6E 66 63 2E 63 6F 6D FE");
        let head = NdefRecord::parse_tlv(&bytes).unwrap();
        assert_eq!(head.iter().count(), 1);
        assert_eq!(head.as_uri().unwrap().uri(), "http://www.nfc.com");
    }

    #[test]
    fn test_parse_tlv_concatenates_messages() {
        // Two NDEF message blocks separated by a proprietary block
        let bytes = hex!("03 04 D1 01 00 78 FD 01 55 03 04 D1 01 00 79 FE");
        let head = NdefRecord::parse_tlv(&bytes).unwrap();
        let chain: Vec<_> = head.iter().collect();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].record_type(), b"x");
        assert_eq!(chain[1].record_type(), b"y");
        // MB/ME are reported as observed on the wire, per message
        assert_eq!(chain[0].flags(), RecordFlags { first: true, last: true });
        assert_eq!(chain[1].flags(), RecordFlags { first: true, last: true });
    }

    #[test]
    fn test_parse_tlv_ignores_blocks_after_terminator() {
        let bytes = hex!("FE 03 04 D1 01 00 78");
        assert!(NdefRecord::parse_tlv(&bytes).is_none());
    }

    #[test]
    fn test_parse_tlv_empty_message_block() {
        let head = NdefRecord::parse_tlv(&hex!("03 00 FE")).unwrap();
        assert_eq!(head.iter().count(), 1);
        assert_eq!(head.tnf(), TypeNameFormat::Empty);
        assert_eq!(head.rtd(), Rtd::Unknown);
    }

    #[test]
    fn test_parse_tlv_without_ndef_blocks() {
        assert!(NdefRecord::parse_tlv(&hex!("FD 02 0A 0B FE")).is_none());
        assert!(NdefRecord::parse_tlv(&[]).is_none());
    }
}
