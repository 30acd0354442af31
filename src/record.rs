use std::sync::Arc;

use log::{debug, warn};
use packed_struct::prelude::*;
use thiserror::Error;

use crate::bytes::Span;

pub mod text;
pub mod uri;

pub use text::{TextEncoding, TextRecord};
pub use uri::UriRecord;

/// PAYLOAD_LENGTH values at or above this are treated as hostile frames.
const MAX_PAYLOAD_LEN: u32 = 1 << 31;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Input buffer is too short for an NDEF record")]
    BufferTooSmall,
    #[error("Invalid record header, could not unpack")]
    InvalidHeader,
    #[error("Payload length {0} exceeds the supported maximum")]
    PayloadTooBig(u64),
    #[error("Record is truncated, need {required} bytes, have {available}")]
    Truncated { required: usize, available: usize },
    #[error("Record type is longer than 255 bytes")]
    TypeTooLong,
    #[error("Language code is longer than 63 bytes")]
    LanguageTooLong,
    #[error("Language code must be ASCII")]
    InvalidLanguage,
}

/// Type Name Format (TNF) field that defines how to interpret the TYPE field.
#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeNameFormat {
    Empty = 0x00,
    WellKnown = 0x01,
    MediaType = 0x02,
    AbsoluteUri = 0x03,
    External = 0x04,
    Unknown = 0x05,
    Unchanged = 0x06,
    Reserved = 0x07,
}

impl TypeNameFormat {
    /// The reserved TNF value is treated as `Unknown` once a record is built.
    fn clamped(self) -> Self {
        match self {
            TypeNameFormat::Reserved => TypeNameFormat::Unknown,
            tnf => tnf,
        }
    }
}

/// NDEF record header byte
#[derive(PackedStruct, PartialEq, Eq, Debug, Clone)]
#[packed_struct(size_bytes = "1", bit_numbering = "lsb0")]
pub struct RecordHeader {
    /// Type Name Format (TNF) field that defines how to interpret the type field
    #[packed_field(bits = "0..3", ty = "enum")]
    pub tnf: TypeNameFormat,
    /// Indicates whether the record contains an ID field
    #[packed_field(bits = "3")]
    pub il: bool,
    /// The Short Record (SR) bit flag determines the length of the payload
    /// length field: one byte if set, otherwise four bytes big-endian.
    #[packed_field(bits = "4")]
    pub sr: bool,
    /// The Chunk Flag indicates that the payload continues in a following chunk.
    #[packed_field(bits = "5")]
    pub cf: bool,
    /// The Message End flag marks the last record in the message.
    #[packed_field(bits = "6")]
    pub me: bool,
    /// The Message Begin flag marks the first record in the message.
    #[packed_field(bits = "7")]
    pub mb: bool,
}

/// Record Type Definition tag for NFC Forum well-known types.
///
/// Only the URI and Text payloads are decoded by this crate; the remaining
/// tags classify the record for higher layers and leave the payload alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rtd {
    Unknown,
    Uri,
    Text,
    SmartPoster,
    HandoverRequest,
    HandoverSelect,
    HandoverCarrier,
    AlternativeCarrier,
    CollisionResolution,
    Error,
}

impl Rtd {
    /// Classifies the TYPE field. Only well-known records get a tag; every
    /// other TNF maps to `Unknown`.
    fn classify(tnf: TypeNameFormat, record_type: &[u8]) -> Rtd {
        if tnf != TypeNameFormat::WellKnown {
            return Rtd::Unknown;
        }
        match record_type {
            b"U" => Rtd::Uri,
            b"T" => Rtd::Text,
            b"Sp" => Rtd::SmartPoster,
            b"Hr" => Rtd::HandoverRequest,
            b"Hs" => Rtd::HandoverSelect,
            b"Hc" => Rtd::HandoverCarrier,
            b"ac" => Rtd::AlternativeCarrier,
            b"cr" => Rtd::CollisionResolution,
            b"err" => Rtd::Error,
            _ => Rtd::Unknown,
        }
    }
}

/// Position of a record within its message, as observed on the wire.
///
/// The parser reports MB/ME exactly as received and never repairs
/// mis-flagged chains; that policy belongs to higher layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordFlags {
    /// MB was set: first record of the message.
    pub first: bool,
    /// ME was set: last record of the message.
    pub last: bool,
}

/// Wire layout of a single record, computed before any bytes are copied.
///
/// Offsets index the byte block the layout was parsed from; `total` is the
/// record's full wire size and is how far the caller's cursor advances.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    pub header: RecordHeader,
    /// Full wire size of the record, header through end of payload.
    pub total: usize,
    /// Offset of the TYPE field from the start of the record.
    pub type_off: usize,
    pub type_len: usize,
    pub id_len: usize,
    pub payload_len: usize,
}

impl RecordLayout {
    /// Parses one record header from the start of `bytes`.
    ///
    /// Succeeds only if the whole record, through the end of its payload,
    /// fits in `bytes`. Nothing is copied; the caller slices fields out of
    /// the block with the returned offsets and advances by [`total`].
    ///
    /// # Errors
    /// Returns a `RecordError` if the input is shorter than the minimum
    /// three-byte record, the payload length fails the sanity bound, or the
    /// declared fields run past the end of the input.
    ///
    /// [`total`]: RecordLayout::total
    pub fn parse(bytes: &[u8]) -> Result<RecordLayout, RecordError> {
        // Minimum legal record: header + type length + short payload length
        if bytes.len() < 3 {
            return Err(RecordError::BufferTooSmall);
        }

        let header = RecordHeader::unpack(&[bytes[0]]).map_err(|_| RecordError::InvalidHeader)?;
        let type_len = bytes[1] as usize;

        // Payload length is one byte in short form, four bytes big-endian otherwise
        let (payload_len, len_size) = if header.sr {
            (bytes[2] as u32, 1)
        } else {
            if bytes.len() < 6 {
                return Err(RecordError::BufferTooSmall);
            }
            let mut len = [0u8; 4];
            len.copy_from_slice(&bytes[2..6]);
            (u32::from_be_bytes(len), 4)
        };
        if payload_len >= MAX_PAYLOAD_LEN {
            return Err(RecordError::PayloadTooBig(payload_len as u64));
        }

        let mut offset = 2 + len_size;
        let id_len = if header.il {
            if bytes.len() < offset + 1 {
                return Err(RecordError::BufferTooSmall);
            }
            let id_len = bytes[offset] as usize;
            offset += 1;
            id_len
        } else {
            0
        };

        let type_off = offset;
        let total = offset + type_len + id_len + payload_len as usize;
        if total > bytes.len() {
            return Err(RecordError::Truncated {
                required: total,
                available: bytes.len(),
            });
        }

        Ok(RecordLayout {
            header,
            total,
            type_off,
            type_len,
            id_len,
            payload_len: payload_len as usize,
        })
    }
}

/// Decoded payload of a recognized well-known record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordContent {
    /// No decoded payload beyond the common fields.
    Generic,
    Uri(UriRecord),
    Text(TextRecord),
}

/// A parsed NDEF record, one node of a singly linked message chain.
///
/// Each record owns a copy of exactly its own wire bytes; the TYPE, ID and
/// PAYLOAD accessors borrow into that buffer. Records are immutable once
/// built, and chains share nodes through [`Arc`], so a chain can be handed
/// across threads and is freed from the head down when the last reference
/// goes away.
///
/// # Example
/// ```ignore
/// let head = NdefRecord::parse(&tag_bytes).unwrap();
/// for rec in head.iter() {
///     println!("{:?} {:?}", rec.tnf(), rec.rtd());
/// }
/// ```
#[derive(Debug, PartialEq)]
pub struct NdefRecord {
    tnf: TypeNameFormat,
    rtd: Rtd,
    flags: RecordFlags,
    raw: Box<[u8]>,
    typ: Span,
    id: Span,
    payload: Span,
    content: RecordContent,
    next: Option<Arc<NdefRecord>>,
}

impl NdefRecord {
    /// The empty NDEF message: a single record with TNF `Empty` and no
    /// type, ID or payload.
    pub(crate) fn empty() -> NdefRecord {
        NdefRecord {
            tnf: TypeNameFormat::Empty,
            rtd: Rtd::Unknown,
            flags: RecordFlags::default(),
            raw: Box::default(),
            typ: Span::EMPTY,
            id: Span::EMPTY,
            payload: Span::EMPTY,
            content: RecordContent::Generic,
            next: None,
        }
    }

    /// Builds one record from a parsed layout.
    ///
    /// `bytes` is the block the layout was parsed from; the record copies
    /// its `layout.total` leading bytes. Never fails: a payload that does
    /// not decode as its advertised well-known type leaves the record
    /// generic with `Rtd::Unknown`.
    fn from_layout(bytes: &[u8], layout: &RecordLayout) -> NdefRecord {
        let raw: Box<[u8]> = bytes[..layout.total].into();
        let typ = Span::new(layout.type_off, layout.type_len);
        let id = Span::new(typ.end(), layout.id_len);
        let payload = Span::new(id.end(), layout.payload_len);

        let tnf = layout.header.tnf.clamped();
        let (rtd, content) = match Rtd::classify(tnf, typ.slice_of(&raw)) {
            Rtd::Uri => match UriRecord::decode(payload.slice_of(&raw)) {
                Some(rec) => (Rtd::Uri, RecordContent::Uri(rec)),
                None => {
                    debug!("URI payload does not decode, keeping record generic");
                    (Rtd::Unknown, RecordContent::Generic)
                }
            },
            Rtd::Text => match TextRecord::decode(payload.slice_of(&raw)) {
                Some(rec) => (Rtd::Text, RecordContent::Text(rec)),
                None => {
                    debug!("Text payload does not decode, keeping record generic");
                    (Rtd::Unknown, RecordContent::Generic)
                }
            },
            rtd => (rtd, RecordContent::Generic),
        };

        NdefRecord {
            tnf,
            rtd,
            flags: RecordFlags {
                first: layout.header.mb,
                last: layout.header.me,
            },
            raw,
            typ,
            id,
            payload,
            content,
            next: None,
        }
    }

    /// Parses one NDEF message into a chain of records, preserving wire
    /// order.
    ///
    /// A zero-length input is the empty NDEF message and yields a single
    /// `Empty` record. Chunked records are dropped and parsing continues
    /// after them; a malformed or truncated tail stops the walk and the
    /// chain assembled so far is returned. Nothing parseable yields `None`.
    pub fn parse(bytes: &[u8]) -> Option<Arc<NdefRecord>> {
        if bytes.is_empty() {
            return Some(Arc::new(NdefRecord::empty()));
        }
        Self::link(Self::parse_records(bytes))
    }

    /// Parses every record in `bytes` into an unlinked sequence.
    pub(crate) fn parse_records(bytes: &[u8]) -> Vec<NdefRecord> {
        let mut records = Vec::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let layout = match RecordLayout::parse(rest) {
                Ok(layout) => layout,
                Err(err) => {
                    debug!("stopping at malformed record: {err}");
                    break;
                }
            };
            if layout.header.cf {
                warn!(
                    "dropping chunked record ({} bytes), reassembly is not supported",
                    layout.total
                );
            } else {
                records.push(NdefRecord::from_layout(rest, &layout));
            }
            rest = &rest[layout.total..];
        }
        records
    }

    /// Links records into a chain, last to first, and returns the head.
    ///
    /// `next` pointers are written here only, before any `Arc` is shared.
    pub(crate) fn link(records: Vec<NdefRecord>) -> Option<Arc<NdefRecord>> {
        records.into_iter().rev().fold(None, |next, mut rec| {
            rec.next = next;
            Some(Arc::new(rec))
        })
    }

    /// Synthesizes a single-record well-known message.
    ///
    /// The record carries both the Message Begin and Message End flags,
    /// uses the short form whenever the payload fits in one length byte,
    /// and has no ID field. The assembled bytes go through the normal parse
    /// path, so the returned record's field views index its own copy of the
    /// wire bytes.
    ///
    /// # Errors
    /// Returns `TypeTooLong` if `record_type` does not fit the one-byte
    /// TYPE_LENGTH field, or `PayloadTooBig` if the payload fails the same
    /// sanity bound the parser enforces.
    pub fn well_known(rtd: Rtd, record_type: &[u8], payload: &[u8]) -> Result<Arc<NdefRecord>, RecordError> {
        if record_type.len() > 255 {
            return Err(RecordError::TypeTooLong);
        }
        if payload.len() as u64 >= MAX_PAYLOAD_LEN as u64 {
            return Err(RecordError::PayloadTooBig(payload.len() as u64));
        }

        let short = payload.len() <= 0xFF;
        let header = RecordHeader {
            tnf: TypeNameFormat::WellKnown,
            il: false,
            sr: short,
            cf: false,
            me: true,
            mb: true,
        };

        let len_size = if short { 1 } else { 4 };
        let mut wire = Vec::with_capacity(2 + len_size + record_type.len() + payload.len());
        wire.push(header.pack().map_err(|_| RecordError::InvalidHeader)?[0]);
        wire.push(record_type.len() as u8);
        if short {
            wire.push(payload.len() as u8);
        } else {
            wire.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        }
        wire.extend_from_slice(record_type);
        wire.extend_from_slice(payload);

        let layout = RecordLayout::parse(&wire)?;
        let rec = NdefRecord::from_layout(&wire, &layout);
        // The record reports what the wire says; a tag that disagrees with
        // its own TYPE bytes is a caller bug.
        debug_assert!(rec.rtd() == rtd || rec.rtd() == Rtd::Unknown);
        Ok(Arc::new(rec))
    }

    /// Builds a URI record, abbreviating the scheme with the longest
    /// matching prefix from the URI identifier table.
    ///
    /// # Example
    /// ```ignore
    /// let rec = NdefRecord::uri("https://www.example.com")?;
    /// assert_eq!(rec.as_uri().unwrap().uri(), "https://www.example.com");
    /// ```
    pub fn uri(uri: &str) -> Result<Arc<NdefRecord>, RecordError> {
        Self::well_known(Rtd::Uri, b"U", &uri::encode_payload(uri))
    }

    /// Builds a UTF-8 Text record.
    ///
    /// `lang` is an IANA language code; it must be ASCII and at most 63
    /// bytes so it fits the status byte's length field.
    pub fn text(text: &str, lang: &str) -> Result<Arc<NdefRecord>, RecordError> {
        Self::well_known(Rtd::Text, b"T", &text::encode_payload(text, lang)?)
    }

    /// The record's own wire bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The TYPE field.
    pub fn record_type(&self) -> &[u8] {
        self.typ.slice_of(&self.raw)
    }

    /// The ID field; empty when the IL flag was clear.
    pub fn id(&self) -> &[u8] {
        self.id.slice_of(&self.raw)
    }

    /// The PAYLOAD field, undecoded.
    pub fn payload(&self) -> &[u8] {
        self.payload.slice_of(&self.raw)
    }

    pub fn tnf(&self) -> TypeNameFormat {
        self.tnf
    }

    pub fn rtd(&self) -> Rtd {
        self.rtd
    }

    pub fn flags(&self) -> RecordFlags {
        self.flags
    }

    /// The next record of the message, if any.
    pub fn next(&self) -> Option<&Arc<NdefRecord>> {
        self.next.as_ref()
    }

    pub fn content(&self) -> &RecordContent {
        &self.content
    }

    /// The decoded URI payload, when this is a well-formed URI record.
    pub fn as_uri(&self) -> Option<&UriRecord> {
        match &self.content {
            RecordContent::Uri(rec) => Some(rec),
            _ => None,
        }
    }

    /// The decoded Text payload, when this is a well-formed Text record.
    pub fn as_text(&self) -> Option<&TextRecord> {
        match &self.content {
            RecordContent::Text(rec) => Some(rec),
            _ => None,
        }
    }

    /// Walks the chain from this record to the end of the message.
    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter { cur: Some(self) }
    }
}

/// Borrowing iterator over a record chain.
pub struct RecordIter<'a> {
    cur: Option<&'a NdefRecord>,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = &'a NdefRecord;

    fn next(&mut self) -> Option<&'a NdefRecord> {
        let rec = self.cur?;
        self.cur = rec.next.as_deref();
        Some(rec)
    }
}
