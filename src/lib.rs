//! # NDEF record engine
//!
//! This crate parses raw NDEF (NFC Data Exchange Format) byte streams into
//! chains of typed records, decodes the well-known URI and Text record
//! types, synthesizes new records back into wire form, and extracts NDEF
//! messages embedded in TLV containers.
//!
//! It implements the record framing of NFC Forum NDEF 1.0: short and long
//! payload length forms, optional ID fields, Message Begin / Message End
//! flags, and strict bounds checking so a malformed frame read from a tag
//! or a peer can never over-read the input. Chunked records are not
//! reassembled; they are dropped and parsing continues.
//!
//! ## Example Usage
//!
//! Parsing a message read from a tag and inspecting the records:
//!
//! ```ignore
//! use nfc_ndef::record::{NdefRecord, Rtd};
//!
//! if let Some(head) = NdefRecord::parse(&bytes) {
//!     for rec in head.iter() {
//!         if rec.rtd() == Rtd::Uri {
//!             println!("{}", rec.as_uri().unwrap().uri());
//!         }
//!     }
//! }
//! ```
//!
//! Building a record and getting its wire bytes:
//!
//! ```ignore
//! let rec = NdefRecord::uri("https://www.example.com")?;
//! write_to_tag(rec.raw());
//! ```
//!
//! ## Notes
//!
//! - Parsing never fails with an error: malformed input terminates the
//!   walk and whatever was assembled is returned, so a corrupt tail never
//!   hides earlier valid records.
//! - Records are immutable and chains share nodes through `Arc`, so a
//!   parsed chain can be handed to other threads as-is.

mod bytes;
pub mod media_type;
pub mod record;
pub mod tlv;
