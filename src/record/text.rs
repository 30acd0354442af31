use crate::record::RecordError;

/// Status byte, bit 7: text is UTF-16 when set, UTF-8 otherwise.
const STATUS_UTF16: u8 = 0x80;
/// Status byte, bit 6: reserved, must be zero.
const STATUS_RESERVED: u8 = 0x40;
/// Status byte, bits 5..0: length of the IANA language code.
const STATUS_LANG_MASK: u8 = 0x3F;

/// Text encoding declared in the status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16,
}

/// Decoded Text record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    lang: String,
    text: String,
    encoding: TextEncoding,
}

impl TextRecord {
    /// Decodes a Text payload: a status byte, the language code, then the
    /// text in the declared encoding.
    ///
    /// Fails on an empty payload, a set reserved bit, a language code that
    /// overruns the payload or is not ASCII, or text that does not decode.
    pub(crate) fn decode(payload: &[u8]) -> Option<TextRecord> {
        let (&status, rest) = payload.split_first()?;
        if status & STATUS_RESERVED != 0 {
            return None;
        }

        let lang_len = (status & STATUS_LANG_MASK) as usize;
        if rest.len() < lang_len {
            return None;
        }
        let (lang, text) = rest.split_at(lang_len);
        if !lang.is_ascii() {
            return None;
        }
        let lang = core::str::from_utf8(lang).ok()?.to_owned();

        let (encoding, text) = if status & STATUS_UTF16 != 0 {
            (TextEncoding::Utf16, decode_utf16(text)?)
        } else {
            (TextEncoding::Utf8, core::str::from_utf8(text).ok()?.to_owned())
        };

        Some(TextRecord { lang, text, encoding })
    }

    /// The IANA language code, e.g. `"en"`.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

/// Decodes UTF-16 text. An explicit BOM selects the byte order; without
/// one the text is taken as big-endian. Fails on an odd byte count or
/// invalid code units.
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        rest => (true, rest),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Encodes a UTF-8 Text payload for the given language code.
pub(crate) fn encode_payload(text: &str, lang: &str) -> Result<Vec<u8>, RecordError> {
    if !lang.is_ascii() {
        return Err(RecordError::InvalidLanguage);
    }
    if lang.len() > STATUS_LANG_MASK as usize {
        return Err(RecordError::LanguageTooLong);
    }

    let mut payload = Vec::with_capacity(1 + lang.len() + text.len());
    payload.push(lang.len() as u8);
    payload.extend_from_slice(lang.as_bytes());
    payload.extend_from_slice(text.as_bytes());
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::record::{NdefRecord, RecordContent, Rtd};

    #[test]
    fn test_parse_text_record() {
        let rec = NdefRecord::parse(&hex!("D1 01 08 54 02 65 6E 48 65 6C 6C 6F")).unwrap();
        assert_eq!(rec.rtd(), Rtd::Text);
        assert_eq!(rec.record_type(), b"T");

        let text = rec.as_text().unwrap();
        assert_eq!(text.lang(), "en");
        assert_eq!(text.text(), "Hello");
        assert_eq!(text.encoding(), TextEncoding::Utf8);
    }

    #[test]
    fn test_decode_longer_language_code() {
        let rec = TextRecord::decode(b"\x05en-USHello, World!").unwrap();
        assert_eq!(rec.lang(), "en-US");
        assert_eq!(rec.text(), "Hello, World!");
    }

    #[test]
    fn test_decode_utf16_big_endian_default() {
        let rec = TextRecord::decode(&hex!("82 65 6E 00 48 00 69")).unwrap();
        assert_eq!(rec.lang(), "en");
        assert_eq!(rec.text(), "Hi");
        assert_eq!(rec.encoding(), TextEncoding::Utf16);
    }

    #[test]
    fn test_decode_utf16_honors_bom() {
        let rec = TextRecord::decode(&hex!("82 65 6E FE FF 00 48 00 69")).unwrap();
        assert_eq!(rec.text(), "Hi");
        let rec = TextRecord::decode(&hex!("82 65 6E FF FE 48 00 69 00")).unwrap();
        assert_eq!(rec.text(), "Hi");
    }

    #[test]
    fn test_decode_failures() {
        // Empty payload
        assert_eq!(TextRecord::decode(&[]), None);
        // Reserved status bit set
        assert_eq!(TextRecord::decode(&hex!("42 65 6E 48 69")), None);
        // Language code runs past the payload
        assert_eq!(TextRecord::decode(&hex!("05 65 6E")), None);
        // Language code is not ASCII
        assert_eq!(TextRecord::decode(&hex!("02 80 81 48 69")), None);
        // Text is not valid UTF-8
        assert_eq!(TextRecord::decode(&hex!("02 65 6E FF")), None);
        // Odd UTF-16 byte count
        assert_eq!(TextRecord::decode(&hex!("82 65 6E 00 48 00")), None);
    }

    #[test]
    fn test_undecodable_text_record_stays_generic() {
        let rec = NdefRecord::parse(&hex!("D1 01 03 54 42 65 6E")).unwrap();
        assert_eq!(rec.rtd(), Rtd::Unknown);
        assert_eq!(*rec.content(), RecordContent::Generic);
    }

    #[test]
    fn test_encode_payload() {
        assert_eq!(encode_payload("Hello", "en").unwrap(), b"\x02enHello");
        assert_eq!(encode_payload("", "en").unwrap(), b"\x02en");
    }

    #[test]
    fn test_encode_rejects_bad_language() {
        assert_eq!(encode_payload("Hi", "\u{e9}n"), Err(RecordError::InvalidLanguage));
        let lang = "a".repeat(64);
        assert_eq!(encode_payload("Hi", &lang), Err(RecordError::LanguageTooLong));
    }

    #[test]
    fn test_text_builder_round_trip() {
        let rec = NdefRecord::text("Hello", "en").unwrap();
        assert_eq!(rec.raw(), &hex!("D1 01 08 54 02 65 6E 48 65 6C 6C 6F"));

        let parsed = NdefRecord::parse(rec.raw()).unwrap();
        let text = parsed.as_text().unwrap();
        assert_eq!(text.lang(), "en");
        assert_eq!(text.text(), "Hello");
        assert_eq!(text.encoding(), TextEncoding::Utf8);
    }
}
