/// URI abbreviation prefixes, indexed by the identifier code that opens the
/// payload.
///
/// Code 0x00 means nothing is prepended; codes past the end of the table
/// are reserved and decode the same way.
///
/// | Hex        | Protocol                   |
/// | ---------- | -------------------------- |
/// | 0x00       | None - nothing prepended   |
/// | 0x01       | http://www.                |
/// | 0x02       | https://www.               |
/// | 0x03       | http://                    |
/// | 0x04       | https://                   |
/// | 0x05       | tel:                       |
/// | 0x06       | mailto:                    |
/// | 0x07..0x23 | remaining NFC Forum codes  |
/// | 0x24..0xFF | reserved                   |
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Decoded URI record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriRecord {
    uri: String,
}

impl UriRecord {
    /// Decodes a URI payload: one identifier-code byte followed by the
    /// UTF-8 suffix. Fails on an empty payload or a suffix that is not
    /// valid UTF-8.
    pub(crate) fn decode(payload: &[u8]) -> Option<UriRecord> {
        let (&code, suffix) = payload.split_first()?;
        let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
        let suffix = core::str::from_utf8(suffix).ok()?;

        let mut uri = String::with_capacity(prefix.len() + suffix.len());
        uri.push_str(prefix);
        uri.push_str(suffix);
        Some(UriRecord { uri })
    }

    /// The full URI with the abbreviation expanded.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Encodes `uri` as a URI record payload, abbreviating it with the longest
/// matching prefix from the identifier table.
pub(crate) fn encode_payload(uri: &str) -> Vec<u8> {
    let mut code = 0u8;
    let mut prefix_len = 0;
    // Skip code 0, the empty prefix
    for (i, prefix) in URI_PREFIXES.iter().enumerate().skip(1) {
        if prefix.len() > prefix_len && uri.starts_with(prefix) {
            code = i as u8;
            prefix_len = prefix.len();
        }
    }

    let suffix = &uri.as_bytes()[prefix_len..];
    let mut payload = Vec::with_capacity(1 + suffix.len());
    payload.push(code);
    payload.extend_from_slice(suffix);
    payload
}
