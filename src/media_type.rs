//! Media-type validation for record dispatch.
//!
//! Records with TNF `MediaType` carry a MIME type in the TYPE field. The
//! engine passes those bytes through untouched; consumers that route
//! records to handlers by media type apply this predicate at their
//! boundary so a tag cannot name a wildcard or garbage handler.

/// Returns whether `media_type` is a concrete `type/subtype` media type.
///
/// Accepts printable ASCII with exactly one `/` separating two non-empty
/// halves. Whitespace, control bytes, non-ASCII bytes and wildcards are
/// all rejected.
pub fn is_valid_media_type(media_type: &[u8]) -> bool {
    let mut slash = None;
    for (i, &b) in media_type.iter().enumerate() {
        match b {
            b'/' => {
                if slash.is_some() {
                    return false;
                }
                slash = Some(i);
            }
            b'*' => return false,
            // Printable ASCII, space excluded
            b'!'..=b'~' => {}
            _ => return false,
        }
    }
    match slash {
        Some(i) => i > 0 && i + 1 < media_type.len(),
        None => false,
    }
}
