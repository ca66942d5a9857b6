//! Byte-to-text decoding for uploaded files.
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `bytes` as UTF-8, falling back to ISO-8859-1.
///
/// The fallback maps every byte to the code point of the same value, so it
/// never fails. A leading UTF-8 byte order mark is dropped.
pub fn decode_text<'a>(filename: &str, bytes: &'a [u8]) -> Cow<'a, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            log::debug!(
                "'{}' is not valid UTF-8 ({}), decoding as ISO-8859-1",
                filename,
                e
            );
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Removes control characters except tab, newline and carriage return.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}
