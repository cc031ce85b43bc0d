//! Character encoding utilities for container text fields.
//!
//! Container string fields carry a declared byte length that includes NUL
//! padding. This module decodes such fields: the declared length bounds the
//! read, the first NUL terminates the text, and a configurable
//! `encoding_rs` encoding converts the bytes to UTF-8 with a lossless
//! latin1 fallback for malformed input.

use encoding_rs::Encoding;
use memchr::memchr;

/// Decode a length-prefixed, NUL-padded string field.
///
/// Reads up to `declared_len` bytes starting at `offset`, truncates at the
/// first NUL byte if any, and decodes the remaining slice with `encoding`.
/// When the declared length extends past the end of the buffer the readable
/// prefix is decoded instead and a warning is logged.
///
/// Malformed input for `encoding` falls back to the 8-bit latin1 mapping,
/// which cannot fail; an empty slice yields the empty string.
///
/// # Examples
///
/// ```
/// use longan::common::encoding::decode_padded_string;
/// let data = b"..ok\0\0..";
/// assert_eq!(decode_padded_string(data, 2, 4, encoding_rs::UTF_8), "ok");
/// ```
pub fn decode_padded_string(
    data: &[u8],
    offset: usize,
    declared_len: usize,
    encoding: &'static Encoding,
) -> String {
    if offset >= data.len() {
        log::warn!(
            "string field at offset {offset} starts past end of buffer ({} bytes)",
            data.len()
        );
        return String::new();
    }

    let end = offset.saturating_add(declared_len);
    let end = if end > data.len() {
        log::warn!(
            "string field at offset {offset} declares {declared_len} bytes but only {} remain",
            data.len() - offset
        );
        data.len()
    } else {
        end
    };

    let field = &data[offset..end];
    let text = match memchr(0, field) {
        Some(nul) => &field[..nul],
        None => field,
    };

    if text.is_empty() {
        return String::new();
    }

    let (decoded, _, had_errors) = encoding.decode(text);
    if had_errors {
        log::warn!(
            "malformed {} text at offset {offset}; falling back to latin1",
            encoding.name()
        );
        return latin1_to_string(text);
    }
    decoded.into_owned()
}

/// Decode bytes with the lossless latin1 (ISO-8859-1) mapping.
///
/// Every byte maps directly to the Unicode code point of the same value, so
/// this conversion cannot fail and preserves the original payload.
#[inline]
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_utf8() {
        let data = b"hello\0\0\0";
        assert_eq!(decode_padded_string(data, 0, 8, encoding_rs::UTF_8), "hello");
    }

    #[test]
    fn test_decode_stops_at_first_nul() {
        let data = b"ab\0cd\0\0\0";
        assert_eq!(decode_padded_string(data, 0, 8, encoding_rs::UTF_8), "ab");
    }

    #[test]
    fn test_decode_multibyte_utf8() {
        let mut data = "héllo".as_bytes().to_vec();
        data.extend_from_slice(&[0, 0]);
        let len = data.len();
        assert_eq!(
            decode_padded_string(&data, 0, len, encoding_rs::UTF_8),
            "héllo"
        );
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // 0xE9 alone is malformed UTF-8 but maps to é in latin1.
        let data = b"caf\xE9\0\0";
        assert_eq!(decode_padded_string(data, 0, 6, encoding_rs::UTF_8), "café");
    }

    #[test]
    fn test_decode_clamps_at_end_of_buffer() {
        let data = b"ok";
        assert_eq!(decode_padded_string(data, 0, 64, encoding_rs::UTF_8), "ok");
        assert_eq!(decode_padded_string(data, 5, 4, encoding_rs::UTF_8), "");
    }

    #[test]
    fn test_decode_empty_field() {
        let data = b"\0\0\0\0";
        assert_eq!(decode_padded_string(data, 0, 4, encoding_rs::UTF_8), "");
    }

    #[test]
    fn test_decode_with_explicit_latin1() {
        let latin1 = Encoding::for_label(b"latin1").unwrap();
        // encoding_rs resolves the latin1 label to windows-1252; 0xE9 is é
        // in both.
        let data = b"caf\xE9\0\0";
        assert_eq!(decode_padded_string(data, 0, 6, latin1), "café");
    }

    #[test]
    fn test_latin1_to_string_lossless() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let s = latin1_to_string(&bytes);
        assert_eq!(s.chars().count(), 256);
        assert_eq!(s.chars().next_back(), Some('\u{FF}'));
    }
}
