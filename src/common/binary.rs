//! Binary data parsing utilities shared across the crate.
//!
//! This module provides common functions for reading and writing binary data
//! in little-endian format, plus the magic-byte search used to locate
//! sub-blocks inside a container buffer.

use memchr::memmem;
use zerocopy::{I32, LE, U32};

/// Binary parsing error type
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// A fixed-width read does not fit inside the buffer
    OutOfBounds {
        /// Offset the read started at
        offset: usize,
        /// Width of the requested field in bytes
        wanted: usize,
        /// Total buffer length
        len: usize,
    },
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::OutOfBounds {
                offset,
                wanted,
                len,
            } => {
                write!(
                    f,
                    "read of {wanted} bytes at offset {offset} is out of bounds for a {len}-byte buffer"
                )
            },
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Borrow `N` bytes at `offset` as a fixed-size array, bounds-checked.
fn read_array<const N: usize>(data: &[u8], offset: usize) -> BinaryResult<[u8; N]> {
    data.get(offset..)
        .and_then(|tail| tail.get(..N))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BinaryError::OutOfBounds {
            offset,
            wanted: N,
            len: data.len(),
        })
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use longan::common::binary::read_u32_le;
/// // Sheet-count field of a container header.
/// let data = b"EXPA\x02\x00\x00\x00";
/// assert_eq!(read_u32_le(data, 4).unwrap(), 2);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    read_array(data, offset).map(|bytes| U32::<LE>::from_bytes(bytes).get())
}

/// Read a little-endian i32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use longan::common::binary::read_i32_le;
/// // A structural row holding the int cells 1 and -1.
/// let row = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
/// assert_eq!(read_i32_le(&row, 0).unwrap(), 1);
/// assert_eq!(read_i32_le(&row, 4).unwrap(), -1);
/// ```
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    read_array(data, offset).map(|bytes| I32::<LE>::from_bytes(bytes).get())
}

/// Append a u32 to a byte buffer in little-endian order.
///
/// # Examples
///
/// ```
/// use longan::common::binary::write_u32_le;
/// let mut buf = Vec::new();
/// write_u32_le(&mut buf, 7); // str column tag
/// assert_eq!(buf, [0x07, 0x00, 0x00, 0x00]);
/// ```
#[inline]
pub fn write_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append an i32 to a byte buffer in little-endian order.
///
/// # Examples
///
/// ```
/// use longan::common::binary::write_i32_le;
/// let mut buf = Vec::new();
/// write_i32_le(&mut buf, -1);
/// assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF]);
/// ```
#[inline]
pub fn write_i32_le(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Find the first occurrence of a magic byte sequence at or after `start`.
///
/// Returns the absolute index of the match, or `None` when the needle does
/// not occur in `data[start..]` (including when `start` is past the end of
/// the buffer).
///
/// # Examples
///
/// ```
/// use longan::common::binary::find_magic;
/// let data = b"....CHNK....CHNK";
/// assert_eq!(find_magic(data, b"CHNK", 0), Some(4));
/// assert_eq!(find_magic(data, b"CHNK", 5), Some(12));
/// assert_eq!(find_magic(data, b"CHNK", 13), None);
/// ```
#[inline]
pub fn find_magic(data: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if start >= data.len() {
        return None;
    }
    memmem::find(&data[start..], needle).map(|pos| start + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_le() {
        let data = b"EXPA\x02\x00\x00\x00";
        assert!(read_u32_le(data, 0).is_ok_and(|v| v == 0x41505845)); // "EXPA"
        assert!(read_u32_le(data, 4).is_ok_and(|v| v == 2));
        assert!(read_u32_le(data, 5).is_err());
    }

    #[test]
    fn test_read_i32_le_negative() {
        let row = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(read_i32_le(&row, 0).is_ok_and(|v| v == 1));
        assert!(read_i32_le(&row, 4).is_ok_and(|v| v == -1));
        assert!(read_i32_le(&row, 6).is_err());
    }

    #[test]
    fn test_read_far_out_of_range() {
        // Huge offsets must report out of bounds, not overflow.
        assert!(read_u32_le(b"EXPA", usize::MAX - 2).is_err());
        assert!(read_i32_le(&[], 0).is_err());
    }

    #[test]
    fn test_out_of_bounds_error_reports_context() {
        let err = read_u32_le(b"EXPA\x01", 4).unwrap_err();
        let BinaryError::OutOfBounds {
            offset,
            wanted,
            len,
        } = err;
        assert_eq!((offset, wanted, len), (4, 4, 5));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 8); // strID column tag
        write_i32_le(&mut buf, -42);
        assert!(read_u32_le(&buf, 0).is_ok_and(|v| v == 8));
        assert!(read_i32_le(&buf, 4).is_ok_and(|v| v == -42));
    }

    #[test]
    fn test_find_magic() {
        let data = b"EXPA........CHNK..";
        assert_eq!(find_magic(data, b"EXPA", 0), Some(0));
        assert_eq!(find_magic(data, b"CHNK", 0), Some(12));
        assert_eq!(find_magic(data, b"CHNK", 12), Some(12));
        assert_eq!(find_magic(data, b"CHNK", 13), None);
        assert_eq!(find_magic(data, b"CHNK", 100), None);
    }
}
