//! MBE container parsing implementation
//!
//! Decoding runs in passes over a fully-loaded byte buffer: a header pass
//! that builds one descriptor per sheet, a layout pass that assigns each
//! sheet its structural-block offset, a pool pass that maps absolute cell
//! offsets to their out-of-line strings, and a final pass that materialises
//! the rows. The parser is tolerant on read: only a missing `EXPA` magic
//! and an unknown column-type tag are fatal, every other anomaly is logged
//! and resolved with a safe default.

use std::collections::HashMap;
use std::path::Path;

use encoding_rs::Encoding;

use crate::common::binary;
use crate::common::encoding::decode_padded_string;
use crate::mbe::error::{MbeError, MbeResult};
use crate::mbe::types::{
    ColumnType, MbeColumn, MbeFile, MbeRow, MbeSheet, MbeValue, CHNK_MAGIC, EXPA_MAGIC,
};

/// Parse-time configuration.
///
/// The single recognised option is the encoding used to decode sheet names
/// and pool strings. The default is UTF-8; real-world files written by
/// other tools occasionally use legacy 8-bit encodings, and selecting the
/// wrong one produces mojibake rather than a hard error.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Encoding for sheet names and pool strings
    pub encoding: &'static Encoding,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl ParseOptions {
    /// Options with the default UTF-8 encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the encoding resolved from a WHATWG label.
    ///
    /// Accepts labels such as `"utf-8"`, `"latin1"` or `"windows-1252"`.
    /// Returns `None` for unknown labels.
    ///
    /// # Examples
    ///
    /// ```
    /// use longan::mbe::ParseOptions;
    /// assert!(ParseOptions::for_label("latin1").is_some());
    /// assert!(ParseOptions::for_label("no-such-encoding").is_none());
    /// ```
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.as_bytes()).map(|encoding| ParseOptions { encoding })
    }
}

/// Per-sheet header data accumulated by the first pass.
struct SheetDescriptor {
    name: String,
    column_types: Vec<ColumnType>,
    area_size_per_row: u32,
    row_count: u32,
    data_start: usize,
}

/// Parse an MBE container with the default options.
///
/// # Errors
///
/// [`MbeError::InvalidMagic`] when the buffer does not start with `EXPA`,
/// [`MbeError::UnknownColumnType`] when a header carries a column tag
/// outside `{2, 7, 8}`. Structural anomalies beyond these are logged as
/// warnings and yield best-effort defaults.
pub fn parse(data: &[u8]) -> MbeResult<MbeFile> {
    parse_with_options(data, &ParseOptions::default())
}

/// Parse an MBE container with explicit options.
pub fn parse_with_options(data: &[u8], options: &ParseOptions) -> MbeResult<MbeFile> {
    if data.len() < EXPA_MAGIC.len() || &data[..4] != EXPA_MAGIC {
        return Err(MbeError::InvalidMagic);
    }

    let sheet_count = match binary::read_u32_le(data, 4) {
        Ok(count) => count as usize,
        Err(_) => {
            log::warn!("container ends before the sheet count; treating as empty");
            0
        },
    };

    // Pass 1: sheet headers.
    let mut descriptors: Vec<SheetDescriptor> = Vec::new();
    let mut offset = 8;
    for sheet_index in 0..sheet_count {
        match parse_sheet_header(data, offset, sheet_index, options.encoding)? {
            Some((descriptor, next_offset)) => {
                descriptors.push(descriptor);
                offset = next_offset;
            },
            None => break,
        }
    }

    // Pass 2: structural block layout. Sheets pack back-to-back after the
    // last header, each occupying stride x row-count bytes.
    let mut cursor = offset;
    for descriptor in &mut descriptors {
        descriptor.data_start = cursor;
        let block_size = (descriptor.area_size_per_row as usize)
            .saturating_mul(descriptor.row_count as usize);
        cursor = cursor.saturating_add(block_size);
    }
    let pool_search_start = cursor;

    // Pass 3: string pool.
    let strings_expected = descriptors
        .iter()
        .any(|d| d.row_count > 0 && d.column_types.iter().any(|t| t.is_string()));
    let pool = parse_string_pool(data, pool_search_start, options.encoding, strings_expected);

    // Pass 4: materialise rows.
    let sheets = descriptors
        .into_iter()
        .map(|descriptor| materialise_sheet(data, descriptor, &pool))
        .collect();

    Ok(MbeFile { sheets })
}

/// Parse one sheet header starting at `start`.
///
/// Returns the descriptor and the offset of the next header, `Ok(None)`
/// when the header runs past the end of the buffer (already-parsed sheets
/// are kept), or an error for an unknown column tag.
fn parse_sheet_header(
    data: &[u8],
    start: usize,
    sheet_index: usize,
    encoding: &'static Encoding,
) -> MbeResult<Option<(SheetDescriptor, usize)>> {
    let mut offset = start;

    let Ok(name_len) = binary::read_u32_le(data, offset) else {
        log::warn!("sheet {sheet_index} header truncated at offset {offset}; keeping earlier sheets");
        return Ok(None);
    };
    offset += 4;

    let name = decode_padded_string(data, offset, name_len as usize, encoding);
    offset = offset.saturating_add(name_len as usize);

    let Ok(column_count) = binary::read_u32_le(data, offset) else {
        log::warn!("sheet {sheet_index} header truncated at offset {offset}; keeping earlier sheets");
        return Ok(None);
    };
    offset += 4;

    let mut column_types = Vec::new();
    for column_index in 0..column_count as usize {
        let Ok(tag) = binary::read_u32_le(data, offset) else {
            log::warn!(
                "sheet {sheet_index} header truncated in its column table; keeping earlier sheets"
            );
            return Ok(None);
        };
        let Some(column_type) = ColumnType::from_tag(tag) else {
            return Err(MbeError::UnknownColumnType {
                value: tag,
                sheet: sheet_index,
                column: column_index,
            });
        };
        column_types.push(column_type);
        offset += 4;
    }

    let Ok(area_size_per_row) = binary::read_u32_le(data, offset) else {
        log::warn!("sheet {sheet_index} header truncated at offset {offset}; keeping earlier sheets");
        return Ok(None);
    };
    offset += 4;

    let Ok(row_count) = binary::read_u32_le(data, offset) else {
        log::warn!("sheet {sheet_index} header truncated at offset {offset}; keeping earlier sheets");
        return Ok(None);
    };
    offset += 4;

    Ok(Some((
        SheetDescriptor {
            name,
            column_types,
            area_size_per_row,
            row_count,
            data_start: 0,
        },
        offset,
    )))
}

/// Locate and decode the `CHNK` string pool.
///
/// Returns a map from absolute structural-cell offset to decoded string.
/// A truncated entry is skipped; its declared length still advances the
/// cursor (clamped at end of buffer) so later entries keep their
/// alignment.
fn parse_string_pool(
    data: &[u8],
    search_start: usize,
    encoding: &'static Encoding,
    strings_expected: bool,
) -> HashMap<u32, String> {
    let mut pool = HashMap::new();

    let Some(magic_at) = binary::find_magic(data, CHNK_MAGIC, search_start) else {
        if strings_expected {
            log::warn!("no CHNK pool after the structural block; string cells decode as empty");
        }
        return pool;
    };

    let Ok(entry_count) = binary::read_u32_le(data, magic_at + 4) else {
        log::warn!("CHNK pool at offset {magic_at} ends before its entry count");
        return pool;
    };

    let mut cursor = magic_at + 8;
    for index in 0..entry_count {
        let header = binary::read_u32_le(data, cursor)
            .and_then(|target| binary::read_u32_le(data, cursor + 4).map(|len| (target, len)));
        let Ok((target, padded_len)) = header else {
            log::warn!("CHNK entry {index} of {entry_count} truncated at offset {cursor}");
            break;
        };

        let body_start = cursor + 8;
        let body_end = body_start.saturating_add(padded_len as usize);
        if body_end > data.len() {
            log::warn!(
                "CHNK entry {index} declares {padded_len} bytes past end of buffer; skipping"
            );
            cursor = data.len();
            continue;
        }

        let text = decode_padded_string(data, body_start, padded_len as usize, encoding);
        pool.insert(target, text);
        cursor = body_end;
    }

    pool
}

/// Build a sheet from its descriptor, joining structural cells with pool
/// strings.
fn materialise_sheet(
    data: &[u8],
    descriptor: SheetDescriptor,
    pool: &HashMap<u32, String>,
) -> MbeSheet {
    let stride = descriptor.area_size_per_row as usize;
    let declared_rows = descriptor.row_count as usize;

    // Rows whose structural area starts past the end of the buffer are
    // dropped; a partial final row is kept and its unreadable cells
    // default individually. Zero-stride rows occupy no structural bytes,
    // so the buffer length bounds them instead and a hostile row count
    // cannot force a huge allocation.
    let rows_available = if stride == 0 {
        data.len()
    } else {
        data.len()
            .saturating_sub(descriptor.data_start)
            .div_ceil(stride)
    };
    let row_count = if declared_rows > rows_available {
        log::warn!(
            "sheet '{}' declares {declared_rows} rows but only {rows_available} start inside the buffer",
            descriptor.name
        );
        rows_available
    } else {
        declared_rows
    };

    let mut rows = Vec::with_capacity(row_count);
    for r in 0..row_count {
        // The cursor resets at each row start, so a declared stride larger
        // than the natural column-width sum skips trailing row padding.
        let mut cursor = descriptor.data_start + r * stride;
        let mut cells = Vec::with_capacity(descriptor.column_types.len());
        for column_type in &descriptor.column_types {
            match column_type {
                ColumnType::Int => {
                    let value = match binary::read_i32_le(data, cursor) {
                        Ok(v) => v,
                        Err(_) => {
                            log::warn!("int cell at offset {cursor} is out of bounds; defaulting to 0");
                            0
                        },
                    };
                    cells.push(MbeValue::Int(value));
                },
                ColumnType::Str | ColumnType::StrId => {
                    let text = pool.get(&(cursor as u32)).cloned().unwrap_or_default();
                    cells.push(MbeValue::Str(text));
                },
            }
            cursor += column_type.cell_width();
        }
        rows.push(MbeRow::new(cells));
    }

    MbeSheet {
        name: descriptor.name,
        columns: descriptor
            .column_types
            .into_iter()
            .map(MbeColumn::new)
            .collect(),
        rows,
        parsed_area_size_per_row: Some(descriptor.area_size_per_row),
    }
}

impl MbeFile {
    /// Read and parse a container from disk with the default options.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use longan::mbe::MbeFile;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = MbeFile::open("data.mbe")?;
    /// for sheet in &file.sheets {
    ///     println!("{}: {} rows", sheet.name, sheet.row_count());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> MbeResult<MbeFile> {
        let data = std::fs::read(path)?;
        parse(&data)
    }
}
