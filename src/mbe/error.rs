//! Error types for MBE container parsing and editing

use thiserror::Error;

/// Result type alias for MBE operations
pub type MbeResult<T> = Result<T, MbeError>;

/// Errors that can occur while parsing or editing an MBE container.
///
/// Parsing is tolerant by design: only a missing `EXPA` magic and an
/// unknown column-type tag abort a parse. Every other structural anomaly
/// is logged as a warning and resolved with a safe default.
#[derive(Error, Debug)]
pub enum MbeError {
    /// Leading bytes are not the `EXPA` magic
    #[error("not an MBE container: missing EXPA magic")]
    InvalidMagic,

    /// A column-type tag is outside the known set {2, 7, 8}
    #[error("unknown column type {value} (sheet {sheet}, column {column})")]
    UnknownColumnType {
        /// Raw tag value read from the header
        value: u32,
        /// Zero-based sheet index
        sheet: usize,
        /// Zero-based column index
        column: usize,
    },

    /// A row's cell count does not match the sheet's column count
    #[error("row has {found} cells but the sheet has {expected} columns")]
    ColumnCountMismatch {
        /// Column count of the sheet
        expected: usize,
        /// Cell count of the offending row
        found: usize,
    },

    /// A cell value's variant does not match its column's type
    #[error("column {column} holds {expected} cells")]
    TypeMismatch {
        /// Zero-based column index
        column: usize,
        /// Type name of the column (`"int"`, `"str"` or `"strID"`)
        expected: &'static str,
    },

    /// A row index is past the end of the sheet
    #[error("row {row} is out of bounds ({rows} rows)")]
    RowOutOfBounds {
        /// Requested row index
        row: usize,
        /// Row count of the sheet
        rows: usize,
    },

    /// I/O error from the file open/save convenience API
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
