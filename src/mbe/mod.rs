//! MBE table container reader and writer
//!
//! This module provides functionality to parse and generate MBE containers,
//! a little-endian binary format holding multiple typed sheets of rows with
//! integer and string columns.
//!
//! # Container Structure
//!
//! A container opens with the `EXPA` magic and a sheet count, followed by
//! one header per sheet (padded name, column-type tags, row stride, row
//! count). The structural blocks come next, packed back-to-back in sheet
//! order: integer cells are stored inline as 4 bytes, string cells as
//! 8-byte zero placeholders. Non-empty strings live out-of-line in a
//! trailing `CHNK` pool whose entries point back at their structural cell
//! by absolute file offset.
//!
//! Parsing is tolerant (structural anomalies are logged and defaulted);
//! generation is strict, canonical, and total.

/// Error types for MBE parsing and editing
mod error;

/// In-memory sheet model
mod types;

/// Container parsing implementation
mod parser;

/// Container generation implementation
mod writer;


pub use error::{MbeError, MbeResult};
pub use parser::{parse, parse_with_options, ParseOptions};
pub use types::{
    ColumnType, MbeColumn, MbeFile, MbeRow, MbeSheet, MbeValue, CHNK_MAGIC, EXPA_MAGIC,
};
pub use writer::{generate, write_to};
