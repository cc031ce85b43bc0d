//! Longan - A Rust library for reading, editing and writing MBE table
//! containers
//!
//! MBE containers store multiple typed sheets of rows with integer and
//! string columns in a little-endian binary layout: an `EXPA` header
//! section, fixed-stride structural blocks, and an optional out-of-line
//! `CHNK` string pool addressed by absolute file offset.
//!
//! # Features
//!
//! - **Tolerant parser**: structural anomalies (truncated blocks, missing
//!   pool, malformed text) are logged as warnings and resolved with safe
//!   defaults; only a wrong magic or an unknown column type aborts
//! - **Canonical generator**: deterministic, byte-stable output with
//!   recomputed alignment padding, whatever the input file looked like
//! - **Configurable decoding**: parse-time encoding selection for legacy
//!   non-UTF-8 files (the generator always encodes UTF-8)
//! - **Typed editing**: the sheet model enforces cell arity and
//!   cell/column type agreement, so encoding never fails
//!
//! # Example - Reading a file
//!
//! ```no_run
//! use longan::mbe::MbeFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = MbeFile::open("data.mbe")?;
//! for sheet in &file.sheets {
//!     println!("{}: {} columns, {} rows", sheet.name, sheet.column_count(), sheet.row_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Building and encoding in memory
//!
//! ```
//! use longan::mbe::{generate, parse, ColumnType, MbeFile, MbeRow, MbeSheet, MbeValue};
//!
//! # fn main() -> Result<(), longan::mbe::MbeError> {
//! let mut sheet = MbeSheet::new("items", &[ColumnType::Int, ColumnType::Str]);
//! sheet.push_row(MbeRow::new(vec![MbeValue::Int(7), MbeValue::Str("potion".into())]))?;
//!
//! let mut file = MbeFile::new();
//! file.add_sheet(sheet);
//!
//! let bytes = generate(&file);
//! let reparsed = parse(&bytes)?;
//! assert_eq!(reparsed.sheets[0].cell(0, 1), Some(&MbeValue::Str("potion".into())));
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Legacy encodings
//!
//! ```no_run
//! use longan::mbe::{parse_with_options, ParseOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("legacy.mbe")?;
//! let options = ParseOptions::for_label("windows-1252").expect("known label");
//! let file = parse_with_options(&data, &options)?;
//! # Ok(())
//! # }
//! ```

/// Common binary and text-encoding utilities
pub mod common;

/// MBE container codec: model, parser and generator
pub mod mbe;

// Re-export the primary entry points for convenience
pub use mbe::{generate, parse, parse_with_options, MbeError, MbeFile, MbeResult};
