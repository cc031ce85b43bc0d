//! Common utilities shared across the crate.
//!
//! This module provides the bounds-checked binary primitives and the
//! configurable text decoding used by the container codec.

// Submodule declarations
pub mod binary;
pub mod encoding;

// Re-exports for convenience
pub use binary::{BinaryError, BinaryResult};
