//! Common types for the P4 runtime metadata catalog.
//!
//! This crate provides the value types shared by the catalog engine and
//! the device dispatch layer:
//!
//! - [`P4Id`]: Opaque 32-bit resource identifier assigned by the program loader
//! - [`MatchKind`]: Match semantics of a table key field
//! - [`bits`]: Bit-width arithmetic for big-endian packed values

pub mod bits;
mod id;
mod match_kind;

pub use bits::{byte0_mask, bytes_for_bitwidth, mask_be_value};
pub use id::P4Id;
pub use match_kind::MatchKind;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid P4 id: {0}")]
    InvalidId(String),

    #[error("invalid match kind: {0}")]
    InvalidMatchKind(String),

    #[error("value of {actual} bytes does not fit bit<{bitwidth}> (expected {expected} bytes)")]
    ValueWidth {
        bitwidth: usize,
        expected: usize,
        actual: usize,
    },
}
