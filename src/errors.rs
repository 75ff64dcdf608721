//! Failure conditions reported by schema construction, pack, and unpack.

use std::io;

/// Errors surfaced by [`Struct`](crate::Struct) and [`Field`](crate::Field).
///
/// Construction-time defects (unknown names, malformed policies) are reported
/// eagerly by `Field::new` / `Struct::new`; the remaining variants are raised
/// during a pack or unpack call and carry enough context to act on.
#[derive(Debug, thiserror::Error)]
pub enum StructError {
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    #[error("unknown field type: {0}")]
    UnknownType(String),
    #[error("unknown byte order: {0}")]
    UnknownByteOrder(String),
    #[error("unknown string encoding: {0}")]
    UnknownEncoding(String),
    /// Malformed schema or a value that violates the schema's contract.
    #[error("schema: {0}")]
    Schema(String),
    /// A length callback's declared length disagrees with the value packed.
    #[error("field {field} has a value of length {actual}, but its length function returned {expected}")]
    InconsistentLength {
        field: String,
        expected: usize,
        actual: usize,
    },
    /// The buffer ran out while scanning for a configured delimiter.
    #[error("delimiter 0x{0:02x} not found")]
    DelimiterNotFound(u8),
    #[error("field {field}: {codec} codec can't encode character {ch:?} at position {position}")]
    Encode {
        field: String,
        codec: &'static str,
        ch: char,
        position: usize,
    },
    #[error("field {field}: {codec} codec can't decode byte at position {position}")]
    Decode {
        field: String,
        codec: &'static str,
        position: usize,
    },
}
