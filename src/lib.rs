//! # wirestruct — declarative schemas for binary formats
//!
//! A [`Struct`] describes a binary layout as an ordered sequence of typed
//! [`Field`]s. Packing turns a map of named [`Value`]s into bytes;
//! unpacking turns bytes back into the map. Field lengths, repeat counts,
//! and text encodings may depend on other field values at pack/unpack
//! time, so the same schema handles length-prefixed payloads, counted
//! arrays, and delimiter-terminated strings.
//!
//! ## Field types
//!
//! - Base: `UINT8`..`UINT64`, `SINT8`..`SINT64`, `BOOL`, `FLOAT`, `DOUBLE`
//! - Variable-length: `BYTES`, and `STRING` with a text encoding
//!
//! ## Length and repeat policies
//!
//! - Length: a fixed byte count, an integer prefix field, a [`Delimiter`]
//!   byte, or a callback over the value-set
//! - Repeat: exactly once, a fixed count, or an integer count prefix field
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use wirestruct::{Field, Struct, Value};
//!
//! let header = Struct::new(
//!     "NET_ENDIAN",
//!     vec![
//!         Field::new("UINT8")?.name("version"),
//!         Field::new("BYTES")?
//!             .name("body")
//!             .length_field(Field::new("UINT16")?),
//!     ],
//! )?;
//!
//! let mut data = HashMap::new();
//! data.insert("version".to_string(), Value::U8(1));
//! data.insert("body".to_string(), Value::Bytes(b"hi".to_vec()));
//!
//! let bytes = header.pack(&data)?;
//! assert_eq!(bytes, b"\x01\x00\x02hi");
//! assert_eq!(header.unpack(&bytes)?, data);
//! # Ok::<(), wirestruct::StructError>(())
//! ```
//!
//! Schemas are validated when the [`Struct`] is built: unknown type,
//! byte-order, or encoding names and malformed policies are reported
//! there, not from the middle of a pack/unpack call.

pub mod errors;
pub mod field;
pub mod order;
pub mod structure;
pub mod text;
pub mod types;
pub mod value;

pub use errors::StructError;
pub use field::{Delimiter, Field, FieldTransform, Length, Repeat};
pub use order::ByteOrder;
pub use structure::Struct;
pub use text::{Encoding, TextPolicy};
pub use types::{Kind, PrimitiveType};
pub use value::Value;
