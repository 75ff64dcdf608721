//! The byte order table, and the endianness-dispatched read/write helpers
//! used for every multi-byte numeric field.
//!
//! Registered names: `NATIVE_ENDIAN`, `LITTLE_ENDIAN`, `BIG_ENDIAN`, and
//! `NET_ENDIAN` (network byte order, an alias of big-endian).

use crate::errors::StructError;
use byteorder::{BigEndian, LittleEndian, NativeEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Cursor};

/// Order of bytes within a multi-byte number. Exactly one byte order is
/// bound per [`Struct`](crate::Struct) and applies to all of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Native,
    Little,
    Big,
}

/// Looks up a byte order by its registered name.
pub fn lookup(name: &str) -> Result<ByteOrder, StructError> {
    match name {
        "NATIVE_ENDIAN" => Ok(ByteOrder::Native),
        "LITTLE_ENDIAN" => Ok(ByteOrder::Little),
        "BIG_ENDIAN" | "NET_ENDIAN" => Ok(ByteOrder::Big),
        _ => Err(StructError::UnknownByteOrder(name.to_string())),
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ByteOrder::Native => "NATIVE_ENDIAN",
            ByteOrder::Little => "LITTLE_ENDIAN",
            ByteOrder::Big => "BIG_ENDIAN",
        };
        f.write_str(name)
    }
}

impl ByteOrder {
    pub(crate) fn read_u16(self, r: &mut Cursor<&[u8]>) -> io::Result<u16> {
        match self {
            ByteOrder::Native => r.read_u16::<NativeEndian>(),
            ByteOrder::Little => r.read_u16::<LittleEndian>(),
            ByteOrder::Big => r.read_u16::<BigEndian>(),
        }
    }
    pub(crate) fn read_u32(self, r: &mut Cursor<&[u8]>) -> io::Result<u32> {
        match self {
            ByteOrder::Native => r.read_u32::<NativeEndian>(),
            ByteOrder::Little => r.read_u32::<LittleEndian>(),
            ByteOrder::Big => r.read_u32::<BigEndian>(),
        }
    }
    pub(crate) fn read_u64(self, r: &mut Cursor<&[u8]>) -> io::Result<u64> {
        match self {
            ByteOrder::Native => r.read_u64::<NativeEndian>(),
            ByteOrder::Little => r.read_u64::<LittleEndian>(),
            ByteOrder::Big => r.read_u64::<BigEndian>(),
        }
    }
    pub(crate) fn read_i16(self, r: &mut Cursor<&[u8]>) -> io::Result<i16> {
        match self {
            ByteOrder::Native => r.read_i16::<NativeEndian>(),
            ByteOrder::Little => r.read_i16::<LittleEndian>(),
            ByteOrder::Big => r.read_i16::<BigEndian>(),
        }
    }
    pub(crate) fn read_i32(self, r: &mut Cursor<&[u8]>) -> io::Result<i32> {
        match self {
            ByteOrder::Native => r.read_i32::<NativeEndian>(),
            ByteOrder::Little => r.read_i32::<LittleEndian>(),
            ByteOrder::Big => r.read_i32::<BigEndian>(),
        }
    }
    pub(crate) fn read_i64(self, r: &mut Cursor<&[u8]>) -> io::Result<i64> {
        match self {
            ByteOrder::Native => r.read_i64::<NativeEndian>(),
            ByteOrder::Little => r.read_i64::<LittleEndian>(),
            ByteOrder::Big => r.read_i64::<BigEndian>(),
        }
    }
    pub(crate) fn read_f32(self, r: &mut Cursor<&[u8]>) -> io::Result<f32> {
        match self {
            ByteOrder::Native => r.read_f32::<NativeEndian>(),
            ByteOrder::Little => r.read_f32::<LittleEndian>(),
            ByteOrder::Big => r.read_f32::<BigEndian>(),
        }
    }
    pub(crate) fn read_f64(self, r: &mut Cursor<&[u8]>) -> io::Result<f64> {
        match self {
            ByteOrder::Native => r.read_f64::<NativeEndian>(),
            ByteOrder::Little => r.read_f64::<LittleEndian>(),
            ByteOrder::Big => r.read_f64::<BigEndian>(),
        }
    }

    pub(crate) fn write_u16(self, w: &mut Vec<u8>, v: u16) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_u16::<NativeEndian>(v),
            ByteOrder::Little => w.write_u16::<LittleEndian>(v),
            ByteOrder::Big => w.write_u16::<BigEndian>(v),
        }
    }
    pub(crate) fn write_u32(self, w: &mut Vec<u8>, v: u32) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_u32::<NativeEndian>(v),
            ByteOrder::Little => w.write_u32::<LittleEndian>(v),
            ByteOrder::Big => w.write_u32::<BigEndian>(v),
        }
    }
    pub(crate) fn write_u64(self, w: &mut Vec<u8>, v: u64) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_u64::<NativeEndian>(v),
            ByteOrder::Little => w.write_u64::<LittleEndian>(v),
            ByteOrder::Big => w.write_u64::<BigEndian>(v),
        }
    }
    pub(crate) fn write_i16(self, w: &mut Vec<u8>, v: i16) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_i16::<NativeEndian>(v),
            ByteOrder::Little => w.write_i16::<LittleEndian>(v),
            ByteOrder::Big => w.write_i16::<BigEndian>(v),
        }
    }
    pub(crate) fn write_i32(self, w: &mut Vec<u8>, v: i32) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_i32::<NativeEndian>(v),
            ByteOrder::Little => w.write_i32::<LittleEndian>(v),
            ByteOrder::Big => w.write_i32::<BigEndian>(v),
        }
    }
    pub(crate) fn write_i64(self, w: &mut Vec<u8>, v: i64) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_i64::<NativeEndian>(v),
            ByteOrder::Little => w.write_i64::<LittleEndian>(v),
            ByteOrder::Big => w.write_i64::<BigEndian>(v),
        }
    }
    pub(crate) fn write_f32(self, w: &mut Vec<u8>, v: f32) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_f32::<NativeEndian>(v),
            ByteOrder::Little => w.write_f32::<LittleEndian>(v),
            ByteOrder::Big => w.write_f32::<BigEndian>(v),
        }
    }
    pub(crate) fn write_f64(self, w: &mut Vec<u8>, v: f64) -> io::Result<()> {
        match self {
            ByteOrder::Native => w.write_f64::<NativeEndian>(v),
            ByteOrder::Little => w.write_f64::<LittleEndian>(v),
            ByteOrder::Big => w.write_f64::<BigEndian>(v),
        }
    }
}
