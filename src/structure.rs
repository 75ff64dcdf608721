//! Ordered field sequences and the pack/unpack orchestration.
//!
//! A [`Struct`] resolves each field's repeat count and byte length in
//! declaration order. Declaration order is both wire order and dependency
//! order: a length callback only ever sees values that were unpacked
//! before it ran. One pack or unpack call is a single forward pass over
//! the field list; the only backtracking is the bounded scan-and-restore
//! used to find a delimiter.

use crate::errors::StructError;
use crate::field::{Delimiter, Field, Length, Repeat};
use crate::order::{self, ByteOrder};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;

/// A definition of a binary format: an ordered list of [`Field`]s and one
/// byte order.
///
/// A `Struct` is immutable after construction and keeps no per-call state,
/// so one instance can serve any number of concurrent pack/unpack calls.
#[derive(Debug)]
pub struct Struct {
    order: ByteOrder,
    fields: Vec<Field>,
}

impl Struct {
    /// Builds a struct over the named byte order (see [`crate::order`]),
    /// validating every field's configuration eagerly so that schema
    /// defects surface here rather than in some later pack/unpack call.
    pub fn new(order_name: &str, fields: Vec<Field>) -> Result<Self, StructError> {
        let order = order::lookup(order_name)?;
        for field in &fields {
            field.validate()?;
        }
        Ok(Struct { order, fields })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Serializes `data` into a fresh byte vector.
    pub fn pack(&self, data: &HashMap<String, Value>) -> Result<Vec<u8>, StructError> {
        let mut out = Vec::new();
        self.pack_into(data, &mut out)?;
        Ok(out)
    }

    /// Serializes `data` onto the end of `out`, so one struct's wire image
    /// can be embedded in a larger stream.
    pub fn pack_into(
        &self,
        data: &HashMap<String, Value>,
        out: &mut Vec<u8>,
    ) -> Result<(), StructError> {
        for field in &self.fields {
            self.pack_field(field, data, out)?;
        }
        Ok(())
    }

    /// Deserializes a value-set from a complete byte buffer.
    pub fn unpack(&self, bytes: &[u8]) -> Result<HashMap<String, Value>, StructError> {
        let mut cur = Cursor::new(bytes);
        self.unpack_from(&mut cur)
    }

    /// Deserializes from the cursor's current position, leaving the cursor
    /// just past the last byte this struct consumed.
    pub fn unpack_from(
        &self,
        cur: &mut Cursor<&[u8]>,
    ) -> Result<HashMap<String, Value>, StructError> {
        let mut out = HashMap::new();
        for field in &self.fields {
            let value = self.unpack_field(field, cur, &out)?;
            if let Some(name) = &field.name {
                out.insert(name.clone(), value);
            }
        }
        Ok(out)
    }

    fn pack_field(
        &self,
        field: &Field,
        data: &HashMap<String, Value>,
        out: &mut Vec<u8>,
    ) -> Result<(), StructError> {
        let mut source = field.pack_source(data)?;
        if let Some(transform) = &field.transform {
            source = transform.apply_pack(source);
        }
        match &field.repeat {
            Repeat::Once => self.pack_instance(field, &source, data, out),
            Repeat::Times(n) => {
                let list = self.expect_list(field, source)?;
                if list.len() != *n {
                    return Err(StructError::Schema(format!(
                        "field {}: expected {} elements, got {}",
                        field.label(),
                        n,
                        list.len()
                    )));
                }
                for value in &list {
                    self.pack_instance(field, value, data, out)?;
                }
                Ok(())
            }
            Repeat::Counted(counter) => {
                let list = self.expect_list(field, source)?;
                counter.pack_value(self.order, &Value::U64(list.len() as u64), out)?;
                for value in &list {
                    self.pack_instance(field, value, data, out)?;
                }
                Ok(())
            }
        }
    }

    fn pack_instance(
        &self,
        field: &Field,
        value: &Value,
        data: &HashMap<String, Value>,
        out: &mut Vec<u8>,
    ) -> Result<(), StructError> {
        let policy = match &field.length {
            None => return field.pack_value(self.order, value, out),
            Some(policy) => policy,
        };
        // Variable-length instance: produce the wire bytes first, since
        // every length policy is measured against them.
        let wire = field.wire_bytes(value)?;
        match policy {
            Length::Fixed(n) => {
                if wire.len() != *n {
                    return Err(StructError::Schema(format!(
                        "field {}: value is {} bytes, fixed length is {}",
                        field.label(),
                        wire.len(),
                        n
                    )));
                }
            }
            Length::Prefixed(prefix) => {
                prefix.pack_value(self.order, &Value::U64(wire.len() as u64), out)?;
            }
            Length::Computed(length_fn) => {
                let expected = length_fn(data);
                if expected != wire.len() {
                    return Err(StructError::InconsistentLength {
                        field: field.label(),
                        expected,
                        actual: wire.len(),
                    });
                }
            }
            Length::Delimited(_) => {}
        }
        out.extend_from_slice(&wire);
        if let Length::Delimited(delimiter) = policy {
            out.push(delimiter.byte());
        }
        Ok(())
    }

    fn expect_list(&self, field: &Field, source: Value) -> Result<Vec<Value>, StructError> {
        source.into_list().ok_or_else(|| {
            StructError::Schema(format!(
                "field {}: repeated field expects a list",
                field.label()
            ))
        })
    }

    fn unpack_field(
        &self,
        field: &Field,
        cur: &mut Cursor<&[u8]>,
        so_far: &HashMap<String, Value>,
    ) -> Result<Value, StructError> {
        let count = match &field.repeat {
            Repeat::Once => None,
            Repeat::Times(n) => Some(*n),
            Repeat::Counted(counter) => {
                let raw = counter.unpack_value(self.order, cur, None)?;
                Some(reference_int(field, "repeat count", &raw)?)
            }
        };
        let mut value = match count {
            None => self.unpack_instance(field, cur, so_far)?,
            Some(n) => {
                let mut values = Vec::new();
                for _ in 0..n {
                    values.push(self.unpack_instance(field, cur, so_far)?);
                }
                Value::List(values)
            }
        };
        if let Some(transform) = &field.transform {
            value = transform.apply_unpack(value);
        }
        Ok(value)
    }

    fn unpack_instance(
        &self,
        field: &Field,
        cur: &mut Cursor<&[u8]>,
        so_far: &HashMap<String, Value>,
    ) -> Result<Value, StructError> {
        let length = match &field.length {
            None => None,
            Some(Length::Fixed(n)) => Some(*n),
            Some(Length::Prefixed(prefix)) => {
                let raw = prefix.unpack_value(self.order, cur, None)?;
                Some(reference_int(field, "length", &raw)?)
            }
            Some(Length::Computed(length_fn)) => Some(length_fn(so_far)),
            Some(Length::Delimited(delimiter)) => Some(scan_to_delimiter(cur, *delimiter)?),
        };
        let value = field.unpack_value(self.order, cur, length)?;
        if let Some(Length::Delimited(_)) = &field.length {
            // Consume the delimiter byte itself.
            cur.set_position(cur.position() + 1);
        }
        Ok(value)
    }
}

impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(|x| x.to_string()).collect();
        write!(f, "<Struct {}: [{}]>", self.order, fields.join(", "))
    }
}

/// Converts an unpacked reference-field value (length prefix or repeat
/// count) to a usable size.
fn reference_int(field: &Field, role: &str, raw: &Value) -> Result<usize, StructError> {
    let n = raw.as_i64().ok_or_else(|| {
        StructError::Schema(format!(
            "field {}: {} is not an integer",
            field.label(),
            role
        ))
    })?;
    usize::try_from(n).map_err(|_| {
        StructError::Schema(format!(
            "field {}: negative {} {}",
            field.label(),
            role,
            n
        ))
    })
}

/// Scans forward for the delimiter byte without moving the cursor and
/// returns the number of bytes strictly before it.
fn scan_to_delimiter(cur: &Cursor<&[u8]>, delimiter: Delimiter) -> Result<usize, StructError> {
    let start = cur.position() as usize;
    cur.get_ref()
        .get(start..)
        .and_then(|rest| rest.iter().position(|&b| b == delimiter.byte()))
        .ok_or(StructError::DelimiterNotFound(delimiter.byte()))
}
