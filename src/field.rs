//! Schema fields: one named (or anonymous) slot within a
//! [`Struct`](crate::Struct), together with its length policy, repeat
//! policy, optional default, text encoding, and value transform.

use crate::errors::StructError;
use crate::order::ByteOrder;
use crate::text::{self, Encoding, TextPolicy};
use crate::types::{self, Kind, PrimitiveType};
use crate::value::Value;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};

/// A fixed single-byte boundary marker denoting the end of a
/// variable-length field on the wire. Common delimiters are `0x00`, `b','`,
/// and `b'\n'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(u8);

impl Delimiter {
    pub fn new(byte: u8) -> Self {
        Delimiter(byte)
    }

    pub fn byte(self) -> u8 {
        self.0
    }
}

type TransformFn = Box<dyn Fn(Value) -> Value + Send + Sync>;
type LengthFn = Box<dyn Fn(&HashMap<String, Value>) -> usize + Send + Sync>;

/// A pair of pure functions converting between the wire-adjacent value and
/// the logical value seen by callers.
///
/// The pack-direction function runs on the value taken from the caller's
/// map, before repeat and length handling; the unpack-direction function
/// runs on the decoded value (the whole list, for repeated fields) just
/// before it is stored in the output map. For example, a `UINT8` field
/// carrying a color code can expose an application-level color value while
/// the wire keeps the raw number.
pub struct FieldTransform {
    pack_fn: TransformFn,
    unpack_fn: TransformFn,
}

impl FieldTransform {
    pub fn new(
        pack_fn: impl Fn(Value) -> Value + Send + Sync + 'static,
        unpack_fn: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        FieldTransform {
            pack_fn: Box::new(pack_fn),
            unpack_fn: Box::new(unpack_fn),
        }
    }

    pub(crate) fn apply_pack(&self, value: Value) -> Value {
        (self.pack_fn)(value)
    }

    pub(crate) fn apply_unpack(&self, value: Value) -> Value {
        (self.unpack_fn)(value)
    }
}

impl fmt::Debug for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldTransform")
    }
}

/// How many instances of a field appear on the wire.
pub enum Repeat {
    /// A single instance; the value-set holds a scalar.
    Once,
    /// Exactly this many instances; the value-set holds a list.
    Times(usize),
    /// A count prefix on the wire, encoded through the given scalar
    /// integer field; the value-set holds a list.
    Counted(Box<Field>),
}

impl fmt::Debug for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::Once => f.write_str("Once"),
            Repeat::Times(n) => f.debug_tuple("Times").field(n).finish(),
            Repeat::Counted(field) => f.debug_tuple("Counted").field(field).finish(),
        }
    }
}

/// How the byte length of one variable-length instance is determined.
/// Fixed-width types carry no length policy at all.
pub enum Length {
    /// Exactly this many bytes.
    Fixed(usize),
    /// A length prefix on the wire, encoded through the given scalar
    /// integer field, immediately before the instance's bytes.
    Prefixed(Box<Field>),
    /// The instance runs until the delimiter byte, which is consumed from
    /// the wire but not part of the value.
    Delimited(Delimiter),
    /// Computed from the value-set: the full pack input when packing, the
    /// values unpacked so far when unpacking.
    Computed(LengthFn),
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Length::Prefixed(field) => f.debug_tuple("Prefixed").field(field).finish(),
            Length::Delimited(d) => f.debug_tuple("Delimited").field(d).finish(),
            Length::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// A value slot within a [`Struct`](crate::Struct).
///
/// Built from a primitive type name, then configured with the
/// builder-style setters:
///
/// ```
/// use wirestruct::{Delimiter, Field};
///
/// let version = Field::new("UINT8")?.name("version");
/// let tag = Field::new("BYTES")?.name("tag").delimiter(Delimiter::new(0));
/// # Ok::<(), wirestruct::StructError>(())
/// ```
///
/// A field without a name still occupies its bytes on the wire but is
/// invisible in the value-set; packing such a field uses its default.
pub struct Field {
    pub(crate) ty: PrimitiveType,
    pub(crate) name: Option<String>,
    pub(crate) repeat: Repeat,
    pub(crate) default: Option<Value>,
    pub(crate) encoding: Option<Encoding>,
    pub(crate) policy: TextPolicy,
    pub(crate) length: Option<Length>,
    pub(crate) transform: Option<FieldTransform>,
}

impl Field {
    /// Creates a field of the named primitive type; see [`crate::types`]
    /// for the registered names.
    pub fn new(type_name: &str) -> Result<Self, StructError> {
        Ok(Field {
            ty: types::lookup(type_name)?,
            name: None,
            repeat: Repeat::Once,
            default: None,
            encoding: None,
            policy: TextPolicy::Strict,
            length: None,
            transform: None,
        })
    }

    /// Key for this field's value in the value-set.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Fixed repetition count. A count of 1 is the same as not repeating.
    pub fn repeat(mut self, count: usize) -> Self {
        self.repeat = if count == 1 {
            Repeat::Once
        } else {
            Repeat::Times(count)
        };
        self
    }

    /// Wire-driven repetition: `counter` is packed/unpacked immediately
    /// before the instances and holds their number. It must be a scalar
    /// integer field.
    pub fn repeat_field(mut self, counter: Field) -> Self {
        self.repeat = Repeat::Counted(Box::new(counter));
        self
    }

    /// Value to pack when the caller's map has no entry for this field.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Text encoding for `STRING` fields; see [`crate::text`] for the
    /// registered names.
    pub fn encoding(mut self, name: &str) -> Result<Self, StructError> {
        self.encoding = Some(text::lookup(name)?);
        Ok(self)
    }

    /// Error policy for the text encoding (strict by default).
    pub fn encoding_policy(mut self, policy: TextPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fixed byte length for a variable-length field.
    pub fn length(mut self, bytes: usize) -> Self {
        self.length = Some(Length::Fixed(bytes));
        self
    }

    /// Wire-driven length: `prefix` is packed/unpacked immediately before
    /// each instance and holds its byte length. It must be a scalar
    /// integer field.
    pub fn length_field(mut self, prefix: Field) -> Self {
        self.length = Some(Length::Prefixed(Box::new(prefix)));
        self
    }

    /// The instance runs until `delimiter` appears on the wire.
    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.length = Some(Length::Delimited(delimiter));
        self
    }

    /// Length computed from the value-set. When packing, the callback sees
    /// the full caller-supplied map and its result must match the packed
    /// value's byte length; when unpacking it sees the values unpacked so
    /// far.
    pub fn length_fn(
        mut self,
        f: impl Fn(&HashMap<String, Value>) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.length = Some(Length::Computed(Box::new(f)));
        self
    }

    /// Value transform applied around pack/unpack; see [`FieldTransform`].
    pub fn transform(mut self, transform: FieldTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Field name for error reports: the configured name, else the type name.
    pub(crate) fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.ty.name().to_string(),
        }
    }

    /// The value to pack: the caller's entry when named and present,
    /// otherwise the configured default.
    pub(crate) fn pack_source(&self, data: &HashMap<String, Value>) -> Result<Value, StructError> {
        let found = match &self.name {
            Some(name) => data.get(name).cloned().or_else(|| self.default.clone()),
            None => self.default.clone(),
        };
        found.ok_or_else(|| {
            StructError::Schema(format!(
                "field {} has no value to pack and no default",
                self.label()
            ))
        })
    }

    /// Checks the construction-time invariants for this field, including
    /// any length-prefix or repeat-count reference fields.
    pub(crate) fn validate(&self) -> Result<(), StructError> {
        let variable = self.ty.width().is_none();
        match (&self.length, variable) {
            (Some(_), false) => {
                return Err(StructError::Schema(format!(
                    "field {}: length policy on fixed-width type {}",
                    self.label(),
                    self.ty.name()
                )))
            }
            (None, true) => {
                return Err(StructError::Schema(format!(
                    "field {}: {} fields require a length policy",
                    self.label(),
                    self.ty.name()
                )))
            }
            _ => {}
        }
        if let Some(Length::Fixed(0)) = &self.length {
            return Err(StructError::Schema(format!(
                "field {}: fixed length must be positive",
                self.label()
            )));
        }
        if let Some(Length::Prefixed(prefix)) = &self.length {
            self.check_reference(prefix, "length")?;
        }

        if self.ty.kind() == Kind::Str {
            if self.encoding.is_none() {
                return Err(StructError::Schema(format!(
                    "field {}: STRING fields require an encoding",
                    self.label()
                )));
            }
        } else if self.encoding.is_some() {
            return Err(StructError::Schema(format!(
                "field {}: encoding is only valid on STRING fields",
                self.label()
            )));
        }

        match &self.repeat {
            Repeat::Once => {}
            Repeat::Times(0) => {
                return Err(StructError::Schema(format!(
                    "field {}: repeat count must be positive",
                    self.label()
                )))
            }
            Repeat::Times(n) => {
                if let Some(default) = &self.default {
                    match default.as_list() {
                        Some(list) if list.len() == *n => {}
                        Some(list) => {
                            return Err(StructError::Schema(format!(
                                "field {}: default has {} elements but repeat is {}",
                                self.label(),
                                list.len(),
                                n
                            )))
                        }
                        None => {
                            return Err(StructError::Schema(format!(
                                "field {}: default for a repeated field must be a list",
                                self.label()
                            )))
                        }
                    }
                }
            }
            Repeat::Counted(counter) => {
                self.check_reference(counter, "repeat")?;
                if let Some(default) = &self.default {
                    if default.as_list().is_none() {
                        return Err(StructError::Schema(format!(
                            "field {}: default for a repeated field must be a list",
                            self.label()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_reference(&self, reference: &Field, role: &str) -> Result<(), StructError> {
        if !reference.ty.is_integer() {
            return Err(StructError::Schema(format!(
                "field {}: {} reference must be an integer type, not {}",
                self.label(),
                role,
                reference.ty.name()
            )));
        }
        if !matches!(reference.repeat, Repeat::Once) {
            return Err(StructError::Schema(format!(
                "field {}: {} reference must be a scalar field",
                self.label(),
                role
            )));
        }
        reference.validate()
    }

    /// The wire image of one variable-length instance: the raw bytes for
    /// `BYTES`, the encoded text for `STRING`. Length policies are always
    /// measured against these bytes.
    pub(crate) fn wire_bytes(&self, value: &Value) -> Result<Vec<u8>, StructError> {
        match self.ty.kind() {
            Kind::Bytes => value
                .as_bytes()
                .map(|b| b.to_vec())
                .ok_or_else(|| self.type_mismatch(value)),
            Kind::Str => {
                let s = value.as_str().ok_or_else(|| self.type_mismatch(value))?;
                let encoding = self.require_encoding()?;
                encoding.encode(&self.label(), s, self.policy)
            }
            _ => Err(StructError::Schema(format!(
                "field {}: {} has no variable-length wire image",
                self.label(),
                self.ty.name()
            ))),
        }
    }

    /// Encodes one instance onto the output.
    pub(crate) fn pack_value(
        &self,
        order: ByteOrder,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), StructError> {
        match self.ty.kind() {
            Kind::Bytes | Kind::Str => {
                let wire = self.wire_bytes(value)?;
                out.extend_from_slice(&wire);
                Ok(())
            }
            Kind::Bool => {
                let b = match value {
                    Value::Bool(b) => *b,
                    other => other.as_u64().ok_or_else(|| self.type_mismatch(value))? != 0,
                };
                out.write_u8(b as u8)?;
                Ok(())
            }
            Kind::U8 => {
                let v = self.unsigned_in_range(value, u8::MAX as u64)?;
                out.write_u8(v as u8)?;
                Ok(())
            }
            Kind::U16 => {
                let v = self.unsigned_in_range(value, u16::MAX as u64)?;
                Ok(order.write_u16(out, v as u16)?)
            }
            Kind::U32 => {
                let v = self.unsigned_in_range(value, u32::MAX as u64)?;
                Ok(order.write_u32(out, v as u32)?)
            }
            Kind::U64 => {
                let v = value.as_u64().ok_or_else(|| self.type_mismatch(value))?;
                Ok(order.write_u64(out, v)?)
            }
            Kind::I8 => {
                let v = self.signed_in_range(value, i8::MIN as i64, i8::MAX as i64)?;
                out.write_i8(v as i8)?;
                Ok(())
            }
            Kind::I16 => {
                let v = self.signed_in_range(value, i16::MIN as i64, i16::MAX as i64)?;
                Ok(order.write_i16(out, v as i16)?)
            }
            Kind::I32 => {
                let v = self.signed_in_range(value, i32::MIN as i64, i32::MAX as i64)?;
                Ok(order.write_i32(out, v as i32)?)
            }
            Kind::I64 => {
                let v = value.as_i64().ok_or_else(|| self.type_mismatch(value))?;
                Ok(order.write_i64(out, v)?)
            }
            Kind::Float => {
                let v = value.as_f32().ok_or_else(|| self.type_mismatch(value))?;
                Ok(order.write_f32(out, v)?)
            }
            Kind::Double => {
                let v = value.as_f64().ok_or_else(|| self.type_mismatch(value))?;
                Ok(order.write_f64(out, v)?)
            }
        }
    }

    /// Decodes one instance from the cursor. `length` is the byte count for
    /// variable-length kinds and ignored for fixed-width kinds.
    pub(crate) fn unpack_value(
        &self,
        order: ByteOrder,
        cur: &mut Cursor<&[u8]>,
        length: Option<usize>,
    ) -> Result<Value, StructError> {
        match self.ty.kind() {
            Kind::Bytes => {
                let len = self.require_length(length)?;
                Ok(Value::Bytes(read_exact_vec(cur, len)?))
            }
            Kind::Str => {
                let len = self.require_length(length)?;
                let buf = read_exact_vec(cur, len)?;
                let encoding = self.require_encoding()?;
                Ok(Value::Str(encoding.decode(&self.label(), &buf, self.policy)?))
            }
            Kind::Bool => Ok(Value::Bool(cur.read_u8()? != 0)),
            Kind::U8 => Ok(Value::U8(cur.read_u8()?)),
            Kind::U16 => Ok(Value::U16(order.read_u16(cur)?)),
            Kind::U32 => Ok(Value::U32(order.read_u32(cur)?)),
            Kind::U64 => Ok(Value::U64(order.read_u64(cur)?)),
            Kind::I8 => Ok(Value::I8(cur.read_i8()?)),
            Kind::I16 => Ok(Value::I16(order.read_i16(cur)?)),
            Kind::I32 => Ok(Value::I32(order.read_i32(cur)?)),
            Kind::I64 => Ok(Value::I64(order.read_i64(cur)?)),
            Kind::Float => Ok(Value::Float(order.read_f32(cur)?)),
            Kind::Double => Ok(Value::Double(order.read_f64(cur)?)),
        }
    }

    fn require_length(&self, length: Option<usize>) -> Result<usize, StructError> {
        length.ok_or_else(|| {
            StructError::Schema(format!(
                "field {}: variable-length field without a length",
                self.label()
            ))
        })
    }

    fn require_encoding(&self) -> Result<Encoding, StructError> {
        self.encoding.ok_or_else(|| {
            StructError::Schema(format!(
                "field {}: STRING fields require an encoding",
                self.label()
            ))
        })
    }

    fn unsigned_in_range(&self, value: &Value, max: u64) -> Result<u64, StructError> {
        let v = value.as_u64().ok_or_else(|| self.type_mismatch(value))?;
        if v > max {
            return Err(StructError::Schema(format!(
                "field {}: value {} out of range for {}",
                self.label(),
                v,
                self.ty.name()
            )));
        }
        Ok(v)
    }

    fn signed_in_range(&self, value: &Value, min: i64, max: i64) -> Result<i64, StructError> {
        let v = value.as_i64().ok_or_else(|| self.type_mismatch(value))?;
        if v < min || v > max {
            return Err(StructError::Schema(format!(
                "field {}: value {} out of range for {}",
                self.label(),
                v,
                self.ty.name()
            )));
        }
        Ok(v)
    }

    fn type_mismatch(&self, value: &Value) -> StructError {
        StructError::Schema(format!(
            "field {}: cannot pack {:?} as {}",
            self.label(),
            value,
            self.ty.name()
        ))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("type", &self.ty.name())
            .field("name", &self.name)
            .field("repeat", &self.repeat)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}={}", name, self.ty.name()),
            None => f.write_str(self.ty.name()),
        }
    }
}

/// Reads exactly `len` bytes. Lengths past the end of the buffer are
/// refused before any allocation happens.
fn read_exact_vec(cur: &mut Cursor<&[u8]>, len: usize) -> io::Result<Vec<u8>> {
    let remaining = cur.get_ref().len().saturating_sub(cur.position() as usize);
    if len > remaining {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "buffer exhausted",
        ));
    }
    let mut buf = vec![0u8; len];
    cur.read_exact(&mut buf)?;
    Ok(buf)
}
