//! Text encodings for `STRING` fields.
//!
//! The encoding table is the engine's view of the platform text facility:
//! a name resolves to an [`Encoding`], and a per-field [`TextPolicy`]
//! decides what happens when a character or byte sequence is not
//! representable.

use crate::errors::StructError;

/// A registered text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

/// What to do when a character (encode) or byte sequence (decode) is not
/// representable in the field's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPolicy {
    /// Fail with [`StructError::Encode`] / [`StructError::Decode`].
    #[default]
    Strict,
    /// Substitute `?` on encode and U+FFFD on decode.
    Replace,
    /// Drop the offending character or bytes.
    Ignore,
}

/// Looks up an encoding by name. Names are case-insensitive and `_` and `-`
/// are interchangeable, so `"utf-8"`, `"UTF8"`, and `"utf_8"` all resolve.
pub fn lookup(name: &str) -> Result<Encoding, StructError> {
    let norm = name.to_ascii_lowercase().replace('_', "-");
    match norm.as_str() {
        "utf-8" | "utf8" => Ok(Encoding::Utf8),
        "ascii" | "us-ascii" => Ok(Encoding::Ascii),
        "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
        "utf-16-le" | "utf-16le" | "utf16-le" | "utf16le" => Ok(Encoding::Utf16Le),
        "utf-16-be" | "utf-16be" | "utf16-be" | "utf16be" => Ok(Encoding::Utf16Be),
        _ => Err(StructError::UnknownEncoding(name.to_string())),
    }
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
            Encoding::Utf16Le => "utf-16-le",
            Encoding::Utf16Be => "utf-16-be",
        }
    }

    /// Encodes `text` to wire bytes. `field` is only used in error reports.
    pub(crate) fn encode(
        self,
        field: &str,
        text: &str,
        policy: TextPolicy,
    ) -> Result<Vec<u8>, StructError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => encode_single_byte(self, field, text, policy, 0x7F),
            Encoding::Latin1 => encode_single_byte(self, field, text, policy, 0xFF),
            Encoding::Utf16Le => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            Encoding::Utf16Be => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Ok(out)
            }
        }
    }

    /// Decodes wire bytes to text. `field` is only used in error reports.
    pub(crate) fn decode(
        self,
        field: &str,
        bytes: &[u8],
        policy: TextPolicy,
    ) -> Result<String, StructError> {
        match self {
            Encoding::Utf8 => decode_utf8(self, field, bytes, policy),
            Encoding::Ascii => {
                let mut out = String::with_capacity(bytes.len());
                for (i, &b) in bytes.iter().enumerate() {
                    if b <= 0x7F {
                        out.push(b as char);
                    } else {
                        match policy {
                            TextPolicy::Strict => {
                                return Err(StructError::Decode {
                                    field: field.to_string(),
                                    codec: self.name(),
                                    position: i,
                                })
                            }
                            TextPolicy::Replace => out.push(char::REPLACEMENT_CHARACTER),
                            TextPolicy::Ignore => {}
                        }
                    }
                }
                Ok(out)
            }
            // Every byte maps to U+0000..=U+00FF.
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf16Le | Encoding::Utf16Be => decode_utf16(self, field, bytes, policy),
        }
    }
}

fn encode_single_byte(
    encoding: Encoding,
    field: &str,
    text: &str,
    policy: TextPolicy,
    max: u32,
) -> Result<Vec<u8>, StructError> {
    let mut out = Vec::with_capacity(text.len());
    for (i, ch) in text.chars().enumerate() {
        if (ch as u32) <= max {
            out.push(ch as u8);
        } else {
            match policy {
                TextPolicy::Strict => {
                    return Err(StructError::Encode {
                        field: field.to_string(),
                        codec: encoding.name(),
                        ch,
                        position: i,
                    })
                }
                TextPolicy::Replace => out.push(b'?'),
                TextPolicy::Ignore => {}
            }
        }
    }
    Ok(out)
}

fn decode_utf8(
    encoding: Encoding,
    field: &str,
    bytes: &[u8],
    policy: TextPolicy,
) -> Result<String, StructError> {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    let mut offset = 0usize;
    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                out.push_str(s);
                return Ok(out);
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if matches!(policy, TextPolicy::Strict) {
                    return Err(StructError::Decode {
                        field: field.to_string(),
                        codec: encoding.name(),
                        position: offset + valid,
                    });
                }
                if let Ok(s) = std::str::from_utf8(&rest[..valid]) {
                    out.push_str(s);
                }
                if matches!(policy, TextPolicy::Replace) {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                let skip = valid + e.error_len().unwrap_or(rest.len() - valid);
                rest = &rest[skip..];
                offset += skip;
            }
        }
    }
}

fn decode_utf16(
    encoding: Encoding,
    field: &str,
    bytes: &[u8],
    policy: TextPolicy,
) -> Result<String, StructError> {
    let mut units = Vec::with_capacity(bytes.len() / 2);
    let mut pairs = bytes.chunks_exact(2);
    for pair in pairs.by_ref() {
        let unit = match encoding {
            Encoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
            _ => u16::from_le_bytes([pair[0], pair[1]]),
        };
        units.push(unit);
    }
    let trailing = !pairs.remainder().is_empty();
    if trailing && matches!(policy, TextPolicy::Strict) {
        return Err(StructError::Decode {
            field: field.to_string(),
            codec: encoding.name(),
            position: bytes.len() - 1,
        });
    }

    let mut out = String::with_capacity(units.len());
    let mut unit_index = 0usize;
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(ch) => {
                out.push(ch);
                unit_index += ch.len_utf16();
            }
            Err(_) => {
                match policy {
                    TextPolicy::Strict => {
                        return Err(StructError::Decode {
                            field: field.to_string(),
                            codec: encoding.name(),
                            position: unit_index * 2,
                        })
                    }
                    TextPolicy::Replace => out.push(char::REPLACEMENT_CHARACTER),
                    TextPolicy::Ignore => {}
                }
                unit_index += 1;
            }
        }
    }
    if trailing && matches!(policy, TextPolicy::Replace) {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    Ok(out)
}
