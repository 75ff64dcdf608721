//! Integration tests: schema construction, pack/unpack round-trips, length
//! and repeat policies, delimiters, text encodings, transforms, and errors.

use std::collections::HashMap;
use std::io::Cursor;
use wirestruct::{
    Delimiter, Field, FieldTransform, Struct, StructError, TextPolicy, Value,
};

fn values(entries: &[(&str, Value)]) -> HashMap<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn round_trip(s: &Struct, packed: &[u8], unpacked: &HashMap<String, Value>) {
    assert_eq!(packed, s.pack(unpacked).expect("pack").as_slice());
    assert_eq!(*unpacked, s.unpack(packed).expect("unpack"));
}

// ==================== Display ====================

#[test]
fn display_rendering() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type"),
            Field::new("BOOL").expect("type").name("x"),
        ],
    )
    .expect("struct");
    assert_eq!(s.to_string(), "<Struct BIG_ENDIAN: [UINT8, x=BOOL]>");
}

// ==================== Endianness ====================

fn one_u16(order: &str) -> Struct {
    Struct::new(order, vec![Field::new("UINT16").expect("type").name("a")]).expect("struct")
}

#[test]
fn endianness() {
    let data = values(&[("a", Value::U16(0x1234))]);
    round_trip(&one_u16("BIG_ENDIAN"), b"\x12\x34", &data);
    round_trip(&one_u16("NET_ENDIAN"), b"\x12\x34", &data);
    round_trip(&one_u16("LITTLE_ENDIAN"), b"\x34\x12", &data);
    let expect_native: &[u8] = if cfg!(target_endian = "little") {
        b"\x34\x12"
    } else {
        b"\x12\x34"
    };
    round_trip(&one_u16("NATIVE_ENDIAN"), expect_native, &data);
}

// ==================== Numeric types ====================

#[test]
fn integer_kinds() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("SINT8").expect("type").name("a"),
            Field::new("UINT8").expect("type").name("b"),
            Field::new("SINT16").expect("type").name("c"),
            Field::new("UINT16").expect("type").name("d"),
            Field::new("SINT32").expect("type").name("e"),
            Field::new("UINT32").expect("type").name("f"),
            Field::new("SINT64").expect("type").name("g"),
            Field::new("UINT64").expect("type").name("h"),
        ],
    )
    .expect("struct");
    let data = values(&[
        ("a", Value::I8(0x0A)),
        ("b", Value::U8(0xFE)),
        ("c", Value::I16(0x0400)),
        ("d", Value::U16(0x03E7)),
        ("e", Value::I32(0x00BADCAB)),
        ("f", Value::U32(0xFEEDFACE)),
        ("g", Value::I64(-1)),
        ("h", Value::U64(1)),
    ]);
    let packed = b"\x0A\
                   \xFE\
                   \x04\x00\
                   \x03\xE7\
                   \x00\xBA\xDC\xAB\
                   \xFE\xED\xFA\xCE\
                   \xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF\
                   \x00\x00\x00\x00\x00\x00\x00\x01";
    round_trip(&s, packed, &data);
}

#[test]
fn float_kinds() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("FLOAT").expect("type").name("f"),
            Field::new("DOUBLE").expect("type").name("d"),
        ],
    )
    .expect("struct");
    let data = values(&[("f", Value::Float(1.5)), ("d", Value::Double(1.5))]);
    round_trip(
        &s,
        b"\x3F\xC0\x00\x00\x3F\xF8\x00\x00\x00\x00\x00\x00",
        &data,
    );
}

#[test]
fn bool_decodes_nonzero_as_true() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BOOL").expect("type").name("flag")],
    )
    .expect("struct");
    round_trip(&s, b"\x01", &values(&[("flag", Value::Bool(true))]));
    round_trip(&s, b"\x00", &values(&[("flag", Value::Bool(false))]));
    assert_eq!(
        s.unpack(b"\x02").expect("unpack"),
        values(&[("flag", Value::Bool(true))])
    );
}

// ==================== Length policies ====================

#[test]
fn fixed_length_and_length_prefix() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("BYTES").expect("type").name("a").length(5),
            Field::new("BYTES")
                .expect("type")
                .name("b")
                .length_field(Field::new("UINT8").expect("type")),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"12345\x00",
        &values(&[
            ("a", Value::Bytes(b"12345".to_vec())),
            ("b", Value::Bytes(Vec::new())),
        ]),
    );
    round_trip(
        &s,
        b"12345\x01x",
        &values(&[
            ("a", Value::Bytes(b"12345".to_vec())),
            ("b", Value::Bytes(b"x".to_vec())),
        ]),
    );
    round_trip(
        &s,
        b"12345\x03xxx",
        &values(&[
            ("a", Value::Bytes(b"12345".to_vec())),
            ("b", Value::Bytes(b"xxx".to_vec())),
        ]),
    );
}

#[test]
fn fixed_length_mismatch_is_rejected() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES").expect("type").name("a").length(5)],
    )
    .expect("struct");
    let err = s
        .pack(&values(&[("a", Value::Bytes(b"1234".to_vec()))]))
        .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));
}

#[test]
fn length_callback() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type").name("foo_len"),
            Field::new("UINT8").expect("type").default_value(Value::U8(0)),
            Field::new("BYTES")
                .expect("type")
                .name("foo")
                .length_fn(|data| {
                    data.get("foo_len").and_then(Value::as_u64).unwrap_or(0) as usize
                }),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"\x00\x00",
        &values(&[("foo_len", Value::U8(0)), ("foo", Value::Bytes(Vec::new()))]),
    );
    round_trip(
        &s,
        b"\x05\x00abcde",
        &values(&[
            ("foo_len", Value::U8(5)),
            ("foo", Value::Bytes(b"abcde".to_vec())),
        ]),
    );
}

#[test]
fn length_callback_inconsistency_is_reported() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type").name("foo_len"),
            Field::new("BYTES")
                .expect("type")
                .name("foo")
                .length_fn(|data| {
                    data.get("foo_len").and_then(Value::as_u64).unwrap_or(0) as usize
                }),
        ],
    )
    .expect("struct");
    let err = s
        .pack(&values(&[
            ("foo_len", Value::U8(5)),
            ("foo", Value::Bytes(b"abc".to_vec())),
        ]))
        .unwrap_err();
    match err {
        StructError::InconsistentLength {
            field,
            expected,
            actual,
        } => {
            assert_eq!(field, "foo");
            assert_eq!(expected, 5);
            assert_eq!(actual, 3);
        }
        other => panic!("expected InconsistentLength, got {other:?}"),
    }
}

// ==================== Delimiters ====================

#[test]
fn delimiter_terminated_field() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("BYTES")
                .expect("type")
                .name("a")
                .delimiter(Delimiter::new(0)),
            Field::new("BYTES").expect("type").name("b").length(1),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"abc\x00d",
        &values(&[
            ("a", Value::Bytes(b"abc".to_vec())),
            ("b", Value::Bytes(b"d".to_vec())),
        ]),
    );
}

#[test]
fn missing_delimiter_is_reported() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES")
            .expect("type")
            .name("a")
            .delimiter(Delimiter::new(0))],
    )
    .expect("struct");
    let err = s.unpack(b"xyz").unwrap_err();
    assert!(matches!(err, StructError::DelimiterNotFound(0)));
}

#[test]
fn delimited_field_with_counted_repeat() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES")
            .expect("type")
            .name("items")
            .delimiter(Delimiter::new(0))
            .repeat_field(Field::new("UINT8").expect("type"))],
    )
    .expect("struct");
    round_trip(
        &s,
        b"\x02a\x00b\x00",
        &values(&[(
            "items",
            Value::List(vec![
                Value::Bytes(b"a".to_vec()),
                Value::Bytes(b"b".to_vec()),
            ]),
        )]),
    );
}

// ==================== Repeat policies ====================

#[test]
fn fixed_and_counted_repeats() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type").name("a").repeat(3),
            Field::new("UINT8")
                .expect("type")
                .name("b")
                .repeat_field(Field::new("UINT8").expect("type")),
            Field::new("BYTES")
                .expect("type")
                .name("c")
                .length_field(Field::new("UINT8").expect("type"))
                .repeat_field(Field::new("UINT8").expect("type")),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"\x00\x01\x02\x00\x00",
        &values(&[
            (
                "a",
                Value::List(vec![Value::U8(0), Value::U8(1), Value::U8(2)]),
            ),
            ("b", Value::List(Vec::new())),
            ("c", Value::List(Vec::new())),
        ]),
    );
    round_trip(
        &s,
        b"\x00\x01\x02\x00\x02\x00\x00",
        &values(&[
            (
                "a",
                Value::List(vec![Value::U8(0), Value::U8(1), Value::U8(2)]),
            ),
            ("b", Value::List(Vec::new())),
            (
                "c",
                Value::List(vec![Value::Bytes(Vec::new()), Value::Bytes(Vec::new())]),
            ),
        ]),
    );
    round_trip(
        &s,
        b"\x09\x0A\x0B\x05\x03\x01\x04\x01\x06\x03\x01a\x02xy\x03cat",
        &values(&[
            (
                "a",
                Value::List(vec![Value::U8(9), Value::U8(10), Value::U8(11)]),
            ),
            (
                "b",
                Value::List(vec![
                    Value::U8(3),
                    Value::U8(1),
                    Value::U8(4),
                    Value::U8(1),
                    Value::U8(6),
                ]),
            ),
            (
                "c",
                Value::List(vec![
                    Value::Bytes(b"a".to_vec()),
                    Value::Bytes(b"xy".to_vec()),
                    Value::Bytes(b"cat".to_vec()),
                ]),
            ),
        ]),
    );
}

#[test]
fn fixed_repeat_count_mismatch_is_rejected() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8").expect("type").name("a").repeat(3)],
    )
    .expect("struct");
    let err = s
        .pack(&values(&[(
            "a",
            Value::List(vec![Value::U8(0), Value::U8(1)]),
        )]))
        .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));
}

// ==================== Default pack values ====================

#[test]
fn default_pack_values() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type").default_value(Value::U8(0)),
            Field::new("UINT8").expect("type").default_value(Value::U8(1)),
            Field::new("UINT8")
                .expect("type")
                .name("a")
                .default_value(Value::U8(2)),
            Field::new("UINT8")
                .expect("type")
                .repeat(2)
                .default_value(Value::List(vec![Value::U8(3), Value::U8(4)])),
        ],
    )
    .expect("struct");
    // Anonymous fields consume their bytes but stay out of the value-set.
    assert_eq!(
        s.unpack(b"\xFF\xFF\xAA\xBB\xCC").expect("unpack"),
        values(&[("a", Value::U8(0xAA))])
    );
    assert_eq!(
        s.pack(&HashMap::new()).expect("pack"),
        b"\x00\x01\x02\x03\x04"
    );
    assert_eq!(
        s.pack(&values(&[("a", Value::U8(0xAA))])).expect("pack"),
        b"\x00\x01\xAA\x03\x04"
    );
}

#[test]
fn default_value_length_checked_against_repeat() {
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8")
            .expect("type")
            .repeat(2)
            .default_value(Value::List(vec![
                Value::U8(3),
                Value::U8(4),
                Value::U8(5),
            ]))],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));
}

// ==================== Text encodings ====================

#[test]
fn string_encodings_round_trip() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("STRING")
                .expect("type")
                .encoding("ascii")
                .expect("encoding")
                .name("ascii")
                .delimiter(Delimiter::new(0xFF)),
            Field::new("STRING")
                .expect("type")
                .encoding("utf-8")
                .expect("encoding")
                .name("utf-8")
                .delimiter(Delimiter::new(0xFF)),
            Field::new("STRING")
                .expect("type")
                .encoding("utf-16-le")
                .expect("encoding")
                .name("utf-16-le")
                .delimiter(Delimiter::new(0xFF)),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"cat\xFFdog\xFFf\x00o\x00x\x00\xFF",
        &values(&[
            ("ascii", Value::Str("cat".to_string())),
            ("utf-8", Value::Str("dog".to_string())),
            ("utf-16-le", Value::Str("fox".to_string())),
        ]),
    );
    round_trip(
        &s,
        b"meow\xFFw\xC3\xB6\xC3\xB6f\xFF\x34\xD8\x1E\xDD\xFF",
        &values(&[
            ("ascii", Value::Str("meow".to_string())),
            ("utf-8", Value::Str("w\u{F6}\u{F6}f".to_string())),
            // MUSICAL SYMBOL G CLEF, a surrogate pair in UTF-16.
            ("utf-16-le", Value::Str("\u{1D11E}".to_string())),
        ]),
    );
}

#[test]
fn strict_and_replace_encode_policies() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("STRING")
                .expect("type")
                .encoding("ascii")
                .expect("encoding")
                .name("a")
                .length(1),
            Field::new("STRING")
                .expect("type")
                .encoding("ascii")
                .expect("encoding")
                .encoding_policy(TextPolicy::Replace)
                .name("b")
                .length(1),
        ],
    )
    .expect("struct");
    let err = s
        .pack(&values(&[
            ("a", Value::Str("\u{F6}".to_string())),
            ("b", Value::Str("x".to_string())),
        ]))
        .unwrap_err();
    match err {
        StructError::Encode {
            field,
            codec,
            ch,
            position,
        } => {
            assert_eq!(field, "a");
            assert_eq!(codec, "ascii");
            assert_eq!(ch, '\u{F6}');
            assert_eq!(position, 0);
        }
        other => panic!("expected Encode, got {other:?}"),
    }
    assert_eq!(
        s.pack(&values(&[
            ("a", Value::Str("x".to_string())),
            ("b", Value::Str("\u{F6}".to_string())),
        ]))
        .expect("pack"),
        b"x?"
    );
}

#[test]
fn strict_decode_failure_names_the_field() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("STRING")
            .expect("type")
            .encoding("ascii")
            .expect("encoding")
            .name("a")
            .length(1)],
    )
    .expect("struct");
    let err = s.unpack(b"\xf6").unwrap_err();
    assert!(matches!(
        err,
        StructError::Decode { ref field, codec: "ascii", position: 0 } if field == "a"
    ));
}

#[test]
fn string_length_prefix_counts_encoded_bytes() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("STRING")
            .expect("type")
            .encoding("utf-8")
            .expect("encoding")
            .name("s")
            .length_field(Field::new("UINT8").expect("type"))],
    )
    .expect("struct");
    // "wööf" is 4 characters but 6 UTF-8 bytes; the prefix holds the bytes.
    let data = values(&[("s", Value::Str("w\u{F6}\u{F6}f".to_string()))]);
    round_trip(&s, b"\x06w\xC3\xB6\xC3\xB6f", &data);
}

// ==================== Value transforms ====================

const WORDS: [&[u8]; 3] = [b"zero" as &[u8], b"one", b"two"];

fn word_to_index(v: &Value) -> Value {
    let bytes = v.as_bytes().expect("word value");
    let idx = WORDS.iter().position(|w| *w == bytes).expect("known word");
    Value::U8(idx as u8)
}

fn index_to_word(v: &Value) -> Value {
    let idx = v.as_u64().expect("index value") as usize;
    Value::Bytes(WORDS[idx].to_vec())
}

fn map_list(v: Value, f: impl Fn(&Value) -> Value) -> Value {
    match v {
        Value::List(items) => Value::List(items.iter().map(f).collect()),
        other => other,
    }
}

#[test]
fn value_transforms() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8")
                .expect("type")
                .name("a")
                .transform(FieldTransform::new(
                    |v| word_to_index(&v),
                    |v| index_to_word(&v),
                )),
            // A repeated field's transform sees the whole list.
            Field::new("UINT8")
                .expect("type")
                .name("b")
                .repeat(3)
                .transform(FieldTransform::new(
                    |v| map_list(v, word_to_index),
                    |v| map_list(v, index_to_word),
                )),
            // Length prefixes measure the transformed (wire-adjacent) value.
            Field::new("BYTES")
                .expect("type")
                .name("c")
                .repeat(3)
                .length_field(Field::new("UINT8").expect("type"))
                .transform(FieldTransform::new(
                    |v| map_list(v, index_to_word),
                    |v| map_list(v, word_to_index),
                )),
        ],
    )
    .expect("struct");
    round_trip(
        &s,
        b"\x01\x02\x00\x01\x03one\x03two\x04zero",
        &values(&[
            ("a", Value::Bytes(b"one".to_vec())),
            (
                "b",
                Value::List(vec![
                    Value::Bytes(b"two".to_vec()),
                    Value::Bytes(b"zero".to_vec()),
                    Value::Bytes(b"one".to_vec()),
                ]),
            ),
            (
                "c",
                Value::List(vec![Value::U8(1), Value::U8(2), Value::U8(0)]),
            ),
        ]),
    );
}

// ==================== Schema validation ====================

#[test]
fn unknown_names_fail_at_construction() {
    assert!(matches!(
        Field::new("UINT128"),
        Err(StructError::UnknownType(_))
    ));
    assert!(matches!(
        Struct::new("MIDDLE_ENDIAN", Vec::new()),
        Err(StructError::UnknownByteOrder(_))
    ));
    assert!(matches!(
        Field::new("STRING").expect("type").encoding("ebcdic"),
        Err(StructError::UnknownEncoding(_))
    ));
}

#[test]
fn malformed_schemas_fail_at_construction() {
    // Length policy on a fixed-width type.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8").expect("type").length(2)],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // Variable-length type without a length policy.
    let err = Struct::new("NET_ENDIAN", vec![Field::new("BYTES").expect("type")]).unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // STRING without an encoding.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("STRING").expect("type").length(4)],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // Encoding on a non-string type.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8")
            .expect("type")
            .encoding("utf-8")
            .expect("encoding")],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // Non-integer length reference.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES")
            .expect("type")
            .length_field(Field::new("FLOAT").expect("type"))],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // Repeated length reference.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES")
            .expect("type")
            .length_field(Field::new("UINT8").expect("type").repeat(3))],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));

    // Zero repeat count and zero fixed length.
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8").expect("type").repeat(0)],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));
    let err = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES").expect("type").length(0)],
    )
    .unwrap_err();
    assert!(matches!(err, StructError::Schema(_)));
}

// ==================== Pack contract violations ====================

#[test]
fn missing_value_without_default_is_rejected() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8").expect("type").name("a")],
    )
    .expect("struct");
    assert!(matches!(
        s.pack(&HashMap::new()),
        Err(StructError::Schema(_))
    ));
}

#[test]
fn out_of_range_integer_is_rejected() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT8").expect("type").name("a")],
    )
    .expect("struct");
    assert!(matches!(
        s.pack(&values(&[("a", Value::U64(300))])),
        Err(StructError::Schema(_))
    ));
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("SINT8").expect("type").name("a")],
    )
    .expect("struct");
    assert!(matches!(
        s.pack(&values(&[("a", Value::I16(-200))])),
        Err(StructError::Schema(_))
    ));
}

// ==================== Buffer-based variants ====================

#[test]
fn embedding_in_a_larger_stream() {
    let header = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT16").expect("type").name("id")],
    )
    .expect("struct");
    let body = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES")
            .expect("type")
            .name("payload")
            .length_field(Field::new("UINT8").expect("type"))],
    )
    .expect("struct");

    let header_data = values(&[("id", Value::U16(7))]);
    let body_data = values(&[("payload", Value::Bytes(b"abc".to_vec()))]);

    let mut stream = Vec::new();
    header.pack_into(&header_data, &mut stream).expect("pack");
    body.pack_into(&body_data, &mut stream).expect("pack");
    assert_eq!(stream, b"\x00\x07\x03abc");

    let mut cur = Cursor::new(stream.as_slice());
    assert_eq!(header.unpack_from(&mut cur).expect("unpack"), header_data);
    assert_eq!(body.unpack_from(&mut cur).expect("unpack"), body_data);
    assert_eq!(cur.position() as usize, stream.len());
}

#[test]
fn truncated_buffers_report_io_errors() {
    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("UINT32").expect("type").name("a")],
    )
    .expect("struct");
    assert!(matches!(s.unpack(b"\x01\x02"), Err(StructError::Io(_))));

    let s = Struct::new(
        "NET_ENDIAN",
        vec![Field::new("BYTES").expect("type").name("a").length(5)],
    )
    .expect("struct");
    assert!(matches!(s.unpack(b"ab"), Err(StructError::Io(_))));
}
