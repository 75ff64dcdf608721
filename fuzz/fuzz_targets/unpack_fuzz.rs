//! Unpack fuzz target: feed arbitrary bytes to Struct::unpack against a
//! schema exercising every length and repeat policy. Unpack must return
//! Ok or Err; it must never panic.
//! Build with: cargo fuzz run unpack_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use wirestruct::{Delimiter, Field, Struct, Value};

    let schema = Struct::new(
        "NET_ENDIAN",
        vec![
            Field::new("UINT8").expect("type").name("version"),
            Field::new("BYTES")
                .expect("type")
                .name("tag")
                .delimiter(Delimiter::new(0)),
            Field::new("UINT16")
                .expect("type")
                .name("samples")
                .repeat_field(Field::new("UINT8").expect("type")),
            Field::new("STRING")
                .expect("type")
                .encoding("utf-8")
                .expect("encoding")
                .name("name")
                .length_field(Field::new("UINT8").expect("type")),
            Field::new("BYTES")
                .expect("type")
                .name("rest")
                .length_fn(|so_far| {
                    so_far.get("version").and_then(Value::as_u64).unwrap_or(0) as usize
                }),
        ],
    )
    .expect("schema");
    let _ = schema.unpack(data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run unpack_fuzz");
}
