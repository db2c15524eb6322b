//! Binary stream codec for persisted graphs
//!
//! Programs are persisted as a sequence of tagged records built from a
//! small set of primitives: big-endian fixed-width numerics, obfuscated
//! length-prefixed strings, name-based type descriptors, and typed scalar
//! values (a one-byte type code followed by the payload).
//!
//! String payloads are XORed with a keystream derived from a fixed seed
//! before being written; an optional whole-file password further XORs
//! every byte with a keystream seeded by the sum of the password's
//! character codes. This is obfuscation, not cryptographic protection.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{EngineError, Result};
use crate::value::{CustomValue, TypeTag, Value};

/// Seed of the keystream applied to every string payload.
const STRING_KEY_SEED: u32 = 4269;

/// Decoder for a registered custom value type.
pub type ValueDecoder = fn(&mut Reader) -> Result<Box<dyn CustomValue>>;

/// One-byte type codes for typed scalar values.
mod value_code {
    pub const BOOL: u8 = 0;
    pub const U8: u8 = 1;
    pub const I8: u8 = 2;
    pub const CHAR: u8 = 3;
    pub const I16: u8 = 4;
    pub const U16: u8 = 5;
    pub const I32: u8 = 6;
    pub const U32: u8 = 7;
    pub const I64: u8 = 8;
    pub const U64: u8 = 9;
    pub const F32: u8 = 10;
    pub const F64: u8 = 11;
    pub const STR: u8 = 12;
    pub const CUSTOM: u8 = 13;
}

/// XOR `bytes` in place with the keystream produced by `seed`.
///
/// The keystream is a plain 32-bit LCG; applying the same seed twice is
/// the identity, so the reader runs the identical transform.
fn xor_keystream(bytes: &mut [u8], seed: u32) {
    let mut state = seed;
    for byte in bytes.iter_mut() {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        *byte ^= (state >> 24) as u8;
    }
}

/// Keystream seed derived from a password: the sum of its character codes.
fn password_seed(password: &str) -> u32 {
    password.chars().fold(0u32, |acc, c| acc.wrapping_add(c as u32))
}

/// Accumulates a record stream in memory; `save` writes it out in one shot.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Chars are written as their scalar value, u32 big-endian.
    pub fn write_char(&mut self, value: char) {
        self.write_u32(value as u32);
    }

    /// Length-prefixed (i32, big-endian) obfuscated UTF-8.
    pub fn write_str(&mut self, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        xor_keystream(&mut bytes, STRING_KEY_SEED);
        self.write_i32(bytes.len() as i32);
        self.buf.extend_from_slice(&bytes);
    }

    /// Name-based type descriptor.
    pub fn write_type(&mut self, tag: &TypeTag) {
        self.write_str(tag.descriptor_name());
    }

    /// Typed scalar value: one-byte type code, then the payload.
    pub fn write_value(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => {
                self.write_u8(value_code::BOOL);
                self.write_bool(*v);
            }
            Value::U8(v) => {
                self.write_u8(value_code::U8);
                self.write_u8(*v);
            }
            Value::I8(v) => {
                self.write_u8(value_code::I8);
                self.write_i8(*v);
            }
            Value::Char(v) => {
                self.write_u8(value_code::CHAR);
                self.write_char(*v);
            }
            Value::I16(v) => {
                self.write_u8(value_code::I16);
                self.write_i16(*v);
            }
            Value::U16(v) => {
                self.write_u8(value_code::U16);
                self.write_u16(*v);
            }
            Value::I32(v) => {
                self.write_u8(value_code::I32);
                self.write_i32(*v);
            }
            Value::U32(v) => {
                self.write_u8(value_code::U32);
                self.write_u32(*v);
            }
            Value::I64(v) => {
                self.write_u8(value_code::I64);
                self.write_i64(*v);
            }
            Value::U64(v) => {
                self.write_u8(value_code::U64);
                self.write_u64(*v);
            }
            Value::F32(v) => {
                self.write_u8(value_code::F32);
                self.write_f32(*v);
            }
            Value::F64(v) => {
                self.write_u8(value_code::F64);
                self.write_f64(*v);
            }
            Value::Str(v) => {
                self.write_u8(value_code::STR);
                self.write_str(v);
            }
            Value::Custom(v) => {
                self.write_u8(value_code::CUSTOM);
                self.write_str(v.type_name());
                v.encode(self);
            }
        }
    }

    /// Write the accumulated stream to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.buf)?;
        Ok(())
    }

    /// Write the stream XORed with a password-derived keystream.
    pub fn save_with_password(&self, path: impl AsRef<Path>, password: &str) -> Result<()> {
        let mut bytes = self.buf.clone();
        xor_keystream(&mut bytes, password_seed(password));
        std::fs::write(path, &bytes)?;
        Ok(())
    }
}

/// Sequential reader over a persisted stream.
///
/// Every read is bounds-checked; running off the end surfaces as an
/// [`EngineError::Io`] with `UnexpectedEof` rather than a panic.
#[derive(Debug)]
pub struct Reader {
    cursor: Cursor<Vec<u8>>,
}

impl Reader {
    /// Read a whole file into a reader.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    /// Read a password-obfuscated file, undoing the whole-file keystream.
    pub fn open_with_password(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        let mut bytes = std::fs::read(path)?;
        xor_keystream(&mut bytes, password_seed(password));
        Ok(Self::from_bytes(bytes))
    }

    /// Wrap an in-memory stream.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Whether any unread bytes remain.
    pub fn has_more(&self) -> bool {
        (self.cursor.position() as usize) < self.cursor.get_ref().len()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.cursor.read_i8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.cursor.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.cursor.read_i16::<BigEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.cursor.read_u64::<BigEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.cursor.read_i64::<BigEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.cursor.read_f32::<BigEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.cursor.read_f64::<BigEndian>()?)
    }

    pub fn read_char(&mut self) -> Result<char> {
        let scalar = self.read_u32()?;
        char::from_u32(scalar)
            .ok_or_else(|| EngineError::corrupt(format!("invalid char scalar {scalar:#x}")))
    }

    pub fn read_str(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(EngineError::corrupt(format!("negative string length {len}")));
        }
        let mut bytes = vec![0u8; len as usize];
        self.cursor.read_exact(&mut bytes)?;
        xor_keystream(&mut bytes, STRING_KEY_SEED);
        String::from_utf8(bytes).map_err(|e| EngineError::corrupt(format!("invalid UTF-8: {e}")))
    }

    pub fn read_type(&mut self) -> Result<TypeTag> {
        Ok(TypeTag::from_descriptor(&self.read_str()?))
    }

    /// Read a typed scalar value.
    ///
    /// Custom values (code 13) are resolved through the supplied decoder
    /// table; an unregistered type name is an error since the payload
    /// length is unknown and the stream cannot be re-synchronized.
    pub fn read_value(&mut self, decoders: &HashMap<String, ValueDecoder>) -> Result<Value> {
        let code = self.read_u8()?;
        Ok(match code {
            value_code::BOOL => Value::Bool(self.read_bool()?),
            value_code::U8 => Value::U8(self.read_u8()?),
            value_code::I8 => Value::I8(self.read_i8()?),
            value_code::CHAR => Value::Char(self.read_char()?),
            value_code::I16 => Value::I16(self.read_i16()?),
            value_code::U16 => Value::U16(self.read_u16()?),
            value_code::I32 => Value::I32(self.read_i32()?),
            value_code::U32 => Value::U32(self.read_u32()?),
            value_code::I64 => Value::I64(self.read_i64()?),
            value_code::U64 => Value::U64(self.read_u64()?),
            value_code::F32 => Value::F32(self.read_f32()?),
            value_code::F64 => Value::F64(self.read_f64()?),
            value_code::STR => Value::Str(self.read_str()?),
            value_code::CUSTOM => {
                let name = self.read_str()?;
                let decode = decoders
                    .get(&name)
                    .ok_or(EngineError::UnknownValueType(name))?;
                Value::Custom(decode(self)?)
            }
            other => {
                return Err(EngineError::corrupt(format!("unknown value code {other}")));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: &Value) -> Value {
        let mut writer = Writer::new();
        writer.write_value(value);
        let mut reader = Reader::from_bytes(writer.as_bytes().to_vec());
        reader.read_value(&HashMap::new()).unwrap()
    }

    #[test]
    fn test_scalar_round_trips() {
        let samples = [
            Value::Bool(true),
            Value::Bool(false),
            Value::U8(200),
            Value::I8(-7),
            Value::Char('λ'),
            Value::I16(-12345),
            Value::U16(54321),
            Value::I32(-1),
            Value::U32(0xDEAD_BEEF),
            Value::I64(i64::MIN),
            Value::U64(u64::MAX),
            Value::F32(1.5),
            Value::F64(-2.25),
            Value::Str("hello".into()),
            Value::Str("non-ascii: héllo ✓".into()),
        ];
        for value in samples {
            assert_eq!(round_trip(&value), value, "round trip of {value:?}");
        }
    }

    #[test]
    fn test_string_obfuscation_scrambles_bytes() {
        let mut writer = Writer::new();
        writer.write_str("secret");
        // The payload after the 4-byte length prefix must not be the
        // plaintext bytes.
        assert_ne!(&writer.as_bytes()[4..], b"secret");
    }

    #[test]
    fn test_numerics_are_big_endian() {
        let mut writer = Writer::new();
        writer.write_u32(0x0102_0304);
        assert_eq!(writer.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_keystream_is_symmetric() {
        let mut bytes = b"some payload".to_vec();
        xor_keystream(&mut bytes, 99);
        assert_ne!(&bytes, b"some payload");
        xor_keystream(&mut bytes, 99);
        assert_eq!(&bytes, b"some payload");
    }

    #[test]
    fn test_truncated_stream_errors() {
        let mut writer = Writer::new();
        writer.write_u32(7);
        let mut reader = Reader::from_bytes(writer.as_bytes()[..2].to_vec());
        assert!(reader.read_u32().is_err());
    }

    #[test]
    fn test_negative_string_length_is_corrupt() {
        let mut writer = Writer::new();
        writer.write_i32(-5);
        let mut reader = Reader::from_bytes(writer.as_bytes().to_vec());
        assert!(matches!(reader.read_str(), Err(EngineError::Corrupt(_))));
    }

    #[test]
    fn test_password_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut writer = Writer::new();
        writer.write_str("payload");
        writer.write_u32(42);
        writer.save_with_password(&path, "hunter2").unwrap();

        let mut reader = Reader::open_with_password(&path, "hunter2").unwrap();
        assert_eq!(reader.read_str().unwrap(), "payload");
        assert_eq!(reader.read_u32().unwrap(), 42);

        // A wrong password yields garbage, not the original payload.
        let mut wrong = Reader::open_with_password(&path, "hunter3").unwrap();
        assert!(wrong.read_str().map(|s| s != "payload").unwrap_or(true));
    }

    #[test]
    fn test_unknown_value_code_is_corrupt() {
        let mut reader = Reader::from_bytes(vec![200]);
        assert!(matches!(
            reader.read_value(&HashMap::new()),
            Err(EngineError::Corrupt(_))
        ));
    }

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl CustomValue for Point {
        fn type_name(&self) -> &str {
            "point"
        }

        fn clone_box(&self) -> Box<dyn CustomValue> {
            Box::new(Point { x: self.x, y: self.y })
        }

        fn eq_value(&self, _other: &dyn CustomValue) -> bool {
            false
        }

        fn encode(&self, writer: &mut Writer) {
            writer.write_i32(self.x);
            writer.write_i32(self.y);
        }
    }

    fn decode_point(reader: &mut Reader) -> Result<Box<dyn CustomValue>> {
        Ok(Box::new(Point {
            x: reader.read_i32()?,
            y: reader.read_i32()?,
        }))
    }

    #[test]
    fn test_custom_value_round_trip() {
        let mut decoders: HashMap<String, ValueDecoder> = HashMap::new();
        decoders.insert("point".to_string(), decode_point);

        let mut writer = Writer::new();
        writer.write_value(&Value::Custom(Box::new(Point { x: 3, y: -4 })));

        let mut reader = Reader::from_bytes(writer.as_bytes().to_vec());
        let value = reader.read_value(&decoders).unwrap();
        match value {
            Value::Custom(v) => assert_eq!(v.type_name(), "point"),
            other => panic!("expected custom value, got {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_custom_type_errors() {
        let mut writer = Writer::new();
        writer.write_value(&Value::Custom(Box::new(Point { x: 0, y: 0 })));

        let mut reader = Reader::from_bytes(writer.as_bytes().to_vec());
        assert!(matches!(
            reader.read_value(&HashMap::new()),
            Err(EngineError::UnknownValueType(name)) if name == "point"
        ));
    }
}
