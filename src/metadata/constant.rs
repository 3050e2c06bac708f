//! Constant values for the `Constant` table.
//!
//! The `Constant` table stores compile-time default values for fields, parameters
//! and properties: one ELEMENT_TYPE code plus a `#Blob` entry holding the value's
//! little-endian encoding. Strings are stored as raw UTF-16LE with no length or
//! terminator of their own (the blob prefix carries the length); a null string
//! constant is encoded as `ELEMENT_TYPE_CLASS` with a four-byte zero payload.
//!
//! # Reference
//! - [ECMA-335 II.22.9 / II.23.1.16](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use widestring::U16String;

/// A primitive constant value attachable to a field, parameter or property.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// `ELEMENT_TYPE_BOOLEAN` - one byte, 0 or 1
    Boolean(bool),
    /// `ELEMENT_TYPE_CHAR` - one UTF-16 code unit
    Char(u16),
    /// `ELEMENT_TYPE_I1`
    I1(i8),
    /// `ELEMENT_TYPE_U1`
    U1(u8),
    /// `ELEMENT_TYPE_I2`
    I2(i16),
    /// `ELEMENT_TYPE_U2`
    U2(u16),
    /// `ELEMENT_TYPE_I4`
    I4(i32),
    /// `ELEMENT_TYPE_U4`
    U4(u32),
    /// `ELEMENT_TYPE_I8`
    I8(i64),
    /// `ELEMENT_TYPE_U8`
    U8(u64),
    /// `ELEMENT_TYPE_R4`
    R4(f32),
    /// `ELEMENT_TYPE_R8`
    R8(f64),
    /// `ELEMENT_TYPE_STRING`, or `ELEMENT_TYPE_CLASS` for the null string
    String(Option<std::string::String>),
}

impl Constant {
    /// The ELEMENT_TYPE code written into the `Constant` row's type column.
    #[must_use]
    pub fn type_code(&self) -> u8 {
        match self {
            Constant::Boolean(_) => 0x02,
            Constant::Char(_) => 0x03,
            Constant::I1(_) => 0x04,
            Constant::U1(_) => 0x05,
            Constant::I2(_) => 0x06,
            Constant::U2(_) => 0x07,
            Constant::I4(_) => 0x08,
            Constant::U4(_) => 0x09,
            Constant::I8(_) => 0x0A,
            Constant::U8(_) => 0x0B,
            Constant::R4(_) => 0x0C,
            Constant::R8(_) => 0x0D,
            Constant::String(Some(_)) => 0x0E,
            // Null reference constants use ELEMENT_TYPE_CLASS.
            Constant::String(None) => 0x12,
        }
    }

    /// Encodes the value's blob payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Constant::Boolean(value) => vec![u8::from(*value)],
            Constant::Char(value) => value.to_le_bytes().to_vec(),
            Constant::I1(value) => value.to_le_bytes().to_vec(),
            Constant::U1(value) => value.to_le_bytes().to_vec(),
            Constant::I2(value) => value.to_le_bytes().to_vec(),
            Constant::U2(value) => value.to_le_bytes().to_vec(),
            Constant::I4(value) => value.to_le_bytes().to_vec(),
            Constant::U4(value) => value.to_le_bytes().to_vec(),
            Constant::I8(value) => value.to_le_bytes().to_vec(),
            Constant::U8(value) => value.to_le_bytes().to_vec(),
            Constant::R4(value) => value.to_le_bytes().to_vec(),
            Constant::R8(value) => value.to_le_bytes().to_vec(),
            Constant::String(Some(value)) => U16String::from_str(value)
                .into_vec()
                .iter()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
            Constant::String(None) => vec![0, 0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_encodings() {
        assert_eq!(Constant::Boolean(true).encode(), vec![1]);
        assert_eq!(Constant::I4(-2).encode(), vec![0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(Constant::U2(0x1234).encode(), vec![0x34, 0x12]);
        assert_eq!(Constant::R8(1.0).encode(), 1.0f64.to_le_bytes().to_vec());
    }

    #[test]
    fn string_is_raw_utf16() {
        let value = Constant::String(Some("Hi".to_string()));
        assert_eq!(value.type_code(), 0x0E);
        assert_eq!(value.encode(), vec![b'H', 0, b'i', 0]);
    }

    #[test]
    fn null_string_is_class_with_zero_payload() {
        let value = Constant::String(None);
        assert_eq!(value.type_code(), 0x12);
        assert_eq!(value.encode(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn type_codes_are_element_types() {
        assert_eq!(Constant::Boolean(false).type_code(), 0x02);
        assert_eq!(Constant::Char(b'a'.into()).type_code(), 0x03);
        assert_eq!(Constant::I8(0).type_code(), 0x0A);
        assert_eq!(Constant::R4(0.0).type_code(), 0x0C);
    }
}
