//! Low-level byte order utilities for metadata emission.
//!
//! This module provides safe, bounds-checked little-endian writing (and the reading
//! needed by tests and round-trip checks) over plain byte buffers, plus the ECMA-335
//! compressed-unsigned-integer encoding used by the `#Blob` and `#US` heaps.
//!
//! The serializer preallocates one buffer from the computed stream sizes and fills it
//! front to back with these helpers; every write is bounds-checked and reports
//! [`crate::Error::OutOfBounds`] rather than panicking or corrupting memory.
//!
//! # Key Components
//!
//! - [`CilIO`] - Trait unifying the primitive types that can be written to metadata
//! - [`write_le_at`] / [`read_le_at`] - Fixed-size access with offset auto-advance
//! - [`write_le_at_dyn`] / [`read_le_at_dyn`] - 2-or-4-byte references whose width is
//!   decided by the sizes computation
//! - [`write_compressed_uint`] / [`compressed_uint_size`] - ECMA-335 II.23.2 lengths

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive types with a defined little-endian metadata encoding.
///
/// Implemented for the unsigned integer widths that occur in metadata structures.
/// The associated `Bytes` array ties the type to its exact serialized size.
pub trait CilIO: Sized {
    /// The byte-array representation of this type
    type Bytes: AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decodes a value from its little-endian byte representation
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Encodes this value into its little-endian byte representation
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cil_io!(u8, u16, u32, u64);

/// Safely reads a value of type `T` in little-endian byte order at the given offset.
///
/// The offset is advanced by the number of bytes consumed.
///
/// ## Arguments
/// * `data`   - The byte buffer to read from
/// * `offset` - Current read position, advanced after reading
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = T::Bytes::try_from(&data[*offset..*offset + type_len]) else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Dynamically reads either a 2-byte or 4-byte value in little-endian byte order.
///
/// Reference columns in metadata tables are 2 or 4 bytes wide depending on the
/// final row counts and heap sizes; `is_large` selects the width, and 2-byte
/// values are promoted to `u32`.
///
/// ## Arguments
/// * `data`     - The byte buffer to read from
/// * `offset`   - Current read position, advanced after reading
/// * `is_large` - If `true`, reads 4 bytes; otherwise 2 bytes promoted to `u32`
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}

/// Safely writes a value of type `T` in little-endian byte order at the given offset.
///
/// The offset is advanced by the number of bytes written.
///
/// ## Arguments
/// * `data`   - The mutable byte buffer to write to
/// * `offset` - Current write position, advanced after writing
/// * `value`  - The value to write
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there is insufficient space.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..*offset + type_len].copy_from_slice(value.to_le_bytes().as_ref());
    *offset += type_len;

    Ok(())
}

/// Dynamically writes either a 2-byte or 4-byte value in little-endian byte order.
///
/// If `is_large` is false the value is truncated to `u16`; the sizes computation
/// guarantees the value fits whenever it selects the small width.
///
/// ## Arguments
/// * `data`     - The mutable byte buffer to write to
/// * `offset`   - Current write position, advanced after writing
/// * `value`    - The reference value to write
/// * `is_large` - If `true`, writes 4 bytes; otherwise truncates to 2 bytes
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there is insufficient space.
#[allow(clippy::cast_possible_truncation)]
pub fn write_le_at_dyn(
    data: &mut [u8],
    offset: &mut usize,
    value: u32,
    is_large: bool,
) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)?;
    } else {
        write_le_at::<u16>(data, offset, value as u16)?;
    }

    Ok(())
}

/// Copies a byte slice into the buffer at the given offset, advancing it.
///
/// ## Arguments
/// * `data`   - The mutable byte buffer to write to
/// * `offset` - Current write position, advanced after writing
/// * `bytes`  - The bytes to copy
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there is insufficient space.
pub fn write_bytes_at(data: &mut [u8], offset: &mut usize, bytes: &[u8]) -> Result<()> {
    if (bytes.len() + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    *offset += bytes.len();

    Ok(())
}

/// Returns `value` rounded up to the next multiple of 4.
#[must_use]
pub fn align_4(value: u32) -> u32 {
    (value + 3) & !3
}

/// Returns the encoded size in bytes of an ECMA-335 compressed unsigned integer.
///
/// Values below 0x80 take one byte, values below 0x4000 two bytes, everything
/// else four bytes (ECMA-335 II.23.2).
#[must_use]
pub fn compressed_uint_size(value: u32) -> u32 {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else {
        4
    }
}

/// Appends an ECMA-335 compressed unsigned integer to the buffer.
///
/// ## Arguments
/// * `value`  - The value to encode; must be below 0x2000_0000
/// * `buffer` - Destination the encoded bytes are appended to
#[allow(clippy::cast_possible_truncation)]
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) {
    debug_assert!(value < 0x2000_0000, "value not encodable as compressed uint");

    if value < 0x80 {
        buffer.push(value as u8);
    } else if value < 0x4000 {
        buffer.push(0x80 | (value >> 8) as u8);
        buffer.push(value as u8);
    } else {
        buffer.push(0xC0 | (value >> 24) as u8);
        buffer.push((value >> 16) as u8);
        buffer.push((value >> 8) as u8);
        buffer.push(value as u8);
    }
}

/// Reads an ECMA-335 compressed unsigned integer, advancing the offset.
///
/// ## Arguments
/// * `data`   - The byte buffer to read from
/// * `offset` - Current read position, advanced after reading
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_compressed_uint(data: &[u8], offset: &mut usize) -> Result<u32> {
    let first = read_le_at::<u8>(data, offset)?;
    if first & 0x80 == 0 {
        return Ok(u32::from(first));
    }

    if first & 0x40 == 0 {
        let second = read_le_at::<u8>(data, offset)?;
        return Ok((u32::from(first & 0x3F) << 8) | u32::from(second));
    }

    let mut value = u32::from(first & 0x1F);
    for _ in 0..3 {
        value = (value << 8) | u32::from(read_le_at::<u8>(data, offset)?);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_at_roundtrip() {
        let mut data = [0u8; 8];
        let mut offset = 0;

        write_le_at::<u16>(&mut data, &mut offset, 0x1234).unwrap();
        write_le_at::<u32>(&mut data, &mut offset, 0xDEAD_BEEF).unwrap();
        write_le_at::<u16>(&mut data, &mut offset, 0x5678).unwrap();
        assert_eq!(offset, 8);
        assert!(write_le_at::<u8>(&mut data, &mut offset, 1).is_err());

        let mut offset = 0;
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 0x1234);
        assert_eq!(read_le_at::<u32>(&data, &mut offset).unwrap(), 0xDEAD_BEEF);
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 0x5678);
    }

    #[test]
    fn dyn_width_truncates_and_promotes() {
        let mut data = [0u8; 6];
        let mut offset = 0;

        write_le_at_dyn(&mut data, &mut offset, 0x0102, false).unwrap();
        write_le_at_dyn(&mut data, &mut offset, 0x0304_0506, true).unwrap();
        assert_eq!(data, [0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);

        let mut offset = 0;
        assert_eq!(read_le_at_dyn(&data, &mut offset, false).unwrap(), 0x0102);
        assert_eq!(read_le_at_dyn(&data, &mut offset, true).unwrap(), 0x0304_0506);
    }

    #[test]
    fn compressed_uint_boundaries() {
        for (value, expected) in [
            (0x00u32, vec![0x00u8]),
            (0x7F, vec![0x7F]),
            (0x80, vec![0x80, 0x80]),
            (0x3FFF, vec![0xBF, 0xFF]),
            (0x4000, vec![0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, vec![0xDF, 0xFF, 0xFF, 0xFF]),
        ] {
            let mut buffer = Vec::new();
            write_compressed_uint(value, &mut buffer);
            assert_eq!(buffer, expected, "encoding of {value:#x}");
            assert_eq!(compressed_uint_size(value) as usize, buffer.len());

            let mut offset = 0;
            assert_eq!(read_compressed_uint(&buffer, &mut offset).unwrap(), value);
            assert_eq!(offset, buffer.len());
        }
    }

    #[test]
    fn alignment() {
        assert_eq!(align_4(0), 0);
        assert_eq!(align_4(1), 4);
        assert_eq!(align_4(4), 4);
        assert_eq!(align_4(25), 28);
    }
}
