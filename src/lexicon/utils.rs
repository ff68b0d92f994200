//! Low-level byte reading and writing utilities

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::types::error::{LexiconError, Result};

/// Read a 4 or 8 byte big-endian number.
///
/// Used for data offsets, whose width is declared in the index header.
pub fn read_number(reader: &mut impl Read, number_width: usize) -> Result<u64> {
    match number_width {
        8 => Ok(reader.read_u64::<BigEndian>()?),
        4 => Ok(reader.read_u32::<BigEndian>()? as u64),
        _ => Err(LexiconError::InvalidFormat(format!("Invalid number width: {}", number_width))),
    }
}

/// Write a 4 or 8 byte big-endian number, failing if it does not fit.
pub fn write_number(writer: &mut impl Write, value: u64, number_width: usize) -> Result<()> {
    match number_width {
        8 => writer.write_u64::<BigEndian>(value)?,
        4 => {
            let narrow = u32::try_from(value).map_err(|_| LexiconError::OffsetOverflow {
                offset: value,
                width: number_width,
            })?;
            writer.write_u32::<BigEndian>(narrow)?
        }
        _ => {
            return Err(LexiconError::InvalidFormat(format!("Invalid number width: {}", number_width)));
        }
    }
    Ok(())
}

/// Read a UTF-8 string behind a 2 or 4 byte big-endian length prefix.
pub fn read_text(reader: &mut impl Read, prefix_width: usize) -> Result<String> {
    let len = match prefix_width {
        2 => reader.read_u16::<BigEndian>()? as usize,
        4 => reader.read_u32::<BigEndian>()? as usize,
        _ => return Err(LexiconError::InvalidFormat(format!("Invalid prefix width: {}", prefix_width))),
    };
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| LexiconError::InvalidFormat(format!("Invalid UTF-8 text: {}", e)))
}

/// Write `text` behind a 2 or 4 byte big-endian length prefix.
///
/// `field` names the value in the [`LexiconError::FieldTooLong`] raised when
/// the text does not fit the prefix.
pub fn write_text(writer: &mut impl Write, text: &str, prefix_width: usize, field: &'static str) -> Result<()> {
    let len = text.len();
    let too_long = || LexiconError::FieldTooLong {
        field,
        len,
        width: prefix_width,
    };
    match prefix_width {
        2 => writer.write_u16::<BigEndian>(u16::try_from(len).map_err(|_| too_long())?)?,
        4 => writer.write_u32::<BigEndian>(u32::try_from(len).map_err(|_| too_long())?)?,
        _ => return Err(LexiconError::InvalidFormat(format!("Invalid prefix width: {}", prefix_width))),
    }
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Read an optional string: a 0/1 presence flag, then the text if present.
pub fn read_optional_text(reader: &mut impl Read, prefix_width: usize) -> Result<Option<String>> {
    match reader.read_u8()? {
        0 => Ok(None),
        1 => Ok(Some(read_text(reader, prefix_width)?)),
        flag => Err(LexiconError::InvalidFormat(format!("Invalid presence flag: {}", flag))),
    }
}

pub fn write_optional_text(
    writer: &mut impl Write,
    text: Option<&str>,
    prefix_width: usize,
    field: &'static str,
) -> Result<()> {
    match text {
        None => writer.write_u8(0)?,
        Some(text) => {
            writer.write_u8(1)?;
            write_text(writer, text, prefix_width, field)?;
        }
    }
    Ok(())
}

/// Converts a count into a u16 field, or reports which field overflowed.
pub fn count_u16(count: usize, field: &'static str) -> Result<u16> {
    u16::try_from(count).map_err(|_| LexiconError::FieldTooLong {
        field,
        len: count,
        width: 2,
    })
}
