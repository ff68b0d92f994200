//! Fixed headers of the index and data files.
//!
//! # Index header (12 bytes)
//! ```text
//! [4 bytes] Magic "DWIX"
//! [1 byte]  Format version
//! [1 byte]  Offset width (4 or 8)
//! [2 bytes] Reserved, zero
//! [4 bytes] Number of index records (big-endian u32)
//! ```
//!
//! # Data header (8 bytes)
//! ```text
//! [4 bytes] Magic "DWDT"
//! [1 byte]  Format version
//! [1 byte]  Compression type (0 = none, 2 = zlib)
//! [2 bytes] Reserved, zero
//! ```

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};

use crate::lexicon::types::error::{LexiconError, Result};
use crate::lexicon::types::models::{CompressionType, OffsetWidth};

pub const INDEX_MAGIC: [u8; 4] = *b"DWIX";
pub const DATA_MAGIC: [u8; 4] = *b"DWDT";
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u8,
    pub offset_width: OffsetWidth,
    pub count: u32,
}

impl IndexHeader {
    pub const LEN: u64 = 12;

    pub fn new(offset_width: OffsetWidth, count: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            offset_width,
            count,
        }
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&INDEX_MAGIC)?;
        out.write_u8(self.version)?;
        out.write_u8(self.offset_width.bytes() as u8)?;
        out.write_u16::<BigEndian>(0)?;
        out.write_u32::<BigEndian>(self.count)?;
        trace!("Wrote index header: {:?}", self);
        Ok(())
    }

    pub fn parse<R: Read>(input: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if magic != INDEX_MAGIC {
            return Err(LexiconError::InvalidFormat(format!("Not an index file: magic {:02x?}", magic)));
        }
        let version = check_version(input.read_u8()?)?;
        let offset_width = OffsetWidth::try_from(input.read_u8()?)?;
        let _reserved = input.read_u16::<BigEndian>()?;
        let count = input.read_u32::<BigEndian>()?;
        debug!("Index header: version={}, offset_width={}, count={}", version, offset_width.bytes(), count);
        Ok(Self {
            version,
            offset_width,
            count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub version: u8,
    pub compression: CompressionType,
}

impl DataHeader {
    pub const LEN: u64 = 8;

    pub fn new(compression: CompressionType) -> Self {
        Self {
            version: FORMAT_VERSION,
            compression,
        }
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&DATA_MAGIC)?;
        out.write_u8(self.version)?;
        out.write_u8(self.compression.as_byte())?;
        out.write_u16::<BigEndian>(0)?;
        trace!("Wrote data header: {:?}", self);
        Ok(())
    }

    pub fn parse<R: Read>(input: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if magic != DATA_MAGIC {
            return Err(LexiconError::InvalidFormat(format!("Not a data file: magic {:02x?}", magic)));
        }
        let version = check_version(input.read_u8()?)?;
        let compression = CompressionType::try_from(input.read_u8()?)?;
        let _reserved = input.read_u16::<BigEndian>()?;
        debug!("Data header: version={}, compression={:?}", version, compression);
        Ok(Self { version, compression })
    }
}

fn check_version(version: u8) -> Result<u8> {
    if version != FORMAT_VERSION {
        return Err(LexiconError::InvalidFormat(format!(
            "Unsupported format version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }
    Ok(version)
}
