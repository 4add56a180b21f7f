//! the packed unsigned integer encoding used throughout the binlog format
//!
//! a leading byte in 0..=250 is the value itself; 0xfc, 0xfd and 0xfe prefix
//! a u16, u24 and u64 respectively; 0xfb and 0xff never start a valid packed
//! integer inside an event body
use crate::error::{Error, Result};
use crate::read::ReadBytesExt;
use crate::write::WriteBytesExt;
use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PackedUint {
    Int1(u8),
    Int3(u16),
    Int4(u32),
    Int9(u64),
}

impl PackedUint {
    pub fn value(self) -> u64 {
        match self {
            PackedUint::Int1(n) => n as u64,
            PackedUint::Int3(n) => n as u64,
            PackedUint::Int4(n) => n as u64,
            PackedUint::Int9(n) => n,
        }
    }

    /// encoded size in bytes
    pub fn len(self) -> usize {
        match self {
            PackedUint::Int1(_) => 1,
            PackedUint::Int3(_) => 3,
            PackedUint::Int4(_) => 4,
            PackedUint::Int9(_) => 9,
        }
    }
}

impl From<u64> for PackedUint {
    fn from(src: u64) -> Self {
        if src <= 250 {
            PackedUint::Int1(src as u8)
        } else if src <= 0xffff {
            PackedUint::Int3(src as u16)
        } else if src <= 0xff_ffff {
            PackedUint::Int4(src as u32)
        } else {
            PackedUint::Int9(src)
        }
    }
}

impl PackedUint {
    pub fn read_from(input: &mut Bytes) -> Result<Self> {
        let marker = input.read_u8()?;
        match marker {
            0xfb | 0xff => Err(Error::MalformedPackedInt(marker)),
            0xfc => Ok(PackedUint::Int3(input.read_le_u16()?)),
            0xfd => Ok(PackedUint::Int4(input.read_le_u24()?)),
            0xfe => Ok(PackedUint::Int9(input.read_le_u64()?)),
            n => Ok(PackedUint::Int1(n)),
        }
    }

    pub fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        match self {
            PackedUint::Int1(n) => out.write_u8(n),
            PackedUint::Int3(n) => {
                out.write_u8(0xfc)?;
                out.write_le_u16(n)?;
                Ok(3)
            }
            PackedUint::Int4(n) => {
                out.write_u8(0xfd)?;
                out.write_le_u24(n)?;
                Ok(4)
            }
            PackedUint::Int9(n) => {
                out.write_u8(0xfe)?;
                out.write_le_u64(n)?;
                Ok(9)
            }
        }
    }
}
