use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bitflags::bitflags;
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVarType {
    String,
    Real,
    Int,
    Row,
    Decimal,
}

impl UserVarType {
    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(UserVarType::String),
            1 => Ok(UserVarType::Real),
            2 => Ok(UserVarType::Int),
            3 => Ok(UserVarType::Row),
            4 => Ok(UserVarType::Decimal),
            n => Err(Error::InvalidValue {
                what: "user variable type",
                value: n as u64,
            }),
        }
    }

    fn code(self) -> u8 {
        match self {
            UserVarType::String => 0,
            UserVarType::Real => 1,
            UserVarType::Int => 2,
            UserVarType::Row => 3,
            UserVarType::Decimal => 4,
        }
    }
}

bitflags! {
    pub struct UserVarFlags: u8 {
        const UNSIGNED = 0x01;
    }
}

/// the typed payload of a non-null user variable
#[derive(Debug, Clone, PartialEq)]
pub struct UserVarValue {
    pub value_type: UserVarType,
    pub charset: u32,
    pub value: Bytes,
    /// absent on events from servers that predate the flags byte
    pub flags: Option<UserVarFlags>,
}

/// session user variable referenced by a statement
///
/// `value` is None when the variable was SQL NULL
#[derive(Debug, Clone, PartialEq)]
pub struct UserVarData {
    pub name: Bytes,
    pub value: Option<UserVarValue>,
}

impl ReadFromBytes for UserVarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let name_len = input.read_le_u32()?;
        let name = input.read_len(name_len as usize)?;
        let is_null = input.read_u8()?;
        if is_null != 0 {
            return Ok(UserVarData { name, value: None });
        }
        let value_type = UserVarType::from_code(input.read_u8()?)?;
        let charset = input.read_le_u32()?;
        let value_len = input.read_le_u32()?;
        let value = input.read_len(value_len as usize)?;
        let flags = if input.has_remaining() {
            let raw = input.read_u8()?;
            Some(
                UserVarFlags::from_bits(raw).ok_or(Error::InvalidValue {
                    what: "user variable flags",
                    value: raw as u64,
                })?,
            )
        } else {
            None
        };
        Ok(UserVarData {
            name,
            value: Some(UserVarValue {
                value_type,
                charset,
                value,
                flags,
            }),
        })
    }
}

impl WriteToBytes for UserVarData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut written = out.write_le_u32(self.name.len() as u32)?;
        written += out.write_bytes(&self.name)?;
        match self.value {
            None => {
                written += out.write_u8(1)?;
            }
            Some(value) => {
                written += out.write_u8(0)?;
                written += out.write_u8(value.value_type.code())?;
                written += out.write_le_u32(value.charset)?;
                written += out.write_le_u32(value.value.len() as u32)?;
                written += out.write_bytes(&value.value)?;
                if let Some(flags) = value.flags {
                    written += out.write_u8(flags.bits())?;
                }
            }
        }
        Ok(written)
    }
}
