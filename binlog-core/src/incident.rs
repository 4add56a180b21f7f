use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    None,
    LostEvents,
}

impl IncidentKind {
    fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(IncidentKind::None),
            1 => Ok(IncidentKind::LostEvents),
            n => Err(Error::InvalidValue {
                what: "incident kind",
                value: n as u64,
            }),
        }
    }

    fn code(self) -> u16 {
        match self {
            IncidentKind::None => 0,
            IncidentKind::LostEvents => 1,
        }
    }
}

/// out-of-band notice that the source may have lost events
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentData {
    pub kind: IncidentKind,
    pub message: Bytes,
}

impl ReadFromBytes for IncidentData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let kind = IncidentKind::from_code(input.read_le_u16()?)?;
        let message = input.read_len_prefixed()?;
        Ok(IncidentData { kind, message })
    }
}

impl WriteToBytes for IncidentData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        if self.message.len() > 255 {
            return Err(Error::InvalidValue {
                what: "incident message length",
                value: self.message.len() as u64,
            });
        }
        out.write_le_u16(self.kind.code())?;
        out.write_u8(self.message.len() as u8)?;
        out.write_bytes(&self.message)?;
        Ok(3 + self.message.len())
    }
}
