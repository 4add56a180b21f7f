use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntvarKind {
    Invalid,
    LastInsertId,
    InsertId,
}

impl IntvarKind {
    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(IntvarKind::Invalid),
            1 => Ok(IntvarKind::LastInsertId),
            2 => Ok(IntvarKind::InsertId),
            n => Err(Error::InvalidValue {
                what: "intvar subtype",
                value: n as u64,
            }),
        }
    }

    fn code(self) -> u8 {
        match self {
            IntvarKind::Invalid => 0,
            IntvarKind::LastInsertId => 1,
            IntvarKind::InsertId => 2,
        }
    }
}

/// integer session-variable event, written before statements that used
/// LAST_INSERT_ID() or an auto-increment column
#[derive(Debug, Clone, PartialEq)]
pub struct IntvarData {
    pub kind: IntvarKind,
    pub value: u64,
}

impl ReadFromBytes for IntvarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let kind = IntvarKind::from_code(input.read_u8()?)?;
        let value = input.read_le_u64()?;
        Ok(IntvarData { kind, value })
    }
}

impl WriteToBytes for IntvarData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_u8(self.kind.code())?;
        out.write_le_u64(self.value)?;
        Ok(9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intvar_round_trip() -> Result<()> {
        let intvar = IntvarData {
            kind: IntvarKind::InsertId,
            value: 10_001,
        };
        let mut out = BytesMut::new();
        intvar.clone().write_to(&mut out)?;
        let mut input = out.freeze();
        assert_eq!(intvar, IntvarData::read_from(&mut input)?);
        Ok(())
    }

    #[test]
    fn test_intvar_bad_subtype() {
        let mut input = Bytes::copy_from_slice(&[9, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            Err(Error::InvalidValue {
                what: "intvar subtype",
                value: 9,
            }),
            IntvarData::read_from(&mut input)
        );
    }
}
