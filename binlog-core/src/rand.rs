use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// seeds of the session RAND() generator
#[derive(Debug, Clone, PartialEq)]
pub struct RandData {
    pub seed1: u64,
    pub seed2: u64,
}

impl ReadFromBytes for RandData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let seed1 = input.read_le_u64()?;
        let seed2 = input.read_le_u64()?;
        Ok(RandData { seed1, seed2 })
    }
}

impl WriteToBytes for RandData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u64(self.seed1)?;
        out.write_le_u64(self.seed2)?;
        Ok(16)
    }
}
