use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// rotate event: the stream continues in another log file
///
/// post-header: starting position in the next file; body: the next file
/// name, neither length-prefixed nor zero-terminated
#[derive(Debug, Clone, PartialEq)]
pub struct RotateData {
    pub position: u64,
    pub next_log: Bytes,
}

impl ReadFromBytes for RotateData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let position = input.read_le_u64()?;
        let next_log = input.split_to(input.remaining());
        Ok(RotateData { position, next_log })
    }
}

impl WriteToBytes for RotateData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut written = out.write_le_u64(self.position)?;
        written += out.write_bytes(&self.next_log)?;
        Ok(written)
    }
}
