use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// the original statement text accompanying row events
///
/// the leading length byte saturates at 255 and the query always runs to the
/// end of the body, so the byte is skipped on read
#[derive(Debug, Clone, PartialEq)]
pub struct RowsQueryData {
    pub query: Bytes,
}

impl ReadFromBytes for RowsQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        input.read_u8()?;
        let query = input.split_to(input.remaining());
        Ok(RowsQueryData { query })
    }
}

impl WriteToBytes for RowsQueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_u8(self.query.len().min(255) as u8)?;
        let written = out.write_bytes(&self.query)?;
        Ok(1 + written)
    }
}
