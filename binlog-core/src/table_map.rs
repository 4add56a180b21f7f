use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// table-id to schema mapping preceding row events
///
/// column definitions stay opaque; row-image decoding is a consumer concern
#[derive(Debug, Clone, PartialEq)]
pub struct TableMapData {
    /// 6 bytes on the wire
    pub table_id: u64,
    pub flags: u16,
    pub payload: Bytes,
}

impl ReadFromBytes for TableMapData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let table_id = input.read_le_u48()?;
        let flags = input.read_le_u16()?;
        let payload = input.split_to(input.remaining());
        Ok(TableMapData {
            table_id,
            flags,
            payload,
        })
    }
}

impl WriteToBytes for TableMapData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u48(self.table_id)?;
        out.write_le_u16(self.flags)?;
        let written = out.write_bytes(&self.payload)?;
        Ok(8 + written)
    }
}
