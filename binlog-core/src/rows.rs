//! row-change event containers
//!
//! all three generations keep their row images opaque; only the post-header
//! differs between them
use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// pre-GA row events have no post-header at all
#[derive(Debug, Clone, PartialEq)]
pub struct RowsDataV0 {
    pub payload: Bytes,
}

impl ReadFromBytes for RowsDataV0 {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let payload = input.split_to(input.remaining());
        Ok(RowsDataV0 { payload })
    }
}

impl WriteToBytes for RowsDataV0 {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_bytes(&self.payload)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowsDataV1 {
    /// 6 bytes on the wire
    pub table_id: u64,
    pub flags: u16,
    pub payload: Bytes,
}

impl ReadFromBytes for RowsDataV1 {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let table_id = input.read_le_u48()?;
        let flags = input.read_le_u16()?;
        let payload = input.split_to(input.remaining());
        Ok(RowsDataV1 {
            table_id,
            flags,
            payload,
        })
    }
}

impl WriteToBytes for RowsDataV1 {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u48(self.table_id)?;
        out.write_le_u16(self.flags)?;
        let written = out.write_bytes(&self.payload)?;
        Ok(8 + written)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowsDataV2 {
    /// 6 bytes on the wire
    pub table_id: u64,
    pub flags: u16,
    /// length of the variable extra-data block, including these 2 bytes
    pub extra_data_len: u16,
    pub payload: Bytes,
}

impl ReadFromBytes for RowsDataV2 {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let table_id = input.read_le_u48()?;
        let flags = input.read_le_u16()?;
        let extra_data_len = input.read_le_u16()?;
        let payload = input.split_to(input.remaining());
        Ok(RowsDataV2 {
            table_id,
            flags,
            extra_data_len,
            payload,
        })
    }
}

impl WriteToBytes for RowsDataV2 {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u48(self.table_id)?;
        out.write_le_u16(self.flags)?;
        out.write_le_u16(self.extra_data_len)?;
        let written = out.write_bytes(&self.payload)?;
        Ok(10 + written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_v2_round_trip() -> Result<()> {
        let rows = RowsDataV2 {
            table_id: 0x0000_0108,
            flags: 1,
            extra_data_len: 2,
            payload: Bytes::from_static(&[0x02, 0xff, 0x01, 0x02, 0x03]),
        };
        let mut out = BytesMut::new();
        rows.clone().write_to(&mut out)?;
        let mut input = out.freeze();
        assert_eq!(rows, RowsDataV2::read_from(&mut input)?);
        Ok(())
    }

    #[test]
    fn test_rows_v1_truncated_post_header() {
        let mut input = Bytes::from_static(&[1, 2, 3]);
        assert!(RowsDataV1::read_from(&mut input).unwrap_err().is_truncated());
    }
}
