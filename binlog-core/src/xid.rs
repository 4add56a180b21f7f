use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// transaction commit marker
#[derive(Debug, Clone, PartialEq)]
pub struct XidData {
    pub xid: u64,
}

impl ReadFromBytes for XidData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let xid = input.read_le_u64()?;
        Ok(XidData { xid })
    }
}

impl WriteToBytes for XidData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_le_u64(self.xid)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xid_round_trip() -> Result<()> {
        let xid = XidData { xid: 0xdead_beef };
        let mut out = BytesMut::new();
        xid.clone().write_to(&mut out)?;
        let mut input = out.freeze();
        assert_eq!(xid, XidData::read_from(&mut input)?);
        Ok(())
    }
}
