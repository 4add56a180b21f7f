//! global transaction identifier events
use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// a gtid or anonymous-gtid event; the two share one layout and are told
/// apart by the type code alone
#[derive(Debug, Clone, PartialEq)]
pub struct GtidData {
    pub commit_seq_no: i64,
    /// true when this closes the last group of the transaction
    pub commit_flag: bool,
    /// source server UUID
    pub sid: [u8; 16],
    /// monotonic group number under that source
    pub gno: u64,
}

impl ReadFromBytes for GtidData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let commit_seq_no = input.read_le_i64()?;
        let commit_flag = match input.read_u8()? {
            0 => false,
            1 => true,
            n => {
                return Err(Error::InvalidValue {
                    what: "gtid commit flag",
                    value: n as u64,
                })
            }
        };
        let raw_sid = input.read_len(16)?;
        let mut sid = [0u8; 16];
        sid.copy_from_slice(raw_sid.as_ref());
        let gno = input.read_le_u64()?;
        Ok(GtidData {
            commit_seq_no,
            commit_flag,
            sid,
            gno,
        })
    }
}

impl WriteToBytes for GtidData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_i64(self.commit_seq_no)?;
        out.write_u8(self.commit_flag as u8)?;
        out.write_bytes(&self.sid)?;
        out.write_le_u64(self.gno)?;
        Ok(8 + 1 + 16 + 8)
    }
}

/// gtid sets executed up to the start of this log file, kept as the opaque
/// encoded form
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousGtidsData {
    pub payload: Bytes,
}

impl ReadFromBytes for PreviousGtidsData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let payload = input.split_to(input.remaining());
        Ok(PreviousGtidsData { payload })
    }
}

impl WriteToBytes for PreviousGtidsData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_bytes(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gtid_round_trip() -> Result<()> {
        let gtid = GtidData {
            commit_seq_no: -1,
            commit_flag: true,
            sid: *b"\x4c\x21\x22\x65\x33\x01\x11\x47\x89\xab\xcd\xef\x01\x23\x45\x67",
            gno: 77,
        };
        let mut out = BytesMut::new();
        assert_eq!(33, gtid.clone().write_to(&mut out)?);
        let mut input = out.freeze();
        assert_eq!(gtid, GtidData::read_from(&mut input)?);
        Ok(())
    }

    #[test]
    fn test_gtid_bad_commit_flag() {
        let mut raw = BytesMut::new();
        raw.write_le_i64(0).unwrap();
        raw.write_u8(2).unwrap();
        raw.write_bytes(&[0u8; 24]).unwrap();
        assert_eq!(
            Err(Error::InvalidValue {
                what: "gtid commit flag",
                value: 2,
            }),
            GtidData::read_from(&mut raw.freeze())
        );
    }
}
