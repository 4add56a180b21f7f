use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::WriteBytesExt;

/// keepalive sent by an idle source; the body names the log file currently
/// being read
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatData {
    pub log_ident: Bytes,
}

impl ReadFromBytes for HeartbeatData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let log_ident = input.split_to(input.remaining());
        Ok(HeartbeatData { log_ident })
    }
}

impl WriteToBytes for HeartbeatData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_bytes(&self.log_ident)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_round_trip() -> Result<()> {
        let heartbeat = HeartbeatData {
            log_ident: Bytes::from_static(b"binlog.000042"),
        };
        let mut out = BytesMut::new();
        let written = heartbeat.clone().write_to(&mut out)?;
        assert_eq!(written, out.len());
        let mut input = out.freeze();
        let decoded = HeartbeatData::read_from(&mut input)?;
        assert_eq!(heartbeat, decoded);
        assert!(!input.has_remaining());
        Ok(())
    }

    #[test]
    fn test_heartbeat_consumes_whole_body() -> Result<()> {
        let mut input = Bytes::from_static(b"binlog.000001");
        let decoded = HeartbeatData::read_from(&mut input)?;
        assert_eq!(&b"binlog.000001"[..], decoded.log_ident.as_ref());
        assert!(!input.has_remaining());

        let mut empty = Bytes::new();
        assert!(HeartbeatData::read_from(&mut empty)?.log_ident.is_empty());
        Ok(())
    }
}
