use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bitflags::bitflags;
use bytes::{Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// fixed common header length of every v4 event
pub const LOG_EVENT_HEADER_LEN: u8 = 19;

bitflags! {
    pub struct EventHeaderFlags: u16 {
        /// set while the log file is open; cleared on clean shutdown.
        /// meaningful only on a format description event
        const BINLOG_IN_USE         = 0x0001;
        const FORCED_ROTATE         = 0x0002;
        const THREAD_SPECIFIC       = 0x0004;
        const SUPPRESS_USE          = 0x0008;
        const UPDATE_TABLE_MAP_VERSION = 0x0010;
        const ARTIFICIAL            = 0x0020;
        const RELAY_LOG             = 0x0040;
        const IGNORABLE             = 0x0080;
        const NO_FILTER             = 0x0100;
        const MTS_ISOLATE           = 0x0200;
    }
}

/// the 19-byte common header
///
/// timestamp 0:4, type_code 4:1, server_id 5:4,
/// data_written 9:4, log_pos 13:4, flags 17:2
#[derive(Debug, Clone, PartialEq)]
pub struct EventHeader {
    pub timestamp: u32,
    pub type_code: u8,
    pub server_id: u32,
    /// total bytes of this event: header, body and trailing checksum if any
    pub data_written: u32,
    /// offset of the next event in the source log
    pub log_pos: u32,
    pub flags: EventHeaderFlags,
}

impl EventHeader {
    pub fn data_len(&self) -> u32 {
        self.data_written - LOG_EVENT_HEADER_LEN as u32
    }

    pub fn binlog_in_use(&self) -> bool {
        self.flags.contains(EventHeaderFlags::BINLOG_IN_USE)
    }
}

impl ReadFromBytes for EventHeader {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let timestamp = input.read_le_u32()?;
        let type_code = input.read_u8()?;
        let server_id = input.read_le_u32()?;
        let data_written = input.read_le_u32()?;
        let log_pos = input.read_le_u32()?;
        let flags = input.read_le_u16()?;
        Ok(EventHeader {
            timestamp,
            type_code,
            server_id,
            data_written,
            log_pos,
            flags: EventHeaderFlags::from_bits_truncate(flags),
        })
    }
}

impl WriteToBytes for EventHeader {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.timestamp)?;
        out.write_u8(self.type_code)?;
        out.write_le_u32(self.server_id)?;
        out.write_le_u32(self.data_written)?;
        out.write_le_u32(self.log_pos)?;
        out.write_le_u16(self.flags.bits())?;
        Ok(LOG_EVENT_HEADER_LEN as usize)
    }
}

/// read the type code straight out of a raw event without a full header decode
pub fn peek_event_type(input: &[u8]) -> Result<u8> {
    if input.len() < 5 {
        return Err(Error::Parse(bytes_cursor::Error::Truncated {
            need: 5,
            had: input.len(),
        }));
    }
    Ok(input[4])
}

/// read the total event length straight out of a raw event
///
/// lets a caller skip past an event whose body failed to decode
pub fn peek_event_length(input: &[u8]) -> Result<u32> {
    if input.len() < 13 {
        return Err(Error::Parse(bytes_cursor::Error::Truncated {
            need: 13,
            had: input.len(),
        }));
    }
    Ok(u32::from_le_bytes([input[9], input[10], input[11], input[12]]))
}
