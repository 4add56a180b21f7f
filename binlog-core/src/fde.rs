//! start event and format description event
//!
//! the format description doubles as the per-stream registry: its post-header
//! length table and checksum algorithm govern how every later event is framed
use crate::checksum::ChecksumAlg;
use crate::error::{Error, Result};
use crate::header::LOG_EVENT_HEADER_LEN;
use crate::{LogEventType, ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// fixed width of the server version field, zero padded
pub const SERVER_VERSION_LEN: usize = 50;

/// binlog_version + server_version + created_ts
pub const START_V3_POST_HEADER_LEN: usize = 2 + SERVER_VERSION_LEN + 4;

/// the first server version whose format descriptions carry a checksum
/// algorithm descriptor
const CHECKSUM_VERSION_SPLIT: (u32, u32, u32) = (5, 6, 1);

/// post-header of a v3 start event; also the leading fields of a format
/// description event
#[derive(Debug, Clone, PartialEq)]
pub struct StartData {
    pub binlog_version: u16,
    pub server_version: String,
    pub created_ts: u32,
}

impl ReadFromBytes for StartData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let binlog_version = input.read_le_u16()?;
        let raw_version = input.read_len(SERVER_VERSION_LEN)?;
        let end = raw_version
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SERVER_VERSION_LEN);
        let server_version = String::from_utf8_lossy(&raw_version[..end]).into_owned();
        let created_ts = input.read_le_u32()?;
        Ok(StartData {
            binlog_version,
            server_version,
            created_ts,
        })
    }
}

impl WriteToBytes for StartData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u16(self.binlog_version)?;
        let mut version = [0u8; SERVER_VERSION_LEN];
        let bs = self.server_version.as_bytes();
        if bs.len() > SERVER_VERSION_LEN {
            return Err(Error::InvalidValue {
                what: "server version length",
                value: bs.len() as u64,
            });
        }
        version[..bs.len()].copy_from_slice(bs);
        out.write_bytes(&version)?;
        out.write_le_u32(self.created_ts)?;
        Ok(START_V3_POST_HEADER_LEN)
    }
}

/// split a server version string into its numeric triple
///
/// each dot-separated component is parsed up to the first non-digit,
/// so "5.6.1-log" yields (5, 6, 1)
pub fn split_server_version(version: &str) -> (u32, u32, u32) {
    let mut parts = [0u32; 3];
    let mut rest = version;
    for part in parts.iter_mut() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or_else(|| rest.len());
        *part = rest[..digits].parse().unwrap_or(0);
        rest = &rest[digits..];
        if rest.starts_with('.') {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    (parts[0], parts[1], parts[2])
}

/// true for servers too old to write a checksum algorithm descriptor
pub fn is_version_before_checksum(version: &str) -> bool {
    split_server_version(version) < CHECKSUM_VERSION_SPLIT
}

/// decoded format description event and per-stream framing registry
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptionData {
    pub binlog_version: u16,
    pub server_version: String,
    pub created_ts: u32,
    pub common_header_len: u8,
    /// one byte per event type, indexed by type code minus one
    pub post_header_lengths: Vec<u8>,
    /// from the descriptor byte; Undef for pre-5.6.1 streams
    pub checksum_alg: ChecksumAlg,
}

impl FormatDescriptionData {
    /// registry for a current v4 stream with the canonical post-header table,
    /// for sessions resuming mid-stream without replaying the leading event
    pub fn new_v4(server_version: &str, checksum_alg: ChecksumAlg) -> Self {
        FormatDescriptionData {
            binlog_version: 4,
            server_version: server_version.to_owned(),
            created_ts: 0,
            common_header_len: LOG_EVENT_HEADER_LEN,
            post_header_lengths: default_post_header_lengths(),
            checksum_alg,
        }
    }

    pub fn post_header_len(&self, event_type: LogEventType) -> Option<u8> {
        match u8::from(event_type) {
            0 => Some(0),
            code => self.post_header_lengths.get(code as usize - 1).copied(),
        }
    }

    pub fn server_version_split(&self) -> (u32, u32, u32) {
        split_server_version(&self.server_version)
    }

    pub fn is_version_before_checksum(&self) -> bool {
        is_version_before_checksum(&self.server_version)
    }
}

/// parse the payload of a format description event
///
/// the input spans everything after the common header, including the
/// algorithm descriptor and trailing checksum when present; the 4 checksum
/// bytes are left unconsumed for the caller to verify
impl ReadFromBytes for FormatDescriptionData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let StartData {
            binlog_version,
            server_version,
            created_ts,
        } = StartData::read_from(input)?;
        if binlog_version != 4 {
            return Err(Error::UnsupportedBinlogVersion(binlog_version));
        }
        let common_header_len = input.read_u8()?;
        if common_header_len != LOG_EVENT_HEADER_LEN {
            return Err(Error::UnsupportedBinlogVersion(common_header_len as u16));
        }
        if is_version_before_checksum(&server_version) {
            // the whole remainder is table; the last byte is a real
            // post-header length, not a descriptor
            let post_header_lengths = Vec::from(input.read_len(input.remaining())?.as_ref());
            return Ok(FormatDescriptionData {
                binlog_version,
                server_version,
                created_ts,
                common_header_len,
                post_header_lengths,
                checksum_alg: ChecksumAlg::Undef,
            });
        }
        let remaining = input.remaining();
        if remaining < 1 + crate::checksum::CHECKSUM_LEN {
            return Err(Error::Parse(bytes_cursor::Error::Truncated {
                need: 1 + crate::checksum::CHECKSUM_LEN,
                had: remaining,
            }));
        }
        let table_len = remaining - 1 - crate::checksum::CHECKSUM_LEN;
        let post_header_lengths = Vec::from(input.read_len(table_len)?.as_ref());
        let checksum_alg = ChecksumAlg::from(input.read_u8()?);
        Ok(FormatDescriptionData {
            binlog_version,
            server_version,
            created_ts,
            common_header_len,
            post_header_lengths,
            checksum_alg,
        })
    }
}

/// encode the payload, without the trailing 4-byte checksum
impl WriteToBytes for FormatDescriptionData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let before_checksum = self.is_version_before_checksum();
        let start = StartData {
            binlog_version: self.binlog_version,
            server_version: self.server_version,
            created_ts: self.created_ts,
        };
        let mut written = start.write_to(out)?;
        written += out.write_u8(self.common_header_len)?;
        written += out.write_bytes(&self.post_header_lengths)?;
        if !before_checksum {
            written += out.write_u8(u8::from(self.checksum_alg))?;
        }
        Ok(written)
    }
}

/// post-header table for type codes 1 through 36, advertising exactly the
/// fixed-field widths the decoders in this crate read
///
/// live servers may advertise wider entries (a 5.7 stream announces 42 for
/// gtid events, for example); the decode path skips such surplus bytes per
/// event, so this table is only the floor a self-produced stream uses
pub fn default_post_header_lengths() -> Vec<u8> {
    TABLE_TYPES.iter().map(|t| t.post_header_len()).collect()
}

const TABLE_TYPES: [LogEventType; 36] = [
    LogEventType::StartV3,
    LogEventType::Query,
    LogEventType::Stop,
    LogEventType::Rotate,
    LogEventType::Intvar,
    LogEventType::Load,
    LogEventType::Slave,
    LogEventType::CreateFile,
    LogEventType::AppendBlock,
    LogEventType::ExecLoad,
    LogEventType::DeleteFile,
    LogEventType::NewLoad,
    LogEventType::Rand,
    LogEventType::UserVar,
    LogEventType::FormatDescription,
    LogEventType::Xid,
    LogEventType::BeginLoadQuery,
    LogEventType::ExecuteLoadQuery,
    LogEventType::TableMap,
    LogEventType::PreGaWriteRows,
    LogEventType::PreGaUpdateRows,
    LogEventType::PreGaDeleteRows,
    LogEventType::WriteRowsV1,
    LogEventType::UpdateRowsV1,
    LogEventType::DeleteRowsV1,
    LogEventType::Incident,
    LogEventType::Heartbeat,
    LogEventType::Ignorable,
    LogEventType::RowsQuery,
    LogEventType::WriteRowsV2,
    LogEventType::UpdateRowsV2,
    LogEventType::DeleteRowsV2,
    LogEventType::Gtid,
    LogEventType::AnonymousGtid,
    LogEventType::PreviousGtids,
    LogEventType::UserDefined,
];
