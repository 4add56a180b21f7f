use crate::query::QueryStatusVar;
use crate::LogEventType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] bytes_cursor::Error),
    #[error("event header too short: data_written={data_written}, header_len={header_len}")]
    HeaderTooShort { data_written: u32, header_len: u8 },
    #[error("event length inconsistent: data_written={data_written}, minimum={minimum}")]
    LengthInconsistent { data_written: u32, minimum: u32 },
    #[error("unsupported binlog version: {0}")]
    UnsupportedBinlogVersion(u16),
    #[error("unknown event type code: {0}")]
    UnknownEventType(u8),
    #[error("checksum mismatch: expected={expected:#010x}, actual={actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("unknown status variable code: {code}")]
    UnknownStatusVar { code: u8, parsed: Vec<QueryStatusVar> },
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("{bytes} bytes of trailing garbage after {event_type:?} body")]
    TrailingGarbage { event_type: LogEventType, bytes: usize },
    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: u64 },
}

impl Error {
    /// true when the input was too short for the read being attempted
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Parse(e) if e.is_truncated())
    }
}
