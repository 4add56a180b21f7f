//! typed decoding and encoding of v4 binary replication log events
//!
//! the entry point for stream consumers is [`session::BinlogSession`]; the
//! per-event payload types live in their own modules and can be used directly
//! when framing is handled elsewhere
pub mod checksum;
pub mod error;
pub mod fde;
pub mod gtid;
pub mod header;
pub mod heartbeat;
pub mod incident;
pub mod intvar;
pub mod load;
pub mod query;
pub mod rand;
pub mod rotate;
pub mod rows;
pub mod rows_query;
pub mod session;
pub mod table_map;
pub mod user_var;
pub mod xid;

pub use crate::checksum::ChecksumAlg;
pub use crate::error::{Error, Result};
pub use crate::fde::FormatDescriptionData;
pub use crate::header::{EventHeader, EventHeaderFlags, LOG_EVENT_HEADER_LEN};
pub use crate::session::{BinlogSession, StreamState};

use crate::checksum::{checksum_crc32, CHECKSUM_LEN};
use crate::fde::{StartData, START_V3_POST_HEADER_LEN};
use crate::gtid::{GtidData, PreviousGtidsData};
use crate::heartbeat::HeartbeatData;
use crate::incident::IncidentData;
use crate::intvar::IntvarData;
use crate::load::{
    AppendBlockData, BeginLoadQueryData, CreateFileData, DeleteFileData, ExecLoadData,
    ExecuteLoadQueryData, LoadData,
};
use crate::query::QueryData;
use crate::rand::RandData;
use crate::rotate::RotateData;
use crate::rows::{RowsDataV0, RowsDataV1, RowsDataV2};
use crate::rows_query::RowsQueryData;
use crate::table_map::TableMapData;
use crate::user_var::UserVarData;
use crate::xid::XidData;
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::WriteBytesExt;
use std::convert::TryFrom;

/// decode an object from the front of a buffer, consuming what it reads
pub trait ReadFromBytes: Sized {
    fn read_from(input: &mut Bytes) -> Result<Self>;
}

/// encode an object to the tail of a buffer, returning bytes written
pub trait WriteToBytes {
    fn write_to(self, out: &mut BytesMut) -> Result<usize>;
}

/// every event type of a v4 stream, by wire code 0 through 36
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEventType {
    Unknown,
    StartV3,
    Query,
    Stop,
    Rotate,
    Intvar,
    Load,
    Slave,
    CreateFile,
    AppendBlock,
    ExecLoad,
    DeleteFile,
    NewLoad,
    Rand,
    UserVar,
    FormatDescription,
    Xid,
    BeginLoadQuery,
    ExecuteLoadQuery,
    TableMap,
    PreGaWriteRows,
    PreGaUpdateRows,
    PreGaDeleteRows,
    WriteRowsV1,
    UpdateRowsV1,
    DeleteRowsV1,
    Incident,
    Heartbeat,
    Ignorable,
    RowsQuery,
    WriteRowsV2,
    UpdateRowsV2,
    DeleteRowsV2,
    Gtid,
    AnonymousGtid,
    PreviousGtids,
    UserDefined,
}

impl TryFrom<u8> for LogEventType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        let event_type = match code {
            0 => LogEventType::Unknown,
            1 => LogEventType::StartV3,
            2 => LogEventType::Query,
            3 => LogEventType::Stop,
            4 => LogEventType::Rotate,
            5 => LogEventType::Intvar,
            6 => LogEventType::Load,
            7 => LogEventType::Slave,
            8 => LogEventType::CreateFile,
            9 => LogEventType::AppendBlock,
            10 => LogEventType::ExecLoad,
            11 => LogEventType::DeleteFile,
            12 => LogEventType::NewLoad,
            13 => LogEventType::Rand,
            14 => LogEventType::UserVar,
            15 => LogEventType::FormatDescription,
            16 => LogEventType::Xid,
            17 => LogEventType::BeginLoadQuery,
            18 => LogEventType::ExecuteLoadQuery,
            19 => LogEventType::TableMap,
            // 20..22 were only written by 5.1.0 to 5.1.17
            20 => LogEventType::PreGaWriteRows,
            21 => LogEventType::PreGaUpdateRows,
            22 => LogEventType::PreGaDeleteRows,
            // 23..25 were written by 5.1.18 to 5.6.x
            23 => LogEventType::WriteRowsV1,
            24 => LogEventType::UpdateRowsV1,
            25 => LogEventType::DeleteRowsV1,
            26 => LogEventType::Incident,
            27 => LogEventType::Heartbeat,
            28 => LogEventType::Ignorable,
            29 => LogEventType::RowsQuery,
            30 => LogEventType::WriteRowsV2,
            31 => LogEventType::UpdateRowsV2,
            32 => LogEventType::DeleteRowsV2,
            33 => LogEventType::Gtid,
            34 => LogEventType::AnonymousGtid,
            35 => LogEventType::PreviousGtids,
            36 => LogEventType::UserDefined,
            n => return Err(Error::UnknownEventType(n)),
        };
        Ok(event_type)
    }
}

impl From<LogEventType> for u8 {
    fn from(event_type: LogEventType) -> u8 {
        match event_type {
            LogEventType::Unknown => 0,
            LogEventType::StartV3 => 1,
            LogEventType::Query => 2,
            LogEventType::Stop => 3,
            LogEventType::Rotate => 4,
            LogEventType::Intvar => 5,
            LogEventType::Load => 6,
            LogEventType::Slave => 7,
            LogEventType::CreateFile => 8,
            LogEventType::AppendBlock => 9,
            LogEventType::ExecLoad => 10,
            LogEventType::DeleteFile => 11,
            LogEventType::NewLoad => 12,
            LogEventType::Rand => 13,
            LogEventType::UserVar => 14,
            LogEventType::FormatDescription => 15,
            LogEventType::Xid => 16,
            LogEventType::BeginLoadQuery => 17,
            LogEventType::ExecuteLoadQuery => 18,
            LogEventType::TableMap => 19,
            LogEventType::PreGaWriteRows => 20,
            LogEventType::PreGaUpdateRows => 21,
            LogEventType::PreGaDeleteRows => 22,
            LogEventType::WriteRowsV1 => 23,
            LogEventType::UpdateRowsV1 => 24,
            LogEventType::DeleteRowsV1 => 25,
            LogEventType::Incident => 26,
            LogEventType::Heartbeat => 27,
            LogEventType::Ignorable => 28,
            LogEventType::RowsQuery => 29,
            LogEventType::WriteRowsV2 => 30,
            LogEventType::UpdateRowsV2 => 31,
            LogEventType::DeleteRowsV2 => 32,
            LogEventType::Gtid => 33,
            LogEventType::AnonymousGtid => 34,
            LogEventType::PreviousGtids => 35,
            LogEventType::UserDefined => 36,
        }
    }
}

impl LogEventType {
    /// width of the fixed post-header this codec reads for the type
    ///
    /// a stream's format description may advertise a wider value; the
    /// surplus bytes are skipped during decode
    pub fn post_header_len(self) -> u8 {
        match self {
            LogEventType::StartV3 => START_V3_POST_HEADER_LEN as u8,
            LogEventType::Query => 13,
            LogEventType::Rotate => 8,
            LogEventType::Load | LogEventType::NewLoad => 18,
            LogEventType::CreateFile
            | LogEventType::AppendBlock
            | LogEventType::ExecLoad
            | LogEventType::DeleteFile
            | LogEventType::BeginLoadQuery => 4,
            LogEventType::FormatDescription => START_V3_POST_HEADER_LEN as u8 + 1 + 36,
            LogEventType::ExecuteLoadQuery => 26,
            LogEventType::TableMap
            | LogEventType::WriteRowsV1
            | LogEventType::UpdateRowsV1
            | LogEventType::DeleteRowsV1 => 8,
            LogEventType::Incident => 2,
            LogEventType::WriteRowsV2
            | LogEventType::UpdateRowsV2
            | LogEventType::DeleteRowsV2 => 10,
            LogEventType::Gtid | LogEventType::AnonymousGtid => 33,
            _ => 0,
        }
    }
}

/// the type-specific portion of a decoded event
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Unknown(Bytes),
    StartV3(StartData),
    Query(QueryData),
    Stop,
    Rotate(RotateData),
    Intvar(IntvarData),
    Load(LoadData),
    Slave(Bytes),
    CreateFile(CreateFileData),
    AppendBlock(AppendBlockData),
    ExecLoad(ExecLoadData),
    DeleteFile(DeleteFileData),
    NewLoad(LoadData),
    Rand(RandData),
    UserVar(UserVarData),
    FormatDescription(FormatDescriptionData),
    Xid(XidData),
    BeginLoadQuery(BeginLoadQueryData),
    ExecuteLoadQuery(ExecuteLoadQueryData),
    TableMap(TableMapData),
    PreGaWriteRows(RowsDataV0),
    PreGaUpdateRows(RowsDataV0),
    PreGaDeleteRows(RowsDataV0),
    WriteRowsV1(RowsDataV1),
    UpdateRowsV1(RowsDataV1),
    DeleteRowsV1(RowsDataV1),
    Incident(IncidentData),
    Heartbeat(HeartbeatData),
    Ignorable(Bytes),
    RowsQuery(RowsQueryData),
    WriteRowsV2(RowsDataV2),
    UpdateRowsV2(RowsDataV2),
    DeleteRowsV2(RowsDataV2),
    Gtid(GtidData),
    AnonymousGtid(GtidData),
    PreviousGtids(PreviousGtidsData),
    UserDefined(Bytes),
}

fn take_all(input: &mut Bytes) -> Bytes {
    input.split_to(input.remaining())
}

/// fixed-size bodies must account for every byte
fn ensure_consumed(event_type: LogEventType, input: &Bytes) -> Result<()> {
    if input.has_remaining() {
        return Err(Error::TrailingGarbage {
            event_type,
            bytes: input.remaining(),
        });
    }
    Ok(())
}

impl EventData {
    pub fn event_type(&self) -> LogEventType {
        match self {
            EventData::Unknown(_) => LogEventType::Unknown,
            EventData::StartV3(_) => LogEventType::StartV3,
            EventData::Query(_) => LogEventType::Query,
            EventData::Stop => LogEventType::Stop,
            EventData::Rotate(_) => LogEventType::Rotate,
            EventData::Intvar(_) => LogEventType::Intvar,
            EventData::Load(_) => LogEventType::Load,
            EventData::Slave(_) => LogEventType::Slave,
            EventData::CreateFile(_) => LogEventType::CreateFile,
            EventData::AppendBlock(_) => LogEventType::AppendBlock,
            EventData::ExecLoad(_) => LogEventType::ExecLoad,
            EventData::DeleteFile(_) => LogEventType::DeleteFile,
            EventData::NewLoad(_) => LogEventType::NewLoad,
            EventData::Rand(_) => LogEventType::Rand,
            EventData::UserVar(_) => LogEventType::UserVar,
            EventData::FormatDescription(_) => LogEventType::FormatDescription,
            EventData::Xid(_) => LogEventType::Xid,
            EventData::BeginLoadQuery(_) => LogEventType::BeginLoadQuery,
            EventData::ExecuteLoadQuery(_) => LogEventType::ExecuteLoadQuery,
            EventData::TableMap(_) => LogEventType::TableMap,
            EventData::PreGaWriteRows(_) => LogEventType::PreGaWriteRows,
            EventData::PreGaUpdateRows(_) => LogEventType::PreGaUpdateRows,
            EventData::PreGaDeleteRows(_) => LogEventType::PreGaDeleteRows,
            EventData::WriteRowsV1(_) => LogEventType::WriteRowsV1,
            EventData::UpdateRowsV1(_) => LogEventType::UpdateRowsV1,
            EventData::DeleteRowsV1(_) => LogEventType::DeleteRowsV1,
            EventData::Incident(_) => LogEventType::Incident,
            EventData::Heartbeat(_) => LogEventType::Heartbeat,
            EventData::Ignorable(_) => LogEventType::Ignorable,
            EventData::RowsQuery(_) => LogEventType::RowsQuery,
            EventData::WriteRowsV2(_) => LogEventType::WriteRowsV2,
            EventData::UpdateRowsV2(_) => LogEventType::UpdateRowsV2,
            EventData::DeleteRowsV2(_) => LogEventType::DeleteRowsV2,
            EventData::Gtid(_) => LogEventType::Gtid,
            EventData::AnonymousGtid(_) => LogEventType::AnonymousGtid,
            EventData::PreviousGtids(_) => LogEventType::PreviousGtids,
            EventData::UserDefined(_) => LogEventType::UserDefined,
        }
    }

    /// decode one body; the input must span exactly the body region
    ///
    /// `advertised_post_header_len` is the registry's table entry for the
    /// type; when it exceeds the fixed fields this codec reads, the surplus
    /// bytes sit between them and the variable body and are dropped
    pub(crate) fn decode(
        event_type: LogEventType,
        body: &mut Bytes,
        advertised_post_header_len: Option<u8>,
    ) -> Result<EventData> {
        if let Some(advertised) = advertised_post_header_len {
            let advertised = advertised as usize;
            let known = event_type.post_header_len() as usize;
            if advertised > known {
                if body.remaining() < advertised {
                    return Err(Error::Parse(bytes_cursor::Error::Truncated {
                        need: advertised,
                        had: body.remaining(),
                    }));
                }
                let mut trimmed =
                    BytesMut::with_capacity(body.remaining() - (advertised - known));
                trimmed.extend_from_slice(&body[..known]);
                trimmed.extend_from_slice(&body[advertised..]);
                *body = trimmed.freeze();
            }
        }
        let data = match event_type {
            LogEventType::Unknown => EventData::Unknown(take_all(body)),
            LogEventType::StartV3 => {
                let data = StartData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::StartV3(data)
            }
            LogEventType::Query => EventData::Query(QueryData::read_from(body)?),
            LogEventType::Stop => {
                ensure_consumed(event_type, body)?;
                EventData::Stop
            }
            LogEventType::Rotate => EventData::Rotate(RotateData::read_from(body)?),
            LogEventType::Intvar => {
                let data = IntvarData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::Intvar(data)
            }
            LogEventType::Load => EventData::Load(LoadData::read_from(body)?),
            LogEventType::Slave => EventData::Slave(take_all(body)),
            LogEventType::CreateFile => EventData::CreateFile(CreateFileData::read_from(body)?),
            LogEventType::AppendBlock => EventData::AppendBlock(AppendBlockData::read_from(body)?),
            LogEventType::ExecLoad => {
                let data = ExecLoadData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::ExecLoad(data)
            }
            LogEventType::DeleteFile => {
                let data = DeleteFileData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::DeleteFile(data)
            }
            LogEventType::NewLoad => EventData::NewLoad(LoadData::read_from(body)?),
            LogEventType::Rand => {
                let data = RandData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::Rand(data)
            }
            LogEventType::UserVar => EventData::UserVar(UserVarData::read_from(body)?),
            LogEventType::FormatDescription => {
                let data = FormatDescriptionData::read_from(body)?;
                // any remainder is the unverified trailing checksum
                body.advance(body.remaining());
                EventData::FormatDescription(data)
            }
            LogEventType::Xid => {
                let data = XidData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::Xid(data)
            }
            LogEventType::BeginLoadQuery => {
                EventData::BeginLoadQuery(BeginLoadQueryData::read_from(body)?)
            }
            LogEventType::ExecuteLoadQuery => {
                EventData::ExecuteLoadQuery(ExecuteLoadQueryData::read_from(body)?)
            }
            LogEventType::TableMap => EventData::TableMap(TableMapData::read_from(body)?),
            LogEventType::PreGaWriteRows => EventData::PreGaWriteRows(RowsDataV0::read_from(body)?),
            LogEventType::PreGaUpdateRows => {
                EventData::PreGaUpdateRows(RowsDataV0::read_from(body)?)
            }
            LogEventType::PreGaDeleteRows => {
                EventData::PreGaDeleteRows(RowsDataV0::read_from(body)?)
            }
            LogEventType::WriteRowsV1 => EventData::WriteRowsV1(RowsDataV1::read_from(body)?),
            LogEventType::UpdateRowsV1 => EventData::UpdateRowsV1(RowsDataV1::read_from(body)?),
            LogEventType::DeleteRowsV1 => EventData::DeleteRowsV1(RowsDataV1::read_from(body)?),
            LogEventType::Incident => {
                let data = IncidentData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::Incident(data)
            }
            LogEventType::Heartbeat => EventData::Heartbeat(HeartbeatData::read_from(body)?),
            LogEventType::Ignorable => EventData::Ignorable(take_all(body)),
            LogEventType::RowsQuery => EventData::RowsQuery(RowsQueryData::read_from(body)?),
            LogEventType::WriteRowsV2 => EventData::WriteRowsV2(RowsDataV2::read_from(body)?),
            LogEventType::UpdateRowsV2 => EventData::UpdateRowsV2(RowsDataV2::read_from(body)?),
            LogEventType::DeleteRowsV2 => EventData::DeleteRowsV2(RowsDataV2::read_from(body)?),
            LogEventType::Gtid => {
                let data = GtidData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::Gtid(data)
            }
            LogEventType::AnonymousGtid => {
                let data = GtidData::read_from(body)?;
                ensure_consumed(event_type, body)?;
                EventData::AnonymousGtid(data)
            }
            LogEventType::PreviousGtids => {
                EventData::PreviousGtids(PreviousGtidsData::read_from(body)?)
            }
            LogEventType::UserDefined => EventData::UserDefined(take_all(body)),
        };
        Ok(data)
    }

    pub(crate) fn write_body(&self, out: &mut BytesMut) -> Result<usize> {
        match self {
            EventData::Unknown(bs) => Ok(out.write_bytes(bs)?),
            EventData::StartV3(d) => d.clone().write_to(out),
            EventData::Query(d) => d.clone().write_to(out),
            EventData::Stop => Ok(0),
            EventData::Rotate(d) => d.clone().write_to(out),
            EventData::Intvar(d) => d.clone().write_to(out),
            EventData::Load(d) => d.clone().write_to(out),
            EventData::Slave(bs) => Ok(out.write_bytes(bs)?),
            EventData::CreateFile(d) => d.clone().write_to(out),
            EventData::AppendBlock(d) => d.clone().write_to(out),
            EventData::ExecLoad(d) => d.clone().write_to(out),
            EventData::DeleteFile(d) => d.clone().write_to(out),
            EventData::NewLoad(d) => d.clone().write_to(out),
            EventData::Rand(d) => d.clone().write_to(out),
            EventData::UserVar(d) => d.clone().write_to(out),
            EventData::FormatDescription(d) => d.clone().write_to(out),
            EventData::Xid(d) => d.clone().write_to(out),
            EventData::BeginLoadQuery(d) => d.clone().write_to(out),
            EventData::ExecuteLoadQuery(d) => d.clone().write_to(out),
            EventData::TableMap(d) => d.clone().write_to(out),
            EventData::PreGaWriteRows(d) => d.clone().write_to(out),
            EventData::PreGaUpdateRows(d) => d.clone().write_to(out),
            EventData::PreGaDeleteRows(d) => d.clone().write_to(out),
            EventData::WriteRowsV1(d) => d.clone().write_to(out),
            EventData::UpdateRowsV1(d) => d.clone().write_to(out),
            EventData::DeleteRowsV1(d) => d.clone().write_to(out),
            EventData::Incident(d) => d.clone().write_to(out),
            EventData::Heartbeat(d) => d.clone().write_to(out),
            EventData::Ignorable(bs) => Ok(out.write_bytes(bs)?),
            EventData::RowsQuery(d) => d.clone().write_to(out),
            EventData::WriteRowsV2(d) => d.clone().write_to(out),
            EventData::UpdateRowsV2(d) => d.clone().write_to(out),
            EventData::DeleteRowsV2(d) => d.clone().write_to(out),
            EventData::Gtid(d) => d.clone().write_to(out),
            EventData::AnonymousGtid(d) => d.clone().write_to(out),
            EventData::PreviousGtids(d) => d.clone().write_to(out),
            EventData::UserDefined(bs) => Ok(out.write_bytes(bs)?),
        }
    }
}

/// one fully decoded event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub header: EventHeader,
    pub data: EventData,
    /// the stored trailing checksum, when the event carried one
    pub crc32: Option<u32>,
}

impl Event {
    pub fn event_type(&self) -> LogEventType {
        self.data.event_type()
    }

    /// total wire length; callers advance by this even after body errors
    pub fn len(&self) -> usize {
        self.header.data_written as usize
    }

    /// assemble the complete wire form, recomputing `data_written`, the
    /// header type code and the trailing checksum
    ///
    /// a format description ignores `alg` and follows its own descriptor
    /// rules; all other events carry a checksum iff `alg` is CRC32
    pub fn to_bytes(&self, alg: ChecksumAlg) -> Result<Bytes> {
        let mut body = BytesMut::new();
        self.data.write_body(&mut body)?;
        let trailer = match &self.data {
            EventData::FormatDescription(fd) => {
                if fd.is_version_before_checksum() {
                    0
                } else {
                    CHECKSUM_LEN
                }
            }
            _ => alg.trailer_len(),
        };
        let data_written = LOG_EVENT_HEADER_LEN as u32 + body.len() as u32 + trailer as u32;
        let header = EventHeader {
            type_code: u8::from(self.data.event_type()),
            data_written,
            ..self.header.clone()
        };
        let mut out = BytesMut::with_capacity(data_written as usize);
        header.write_to(&mut out)?;
        out.write_bytes(&body)?;
        if trailer > 0 {
            let crc = checksum_crc32(&out);
            out.write_le_u32(crc)?;
        }
        Ok(out.freeze())
    }
}
