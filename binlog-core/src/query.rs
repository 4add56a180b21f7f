//! query event and its packed status-variable block
use crate::error::{Error, Result};
use crate::{ReadFromBytes, WriteToBytes};
use bitflags::bitflags;
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// one tagged item of the status-variable block
///
/// codes 0 through 14; the payload layout is fixed per code
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatusVar {
    Flags2(u32),
    SqlMode(u64),
    /// legacy form, stored with a trailing zero
    Catalog(Bytes),
    AutoIncrement { increment: u16, offset: u16 },
    Charset { client: u16, connection: u16, server: u16 },
    TimeZone(Bytes),
    CatalogNz(Bytes),
    LcTimeNames(u16),
    CharsetDatabase(u16),
    TableMapForUpdate(u64),
    MasterDataWritten(u32),
    Invoker { user: Bytes, host: Bytes },
    /// `saturated` marks the over-limit sentinel count of 254, which carries
    /// no names
    UpdatedDbNames { names: Vec<Bytes>, saturated: bool },
    /// 3 bytes on the wire
    Microseconds(u32),
    CommitTs(u64),
}

impl QueryStatusVar {
    pub fn code(&self) -> u8 {
        match self {
            QueryStatusVar::Flags2(_) => 0x00,
            QueryStatusVar::SqlMode(_) => 0x01,
            QueryStatusVar::Catalog(_) => 0x02,
            QueryStatusVar::AutoIncrement { .. } => 0x03,
            QueryStatusVar::Charset { .. } => 0x04,
            QueryStatusVar::TimeZone(_) => 0x05,
            QueryStatusVar::CatalogNz(_) => 0x06,
            QueryStatusVar::LcTimeNames(_) => 0x07,
            QueryStatusVar::CharsetDatabase(_) => 0x08,
            QueryStatusVar::TableMapForUpdate(_) => 0x09,
            QueryStatusVar::MasterDataWritten(_) => 0x0a,
            QueryStatusVar::Invoker { .. } => 0x0b,
            QueryStatusVar::UpdatedDbNames { .. } => 0x0c,
            QueryStatusVar::Microseconds(_) => 0x0d,
            QueryStatusVar::CommitTs(_) => 0x0e,
        }
    }
}

fn write_short_bytes(out: &mut BytesMut, what: &'static str, bs: &Bytes) -> Result<usize> {
    if bs.len() > 255 {
        return Err(Error::InvalidValue {
            what,
            value: bs.len() as u64,
        });
    }
    out.write_u8(bs.len() as u8)?;
    out.write_bytes(bs)?;
    Ok(1 + bs.len())
}

impl WriteToBytes for QueryStatusVar {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut written = out.write_u8(self.code())?;
        written += match self {
            QueryStatusVar::Flags2(n) => out.write_le_u32(n)?,
            QueryStatusVar::SqlMode(n) => out.write_le_u64(n)?,
            QueryStatusVar::Catalog(s) => {
                let n = write_short_bytes(out, "catalog length", &s)?;
                out.write_u8(0)?;
                n + 1
            }
            QueryStatusVar::AutoIncrement { increment, offset } => {
                out.write_le_u16(increment)?;
                out.write_le_u16(offset)?;
                4
            }
            QueryStatusVar::Charset {
                client,
                connection,
                server,
            } => {
                out.write_le_u16(client)?;
                out.write_le_u16(connection)?;
                out.write_le_u16(server)?;
                6
            }
            QueryStatusVar::TimeZone(s) => write_short_bytes(out, "time zone length", &s)?,
            QueryStatusVar::CatalogNz(s) => write_short_bytes(out, "catalog length", &s)?,
            QueryStatusVar::LcTimeNames(n) => out.write_le_u16(n)?,
            QueryStatusVar::CharsetDatabase(n) => out.write_le_u16(n)?,
            QueryStatusVar::TableMapForUpdate(n) => out.write_le_u64(n)?,
            QueryStatusVar::MasterDataWritten(n) => out.write_le_u32(n)?,
            QueryStatusVar::Invoker { user, host } => {
                let mut n = write_short_bytes(out, "invoker user length", &user)?;
                n += write_short_bytes(out, "invoker host length", &host)?;
                n
            }
            QueryStatusVar::UpdatedDbNames { names, saturated } => {
                if saturated {
                    out.write_u8(254)?;
                    1
                } else {
                    if names.len() > 253 {
                        return Err(Error::InvalidValue {
                            what: "updated db count",
                            value: names.len() as u64,
                        });
                    }
                    let mut n = out.write_u8(names.len() as u8)?;
                    for name in names {
                        n += out.write_bytes(&name)?;
                        n += out.write_u8(0)?;
                    }
                    n
                }
            }
            QueryStatusVar::Microseconds(n) => out.write_le_u24(n)?,
            QueryStatusVar::CommitTs(n) => out.write_le_u64(n)?,
        };
        Ok(written)
    }
}

/// the status-variable block in parse order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryStatusVars(pub Vec<QueryStatusVar>);

impl std::ops::Deref for QueryStatusVars {
    type Target = Vec<QueryStatusVar>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// walk a complete status-variable region
///
/// an unrecognized code aborts the walk; the error carries every item parsed
/// before it
impl ReadFromBytes for QueryStatusVars {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let mut vars = Vec::new();
        while input.has_remaining() {
            let code = input.read_u8()?;
            let var = match code {
                0x00 => QueryStatusVar::Flags2(input.read_le_u32()?),
                0x01 => QueryStatusVar::SqlMode(input.read_le_u64()?),
                0x02 => {
                    let s = input.read_len_prefixed()?;
                    input.read_len(1)?;
                    QueryStatusVar::Catalog(s)
                }
                0x03 => {
                    let increment = input.read_le_u16()?;
                    let offset = input.read_le_u16()?;
                    QueryStatusVar::AutoIncrement { increment, offset }
                }
                0x04 => {
                    let client = input.read_le_u16()?;
                    let connection = input.read_le_u16()?;
                    let server = input.read_le_u16()?;
                    QueryStatusVar::Charset {
                        client,
                        connection,
                        server,
                    }
                }
                0x05 => QueryStatusVar::TimeZone(input.read_len_prefixed()?),
                0x06 => QueryStatusVar::CatalogNz(input.read_len_prefixed()?),
                0x07 => QueryStatusVar::LcTimeNames(input.read_le_u16()?),
                0x08 => QueryStatusVar::CharsetDatabase(input.read_le_u16()?),
                0x09 => QueryStatusVar::TableMapForUpdate(input.read_le_u64()?),
                0x0a => QueryStatusVar::MasterDataWritten(input.read_le_u32()?),
                0x0b => {
                    let user = input.read_len_prefixed()?;
                    let host = input.read_len_prefixed()?;
                    QueryStatusVar::Invoker { user, host }
                }
                0x0c => {
                    let count = input.read_u8()?;
                    if count == 254 {
                        QueryStatusVar::UpdatedDbNames {
                            names: Vec::new(),
                            saturated: true,
                        }
                    } else {
                        let mut names = Vec::with_capacity(count as usize);
                        for _ in 0..count {
                            names.push(input.read_until(0, false)?);
                        }
                        QueryStatusVar::UpdatedDbNames {
                            names,
                            saturated: false,
                        }
                    }
                }
                0x0d => QueryStatusVar::Microseconds(input.read_le_u24()?),
                0x0e => QueryStatusVar::CommitTs(input.read_le_u64()?),
                _ => {
                    return Err(Error::UnknownStatusVar { code, parsed: vars });
                }
            };
            vars.push(var);
        }
        Ok(QueryStatusVars(vars))
    }
}

impl WriteToBytes for QueryStatusVars {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut written = 0;
        for var in self.0 {
            written += var.write_to(out)?;
        }
        Ok(written)
    }
}

/// decoded query event
///
/// post-header: thread_id, exec_time, schema_len, error_code, status_vars_len;
/// body: status variables, schema name with terminating zero, then the query
/// text up to the end of the body
#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    pub thread_id: u32,
    pub exec_time: u32,
    pub error_code: u16,
    pub status_vars: QueryStatusVars,
    pub schema: Bytes,
    pub query: Bytes,
}

impl ReadFromBytes for QueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let thread_id = input.read_le_u32()?;
        let exec_time = input.read_le_u32()?;
        let schema_len = input.read_u8()?;
        let error_code = input.read_le_u16()?;
        let status_vars_len = input.read_le_u16()?;
        let mut status_region = input.read_len(status_vars_len as usize)?;
        let status_vars = QueryStatusVars::read_from(&mut status_region)?;
        let schema = input.read_len(schema_len as usize)?;
        input.read_len(1)?;
        let query = input.split_to(input.remaining());
        Ok(QueryData {
            thread_id,
            exec_time,
            error_code,
            status_vars,
            schema,
            query,
        })
    }
}

impl WriteToBytes for QueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        if self.schema.len() > 255 {
            return Err(Error::InvalidValue {
                what: "schema length",
                value: self.schema.len() as u64,
            });
        }
        let mut status_region = BytesMut::new();
        self.status_vars.write_to(&mut status_region)?;
        if status_region.len() > 0xffff {
            return Err(Error::InvalidValue {
                what: "status vars length",
                value: status_region.len() as u64,
            });
        }
        let mut written = out.write_le_u32(self.thread_id)?;
        written += out.write_le_u32(self.exec_time)?;
        written += out.write_u8(self.schema.len() as u8)?;
        written += out.write_le_u16(self.error_code)?;
        written += out.write_le_u16(status_region.len() as u16)?;
        written += out.write_bytes(&status_region)?;
        written += out.write_bytes(&self.schema)?;
        written += out.write_u8(0)?;
        written += out.write_bytes(&self.query)?;
        Ok(written)
    }
}

bitflags! {
    /// interpretation of the raw Flags2 status variable
    pub struct Flags2: u32 {
        const AUTO_IS_NULL          = 0x0000_4000;
        const NOT_AUTOCOMMIT        = 0x0008_0000;
        const NO_FOREIGN_KEY_CHECKS = 0x0400_0000;
        const RELAXED_UNIQUE_CHECKS = 0x0800_0000;
    }
}

bitflags! {
    /// interpretation of the raw SqlMode status variable
    pub struct SqlMode: u64 {
        const REAL_AS_FLOAT     = 0x0000_0001;
        const PIPES_AS_CONCAT   = 0x0000_0002;
        const ANSI_QUOTES       = 0x0000_0004;
        const IGNORE_SPACE      = 0x0000_0008;
        const NOT_USED          = 0x0000_0010;
        const ONLY_FULL_GROUP_BY    = 0x0000_0020;
        const NO_UNSIGNED_SUBTRACTION   = 0x0000_0040;
        const NO_DIR_IN_CREATE  = 0x0000_0080;
        const POSTGRESQL        = 0x0000_0100;
        const ORACLE            = 0x0000_0200;
        const MSSQL             = 0x0000_0400;
        const DB2               = 0x0000_0800;
        const MAXDB             = 0x0000_1000;
        const NO_KEY_OPTIONS    = 0x0000_2000;
        const NO_TABLE_OPTIONS  = 0x0000_4000;
        const NO_FIELD_OPTIONS  = 0x0000_8000;
        const MYSQL323          = 0x0001_0000;
        const MYSQL40           = 0x0002_0000;
        const ANSI              = 0x0004_0000;
        const NO_AUTO_VALUE_ON_ZERO = 0x0008_0000;
        const NO_BACKSLASH_ESCAPES  = 0x0010_0000;
        const STRICT_TRANS_TABLES   = 0x0020_0000;
        const STRICT_ALL_TABLES = 0x0040_0000;
        const NO_ZERO_IN_DATE   = 0x0080_0000;
        const NO_ZERO_DATE      = 0x0100_0000;
        const INVALID_DATES     = 0x0200_0000;
        const ERROR_FOR_DIVISION_BY_ZERO    = 0x0400_0000;
        const TRADITIONAL       = 0x0800_0000;
        const NO_AUTO_CREATE_USER   = 0x1000_0000;
        const HIGH_NOT_PRECEDENCE   = 0x2000_0000;
        const NO_ENGINE_SUBSTITUTION    = 0x4000_0000;
        const PAD_CHAR_TO_FULL_LENGTH   = 0x8000_0000;
    }
}
