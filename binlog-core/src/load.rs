//! LOAD DATA INFILE event family
//!
//! post-header fields are parsed; the option blocks and file contents stay
//! opaque byte runs
use crate::error::Result;
use crate::{ReadFromBytes, WriteToBytes};
use bytes::{Buf, Bytes, BytesMut};
use bytes_cursor::{ReadBytesExt, WriteBytesExt};

/// LOAD and NEW_LOAD share this shape
#[derive(Debug, Clone, PartialEq)]
pub struct LoadData {
    pub thread_id: u32,
    pub exec_time: u32,
    pub skip_lines: u32,
    pub table_name_len: u8,
    pub schema_len: u8,
    pub num_fields: u32,
    pub payload: Bytes,
}

impl ReadFromBytes for LoadData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let thread_id = input.read_le_u32()?;
        let exec_time = input.read_le_u32()?;
        let skip_lines = input.read_le_u32()?;
        let table_name_len = input.read_u8()?;
        let schema_len = input.read_u8()?;
        let num_fields = input.read_le_u32()?;
        let payload = input.split_to(input.remaining());
        Ok(LoadData {
            thread_id,
            exec_time,
            skip_lines,
            table_name_len,
            schema_len,
            num_fields,
            payload,
        })
    }
}

impl WriteToBytes for LoadData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.thread_id)?;
        out.write_le_u32(self.exec_time)?;
        out.write_le_u32(self.skip_lines)?;
        out.write_u8(self.table_name_len)?;
        out.write_u8(self.schema_len)?;
        out.write_le_u32(self.num_fields)?;
        let written = out.write_bytes(&self.payload)?;
        Ok(18 + written)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFileData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for CreateFileData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(CreateFileData {
            file_id,
            block_data,
        })
    }
}

impl WriteToBytes for CreateFileData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.file_id)?;
        let written = out.write_bytes(&self.block_data)?;
        Ok(4 + written)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppendBlockData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for AppendBlockData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(AppendBlockData {
            file_id,
            block_data,
        })
    }
}

impl WriteToBytes for AppendBlockData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.file_id)?;
        let written = out.write_bytes(&self.block_data)?;
        Ok(4 + written)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecLoadData {
    pub file_id: u32,
}

impl ReadFromBytes for ExecLoadData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        Ok(ExecLoadData { file_id })
    }
}

impl WriteToBytes for ExecLoadData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_le_u32(self.file_id)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteFileData {
    pub file_id: u32,
}

impl ReadFromBytes for DeleteFileData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        Ok(DeleteFileData { file_id })
    }
}

impl WriteToBytes for DeleteFileData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        Ok(out.write_le_u32(self.file_id)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeginLoadQueryData {
    pub file_id: u32,
    pub block_data: Bytes,
}

impl ReadFromBytes for BeginLoadQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let file_id = input.read_le_u32()?;
        let block_data = input.split_to(input.remaining());
        Ok(BeginLoadQueryData {
            file_id,
            block_data,
        })
    }
}

impl WriteToBytes for BeginLoadQueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.file_id)?;
        let written = out.write_bytes(&self.block_data)?;
        Ok(4 + written)
    }
}

/// a query event post-header extended with the load-file bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteLoadQueryData {
    pub thread_id: u32,
    pub exec_time: u32,
    pub schema_len: u8,
    pub error_code: u16,
    pub status_vars_len: u16,
    pub file_id: u32,
    pub start_pos: u32,
    pub end_pos: u32,
    pub dup_handling: u8,
    pub payload: Bytes,
}

impl ReadFromBytes for ExecuteLoadQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let thread_id = input.read_le_u32()?;
        let exec_time = input.read_le_u32()?;
        let schema_len = input.read_u8()?;
        let error_code = input.read_le_u16()?;
        let status_vars_len = input.read_le_u16()?;
        let file_id = input.read_le_u32()?;
        let start_pos = input.read_le_u32()?;
        let end_pos = input.read_le_u32()?;
        let dup_handling = input.read_u8()?;
        let payload = input.split_to(input.remaining());
        Ok(ExecuteLoadQueryData {
            thread_id,
            exec_time,
            schema_len,
            error_code,
            status_vars_len,
            file_id,
            start_pos,
            end_pos,
            dup_handling,
            payload,
        })
    }
}

impl WriteToBytes for ExecuteLoadQueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u32(self.thread_id)?;
        out.write_le_u32(self.exec_time)?;
        out.write_u8(self.schema_len)?;
        out.write_le_u16(self.error_code)?;
        out.write_le_u16(self.status_vars_len)?;
        out.write_le_u32(self.file_id)?;
        out.write_le_u32(self.start_pos)?;
        out.write_le_u32(self.end_pos)?;
        out.write_u8(self.dup_handling)?;
        let written = out.write_bytes(&self.payload)?;
        Ok(26 + written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_load_query_round_trip() -> Result<()> {
        let begin = BeginLoadQueryData {
            file_id: 7,
            block_data: Bytes::from_static(b"1,2,3\n4,5,6\n"),
        };
        let mut out = BytesMut::new();
        begin.clone().write_to(&mut out)?;
        let mut input = out.freeze();
        assert_eq!(begin, BeginLoadQueryData::read_from(&mut input)?);
        Ok(())
    }

    #[test]
    fn test_execute_load_query_post_header() -> Result<()> {
        let execute = ExecuteLoadQueryData {
            thread_id: 3,
            exec_time: 1,
            schema_len: 3,
            error_code: 0,
            status_vars_len: 0,
            file_id: 7,
            start_pos: 21,
            end_pos: 41,
            dup_handling: 0,
            payload: Bytes::from_static(b"db1\x00LOAD DATA INFILE ..."),
        };
        let mut out = BytesMut::new();
        assert_eq!(26 + 24, execute.clone().write_to(&mut out)?);
        let mut input = out.freeze();
        assert_eq!(execute, ExecuteLoadQueryData::read_from(&mut input)?);
        Ok(())
    }
}
