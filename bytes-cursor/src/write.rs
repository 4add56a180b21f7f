use crate::error::Result;
use bytes::{BufMut, BytesMut};

/// little-endian writes mirroring [`crate::ReadBytesExt`]
pub trait WriteBytesExt {
    fn write_u8(&mut self, n: u8) -> Result<usize>;

    fn write_le_u16(&mut self, n: u16) -> Result<usize>;

    /// low 3 bytes only
    fn write_le_u24(&mut self, n: u32) -> Result<usize>;

    fn write_le_u32(&mut self, n: u32) -> Result<usize>;

    /// low 6 bytes only
    fn write_le_u48(&mut self, n: u64) -> Result<usize>;

    fn write_le_u64(&mut self, n: u64) -> Result<usize>;

    fn write_le_u128(&mut self, n: u128) -> Result<usize>;

    fn write_bytes(&mut self, bs: &[u8]) -> Result<usize>;

    fn write_le_i64(&mut self, n: i64) -> Result<usize> {
        self.write_le_u64(n as u64)
    }
}

impl WriteBytesExt for BytesMut {
    fn write_u8(&mut self, n: u8) -> Result<usize> {
        self.put_u8(n);
        Ok(1)
    }

    fn write_le_u16(&mut self, n: u16) -> Result<usize> {
        self.put_u16_le(n);
        Ok(2)
    }

    fn write_le_u24(&mut self, n: u32) -> Result<usize> {
        debug_assert!(n <= 0xff_ffff);
        self.put(&n.to_le_bytes()[..3]);
        Ok(3)
    }

    fn write_le_u32(&mut self, n: u32) -> Result<usize> {
        self.put_u32_le(n);
        Ok(4)
    }

    fn write_le_u48(&mut self, n: u64) -> Result<usize> {
        debug_assert!(n <= 0xffff_ffff_ffff);
        self.put(&n.to_le_bytes()[..6]);
        Ok(6)
    }

    fn write_le_u64(&mut self, n: u64) -> Result<usize> {
        self.put_u64_le(n);
        Ok(8)
    }

    fn write_le_u128(&mut self, n: u128) -> Result<usize> {
        self.put_u128_le(n);
        Ok(16)
    }

    fn write_bytes(&mut self, bs: &[u8]) -> Result<usize> {
        self.put(bs);
        Ok(bs.len())
    }
}
