use crate::error::{Error, Result};
use bytes::{Buf, Bytes};

/// bounds-checked reads over a forward-only byte cursor
pub trait ReadBytesExt {
    fn read_u8(&mut self) -> Result<u8>;

    fn read_le_u16(&mut self) -> Result<u16>;

    /// 3 bytes, widened to u32
    fn read_le_u24(&mut self) -> Result<u32>;

    fn read_le_u32(&mut self) -> Result<u32>;

    /// 6 bytes, widened to u64
    fn read_le_u48(&mut self) -> Result<u64>;

    fn read_le_u64(&mut self) -> Result<u64>;

    fn read_le_u128(&mut self) -> Result<u128>;

    /// fixed-width byte run
    fn read_len(&mut self, n: usize) -> Result<Bytes>;

    /// bytes up to the first occurrence of `b`; the terminator is always
    /// consumed and included in the result only if `inclusive`
    fn read_until(&mut self, b: u8, inclusive: bool) -> Result<Bytes>;

    /// string with a 1-byte length prefix
    fn read_len_prefixed(&mut self) -> Result<Bytes>;

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    fn read_le_i64(&mut self) -> Result<i64> {
        Ok(self.read_le_u64()? as i64)
    }
}

fn ensure(input: &Bytes, need: usize) -> Result<()> {
    let had = input.remaining();
    if had < need {
        return Err(Error::Truncated { need, had });
    }
    Ok(())
}

impl ReadBytesExt for Bytes {
    fn read_u8(&mut self) -> Result<u8> {
        ensure(self, 1)?;
        Ok(self.get_u8())
    }

    fn read_le_u16(&mut self) -> Result<u16> {
        ensure(self, 2)?;
        Ok(self.get_u16_le())
    }

    fn read_le_u24(&mut self) -> Result<u32> {
        ensure(self, 3)?;
        let mut buf = [0u8; 4];
        self.copy_to_slice(&mut buf[..3]);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_le_u32(&mut self) -> Result<u32> {
        ensure(self, 4)?;
        Ok(self.get_u32_le())
    }

    fn read_le_u48(&mut self) -> Result<u64> {
        ensure(self, 6)?;
        let mut buf = [0u8; 8];
        self.copy_to_slice(&mut buf[..6]);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_le_u64(&mut self) -> Result<u64> {
        ensure(self, 8)?;
        Ok(self.get_u64_le())
    }

    fn read_le_u128(&mut self) -> Result<u128> {
        ensure(self, 16)?;
        Ok(self.get_u128_le())
    }

    fn read_len(&mut self, n: usize) -> Result<Bytes> {
        ensure(self, n)?;
        Ok(self.split_to(n))
    }

    fn read_until(&mut self, b: u8, inclusive: bool) -> Result<Bytes> {
        match self.as_ref().iter().position(|&x| x == b) {
            Some(pos) => {
                let taken = self.split_to(pos + 1);
                if inclusive {
                    Ok(taken)
                } else {
                    Ok(taken.slice(..pos))
                }
            }
            None => Err(Error::Truncated {
                need: self.remaining() + 1,
                had: self.remaining(),
            }),
        }
    }

    fn read_len_prefixed(&mut self) -> Result<Bytes> {
        let len = self.read_u8()? as usize;
        self.read_len(len)
    }
}
