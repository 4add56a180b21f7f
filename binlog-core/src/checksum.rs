use crate::error::{Error, Result};
use crc_any::CRCu32;

/// length of the trailing CRC32 field
pub const CHECKSUM_LEN: usize = 4;

/// the one-byte algorithm descriptor carried at the tail of the format
/// description event's post-header-length table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlg {
    Off,
    Crc32,
    /// events from checksum-unaware servers, or not yet negotiated
    Undef,
}

impl From<u8> for ChecksumAlg {
    fn from(code: u8) -> Self {
        match code {
            0 => ChecksumAlg::Off,
            1 => ChecksumAlg::Crc32,
            _ => ChecksumAlg::Undef,
        }
    }
}

impl From<ChecksumAlg> for u8 {
    fn from(alg: ChecksumAlg) -> u8 {
        match alg {
            ChecksumAlg::Off => 0,
            ChecksumAlg::Crc32 => 1,
            ChecksumAlg::Undef => 255,
        }
    }
}

impl ChecksumAlg {
    /// bytes the algorithm appends after the event body
    pub fn trailer_len(self) -> usize {
        match self {
            ChecksumAlg::Crc32 => CHECKSUM_LEN,
            ChecksumAlg::Off | ChecksumAlg::Undef => 0,
        }
    }
}

/// zlib-compatible CRC32
pub(crate) fn checksum_crc32(bytes: &[u8]) -> u32 {
    let mut hasher = CRCu32::crc32();
    hasher.digest(bytes);
    hasher.get_crc()
}

/// verify the trailing checksum of a complete event byte span
///
/// a no-op unless the algorithm is CRC32
pub fn verify_event_checksum(event: &[u8], alg: ChecksumAlg) -> Result<()> {
    if alg != ChecksumAlg::Crc32 {
        return Ok(());
    }
    if event.len() < CHECKSUM_LEN {
        return Err(Error::LengthInconsistent {
            data_written: event.len() as u32,
            minimum: CHECKSUM_LEN as u32,
        });
    }
    let split = event.len() - CHECKSUM_LEN;
    let expected = u32::from_le_bytes([
        event[split],
        event[split + 1],
        event[split + 2],
        event[split + 3],
    ]);
    let actual = checksum_crc32(&event[..split]);
    if expected != actual {
        log::debug!(
            "checksum mismatch over {} bytes: expected {:#010x}, actual {:#010x}",
            split,
            expected,
            actual
        );
        return Err(Error::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_iso_3309() {
        assert_eq!(907060870, checksum_crc32(b"hello"));
        assert_eq!(980881731, checksum_crc32(b"world"));
    }

    #[test]
    fn test_verify_event_checksum() -> Result<()> {
        let mut event = b"hello".to_vec();
        event.extend_from_slice(&907060870u32.to_le_bytes());
        verify_event_checksum(&event, ChecksumAlg::Crc32)?;

        // single bit flip in the body must be detected
        event[1] ^= 0x40;
        let err = verify_event_checksum(&event, ChecksumAlg::Crc32).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));

        // and ignored entirely when no checksum is in effect
        verify_event_checksum(&event, ChecksumAlg::Off)?;
        verify_event_checksum(&event, ChecksumAlg::Undef)?;
        Ok(())
    }

    #[test]
    fn test_alg_descriptor_codes() {
        assert_eq!(ChecksumAlg::Off, ChecksumAlg::from(0));
        assert_eq!(ChecksumAlg::Crc32, ChecksumAlg::from(1));
        assert_eq!(ChecksumAlg::Undef, ChecksumAlg::from(255));
        assert_eq!(255u8, u8::from(ChecksumAlg::Undef));
        assert_eq!(4, ChecksumAlg::Crc32.trailer_len());
        assert_eq!(0, ChecksumAlg::Undef.trailer_len());
    }
}
