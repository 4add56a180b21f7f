use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("truncated input: need {need} bytes, had {had}")]
    Truncated { need: usize, had: usize },
    #[error("malformed packed integer marker: 0x{0:02x}")]
    MalformedPackedInt(u8),
}

impl Error {
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }
}
