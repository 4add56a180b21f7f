//! essential bounds-checked parsing of byte buffers
//!
//! all multi-byte integers are little-endian, matching the binlog wire format
pub mod error;
pub mod packed;
mod read;
mod write;

pub use error::{Error, Result};
pub use packed::PackedUint;
pub use read::ReadBytesExt;
pub use write::WriteBytesExt;
