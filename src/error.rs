//! Error type shared by the region transcoder and the archive container.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("region file truncated: {len} bytes is smaller than the 8192 byte header")]
    TruncatedRegion { len: usize },

    #[error("chunk slot {slot}: record at sector {offset} does not fit in a {len} byte region file")]
    ChunkOutOfBounds { slot: usize, offset: u32, len: usize },

    #[error("chunk slot {slot}: malformed zlib payload")]
    Inflate {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk slot {slot}: record needs {sectors} sectors, more than the 255 a location entry can hold")]
    SectorCountOverflow { slot: usize, sectors: usize },

    #[error("archive truncated while reading {what}")]
    TruncatedRecord { what: &'static str },

    #[error("archive record name {name:?} escapes the output directory")]
    InvalidRecordName { name: String },

    #[error("archive field of {len} bytes exceeds the 4 byte length prefix")]
    RecordTooLarge { len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
