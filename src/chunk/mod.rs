//! Chunk payload codec.
//!
//! A chunk record carries a compression tag and the payload bytes. This module
//! converts a payload between its zlib form (what the game writes) and its
//! stored form (what the archive wants, so the outer compressor can see across
//! chunk boundaries). Tags other than the one being converted pass through.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as ZlibCompression;

/// Compression tags used in the chunk record header.
pub mod compression {
    pub const STORED: u8 = 0;
    pub const GZIP: u8 = 1;
    pub const ZLIB: u8 = 2;
}

/// Which way a region file is being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Strip per-chunk zlib so chunks are stored uncompressed.
    Normalize,
    /// Reapply zlib to stored chunks so the game can read the file again.
    Restore,
}

/// A chunk payload after the codec ran, with the tag it must be written under.
#[derive(Debug)]
pub struct Encoded<'a> {
    pub kind: u8,
    pub payload: Cow<'a, [u8]>,
}

impl Encoded<'_> {
    /// True when the codec left the payload untouched.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.payload, Cow::Borrowed(_))
    }
}

/// Run the codec over one chunk payload.
///
/// Normalize inflates zlib chunks into stored chunks; Restore deflates stored
/// chunks into zlib chunks. Every other tag, gzip included, is returned as-is.
pub fn apply(direction: Direction, kind: u8, payload: &[u8]) -> std::io::Result<Encoded<'_>> {
    match (direction, kind) {
        (Direction::Normalize, compression::ZLIB) => Ok(Encoded {
            kind: compression::STORED,
            payload: Cow::Owned(inflate(payload)?),
        }),
        (Direction::Restore, compression::STORED) => Ok(Encoded {
            kind: compression::ZLIB,
            payload: Cow::Owned(deflate(payload)?),
        }),
        _ => Ok(Encoded {
            kind,
            payload: Cow::Borrowed(payload),
        }),
    }
}

/// Decompress a zlib stream. Bytes after the end of the stream are ignored.
pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Compress into a zlib stream at the default level.
pub fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), ZlibCompression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
