//! Minecraft Anvil region file format (.mca).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Bytes 4096-8191: Timestamp table (1024 entries × 4 bytes)
//! - Bytes 8192+: Chunk records, each starting on a sector boundary

mod header;
mod transcoder;

#[cfg(test)]
pub mod fixture;

pub use header::Location;
pub use transcoder::{transcode, TranscodeStats, Transcoded};

/// Size of one sector in bytes (4 KB).
pub const SECTOR_BYTES: usize = 4096;

/// Total header size (location table + timestamp table).
pub const HEADER_BYTES: usize = SECTOR_BYTES * 2; // 8192 bytes

/// Number of chunk slots in a region (32 × 32).
pub const LOCATION_ENTRIES: usize = 1024;

/// First sector after the two header tables.
pub const FIRST_DATA_SECTOR: u32 = 2;

/// Chunk record header: 4 byte big-endian length + 1 byte compression tag.
pub const CHUNK_HEADER_BYTES: usize = 5;

/// Largest sector count a location entry can describe.
pub const MAX_SECTOR_COUNT: usize = u8::MAX as usize;

/// Calculate file offset for a chunk given its sector number.
#[inline]
pub fn sector_to_offset(sector: u32) -> usize {
    sector as usize * SECTOR_BYTES
}

/// Number of whole sectors needed to hold `len` bytes.
#[inline]
pub fn sectors_for(len: usize) -> usize {
    len.div_ceil(SECTOR_BYTES)
}
