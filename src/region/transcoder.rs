//! Whole-file region transcoder.
//!
//! Walks the location table in slot order, runs the chunk codec over every
//! present record and re-emits the records back to back starting at sector 2.
//! The output never has dead space between records, whatever the layout of
//! the input was.

use crate::chunk::{self, Direction};
use crate::error::{Error, Result};

use super::{
    sectors_for, Location, CHUNK_HEADER_BYTES, FIRST_DATA_SECTOR, HEADER_BYTES,
    LOCATION_ENTRIES, MAX_SECTOR_COUNT, SECTOR_BYTES,
};

/// Counters gathered while transcoding one region file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeStats {
    /// Slots with a non-zero offset.
    pub present: usize,
    /// Records whose payload the codec rewrote.
    pub transformed: usize,
    /// Records copied through unchanged (gzip, unknown or already converted).
    pub passed_through: usize,
    /// Sum of the count bytes in the input location table.
    pub sectors_in: usize,
    /// Sectors used by the emitted records.
    pub sectors_out: usize,
}

/// A transcoded region file.
#[derive(Debug)]
pub struct Transcoded {
    pub data: Vec<u8>,
    pub stats: TranscodeStats,
}

/// Transcode a whole region file buffer in the given direction.
///
/// An empty buffer yields an empty buffer. The timestamp table is copied
/// verbatim; location entries of present slots are rewritten to the new
/// layout and absent slots are written as all-zero.
pub fn transcode(input: &[u8], direction: Direction) -> Result<Transcoded> {
    let mut stats = TranscodeStats::default();
    if input.is_empty() {
        return Ok(Transcoded {
            data: Vec::new(),
            stats,
        });
    }
    if input.len() < HEADER_BYTES {
        return Err(Error::TruncatedRegion { len: input.len() });
    }

    let mut header = input[..HEADER_BYTES].to_vec();
    let mut records: Vec<u8> = Vec::new();
    let mut cursor = FIRST_DATA_SECTOR;

    for slot in 0..LOCATION_ENTRIES {
        let location = Location::read(input, slot);
        if location.is_absent() {
            Location::ABSENT.write(&mut header, slot);
            continue;
        }
        stats.present += 1;
        stats.sectors_in += location.sectors as usize;

        let (kind, payload) = read_record(input, slot, location.offset)?;
        let encoded = chunk::apply(direction, kind, payload).map_err(|source| match direction {
            Direction::Normalize => Error::Inflate { slot, source },
            Direction::Restore => Error::Io(source),
        })?;
        if encoded.is_passthrough() {
            stats.passed_through += 1;
        } else {
            stats.transformed += 1;
        }

        let record_len = CHUNK_HEADER_BYTES + encoded.payload.len();
        let sectors = sectors_for(record_len);
        if sectors > MAX_SECTOR_COUNT {
            return Err(Error::SectorCountOverflow { slot, sectors });
        }

        // Bounded by the sector check above, so the length fits in a u32.
        records.extend_from_slice(&(encoded.payload.len() as u32).to_be_bytes());
        records.push(encoded.kind);
        records.extend_from_slice(&encoded.payload);
        records.resize(records.len().next_multiple_of(SECTOR_BYTES), 0);

        Location::new(cursor, sectors as u8).write(&mut header, slot);
        cursor += sectors as u32;
        stats.sectors_out += sectors;
    }

    log::trace!(
        "transcoded {} chunks, next free sector {}",
        stats.present,
        cursor
    );

    header.extend_from_slice(&records);
    Ok(Transcoded {
        data: header,
        stats,
    })
}

/// Slice out the compression tag and payload of the record at `offset`.
fn read_record(input: &[u8], slot: usize, offset: u32) -> Result<(u8, &[u8])> {
    let out_of_bounds = || Error::ChunkOutOfBounds {
        slot,
        offset,
        len: input.len(),
    };
    if offset < FIRST_DATA_SECTOR {
        return Err(out_of_bounds());
    }

    let start = (offset as usize)
        .checked_mul(SECTOR_BYTES)
        .ok_or_else(out_of_bounds)?;
    let payload_start = start
        .checked_add(CHUNK_HEADER_BYTES)
        .ok_or_else(out_of_bounds)?;
    let header = input.get(start..payload_start).ok_or_else(out_of_bounds)?;
    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let kind = header[4];

    // The game counts the tag byte in the length, so a record that fills its
    // last sector claims one byte past the end of the file.
    let wanted_end = payload_start.saturating_add(length);
    let payload_end = wanted_end.min(input.len());
    if payload_end < wanted_end {
        log::warn!(
            "chunk slot {}: length {} runs {} bytes past the end of the file, clamping",
            slot,
            length,
            wanted_end - payload_end
        );
    }
    let payload = &input[payload_start..payload_end];
    Ok((kind, payload))
}
