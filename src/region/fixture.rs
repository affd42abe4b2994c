//! Test helpers for building and inspecting region files.

use super::{
    sector_to_offset, sectors_for, Location, CHUNK_HEADER_BYTES, HEADER_BYTES, LOCATION_ENTRIES,
    SECTOR_BYTES,
};

/// Builds a region file with chunk records placed at chosen sectors.
pub struct RegionBuilder {
    data: Vec<u8>,
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; HEADER_BYTES],
        }
    }

    /// Place a record for `slot` at `sector`. The count byte is computed from
    /// the record length and clamped to 255.
    pub fn chunk(mut self, slot: usize, sector: u32, kind: u8, payload: &[u8]) -> Self {
        let start = sector_to_offset(sector);
        let record_len = CHUNK_HEADER_BYTES + payload.len();
        let end = start + sectors_for(record_len) * SECTOR_BYTES;
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[start..start + 4].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        self.data[start + 4] = kind;
        self.data[start + 5..start + record_len].copy_from_slice(payload);

        let sectors = sectors_for(record_len).min(255) as u8;
        Location::new(sector, sectors).write(&mut self.data, slot);
        self
    }

    pub fn timestamp(mut self, slot: usize, timestamp: u32) -> Self {
        let i = SECTOR_BYTES + slot * 4;
        self.data[i..i + 4].copy_from_slice(&timestamp.to_be_bytes());
        self
    }

    /// Overwrite a raw location entry.
    pub fn location(mut self, slot: usize, location: Location) -> Self {
        location.write(&mut self.data, slot);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// A chunk record as found in a region file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChunk {
    pub location: Location,
    pub kind: u8,
    pub payload: Vec<u8>,
}

/// Parse the record for `slot`, or None when the slot is absent.
pub fn read_chunk(data: &[u8], slot: usize) -> Option<ParsedChunk> {
    let location = Location::read(data, slot);
    if location.is_absent() {
        return None;
    }
    let start = sector_to_offset(location.offset);
    let len = u32::from_be_bytes(data[start..start + 4].try_into().unwrap()) as usize;
    Some(ParsedChunk {
        location,
        kind: data[start + 4],
        payload: data[start + 5..start + 5 + len].to_vec(),
    })
}

/// Every present slot with its record, in slot order.
pub fn present_chunks(data: &[u8]) -> Vec<(usize, ParsedChunk)> {
    (0..LOCATION_ENTRIES)
        .filter_map(|slot| read_chunk(data, slot).map(|chunk| (slot, chunk)))
        .collect()
}
