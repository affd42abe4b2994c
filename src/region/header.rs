//! Location table entries.
//!
//! Each of the 1024 entries is 4 bytes: a 3 byte big-endian sector offset
//! followed by a 1 byte sector count. An offset of 0 marks an absent chunk.

/// Largest value the 3 byte offset field can hold.
const MAX_OFFSET: u32 = 0x00FF_FFFF;

/// Where a chunk record lives inside a region file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// Sector index of the record (0 = absent).
    pub offset: u32,
    /// Sectors allocated to the record.
    pub sectors: u8,
}

impl Location {
    pub const ABSENT: Location = Location { offset: 0, sectors: 0 };

    pub fn new(offset: u32, sectors: u8) -> Self {
        debug_assert!(offset <= MAX_OFFSET, "sector offset {offset} exceeds 3 bytes");
        Self { offset, sectors }
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.offset == 0
    }

    pub fn unpack(entry: [u8; 4]) -> Self {
        let offset = (entry[0] as u32) << 16 | (entry[1] as u32) << 8 | entry[2] as u32;
        Self {
            offset,
            sectors: entry[3],
        }
    }

    pub fn pack(&self) -> [u8; 4] {
        [
            ((self.offset >> 16) & 0xFF) as u8,
            ((self.offset >> 8) & 0xFF) as u8,
            (self.offset & 0xFF) as u8,
            self.sectors,
        ]
    }

    /// Read the entry for `slot` from a location table.
    ///
    /// `table` must hold at least `(slot + 1) * 4` bytes.
    pub fn read(table: &[u8], slot: usize) -> Self {
        let i = slot * 4;
        Self::unpack([table[i], table[i + 1], table[i + 2], table[i + 3]])
    }

    /// Overwrite the entry for `slot` in a location table.
    pub fn write(&self, table: &mut [u8], slot: usize) {
        let i = slot * 4;
        table[i..i + 4].copy_from_slice(&self.pack());
    }
}
