//! mca-recompress: archive Minecraft region files so they compress better.
//!
//! Chunks inside a region file are zlib compressed one by one, which hides
//! everything they have in common. Building an archive stores every chunk
//! uncompressed and compresses the whole set of region files as one stream;
//! extracting reverses it and writes region files the game can load.
//!
//! - [`region`]: region file layout and the whole-file transcoder
//! - [`chunk`]: per-chunk zlib codec
//! - [`archive`]: record container and whole-archive compression
//! - [`driver`]: build / extract runs over files on disk

pub mod archive;
pub mod chunk;
pub mod driver;
pub mod error;
pub mod region;

pub use chunk::Direction;
pub use error::{Error, Result};
pub use region::{transcode, Transcoded};
