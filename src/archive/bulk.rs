//! Whole-archive compression.
//!
//! The record stream is compressed as one stream so the compressor can find
//! repeats across chunks and across region files. Writing picks a codec;
//! reading detects it from the stream's magic bytes.

use std::fmt;
use std::io::{self, BufRead, Read, Write};

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Default zstd level. The archive is written once, so favour ratio.
pub const DEFAULT_ZSTD_LEVEL: i32 = 19;
pub const DEFAULT_GZIP_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCodec {
    Zstd { level: i32 },
    Gzip { level: u32 },
}

impl Default for BulkCodec {
    fn default() -> Self {
        BulkCodec::Zstd {
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl fmt::Display for BulkCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkCodec::Zstd { level } => write!(f, "zstd (level {level})"),
            BulkCodec::Gzip { level } => write!(f, "gzip (level {level})"),
        }
    }
}

impl BulkCodec {
    /// Wrap `inner` in a compressing writer.
    pub fn encoder<W: Write>(&self, inner: W) -> io::Result<BulkEncoder<W>> {
        match *self {
            BulkCodec::Zstd { level } => {
                let mut encoder = zstd::Encoder::new(inner, level)?;
                encoder.include_checksum(true)?;
                Ok(BulkEncoder::Zstd(encoder))
            }
            BulkCodec::Gzip { level } => Ok(BulkEncoder::Gzip(GzEncoder::new(
                inner,
                GzCompression::new(level),
            ))),
        }
    }
}

/// Compressing writer returned by [`BulkCodec::encoder`].
///
/// [`finish`](BulkEncoder::finish) must be called to write the stream trailer.
pub enum BulkEncoder<W: Write> {
    Zstd(zstd::Encoder<'static, W>),
    Gzip(GzEncoder<W>),
}

impl<W: Write> BulkEncoder<W> {
    pub fn finish(self) -> io::Result<W> {
        match self {
            BulkEncoder::Zstd(encoder) => encoder.finish(),
            BulkEncoder::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for BulkEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BulkEncoder::Zstd(encoder) => encoder.write(buf),
            BulkEncoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BulkEncoder::Zstd(encoder) => encoder.flush(),
            BulkEncoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Decompressing reader returned by [`open_decoder`].
pub enum BulkDecoder<R: BufRead> {
    Zstd(zstd::Decoder<'static, R>),
    Gzip(GzDecoder<R>),
}

impl<R: BufRead> Read for BulkDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BulkDecoder::Zstd(decoder) => decoder.read(buf),
            BulkDecoder::Gzip(decoder) => decoder.read(buf),
        }
    }
}

/// Open a decompressing reader, choosing the codec from the magic bytes.
pub fn open_decoder<R: BufRead>(mut inner: R) -> io::Result<BulkDecoder<R>> {
    let head = inner.fill_buf()?;
    if head.starts_with(&ZSTD_MAGIC) {
        log::debug!("Archive stream is zstd");
        Ok(BulkDecoder::Zstd(zstd::Decoder::with_buffer(inner)?))
    } else if head.starts_with(&GZIP_MAGIC) {
        log::debug!("Archive stream is gzip");
        Ok(BulkDecoder::Gzip(GzDecoder::new(inner)))
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unrecognised archive compression (first bytes {:02X?})", &head[..head.len().min(4)]),
        ))
    }
}
