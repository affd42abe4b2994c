//! Archive build and extract runs.
//!
//! Both directions are strictly sequential: one region file is read whole,
//! transcoded and written before the next one starts. Any failure aborts the
//! run and leaves whatever was written so far.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::archive::bulk::{open_decoder, BulkCodec};
use crate::archive::{output_path, record_name, ArchiveReader, ArchiveWriter};
use crate::chunk::Direction;
use crate::region::transcode;

/// Counters reported after an archive is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl ArchiveSummary {
    /// Input bytes per archive byte.
    pub fn ratio(&self) -> f64 {
        if self.output_bytes == 0 {
            return 0.0;
        }
        self.input_bytes as f64 / self.output_bytes as f64
    }
}

impl fmt::Display for ArchiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compressed {} region files", self.files)?;
        writeln!(f, "Input {} bytes, output {} bytes", self.input_bytes, self.output_bytes)?;
        write!(f, "Compression ratio {:.1}:1", self.ratio())
    }
}

/// Normalize every input and write it as one record of a new archive.
pub fn create_archive(archive: &Path, inputs: &[PathBuf], codec: BulkCodec) -> Result<ArchiveSummary> {
    let file = File::create(archive).with_context(|| format!("create {}", archive.display()))?;
    let encoder = codec
        .encoder(BufWriter::new(file))
        .context("start archive compression")?;
    let mut writer = ArchiveWriter::new(encoder);
    log::info!("Writing {} with {}", archive.display(), codec);

    let mut input_bytes = 0u64;
    for input in inputs {
        let data = fs::read(input).with_context(|| format!("read {}", input.display()))?;
        input_bytes += data.len() as u64;

        let transcoded = transcode(&data, Direction::Normalize)
            .with_context(|| format!("normalize {}", input.display()))?;
        log::debug!("{}: {:?}", input.display(), transcoded.stats);

        writer
            .write_record(&record_name(input), &transcoded.data)
            .with_context(|| format!("archive {}", input.display()))?;
        log::info!(
            "Archived {} ({} bytes, {} chunks, {} decompressed)",
            input.display(),
            data.len(),
            transcoded.stats.present,
            transcoded.stats.transformed
        );
    }

    let files = writer.records();
    let mut out = writer
        .into_inner()
        .finish()
        .context("finish archive compression")?;
    out.flush().with_context(|| format!("write {}", archive.display()))?;
    drop(out);

    let output_bytes = fs::metadata(archive)
        .with_context(|| format!("stat {}", archive.display()))?
        .len();
    Ok(ArchiveSummary {
        files,
        input_bytes,
        output_bytes,
    })
}

/// Restore every record of an archive into `output_dir`. Returns the number
/// of region files written.
pub fn extract_archive(archive: &Path, output_dir: &Path) -> Result<usize> {
    let file = File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let decoder = open_decoder(BufReader::new(file))
        .with_context(|| format!("open {}", archive.display()))?;

    let mut files = 0;
    for record in ArchiveReader::new(decoder) {
        let record = record.with_context(|| format!("read {}", archive.display()))?;
        let name = record.display_name();
        let target = output_dir.join(output_path(&record.name)?);

        let transcoded = transcode(&record.data, Direction::Restore)
            .with_context(|| format!("restore {name}"))?;
        log::debug!("{}: {:?}", name, transcoded.stats);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&target, &transcoded.data).with_context(|| format!("write {}", target.display()))?;
        log::info!("Extracted {} ({} bytes)", target.display(), transcoded.data.len());
        files += 1;
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{compression, deflate, inflate};
    use crate::region::fixture::{present_chunks, read_chunk, RegionBuilder};
    use crate::region::SECTOR_BYTES;
    use tempfile::TempDir;

    fn region_with(seed: u8) -> (Vec<u8>, Vec<Vec<u8>>) {
        let raws: Vec<Vec<u8>> = (0..4u8)
            .map(|i| (0..3000u32).map(|b| (b as u8 ^ seed).wrapping_mul(i + 1)).collect())
            .collect();
        let mut builder = RegionBuilder::new();
        for (i, raw) in raws.iter().enumerate() {
            // Leave gaps so the restored file is smaller than the input.
            builder = builder.chunk(i * 5, 2 + i as u32 * 3, compression::ZLIB, &deflate(raw).unwrap());
        }
        (builder.build(), raws)
    }

    fn assert_restored(data: &[u8], raws: &[Vec<u8>]) {
        let chunks = present_chunks(data);
        assert_eq!(chunks.len(), raws.len());
        for (i, raw) in raws.iter().enumerate() {
            let chunk = read_chunk(data, i * 5).unwrap();
            assert_eq!(chunk.kind, compression::ZLIB);
            assert_eq!(chunk.location.offset, 2 + i as u32);
            assert_eq!(&inflate(&chunk.payload).unwrap(), raw);
        }
        assert_eq!(data.len(), (2 + raws.len()) * SECTOR_BYTES);
    }

    fn round_trip(codec: BulkCodec) {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let mut inputs = Vec::new();
        let mut expected = Vec::new();
        for (seed, name) in [(1u8, "r.0.0.mca"), (2, "r.0.-1.mca"), (3, "r.-1.0.mca")] {
            let (data, raws) = region_with(seed);
            let path = src.path().join(name);
            fs::write(&path, &data).unwrap();
            inputs.push(path);
            expected.push((name, data.len(), raws));
        }

        let archive = src.path().join("world.mcz");
        let summary = create_archive(&archive, &inputs, codec).unwrap();
        assert_eq!(summary.files, 3);
        assert_eq!(summary.input_bytes, expected.iter().map(|(_, len, _)| *len as u64).sum::<u64>());
        assert_eq!(summary.output_bytes, fs::metadata(&archive).unwrap().len());
        assert!(summary.ratio() > 1.0);

        let files = extract_archive(&archive, out.path()).unwrap();
        assert_eq!(files, 3);

        // Absolute record names extract below the output directory.
        let extracted_dir = out.path().join(src.path().strip_prefix("/").unwrap());
        for (name, _, raws) in &expected {
            let data = fs::read(extracted_dir.join(name)).unwrap();
            assert_restored(&data, raws);
        }
    }

    #[test]
    fn test_archive_round_trip_zstd() {
        round_trip(BulkCodec::Zstd { level: 3 });
    }

    #[test]
    fn test_archive_round_trip_gzip() {
        round_trip(BulkCodec::Gzip { level: 6 });
    }

    #[test]
    fn test_records_in_input_order() {
        let src = TempDir::new().unwrap();
        let mut inputs = Vec::new();
        for name in ["c.mca", "a.mca", "b.mca"] {
            let path = src.path().join(name);
            fs::write(&path, region_with(9).0).unwrap();
            inputs.push(path);
        }
        let archive = src.path().join("order.mcz");
        create_archive(&archive, &inputs, BulkCodec::default()).unwrap();

        let decoder = open_decoder(BufReader::new(File::open(&archive).unwrap())).unwrap();
        let names: Vec<String> = ArchiveReader::new(decoder)
            .map(|r| r.unwrap().display_name())
            .collect();
        let expected: Vec<String> = inputs
            .iter()
            .map(|p| String::from_utf8(record_name(p)).unwrap())
            .collect();
        assert_eq!(names, expected);
        assert!(names.iter().all(|n| n.ends_with(".mca.dec")));

        // Archived records hold the normalized form.
        let decoder = open_decoder(BufReader::new(File::open(&archive).unwrap())).unwrap();
        let record = ArchiveReader::new(decoder).next().unwrap().unwrap();
        assert!(present_chunks(&record.data)
            .iter()
            .all(|(_, c)| c.kind == compression::STORED));
    }

    #[test]
    fn test_empty_region_file_round_trips() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let input = src.path().join("r.9.9.mca");
        fs::write(&input, b"").unwrap();

        let archive = src.path().join("empty.mcz");
        let summary = create_archive(&archive, &[input], BulkCodec::default()).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.input_bytes, 0);

        extract_archive(&archive, out.path()).unwrap();
        let restored = out.path().join(src.path().strip_prefix("/").unwrap()).join("r.9.9.mca");
        assert!(fs::read(restored).unwrap().is_empty());
    }

    #[test]
    fn test_missing_input_aborts() {
        let src = TempDir::new().unwrap();
        let archive = src.path().join("broken.mcz");
        let err = create_archive(&archive, &[src.path().join("nope.mca")], BulkCodec::default()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.mca"));
    }

    #[test]
    fn test_corrupt_chunk_aborts() {
        let src = TempDir::new().unwrap();
        let input = src.path().join("bad.mca");
        let data = RegionBuilder::new()
            .chunk(0, 2, compression::ZLIB, &[1, 2, 3, 4, 5])
            .build();
        fs::write(&input, data).unwrap();

        let archive = src.path().join("bad.mcz");
        assert!(create_archive(&archive, &[input], BulkCodec::default()).is_err());
    }

    #[test]
    fn test_truncated_archive_aborts() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        // Valid bulk stream around a record cut short.
        let mut encoder = BulkCodec::default().encoder(Vec::new()).unwrap();
        encoder.write_all(&[0, 0, 0, 8, b'r', b'.', b'm']).unwrap();
        let archive = src.path().join("cut.mcz");
        fs::write(&archive, encoder.finish().unwrap()).unwrap();

        let err = extract_archive(&archive, out.path()).unwrap_err();
        assert!(format!("{err:#}").contains("truncated"));
    }

    #[test]
    fn test_unsafe_record_name_rejected() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let mut writer = ArchiveWriter::new(BulkCodec::default().encoder(Vec::new()).unwrap());
        writer.write_record(b"../escape.mca.dec", b"").unwrap();
        let archive = src.path().join("evil.mcz");
        fs::write(&archive, writer.into_inner().finish().unwrap()).unwrap();

        assert!(extract_archive(&archive, out.path()).is_err());
        assert!(!out.path().parent().unwrap().join("escape.mca").exists());
    }

    #[test]
    fn test_summary_display() {
        let summary = ArchiveSummary {
            files: 2,
            input_bytes: 1000,
            output_bytes: 300,
        };
        assert_eq!(
            summary.to_string(),
            "Compressed 2 region files\nInput 1000 bytes, output 300 bytes\nCompression ratio 3.3:1"
        );
        assert_eq!(ArchiveSummary::default().ratio(), 0.0);
    }
}
