//! Command line front end for mca-recompress.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, ValueEnum};

use mca_recompress::archive::bulk::{BulkCodec, DEFAULT_GZIP_LEVEL, DEFAULT_ZSTD_LEVEL};
use mca_recompress::driver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodecKind {
    Zstd,
    Gzip,
}

#[derive(Parser, Debug)]
#[command(name = "mca-recompress", about = "Archive Minecraft region files with cross-chunk compression")]
pub struct Args {
    /// Build ARCHIVE from the given region files
    #[arg(short = 'a', value_name = "ARCHIVE", conflicts_with = "extract")]
    pub archive: Option<PathBuf>,

    /// Extract the region files stored in ARCHIVE
    #[arg(short = 'd', value_name = "ARCHIVE")]
    pub extract: Option<PathBuf>,

    /// Region files to archive
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Whole-archive compression used when building
    #[arg(long, env = "MCA_CODEC", value_enum, default_value_t = CodecKind::Zstd)]
    pub codec: CodecKind,

    /// Compression level for the archive codec (zstd default 19, gzip default 9)
    #[arg(long, env = "MCA_LEVEL", allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Directory extracted region files are written to
    #[arg(short = 'C', long, env = "MCA_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

impl Args {
    fn bulk_codec(&self) -> anyhow::Result<BulkCodec> {
        match self.codec {
            CodecKind::Zstd => {
                let level = self.level.unwrap_or(DEFAULT_ZSTD_LEVEL);
                let range = zstd::compression_level_range();
                if !range.contains(&level) {
                    bail!("zstd level {} outside {}..={}", level, range.start(), range.end());
                }
                Ok(BulkCodec::Zstd { level })
            }
            CodecKind::Gzip => {
                let level = self.level.unwrap_or(DEFAULT_GZIP_LEVEL as i32);
                if !(0..=9).contains(&level) {
                    bail!("gzip level {} outside 0..=9", level);
                }
                Ok(BulkCodec::Gzip { level: level as u32 })
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(&Args::parse())
}

fn run(args: &Args) -> anyhow::Result<()> {
    if let Some(archive) = &args.archive {
        let codec = args.bulk_codec()?;
        let summary = driver::create_archive(archive, &args.inputs, codec)?;
        eprintln!("{summary}");
    } else if let Some(archive) = &args.extract {
        if !args.inputs.is_empty() {
            log::warn!("Ignoring {} extra arguments in extract mode", args.inputs.len());
        }
        let files = driver::extract_archive(archive, &args.output_dir)?;
        log::info!("Extracted {} region files into {}", files, args.output_dir.display());
    } else {
        log::warn!("Nothing to do: pass -a <ARCHIVE> <INPUT>... or -d <ARCHIVE>");
    }

    Ok(())
}
