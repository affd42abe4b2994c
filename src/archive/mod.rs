//! Archive container.
//!
//! A flat stream of records, each `[name_len: u32 BE][name][data_len: u32 BE][data]`.
//! There is no index, magic or checksum: records are read back in the order
//! they were written until the stream ends.

pub mod bulk;

use std::io::{ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix appended to the input name of every record.
pub const RECORD_SUFFIX: &str = ".dec";

/// One named blob from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl Record {
    /// Name as text, for logging.
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// Appends records to an output stream.
pub struct ArchiveWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write_record(&mut self, name: &[u8], data: &[u8]) -> Result<()> {
        self.write_field(name)?;
        self.write_field(data)?;
        self.records += 1;
        Ok(())
    }

    fn write_field(&mut self, field: &[u8]) -> Result<()> {
        let len = u32::try_from(field.len()).map_err(|_| Error::RecordTooLarge { len: field.len() })?;
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(field)?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Hand back the stream so the caller can finish or flush it.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads records lazily from an input stream.
///
/// Yields `Ok(Record)` until the stream ends on a record boundary. A stream
/// that ends inside a record yields one `Err(TruncatedRecord)` and then stops.
pub struct ArchiveReader<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    fn read_record(&mut self) -> Result<Option<Record>> {
        let Some(name_len) = self.read_len("name length", true)? else {
            return Ok(None);
        };
        let name = self.read_bytes(name_len, "name")?;
        let data_len = self
            .read_len("data length", false)?
            .ok_or(Error::TruncatedRecord { what: "data length" })?;
        let data = self.read_bytes(data_len, "data")?;
        Ok(Some(Record { name, data }))
    }

    /// Read a 4 byte length. With `eof_ok`, a clean end of stream before the
    /// first byte returns None.
    fn read_len(&mut self, what: &'static str, eof_ok: bool) -> Result<Option<usize>> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 && eof_ok => return Ok(None),
                Ok(0) => return Err(Error::TruncatedRecord { what }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(u32::from_be_bytes(buf) as usize))
    }

    fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(Error::TruncatedRecord { what });
        }
        Ok(buf)
    }
}

impl<R: Read> Iterator for ArchiveReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Record name for an input file: the path bytes exactly as given plus `.dec`.
pub fn record_name(input: &Path) -> Vec<u8> {
    let mut name = path_bytes(input);
    name.extend_from_slice(RECORD_SUFFIX.as_bytes());
    name
}

/// Output path for a record, relative to the extraction directory.
///
/// Strips one trailing `.dec`. Names without the suffix are used unchanged.
/// A leading root is dropped with a warning; names with `..` components are
/// rejected.
pub fn output_path(name: &[u8]) -> Result<PathBuf> {
    let invalid = || Error::InvalidRecordName {
        name: String::from_utf8_lossy(name).into_owned(),
    };
    let stripped = match name.strip_suffix(RECORD_SUFFIX.as_bytes()) {
        Some(stripped) => stripped,
        None => {
            log::warn!(
                "Record {:?} has no {} suffix, extracting under the same name",
                String::from_utf8_lossy(name),
                RECORD_SUFFIX
            );
            name
        }
    };

    let path = bytes_path(stripped);
    let mut clean = PathBuf::new();
    let mut rooted = false;
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => rooted = true,
            Component::ParentDir => return Err(invalid()),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(invalid());
    }
    if rooted {
        log::warn!("Removing leading root from {}", path.display());
    }
    Ok(clean)
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn bytes_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
