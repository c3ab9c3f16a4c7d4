//! Zip archive backend, built on the `zip` crate.
//!
//! Like [`super::tar_backend`], `zip::ZipArchive<R>::by_index` borrows the
//! archive for the returned `ZipFile`'s lifetime, which doesn't fit this
//! crate's one-entry-at-a-time `ArchiveReader` trait. The reader eagerly
//! extracts every entry into memory at construction for the same reason.

use std::io::Read as _;

use crate::archive::{ArchiveEntryMeta, ArchiveReader, ArchiveWriter};
use crate::archive_path::ArchivePath;
use crate::error::{Error, Result};
use crate::io_ext::StreamIoAdapter;
use crate::stream::Stream;

struct ParsedEntry {
    meta: ArchiveEntryMeta,
    data: Vec<u8>,
}

/// Forward-only reader over a ZIP container.
pub struct ZipReader {
    entries: std::vec::IntoIter<ParsedEntry>,
    current: Option<ParsedEntry>,
}

impl ZipReader {
    /// Parses every entry out of `source` up front. Requires a seekable
    /// source, since ZIP's central directory sits at the end of the file.
    pub fn new(mut source: Box<dyn Stream + '_>) -> Result<ZipReader> {
        log::debug!("opening zip archive for reading");
        let adapter = StreamIoAdapter::new(source.as_mut());
        let mut archive =
            zip::ZipArchive::new(adapter).map_err(|e| Error::ArchiveFormat(e.to_string()))?;

        let mut parsed = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
            let is_dir = file.is_dir();
            let path = file
                .enclosed_name()
                .ok_or_else(|| Error::ArchiveFormat("unsafe path in zip entry".into()))?
                .to_string_lossy()
                .replace('\\', "/");
            let size = file.size();
            let mode = file.unix_mode().unwrap_or(0o644);
            let mtime = file
                .last_modified()
                .and_then(|t| {
                    time_components_to_unix(
                        t.year() as i32,
                        t.month() as u32,
                        t.day() as u32,
                        t.hour() as u32,
                        t.minute() as u32,
                        t.second() as u32,
                    )
                })
                .unwrap_or(0);
            let is_entry_compressed = !matches!(file.compression(), zip::CompressionMethod::Stored);

            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ArchiveFormat(e.to_string()))?;

            parsed.push(ParsedEntry {
                meta: ArchiveEntryMeta {
                    path: ArchivePath::new(&path)?,
                    size,
                    mode,
                    mtime,
                    is_dir,
                    is_entry_compressed,
                },
                data,
            });
        }
        Ok(ZipReader {
            entries: parsed.into_iter(),
            current: None,
        })
    }
}

/// Best-effort conversion of a DOS-epoch-ish timestamp into a Unix
/// timestamp. Returns `None` for out-of-range components rather than
/// failing the whole entry.
fn time_components_to_unix(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<i64> {
    if !(1970..=2107).contains(&year) {
        return None;
    }
    let days_from_epoch = days_since_epoch(year, month, day)?;
    Some(days_from_epoch * 86_400 + (hour as i64) * 3600 + (minute as i64) * 60 + second as i64)
}

fn days_since_epoch(year: i32, month: u32, day: u32) -> Option<i64> {
    let is_leap = |y: i32| (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
    let days_in_month = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if !(1..=12).contains(&month) || day == 0 {
        return None;
    }
    let mut days: i64 = 0;
    for y in 1970..year {
        days += if is_leap(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += days_in_month[(m - 1) as usize];
        if m == 2 && is_leap(year) {
            days += 1;
        }
    }
    days += (day - 1) as i64;
    Some(days)
}

impl ArchiveReader for ZipReader {
    fn next_entry(&mut self) -> Result<Option<ArchiveEntryMeta>> {
        self.current = self.entries.next();
        Ok(self.current.as_ref().map(|e| e.meta.clone()))
    }

    fn entry_stream(&mut self) -> Result<Box<dyn Stream + '_>> {
        let data = self
            .current
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("no current entry".into()))?
            .data
            .clone();
        Ok(Box::new(crate::backend::MemoryStream::from_vec(data)))
    }

    fn skip_entry(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Append-only writer over a ZIP container.
///
/// `writer` is declared before `dest` for the same pointer-lifetime reason
/// as [`super::tar_backend::TarWriter`].
pub struct ZipWriter<'a> {
    // `zip::ZipWriter::finish` consumes `self` by value, so it is held
    // behind an `Option` here the same way `EncoderImpl` holds codec
    // encoders in `codec::stream` — `close`/`Drop` can then `take()` it out
    // of the `&mut self` field instead of needing to move out of a borrow.
    writer: Option<zip::ZipWriter<StreamIoAdapter<'static>>>,
    dest: Box<dyn Stream + 'a>,
    pending_size: u64,
    written: u64,
    pending_path: Option<ArchivePath>,
    closed: bool,
}

impl<'a> ZipWriter<'a> {
    /// Creates a ZIP writer. Requires a seekable destination, since the
    /// central directory is patched in after all entries are written.
    pub fn new(mut dest: Box<dyn Stream + 'a>) -> Result<Self> {
        log::debug!("creating zip archive");
        let ptr: *mut dyn Stream = dest.as_mut();
        // SAFETY: see TarWriter::new.
        let adapter = unsafe { StreamIoAdapter::from_raw(ptr) };
        Ok(Self {
            writer: Some(zip::ZipWriter::new(adapter)),
            dest,
            pending_size: 0,
            written: 0,
            pending_path: None,
            closed: false,
        })
    }

    fn writer_mut(&mut self) -> Result<&mut zip::ZipWriter<StreamIoAdapter<'static>>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("zip writer is closed".into()))
    }
}

impl Drop for ZipWriter<'_> {
    fn drop(&mut self) {
        // `zip::ZipWriter` never writes its central directory on drop; a
        // writer a caller forgot to close would otherwise produce a zip
        // file unreadable by any extractor.
        if !self.closed {
            let _ = ArchiveWriter::close(self);
        }
    }
}

impl ArchiveWriter for ZipWriter<'_> {
    fn new_entry(&mut self, meta: &ArchiveEntryMeta) -> Result<()> {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(meta.mode);
        self.writer_mut()?
            .start_file(meta.path.as_str(), options)
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        self.pending_size = meta.size;
        self.written = 0;
        self.pending_path = Some(meta.path.clone());
        Ok(())
    }

    fn write_data(&mut self, buf: &[u8]) -> Result<usize> {
        use std::io::Write;
        self.writer_mut()?
            .write(buf)
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn finish_entry(&mut self) -> Result<()> {
        let path = self
            .pending_path
            .take()
            .ok_or_else(|| Error::InvalidArgument("no pending entry".into()))?;
        if self.written != self.pending_size {
            return Err(Error::ArchiveFormat(format!(
                "entry {} declared size {} but received {} bytes",
                path.as_str(),
                self.pending_size,
                self.written
            )));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.writer
            .take()
            .ok_or_else(|| Error::InvalidArgument("zip writer is closed".into()))?
            .finish()
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        self.dest.close()
    }
}
