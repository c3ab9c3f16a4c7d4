//! Tar archive backend, built on the `tar` crate.
//!
//! `tar::Archive<R>::entries()` borrows the archive for the entry iterator's
//! whole lifetime, which doesn't fit this crate's `ArchiveReader` trait (it
//! hands out entries one at a time behind `&mut self`, not behind one long
//! borrow). Rather than fight that with unsafe lifetime extension, the
//! reader eagerly parses every entry's metadata and bytes once at
//! construction; `next_entry`/`entry_stream` then just walk an owned `Vec`.
//! This trades streaming-from-disk for simplicity, which is the right trade
//! for this crate's synchronous, single-threaded model and the archive
//! sizes it targets (see DESIGN.md).

use std::io::Read as _;

use crate::archive::{ArchiveEntryMeta, ArchiveFormat, ArchiveReader, ArchiveWriter};
use crate::archive_path::ArchivePath;
use crate::error::{Error, Result};
use crate::io_ext::StreamIoAdapter;
use crate::stream::Stream;

struct ParsedEntry {
    meta: ArchiveEntryMeta,
    data: Vec<u8>,
}

/// Forward-only reader over a tar container.
pub struct TarReader {
    entries: std::vec::IntoIter<ParsedEntry>,
    current: Option<ParsedEntry>,
}

impl TarReader {
    /// Parses every entry out of `source` up front.
    pub fn new(mut source: Box<dyn Stream + '_>) -> Result<TarReader> {
        log::debug!("opening tar archive for reading");
        let mut archive = tar::Archive::new(StreamIoAdapter::new(source.as_mut()));
        let mut parsed = Vec::new();
        for entry in archive
            .entries()
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| Error::ArchiveFormat(e.to_string()))?;
            let header = entry.header();
            let path = entry
                .path()
                .map_err(|e| Error::ArchiveFormat(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            let size = header.size().map_err(|e| Error::ArchiveFormat(e.to_string()))?;
            let mode = header.mode().unwrap_or(0o644);
            let mtime = header.mtime().unwrap_or(0) as i64;
            let is_dir = entry.header().entry_type().is_dir();

            let mut data = Vec::with_capacity(size as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::ArchiveFormat(e.to_string()))?;

            parsed.push(ParsedEntry {
                meta: ArchiveEntryMeta {
                    path: ArchivePath::new(&path)?,
                    size,
                    mode,
                    mtime,
                    is_dir,
                    is_entry_compressed: false,
                },
                data,
            });
        }
        Ok(TarReader {
            entries: parsed.into_iter(),
            current: None,
        })
    }
}

impl ArchiveReader for TarReader {
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

/// Append-only writer over a tar container.
///
/// `builder` is declared before `dest` so it drops first: it holds a
/// pointer-backed [`StreamIoAdapter`] into `*dest`, which must not be
/// invalidated while `builder` is still alive (see `codec::stream` for the
/// same pattern applied to compression streams).
pub struct TarWriter<'a> {
    builder: tar::Builder<StreamIoAdapter<'static>>,
    dest: Box<dyn Stream + 'a>,
    pending_path: Option<ArchivePath>,
    pending_size: u64,
    written: u64,
    buffer: Vec<u8>,
    closed: bool,
}

impl<'a> TarWriter<'a> {
    /// Creates a tar writer. `format` distinguishes ustar from pax only for
    /// documentation purposes here — the `tar` crate negotiates the concrete
    /// header format per entry based on path/size, so both map to the same
    /// builder.
    pub fn new(mut dest: Box<dyn Stream + 'a>, format: ArchiveFormat) -> Result<Self> {
        log::debug!("creating {:?} archive", format);
        let ptr: *mut dyn Stream = dest.as_mut();
        // SAFETY: `dest` outlives `builder` because it is declared after it
        // in the struct and is never moved out independently.
        let adapter = unsafe { StreamIoAdapter::from_raw(ptr) };
        Ok(Self {
            builder: tar::Builder::new(adapter),
            dest,
            pending_path: None,
            pending_size: 0,
            written: 0,
            buffer: Vec::new(),
            closed: false,
        })
    }
}

impl Drop for TarWriter<'_> {
    fn drop(&mut self) {
        // `tar::Builder` doesn't finalize on drop; a writer a caller forgot
        // to close would otherwise produce a truncated archive missing its
        // trailing zero blocks.
        if !self.closed {
            let _ = ArchiveWriter::close(self);
        }
    }
}

impl ArchiveWriter for TarWriter<'_> {
    fn new_entry(&mut self, meta: &ArchiveEntryMeta) -> Result<()> {
        self.pending_path = Some(meta.path.clone());
        self.pending_size = meta.size;
        self.written = 0;
        self.buffer.clear();
        Ok(())
    }

    fn write_data(&mut self, buf: &[u8]) -> Result<usize> {
        self.buffer.extend_from_slice(buf);
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
        let mut header = tar::Header::new_ustar();
        header.set_path(path.as_str()).map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        header.set_size(self.pending_size);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder
            .append(&header, self.buffer.as_slice())
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.builder
            .finish()
            .map_err(|e| Error::ArchiveFormat(e.to_string()))?;
        self.dest.close()
    }
}
