//! Archive container reading and writing.

pub mod tar_backend;
pub mod zip_backend;

use crate::archive_path::ArchivePath;
use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::stream::{SeekWhence, Stream};

/// Archive container formats this crate can write.
///
/// The full vocabulary is enumerated here even though only
/// [`ArchiveFormat::TarUstar`], [`ArchiveFormat::TarPax`], and
/// [`ArchiveFormat::Zip`] are actually constructible — the remaining tags
/// let callers match exhaustively and keep the type aligned with formats the
/// reading side can at least recognize by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// POSIX ustar tar.
    TarUstar,
    /// POSIX pax-extended tar.
    TarPax,
    /// ZIP, via the `zip` crate.
    Zip,
    /// 7-Zip. Recognized, not writable or readable by this crate.
    SevenZip,
    /// cpio. Recognized, not writable or readable by this crate.
    Cpio,
    /// shar. Recognized, not writable or readable by this crate.
    Shar,
    /// ISO 9660. Recognized, not writable or readable by this crate.
    Iso9660,
}

impl ArchiveFormat {
    /// Whether this crate can actually read/write this format, as opposed to
    /// merely recognizing it.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            ArchiveFormat::TarUstar | ArchiveFormat::TarPax | ArchiveFormat::Zip
        )
    }
}

/// Metadata describing one archive entry, independent of container format.
#[derive(Debug, Clone)]
pub struct ArchiveEntryMeta {
    /// Path within the archive, forward-slash separated.
    pub path: ArchivePath,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// POSIX mode bits, when known.
    pub mode: u32,
    /// Modification time, as a Unix timestamp.
    pub mtime: i64,
    /// Whether this entry is a directory.
    pub is_dir: bool,
    /// Whether the entry's own bytes are individually compressed (true for
    /// Zip entries using Deflate; always false for tar, which never
    /// compresses members on its own).
    pub is_entry_compressed: bool,
}

/// Read side of an archive container: forward-only iteration over entries.
///
/// Advancing to the next entry implicitly discards any unread bytes of the
/// current one. There is no random access — a fresh reader is required to
/// revisit an earlier entry.
pub trait ArchiveReader {
    /// Advances to the next entry, returning `None` at the end of the
    /// archive.
    fn next_entry(&mut self) -> Result<Option<ArchiveEntryMeta>>;

    /// Returns a stream over the current entry's bytes. Valid until the next
    /// call to [`ArchiveReader::next_entry`].
    fn entry_stream(&mut self) -> Result<Box<dyn Stream + '_>>;

    /// Skips the current entry's remaining bytes without reading them.
    fn skip_entry(&mut self) -> Result<()>;
}

/// Write side of an archive container.
pub trait ArchiveWriter {
    /// Begins a new entry with the given metadata. `size` must match the
    /// total bytes subsequently passed to [`ArchiveWriter::write_data`], or
    /// [`ArchiveWriter::finish_entry`] fails with
    /// [`Error::ArchiveFormat`].
    fn new_entry(&mut self, meta: &ArchiveEntryMeta) -> Result<()>;

    /// Streams bytes of the current entry's data.
    fn write_data(&mut self, buf: &[u8]) -> Result<usize>;

    /// Finalizes the current entry.
    fn finish_entry(&mut self) -> Result<()>;

    /// Finalizes the archive container itself.
    fn close(&mut self) -> Result<()>;
}

/// A stream header read ahead to sniff a format, replayed before the rest of
/// `inner`'s bytes.
///
/// [`crate::magic::PrefixStream`] does the same job for the `std::io`-based
/// codec crates; this is the [`Stream`]-trait analog, needed here because
/// [`open_reader`] must sniff the leading bytes of sources that may not
/// support seek (a [`crate::codec::stream::CompressionDecoderStream`], most
/// notably) and so cannot rely on peek-then-seek-back. Only read access is
/// offered: once the caller is downstream of a replayed prefix, `tell`/`seek`
/// against the combined stream would be meaningless anyway.
struct HeaderReplayStream<'a> {
    header: Vec<u8>,
    header_pos: usize,
    inner: Box<dyn Stream + 'a>,
}

impl Stream for HeaderReplayStream<'_> {
    fn capabilities(&self) -> Capability {
        Capability::READ
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.header_pos < self.header.len() {
            let n = buf.len().min(self.header.len() - self.header_pos);
            buf[..n].copy_from_slice(&self.header[self.header_pos..self.header_pos + n]);
            self.header_pos += n;
            return Ok(n);
        }
        self.inner.read(buf)
    }

    fn raw_write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::NotWritable)
    }

    fn raw_seek(&mut self, _offset: i64, _whence: SeekWhence) -> Result<u64> {
        Err(Error::NotSeekable)
    }

    fn raw_tell(&self) -> Result<u64> {
        Err(Error::Unsupported("tell".into()))
    }

    fn raw_size(&self) -> Result<u64> {
        Err(Error::Unsupported("size".into()))
    }

    fn raw_mmap(&mut self, _start: u64, _length: usize) -> Result<()> {
        Err(Error::Unsupported("mmap".into()))
    }

    fn mapped(&self) -> Option<&[u8]> {
        None
    }

    fn raw_munmap(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Opens a read-only archive over `stream`, selecting a backend by magic
/// bytes (ZIP's local-file-header signature vs. everything else tried as
/// tar). Returns [`Error::Unsupported`] for formats this crate recognizes
/// but cannot parse.
///
/// `stream` need not be seekable: the leading bytes used to sniff the format
/// are peeked via `read` and, when the stream supports restoring its
/// position, seeked back; otherwise they are replayed via
/// [`HeaderReplayStream`]. This is what lets a `.tar.gz` be opened as an
/// archive directly over a [`crate::codec::stream::CompressionDecoderStream`],
/// which grants no seek capability at all.
pub fn open_reader<'a>(mut stream: Box<dyn Stream + 'a>) -> Result<Box<dyn ArchiveReader + 'a>> {
    #[cfg(feature = "archive")]
    {
        let start = stream.tell();
        let mut header = [0u8; 4];
        let mut filled = 0;
        while filled < header.len() {
            match stream.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => return Err(e),
            }
        }
        let header = &header[..filled];
        let is_zip = header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06");

        let probe: Box<dyn Stream + 'a> = match start {
            Ok(start) if stream.seek(start as i64, SeekWhence::Start).is_ok() => stream,
            _ => Box::new(HeaderReplayStream {
                header: header.to_vec(),
                header_pos: 0,
                inner: stream,
            }),
        };

        if is_zip {
            return Ok(Box::new(zip_backend::ZipReader::new(probe)?));
        }
        Ok(Box::new(tar_backend::TarReader::new(probe)?))
    }
    #[cfg(not(feature = "archive"))]
    {
        let _ = stream;
        Err(Error::Unsupported("archive feature disabled".into()))
    }
}

/// Creates a writer for `format` over `stream`.
pub fn create_writer<'a>(
    stream: Box<dyn Stream + 'a>,
    format: ArchiveFormat,
) -> Result<Box<dyn ArchiveWriter + 'a>> {
    #[cfg(feature = "archive")]
    match format {
        ArchiveFormat::TarUstar | ArchiveFormat::TarPax => {
            Ok(Box::new(tar_backend::TarWriter::new(stream, format)?))
        }
        ArchiveFormat::Zip => Ok(Box::new(zip_backend::ZipWriter::new(stream)?)),
        other => Err(Error::Unsupported(format!("writing {other:?}"))),
    }
    #[cfg(not(feature = "archive"))]
    {
        let _ = (stream, format);
        Err(Error::Unsupported("archive feature disabled".into()))
    }
}
