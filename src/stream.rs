//! The polymorphic [`Stream`] trait and its supporting types.

use bitflags::bitflags;

use crate::capability::Capability;
use crate::error::{Error, Result};

/// Reference point for a [`Stream::seek`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekWhence {
    /// Offset is absolute from the start of the stream.
    Start,
    /// Offset is relative to the current position.
    Current,
    /// Offset is relative to the end of the stream (usually negative).
    End,
}

bitflags! {
    /// Open-mode flags accepted by backend constructors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenMode: u32 {
        /// Open for reading.
        const READ = 1 << 0;
        /// Open for writing.
        const WRITE = 1 << 1;
        /// Create the target if it does not exist.
        const CREATE = 1 << 2;
        /// Truncate the target to zero length on open.
        const TRUNCATE = 1 << 3;
    }
}

/// Whether a layered stream owns the stream it wraps.
///
/// This replaces a bare `owns_underlying: bool`: the two cases are held
/// explicitly so that closing an `Owned` wrapper recurses into the inner
/// stream's `close`, while a `Borrowed` wrapper leaves the inner stream's
/// lifetime entirely to its original owner.
pub enum Owning<'a> {
    /// The wrapper exclusively owns the inner stream and will close it.
    Owned(Box<dyn Stream + 'a>),
    /// The wrapper borrows the inner stream; its owner closes it separately.
    Borrowed(&'a mut dyn Stream),
}

impl<'a> Owning<'a> {
    /// Returns a mutable reference to the inner stream regardless of ownership.
    pub fn as_mut(&mut self) -> &mut dyn Stream {
        match self {
            Owning::Owned(s) => s.as_mut(),
            Owning::Borrowed(s) => *s,
        }
    }

    /// Closes the inner stream if and only if it is owned.
    pub fn close_if_owned(&mut self) -> Result<()> {
        match self {
            Owning::Owned(s) => s.close(),
            Owning::Borrowed(_) => Ok(()),
        }
    }
}

/// A polymorphic byte source/sink with a fixed dispatch table and capability set.
///
/// Implementors provide the `raw_*` methods; the provided methods perform the
/// capability check, dispatch, and normalization every call site otherwise
/// has to repeat. The trait is object-safe so `Box<dyn Stream>` is the common
/// currency throughout this crate (the walker, in particular, hands out
/// `&mut dyn Stream` to callbacks without knowing the concrete backend).
pub trait Stream {
    /// Returns this stream's fixed capability set.
    fn capabilities(&self) -> Capability;

    /// Backend implementation of `read`. Called only when `Capability::READ` is set.
    fn raw_read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Backend implementation of `write`. Called only when `Capability::WRITE` is set.
    fn raw_write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Backend implementation of `seek`. Called only when the matching seek
    /// capability for `whence` is set.
    fn raw_seek(&mut self, offset: i64, whence: SeekWhence) -> Result<u64>;

    /// Backend implementation of `tell`. Called only when `Capability::TELL` is set.
    fn raw_tell(&self) -> Result<u64>;

    /// Backend implementation of `size`. Called only when `Capability::SIZE` is set.
    fn raw_size(&self) -> Result<u64>;

    /// Establishes a mapped region `[start, start + length)`. Called only when
    /// the stream can mmap at all; implicitly releases any prior region.
    fn raw_mmap(&mut self, start: u64, length: usize) -> Result<()>;

    /// Returns the currently mapped region, if any.
    fn mapped(&self) -> Option<&[u8]>;

    /// Releases the current mapped region, if any. A no-op if none is mapped.
    fn raw_munmap(&mut self) -> Result<()>;

    /// Backend implementation of `flush`.
    fn raw_flush(&mut self) -> Result<()>;

    /// Backend implementation of `close`. Must be idempotent: a second call
    /// returns `Ok(())` without side effects.
    fn raw_close(&mut self) -> Result<()>;

    /// Reads into `buf`, returning the number of bytes read (0 at end of
    /// stream). Reading into an empty buffer is always a no-op `Ok(0)`,
    /// regardless of capability.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.capabilities().contains(Capability::READ) {
            return Err(Error::NotReadable);
        }
        self.raw_read(buf)
    }

    /// Writes from `buf`, returning the number of bytes accepted (short
    /// writes are legal; see [`write_all`] for a retrying wrapper).
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.capabilities().contains(Capability::WRITE) {
            return Err(Error::NotWritable);
        }
        self.raw_write(buf)
    }

    /// Seeks to a new position, returning the resulting absolute offset.
    fn seek(&mut self, offset: i64, whence: SeekWhence) -> Result<u64> {
        let required = match whence {
            SeekWhence::Start => Capability::SEEK_ABSOLUTE,
            SeekWhence::Current => Capability::SEEK_RELATIVE,
            SeekWhence::End => Capability::SEEK_FROM_END,
        };
        if !self.capabilities().contains(required) {
            return Err(Error::NotSeekable);
        }
        self.raw_seek(offset, whence)
    }

    /// Returns the current logical position.
    fn tell(&self) -> Result<u64> {
        if !self.capabilities().contains(Capability::TELL) {
            return Err(Error::Unsupported("tell".into()));
        }
        self.raw_tell()
    }

    /// Returns the total logical size, if known.
    fn size(&self) -> Result<u64> {
        if !self.capabilities().contains(Capability::SIZE) {
            return Err(Error::Unsupported("size".into()));
        }
        self.raw_size()
    }

    /// Maps `[start, start + length)` of the logical stream, exposing it via
    /// [`Stream::mapped`]. At most one region is live at a time; a new call
    /// implicitly releases a prior one.
    fn mmap(&mut self, start: u64, length: usize) -> Result<()> {
        if !self.capabilities().can_mmap() {
            return Err(Error::Unsupported("mmap".into()));
        }
        self.raw_mmap(start, length)
    }

    /// Releases the current mapped region.
    fn munmap(&mut self) -> Result<()> {
        if !self.capabilities().can_mmap() {
            return Err(Error::Unsupported("mmap".into()));
        }
        self.raw_munmap()
    }

    /// Flushes any buffered writes.
    fn flush(&mut self) -> Result<()> {
        if !self.capabilities().contains(Capability::FLUSH) {
            return Ok(());
        }
        self.raw_flush()
    }

    /// Closes the stream, releasing any OS or memory resources it holds.
    /// Idempotent.
    fn close(&mut self) -> Result<()> {
        self.raw_close()
    }
}

/// Reads from `stream` until `buf` is completely filled or the stream ends,
/// failing with [`Error::UnexpectedEof`] on a short read.
pub fn read_exact(stream: &mut dyn Stream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        filled += n;
    }
    Ok(())
}

/// Writes the entirety of `buf` to `stream`, looping over short writes.
pub fn write_all(stream: &mut dyn Stream, buf: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < buf.len() {
        let n = stream.write(&buf[written..])?;
        if n == 0 {
            return Err(Error::NoSpace);
        }
        written += n;
    }
    Ok(())
}
