//! Bridges between [`crate::Stream`] and `std::io`, and small binary-I/O helpers.
//!
//! The codec crates this library depends on (`flate2`, `bzip2`, `xz2`, `zstd`)
//! all speak `std::io::Read`/`Write`, not [`crate::Stream`]. [`StreamIoAdapter`]
//! is the thin bridge that lets a `&mut dyn Stream` stand in for either.

use std::io;

use crate::stream::Stream;

/// Adapts a borrowed `&mut dyn Stream` to `std::io::Read`/`Write`.
///
/// Stream errors are mapped to `io::Error` via `io::Error::other`; this is a
/// one-way adaptation used only to hand a stream to a codec crate, never to
/// recover the original [`crate::Error`] variant.
pub struct StreamIoAdapter<'a> {
    inner: &'a mut dyn Stream,
}

impl<'a> StreamIoAdapter<'a> {
    /// Wraps `stream` for consumption by a `std::io`-based codec.
    pub fn new(stream: &'a mut dyn Stream) -> Self {
        Self { inner: stream }
    }

    /// Builds an adapter over a raw pointer to a stream whose lifetime is
    /// tracked externally rather than through the borrow checker.
    ///
    /// Used by [`crate::codec::stream`] to let a codec object hold its input
    /// alongside the `Owning` value that input came from, in the same
    /// struct. That pairing is safe only because the struct's field
    /// declaration order drops the codec (and this adapter) before the
    /// `Owning` value it points into.
    ///
    /// # Safety
    ///
    /// The caller must guarantee `stream` stays valid and is not aliased for
    /// the entire lifetime of the returned adapter.
    pub(crate) unsafe fn from_raw(stream: *mut dyn Stream) -> StreamIoAdapter<'static> {
        StreamIoAdapter {
            // SAFETY: forwarded to the caller's contract above.
            inner: unsafe { &mut *stream },
        }
    }
}

impl io::Read for StreamIoAdapter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(io::Error::other)
    }
}

impl io::Write for StreamIoAdapter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(io::Error::other)
    }
}

impl io::Seek for StreamIoAdapter<'_> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            io::SeekFrom::Start(n) => (n as i64, crate::stream::SeekWhence::Start),
            io::SeekFrom::Current(n) => (n, crate::stream::SeekWhence::Current),
            io::SeekFrom::End(n) => (n, crate::stream::SeekWhence::End),
        };
        self.inner.seek(offset, whence).map_err(io::Error::other)
    }
}

/// Endian-aware integer helpers layered over any [`Stream`].
///
/// This is intentionally minimal: the core data model this crate implements
/// stops at byte streams, and richer binary-serialization needs (structured
/// records, variable-length framing) are a caller concern outside this
/// library's scope.
pub trait BinaryIo: Stream {
    /// Reads a little-endian `u32`.
    fn read_u32_le(&mut self) -> crate::Result<u32> {
        let mut buf = [0u8; 4];
        crate::stream::read_exact(self, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Writes a little-endian `u32`.
    fn write_u32_le(&mut self, value: u32) -> crate::Result<()> {
        crate::stream::write_all(self, &value.to_le_bytes())
    }

    /// Reads a little-endian `u64`.
    fn read_u64_le(&mut self) -> crate::Result<u64> {
        let mut buf = [0u8; 8];
        crate::stream::read_exact(self, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes a little-endian `u64`.
    fn write_u64_le(&mut self, value: u64) -> crate::Result<()> {
        crate::stream::write_all(self, &value.to_le_bytes())
    }
}

impl<T: Stream + ?Sized> BinaryIo for T {}
