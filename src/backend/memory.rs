//! In-memory buffer-backed stream.

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::stream::{SeekWhence, Stream};

const GROWTH_QUANTUM: usize = 1024;

enum Buffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl Buffer<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Owned(v) => v.as_slice(),
            Buffer::Borrowed(s) => s,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Buffer::Owned(v) => v.as_mut_slice(),
            Buffer::Borrowed(s) => s,
        }
    }

    fn len(&self) -> usize {
        match self {
            Buffer::Owned(v) => v.len(),
            Buffer::Borrowed(s) => s.len(),
        }
    }
}

/// A stream backed by an in-memory byte buffer.
///
/// Three construction modes: [`MemoryStream::new`] (owned, growable),
/// [`MemoryStream::from_vec`] (owned, growable, seeded with existing bytes),
/// and [`MemoryStream::borrowed`] (a fixed-size view over a caller-owned
/// slice; writes past its end fail with [`Error::NoSpace`]).
pub struct MemoryStream<'a> {
    buffer: Buffer<'a>,
    // Logical length, distinct from the backing buffer's physical capacity:
    // growth rounds `buffer` up to the next growth quantum and zero-fills it,
    // but only bytes actually written (or present at construction) are
    // readable or reported by `size`.
    length: usize,
    position: usize,
    can_grow: bool,
    mapped_range: Option<(usize, usize)>,
}

impl MemoryStream<'static> {
    /// Creates an empty, owned, growable memory stream.
    pub fn new() -> Self {
        Self {
            buffer: Buffer::Owned(Vec::new()),
            length: 0,
            position: 0,
            can_grow: true,
            mapped_range: None,
        }
    }

    /// Creates an owned, growable memory stream seeded with `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let length = data.len();
        Self {
            buffer: Buffer::Owned(data),
            length,
            position: 0,
            can_grow: true,
            mapped_range: None,
        }
    }
}

impl Default for MemoryStream<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MemoryStream<'a> {
    /// Creates a fixed-size memory stream over a borrowed, non-owned slice.
    /// Writes past the end of `data` fail rather than growing it.
    pub fn borrowed(data: &'a mut [u8]) -> Self {
        let length = data.len();
        Self {
            buffer: Buffer::Borrowed(data),
            length,
            position: 0,
            can_grow: false,
            mapped_range: None,
        }
    }

    /// Returns the current contents as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.length]
    }

    fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if needed <= self.buffer.len() {
            return Ok(());
        }
        if !self.can_grow {
            return Err(Error::NoSpace);
        }
        let rounded = needed.div_ceil(GROWTH_QUANTUM) * GROWTH_QUANTUM;
        match &mut self.buffer {
            Buffer::Owned(v) => {
                v.try_reserve(rounded - v.len())
                    .map_err(|_| Error::OutOfMemory)?;
                v.resize(rounded, 0);
                Ok(())
            }
            Buffer::Borrowed(_) => Err(Error::NoSpace),
        }
    }
}

impl Stream for MemoryStream<'_> {
    fn capabilities(&self) -> Capability {
        Capability::READ
            | Capability::WRITE
            | Capability::SEEK_ABSOLUTE
            | Capability::SEEK_RELATIVE
            | Capability::SEEK_FROM_END
            | Capability::TELL
            | Capability::SIZE
            | Capability::EMULATED_MMAP
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let available = self.length.saturating_sub(self.position);
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&self.buffer.as_slice()[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }

    fn raw_write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.can_grow {
            let available = self.length.saturating_sub(self.position);
            if buf.len() > available {
                return Err(Error::NoSpace);
            }
            self.buffer.as_mut_slice()[self.position..self.position + buf.len()]
                .copy_from_slice(buf);
            self.position += buf.len();
            return Ok(buf.len());
        }
        self.ensure_capacity(self.position + buf.len())?;
        self.buffer.as_mut_slice()[self.position..self.position + buf.len()].copy_from_slice(buf);
        self.position += buf.len();
        self.length = self.length.max(self.position);
        Ok(buf.len())
    }

    fn raw_seek(&mut self, offset: i64, whence: SeekWhence) -> Result<u64> {
        let base: i64 = match whence {
            SeekWhence::Start => 0,
            SeekWhence::Current => self.position as i64,
            SeekWhence::End => self.length as i64,
        };
        let target = base
            .checked_add(offset)
            .ok_or(Error::OutOfRange)?;
        if target < 0 {
            return Err(Error::OutOfRange);
        }
        let target = target as usize;
        if matches!(whence, SeekWhence::Start) {
            self.position = target.min(self.length);
        } else {
            self.position = target;
        }
        Ok(self.position as u64)
    }

    fn raw_tell(&self) -> Result<u64> {
        Ok(self.position as u64)
    }

    fn raw_size(&self) -> Result<u64> {
        Ok(self.length as u64)
    }

    fn raw_mmap(&mut self, start: u64, length: usize) -> Result<()> {
        let start = usize::try_from(start).map_err(|_| Error::OutOfRange)?;
        let end = start.checked_add(length).ok_or(Error::OutOfRange)?;
        if end > self.length {
            return Err(Error::OutOfRange);
        }
        self.mapped_range = Some((start, length));
        Ok(())
    }

    fn mapped(&self) -> Option<&[u8]> {
        self.mapped_range
            .map(|(start, len)| &self.buffer.as_slice()[start..start + len])
    }

    fn raw_munmap(&mut self) -> Result<()> {
        self.mapped_range = None;
        Ok(())
    }

    fn raw_flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_close(&mut self) -> Result<()> {
        self.mapped_range = None;
        Ok(())
    }
}

impl Drop for MemoryStream<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::write_all;

    #[test]
    fn growth_round_trip() {
        let mut s = MemoryStream::new();
        let data = vec![7u8; 5000];
        write_all(&mut s, &data).unwrap();
        s.seek(0, SeekWhence::Start).unwrap();
        let mut out = vec![0u8; data.len()];
        let mut total = 0;
        while total < out.len() {
            let n = s.read(&mut out[total..]).unwrap();
            assert!(n > 0);
            total += n;
        }
        assert_eq!(out, data);
    }

    #[test]
    fn borrowed_rejects_overflow() {
        let mut backing = [0u8; 4];
        let mut s = MemoryStream::borrowed(&mut backing);
        assert_eq!(s.write(b"ab").unwrap(), 2);
        assert!(matches!(s.write(b"abc"), Err(Error::NoSpace)));
        assert_eq!(s.write(b"cd").unwrap(), 2);
    }

    #[test]
    fn read_past_end_returns_zero() {
        let mut s = MemoryStream::from_vec(b"hi".to_vec());
        s.seek(0, SeekWhence::Start).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_negative_absolute_is_out_of_range() {
        let mut s = MemoryStream::new();
        assert!(matches!(s.seek(-1, SeekWhence::Start), Err(Error::OutOfRange)));
    }

    #[test]
    fn mmap_then_remmap_releases_prior_region() {
        let mut s = MemoryStream::from_vec(b"abcdefgh".to_vec());
        s.mmap(0, 4).unwrap();
        assert_eq!(s.mapped(), Some(&b"abcd"[..]));
        s.mmap(4, 4).unwrap();
        assert_eq!(s.mapped(), Some(&b"efgh"[..]));
    }
}
