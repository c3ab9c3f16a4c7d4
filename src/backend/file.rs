//! OS-file-backed stream.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::stream::{OpenMode, SeekWhence, Stream};

#[cfg(feature = "mmap")]
enum MappedRegion {
    ReadOnly(memmap2::Mmap),
    ReadWrite(memmap2::MmapMut),
}

#[cfg(feature = "mmap")]
impl MappedRegion {
    fn as_slice(&self) -> &[u8] {
        match self {
            MappedRegion::ReadOnly(m) => &m[..],
            MappedRegion::ReadWrite(m) => &m[..],
        }
    }
}

/// A stream backed by a real file on disk.
///
/// At most one mmap region is live at a time; a new `mmap` call implicitly
/// releases any prior region before establishing the new one, and `close`
/// releases a live mapping before releasing the file handle.
pub struct FileStream {
    file: Option<File>,
    path: PathBuf,
    capabilities: Capability,
    #[cfg(feature = "mmap")]
    mapped: Option<MappedRegion>,
}

impl FileStream {
    /// Opens `path` under the given [`OpenMode`] flags.
    ///
    /// `CREATE | TRUNCATE` opens-or-creates and truncates; `CREATE` alone
    /// opens-or-creates without truncating; `TRUNCATE` alone requires the
    /// file to already exist. Neither flag requires the file to pre-exist.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening file stream {:?} mode={:?}", path, mode);

        let mut opts = OpenOptions::new();
        opts.read(mode.contains(OpenMode::READ));
        opts.write(mode.contains(OpenMode::WRITE));
        if mode.contains(OpenMode::CREATE) {
            opts.create(true);
        }
        if mode.contains(OpenMode::TRUNCATE) {
            opts.truncate(true);
        }

        let file = opts
            .open(path)
            .map_err(|e| Error::from_open_io(e, path.display()))?;

        let mut capabilities = Capability::TELL | Capability::SIZE | Capability::FLUSH;
        if mode.contains(OpenMode::READ) {
            capabilities |= Capability::READ;
        }
        if mode.contains(OpenMode::WRITE) {
            capabilities |= Capability::WRITE | Capability::TRUNCATE;
        }
        capabilities |= Capability::SEEK_ABSOLUTE | Capability::SEEK_RELATIVE | Capability::SEEK_FROM_END;
        #[cfg(feature = "mmap")]
        {
            capabilities |= Capability::NATIVE_MMAP;
        }

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            capabilities,
            #[cfg(feature = "mmap")]
            mapped: None,
        })
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("stream is closed".into()))
    }

    fn file_ref(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("stream is closed".into()))
    }

    /// The path this stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Stream for FileStream {
    fn capabilities(&self) -> Capability {
        self.capabilities
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file_mut()?.read(buf)?)
    }

    fn raw_write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.file_mut()?.write(buf)?)
    }

    fn raw_seek(&mut self, offset: i64, whence: SeekWhence) -> Result<u64> {
        let pos = match whence {
            SeekWhence::Start => {
                let abs = u64::try_from(offset).map_err(|_| Error::OutOfRange)?;
                SeekFrom::Start(abs)
            }
            SeekWhence::Current => SeekFrom::Current(offset),
            SeekWhence::End => SeekFrom::End(offset),
        };
        self.file_mut()?.seek(pos).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidInput {
                Error::OutOfRange
            } else {
                Error::Io(e)
            }
        })
    }

    fn raw_tell(&self) -> Result<u64> {
        // stream_position() needs &mut File; clone the handle rather than
        // widen Stream::tell to &mut self just for this backend.
        let mut file = self.file_ref()?.try_clone()?;
        Ok(file.stream_position()?)
    }

    fn raw_size(&self) -> Result<u64> {
        Ok(self.file_ref()?.metadata()?.len())
    }

    #[cfg(feature = "mmap")]
    fn raw_mmap(&mut self, start: u64, length: usize) -> Result<()> {
        self.mapped = None;
        let file = self.file_ref()?;
        let writable = self.capabilities.contains(Capability::WRITE);
        let region = if writable {
            let mmap = unsafe {
                memmap2::MmapOptions::new()
                    .offset(start)
                    .len(length)
                    .map_mut(file)
                    .map_err(Error::Io)?
            };
            MappedRegion::ReadWrite(mmap)
        } else {
            let mmap = unsafe {
                memmap2::MmapOptions::new()
                    .offset(start)
                    .len(length)
                    .map(file)
                    .map_err(Error::Io)?
            };
            MappedRegion::ReadOnly(mmap)
        };
        self.mapped = Some(region);
        Ok(())
    }

    #[cfg(not(feature = "mmap"))]
    fn raw_mmap(&mut self, _start: u64, _length: usize) -> Result<()> {
        Err(Error::Unsupported("mmap feature disabled".into()))
    }

    #[cfg(feature = "mmap")]
    fn mapped(&self) -> Option<&[u8]> {
        self.mapped.as_ref().map(MappedRegion::as_slice)
    }

    #[cfg(not(feature = "mmap"))]
    fn mapped(&self) -> Option<&[u8]> {
        None
    }

    #[cfg(feature = "mmap")]
    fn raw_munmap(&mut self) -> Result<()> {
        self.mapped = None;
        Ok(())
    }

    #[cfg(not(feature = "mmap"))]
    fn raw_munmap(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_flush(&mut self) -> Result<()> {
        Ok(self.file_mut()?.flush()?)
    }

    fn raw_close(&mut self) -> Result<()> {
        #[cfg(feature = "mmap")]
        {
            self.mapped = None;
        }
        self.file = None;
        Ok(())
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{SeekWhence, write_all};

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut w = FileStream::open(&path, OpenMode::WRITE | OpenMode::CREATE | OpenMode::TRUNCATE).unwrap();
        write_all(&mut w, b"File stream test data").unwrap();
        w.close().unwrap();

        let mut r = FileStream::open(&path, OpenMode::READ).unwrap();
        assert_eq!(r.size().unwrap(), 21);
        let mut buf = [0u8; 100];
        let n = r.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"File stream test data");
    }

    #[test]
    fn seek_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.bin");

        let mut w = FileStream::open(&path, OpenMode::WRITE | OpenMode::CREATE | OpenMode::TRUNCATE).unwrap();
        write_all(&mut w, b"0123456789").unwrap();
        w.close().unwrap();

        let mut r = FileStream::open(&path, OpenMode::READ).unwrap();
        assert_eq!(r.seek(5, SeekWhence::Start).unwrap(), 5);
        let mut one = [0u8; 1];
        r.read(&mut one).unwrap();
        assert_eq!(&one, b"5");

        assert_eq!(r.seek(2, SeekWhence::Current).unwrap(), 8);
        r.read(&mut one).unwrap();
        assert_eq!(&one, b"8");

        assert_eq!(r.seek(-3, SeekWhence::End).unwrap(), 7);
        r.read(&mut one).unwrap();
        assert_eq!(&one, b"7");
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        let mut s = FileStream::open(&path, OpenMode::WRITE | OpenMode::CREATE).unwrap();
        s.close().unwrap();
        s.close().unwrap();
    }

    #[test]
    fn read_zero_length_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        let mut s = FileStream::open(&path, OpenMode::WRITE | OpenMode::CREATE).unwrap();
        assert_eq!(s.write(b"x").unwrap(), 1);
        s.close().unwrap();

        let mut r = FileStream::open(&path, OpenMode::READ).unwrap();
        let mut buf: [u8; 0] = [];
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }
}
