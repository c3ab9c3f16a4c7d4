//! Magic-byte format detection. Never by file extension.

use crate::codec::CompressionKind;
use crate::error::{Error, Result};
use crate::stream::{SeekWhence, Stream};

const MAX_MAGIC_LEN: usize = 6;

/// Detects the compression format of `stream` by its leading bytes, restoring
/// the stream's position before returning.
///
/// Fails with [`Error::NotSeekable`] if `stream` cannot report and restore
/// its position; use [`PrefixStream`] to offer a seekable view of a
/// non-seekable source first.
pub fn detect(stream: &mut dyn Stream) -> Result<Option<CompressionKind>> {
    let start = stream.tell().map_err(|_| Error::NotSeekable)?;

    let mut header = [0u8; MAX_MAGIC_LEN];
    let mut filled = 0;
    while filled < header.len() {
        let n = stream.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    stream.seek(start as i64, SeekWhence::Start)?;

    let header = &header[..filled];
    for kind in [
        CompressionKind::Gzip,
        CompressionKind::Bzip2,
        CompressionKind::Xz,
        CompressionKind::Zstd,
    ] {
        if header.starts_with(kind.magic()) {
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Presents a single `std::io::Read` over a buffered prefix followed by the
/// rest of a non-seekable reader, so [`detect`]-like logic can inspect a
/// header without requiring the original source to seek.
pub struct PrefixStream<R> {
    prefix: std::io::Cursor<Vec<u8>>,
    rest: R,
}

impl<R: std::io::Read> PrefixStream<R> {
    /// Reads up to `len` bytes from `reader` into an owned prefix buffer and
    /// returns a combined reader of (prefix, remaining `reader`).
    pub fn capture(mut reader: R, len: usize) -> std::io::Result<Self> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(Self {
            prefix: std::io::Cursor::new(buf),
            rest: reader,
        })
    }

    /// The captured prefix bytes, for direct magic inspection.
    pub fn prefix_bytes(&self) -> &[u8] {
        self.prefix.get_ref()
    }
}

impl<R: std::io::Read> std::io::Read for PrefixStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let pos = self.prefix.position() as usize;
        if pos < self.prefix.get_ref().len() {
            return std::io::Read::read(&mut self.prefix, buf);
        }
        self.rest.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStream;

    #[test]
    fn detects_gzip() {
        let mut s = MemoryStream::from_vec(vec![0x1f, 0x8b, 0x08, 0x00]);
        assert_eq!(detect(&mut s).unwrap(), Some(CompressionKind::Gzip));
        assert_eq!(s.tell().unwrap(), 0);
    }

    #[test]
    fn detects_none_for_plain_text() {
        let mut s = MemoryStream::from_vec(b"plain text data".to_vec());
        assert_eq!(detect(&mut s).unwrap(), None);
    }

    #[test]
    fn detects_xz() {
        let mut s = MemoryStream::from_vec(vec![0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x01]);
        assert_eq!(detect(&mut s).unwrap(), Some(CompressionKind::Xz));
    }

    #[test]
    fn prefix_stream_concatenates() {
        let data = b"abcdefgh".to_vec();
        let mut combined = PrefixStream::capture(std::io::Cursor::new(data.clone()), 3).unwrap();
        assert_eq!(combined.prefix_bytes(), b"abc");
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut combined, &mut out).unwrap();
        assert_eq!(out, data);
    }
}
