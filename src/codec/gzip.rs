//! Gzip codec implementation.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder as FlateDecoder;
use flate2::write::GzEncoder as FlateEncoder;

use super::{CompressionKind, Decoder, Encoder};

/// Gzip decoder.
pub struct GzipDecoder<R> {
    inner: FlateDecoder<R>,
}

impl<R> std::fmt::Debug for GzipDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> GzipDecoder<R> {
    /// Creates a new gzip decoder over `input`.
    pub fn new(input: R) -> Self {
        Self {
            inner: FlateDecoder::new(input),
        }
    }
}

impl<R: Read> Read for GzipDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for GzipDecoder<R> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Gzip
    }
}

/// Gzip encoder options.
#[derive(Debug, Clone)]
pub struct GzipEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for GzipEncoderOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl GzipEncoderOptions {
    /// Creates options with the given compression level, clamped to `0..=9`.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Gzip encoder.
pub struct GzipEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for GzipEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> GzipEncoder<W> {
    /// Creates a new gzip encoder writing to `output`.
    pub fn new(output: W, options: &GzipEncoderOptions) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(options.level)),
        }
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for GzipEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for GzipEncoder<W> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Gzip
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.inner.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_gzip_roundtrip() {
        let data = b"Hello, World! This is a test of gzip compression.";

        let mut compressed = Vec::new();
        let opts = GzipEncoderOptions::default();
        {
            let mut encoder = GzipEncoder::new(Cursor::new(&mut compressed), &opts);
            encoder.write_all(data).unwrap();
            Box::new(encoder).finish().unwrap();
        }

        let mut decoder = GzipDecoder::new(Cursor::new(&compressed));
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();

        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_gzip_encoder_options() {
        let opts = GzipEncoderOptions::default();
        assert_eq!(opts.level, 6);

        let opts = GzipEncoderOptions::with_level(9);
        assert_eq!(opts.level, 9);

        let opts = GzipEncoderOptions::with_level(100);
        assert_eq!(opts.level, 9);
    }

    #[test]
    fn test_gzip_kind() {
        let decoder = GzipDecoder::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(decoder.kind(), CompressionKind::Gzip);
    }
}
