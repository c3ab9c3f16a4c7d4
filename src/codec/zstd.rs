//! Zstandard (ZSTD) compression codec.

use std::io::{self, Read, Write};

use zstd::stream::{Decoder as ZstdDecoderInner, Encoder as ZstdEncoderInner};

use super::{CompressionKind, Decoder, Encoder};

/// ZSTD decoder.
pub struct ZstdDecoder<R: std::io::BufRead> {
    inner: ZstdDecoderInner<'static, R>,
}

impl<R: std::io::BufRead> std::fmt::Debug for ZstdDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdDecoder").finish_non_exhaustive()
    }
}

impl<R: std::io::BufRead> ZstdDecoder<R> {
    /// Creates a new ZSTD decoder over a buffered reader.
    pub fn new(input: R) -> io::Result<Self> {
        Ok(Self {
            inner: ZstdDecoderInner::with_buffer(input)?,
        })
    }
}

impl<R: std::io::BufRead> Read for ZstdDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: std::io::BufRead> Decoder for ZstdDecoder<R> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zstd
    }
}

/// ZSTD encoder options.
#[derive(Debug, Clone)]
pub struct ZstdEncoderOptions {
    /// Compression level (1-22, default 3).
    pub level: i32,
}

impl Default for ZstdEncoderOptions {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdEncoderOptions {
    /// Creates options with the given compression level, clamped to `1..=22`.
    pub fn with_level(level: i32) -> Self {
        Self {
            level: level.clamp(1, 22),
        }
    }
}

/// ZSTD encoder.
pub struct ZstdEncoder<W: Write> {
    inner: ZstdEncoderInner<'static, W>,
}

impl<W: Write> std::fmt::Debug for ZstdEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> ZstdEncoder<W> {
    /// Creates a new ZSTD encoder.
    pub fn new(output: W, options: &ZstdEncoderOptions) -> io::Result<Self> {
        Ok(Self {
            inner: ZstdEncoderInner::new(output, options.level)?,
        })
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for ZstdEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for ZstdEncoder<W> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Zstd
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.inner.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_zstd_roundtrip() {
        let data = b"Hello, World! This is a test of Zstandard compression.";

        let mut compressed = Vec::new();
        let opts = ZstdEncoderOptions::default();
        {
            let encoder = ZstdEncoder::new(Cursor::new(&mut compressed), &opts).unwrap();
            let mut encoder = encoder;
            encoder.write_all(data).unwrap();
            Box::new(encoder).finish().unwrap();
        }

        let mut decoder = ZstdDecoder::new(BufReader::new(Cursor::new(&compressed))).unwrap();
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();

        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_zstd_encoder_options() {
        let opts = ZstdEncoderOptions::default();
        assert_eq!(opts.level, 3);

        let opts = ZstdEncoderOptions::with_level(100);
        assert_eq!(opts.level, 22);
    }
}
