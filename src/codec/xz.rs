//! XZ (LZMA2 container) codec implementation.

use std::io::{self, Read, Write};

use xz2::read::XzDecoder as LzmaDecoder;
use xz2::write::XzEncoder as LzmaEncoder;

use super::{CompressionKind, Decoder, Encoder};

/// XZ decoder.
pub struct XzDecoder<R> {
    inner: LzmaDecoder<R>,
}

impl<R> std::fmt::Debug for XzDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XzDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> XzDecoder<R> {
    /// Creates a new XZ decoder.
    pub fn new(input: R) -> Self {
        Self {
            inner: LzmaDecoder::new(input),
        }
    }
}

impl<R: Read> Read for XzDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for XzDecoder<R> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Xz
    }
}

/// XZ encoder options.
#[derive(Debug, Clone)]
pub struct XzEncoderOptions {
    /// Compression preset (0-9, default 6).
    pub preset: u32,
}

impl Default for XzEncoderOptions {
    fn default() -> Self {
        Self { preset: 6 }
    }
}

impl XzEncoderOptions {
    /// Creates options with the given preset, clamped to `0..=9`.
    pub fn with_preset(preset: u32) -> Self {
        Self {
            preset: preset.min(9),
        }
    }
}

/// XZ encoder.
pub struct XzEncoder<W: Write> {
    inner: LzmaEncoder<W>,
}

impl<W: Write> std::fmt::Debug for XzEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XzEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> XzEncoder<W> {
    /// Creates a new XZ encoder.
    pub fn new(output: W, options: &XzEncoderOptions) -> Self {
        Self {
            inner: LzmaEncoder::new(output, options.preset),
        }
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for XzEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for XzEncoder<W> {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Xz
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.inner.finish()?;
        Ok(())
    }
}
