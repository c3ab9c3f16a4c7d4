//! Compression codec infrastructure.
//!
//! Each codec wraps a real ecosystem crate behind the same tiny `Decoder`/`Encoder`
//! trait pair, so the [`stream`] module can build a [`crate::Stream`] on top of any
//! of them uniformly. Codecs never implement inflate/deflate themselves.

#[cfg(feature = "gzip")]
pub mod gzip;

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "xz")]
pub mod xz;

#[cfg(feature = "zstd")]
pub mod zstd;

pub mod stream;

use std::io::{self, Read, Write};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {
    /// Returns the compression kind this decoder implements.
    fn kind(&self) -> CompressionKind;
}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write {
    /// Returns the compression kind this encoder implements.
    fn kind(&self) -> CompressionKind;

    /// Finishes encoding, flushing any trailer the format requires.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Compression formats detectable by magic bytes and supported end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionKind {
    /// RFC 1952 gzip.
    Gzip,
    /// bzip2.
    Bzip2,
    /// `.xz` (LZMA2 container).
    Xz,
    /// Zstandard.
    Zstd,
}

impl CompressionKind {
    /// Magic byte prefix that identifies this format, as used by [`crate::magic`].
    pub fn magic(self) -> &'static [u8] {
        match self {
            CompressionKind::Gzip => &[0x1f, 0x8b],
            CompressionKind::Bzip2 => b"BZh",
            CompressionKind::Xz => &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00],
            CompressionKind::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
        }
    }
}

#[cfg(feature = "gzip")]
pub use gzip::{GzipDecoder, GzipEncoder, GzipEncoderOptions};

#[cfg(feature = "bzip2")]
pub use bzip2::{Bzip2Decoder, Bzip2Encoder, Bzip2EncoderOptions};

#[cfg(feature = "xz")]
pub use xz::{XzDecoder, XzEncoder, XzEncoderOptions};

#[cfg(feature = "zstd")]
pub use self::zstd::{ZstdDecoder, ZstdEncoder, ZstdEncoderOptions};

pub use self::stream::{CompressionDecoderStream, CompressionEncoderStream};
