//! Unifies a codec's decoder/encoder behind [`crate::Stream`].
//!
//! Direction is fixed at construction (this crate models read and write sides
//! as distinct types rather than one struct with an internal flag), and each
//! type owns or borrows its underlying stream via [`crate::stream::Owning`].
//!
//! The codec object and the `Owning` value it reads from/writes to live in
//! the same struct, which is normally a self-referential borrow the checker
//! rejects. We instead hand the codec a raw-pointer-backed [`StreamIoAdapter`]
//! and rely on field declaration order: `inner` is declared before
//! `underlying`, so it always drops (and stops touching the pointer) first.
//! `Owning` never relocates the bytes it points to when moved — a `Box`'s
//! heap allocation doesn't move, and a `&mut dyn Stream` is just a pointer
//! value — so the pointer stays valid for the struct's entire lifetime.

use crate::capability::Capability;
use crate::codec::CompressionKind;
use crate::error::{Error, Result};
use crate::io_ext::StreamIoAdapter;
use crate::stream::{Owning, SeekWhence, Stream};

use super::{Decoder, Encoder};

#[cfg(feature = "gzip")]
use super::gzip::{GzipDecoder, GzipEncoder, GzipEncoderOptions};
#[cfg(feature = "bzip2")]
use super::bzip2::{Bzip2Decoder, Bzip2Encoder, Bzip2EncoderOptions};
#[cfg(feature = "xz")]
use super::xz::{XzDecoder, XzEncoder, XzEncoderOptions};
#[cfg(feature = "zstd")]
use super::zstd::{ZstdDecoder, ZstdEncoder, ZstdEncoderOptions};

/// Options controlling how a [`CompressionEncoderStream`] is constructed.
#[derive(Debug, Clone, Default)]
pub struct CompressionEncoderOptions {
    #[cfg(feature = "gzip")]
    /// Options used when `kind` is [`CompressionKind::Gzip`].
    pub gzip: GzipEncoderOptions,
    #[cfg(feature = "bzip2")]
    /// Options used when `kind` is [`CompressionKind::Bzip2`].
    pub bzip2: Bzip2EncoderOptions,
    #[cfg(feature = "xz")]
    /// Options used when `kind` is [`CompressionKind::Xz`].
    pub xz: XzEncoderOptions,
    #[cfg(feature = "zstd")]
    /// Options used when `kind` is [`CompressionKind::Zstd`].
    pub zstd: ZstdEncoderOptions,
}

enum DecoderImpl {
    #[cfg(feature = "gzip")]
    Gzip(GzipDecoder<StreamIoAdapter<'static>>),
    #[cfg(feature = "bzip2")]
    Bzip2(Bzip2Decoder<StreamIoAdapter<'static>>),
    #[cfg(feature = "xz")]
    Xz(XzDecoder<StreamIoAdapter<'static>>),
    #[cfg(feature = "zstd")]
    Zstd(ZstdDecoder<std::io::BufReader<StreamIoAdapter<'static>>>),
}

impl DecoderImpl {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::Read;
        match self {
            #[cfg(feature = "gzip")]
            DecoderImpl::Gzip(d) => d.read(buf),
            #[cfg(feature = "bzip2")]
            DecoderImpl::Bzip2(d) => d.read(buf),
            #[cfg(feature = "xz")]
            DecoderImpl::Xz(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            DecoderImpl::Zstd(d) => d.read(buf),
        }
    }

    fn build(stream: *mut dyn Stream, kind: CompressionKind) -> Result<Self> {
        // SAFETY: see module-level doc; `stream` outlives every `DecoderImpl`
        // built from it because of field declaration order in the owning struct.
        let adapter = unsafe { StreamIoAdapter::from_raw(stream) };
        match kind {
            #[cfg(feature = "gzip")]
            CompressionKind::Gzip => Ok(DecoderImpl::Gzip(GzipDecoder::new(adapter))),
            #[cfg(feature = "bzip2")]
            CompressionKind::Bzip2 => Ok(DecoderImpl::Bzip2(Bzip2Decoder::new(adapter))),
            #[cfg(feature = "xz")]
            CompressionKind::Xz => Ok(DecoderImpl::Xz(XzDecoder::new(adapter))),
            #[cfg(feature = "zstd")]
            CompressionKind::Zstd => Ok(DecoderImpl::Zstd(ZstdDecoder::new(
                std::io::BufReader::new(adapter),
            )?)),
            #[allow(unreachable_patterns)]
            _ => Err(Error::Unsupported(format!(
                "codec {kind:?} not compiled in"
            ))),
        }
    }
}

/// A read-only, one-directional decompressing [`Stream`].
///
/// Seeking is not a granted capability: the logical position only ever
/// advances. [`CompressionDecoderStream::discard_forward`] offers the
/// forward-only "skip ahead" operation the emulated-mmap path needs, as an
/// inherent method rather than as part of the general `Stream` contract.
pub struct CompressionDecoderStream<'a> {
    inner: Option<DecoderImpl>,
    underlying: Owning<'a>,
    kind: CompressionKind,
    position: u64,
    at_eof: bool,
    mapped: Option<Vec<u8>>,
}

impl<'a> CompressionDecoderStream<'a> {
    /// Constructs a decoding stream of `kind` over `underlying`.
    pub fn new(mut underlying: Owning<'a>, kind: CompressionKind) -> Result<Self> {
        log::debug!("constructing compression decoder kind={:?}", kind);
        let ptr: *mut dyn Stream = underlying.as_mut();
        let inner = DecoderImpl::build(ptr, kind)?;
        Ok(Self {
            inner: Some(inner),
            underlying,
            kind,
            position: 0,
            at_eof: false,
            mapped: None,
        })
    }

    /// The compression kind this stream decodes.
    pub fn kind(&self) -> CompressionKind {
        self.kind
    }

    /// Decodes and discards bytes until the logical position reaches `target`.
    /// Fails with [`Error::Unsupported`] if `target` is already behind the
    /// current position (decoders cannot rewind without reconstruction).
    pub fn discard_forward(&mut self, target: u64) -> Result<()> {
        if target < self.position {
            return Err(Error::Unsupported(
                "cannot rewind a compression decoder".into(),
            ));
        }
        let mut scratch = [0u8; 8192];
        while self.position < target {
            let want = (target - self.position).min(scratch.len() as u64) as usize;
            let n = self.raw_read(&mut scratch[..want])?;
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
        }
        Ok(())
    }
}

impl Stream for CompressionDecoderStream<'_> {
    fn capabilities(&self) -> Capability {
        Capability::READ | Capability::TELL | Capability::EMULATED_MMAP | Capability::IS_COMPRESSED
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.at_eof {
            return Ok(0);
        }
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("stream is closed".into()))?;
        let n = inner
            .read(buf)
            .map_err(|e| Error::DecodeError(e.to_string()))?;
        if n == 0 {
            self.at_eof = true;
        }
        self.position += n as u64;
        Ok(n)
    }

    fn raw_write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::NotWritable)
    }

    fn raw_seek(&mut self, _offset: i64, _whence: SeekWhence) -> Result<u64> {
        Err(Error::NotSeekable)
    }

    fn raw_tell(&self) -> Result<u64> {
        Ok(self.position)
    }

    fn raw_size(&self) -> Result<u64> {
        Err(Error::Unsupported("size".into()))
    }

    fn raw_mmap(&mut self, start: u64, length: usize) -> Result<()> {
        if start < self.position {
            return Err(Error::Unsupported(
                "emulated mmap window starts before current decode position".into(),
            ));
        }
        self.mapped = None;
        self.discard_forward(start)?;
        let mut buf = vec![0u8; length];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.raw_read(&mut buf[filled..])?;
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
            filled += n;
        }
        self.mapped = Some(buf);
        Ok(())
    }

    fn mapped(&self) -> Option<&[u8]> {
        self.mapped.as_deref()
    }

    fn raw_munmap(&mut self) -> Result<()> {
        self.mapped = None;
        Ok(())
    }

    fn raw_flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn raw_close(&mut self) -> Result<()> {
        self.mapped = None;
        self.inner = None;
        self.underlying.close_if_owned()
    }
}

impl Drop for CompressionDecoderStream<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

enum EncoderImpl {
    #[cfg(feature = "gzip")]
    Gzip(Option<GzipEncoder<StreamIoAdapter<'static>>>),
    #[cfg(feature = "bzip2")]
    Bzip2(Option<Bzip2Encoder<StreamIoAdapter<'static>>>),
    #[cfg(feature = "xz")]
    Xz(Option<XzEncoder<StreamIoAdapter<'static>>>),
    #[cfg(feature = "zstd")]
    Zstd(Option<ZstdEncoder<StreamIoAdapter<'static>>>),
}

impl EncoderImpl {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use std::io::Write;
        match self {
            #[cfg(feature = "gzip")]
            EncoderImpl::Gzip(e) => e.as_mut().expect("encoder finished").write(buf),
            #[cfg(feature = "bzip2")]
            EncoderImpl::Bzip2(e) => e.as_mut().expect("encoder finished").write(buf),
            #[cfg(feature = "xz")]
            EncoderImpl::Xz(e) => e.as_mut().expect("encoder finished").write(buf),
            #[cfg(feature = "zstd")]
            EncoderImpl::Zstd(e) => e.as_mut().expect("encoder finished").write(buf),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self {
            #[cfg(feature = "gzip")]
            EncoderImpl::Gzip(e) => {
                if let Some(e) = e.take() {
                    Box::new(e)
                        .finish()
                        .map_err(|err| Error::EncodeError(err.to_string()))?;
                }
            }
            #[cfg(feature = "bzip2")]
            EncoderImpl::Bzip2(e) => {
                if let Some(e) = e.take() {
                    Box::new(e)
                        .finish()
                        .map_err(|err| Error::EncodeError(err.to_string()))?;
                }
            }
            #[cfg(feature = "xz")]
            EncoderImpl::Xz(e) => {
                if let Some(e) = e.take() {
                    Box::new(e)
                        .finish()
                        .map_err(|err| Error::EncodeError(err.to_string()))?;
                }
            }
            #[cfg(feature = "zstd")]
            EncoderImpl::Zstd(e) => {
                if let Some(e) = e.take() {
                    Box::new(e)
                        .finish()
                        .map_err(|err| Error::EncodeError(err.to_string()))?;
                }
            }
        }
        Ok(())
    }

    fn build(
        stream: *mut dyn Stream,
        kind: CompressionKind,
        options: &CompressionEncoderOptions,
    ) -> Result<Self> {
        // SAFETY: see module-level doc.
        let adapter = unsafe { StreamIoAdapter::from_raw(stream) };
        match kind {
            #[cfg(feature = "gzip")]
            CompressionKind::Gzip => Ok(EncoderImpl::Gzip(Some(GzipEncoder::new(
                adapter,
                &options.gzip,
            )))),
            #[cfg(feature = "bzip2")]
            CompressionKind::Bzip2 => Ok(EncoderImpl::Bzip2(Some(Bzip2Encoder::new(
                adapter,
                &options.bzip2,
            )))),
            #[cfg(feature = "xz")]
            CompressionKind::Xz => {
                Ok(EncoderImpl::Xz(Some(XzEncoder::new(adapter, &options.xz))))
            }
            #[cfg(feature = "zstd")]
            CompressionKind::Zstd => Ok(EncoderImpl::Zstd(Some(ZstdEncoder::new(
                adapter,
                &options.zstd,
            )?))),
            #[allow(unreachable_patterns)]
            _ => Err(Error::Unsupported(format!(
                "codec {kind:?} not compiled in"
            ))),
        }
    }
}

/// A write-only, one-directional compressing [`Stream`].
pub struct CompressionEncoderStream<'a> {
    inner: Option<EncoderImpl>,
    underlying: Owning<'a>,
    kind: CompressionKind,
    position: u64,
}

impl<'a> CompressionEncoderStream<'a> {
    /// Constructs an encoding stream of `kind` over `underlying`.
    pub fn new(
        mut underlying: Owning<'a>,
        kind: CompressionKind,
        options: &CompressionEncoderOptions,
    ) -> Result<Self> {
        log::debug!("constructing compression encoder kind={:?}", kind);
        let ptr: *mut dyn Stream = underlying.as_mut();
        let inner = EncoderImpl::build(ptr, kind, options)?;
        Ok(Self {
            inner: Some(inner),
            underlying,
            kind,
            position: 0,
        })
    }

    /// The compression kind this stream encodes.
    pub fn kind(&self) -> CompressionKind {
        self.kind
    }
}

impl Stream for CompressionEncoderStream<'_> {
    fn capabilities(&self) -> Capability {
        Capability::WRITE | Capability::TELL | Capability::IS_COMPRESSED
    }

    fn raw_read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::NotReadable)
    }

    fn raw_write(&mut self, buf: &[u8]) -> Result<usize> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("stream is closed".into()))?;
        let n = inner
            .write(buf)
            .map_err(|e| Error::EncodeError(e.to_string()))?;
        self.position += n as u64;
        Ok(n)
    }

    fn raw_seek(&mut self, _offset: i64, _whence: SeekWhence) -> Result<u64> {
        Err(Error::NotSeekable)
    }

    fn raw_tell(&self) -> Result<u64> {
        Ok(self.position)
    }

    fn raw_size(&self) -> Result<u64> {
        Err(Error::Unsupported("size".into()))
    }

    fn raw_mmap(&mut self, _start: u64, _length: usize) -> Result<()> {
        Err(Error::Unsupported("mmap on an encoding stream".into()))
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
        if let Some(mut inner) = self.inner.take() {
            inner.finish()?;
        }
        self.underlying.close_if_owned()
    }
}

impl Drop for CompressionEncoderStream<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStream;
    use crate::stream::{SeekWhence, write_all};

    #[test]
    fn gzip_round_trip_through_memory() {
        let source = b"The quick brown fox jumps over the lazy dog.".repeat(4);

        let mut sink = MemoryStream::new();
        {
            let mut encoder = CompressionEncoderStream::new(
                Owning::Borrowed(&mut sink),
                CompressionKind::Gzip,
                &CompressionEncoderOptions::default(),
            )
            .unwrap();
            write_all(&mut encoder, &source).unwrap();
            encoder.close().unwrap();
        }

        let compressed = sink.as_slice().to_vec();
        assert!(compressed.len() < source.len());

        let mut compressed_stream = MemoryStream::from_vec(compressed);
        compressed_stream.seek(0, SeekWhence::Start).unwrap();
        let mut decoder = CompressionDecoderStream::new(
            Owning::Borrowed(&mut compressed_stream),
            CompressionKind::Gzip,
        )
        .unwrap();
        let mut decompressed = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = decoder.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            decompressed.extend_from_slice(&buf[..n]);
        }
        assert_eq!(decompressed, source);
    }

    #[test]
    fn emulated_mmap_rejects_backward_window() {
        let mut sink = MemoryStream::new();
        {
            let mut encoder = CompressionEncoderStream::new(
                Owning::Borrowed(&mut sink),
                CompressionKind::Gzip,
                &CompressionEncoderOptions::default(),
            )
            .unwrap();
            write_all(&mut encoder, &[b'a'; 4096]).unwrap();
            encoder.close().unwrap();
        }

        let compressed = sink.as_slice().to_vec();
        let mut compressed_stream = MemoryStream::from_vec(compressed);
        compressed_stream.seek(0, SeekWhence::Start).unwrap();
        let mut decoder = CompressionDecoderStream::new(
            Owning::Borrowed(&mut compressed_stream),
            CompressionKind::Gzip,
        )
        .unwrap();

        decoder.mmap(2000, 100).unwrap();
        assert_eq!(decoder.mapped().unwrap().len(), 100);
        assert!(decoder.mmap(0, 10).is_err());
    }
}
