//! # streamio
//!
//! A unified stream I/O library: files, in-memory buffers, compressed
//! streams, and archive entries, all behind one polymorphic [`Stream`]
//! interface with a fixed, inspectable capability set.
//!
//! ## Quick Start
//!
//! ### Reading and writing a file stream
//!
//! ```rust,no_run
//! use streamio::{Result, Stream};
//! use streamio::backend::FileStream;
//! use streamio::stream::OpenMode;
//!
//! fn main() -> Result<()> {
//!     let mut out = FileStream::open(
//!         "data.bin",
//!         OpenMode::WRITE | OpenMode::CREATE | OpenMode::TRUNCATE,
//!     )?;
//!     out.write(b"hello")?;
//!     out.close()?;
//!
//!     let mut back = FileStream::open("data.bin", OpenMode::READ)?;
//!     let mut buf = [0u8; 16];
//!     let n = back.read(&mut buf)?;
//!     assert_eq!(&buf[..n], b"hello");
//!     Ok(())
//! }
//! ```
//!
//! ### Compressing through a memory stream
//!
//! ```rust,no_run
//! use streamio::{Result, Stream};
//! use streamio::backend::MemoryStream;
//! use streamio::codec::CompressionKind;
//! use streamio::codec::stream::{CompressionEncoderOptions, CompressionEncoderStream};
//! use streamio::stream::Owning;
//!
//! fn main() -> Result<()> {
//!     let sink = MemoryStream::new();
//!     let mut encoder = CompressionEncoderStream::new(
//!         Owning::Owned(Box::new(sink)),
//!         CompressionKind::Gzip,
//!         &CompressionEncoderOptions::default(),
//!     )?;
//!     encoder.write(b"hello, compressed world")?;
//!     encoder.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `gzip` | Yes | Gzip compression via `flate2` |
//! | `bzip2` | Yes | BZip2 compression via the `bzip2` crate |
//! | `xz` | Yes | XZ/LZMA2 compression via `xz2` |
//! | `zstd` | Yes | Zstandard compression via the `zstd` crate |
//! | `archive` | Yes | Tar and Zip archive reading and writing |
//! | `mmap` | Yes | Native OS memory mapping for file streams, via `memmap2` |
//! | `cli` | No | `streamio` command-line inspection tool |
//!
//! To create a minimal build, disable default features:
//!
//! ```toml
//! [dependencies]
//! streamio = { version = "0.1", default-features = false, features = ["gzip"] }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error`] is a flat, matchable
//! taxonomy of failure kinds rather than a grab-bag of OS error codes:
//!
//! ```rust,no_run
//! use streamio::{Error, Result};
//! use streamio::backend::FileStream;
//! use streamio::stream::OpenMode;
//!
//! fn open(path: &str) -> Result<()> {
//!     match FileStream::open(path, OpenMode::READ) {
//!         Ok(_) => Ok(()),
//!         Err(Error::NotFound(p)) => {
//!             eprintln!("no such file: {p}");
//!             Err(Error::NotFound(p))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! ## Concurrency
//!
//! This crate is synchronous and single-threaded by design: no operation
//! suspends, there is no internal thread pool, and `Stream` intentionally
//! does not require `Send`/`Sync`. A stream instance belongs to exactly one
//! thread at a time; distinct streams over the same file may still be used
//! from distinct threads.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive;
pub mod archive_path;
pub mod backend;
pub mod capability;
pub mod codec;
pub mod error;
pub mod features;
pub mod io_ext;
pub mod magic;
pub mod stream;
pub mod walker;

pub use archive_path::ArchivePath;
pub use capability::Capability;
pub use error::{Error, Result};
pub use features::FeatureSet;
pub use stream::{OpenMode, Owning, SeekWhence, Stream};

pub use backend::{FileStream, MemoryStream};

pub use archive::{ArchiveEntryMeta, ArchiveFormat, ArchiveReader, ArchiveWriter};

pub use walker::{WalkEntry, WalkFlags, walk};
