//! Error types for stream, codec, archive, and walker operations.
//!
//! All fallible operations in this crate return [`Result<T>`]. There is a single
//! flat [`Error`] enum rather than one per subsystem, because most call sites
//! (especially inside the [`crate::walker`]) cross subsystem boundaries freely
//! and a layered error hierarchy would just mean wrapping at every step.
//!
//! # Examples
//!
//! ```rust,no_run
//! use streamio::{Error, Result, backend::FileStream, stream::OpenMode, Stream};
//!
//! fn read_header(path: &str) -> Result<[u8; 4]> {
//!     let mut file = FileStream::open(path, OpenMode::READ)?;
//!     let mut buf = [0u8; 4];
//!     match file.read(&mut buf) {
//!         Ok(4) => Ok(buf),
//!         Ok(_) => Err(Error::UnexpectedEof),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::fmt;

/// The crate-wide error type.
///
/// Variants correspond to the taxonomy of failure kinds a stream, codec,
/// archive, or walker operation can report; there is deliberately no
/// "last error" side channel to inspect — every fallible call returns its
/// own `Result`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested path or entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operating system denied access to the requested resource.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An entry that was required to be new already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A caller-supplied argument was invalid for the operation attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stream does not have the read capability.
    #[error("stream is not readable")]
    NotReadable,

    /// The stream does not have the write capability.
    #[error("stream is not writable")]
    NotWritable,

    /// The stream does not have the requested seek capability.
    #[error("stream is not seekable")]
    NotSeekable,

    /// A seek or mmap request fell outside the valid range for the stream.
    #[error("position or length out of range")]
    OutOfRange,

    /// A memory allocation (buffer growth, emulated mmap) failed.
    #[error("out of memory")]
    OutOfMemory,

    /// A fixed-size or disk-backed sink has no room for more data.
    #[error("no space left")]
    NoSpace,

    /// The operation or format is recognized but intentionally not implemented.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A compression codec failed to decode its input.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A compression codec failed to encode its input.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// An archive container was malformed or an entry violated its declared metadata.
    #[error("archive format error: {0}")]
    ArchiveFormat(String),

    /// Input ended before the amount of data required by the operation was available.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A lower-level I/O failure not otherwise classified above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies a [`std::io::Error`] encountered while opening a path,
    /// refining it into [`Error::NotFound`]/[`Error::PermissionDenied`]/
    /// [`Error::AlreadyExists`] where the OS error kind allows, falling back
    /// to [`Error::Io`] otherwise.
    pub fn from_open_io(err: std::io::Error, path: impl fmt::Display) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_string()),
            std::io::ErrorKind::AlreadyExists => Error::AlreadyExists(path.to_string()),
            _ => Error::Io(err),
        }
    }
}

/// The crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
