//! Unified traversal over filesystem trees, archives, and compressed
//! members.
//!
//! Filesystem recursion is delegated to [`walkdir`], the same crate and
//! the same non-following-symlinks-by-default posture as the plain
//! directory-flattening helper this module's logic is descended from.
//! Archive expansion and transparent decompression are layered on top.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use walkdir::WalkDir;

use crate::archive::{self, ArchiveReader};
use crate::backend::FileStream;
use crate::codec::stream::CompressionDecoderStream;
use crate::error::{Error, Result};
use crate::magic;
use crate::stream::{OpenMode, Owning, Stream};

bitflags! {
    /// Behaviour flags for [`walk`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WalkFlags: u32 {
        /// Descend into subdirectories. Without this, only the root itself
        /// (file or directory) is visited.
        const RECURSE_DIRS = 1 << 0;
        /// Treat a leaf recognized as an archive container as a source of
        /// further entries instead of (or in addition to) a plain file.
        const EXPAND_ARCHIVES = 1 << 1;
        /// Transparently wrap leaves or archive entries that start with a
        /// compression magic with the matching decoder.
        const DECOMPRESS = 1 << 2;
        /// Dereference symlinks during filesystem traversal.
        const FOLLOW_SYMLINKS = 1 << 3;
        /// Invoke the callback only for non-directory entries.
        const FILTER_FILES = 1 << 4;
        /// Invoke the callback only for directory entries.
        const FILTER_DIRS = 1 << 5;
    }
}

/// One entry produced by [`walk`]: a filesystem file, a filesystem
/// directory, or a member of an expanded archive.
pub struct WalkEntry {
    path: PathBuf,
    archive_entry_path: Option<String>,
    is_dir: bool,
    is_archive_entry: bool,
    depth: usize,
    stream: Option<Box<dyn Stream>>,
}

impl WalkEntry {
    /// The filesystem path. For archive entries, this is the path of the
    /// container file, not the member — use
    /// [`WalkEntry::archive_entry_path`] for the member's own path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The member path within an archive, when this entry came from one.
    pub fn archive_entry_path(&self) -> Option<&str> {
        self.archive_entry_path.as_deref()
    }

    /// Whether this entry is a directory (a filesystem directory, or an
    /// archive entry whose metadata marks it as one).
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Whether this entry came from expanding an archive rather than from
    /// direct filesystem traversal.
    pub fn is_archive_entry(&self) -> bool {
        self.is_archive_entry
    }

    /// Recursion depth, counting the walk root as `0` and one level per
    /// directory descent or archive expansion.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The entry's content stream, when it has one (directories do not).
    /// Owned by the walker and closed before the next entry is produced.
    pub fn stream(&mut self) -> Option<&mut dyn Stream> {
        self.stream.as_deref_mut()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut s) = self.stream.take() {
            s.close()?;
        }
        Ok(())
    }
}

/// Walks `root`, invoking `callback` once per entry selected by `flags`.
///
/// `callback` returns `0` to continue or any other value to stop; that
/// value is propagated as `walk`'s own return value. The stream attached to
/// each entry is closed immediately after the callback returns, whether or
/// not the callback examined it.
pub fn walk(
    root: &Path,
    flags: WalkFlags,
    callback: &mut dyn FnMut(&mut WalkEntry) -> i32,
) -> Result<i32> {
    let mut walker = WalkDir::new(root).follow_links(flags.contains(WalkFlags::FOLLOW_SYMLINKS));
    if !flags.contains(WalkFlags::RECURSE_DIRS) {
        walker = walker.max_depth(0);
    }

    for entry in walker {
        let entry = entry.map_err(|e| {
            e.io_error()
                .map(|io| Error::Io(std::io::Error::new(io.kind(), io.to_string())))
                .unwrap_or_else(|| Error::Io(std::io::Error::other(e.to_string())))
        })?;
        let depth = entry.depth();
        let is_dir = entry.file_type().is_dir();
        let path = entry.into_path();

        if is_dir {
            if flags.contains(WalkFlags::FILTER_FILES) {
                continue;
            }
            let mut we = WalkEntry {
                path,
                archive_entry_path: None,
                is_dir: true,
                is_archive_entry: false,
                depth,
                stream: None,
            };
            let rc = callback(&mut we);
            we.close()?;
            if rc != 0 {
                return Ok(rc);
            }
            continue;
        }

        if flags.contains(WalkFlags::EXPAND_ARCHIVES) {
            if let Some(mut expanded) = try_expand_archive(&path, depth, flags)? {
                for we in expanded.iter_mut() {
                    if flags.contains(WalkFlags::FILTER_DIRS) && !we.is_dir {
                        continue;
                    }
                    if flags.contains(WalkFlags::FILTER_FILES) && we.is_dir {
                        continue;
                    }
                    let rc = callback(we);
                    we.close()?;
                    if rc != 0 {
                        return Ok(rc);
                    }
                }
                continue;
            }
        }

        if flags.contains(WalkFlags::FILTER_DIRS) {
            continue;
        }
        let mut we = open_leaf(path, depth, flags.contains(WalkFlags::DECOMPRESS))?;
        let rc = callback(&mut we);
        we.close()?;
        if rc != 0 {
            return Ok(rc);
        }
    }
    Ok(0)
}

/// Opens a plain (non-archive) leaf file, wrapping it with a decompressor
/// when `decompress` is set and the file starts with a recognized magic.
fn open_leaf(path: PathBuf, depth: usize, decompress: bool) -> Result<WalkEntry> {
    let mut file = FileStream::open(&path, OpenMode::READ)?;
    let stream: Box<dyn Stream> = if decompress {
        match magic::detect(&mut file)? {
            Some(kind) => Box::new(CompressionDecoderStream::new(
                Owning::Owned(Box::new(file)),
                kind,
            )?),
            None => Box::new(file),
        }
    } else {
        Box::new(file)
    };
    Ok(WalkEntry {
        path,
        archive_entry_path: None,
        is_dir: false,
        is_archive_entry: false,
        depth,
        stream: Some(stream),
    })
}

/// Attempts to open `path` as an archive (after transparent decompression
/// of the whole file, if `DECOMPRESS` is set and it looks compressed) and
/// eagerly builds one [`WalkEntry`] per member. Returns `Ok(None)` when the
/// file isn't recognized as an archive this crate can read — a normal,
/// expected outcome, not a logged failure.
fn try_expand_archive(
    path: &Path,
    depth: usize,
    flags: WalkFlags,
) -> Result<Option<Vec<WalkEntry>>> {
    let mut file = FileStream::open(path, OpenMode::READ)?;
    let outer: Box<dyn Stream> = if flags.contains(WalkFlags::DECOMPRESS) {
        match magic::detect(&mut file)? {
            Some(kind) => Box::new(CompressionDecoderStream::new(
                Owning::Owned(Box::new(file)),
                kind,
            )?),
            None => Box::new(file),
        }
    } else {
        Box::new(file)
    };

    let mut reader = match archive::open_reader(outer) {
        Ok(reader) => reader,
        Err(_) => return Ok(None),
    };

    let mut out = Vec::new();
    while let Some(meta) = reader.next_entry()? {
        let mut stream: Box<dyn Stream> = reader.entry_stream()?;
        if flags.contains(WalkFlags::DECOMPRESS) {
            if let Some(kind) = magic::detect(stream.as_mut())? {
                stream = Box::new(CompressionDecoderStream::new(
                    Owning::Owned(stream),
                    kind,
                )?);
            }
        }
        out.push(WalkEntry {
            path: path.to_path_buf(),
            archive_entry_path: Some(meta.path.as_str().to_string()),
            is_dir: meta.is_dir,
            is_archive_entry: true,
            depth: depth + 1,
            stream: Some(stream),
        });
    }
    Ok(Some(out))
}
