//! The set of optional capabilities compiled into this build.
//!
//! This is the only process-wide state in the crate, and it is immutable
//! after the first call: a bitmap over `cfg!` feature flags, not a `static`
//! anyone can mutate.

use bitflags::bitflags;

bitflags! {
    /// Which optional codecs and archive formats this build was compiled
    /// with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureSet: u32 {
        /// `gzip` feature.
        const GZIP = 1 << 0;
        /// `bzip2` feature.
        const BZIP2 = 1 << 1;
        /// `xz` feature.
        const XZ = 1 << 2;
        /// `zstd` feature.
        const ZSTD = 1 << 3;
        /// `archive` feature (tar/zip reading and writing).
        const ARCHIVE = 1 << 4;
        /// `mmap` feature (native OS memory mapping for file streams).
        const MMAP = 1 << 5;
    }
}

/// Returns the feature set this build was compiled with.
///
/// Computed fresh from `cfg!` on every call, which is cheap and avoids
/// introducing mutable global state for a value that can never change once
/// the binary is built.
pub fn supported() -> FeatureSet {
    let mut set = FeatureSet::empty();
    if cfg!(feature = "gzip") {
        set |= FeatureSet::GZIP;
    }
    if cfg!(feature = "bzip2") {
        set |= FeatureSet::BZIP2;
    }
    if cfg!(feature = "xz") {
        set |= FeatureSet::XZ;
    }
    if cfg!(feature = "zstd") {
        set |= FeatureSet::ZSTD;
    }
    if cfg!(feature = "archive") {
        set |= FeatureSet::ARCHIVE;
    }
    if cfg!(feature = "mmap") {
        set |= FeatureSet::MMAP;
    }
    set
}
