//! The fixed capability set every stream advertises.

use bitflags::bitflags;

bitflags! {
    /// Abilities a stream declares at construction time.
    ///
    /// Capability bits are a contract, not a hint: an operation gated by a bit
    /// must succeed at least once whenever the bit is set, and must fail with
    /// the matching [`crate::Error`] variant whenever it is clear. Bits never
    /// change after construction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capability: u32 {
        /// `read` is implemented and permitted.
        const READ = 1 << 0;
        /// `write` is implemented and permitted.
        const WRITE = 1 << 1;
        /// `seek(_, SeekWhence::Start)` is supported.
        const SEEK_ABSOLUTE = 1 << 2;
        /// `seek(_, SeekWhence::Current)` is supported.
        const SEEK_RELATIVE = 1 << 3;
        /// `seek(_, SeekWhence::End)` is supported.
        const SEEK_FROM_END = 1 << 4;
        /// `tell` reports a meaningful position.
        const TELL = 1 << 5;
        /// `size` reports a meaningful total length.
        const SIZE = 1 << 6;
        /// `mmap` is backed by a real OS mapping.
        const NATIVE_MMAP = 1 << 7;
        /// `mmap` is backed by an owned, materialized buffer.
        const EMULATED_MMAP = 1 << 8;
        /// `truncate`-like resizing is supported (currently file streams only).
        const TRUNCATE = 1 << 9;
        /// `flush` performs meaningful work.
        const FLUSH = 1 << 10;
        /// The stream's bytes are themselves compressed (informational; set by
        /// compression-adapter-aware callers, not computed by the stream itself).
        const IS_COMPRESSED = 1 << 11;
    }
}

impl Capability {
    /// Either mmap capability is set.
    pub fn can_mmap(self) -> bool {
        self.intersects(Capability::NATIVE_MMAP | Capability::EMULATED_MMAP)
    }

    /// Any seek capability is set.
    pub fn can_seek(self) -> bool {
        self.intersects(
            Capability::SEEK_ABSOLUTE | Capability::SEEK_RELATIVE | Capability::SEEK_FROM_END,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_mmap_checks_either_bit() {
        assert!(!Capability::READ.can_mmap());
        assert!(Capability::NATIVE_MMAP.can_mmap());
        assert!(Capability::EMULATED_MMAP.can_mmap());
    }

    #[test]
    fn can_seek_checks_any_seek_bit() {
        assert!(!Capability::READ.can_seek());
        assert!(Capability::SEEK_ABSOLUTE.can_seek());
        assert!(Capability::SEEK_FROM_END.can_seek());
    }
}
