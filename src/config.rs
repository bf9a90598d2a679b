//! Reader configuration (§1.1): default page-size geometry the
//! [`PagedRangeReader`](crate::reader::PagedRangeReader) falls back to
//! when a caller's [`RangeOptions`](crate::record::RangeOptions) leaves
//! `target_bytes` at its zero ("use the default") sentinel.
//!
//! Mirrors the teacher's MDBX geometry constants (`kv/mod.rs`'s
//! `DEFAULT_PAGESIZE`/growth table), generalized from a fixed on-disk
//! page size to a per-`StreamingMode` target-bytes curve.

use once_cell::sync::Lazy;

use crate::record::StreamingMode;

/// Default `target_bytes` applied when the caller leaves it at `0`.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// First page size for `StreamingMode::Iterator`.
    pub iterator_initial_bytes: u32,
    /// Ceiling `StreamingMode::Iterator` grows to across successive pages.
    pub iterator_max_bytes: u32,
    pub small_bytes: u32,
    pub medium_bytes: u32,
    pub large_bytes: u32,
    /// Used for `Serial`/`WantAll`; `Exact` never consults this (§4.A).
    pub want_all_bytes: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            iterator_initial_bytes: 1 << 13, // 8 KiB
            iterator_max_bytes: 1 << 20,     // 1 MiB
            small_bytes: 1 << 13,
            medium_bytes: 1 << 17,
            large_bytes: 1 << 20,
            want_all_bytes: u32::MAX,
        }
    }
}

impl ReaderConfig {
    /// The default `target_bytes` for one page at a given `iteration`
    /// (1-based) under `mode`, when the caller didn't pin one.
    pub fn target_bytes_for(&self, mode: StreamingMode, iteration: u32) -> u32 {
        match mode {
            StreamingMode::Iterator => {
                let doublings = iteration.saturating_sub(1).min(16);
                let grown = self.iterator_initial_bytes.saturating_mul(1u32 << doublings);
                grown.min(self.iterator_max_bytes)
            }
            StreamingMode::Small => self.small_bytes,
            StreamingMode::Medium => self.medium_bytes,
            StreamingMode::Large => self.large_bytes,
            StreamingMode::Serial | StreamingMode::WantAll => self.want_all_bytes,
            StreamingMode::Exact => self.large_bytes,
        }
    }
}

/// Process-wide default, used by callers who construct a
/// [`crate::record::RangeOptions`] without an opinion on `target_bytes`.
pub static DEFAULT_READER_CONFIG: Lazy<ReaderConfig> = Lazy::new(ReaderConfig::default);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterator_mode_grows_then_caps() {
        let cfg = ReaderConfig::default();
        let first = cfg.target_bytes_for(StreamingMode::Iterator, 1);
        let second = cfg.target_bytes_for(StreamingMode::Iterator, 2);
        assert!(second > first);
        let capped = cfg.target_bytes_for(StreamingMode::Iterator, 100);
        assert_eq!(capped, cfg.iterator_max_bytes);
    }

    #[test]
    fn want_all_has_no_cap() {
        let cfg = ReaderConfig::default();
        assert_eq!(cfg.target_bytes_for(StreamingMode::WantAll, 1), u32::MAX);
    }
}
