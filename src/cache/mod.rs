//! Time-bounded memoization for hot-path lookups
//!
//! Key features:
//! - Fixed TTL window per entry, measured from when the lookup resolved
//! - Request coalescing: concurrent misses for one key share a single lookup
//! - Failures are never memoized; the next call retries
//! - No size bound: entries self-expire, `cleanup_stale` prunes on demand

mod ttl;

pub use ttl::{CacheStats, DEFAULT_TTL, TtlCache};
