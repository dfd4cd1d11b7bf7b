//! Bookgate response cache.
//!
//! Upstream responses are cached as serialized canonical JSON, keyed by
//! resource, normalized query and caller fingerprint, and served until their
//! TTL elapses. Concurrent misses for one key are collapsed by
//! [`SingleFlight`].
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 60
//! purge_interval_seconds = 300
//! ```

mod config;
mod flight;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use flight::SingleFlight;
pub use keys::{CacheKey, CacheKeyBuilder, token_fingerprint};
pub use store::{CacheEntry, DisabledStore, MemoryStore, ResponseStore, build_store};
