//! Form Draft Store
//!
//! The durable side of draft synchronization: a string key-value
//! [`DurableStore`] and the typed [`DraftCache`] that owns one
//! [`DraftRecord`](formdraft_model::DraftRecord) per page.
//!
//! # Architecture
//!
//! ```text
//! DraftCache ── key = namespace + page path ──> DurableStore (MemoryStore | FileStore)
//!     │
//!     └── prune(now, retention) sweeps every key under the namespace
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use formdraft_store::{DraftCache, MemoryStore};
//! use std::sync::Arc;
//!
//! let cache = DraftCache::new(Arc::new(MemoryStore::new()));
//! cache.store_record(&page, &record)?;
//! let loaded = cache.load(&page)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod sweep;

pub use cache::{DraftCache, DEFAULT_NAMESPACE};
pub use error::{CacheError, StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::DurableStore;
pub use sweep::{PruneReport, DEFAULT_RETENTION_SECS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the draft store
    pub use crate::cache::DraftCache;
    pub use crate::error::{CacheError, StoreError};
    pub use crate::file::FileStore;
    pub use crate::memory::MemoryStore;
    pub use crate::store::DurableStore;
    pub use crate::sweep::PruneReport;
}
