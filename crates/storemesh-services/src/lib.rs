//! Service layer: cache-aside orchestration in front of the store
//! repository.
//!
//! Reads go through the primary (local) cache tier and populate it from the
//! repository on a miss. Every mutation writes through the repository
//! first, then clears both tiers in full, then emits a lifecycle event.
//! Full-tier clearing trades cached bystanders for trivially guaranteed
//! correctness: no stale sibling key can survive a mutation that changes
//! ordering or membership.

pub mod error;
pub mod keys;
pub mod stores;

pub use error::StoresError;
pub use keys::CacheKeys;
pub use stores::StoreService;
