//! Repository abstraction for the store collection.
//!
//! The cache layer treats persistence as an external collaborator: anything
//! that can list, fetch, insert, update, and delete stores can sit behind
//! [`StoreRepository`]. A document-store backend plugs in here; the crate
//! ships an in-memory implementation used by tests and single-process
//! deployments.
//!
//! The repository is the single source of truth. Cache entries are derived
//! data, and no caller may interpret a cache miss as "store does not exist"
//! without confirming against this layer.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStoreRepository;
pub use traits::StoreRepository;
