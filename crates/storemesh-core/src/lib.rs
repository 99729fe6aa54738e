//! Core types for storemesh: the `Store` configuration entity and the
//! lifecycle event system used to notify the rest of the application about
//! store mutations.
//!
//! This crate deliberately carries no I/O. Persistence lives behind the
//! `StoreRepository` trait in `storemesh-storage`; caching lives in
//! `storemesh-cache`.

pub mod events;
pub mod store;

pub use events::{EventBroadcaster, StoreEvent, StoreEventKind};
pub use store::Store;
