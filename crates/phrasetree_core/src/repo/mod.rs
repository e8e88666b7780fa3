//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the `ItemStore` capability the engine calls after mutations.
//! - Keep SQL details out of the engine and the config manager.
//!
//! # Invariants
//! - Stores never validate bindings; uniqueness is the engine's job.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod item_repo;
