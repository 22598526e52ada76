//! Storage abstraction and implementations for Goalpace.
//!
//! This crate provides a trait-based repository interface with a JSON file
//! implementation and an in-memory implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
