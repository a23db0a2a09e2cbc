//! Blooms: the knowledge entries the wake ritual walks through
//!
//! This module provides:
//! - The bloom record and candidate filter
//! - The store contract the ritual engine depends on
//! - A JSON file store implementing it

pub mod models;
pub mod storage;
pub mod store;

pub use models::*;
pub use storage::{BloomStorage, StoreError};
pub use store::KnowledgeStore;
