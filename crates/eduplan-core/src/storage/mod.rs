//! # Storage Module
//!
//! Disk-backed storage for the planner.

pub mod redb_store;

pub use redb_store::RedbStore;
