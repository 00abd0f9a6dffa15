//! Project history persistence.
//!
//! The pipeline only needs a save/load capability; where snapshots live is up
//! to the [`HistoryStore`] implementation.

pub mod history;

pub use history::{FileHistoryStore, HistoryStore, MemoryHistoryStore, StoreError, StoreResult};
