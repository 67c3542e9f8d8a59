//! In-memory render job store.
//!
//! This crate provides:
//! - The job registry shared by the API and the worker
//! - Monotonic, lifecycle-checked updates
//! - FIFO listing of queued jobs
//! - Age-based eviction

pub mod error;
pub mod store;
pub mod update;

pub use error::{StoreError, StoreResult};
pub use store::{JobStore, QueueCounts};
pub use update::{JobUpdate, UpdateOutcome};
