//! Render worker.
//!
//! This crate provides:
//! - The render pipeline (fetch, cut, concat, publish, cleanup)
//! - The single-slot worker loop that drains the job store in FIFO order
//! - The reaper that evicts old job records

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod reaper;
pub mod scratch;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{RenderWorker, WorkerHandle};
pub use logging::JobLogger;
pub use pipeline::RenderPipeline;
pub use reaper::spawn_reaper;
