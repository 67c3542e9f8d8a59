//! Object storage for rendered outputs.
//!
//! This crate provides:
//! - The `ObjectStore` capability: store a file, get back a public URL
//! - Cloudflare R2 (S3 API) backend
//! - Local directory backend for development
//! - Backend selection from the environment

pub mod client;
pub mod config;
pub mod error;
pub mod local;
pub mod store;

pub use client::{R2Client, R2Config};
pub use config::{build_store, StorageBackend, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use store::{render_output_key, ObjectStore, VIDEO_CONTENT_TYPE};
