//! pail - HTTP gateway for S3-compatible object stores.
//!
//! This crate provides a small REST surface for bucket and object operations,
//! forwarding each call to an object store and translating its failures into
//! HTTP status codes. The same operations can optionally be exposed as tools
//! over JSON-RPC.

pub mod api;
pub mod config;
pub mod mcp;
pub mod storage;

pub use api::{ApiConfig, ApiError, AppState, Operation, router};
pub use config::{Config, StorageConfig, StorageOverrides, ToolTransport, ToolTransportConfig};
pub use storage::{MemoryStorage, ObjectEntry, S3Storage, Storage, StorageError};
