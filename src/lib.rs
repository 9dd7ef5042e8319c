// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod article;
pub mod cache;
pub mod config;
pub mod digest;
pub mod history;
pub mod pipeline;
pub mod store;
pub mod telemetry;

// Fetch + oracle-backed analysis + delivery
pub mod analyze;
pub mod ingest;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::create_router;
pub use crate::article::{Article, Cluster};
pub use crate::digest::{NewsPayload, SummaryArtifact};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::telemetry::init_tracing;
