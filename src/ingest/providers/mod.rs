// src/ingest/providers/mod.rs
pub mod event_registry;
pub mod fixture;

pub use event_registry::EventRegistryFetcher;
pub use fixture::FixtureFetcher;
