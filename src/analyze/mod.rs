// src/analyze/mod.rs
//! Oracle-backed analysis: clustering related articles and summarizing each cluster.

pub mod ai_adapter;
pub mod extract;
pub mod grouping;
pub mod summarize;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{build_oracle, ChatMessage, DynOracle, Oracle, ScriptedOracle};
pub use crate::analyze::grouping::ArticleGrouper;
pub use crate::analyze::summarize::ArticleSummarizer;
