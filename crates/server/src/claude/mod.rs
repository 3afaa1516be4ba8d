//! Claude integration for checkout analysis.
//!
//! [`ClaudeClient`] wraps the Anthropic Messages API (non-streaming);
//! [`analysis`] turns a store URL and persona mix into a prompt and parses
//! the model's JSON answer into a [`ghost_cro_core::TestResult`].

pub mod analysis;
mod client;
mod error;
pub mod types;

pub use analysis::{AnalysisRequest, analyze_store};
pub use client::ClaudeClient;
pub use error::ClaudeError;
