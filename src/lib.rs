//! # dApp Analyzer
//!
//! A recording analysis and intent synthesis engine: it ingests a raw,
//! timestamped log of a user's recorded browser interaction with a
//! decentralized application — clicks, text inputs, page navigations,
//! wallet-provider calls, scroll events — and turns it into a structured,
//! semantically-labeled plan of intent ("connect wallet", "switch network",
//! "fill form with these final values", "confirm transaction").
//!
//! ## Quick Start
//!
//! ```
//! use dapp_analyzer::{Recording, RecordingAnalyzer, synthesize_intent_steps};
//! use dapp_analyzer::recording::types::{ClickStep, Step, WalletCallStep};
//!
//! let mut recording = Recording::new("connect", "https://app.example.org");
//! recording.push_step(Step::click(0, ClickStep {
//!     selector: "button.connect".to_string(),
//!     text: Some("Connect".to_string()),
//!     ..Default::default()
//! }));
//! recording.push_step(Step::wallet_call(500, WalletCallStep {
//!     method: "eth_requestAccounts".to_string(),
//!     ..Default::default()
//! }));
//!
//! let analysis = RecordingAnalyzer::new().analyze(&recording);
//! let plan = synthesize_intent_steps(&analysis);
//!
//! // Leading navigate, the connect step, trailing verification.
//! assert_eq!(plan.len(), 3);
//! ```
//!
//! ## Architecture
//!
//! - [`recording`]: The validated step sequence and its container
//! - [`analysis`]: Pattern detection, chain/wallet extraction, classification
//! - [`synthesis`]: Intent-step synthesis (merge, dedup, order, re-index)
//! - [`clarification`]: Advisory ambiguity questions for human review
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Recording │──▶│ Flow Patterns │──▶│ Classifiers  │──▶│ Intent Steps │
//! │  (steps)  │   │ (7 detectors) │   │ + Extractors │   │    (plan)    │
//! └───────────┘   └───────────────┘   └──────────────┘   └──────────────┘
//!                                             │
//!                                             ▼
//!                                  ┌─────────────────────┐
//!                                  │ Clarification Qs    │
//!                                  │ (human review)      │
//!                                  └─────────────────────┘
//! ```
//!
//! The whole pipeline is synchronous, allocation-local and side-effect-free:
//! analyzing the same recording twice yields bit-identical output, and
//! independent recordings may be analyzed concurrently without coordination.

pub mod analysis;
pub mod app;
pub mod clarification;
pub mod recording;
pub mod synthesis;

// Re-export commonly used types
pub use analysis::{AnalysisResult, RecordingAnalyzer};
pub use clarification::{ClarificationDetector, ClarificationQuestion};
pub use recording::{Recording, Step};
pub use synthesis::{synthesize_intent_steps, IntentStep, IntentType};

/// Result type alias for the analyzer
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the analyzer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
