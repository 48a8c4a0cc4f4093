//! Clarification detection
//!
//! Advisory questions raised for human review when automatic inference is
//! unsafe; consumed by the external review workflow.

pub mod detector;

pub use detector::{ClarificationDetector, ClarificationQuestion, QuestionCategory};
