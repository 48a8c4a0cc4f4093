//! Intent synthesis
//!
//! Turns an analysis result into the ordered intent-step plan consumed by
//! downstream code generation and agent execution.

pub mod intent;

pub use intent::{synthesize_intent_steps, IntentStep, IntentType};
