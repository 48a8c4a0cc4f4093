//! Recording input model
//!
//! The validated step sequence and its container, as produced by the
//! upstream browser recorder.

pub mod session;
pub mod types;

pub use session::{ConsoleLogEntry, Recording, RecordingMetadata, CURRENT_FORMAT_VERSION};
pub use types::{
    parse_chain_id, ClickStep, InputStep, NavigationStep, ScrollStep, Step, StepKind,
    WalletCallStep,
};
