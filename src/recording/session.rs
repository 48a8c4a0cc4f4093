//! Recording Data Structures
//!
//! Defines the serialization format for captured dApp interaction recordings.

use super::types::{ClickStep, InputStep, Step, StepKind, WalletCallStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current recording format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

fn default_format_version() -> String {
    CURRENT_FORMAT_VERSION.to_string()
}

/// Recording metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingMetadata {
    /// Unique recording ID
    pub id: Uuid,
    /// Recording name
    pub name: String,
    /// Capture start time
    pub recorded_at: DateTime<Utc>,
    /// Total step count
    pub step_count: usize,
    /// Recording duration in milliseconds
    pub duration_ms: u64,
    /// Version of the recording format
    #[serde(default = "default_format_version")]
    pub format_version: String,
}

impl RecordingMetadata {
    /// Create new metadata for a recording
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            recorded_at: Utc::now(),
            step_count: 0,
            duration_ms: 0,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }

    /// Finalize the recording with step count and duration
    pub fn finalize(&mut self, step_count: usize, duration_ms: u64) {
        self.step_count = step_count;
        self.duration_ms = duration_ms;
    }
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            recorded_at: Utc::now(),
            step_count: 0,
            duration_ms: 0,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

/// A console log line captured alongside the recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleLogEntry {
    /// Log level (log, warn, error)
    #[serde(default)]
    pub level: String,
    /// Log message
    #[serde(default)]
    pub message: String,
    /// Milliseconds since recording start
    #[serde(default)]
    pub timestamp: u64,
}

/// A complete recording of a user's interaction with a dApp.
///
/// The step sequence is validated upstream; the analysis pipeline treats it
/// as read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Recording metadata
    #[serde(default)]
    pub metadata: RecordingMetadata,
    /// URL the recording started on
    pub start_url: String,
    /// Whether the wallet was already connected when recording began
    #[serde(default)]
    pub wallet_connected: bool,
    /// Connected wallet address, when known at recording start
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// The ordered step sequence
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Console log lines captured during the recording
    #[serde(default)]
    pub console_logs: Vec<ConsoleLogEntry>,
}

impl Recording {
    /// Create a new empty recording
    pub fn new(name: impl Into<String>, start_url: impl Into<String>) -> Self {
        Self {
            metadata: RecordingMetadata::new(name),
            start_url: start_url.into(),
            wallet_connected: false,
            wallet_address: None,
            steps: Vec::new(),
            console_logs: Vec::new(),
        }
    }

    /// Append a step to the sequence
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Finalize the recording
    pub fn finalize(&mut self, duration_ms: u64) {
        self.metadata.finalize(self.steps.len(), duration_ms);
    }

    /// Get the number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if recording is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps matching a filter, with their indices
    pub fn steps_where(
        &self,
        filter: impl Fn(&Step) -> bool,
    ) -> Vec<(usize, &Step)> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| filter(s))
            .collect()
    }

    /// Click steps with their indices
    pub fn click_steps(&self) -> Vec<(usize, &ClickStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_click().map(|c| (i, c)))
            .collect()
    }

    /// Input steps with their indices
    pub fn input_steps(&self) -> Vec<(usize, &InputStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_input().map(|inp| (i, inp)))
            .collect()
    }

    /// Wallet-provider calls with their indices
    pub fn wallet_calls(&self) -> Vec<(usize, &WalletCallStep)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_wallet_call().map(|c| (i, c)))
            .collect()
    }

    /// True when timestamps are monotonically non-decreasing
    pub fn timestamps_monotonic(&self) -> bool {
        self.steps
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }

    /// Save recording to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load recording from a file.
    ///
    /// Logs a warning if the recording was saved with an unknown format
    /// version, but still attempts to deserialize it (forward-compatible via
    /// `#[serde(default)]`).
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let recording: Recording = serde_json::from_str(&content)?;
        if recording.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                name = %recording.metadata.name,
                found = %recording.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Recording has different format version; some fields may use default values"
            );
        }
        Ok(recording)
    }
}

impl Default for Recording {
    fn default() -> Self {
        Self::new("untitled", "about:blank")
    }
}

/// Iterate wallet calls in a raw step slice, with indices.
///
/// The detectors work over bare step slices rather than the `Recording`
/// wrapper, so this mirror of [`Recording::wallet_calls`] lives here too.
pub fn wallet_calls(steps: &[Step]) -> impl Iterator<Item = (usize, &WalletCallStep)> {
    steps.iter().enumerate().filter_map(|(i, s)| {
        if let StepKind::WalletCall(call) = &s.kind {
            Some((i, call))
        } else {
            None
        }
    })
}
