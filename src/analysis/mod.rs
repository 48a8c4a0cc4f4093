//! Recording Analysis
//!
//! Pattern detection, chain/wallet extraction, and classification, composed
//! into a single pure analysis pass over a recording.

pub mod classification;
pub mod extractors;
pub mod patterns;

pub use classification::{classify_test_type, detect_connection_pattern, ConnectionPattern, TestType};
pub use extractors::{extract_chain_id, extract_wallet_name};
pub use patterns::{detect_all, FlowPattern, PatternType};

use crate::recording::session::Recording;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Chain id considered the default environment (1 = mainnet); anything
    /// else produces a network setup hint
    pub default_chain_id: u64,
    /// Patterns below this confidence are dropped from the result
    pub min_pattern_confidence: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_chain_id: 1,
            min_pattern_confidence: 0.0,
        }
    }
}

/// The aggregate output of one analysis call.
///
/// Created once per call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analyzed recording
    pub recording: Recording,
    /// Detected flow patterns, sorted by start index
    pub patterns: Vec<FlowPattern>,
    /// Detected chain id, when any wallet call carried one
    pub chain_id: Option<u64>,
    /// Detected wallet-provider name, when captured
    pub wallet_name: Option<String>,
    /// Suggested import/setup hints for downstream code generation
    pub setup_hints: Vec<String>,
    /// Human-readable informational warnings
    pub warnings: Vec<String>,
    /// Pass-through: wallet connected at recording start
    pub wallet_connected: bool,
    /// Pass-through: wallet address at recording start
    pub wallet_address: Option<String>,
    /// Connection vs. flow classification
    pub test_type: TestType,
    /// Wallet-connection UI library tag
    pub connection_pattern: ConnectionPattern,
}

/// Runs the full analysis pass over a recording.
///
/// The analyzer holds only configuration; every call allocates its own
/// scratch state, so one analyzer may be shared across threads and invoked
/// concurrently for independent recordings.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnalyzer {
    config: AnalyzerConfig,
}

impl RecordingAnalyzer {
    /// Create an analyzer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze a recording into patterns, classifications, hints and
    /// warnings. Heuristic misses are silent outcomes, never errors.
    pub fn analyze(&self, recording: &Recording) -> AnalysisResult {
        let steps = &recording.steps;
        debug!(steps = steps.len(), name = %recording.metadata.name, "analyzing recording");

        let mut patterns = detect_all(steps);
        if self.config.min_pattern_confidence > 0.0 {
            patterns.retain(|p| p.confidence >= self.config.min_pattern_confidence);
        }

        let chain_id = extract_chain_id(steps);
        let wallet_name = extract_wallet_name(steps);
        let test_type = classify_test_type(steps, recording.wallet_connected);
        let connection_pattern = detect_connection_pattern(steps, &patterns);

        let mut warnings = Vec::new();
        let has_wallet_calls = steps.iter().any(|s| s.is_wallet_call());
        if steps.is_empty() {
            warnings.push("recording contains no steps".to_string());
        }
        if !has_wallet_calls && !steps.is_empty() {
            warnings.push("no wallet-provider calls captured".to_string());
        }
        if has_wallet_calls && chain_id.is_none() {
            warnings.push("chain id absent, defaulting to unknown".to_string());
        }
        if has_wallet_calls && wallet_name.is_none() {
            warnings.push("wallet provider identity not captured".to_string());
        }

        let mut setup_hints = Vec::new();
        if let Some(chain) = chain_id {
            if chain != self.config.default_chain_id {
                setup_hints.push(format!("configure test network for chain id {}", chain));
            }
        }
        if let Some(name) = &wallet_name {
            setup_hints.push(format!("install a {} provider mock before the test", name));
        }
        match connection_pattern {
            ConnectionPattern::Privy => {
                setup_hints.push("target the Privy connection modal in connect steps".to_string())
            }
            ConnectionPattern::RainbowKit => setup_hints
                .push("target the RainbowKit connect button (rk- identifiers)".to_string()),
            ConnectionPattern::Web3Modal => setup_hints
                .push("target the Web3Modal dialog (w3m- identifiers)".to_string()),
            ConnectionPattern::Custom | ConnectionPattern::Unknown => {}
        }

        debug!(
            patterns = patterns.len(),
            test_type = test_type.as_str(),
            connection = connection_pattern.as_str(),
            "analysis complete"
        );

        AnalysisResult {
            recording: recording.clone(),
            patterns,
            chain_id,
            wallet_name,
            setup_hints,
            warnings,
            wallet_connected: recording.wallet_connected,
            wallet_address: recording.wallet_address.clone(),
            test_type,
            connection_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::types::{ClickStep, Step, WalletCallStep};

    fn connect_recording() -> Recording {
        let mut recording = Recording::new("connect", "https://app.example.org");
        recording.push_step(Step::click(
            0,
            ClickStep {
                selector: "button.connect".to_string(),
                text: Some("Connect Wallet".to_string()),
                ..Default::default()
            },
        ));
        recording.push_step(Step::wallet_call(
            500,
            WalletCallStep {
                method: "eth_requestAccounts".to_string(),
                wallet: Some("metamask".to_string()),
                ..Default::default()
            },
        ));
        recording.push_step(Step::wallet_call(
            600,
            WalletCallStep {
                method: "eth_chainId".to_string(),
                result: Some(serde_json::json!("0x2105")),
                ..Default::default()
            },
        ));
        recording
    }

    #[test]
    fn test_analyze_connect_recording() {
        let analyzer = RecordingAnalyzer::new();
        let result = analyzer.analyze(&connect_recording());

        assert_eq!(result.test_type, TestType::Connection);
        assert_eq!(result.connection_pattern, ConnectionPattern::Custom);
        assert_eq!(result.chain_id, Some(8453));
        assert_eq!(result.wallet_name, Some("metamask".to_string()));
        assert!(result
            .patterns
            .iter()
            .any(|p| p.pattern_type == PatternType::WalletConnect));
        // Base is not the default chain, so a network hint is emitted.
        assert!(result
            .setup_hints
            .iter()
            .any(|h| h.contains("chain id 8453")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let analyzer = RecordingAnalyzer::new();
        let recording = connect_recording();
        let a = analyzer.analyze(&recording);
        let b = analyzer.analyze(&recording);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_analyze_empty_recording_warns() {
        let analyzer = RecordingAnalyzer::new();
        let recording = Recording::new("empty", "https://app.example.org");
        let result = analyzer.analyze(&recording);
        assert!(result.patterns.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("no steps")));
        assert_eq!(result.test_type, TestType::Flow);
    }

    #[test]
    fn test_analyze_missing_chain_warns() {
        let analyzer = RecordingAnalyzer::new();
        let mut recording = Recording::new("nochain", "https://app.example.org");
        recording.push_step(Step::wallet_call(
            0,
            WalletCallStep {
                method: "eth_requestAccounts".to_string(),
                ..Default::default()
            },
        ));
        let result = analyzer.analyze(&recording);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("chain id absent")));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("identity not captured")));
    }

    #[test]
    fn test_min_confidence_filters_patterns() {
        let analyzer = RecordingAnalyzer::with_config(AnalyzerConfig {
            default_chain_id: 1,
            min_pattern_confidence: 0.75,
        });
        let mut recording = Recording::new("forms", "https://app.example.org");
        recording.push_step(Step::input(0, "#a", "1"));
        recording.push_step(Step::input(10, "#b", "2"));
        let result = analyzer.analyze(&recording);
        // The 0.7-confidence form pattern is filtered out.
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn test_wallet_flags_pass_through() {
        let analyzer = RecordingAnalyzer::new();
        let mut recording = Recording::new("flow", "https://app.example.org");
        recording.wallet_connected = true;
        recording.wallet_address = Some("0xabc".to_string());
        recording.push_step(Step::input(0, "#amount", "5"));
        let result = analyzer.analyze(&recording);
        assert!(result.wallet_connected);
        assert_eq!(result.wallet_address.as_deref(), Some("0xabc"));
        assert_eq!(result.test_type, TestType::Flow);
    }
}
