//! Analysis Pipeline Integration Tests
//!
//! Exercises the full analysis chain (Recording -> patterns -> classification
//! -> extraction) over realistic recordings, including file round-trips and
//! edge cases.

use dapp_analyzer::analysis::{
    ConnectionPattern, PatternType, RecordingAnalyzer, TestType,
};
use dapp_analyzer::recording::types::{ClickStep, Step, WalletCallStep};
use dapp_analyzer::recording::Recording;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

// ============================================================================
// Helper Functions
// ============================================================================

fn click(ts: u64, selector: &str, text: &str) -> Step {
    Step::click(
        ts,
        ClickStep {
            selector: selector.to_string(),
            text: Some(text.to_string()),
            ..Default::default()
        },
    )
}

fn wallet(ts: u64, method: &str) -> Step {
    Step::wallet_call(
        ts,
        WalletCallStep {
            method: method.to_string(),
            ..Default::default()
        },
    )
}

fn chain_query(ts: u64, result_hex: &str) -> Step {
    Step::wallet_call(
        ts,
        WalletCallStep {
            method: "eth_chainId".to_string(),
            result: Some(serde_json::json!(result_hex)),
            ..Default::default()
        },
    )
}

fn switch_chain(ts: u64, chain_hex: &str) -> Step {
    Step::wallet_call(
        ts,
        WalletCallStep {
            method: "wallet_switchEthereumChain".to_string(),
            params: vec![serde_json::json!({ "chainId": chain_hex })],
            ..Default::default()
        },
    )
}

/// A realistic perp-trading connection recording: navigate, connect via a
/// custom button, poll chain id, switch to Base, fill the order form, open
/// the trade.
fn trading_recording() -> Recording {
    let mut recording = Recording::new("open_long_on_base", "https://perps.example.org");
    recording.push_step(Step::navigation(0, "https://perps.example.org"));
    recording.push_step(click(1_200, "button.connect-btn", "Connect Wallet"));
    recording.push_step(Step::wallet_call(
        1_900,
        WalletCallStep {
            method: "eth_requestAccounts".to_string(),
            wallet: Some("metamask".to_string()),
            ..Default::default()
        },
    ));
    recording.push_step(chain_query(2_100, "0x1"));
    recording.push_step(switch_chain(3_000, "0x2105"));
    recording.push_step(chain_query(3_200, "0x2105"));
    recording.push_step(Step::scroll(3_500, 0.0, 420.0));
    recording.push_step(Step::input(4_000, "#size", "1"));
    recording.push_step(Step::input(4_300, "#size", "10"));
    recording.push_step(Step::input(4_700, "#leverage", "5"));
    recording.push_step(click(5_200, "button.submit", "Open Long"));
    recording.push_step(wallet(5_600, "eth_sendTransaction"));
    recording.finalize(5_600);
    recording
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn full_trading_recording_analysis() {
    let analysis = RecordingAnalyzer::new().analyze(&trading_recording());

    assert_eq!(analysis.test_type, TestType::Connection);
    assert_eq!(analysis.connection_pattern, ConnectionPattern::Custom);
    assert_eq!(analysis.chain_id, Some(1));
    assert_eq!(analysis.wallet_name, Some("metamask".to_string()));

    let types: Vec<PatternType> = analysis.patterns.iter().map(|p| p.pattern_type).collect();
    assert!(types.contains(&PatternType::Navigation));
    assert!(types.contains(&PatternType::WalletConnect));
    assert!(types.contains(&PatternType::NetworkSwitch));
    assert!(types.contains(&PatternType::FormFill));
    assert!(types.contains(&PatternType::TradeOpen));

    // Patterns arrive sorted by start index.
    for pair in analysis.patterns.windows(2) {
        assert!(pair[0].start_index <= pair[1].start_index);
    }

    // The explicit switch to Base suppresses the implicit candidate from the
    // repeated chain query.
    let switches: Vec<_> = analysis
        .patterns
        .iter()
        .filter(|p| p.pattern_type == PatternType::NetworkSwitch)
        .collect();
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].metadata.get("chain_id").unwrap(), "8453");

    // Base is not mainnet: a network setup hint is emitted.
    assert!(analysis
        .setup_hints
        .iter()
        .any(|h| h.contains("chain id 1") || h.contains("metamask")));
}

#[test]
fn wallet_connect_pattern_covers_click_and_call() {
    let analysis = RecordingAnalyzer::new().analyze(&trading_recording());
    let connect = analysis
        .patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::WalletConnect)
        .expect("connect pattern");
    assert_eq!(connect.start_index, 1);
    assert_eq!(connect.end_index, 2);
    assert_eq!(connect.confidence, 0.9);
    assert_eq!(connect.metadata.get("wallet").unwrap(), "metamask");
}

#[test]
fn form_fill_pattern_covers_the_keystroke_run() {
    let analysis = RecordingAnalyzer::new().analyze(&trading_recording());
    let form = analysis
        .patterns
        .iter()
        .find(|p| p.pattern_type == PatternType::FormFill)
        .expect("form pattern");
    assert_eq!(form.start_index, 7);
    assert_eq!(form.end_index, 9);
    assert_eq!(form.step_indices, vec![7, 8, 9]);
}

#[test]
fn flow_recording_classification() {
    let mut recording = Recording::new("swap_when_connected", "https://swap.example.org");
    recording.wallet_connected = true;
    recording.wallet_address = Some("0x1234".to_string());
    recording.push_step(Step::input(0, "#from-amount", "1"));
    recording.push_step(Step::input(400, "#from-amount", "1.5"));
    recording.push_step(click(900, "button.swap", "Swap"));
    recording.push_step(wallet(1_300, "eth_sendTransaction"));

    let analysis = RecordingAnalyzer::new().analyze(&recording);
    assert_eq!(analysis.test_type, TestType::Flow);
    assert!(analysis.wallet_connected);
    assert_eq!(analysis.wallet_address, Some("0x1234".to_string()));
}

#[test]
fn connection_library_signatures() {
    let mut privy = Recording::new("privy", "https://app.example.org");
    privy.push_step(click(0, "button.privy-wallet-item", "MetaMask"));
    let analysis = RecordingAnalyzer::new().analyze(&privy);
    assert_eq!(analysis.connection_pattern, ConnectionPattern::Privy);

    let mut rainbow = Recording::new("rainbow", "https://app.example.org");
    rainbow.push_step(Step::click(
        0,
        ClickStep {
            selector: "button".to_string(),
            test_id: Some("rk-connect-button".to_string()),
            ..Default::default()
        },
    ));
    let analysis = RecordingAnalyzer::new().analyze(&rainbow);
    assert_eq!(analysis.connection_pattern, ConnectionPattern::RainbowKit);

    let mut w3m = Recording::new("w3m", "https://app.example.org");
    w3m.push_step(click(0, "w3m-modal .w3m-button", "Connect"));
    let analysis = RecordingAnalyzer::new().analyze(&w3m);
    assert_eq!(analysis.connection_pattern, ConnectionPattern::Web3Modal);
}

#[test]
fn analysis_survives_recording_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recording.json");

    let recording = trading_recording();
    recording.save(&path).unwrap();
    let loaded = Recording::load(&path).unwrap();

    let analyzer = RecordingAnalyzer::new();
    let direct = analyzer.analyze(&recording);
    let roundtripped = analyzer.analyze(&loaded);

    assert_eq!(
        serde_json::to_string(&direct.patterns).unwrap(),
        serde_json::to_string(&roundtripped.patterns).unwrap()
    );
    assert_eq!(direct.test_type, roundtripped.test_type);
    assert_eq!(direct.chain_id, roundtripped.chain_id);
}

#[test]
fn analysis_result_serializes_and_deserializes() {
    let analysis = RecordingAnalyzer::new().analyze(&trading_recording());
    let json = serde_json::to_string(&analysis).unwrap();
    let back: dapp_analyzer::AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.patterns.len(), analysis.patterns.len());
    assert_eq!(back.test_type, analysis.test_type);
    assert_eq!(back.connection_pattern, analysis.connection_pattern);
}

#[test]
fn repeated_analysis_is_bit_identical() {
    let recording = trading_recording();
    let analyzer = RecordingAnalyzer::new();
    let a = serde_json::to_string(&analyzer.analyze(&recording)).unwrap();
    let b = serde_json::to_string(&analyzer.analyze(&recording)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_and_sparse_recordings_are_silent_outcomes() {
    let analyzer = RecordingAnalyzer::new();

    let empty = Recording::new("empty", "https://app.example.org");
    let analysis = analyzer.analyze(&empty);
    assert!(analysis.patterns.is_empty());
    assert_eq!(analysis.test_type, TestType::Flow);
    assert_eq!(analysis.connection_pattern, ConnectionPattern::Unknown);

    let mut scroll_only = Recording::new("scrolls", "https://app.example.org");
    scroll_only.push_step(Step::scroll(0, 0.0, 10.0));
    scroll_only.push_step(Step::scroll(100, 0.0, 400.0));
    let analysis = analyzer.analyze(&scroll_only);
    assert!(analysis.patterns.is_empty());
    assert!(analysis.chain_id.is_none());
    assert!(analysis.wallet_name.is_none());
}

#[test]
fn implicit_switch_detected_across_polls() {
    let mut recording = Recording::new("implicit", "https://app.example.org");
    recording.push_step(chain_query(0, "0x1"));
    recording.push_step(click(500, "button", "Arbitrum"));
    recording.push_step(chain_query(1_000, "0xa4b1"));

    let analysis = RecordingAnalyzer::new().analyze(&recording);
    let switches: Vec<_> = analysis
        .patterns
        .iter()
        .filter(|p| p.pattern_type == PatternType::NetworkSwitch)
        .collect();
    assert_eq!(switches.len(), 1);
    assert_eq!(switches[0].confidence, 0.8);
    assert_eq!(switches[0].metadata.get("chain_id").unwrap(), "42161");
}
