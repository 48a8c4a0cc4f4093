//! Test-Type and Connection-Pattern Classification
//!
//! Decides whether a recording represents a wallet-connection flow or a
//! flow that assumes a prior connection, and which wallet-connection UI
//! library (if any) the recording's clicks match.

use super::patterns::{FlowPattern, PatternType};
use crate::recording::types::{ClickStep, Step, StepKind};
use serde::{Deserialize, Serialize};

/// Click keywords that suggest the user intended to connect
const CONNECTION_INTENT_KEYWORDS: [&str; 5] =
    ["connect", "login", "sign in", "launch app", "enter app"];

/// What kind of test the recording represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// The recording demonstrates connecting a wallet
    Connection,
    /// The recording assumes a wallet is already connected
    Flow,
}

impl TestType {
    /// Stable lowercase name, matching the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Connection => "connection",
            TestType::Flow => "flow",
        }
    }
}

/// Classify the recording as a connection or flow test.
///
/// Decision order:
/// 1. Wallet already connected and no account request anywhere: `flow`.
/// 2. No account request and no connection-flavored click either: `flow`
///    (the recorder likely missed the provider injection, but nothing in the
///    clicks suggests a connection recording).
/// 3. Otherwise: `connection`.
pub fn classify_test_type(steps: &[Step], wallet_connected: bool) -> TestType {
    let has_request_accounts = steps.iter().any(|s| {
        s.as_wallet_call()
            .map(|c| c.is_request_accounts())
            .unwrap_or(false)
    });

    if wallet_connected && !has_request_accounts {
        return TestType::Flow;
    }

    if !has_request_accounts {
        let has_connect_click = steps.iter().any(|s| {
            s.as_click()
                .map(|c| c.text_matches(&CONNECTION_INTENT_KEYWORDS))
                .unwrap_or(false)
        });
        if !has_connect_click {
            return TestType::Flow;
        }
    }

    TestType::Connection
}

/// Which third-party wallet-connection UI library the recording's clicks
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPattern {
    Privy,
    RainbowKit,
    Web3Modal,
    /// A wallet connection happened, but no known library signature matched
    Custom,
    Unknown,
}

impl ConnectionPattern {
    /// Stable lowercase name, matching the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPattern::Privy => "privy",
            ConnectionPattern::RainbowKit => "rainbow_kit",
            ConnectionPattern::Web3Modal => "web3_modal",
            ConnectionPattern::Custom => "custom",
            ConnectionPattern::Unknown => "unknown",
        }
    }
}

fn matches_privy(click: &ClickStep) -> bool {
    let selector = click.selector.to_lowercase();
    let test_id = click.test_id.as_deref().unwrap_or("").to_lowercase();
    selector.contains("privy")
        || test_id.contains("privy")
        || click.text_lower().contains("continue with a wallet")
}

fn matches_rainbowkit(click: &ClickStep) -> bool {
    let test_id = click.test_id.as_deref().unwrap_or("");
    click.selector.contains("rk-") || test_id.starts_with("rk-")
}

fn matches_web3modal(click: &ClickStep) -> bool {
    let test_id = click.test_id.as_deref().unwrap_or("");
    click.selector.contains("w3m-")
        || test_id.starts_with("w3m-")
        || click.text_lower().contains("walletconnect")
}

/// Scan all click steps once, in order, testing each against the known
/// library signatures (Privy, then RainbowKit, then Web3Modal per click).
/// The first matching click decides. When no click matches but a
/// wallet-connect pattern exists, the connection is `custom`; otherwise
/// `unknown`.
pub fn detect_connection_pattern(
    steps: &[Step],
    patterns: &[FlowPattern],
) -> ConnectionPattern {
    for step in steps {
        let StepKind::Click(click) = &step.kind else {
            continue;
        };
        if matches_privy(click) {
            return ConnectionPattern::Privy;
        }
        if matches_rainbowkit(click) {
            return ConnectionPattern::RainbowKit;
        }
        if matches_web3modal(click) {
            return ConnectionPattern::Web3Modal;
        }
    }

    if patterns
        .iter()
        .any(|p| p.pattern_type == PatternType::WalletConnect)
    {
        ConnectionPattern::Custom
    } else {
        ConnectionPattern::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::types::WalletCallStep;

    fn click(text: &str) -> Step {
        Step::click(
            0,
            ClickStep {
                selector: "button".to_string(),
                text: Some(text.to_string()),
                ..Default::default()
            },
        )
    }

    fn click_selector(selector: &str) -> Step {
        Step::click(
            0,
            ClickStep {
                selector: selector.to_string(),
                ..Default::default()
            },
        )
    }

    fn request_accounts() -> Step {
        Step::wallet_call(
            0,
            WalletCallStep {
                method: "eth_requestAccounts".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_connected_without_request_is_flow() {
        let steps = vec![click("Swap"), Step::input(10, "#amount", "5")];
        assert_eq!(classify_test_type(&steps, true), TestType::Flow);
    }

    #[test]
    fn test_request_accounts_is_connection() {
        let steps = vec![click("Connect"), request_accounts()];
        assert_eq!(classify_test_type(&steps, false), TestType::Connection);
        // The flag does not override an observed connection request.
        assert_eq!(classify_test_type(&steps, true), TestType::Connection);
    }

    #[test]
    fn test_no_request_no_connect_click_is_flow() {
        let steps = vec![click("Swap"), click("Confirm")];
        assert_eq!(classify_test_type(&steps, false), TestType::Flow);
    }

    #[test]
    fn test_connect_click_without_request_is_connection() {
        // The recorder likely failed to capture the provider injection.
        let steps = vec![click("Launch App"), click("Swap")];
        assert_eq!(classify_test_type(&steps, false), TestType::Connection);
    }

    #[test]
    fn test_empty_recording_is_flow() {
        assert_eq!(classify_test_type(&[], false), TestType::Flow);
    }

    #[test]
    fn test_privy_signature() {
        let steps = vec![click_selector("button.privy-modal-button")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Privy
        );

        let steps = vec![click("Continue with a wallet")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Privy
        );
    }

    #[test]
    fn test_rainbowkit_signature() {
        let steps = vec![click_selector("[data-testid='rk-connect-button']")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::RainbowKit
        );
    }

    #[test]
    fn test_web3modal_signature() {
        let steps = vec![click_selector("w3m-modal w3m-connect-button")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Web3Modal
        );

        let steps = vec![click("WalletConnect")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Web3Modal
        );
    }

    #[test]
    fn test_group_order_within_one_click() {
        // A click matching both Privy and Web3Modal signatures resolves to
        // Privy: the group check order is fixed.
        let steps = vec![Step::click(
            0,
            ClickStep {
                selector: "div.privy-dialog".to_string(),
                text: Some("WalletConnect".to_string()),
                ..Default::default()
            },
        )];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Privy
        );
    }

    #[test]
    fn test_first_click_wins_across_steps() {
        let steps = vec![
            click_selector("w3m-connect-button"),
            click_selector("button.privy-modal-button"),
        ];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Web3Modal
        );
    }

    #[test]
    fn test_custom_when_connect_pattern_exists() {
        use crate::analysis::patterns::detect_wallet_connect;
        let steps = vec![click("Connect"), request_accounts()];
        let patterns = detect_wallet_connect(&steps);
        assert_eq!(
            detect_connection_pattern(&steps, &patterns),
            ConnectionPattern::Custom
        );
    }

    #[test]
    fn test_unknown_without_patterns() {
        let steps = vec![click("Swap")];
        assert_eq!(
            detect_connection_pattern(&steps, &[]),
            ConnectionPattern::Unknown
        );
    }
}
