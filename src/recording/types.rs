//! Core step types for dApp interaction recordings
//!
//! Defines the tagged step union produced by the upstream browser recorder.
//! Steps are immutable once recorded; the analysis pipeline only reads them.

use serde::{Deserialize, Serialize};

/// One atomic recorded user/browser/provider event.
///
/// The step's index in the recording is implied by its position in the
/// sequence; `timestamp` is milliseconds since recording start and is
/// monotonically non-decreasing across the sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds since recording start
    #[serde(default)]
    pub timestamp: u64,
    /// The recorded event payload
    #[serde(flatten)]
    pub kind: StepKind,
}

/// The recorded event payload, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Click on a page element
    Click(ClickStep),
    /// Text entered into a field (value is the field content at that moment)
    Input(InputStep),
    /// Page navigation
    Navigation(NavigationStep),
    /// Call made to the injected wallet provider
    WalletCall(WalletCallStep),
    /// Scroll event
    Scroll(ScrollStep),
}

/// A recorded click with optional element metadata.
///
/// Recorders routinely omit the optional capture fields; absent metadata is
/// normal and never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickStep {
    /// CSS selector the recorder resolved for the element
    #[serde(default)]
    pub selector: String,
    /// Visible text of the element
    #[serde(default)]
    pub text: Option<String>,
    /// data-testid attribute, when present
    #[serde(default)]
    pub test_id: Option<String>,
    /// ARIA label, when present
    #[serde(default)]
    pub aria_label: Option<String>,
    /// HTML tag name (div, button, ...)
    #[serde(default)]
    pub tag_name: Option<String>,
}

impl ClickStep {
    /// Lowercased visible text, empty when not captured
    pub fn text_lower(&self) -> String {
        self.text.as_deref().unwrap_or("").to_lowercase()
    }

    /// True when the visible text contains any of the given keywords
    pub fn text_matches(&self, keywords: &[&str]) -> bool {
        let text = self.text_lower();
        !text.is_empty() && keywords.iter().any(|k| text.contains(k))
    }

    /// True when visible text or test id contains any of the given keywords
    pub fn text_or_test_id_matches(&self, keywords: &[&str]) -> bool {
        if self.text_matches(keywords) {
            return true;
        }
        let test_id = self
            .test_id
            .as_deref()
            .unwrap_or("")
            .to_lowercase();
        !test_id.is_empty() && keywords.iter().any(|k| test_id.contains(k))
    }

    /// Best human-readable label for the element
    pub fn label(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or(self.aria_label.as_deref())
            .or(self.test_id.as_deref())
    }
}

/// A recorded text input. The recorder captures every keystroke, so
/// consecutive inputs to the same field carry successive intermediate values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputStep {
    /// CSS selector of the field
    #[serde(default)]
    pub selector: String,
    /// Field content at the time of the event
    #[serde(default)]
    pub value: String,
    /// Placeholder attribute, when present
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl InputStep {
    /// Stable key identifying the field across repeated writes.
    ///
    /// Prefers the selector; falls back to the placeholder for fields the
    /// recorder could not resolve a selector for.
    pub fn field_key(&self) -> Option<&str> {
        if !self.selector.is_empty() {
            Some(self.selector.as_str())
        } else {
            self.placeholder.as_deref().filter(|p| !p.is_empty())
        }
    }
}

/// A recorded page navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationStep {
    /// Target URL
    pub url: String,
}

/// A recorded scroll event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScrollStep {
    /// Horizontal offset in pixels
    #[serde(default)]
    pub x: f64,
    /// Vertical offset in pixels
    #[serde(default)]
    pub y: f64,
}

/// A recorded call to the injected wallet provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletCallStep {
    /// JSON-RPC method name (eth_requestAccounts, personal_sign, ...)
    pub method: String,
    /// Call parameters as recorded
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
    /// Call result as recorded, when captured
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Explicit chain id the recorder attached to this call
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Wallet provider identity (metamask, rabby, ...), when captured
    #[serde(default)]
    pub wallet: Option<String>,
}

/// Signature-request method names
const SIGNATURE_METHODS: [&str; 5] = [
    "personal_sign",
    "eth_sign",
    "eth_signTypedData",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
];

/// Methods dApps poll in the background; these carry no user intent on
/// their own and are filtered out of synthesized plans.
const POLLING_METHODS: [&str; 6] = [
    "eth_chainId",
    "eth_accounts",
    "eth_blockNumber",
    "eth_getBalance",
    "eth_call",
    "net_version",
];

impl WalletCallStep {
    /// True for the account-connection request
    pub fn is_request_accounts(&self) -> bool {
        self.method == "eth_requestAccounts"
    }

    /// True for signature-request methods
    pub fn is_signature(&self) -> bool {
        SIGNATURE_METHODS.contains(&self.method.as_str())
    }

    /// True for explicit chain-switch requests
    pub fn is_switch_chain(&self) -> bool {
        self.method == "wallet_switchEthereumChain" || self.method == "wallet_addEthereumChain"
    }

    /// True for chain-id queries
    pub fn is_chain_query(&self) -> bool {
        self.method == "eth_chainId"
    }

    /// True for transaction submission
    pub fn is_send_transaction(&self) -> bool {
        self.method == "eth_sendTransaction"
    }

    /// True for background polling calls (chain id, accounts, block number,
    /// balance, generic call, net version)
    pub fn is_polling(&self) -> bool {
        POLLING_METHODS.contains(&self.method.as_str())
    }

    /// Chain id carried in the first parameter object (`{"chainId": "0x..."}`),
    /// as sent by switch/add-chain requests.
    pub fn param_chain_id(&self) -> Option<u64> {
        let first = self.params.first()?;
        let raw = first.get("chainId")?.as_str()?;
        parse_chain_id(raw)
    }

    /// Chain id carried in the call result (hex string), as returned by
    /// chain-id queries.
    pub fn result_chain_id(&self) -> Option<u64> {
        let raw = self.result.as_ref()?.as_str()?;
        parse_chain_id(raw)
    }
}

/// Decode a chain id from a `0x`-prefixed hex string or a decimal string.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        raw.parse::<u64>().ok()
    }
}

impl Step {
    /// Create a click step
    pub fn click(timestamp: u64, click: ClickStep) -> Self {
        Self {
            timestamp,
            kind: StepKind::Click(click),
        }
    }

    /// Create an input step
    pub fn input(timestamp: u64, selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: StepKind::Input(InputStep {
                selector: selector.into(),
                value: value.into(),
                placeholder: None,
            }),
        }
    }

    /// Create a navigation step
    pub fn navigation(timestamp: u64, url: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: StepKind::Navigation(NavigationStep { url: url.into() }),
        }
    }

    /// Create a wallet-provider call step
    pub fn wallet_call(timestamp: u64, call: WalletCallStep) -> Self {
        Self {
            timestamp,
            kind: StepKind::WalletCall(call),
        }
    }

    /// Create a scroll step
    pub fn scroll(timestamp: u64, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            kind: StepKind::Scroll(ScrollStep { x, y }),
        }
    }

    /// Check if this is a click step
    pub fn is_click(&self) -> bool {
        matches!(self.kind, StepKind::Click(_))
    }

    /// Check if this is an input step
    pub fn is_input(&self) -> bool {
        matches!(self.kind, StepKind::Input(_))
    }

    /// Check if this is a wallet-provider call
    pub fn is_wallet_call(&self) -> bool {
        matches!(self.kind, StepKind::WalletCall(_))
    }

    /// Click payload, if this is a click step
    pub fn as_click(&self) -> Option<&ClickStep> {
        match &self.kind {
            StepKind::Click(click) => Some(click),
            _ => None,
        }
    }

    /// Input payload, if this is an input step
    pub fn as_input(&self) -> Option<&InputStep> {
        match &self.kind {
            StepKind::Input(input) => Some(input),
            _ => None,
        }
    }

    /// Navigation payload, if this is a navigation step
    pub fn as_navigation(&self) -> Option<&NavigationStep> {
        match &self.kind {
            StepKind::Navigation(nav) => Some(nav),
            _ => None,
        }
    }

    /// Wallet-call payload, if this is a wallet-provider call
    pub fn as_wallet_call(&self) -> Option<&WalletCallStep> {
        match &self.kind {
            StepKind::WalletCall(call) => Some(call),
            _ => None,
        }
    }
}
