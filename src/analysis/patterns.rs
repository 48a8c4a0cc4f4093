//! Flow Pattern Detection
//!
//! Seven independent, stateless scanning passes over the step sequence, each
//! recognizing one semantic flow pattern. The passes are order-insensitive;
//! [`detect_all`] concatenates their output and stable-sorts by start index.

use crate::recording::types::{Step, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Click keywords that precede a wallet connection request
const CONNECT_CLICK_KEYWORDS: [&str; 5] = ["connect", "wallet", "login", "metamask", "rabby"];

/// Click keywords that precede a signature request
const SIGN_CLICK_KEYWORDS: [&str; 3] = ["sign", "confirm", "agree"];

/// Click keywords that open a trading action
const TRADE_KEYWORDS: [&str; 7] = ["trade", "order", "buy", "sell", "long", "short", "leverage"];

/// Click keywords that submit a pending action
const SUBMIT_KEYWORDS: [&str; 3] = ["confirm", "submit", "execute"];

/// Click keywords that close an open position
const CLOSE_KEYWORDS: [&str; 2] = ["close position", "close"];

/// Click keyword that starts a token approval
const APPROVE_KEYWORDS: [&str; 1] = ["approve"];

/// How far back a connection request looks for its triggering click
const CONNECT_LOOKBACK: usize = 5;

/// How far back a signature request looks for its triggering click
const SIGN_LOOKBACK: usize = 3;

/// How far ahead a trade/approve click looks for its transaction
const TRADE_LOOKAHEAD: usize = 5;

/// Minimum consecutive input steps that form a form-fill run
const MIN_FORM_RUN: usize = 2;

/// The closed set of detected flow-pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    WalletConnect,
    WalletSign,
    WalletApprove,
    NetworkSwitch,
    TradeOpen,
    TradeClose,
    FormFill,
    Navigation,
}

impl PatternType {
    /// Stable lowercase name, matching the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::WalletConnect => "wallet_connect",
            PatternType::WalletSign => "wallet_sign",
            PatternType::WalletApprove => "wallet_approve",
            PatternType::NetworkSwitch => "network_switch",
            PatternType::TradeOpen => "trade_open",
            PatternType::TradeClose => "trade_close",
            PatternType::FormFill => "form_fill",
            PatternType::Navigation => "navigation",
        }
    }
}

/// A detected, confidence-scored semantic cluster of steps.
///
/// `start_index..=end_index` is the inclusive range over the step sequence;
/// `step_indices` lists the covered indices. Patterns of different types may
/// overlap; the synthesizer resolves index ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPattern {
    /// The pattern type
    pub pattern_type: PatternType,
    /// First covered step index (inclusive)
    pub start_index: usize,
    /// Last covered step index (inclusive)
    pub end_index: usize,
    /// The covered step indices
    pub step_indices: Vec<usize>,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
    /// Type-specific metadata (resolved chain id, wallet name, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl FlowPattern {
    /// Create a pattern covering the inclusive index range
    pub fn spanning(
        pattern_type: PatternType,
        start_index: usize,
        end_index: usize,
        confidence: f32,
    ) -> Self {
        Self {
            pattern_type,
            start_index,
            end_index,
            step_indices: (start_index..=end_index).collect(),
            confidence,
            metadata: BTreeMap::new(),
        }
    }

    /// True when the pattern covers the given step index
    pub fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index <= self.end_index
    }

    fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Run all seven detection passes and return the patterns sorted by start
/// index. Detector order is fixed so equal start indices tie-break
/// deterministically.
pub fn detect_all(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    patterns.extend(detect_wallet_connect(steps));
    patterns.extend(detect_wallet_sign(steps));
    patterns.extend(detect_network_switch(steps));
    patterns.extend(detect_trade_actions(steps));
    patterns.extend(detect_wallet_approve(steps));
    patterns.extend(detect_form_fill(steps));
    patterns.extend(detect_navigation(steps));
    patterns.sort_by_key(|p| p.start_index);
    patterns
}

/// Wallet-connect pass: an `eth_requestAccounts` call, extended backward to
/// the earliest connection-flavored click within the lookback window.
pub fn detect_wallet_connect(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    // Indices already covered by an earlier match of this pass are off-limits
    // for backward extension.
    let mut floor = 0usize;

    for (i, step) in steps.iter().enumerate() {
        let call = match step.as_wallet_call() {
            Some(call) if call.is_request_accounts() => call,
            _ => continue,
        };

        let mut start = i;
        let window_start = i.saturating_sub(CONNECT_LOOKBACK).max(floor);
        for (j, candidate) in steps.iter().enumerate().take(i).skip(window_start) {
            if let StepKind::Click(click) = &candidate.kind {
                if click.text_matches(&CONNECT_CLICK_KEYWORDS) {
                    start = start.min(j);
                }
            }
        }

        let mut pattern = FlowPattern::spanning(PatternType::WalletConnect, start, i, 0.9);
        if let Some(wallet) = &call.wallet {
            pattern = pattern.with_meta("wallet", wallet.clone());
        }
        floor = i + 1;
        patterns.push(pattern);
    }
    patterns
}

/// Wallet-sign pass: a signature-method call, extended backward to the
/// nearest sign/confirm/agree click within the lookback window.
pub fn detect_wallet_sign(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    let mut floor = 0usize;

    for (i, step) in steps.iter().enumerate() {
        let call = match step.as_wallet_call() {
            Some(call) if call.is_signature() => call,
            _ => continue,
        };

        let mut start = i;
        let window_start = i.saturating_sub(SIGN_LOOKBACK).max(floor);
        // Nearest match wins; stop at the first one walking backward.
        for j in (window_start..i).rev() {
            if let StepKind::Click(click) = &steps[j].kind {
                if click.text_matches(&SIGN_CLICK_KEYWORDS) {
                    start = j;
                    break;
                }
            }
        }

        let pattern = FlowPattern::spanning(PatternType::WalletSign, start, i, 0.95)
            .with_meta("method", call.method.clone());
        floor = i + 1;
        patterns.push(pattern);
    }
    patterns
}

/// Network-switch pass: explicit `wallet_switchEthereumChain` /
/// `wallet_addEthereumChain` calls at 0.95, then implicit switches inferred
/// from consecutive differing chain-id query results at 0.8. An implicit
/// candidate is dropped when an explicit pattern already resolved the same
/// chain id.
///
/// The implicit inference can misfire when the dApp polls the chain id from
/// independent code paths interleaved in time; that is a known limitation of
/// the heuristic, kept as-is.
pub fn detect_network_switch(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    let mut explicit_chains: HashSet<u64> = HashSet::new();

    for (i, step) in steps.iter().enumerate() {
        let call = match step.as_wallet_call() {
            Some(call) if call.is_switch_chain() => call,
            _ => continue,
        };

        let chain_id = call.param_chain_id().or(call.chain_id);
        let mut pattern = FlowPattern::spanning(PatternType::NetworkSwitch, i, i, 0.95)
            .with_meta("source", "explicit");
        if let Some(chain) = chain_id {
            explicit_chains.insert(chain);
            pattern = pattern.with_meta("chain_id", chain.to_string());
        }
        patterns.push(pattern);
    }

    let mut last_result: Option<u64> = None;
    for (i, step) in steps.iter().enumerate() {
        let call = match step.as_wallet_call() {
            Some(call) if call.is_chain_query() => call,
            _ => continue,
        };
        let Some(chain) = call.result_chain_id() else {
            continue;
        };
        if let Some(previous) = last_result {
            if previous != chain && !explicit_chains.contains(&chain) {
                patterns.push(
                    FlowPattern::spanning(PatternType::NetworkSwitch, i, i, 0.8)
                        .with_meta("source", "implicit")
                        .with_meta("chain_id", chain.to_string()),
                );
            }
        }
        last_result = Some(chain);
    }

    patterns.sort_by_key(|p| p.start_index);
    patterns
}

/// Trading pass: a trade/submit-flavored click followed by an
/// `eth_sendTransaction` within the lookahead window becomes a pattern
/// spanning click to transaction. Close-flavored click text yields
/// `trade_close`, everything else `trade_open`. Clicks without a trailing
/// transaction emit nothing.
pub fn detect_trade_actions(steps: &[Step]) -> Vec<FlowPattern> {
    detect_click_to_transaction(steps, |click| {
        if click.text_or_test_id_matches(&CLOSE_KEYWORDS) {
            Some(PatternType::TradeClose)
        } else if click.text_or_test_id_matches(&TRADE_KEYWORDS)
            || click.text_or_test_id_matches(&SUBMIT_KEYWORDS)
        {
            Some(PatternType::TradeOpen)
        } else {
            None
        }
    })
}

/// Wallet-approve pass: same forward-lookahead structure as the trading
/// pass, keyed on an "approve" keyword match.
pub fn detect_wallet_approve(steps: &[Step]) -> Vec<FlowPattern> {
    detect_click_to_transaction(steps, |click| {
        if click.text_or_test_id_matches(&APPROVE_KEYWORDS) {
            Some(PatternType::WalletApprove)
        } else {
            None
        }
    })
}

/// Shared click-then-transaction scan for the trading and approval passes.
fn detect_click_to_transaction(
    steps: &[Step],
    classify: impl Fn(&crate::recording::types::ClickStep) -> Option<PatternType>,
) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    let mut i = 0usize;

    while i < steps.len() {
        let click = match &steps[i].kind {
            StepKind::Click(click) => click,
            _ => {
                i += 1;
                continue;
            }
        };
        let Some(pattern_type) = classify(click) else {
            i += 1;
            continue;
        };

        let lookahead_end = (i + TRADE_LOOKAHEAD).min(steps.len().saturating_sub(1));
        let tx_index = (i + 1..=lookahead_end).find(|&j| {
            steps[j]
                .as_wallet_call()
                .map(|c| c.is_send_transaction())
                .unwrap_or(false)
        });

        match tx_index {
            Some(tx) => {
                let mut pattern = FlowPattern::spanning(pattern_type, i, tx, 0.85);
                if let Some(label) = click.label() {
                    pattern = pattern.with_meta("trigger_text", label);
                }
                patterns.push(pattern);
                // This pass owns everything through the transaction.
                i = tx + 1;
            }
            None => {
                i += 1;
            }
        }
    }
    patterns
}

/// Form-fill pass: contiguous runs of at least two input steps become one
/// pattern. Any non-input step breaks the run.
pub fn detect_form_fill(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, step) in steps.iter().enumerate() {
        if step.is_input() {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            if i - start >= MIN_FORM_RUN {
                patterns.push(form_run_pattern(start, i - 1));
            }
        }
    }
    if let Some(start) = run_start {
        if steps.len() - start >= MIN_FORM_RUN {
            patterns.push(form_run_pattern(start, steps.len() - 1));
        }
    }
    patterns
}

fn form_run_pattern(start: usize, end: usize) -> FlowPattern {
    let count = end - start + 1;
    FlowPattern::spanning(PatternType::FormFill, start, end, 0.7)
        .with_meta("input_count", count.to_string())
}

/// Navigation pass: every navigation step is its own pattern.
pub fn detect_navigation(steps: &[Step]) -> Vec<FlowPattern> {
    let mut patterns = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        if let StepKind::Navigation(nav) = &step.kind {
            patterns.push(
                FlowPattern::spanning(PatternType::Navigation, i, i, 1.0)
                    .with_meta("url", nav.url.clone()),
            );
        }
    }
    patterns
}
