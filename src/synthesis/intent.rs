//! Intent Step Synthesis
//!
//! Merges detected flow patterns and uncovered raw steps into one
//! chronologically ordered, deduplicated, re-indexed plan of intent steps —
//! the hand-off artifact for downstream test generation and agent execution.

use crate::analysis::{AnalysisResult, FlowPattern, PatternType, TestType};
use crate::recording::types::{Step, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Click phrases that restate a network switch already captured as a pattern
const NETWORK_SWITCH_PHRASES: [&str; 3] = ["switch network", "switch to", "change network"];

/// Click phrases that restate a wallet selection already captured as a
/// connect pattern
const WALLET_SELECTION_PHRASES: [&str; 6] = [
    "metamask",
    "rabby",
    "walletconnect",
    "coinbase wallet",
    "browser wallet",
    "connect wallet",
];

/// The semantic type of a synthesized intent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Navigate,
    ConnectWallet,
    SignMessage,
    SwitchNetwork,
    ConfirmTransaction,
    FillForm,
    ClickElement,
    VerifyState,
}

impl IntentType {
    /// Stable lowercase name, matching the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Navigate => "navigate",
            IntentType::ConnectWallet => "connect_wallet",
            IntentType::SignMessage => "sign_message",
            IntentType::SwitchNetwork => "switch_network",
            IntentType::ConfirmTransaction => "confirm_transaction",
            IntentType::FillForm => "fill_form",
            IntentType::ClickElement => "click_element",
            IntentType::VerifyState => "verify_state",
        }
    }
}

/// A synthesized, human-readable unit of test intent.
///
/// `source_indices` lists the recording step indices the step derives from;
/// synthetic steps (the leading navigate, the trailing verification) carry
/// none. `context` holds type-specific fields: URL, chain id, click hints,
/// form field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentStep {
    /// Sequential id in final order, starting at 1
    pub id: usize,
    /// Human-readable description
    pub description: String,
    /// Semantic type
    pub intent: IntentType,
    /// Recording step indices this step derives from
    pub source_indices: Vec<usize>,
    /// Type-specific context fields
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl IntentStep {
    fn new(intent: IntentType, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            description: description.into(),
            intent,
            source_indices: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    fn with_sources(mut self, sources: Vec<usize>) -> Self {
        self.source_indices = sources;
        self
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.context.insert(key.to_string(), value.into());
    }

    /// Smallest source index, when the step derives from any
    pub fn min_source_index(&self) -> Option<usize> {
        self.source_indices.iter().copied().min()
    }
}

/// Synthesize the final ordered intent-step plan from an analysis result.
///
/// All scratch state (consumed/claimed index sets, the id counter) is local
/// to this call; identical input yields identical output.
pub fn synthesize_intent_steps(analysis: &AnalysisResult) -> Vec<IntentStep> {
    let steps = &analysis.recording.steps;

    // 1. Indices covered by any pattern are off-limits for the raw pass.
    let mut consumed: HashSet<usize> = HashSet::new();
    for pattern in &analysis.patterns {
        consumed.extend(pattern.step_indices.iter().copied());
    }

    // 2. One intent step per pattern. Indices claimed by an earlier pattern
    //    are dropped from later ones so no index lands in two pattern-derived
    //    steps.
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut drafts: Vec<(usize, IntentStep)> = Vec::new();
    for pattern in &analysis.patterns {
        let sources: Vec<usize> = pattern
            .step_indices
            .iter()
            .copied()
            .filter(|i| !claimed.contains(i))
            .collect();
        if sources.is_empty() {
            continue;
        }
        claimed.extend(sources.iter().copied());
        // step_indices ascend, so the first surviving index is the minimum.
        let sort_key = sources[0];
        let step = intent_from_pattern(pattern, sources, steps);
        drafts.push((sort_key, step));
    }

    let has_switch = drafts
        .iter()
        .any(|(_, s)| s.intent == IntentType::SwitchNetwork);
    let has_connect = drafts
        .iter()
        .any(|(_, s)| s.intent == IntentType::ConnectWallet);

    // 3. Leftover raw steps, noise-filtered.
    for (i, step) in steps.iter().enumerate() {
        if consumed.contains(&i) {
            continue;
        }
        if let Some(raw) = intent_from_raw_step(i, step, has_switch, has_connect) {
            drafts.push((i, raw));
        }
    }

    // 4. Chronological order by minimum source index; the sort is stable so
    //    equal keys keep pattern-before-raw insertion order.
    drafts.sort_by_key(|(key, _)| *key);

    // 5-6. Synthetic prologue/epilogue and sequential ids.
    let mut plan = Vec::with_capacity(drafts.len() + 2);
    plan.push(start_step(analysis));
    plan.extend(drafts.into_iter().map(|(_, step)| step));
    if analysis.test_type == TestType::Connection {
        let mut verify = IntentStep::new(IntentType::VerifyState, "Verify the wallet is connected");
        verify.set("check", "wallet_connected");
        plan.push(verify);
    }
    for (i, step) in plan.iter_mut().enumerate() {
        step.id = i + 1;
    }
    plan
}

/// The mandatory leading navigate step.
fn start_step(analysis: &AnalysisResult) -> IntentStep {
    let mut step = match analysis.test_type {
        TestType::Connection => {
            let mut s = IntentStep::new(IntentType::Navigate, "Navigate to start URL");
            s.set("mode", "start");
            s
        }
        TestType::Flow => {
            let mut s = IntentStep::new(IntentType::Navigate, "Ensure page is at start URL");
            s.set("mode", "ensure");
            s
        }
    };
    step.set("url", analysis.recording.start_url.clone());
    step
}

/// Map one flow pattern to its intent step.
fn intent_from_pattern(pattern: &FlowPattern, sources: Vec<usize>, steps: &[Step]) -> IntentStep {
    match pattern.pattern_type {
        PatternType::WalletConnect => {
            let mut step = match pattern.metadata.get("wallet") {
                Some(wallet) => {
                    let mut s = IntentStep::new(
                        IntentType::ConnectWallet,
                        format!("Connect wallet via {}", wallet),
                    );
                    s.set("wallet", wallet.clone());
                    s
                }
                None => IntentStep::new(IntentType::ConnectWallet, "Connect wallet"),
            };
            let hints: Vec<&str> = sources
                .iter()
                .filter_map(|&i| steps[i].as_click())
                .filter_map(|c| c.label())
                .collect();
            if !hints.is_empty() {
                step.set("click_hints", hints.join("; "));
            }
            if let Some(click) = sources.iter().find_map(|&i| steps[i].as_click()) {
                if !click.selector.is_empty() {
                    step.set("selector", click.selector.clone());
                }
            }
            step.with_sources(sources)
        }
        PatternType::WalletSign => {
            let mut step = IntentStep::new(IntentType::SignMessage, "Sign message with the wallet");
            if let Some(method) = pattern.metadata.get("method") {
                step.set("method", method.clone());
            }
            step.with_sources(sources)
        }
        PatternType::NetworkSwitch => {
            let mut step = match pattern.metadata.get("chain_id") {
                Some(chain) => {
                    let mut s = IntentStep::new(
                        IntentType::SwitchNetwork,
                        format!("Switch network to chain {}", chain),
                    );
                    s.set("chain_id", chain.clone());
                    s
                }
                None => IntentStep::new(IntentType::SwitchNetwork, "Switch network"),
            };
            if let Some(source) = pattern.metadata.get("source") {
                step.set("source", source.clone());
            }
            step.with_sources(sources)
        }
        PatternType::TradeOpen | PatternType::TradeClose => {
            let action = if pattern.pattern_type == PatternType::TradeOpen {
                "trade_open"
            } else {
                "trade_close"
            };
            let verb = if pattern.pattern_type == PatternType::TradeOpen {
                "Execute trade"
            } else {
                "Close position"
            };
            let description = match pattern.metadata.get("trigger_text") {
                Some(text) => format!("{} via '{}' and confirm the transaction", verb, text),
                None => format!("{} and confirm the transaction", verb),
            };
            let mut step = IntentStep::new(IntentType::ConfirmTransaction, description);
            step.set("action", action);
            if let Some(text) = pattern.metadata.get("trigger_text") {
                step.set("trigger_text", text.clone());
            }
            step.with_sources(sources)
        }
        PatternType::WalletApprove => {
            let description = match pattern.metadata.get("trigger_text") {
                Some(text) => format!("Approve via '{}' and confirm the transaction", text),
                None => "Approve token spend and confirm the transaction".to_string(),
            };
            let mut step = IntentStep::new(IntentType::ConfirmTransaction, description);
            step.set("action", "approve");
            if let Some(text) = pattern.metadata.get("trigger_text") {
                step.set("trigger_text", text.clone());
            }
            step.with_sources(sources)
        }
        PatternType::FormFill => {
            // Recordings capture every keystroke; collapse repeated writes to
            // the same field, keeping only the last recorded value.
            let mut fields: Vec<(String, String)> = Vec::new();
            for &i in &sources {
                let Some(input) = steps[i].as_input() else {
                    continue;
                };
                let key = input
                    .field_key()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("field-{}", i));
                match fields.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, value)) => *value = input.value.clone(),
                    None => fields.push((key, input.value.clone())),
                }
            }
            let mut step = IntentStep::new(
                IntentType::FillForm,
                format!("Fill form with final values ({} field(s))", fields.len()),
            );
            for (key, value) in fields {
                step.set(&format!("field.{}", key), value);
            }
            step.with_sources(sources)
        }
        PatternType::Navigation => {
            let mut step = match pattern.metadata.get("url") {
                Some(url) => {
                    let mut s =
                        IntentStep::new(IntentType::Navigate, format!("Navigate to {}", url));
                    s.set("url", url.clone());
                    s
                }
                None => IntentStep::new(IntentType::Navigate, "Navigate"),
            };
            step.set("mode", "goto");
            step.with_sources(sources)
        }
    }
}

/// Map one uncovered raw step to an intent step, or filter it as noise.
fn intent_from_raw_step(
    index: usize,
    step: &Step,
    has_switch: bool,
    has_connect: bool,
) -> Option<IntentStep> {
    match &step.kind {
        // Scrolls never carry test intent.
        StepKind::Scroll(_) => None,
        StepKind::WalletCall(call) => {
            if call.is_polling() {
                return None;
            }
            if call.is_send_transaction() {
                let mut intent = IntentStep::new(
                    IntentType::ConfirmTransaction,
                    "Confirm the pending wallet transaction",
                );
                intent.set("action", "send_transaction");
                return Some(intent.with_sources(vec![index]));
            }
            None
        }
        StepKind::Click(click) => {
            // A stale switch/connect button click duplicates an instruction a
            // pattern already produced.
            if has_switch && click.text_matches(&NETWORK_SWITCH_PHRASES) {
                return None;
            }
            if has_connect && click.text_matches(&WALLET_SELECTION_PHRASES) {
                return None;
            }
            let description = match click.label() {
                Some(label) => format!("Click '{}'", label),
                None => format!("Click element {}", click.selector),
            };
            let mut intent = IntentStep::new(IntentType::ClickElement, description);
            if !click.selector.is_empty() {
                intent.set("selector", click.selector.clone());
            }
            if let Some(text) = &click.text {
                intent.set("text", text.clone());
            }
            if let Some(test_id) = &click.test_id {
                intent.set("test_id", test_id.clone());
            }
            Some(intent.with_sources(vec![index]))
        }
        StepKind::Input(input) => {
            let key = input
                .field_key()
                .map(str::to_string)
                .unwrap_or_else(|| format!("field-{}", index));
            let mut intent = IntentStep::new(
                IntentType::FillForm,
                format!("Fill '{}' with '{}'", key, input.value),
            );
            intent.set(&format!("field.{}", key), input.value.clone());
            Some(intent.with_sources(vec![index]))
        }
        StepKind::Navigation(nav) => {
            let mut intent =
                IntentStep::new(IntentType::Navigate, format!("Navigate to {}", nav.url));
            intent.set("url", nav.url.clone());
            intent.set("mode", "goto");
            Some(intent.with_sources(vec![index]))
        }
    }
}
