//! Clarification Detection
//!
//! A second heuristic pass over the analysis result that raises open
//! questions for a human reviewer when automatic inference is unsafe. The
//! pass is read-only and purely advisory; the pipeline completes without it.

use crate::analysis::{AnalysisResult, PatternType};
use crate::recording::types::{ClickStep, Step, StepKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bare generic tags that match far too many elements
static GENERIC_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(div|span|button|a|p|li)$").expect("valid regex"));

/// nth-child on a generic tag
static NTH_CHILD_GENERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(div|span|li)(\.[\w-]+)?:nth-child\(\d+\)").expect("valid regex")
});

/// Three-deep generic div chains
static DIV_CHAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"div\s*>\s*div\s*>\s*div").expect("valid regex"));

/// Generated CSS-in-JS class-name shapes (emotion, styled-components,
/// CSS modules, styled-jsx)
static CSS_IN_JS_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\.css-[a-z0-9]+").expect("valid regex"),
        Regex::new(r"\.sc-[A-Za-z0-9-]+").expect("valid regex"),
        Regex::new(r"\.[A-Za-z]\w*_[A-Za-z]\w*__[A-Za-z0-9]{5,}").expect("valid regex"),
        Regex::new(r"\.jsx-\d+").expect("valid regex"),
    ]
});

/// Wallet names a click can refer to
const KNOWN_WALLETS: [&str; 6] = ["metamask", "rabby", "coinbase", "phantom", "trust", "okx"];

/// Question category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Selector,
    Wait,
    Network,
    Action,
    General,
}

impl QuestionCategory {
    /// Stable lowercase name, matching the serialized tag
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Selector => "selector",
            QuestionCategory::Wait => "wait",
            QuestionCategory::Network => "network",
            QuestionCategory::Action => "action",
            QuestionCategory::General => "general",
        }
    }
}

/// A flagged ambiguity requiring human input before automated code
/// generation can proceed confidently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    /// Deterministic id (`<category>-<ordinal>`)
    pub id: String,
    /// Question category
    pub category: QuestionCategory,
    /// The question text
    pub question: String,
    /// Where in the recording the ambiguity was found
    pub context: String,
    /// Source step index, when the question is step-specific
    pub step_index: Option<usize>,
    /// Multiple-choice options, when applicable
    pub options: Option<Vec<String>>,
    /// Suggested default answer, when one can be inferred
    pub default_answer: Option<String>,
}

impl ClarificationQuestion {
    fn new(category: QuestionCategory, question: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            category,
            question: question.into(),
            context: String::new(),
            step_index: None,
            options: None,
            default_answer: None,
        }
    }
}

/// Runs the four clarification passes over an analysis result.
#[derive(Debug, Clone)]
pub struct ClarificationDetector {
    /// Timestamp gap between adjacent steps that triggers a wait question (ms)
    pub wait_gap_ms: u64,
    /// Chain id considered the default environment
    pub default_chain_id: u64,
    /// Wallet the generated test runs with
    pub test_wallet: String,
}

impl ClarificationDetector {
    /// Create with default thresholds
    pub fn new() -> Self {
        Self {
            wait_gap_ms: 5_000,
            default_chain_id: 1,
            test_wallet: "metamask".to_string(),
        }
    }

    /// Detect ambiguities. Emitting zero questions is a normal outcome.
    pub fn detect(&self, analysis: &AnalysisResult) -> Vec<ClarificationQuestion> {
        let steps = &analysis.recording.steps;
        let mut questions = Vec::new();

        self.detect_selector_ambiguity(steps, &mut questions);
        self.detect_wait_ambiguity(steps, &mut questions);
        self.detect_network_ambiguity(analysis, &mut questions);
        self.detect_action_ambiguity(analysis, &mut questions);

        assign_ids(&mut questions);
        questions
    }

    /// Flag clicks whose recorded selector is generic or looks like a
    /// generated CSS-in-JS class.
    fn detect_selector_ambiguity(&self, steps: &[Step], out: &mut Vec<ClarificationQuestion>) {
        for (i, step) in steps.iter().enumerate() {
            let StepKind::Click(click) = &step.kind else {
                continue;
            };
            let selector = click.selector.as_str();
            if selector.is_empty() {
                continue;
            }

            let generic = GENERIC_TAG_RE.is_match(selector)
                || NTH_CHILD_GENERIC_RE.is_match(selector)
                || DIV_CHAIN_RE.is_match(selector);
            let generated = CSS_IN_JS_RES.iter().any(|re| re.is_match(selector));
            if !generic && !generated {
                continue;
            }

            let question_text = if generic {
                format!(
                    "The selector '{}' is generic and may match multiple elements. \
                     Which selection strategy should the test use?",
                    selector
                )
            } else {
                format!(
                    "The selector '{}' looks like a generated CSS-in-JS class and may \
                     change between builds. Which selection strategy should the test use?",
                    selector
                )
            };

            let mut question = ClarificationQuestion::new(QuestionCategory::Selector, question_text);
            question.context = format!("click step {} on selector '{}'", i, selector);
            question.step_index = Some(i);
            let (options, default_answer) = selector_options(click);
            question.options = Some(options);
            question.default_answer = default_answer;
            out.push(question);
        }
    }

    /// Flag long pauses between adjacent steps and every transaction
    /// submission.
    fn detect_wait_ambiguity(&self, steps: &[Step], out: &mut Vec<ClarificationQuestion>) {
        for i in 1..steps.len() {
            let gap = steps[i].timestamp.saturating_sub(steps[i - 1].timestamp);
            if gap <= self.wait_gap_ms {
                continue;
            }
            let mut question = ClarificationQuestion::new(
                QuestionCategory::Wait,
                format!(
                    "Steps {} and {} are {:.1}s apart. What condition should the test \
                     wait on before continuing?",
                    i - 1,
                    i,
                    gap as f64 / 1000.0
                ),
            );
            question.context = format!("{}ms gap before step {}", gap, i);
            question.step_index = Some(i);
            question.options = Some(vec![
                "wait for a specific element to appear".to_string(),
                "wait for network idle".to_string(),
                "fixed timeout".to_string(),
                "no explicit wait".to_string(),
            ]);
            out.push(question);
        }

        for (i, step) in steps.iter().enumerate() {
            let is_send = step
                .as_wallet_call()
                .map(|c| c.is_send_transaction())
                .unwrap_or(false);
            if !is_send {
                continue;
            }
            let mut question = ClarificationQuestion::new(
                QuestionCategory::Wait,
                "How should the test wait for transaction confirmation?",
            );
            question.context = format!("eth_sendTransaction at step {}", i);
            question.step_index = Some(i);
            question.options = Some(vec![
                "wait for the transaction receipt".to_string(),
                "wait for a UI confirmation state".to_string(),
                "fixed timeout".to_string(),
            ]);
            question.default_answer = Some("wait for the transaction receipt".to_string());
            out.push(question);
        }
    }

    /// One recording-level question when a non-default chain id was detected.
    fn detect_network_ambiguity(
        &self,
        analysis: &AnalysisResult,
        out: &mut Vec<ClarificationQuestion>,
    ) {
        let Some(chain) = analysis.chain_id else {
            return;
        };
        if chain == self.default_chain_id {
            return;
        }
        let mut question = ClarificationQuestion::new(
            QuestionCategory::Network,
            format!(
                "The recording targets chain id {}. How should the test set up the network?",
                chain
            ),
        );
        question.context = format!("detected chain id {}", chain);
        question.options = Some(vec![
            format!("preconfigure the wallet with chain {}", chain),
            "let the dApp prompt for the network switch".to_string(),
            "fork the network locally".to_string(),
        ]);
        question.default_answer = Some(format!("preconfigure the wallet with chain {}", chain));
        out.push(question);
    }

    /// Flag clicks naming a wallet other than the test wallet, and every
    /// approval pattern.
    fn detect_action_ambiguity(
        &self,
        analysis: &AnalysisResult,
        out: &mut Vec<ClarificationQuestion>,
    ) {
        for (i, step) in analysis.recording.steps.iter().enumerate() {
            let StepKind::Click(click) = &step.kind else {
                continue;
            };
            let text = click.text_lower();
            let Some(named) = KNOWN_WALLETS
                .iter()
                .copied()
                .find(|w| text.contains(w) && *w != self.test_wallet)
            else {
                continue;
            };
            let mut question = ClarificationQuestion::new(
                QuestionCategory::Action,
                format!(
                    "The recording clicks '{}' but the test wallet is '{}'. Which wallet \
                     should the generated test use?",
                    click.text.as_deref().unwrap_or(named),
                    self.test_wallet
                ),
            );
            question.context = format!("wallet selection click at step {}", i);
            question.step_index = Some(i);
            question.options = Some(vec![named.to_string(), self.test_wallet.clone()]);
            question.default_answer = Some(self.test_wallet.clone());
            out.push(question);
        }

        for pattern in &analysis.patterns {
            if pattern.pattern_type != PatternType::WalletApprove {
                continue;
            }
            let mut question = ClarificationQuestion::new(
                QuestionCategory::Action,
                "The recording approves a token spend. What approval amount should the test use?",
            );
            question.context = format!("approval pattern at steps {}-{}", pattern.start_index, pattern.end_index);
            question.step_index = Some(pattern.start_index);
            question.options = Some(vec![
                "the exact amount from the recording".to_string(),
                "unlimited approval".to_string(),
            ]);
            question.default_answer = Some("the exact amount from the recording".to_string());
            out.push(question);
        }
    }
}

impl Default for ClarificationDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Selector-strategy options for a flagged click, with the default
/// preferring a discovered test id, then visible text.
fn selector_options(click: &ClickStep) -> (Vec<String>, Option<String>) {
    let mut options = Vec::new();
    let mut default_answer = None;

    if let Some(test_id) = &click.test_id {
        let option = format!("use test id '{}'", test_id);
        default_answer = Some(option.clone());
        options.push(option);
    }
    if let Some(text) = &click.text {
        let option = format!("match visible text '{}'", text);
        if default_answer.is_none() {
            default_answer = Some(option.clone());
        }
        options.push(option);
    }
    if let Some(aria) = &click.aria_label {
        options.push(format!("use ARIA label '{}'", aria));
    }
    options.push(format!("keep recorded selector '{}'", click.selector));

    (options, default_answer)
}

/// Assign deterministic per-category ordinal ids.
fn assign_ids(questions: &mut [ClarificationQuestion]) {
    let mut counters: std::collections::BTreeMap<&'static str, usize> =
        std::collections::BTreeMap::new();
    for question in questions {
        let counter = counters.entry(question.category.as_str()).or_insert(0);
        *counter += 1;
        question.id = format!("{}-{}", question.category.as_str(), counter);
    }
}
