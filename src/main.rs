//! dApp Analyzer CLI
//!
//! Turns recorded dApp interactions into analysis results, intent plans and
//! clarification questions.

use dapp_analyzer::analysis::{AnalyzerConfig, RecordingAnalyzer};
use dapp_analyzer::app::cli::{Cli, Commands, ConfigAction};
use dapp_analyzer::app::config::Config;
use dapp_analyzer::clarification::ClarificationDetector;
use dapp_analyzer::recording::Recording;
use dapp_analyzer::synthesis::synthesize_intent_steps;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Analyze {
            input,
            output,
            no_clarifications,
        } => {
            run_analyze(&input, output, no_clarifications, &config)?;
        }
        Commands::Validate { input } => {
            run_validate(&input)?;
        }
        Commands::Init { force } => {
            run_init(force)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_analyze(
    input: &Path,
    output: Option<PathBuf>,
    no_clarifications: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let recording = Recording::load(input)?;
    info!(
        name = %recording.metadata.name,
        steps = recording.len(),
        "loaded recording"
    );

    let analyzer = RecordingAnalyzer::with_config(AnalyzerConfig {
        default_chain_id: config.analysis.default_chain_id,
        min_pattern_confidence: config.analysis.min_pattern_confidence,
    });
    let analysis = analyzer.analyze(&recording);
    let plan = synthesize_intent_steps(&analysis);

    for warning in &analysis.warnings {
        warn!("{}", warning);
    }

    let out_dir = output.unwrap_or_else(|| {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    std::fs::create_dir_all(&out_dir)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording");

    write_json(&out_dir.join(format!("{}.analysis.json", stem)), &analysis, config)?;
    write_json(&out_dir.join(format!("{}.intents.json", stem)), &plan, config)?;

    if !no_clarifications && config.output.emit_clarifications {
        let detector = ClarificationDetector {
            wait_gap_ms: config.clarification.wait_gap_ms,
            default_chain_id: config.analysis.default_chain_id,
            test_wallet: config.clarification.test_wallet.clone(),
        };
        let questions = detector.detect(&analysis);
        write_json(
            &out_dir.join(format!("{}.clarifications.json", stem)),
            &questions,
            config,
        )?;
        info!(questions = questions.len(), "clarification pass complete");
    }

    info!(
        patterns = analysis.patterns.len(),
        intent_steps = plan.len(),
        test_type = analysis.test_type.as_str(),
        connection = analysis.connection_pattern.as_str(),
        "analysis written to {}",
        out_dir.display()
    );
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, config: &Config) -> anyhow::Result<()> {
    let json = if config.output.pretty_json {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, json)?;
    Ok(())
}

fn run_validate(input: &Path) -> anyhow::Result<()> {
    let recording = Recording::load(input)?;

    println!("name:         {}", recording.metadata.name);
    println!("start url:    {}", recording.start_url);
    println!("steps:        {}", recording.len());
    println!("clicks:       {}", recording.click_steps().len());
    println!("inputs:       {}", recording.input_steps().len());
    println!("wallet calls: {}", recording.wallet_calls().len());
    println!("connected:    {}", recording.wallet_connected);

    if recording.is_empty() {
        warn!("recording contains no steps");
    }
    if !recording.timestamps_monotonic() {
        warn!("timestamps are not monotonically non-decreasing");
    }
    Ok(())
}

fn run_init(force: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(Config::DEFAULT_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "config file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(&path)?;
    info!("wrote default config to {}", path.display());
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}
