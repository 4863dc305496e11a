use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use compliance_tracker::{
    attention_items, create_command_span, generate_correlation_id, init_telemetry, score_institution,
    visual_tier, ComplianceScore, FrameworkMode, InstitutionScorecard, LoadReport,
    TrackerConfig, WorkflowSnapshot, WorkflowStatus,
};

#[derive(Parser)]
#[command(name = "compliance-tracker")]
#[command(about = "Internal-control compliance tracking for COSO and INTOSAI frameworks")]
#[command(long_about = "Tracks compliance workflows for the five internal-control components, \
                       derives traffic-light classifications and rolls workflow progress up \
                       into component and institution-wide compliance scores.")]
struct Cli {
    /// Configuration file (defaults to ./compliance-tracker.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the control components under the active vocabulary
    Components {
        /// Framework mode: coso, intosai or dual
        #[arg(long)]
        mode: Option<FrameworkMode>,
    },
    /// Classify a status/progress pair into its traffic light
    Classify {
        /// Workflow status, e.g. in_progress
        #[arg(long)]
        status: String,
        /// Progress percentage
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        progress: u8,
    },
    /// Compute component and overall compliance scores for one institution
    Score {
        /// Workflow snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Institution to score
        #[arg(long)]
        institution: String,
        /// Framework mode: coso, intosai or dual
        #[arg(long)]
        mode: Option<FrameworkMode>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List workflows that are at risk, stalled near completion or overdue
    Attention {
        /// Workflow snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Institution to inspect
        #[arg(long)]
        institution: String,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validate every record in a snapshot
    Validate {
        /// Workflow snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Write the default configuration as TOML
    InitConfig {
        /// Destination file
        #[arg(long, default_value = "compliance-tracker.toml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = TrackerConfig::load_env_file();
    let config = TrackerConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let correlation_id = generate_correlation_id();

    match cli.command {
        Commands::Components { mode } => {
            let _span = create_command_span("components", None, &correlation_id).entered();
            components_command(&config, mode)
        }
        Commands::Classify { status, progress } => {
            let _span = create_command_span("classify", None, &correlation_id).entered();
            classify_command(&config, &status, progress)
        }
        Commands::Score { snapshot, institution, mode, format } => {
            let _span = create_command_span("score", Some(&institution), &correlation_id).entered();
            score_command(&config, &snapshot, &institution, mode, format)
        }
        Commands::Attention { snapshot, institution, today, format } => {
            let _span = create_command_span("attention", Some(&institution), &correlation_id).entered();
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            attention_command(&config, &snapshot, &institution, today, format)
        }
        Commands::Validate { snapshot } => {
            let _span = create_command_span("validate", None, &correlation_id).entered();
            validate_command(&config, &snapshot)
        }
        Commands::InitConfig { output, force } => {
            let _span = create_command_span("init-config", None, &correlation_id).entered();
            init_config_command(&output, force)
        }
    }
}

fn components_command(config: &TrackerConfig, mode: Option<FrameworkMode>) -> Result<()> {
    let resolver = config.resolver(mode)?;

    println!("{} components ({} mode)", resolver.score_heading(), resolver.mode());
    println!();
    for component in resolver.active_components() {
        println!("{}  [{}]", resolver.display_name(*component), component);
        for display in resolver.labels(*component) {
            println!("   {}: {}", display.standard, display.description);
        }
        println!(
            "   Template: {} steps",
            config.templates.expected_count(*component)
        );
    }
    Ok(())
}

fn classify_command(config: &TrackerConfig, status: &str, progress: u8) -> Result<()> {
    let status: WorkflowStatus = status.parse()?;
    let tier = visual_tier(status, progress, config.classification.stalled_threshold);

    println!("classification: {}", tier.traffic_light());
    println!("visual tier: {tier}");
    Ok(())
}

fn load_workflows(config: &TrackerConfig, snapshot: &Path) -> Result<LoadReport> {
    let report = WorkflowSnapshot::load(snapshot)?.materialize(&config.templates);
    if !report.is_clean() {
        warn!(
            rejected = report.rejected.len(),
            "Some workflow records were rejected and are excluded from results"
        );
    }
    Ok(report)
}

fn score_command(
    config: &TrackerConfig,
    snapshot: &Path,
    institution: &str,
    mode: Option<FrameworkMode>,
    format: OutputFormat,
) -> Result<()> {
    let resolver = config.resolver(mode)?;
    let report = load_workflows(config, snapshot)?;
    let scorecard = score_institution(institution, &report.workflows, &resolver);

    info!(
        institution = institution,
        overall = scorecard.overall.score,
        classification = %scorecard.overall.classification,
        "Institution scored"
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scorecard)?),
        OutputFormat::Text => print_scorecard(&scorecard),
    }
    Ok(())
}

fn print_scorecard(scorecard: &InstitutionScorecard) {
    println!("📊 {} - institution {}", scorecard.heading, scorecard.institution_id);
    println!();
    for view in &scorecard.components {
        print_score_line(&view.display_name, &view.score);
    }
    println!();
    print_score_line("Overall", &scorecard.overall);
}

fn print_score_line(label: &str, score: &ComplianceScore) {
    println!(
        "  {:<40} {:>3}%  {:<12} ({} workflows)",
        label, score.score, score.classification.as_str(), score.contributing_workflows
    );
}

fn attention_command(
    config: &TrackerConfig,
    snapshot: &Path,
    institution: &str,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<()> {
    let report = load_workflows(config, snapshot)?;
    let owned: Vec<_> = report
        .workflows
        .into_iter()
        .filter(|workflow| workflow.institution_id == institution)
        .collect();
    let items = attention_items(&owned, today, config.classification.stalled_threshold);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("✅ Nothing needs attention for institution {institution}");
            }
            for item in &items {
                println!(
                    "⚠️  {} [{}] {} at {}%",
                    item.name,
                    item.component,
                    item.status,
                    item.progress
                );
                for reason in &item.reasons {
                    println!("   → {}", serde_json::to_string(reason)?);
                }
            }
        }
    }
    Ok(())
}

fn validate_command(config: &TrackerConfig, snapshot: &Path) -> Result<()> {
    let report = load_workflows(config, snapshot)?;

    println!("Valid workflows: {}", report.workflows.len());
    for mismatch in &report.mismatches {
        println!(
            "  ⚠️  {}: {} steps, template for {} expects {}",
            mismatch.workflow_id, mismatch.actual, mismatch.component, mismatch.expected
        );
    }
    for rejected in &report.rejected {
        println!("  ❌ {}: {}", rejected.workflow_id, rejected.error);
    }

    if !report.is_clean() {
        bail!("{} workflow record(s) rejected", report.rejected.len());
    }
    Ok(())
}

fn init_config_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    TrackerConfig::default()
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote configuration to {}", output.display());
    Ok(())
}
