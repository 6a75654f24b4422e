//! RevuPanel - AI analyst panel for VR game review footage
//!
//! A CLI tool that runs three LLM analysts (game, review quality,
//! audience growth) over one review recording, aggregates their
//! opinions into a single verdict, and saves the analysis.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, validation failure, etc.)
//!   2 - Verdict below the --fail-below threshold

mod analysis;
mod budget;
mod cli;
mod config;
mod coordinator;
mod models;
mod producer;
mod report;
mod store;

use analysis::AggregationSettings;
use anyhow::{Context, Result};
use budget::BudgetLedger;
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use coordinator::PanelCoordinator;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisMetadata, AnalysisRecord, GameMetadata, ProducerKind, ReviewRequest};
use producer::LlmClient;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use store::AnalysisStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("RevuPanel v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .revupanel.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".revupanel.toml");

    if path.exists() {
        eprintln!("⚠️  .revupanel.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .revupanel.toml")?;

    println!("✅ Created .revupanel.toml with default settings.");
    println!("   Edit it to customize model, budgets, weights, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.aggregation.validate()?;

    let store = AnalysisStore::new(&config.general.results_dir);

    // Handle --history: list stored analyses and exit
    if args.history {
        return handle_history(&store);
    }

    // Step 1: Build the request context
    let request = build_request(&args);

    // Handle --dry-run: print prompts and exit
    if args.dry_run {
        return handle_dry_run(&request);
    }

    // Step 2: Initialize the panel
    println!("🤖 Initializing analyst panel...");
    println!("   Model: {}", config.model.name);
    println!("   Endpoint: {}", config.model.api_url);
    println!("   Panel deadline: {}s", config.model.group_timeout_seconds);
    println!(
        "   Review budget: ${:.2}",
        config.budget.review_total
    );

    let ledger = BudgetLedger::new(
        config.budget.game_limit,
        config.budget.quality_limit,
        config.budget.growth_limit,
        config.budget.review_total,
    )?;

    let backend = LlmClient::new(
        &config.model.api_url,
        &config.model.name,
        config.model.timeout_seconds,
    );

    let mut coordinator = PanelCoordinator::new(
        backend,
        ledger,
        AggregationSettings::from(&config.aggregation),
        Duration::from_secs(config.model.group_timeout_seconds),
    );

    // Step 3: Run the panel
    println!(
        "\n🔬 Consulting the panel about '{}'...\n",
        request.game.name
    );
    let spinner = make_spinner(args.quiet);
    let aggregate = coordinator.process_review(&request).await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    // Step 4: Build the analysis record
    let duration = start_time.elapsed().as_secs_f64();
    let record = AnalysisRecord {
        metadata: AnalysisMetadata {
            video_reference: request.video_reference.clone(),
            game: request.game.clone(),
            analysis_date: Utc::now(),
            model_used: config.model.name.clone(),
            duration_seconds: duration,
        },
        aggregate,
    };

    // Step 5: Generate and save the report
    println!("📝 Generating report...");

    let output_path = PathBuf::from(&config.general.output);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&record)?,
        OutputFormat::Markdown => report::generate_markdown_report(&record, &config.report),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Step 6: Persist the analysis record (best-effort)
    if !args.no_save {
        match store.save(&record) {
            Ok(path) => info!("Analysis record saved to {}", path.display()),
            Err(e) => warn!("Failed to persist analysis record: {}", e),
        }
    }

    // Print summary
    let aggregate = &record.aggregate;
    println!("\n📊 Panel Summary:");
    println!(
        "   Verdict: {} {}",
        aggregate.recommended_action.emoji(),
        aggregate.recommended_action
    );
    println!("   Weighted score: {:.2} / 10", aggregate.weighted_score);
    println!(
        "   Confidence: {:.0}% | Agreement: {:.0}%",
        aggregate.confidence_level * 100.0,
        aggregate.agreement.overall * 100.0
    );
    if aggregate.metrics.fallback_seats > 0 {
        println!(
            "   ⚠️  Fallback seats: {} of {}",
            aggregate.metrics.fallback_seats,
            aggregate.seats.len()
        );
    }
    println!(
        "   Cost: ${:.3} ({:.0}% of budget)",
        aggregate.cost.total,
        aggregate.metrics.budget_utilization * 100.0
    );
    for warning in coordinator.ledger().warnings() {
        println!("   ⚠️  {}", warning);
    }
    println!("   Duration: {:.1}s", duration);
    debug!("Session metrics: {:?}", coordinator.session_metrics());
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-below threshold
    if let Some(threshold) = args.fail_below {
        if aggregate.weighted_score < threshold {
            eprintln!(
                "\n⛔ Weighted score {:.2} is below {:.1}. Failing (exit code 2).",
                aggregate.weighted_score, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Build the per-request context from CLI arguments.
fn build_request(args: &Args) -> ReviewRequest {
    ReviewRequest {
        video_reference: args
            .video
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        game: GameMetadata {
            name: args.game.clone().unwrap_or_default(),
            genre: args.genre.clone(),
            platform: args.platform.clone(),
            price: args.price,
            target_audience: args.audience.clone(),
        },
    }
}

/// Handle --dry-run: print the analyst prompts, exit.
fn handle_dry_run(request: &ReviewRequest) -> Result<i32> {
    println!("\n🔍 Dry run: building analyst prompts (no model calls)...\n");

    for kind in ProducerKind::all() {
        let (system, user) = producer::prompts::build(kind, request);
        println!("=== {} ===\n", kind);
        println!("[system]\n{}\n", system);
        println!("[user]\n{}\n", user);
    }

    println!("✅ Dry run complete. No model calls were made.");
    Ok(0)
}

/// Handle --history: list stored analyses, exit.
fn handle_history(store: &AnalysisStore) -> Result<i32> {
    let summaries = store.list()?;

    if summaries.is_empty() {
        println!(
            "No stored analyses in {}.",
            store.results_dir().display()
        );
        return Ok(0);
    }

    println!("\n📚 Stored analyses ({}):\n", summaries.len());
    for summary in &summaries {
        println!(
            "   {}  {:>5.2}  {} {}  ({})",
            summary.analysis_date.format("%Y-%m-%d %H:%M"),
            summary.weighted_score,
            summary.recommended_action.emoji(),
            summary.recommended_action,
            summary.id
        );
    }

    Ok(0)
}

/// Spinner shown while the panel is in flight.
fn make_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Waiting for the analyst panel...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .revupanel.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
