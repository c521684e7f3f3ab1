//! PartnerMiner - Instagram partner scouting CLI
//!
//! Scrapes a profile through a scraping provider, aggregates engagement
//! metrics over recent posts, and asks Gemini for a group-buy authenticity
//! check and an outreach proposal grounded in a product knowledge base.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing key, scrape failure, LLM failure, etc.)

mod analysis;
mod cli;
mod config;
mod llm;
mod models;
mod report;
mod scraper;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{AnalysisConfig, Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{MetricsSummary, Report, ReportMetadata};
use report::generator::format_thousands;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

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

    info!("PartnerMiner v{}", env!("CARGO_PKG_VERSION"));
    debug!("Username: {:?}, metrics only: {}", args.username, args.metrics_only);

    if let Err(e) = run_analysis(args).await {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .partnerminer.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the knowledge base path, model, and timeouts.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete scrape → aggregate → assess → report workflow.
async fn run_analysis(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let analysis = config.analysis_config(&args, Utc::now())?;
    let show_progress = !args.quiet;

    // Step 1: Scrape the profile
    let source = scraper::build_source(&analysis.source)?;
    println!("📥 Fetching @{} via {}...", analysis.username, source.name());

    let spinner = start_spinner(show_progress, "Scanning profile (actor runs can take a minute)");
    let fetched = source.fetch_profile(&analysis.username).await;
    finish_spinner(spinner);
    let profile = fetched?;

    if profile.posts.is_empty() {
        warn!("@{} returned no posts; metrics will be zero", analysis.username);
    }

    // Step 2: Aggregate engagement metrics
    let metrics = analysis::aggregate_profile(&profile, analysis.now);
    print_metrics(&metrics);

    // Step 3: Ask the model for the assessment
    let (assessment, model_used) = match analysis.gemini {
        Some(ref gemini_config) => {
            println!("\n🧠 Asking {} for an assessment...", gemini_config.model_name);
            let client = llm::GeminiClient::new(gemini_config.clone())?;

            let spinner = start_spinner(
                show_progress,
                "Reading the knowledge base and drafting a proposal",
            );
            let assessed = client.assess(&metrics, &analysis.knowledge_base).await;
            finish_spinner(spinner);

            (Some(assessed?), Some(client.model_name().to_string()))
        }
        None => {
            println!("\n⏭️  Metrics only: skipping the LLM assessment.");
            (None, None)
        }
    };

    // Step 4: Build and save the report
    println!("\n📝 Generating report...");

    let report = Report {
        metadata: ReportMetadata {
            username: analysis.username.clone(),
            analysis_date: analysis.now,
            source: source.name().to_string(),
            model_used,
            posts_fetched: profile.posts.len(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        metrics,
        assessment,
    };

    write_report(&report, &analysis)?;

    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        analysis.output.display()
    );
    if let Some(ref assessment) = report.assessment {
        println!("   📞 Contact: {}", assessment.contact);
    }

    Ok(())
}

/// Render the report in the requested format and write it to disk.
fn write_report(report: &Report, analysis: &AnalysisConfig) -> Result<()> {
    let output = match analysis.format {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => report::generate_markdown_report(report),
    };

    std::fs::write(&analysis.output, &output)
        .with_context(|| format!("Failed to write report to {}", analysis.output.display()))?;

    info!("Wrote {} bytes to {}", output.len(), analysis.output.display());
    Ok(())
}

/// Print the metric tiles to the terminal.
fn print_metrics(metrics: &MetricsSummary) {
    println!("\n📊 Basic Health (last 30 days):");
    println!("   Followers: {}", format_thousands(metrics.follower_count));
    println!("   Posts in sample: {}", metrics.recent_post_count);
    println!(
        "   🎬 Avg reel views: {}",
        format_thousands(metrics.average_video_views)
    );
    println!("   Avg likes: {}", format_thousands(metrics.average_likes));
    println!(
        "   Avg comments: {}",
        format_thousands(metrics.average_comments)
    );
}

fn start_spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
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
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
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
