//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// PartnerMiner - Instagram partner scouting from the terminal
///
/// Pulls a profile's latest posts through a scraping provider, computes
/// engagement metrics over the last 30 days, and asks an LLM for a
/// group-buy authenticity check plus a ready-to-send outreach proposal.
///
/// Examples:
///   partnerminer cozcoz.sleep --knowledge-base proposal.md
///   partnerminer @cozcoz.sleep --knowledge-base proposal.md --format json
///   partnerminer cozcoz.sleep --metrics-only
///   partnerminer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Instagram username to analyze (a leading @ is ignored)
    #[arg(value_name = "USERNAME", required_unless_present = "init_config")]
    pub username: Option<String>,

    /// Product / proposal guideline document (Markdown or plain text)
    ///
    /// Embedded verbatim in the LLM prompt. Not needed with --metrics-only.
    #[arg(short, long, value_name = "FILE")]
    pub knowledge_base: Option<PathBuf>,

    /// Apify API token
    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    pub apify_token: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model to use
    ///
    /// Can also be set via PARTNERMINER_MODEL env var or .partnerminer.toml config.
    #[arg(short, long, env = "PARTNERMINER_MODEL")]
    pub model: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds, applied to both the scraper and the LLM
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .partnerminer.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Only scrape and compute metrics; skip the LLM call
    #[arg(long)]
    pub metrics_only: bool,

    /// Generate a default .partnerminer.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension used for the default output path.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The username without a leading `@` or surrounding whitespace.
    pub fn normalized_username(&self) -> String {
        self.username
            .as_deref()
            .unwrap_or("")
            .trim()
            .trim_start_matches('@')
            .to_string()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let username = self.normalized_username();
        if username.is_empty() {
            return Err("Username must not be empty".to_string());
        }
        if username.chars().any(char::is_whitespace) {
            return Err(format!("Invalid username: '{}'", username));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref path) = self.knowledge_base {
            if !path.is_file() {
                return Err(format!(
                    "Knowledge base file does not exist: {}",
                    path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            username: Some("cozcoz.sleep".to_string()),
            knowledge_base: None,
            apify_token: None,
            gemini_api_key: None,
            model: None,
            output: None,
            format: OutputFormat::Markdown,
            temperature: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            metrics_only: false,
            init_config: false,
        }
    }

    #[test]
    fn test_normalized_username() {
        let mut args = make_args();
        args.username = Some("  @cozcoz.sleep ".to_string());
        assert_eq!(args.normalized_username(), "cozcoz.sleep");
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_bad_username() {
        let mut args = make_args();
        args.username = Some("@".to_string());
        assert!(args.validate().is_err());

        args.username = Some("two words".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature() {
        let mut args = make_args();
        args.temperature = Some(2.5);
        assert!(args.validate().is_err());

        args.temperature = Some(1.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_knowledge_base() {
        let mut args = make_args();
        args.knowledge_base = Some(PathBuf::from("/definitely/not/here.md"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.username = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "partnerminer",
            "@cozcoz.sleep",
            "--metrics-only",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.normalized_username(), "cozcoz.sleep");
        assert!(args.metrics_only);
        assert_eq!(args.format, OutputFormat::Json);
    }
}
