//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// RevuPanel - LLM analyst panel for VR game review footage
///
/// Run a panel of three AI analysts (game, review quality, audience
/// growth) over one review recording, aggregate their opinions into a
/// single verdict, and save the analysis. Markdown/JSON reports.
///
/// Examples:
///   revupanel --video footage.mp4 --game "Beat Blade" --genre rhythm
///   revupanel --video footage.mp4 --game "Beat Blade" --model qwen2.5:14b --format json
///   revupanel --video footage.mp4 --game "Beat Blade" --dry-run
///   revupanel --history
///   revupanel --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the review footage to analyze
    ///
    /// Not required when using --init-config or --history.
    #[arg(
        long,
        value_name = "FILE",
        required_unless_present_any = ["init_config", "history"]
    )]
    pub video: Option<PathBuf>,

    /// Name of the reviewed game
    #[arg(
        short,
        long,
        value_name = "NAME",
        required_unless_present_any = ["init_config", "history"]
    )]
    pub game: Option<String>,

    /// Genre of the reviewed game
    #[arg(long, default_value = "unknown", value_name = "GENRE")]
    pub genre: String,

    /// Platform the game runs on
    #[arg(long, default_value = "VR", value_name = "PLATFORM")]
    pub platform: String,

    /// Price of the game in USD
    #[arg(long, value_name = "USD")]
    pub price: Option<f64>,

    /// Intended audience for the game
    #[arg(long, value_name = "AUDIENCE")]
    pub audience: Option<String>,

    /// Model to use for the analyst panel
    ///
    /// Can also be set via REVUPANEL_MODEL env var or .revupanel.toml config.
    #[arg(short, long, default_value = "llama3.2:latest", env = "REVUPANEL_MODEL")]
    pub model: String,

    /// Ollama-compatible API endpoint URL
    #[arg(long, default_value = "http://localhost:11434", env = "OLLAMA_URL")]
    pub api_url: String,

    /// Output file path for the report
    ///
    /// Defaults to revupanel_report.md (or the config file setting).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory where analysis records are stored
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .revupanel.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Per-call request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for the whole panel in seconds
    ///
    /// When it elapses, in-flight analyst calls are cancelled and an
    /// emergency verdict is returned.
    #[arg(long, value_name = "SECS")]
    pub group_timeout: Option<u64>,

    /// Fail if the weighted score falls below this value
    ///
    /// Useful for scripted pipelines. Exit code 2 when the verdict is
    /// below the threshold. Range: 1-10.
    #[arg(long, value_name = "SCORE")]
    pub fail_below: Option<f64>,

    /// Skip persisting the analysis record
    #[arg(long)]
    pub no_save: bool,

    /// Dry run: print the analyst prompts without calling the model
    #[arg(long)]
    pub dry_run: bool,

    /// List previously stored analyses and exit
    #[arg(long)]
    pub history: bool,

    /// Generate a default .revupanel.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
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

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for modes that never touch the panel
        if self.init_config || self.history {
            return Ok(());
        }

        // Validate API URL format (not needed for dry-run)
        if !self.dry_run
            && !self.api_url.starts_with("http://")
            && !self.api_url.starts_with("https://")
        {
            return Err("API URL must start with 'http://' or 'https://'".to_string());
        }

        // Validate the footage path
        if let Some(ref video) = self.video {
            if !video.exists() {
                return Err(format!("Video file does not exist: {}", video.display()));
            }
            if !video.is_file() {
                return Err(format!("Video path is not a file: {}", video.display()));
            }
        }

        // Validate price
        if let Some(price) = self.price {
            if price < 0.0 {
                return Err("Price cannot be negative".to_string());
            }
        }

        // Validate fail-below threshold
        if let Some(threshold) = self.fail_below {
            if !(1.0..=10.0).contains(&threshold) {
                return Err("Fail-below threshold must be between 1 and 10".to_string());
            }
        }

        // Validate timeouts if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }
        if let Some(group_timeout) = self.group_timeout {
            if group_timeout == 0 {
                return Err("Group timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
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
            video: None,
            game: Some("Beat Blade".to_string()),
            genre: "rhythm".to_string(),
            platform: "VR".to_string(),
            price: None,
            audience: None,
            model: "llama3.2:latest".to_string(),
            api_url: "http://localhost:11434".to_string(),
            output: None,
            results_dir: None,
            config: None,
            format: OutputFormat::Markdown,
            timeout: None,
            group_timeout: None,
            fail_below: None,
            no_save: false,
            dry_run: false,
            history: false,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_invalid_api_url() {
        let mut args = make_args();
        args.api_url = "localhost:11434".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_dry_run_skips_api_url_check() {
        let mut args = make_args();
        args.api_url = "not-a-url".to_string();
        args.dry_run = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_video() {
        let mut args = make_args();
        args.video = Some(PathBuf::from("/definitely/not/here.mp4"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_fail_below_range() {
        let mut args = make_args();
        args.fail_below = Some(11.0);
        assert!(args.validate().is_err());

        args.fail_below = Some(6.5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_history_skips_validation() {
        let mut args = make_args();
        args.history = true;
        args.api_url = "garbage".to_string();
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
}
