//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.revupanel.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Panel budget settings.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Directory where analysis records are persisted.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            results_dir: default_results_dir(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "revupanel_report.md".to_string()
}

fn default_results_dir() -> String {
    "analysis_results".to_string()
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama-compatible API URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-call HTTP timeout in seconds.
    #[serde(default = "default_call_timeout")]
    pub timeout_seconds: u64,

    /// Deadline for the whole panel, in seconds. When it elapses, all
    /// in-flight seat calls are cancelled and an emergency verdict is
    /// returned.
    #[serde(default = "default_group_timeout")]
    pub group_timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            timeout_seconds: default_call_timeout(),
            group_timeout_seconds: default_group_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_api_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_call_timeout() -> u64 {
    90
}

fn default_group_timeout() -> u64 {
    120
}

/// Panel budget settings (USD).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Spending limit for the game analyst seat.
    #[serde(default = "default_game_limit")]
    pub game_limit: f64,

    /// Spending limit for the review quality seat.
    #[serde(default = "default_quality_limit")]
    pub quality_limit: f64,

    /// Spending limit for the audience growth seat.
    #[serde(default = "default_growth_limit")]
    pub growth_limit: f64,

    /// Total budget for one review.
    #[serde(default = "default_review_total")]
    pub review_total: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            game_limit: default_game_limit(),
            quality_limit: default_quality_limit(),
            growth_limit: default_growth_limit(),
            review_total: default_review_total(),
        }
    }
}

fn default_game_limit() -> f64 {
    0.07
}

fn default_quality_limit() -> f64 {
    0.07
}

fn default_growth_limit() -> f64 {
    0.06
}

fn default_review_total() -> f64 {
    0.20
}

/// Aggregation settings.
///
/// The variance divisor is a heuristic scaling constant for 1-10 scores,
/// not a derived quantity, so it is configuration rather than code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Weight of the quality seat's score.
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,

    /// Weight of the game seat's score.
    #[serde(default = "default_game_weight")]
    pub game_weight: f64,

    /// Weight of the growth seat's score.
    #[serde(default = "default_growth_weight")]
    pub growth_weight: f64,

    /// Divisor normalizing key-score variance into [0, 1].
    #[serde(default = "default_score_variance_divisor")]
    pub score_variance_divisor: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            quality_weight: default_quality_weight(),
            game_weight: default_game_weight(),
            growth_weight: default_growth_weight(),
            score_variance_divisor: default_score_variance_divisor(),
        }
    }
}

impl AggregationConfig {
    /// Validate that the weights form a convex combination.
    pub fn validate(&self) -> Result<()> {
        let sum = self.quality_weight + self.game_weight + self.growth_weight;
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("aggregation weights must sum to 1.0, got {:.4}", sum);
        }
        if self.score_variance_divisor <= 0.0 {
            anyhow::bail!(
                "score_variance_divisor must be positive, got {}",
                self.score_variance_divisor
            );
        }
        Ok(())
    }
}

fn default_quality_weight() -> f64 {
    0.40
}

fn default_game_weight() -> f64 {
    0.35
}

fn default_growth_weight() -> f64 {
    0.25
}

fn default_score_variance_divisor() -> f64 {
    25.0
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include per-analyst seat sections.
    #[serde(default = "default_true")]
    pub include_seat_sections: bool,

    /// Include the cost breakdown table.
    #[serde(default = "default_true")]
    pub include_cost_breakdown: bool,

    /// Maximum entries rendered per list section.
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_seat_sections: true,
            include_cost_breakdown: true,
            max_list_items: default_max_list_items(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_list_items() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".revupanel.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Model settings - always override since they have defaults in CLI
        self.model.name = args.model.clone();
        self.model.api_url = args.api_url.clone();

        // Timeouts - only override if explicitly provided via CLI
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(group_timeout) = args.group_timeout {
            self.model.group_timeout_seconds = group_timeout;
        }

        // Optional settings - only override if provided
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref results_dir) = args.results_dir {
            self.general.results_dir = results_dir.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
