//! Data models for the review analyst panel.
//!
//! This module contains the core data structures used throughout the
//! application: the per-request context, producer opinions with their
//! typed insight payloads, and the aggregated verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three analyst seats on the panel.
///
/// The panel is a fixed set; seats are never spawned dynamically. Seat
/// order is significant: aggregation expects game, quality, growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    /// VR game features and mechanics.
    GameAnalyst,
    /// Educational value and clarity of the review itself.
    ReviewQuality,
    /// Community engagement and audience growth potential.
    AudienceGrowth,
}

impl ProducerKind {
    /// All seats, in aggregation order.
    pub fn all() -> [ProducerKind; 3] {
        [
            ProducerKind::GameAnalyst,
            ProducerKind::ReviewQuality,
            ProducerKind::AudienceGrowth,
        ]
    }

    /// Stable identifier used in cost breakdowns and stored records.
    pub fn slug(&self) -> &'static str {
        match self {
            ProducerKind::GameAnalyst => "game_analyst",
            ProducerKind::ReviewQuality => "review_quality",
            ProducerKind::AudienceGrowth => "audience_growth",
        }
    }
}

impl fmt::Display for ProducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProducerKind::GameAnalyst => write!(f, "VR Game Analyst"),
            ProducerKind::ReviewQuality => write!(f, "Review Quality Analyst"),
            ProducerKind::AudienceGrowth => write!(f, "Audience Growth Analyst"),
        }
    }
}

/// Metadata about the game being reviewed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Game title.
    pub name: String,
    /// Genre (e.g. "rhythm", "shooter").
    pub genre: String,
    /// Platform, "VR" unless stated otherwise.
    pub platform: String,
    /// Price in USD, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Intended audience, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
}

/// Context for one review-processing request.
///
/// Constructed fresh per request and discarded afterwards; nothing about
/// a request lives in shared mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Reference to the uploaded review footage (local path).
    pub video_reference: String,
    /// Metadata about the reviewed game.
    pub game: GameMetadata,
}

/// Where an opinion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpinionOrigin {
    /// Produced by a live model call.
    Live,
    /// Substituted by the fallback constant after a seat failed.
    Fallback,
}

impl fmt::Display for OpinionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpinionOrigin::Live => write!(f, "live"),
            OpinionOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// One analyst's structured judgment about the reviewed artifact.
///
/// Immutable after creation; consumed by aggregation and then discarded
/// (only the final [`Aggregate`] is persisted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opinion {
    /// Which seat produced this opinion.
    pub producer: ProducerKind,
    /// Live call or fallback substitution.
    pub origin: OpinionOrigin,
    /// Normalized confidence in [0, 1].
    pub confidence: f64,
    /// Typed insight payload for this seat.
    pub insights: Insights,
    /// Estimated cost of the call in USD.
    pub cost: f64,
    /// Wall-clock time the call took.
    pub latency_seconds: f64,
    /// Rough prompt size estimate (chars / 4).
    pub prompt_tokens: usize,
}

/// Typed insight payload, one variant per seat.
///
/// Every field is explicit and optional where the model may omit it;
/// malformed payloads are rejected during parsing rather than guessed
/// at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insights {
    Game(GameInsights),
    Quality(QualityInsights),
    Growth(GrowthInsights),
}

impl Insights {
    /// The seat this payload belongs to.
    pub fn kind(&self) -> ProducerKind {
        match self {
            Insights::Game(_) => ProducerKind::GameAnalyst,
            Insights::Quality(_) => ProducerKind::ReviewQuality,
            Insights::Growth(_) => ProducerKind::AudienceGrowth,
        }
    }

    /// The seat's headline 1-10 score, when the model supplied one.
    ///
    /// Aggregation substitutes the scale midpoint (5) for `None`.
    pub fn key_score(&self) -> Option<f64> {
        match self {
            Insights::Game(g) => g.recommendation_score,
            Insights::Quality(q) => q.educational_value,
            Insights::Growth(g) => g.growth_potential,
        }
    }
}

/// Game-analysis insights: VR mechanics, coverage, and a recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInsights {
    /// Recommendation strength, 1-10.
    pub recommendation_score: Option<f64>,
    /// VR interaction quality, 1-10.
    pub interaction_quality: Option<f64>,
    /// Comfort / motion-sickness rating, 1-10.
    pub comfort_rating: Option<f64>,
    pub vr_mechanics: Vec<String>,
    pub unique_features: Vec<String>,
    /// Topics a complete review must cover.
    pub must_cover_topics: Vec<String>,
    pub genre_comparison: Option<String>,
    pub recommendation_reason: Option<String>,
    pub target_audience_match: Option<String>,
    pub review_talking_points: Vec<String>,
}

/// Review-quality insights: educational value, structure, clarity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityInsights {
    /// Educational value for other gamers, 1-10.
    pub educational_value: Option<f64>,
    pub structure_quality: Option<f64>,
    pub clarity_score: Option<f64>,
    pub completeness_score: Option<f64>,
    pub engagement_score: Option<f64>,
    pub age_appropriate: Option<bool>,
    pub missing_topics: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub strengths: Vec<String>,
}

/// Audience-growth insights: community appeal and publishing strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthInsights {
    /// Growth potential for the creator, 1-10.
    pub growth_potential: Option<f64>,
    pub community_interest: Option<f64>,
    pub trend_alignment: Option<f64>,
    pub young_audience_appeal: Option<f64>,
    /// Per-platform suitability scores, 1-10.
    pub platform_scores: BTreeMap<String, f64>,
    pub optimal_posting_time: Option<String>,
    pub recommended_hashtags: Vec<String>,
    pub engagement_opportunities: Vec<String>,
    pub safety_considerations: Vec<String>,
    pub content_optimization: Vec<String>,
}

/// How severe a panel disagreement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisagreementSeverity {
    Medium,
    High,
}

impl fmt::Display for DisagreementSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisagreementSeverity::Medium => write!(f, "medium"),
            DisagreementSeverity::High => write!(f, "high"),
        }
    }
}

/// What kind of disagreement was detected between seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisagreementKind {
    /// Seat confidences span more than the allowed gap.
    ConfidenceSplit,
    /// Game score and quality score differ by more than the allowed gap.
    ScoreSplit,
    /// The whole batch failed; the verdict is an emergency placeholder.
    TotalFailure,
}

/// A significant disagreement between panel seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disagreement {
    pub kind: DisagreementKind,
    pub description: String,
    pub severity: DisagreementSeverity,
}

/// The panel's recommended next action for the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    PublishWithMinorImprovements,
    ImproveThenPublish,
    FocusOnEducationalValue,
    SubstantialImprovementsNeeded,
    /// Emergency verdict after a whole-panel failure.
    ManualReviewRequired,
}

impl RecommendedAction {
    /// Human-readable headline for reports and the console summary.
    pub fn headline(&self) -> &'static str {
        match self {
            RecommendedAction::PublishWithMinorImprovements => {
                "Publish with minor improvements"
            }
            RecommendedAction::ImproveThenPublish => "Improve, then publish",
            RecommendedAction::FocusOnEducationalValue => "Focus on educational value",
            RecommendedAction::SubstantialImprovementsNeeded => {
                "Substantial improvements needed"
            }
            RecommendedAction::ManualReviewRequired => "Manual review required",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RecommendedAction::PublishWithMinorImprovements => "🟢",
            RecommendedAction::ImproveThenPublish => "🟡",
            RecommendedAction::FocusOnEducationalValue => "🟠",
            RecommendedAction::SubstantialImprovementsNeeded => "🔴",
            RecommendedAction::ManualReviewRequired => "⚪",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())
    }
}

/// Per-seat digest carried into the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSummary {
    pub producer: ProducerKind,
    pub origin: OpinionOrigin,
    pub confidence: f64,
    /// Headline 1-10 score, when supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_score: Option<f64>,
    pub cost: f64,
    pub latency_seconds: f64,
}

impl SeatSummary {
    /// Digest one opinion into its seat summary.
    pub fn from_opinion(opinion: &Opinion) -> Self {
        Self {
            producer: opinion.producer,
            origin: opinion.origin,
            confidence: opinion.confidence,
            key_score: opinion.insights.key_score(),
            cost: opinion.cost,
            latency_seconds: opinion.latency_seconds,
        }
    }
}

/// Cost accounting for one aggregated request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Cost per seat, keyed by the seat slug.
    pub per_seat: BTreeMap<String, f64>,
    pub total: f64,
}

/// Agreement scores between the panel seats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgreementScores {
    pub confidence_agreement: f64,
    pub recommendation_agreement: f64,
    pub overall: f64,
}

/// Processing metrics for one aggregated request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Wall-clock seconds for the whole panel pass.
    pub elapsed_seconds: f64,
    /// Spend as a fraction of the per-review budget.
    pub budget_utilization: f64,
    /// How many seats were filled by fallback substitution.
    pub fallback_seats: usize,
    /// Whether the group deadline elapsed before the panel finished.
    pub timed_out: bool,
}

/// The combined judgment across all seats for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    /// Weighted overall score, 1-10, rounded to 2 decimals.
    pub weighted_score: f64,
    pub recommended_action: RecommendedAction,
    /// Mean seat confidence, [0, 1].
    pub confidence_level: f64,
    pub agreement: AgreementScores,
    pub disagreements: Vec<Disagreement>,
    /// Per-seat digests, in panel order.
    pub seats: Vec<SeatSummary>,
    /// Top improvements pulled across the panel, highest priority first.
    pub priority_improvements: Vec<String>,
    /// Concrete next steps keyed off the recommended action.
    pub next_steps: Vec<String>,
    /// Per-platform suitability scores from the growth seat.
    pub publishing_strategy: BTreeMap<String, f64>,
    /// Topics the review must cover, from the game seat.
    pub coverage_topics: Vec<String>,
    /// Safety considerations from the growth seat.
    pub safety_notes: Vec<String>,
    pub cost: CostBreakdown,
    pub metrics: ProcessingMetrics,
}

/// Metadata attached to a persisted analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub video_reference: String,
    pub game: GameMetadata,
    pub analysis_date: DateTime<Utc>,
    pub model_used: String,
    pub duration_seconds: f64,
}

/// One complete persisted analysis: metadata plus the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub metadata: AnalysisMetadata,
    pub aggregate: Aggregate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_order() {
        let seats = ProducerKind::all();
        assert_eq!(seats[0], ProducerKind::GameAnalyst);
        assert_eq!(seats[1], ProducerKind::ReviewQuality);
        assert_eq!(seats[2], ProducerKind::AudienceGrowth);
    }

    #[test]
    fn test_slugs_are_stable() {
        assert_eq!(ProducerKind::GameAnalyst.slug(), "game_analyst");
        assert_eq!(ProducerKind::ReviewQuality.slug(), "review_quality");
        assert_eq!(ProducerKind::AudienceGrowth.slug(), "audience_growth");
    }

    #[test]
    fn test_key_score_per_seat() {
        let game = Insights::Game(GameInsights {
            recommendation_score: Some(8.0),
            ..GameInsights::default()
        });
        assert_eq!(game.key_score(), Some(8.0));
        assert_eq!(game.kind(), ProducerKind::GameAnalyst);

        let quality = Insights::Quality(QualityInsights::default());
        assert_eq!(quality.key_score(), None);
        assert_eq!(quality.kind(), ProducerKind::ReviewQuality);

        let growth = Insights::Growth(GrowthInsights {
            growth_potential: Some(6.0),
            ..GrowthInsights::default()
        });
        assert_eq!(growth.key_score(), Some(6.0));
    }

    #[test]
    fn test_sparse_insights_deserialize_with_defaults() {
        let quality: QualityInsights =
            serde_json::from_str(r#"{"educational_value": 7}"#).unwrap();
        assert_eq!(quality.educational_value, Some(7.0));
        assert!(quality.improvement_suggestions.is_empty());
        assert!(quality.age_appropriate.is_none());
    }

    #[test]
    fn test_seat_summary_digest() {
        let opinion = Opinion {
            producer: ProducerKind::GameAnalyst,
            origin: OpinionOrigin::Live,
            confidence: 0.8,
            insights: Insights::Game(GameInsights {
                recommendation_score: Some(8.0),
                ..GameInsights::default()
            }),
            cost: 0.05,
            latency_seconds: 2.5,
            prompt_tokens: 300,
        };

        let summary = SeatSummary::from_opinion(&opinion);
        assert_eq!(summary.producer, ProducerKind::GameAnalyst);
        assert_eq!(summary.origin, OpinionOrigin::Live);
        assert_eq!(summary.key_score, Some(8.0));
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&RecommendedAction::ImproveThenPublish).unwrap();
        assert_eq!(json, r#""improve_then_publish""#);
    }
}
