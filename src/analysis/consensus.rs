//! Consensus building across the analyst panel.
//!
//! Combines exactly three opinions (game, quality, growth, in that
//! order) into one weighted verdict with agreement scores, disagreement
//! entries, and a recommended action. The panel contract is strict: any
//! other opinion count or seat order is an error, never padded or
//! truncated.

use crate::models::{
    AgreementScores, Aggregate, CostBreakdown, Disagreement, DisagreementKind,
    DisagreementSeverity, GameInsights, GrowthInsights, Insights, Opinion, OpinionOrigin,
    ProcessingMetrics, ProducerKind, QualityInsights, RecommendedAction, SeatSummary,
};
use crate::producer::fallback::fallback_opinion;
use thiserror::Error;

/// Number of seats the aggregator expects.
const PANEL_SIZE: usize = 3;

/// Confidence spread above which a disagreement entry is emitted.
const CONFIDENCE_SPLIT_GAP: f64 = 0.3;

/// Confidence spread at which the entry becomes high severity.
const CONFIDENCE_SPLIT_HIGH: f64 = 0.5;

/// Game/quality score gap above which a disagreement entry is emitted.
const SCORE_SPLIT_GAP: f64 = 3.0;

/// Midpoint substituted for absent 1-10 scores.
const SCORE_MIDPOINT: f64 = 5.0;

/// Contract violations in the panel handed to the aggregator.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("expected exactly {expected} opinions, got {got}")]
    OpinionCount { expected: usize, got: usize },

    #[error("seat {position} out of order: expected {expected}, got {got}")]
    SeatOrder {
        position: usize,
        expected: ProducerKind,
        got: ProducerKind,
    },
}

/// Tunable aggregation parameters.
///
/// The variance divisor normalizes 1-10 score variance into [0, 1]; it
/// is a heuristic constant, so it is carried as a setting rather than
/// hardcoded.
#[derive(Debug, Clone)]
pub struct AggregationSettings {
    pub quality_weight: f64,
    pub game_weight: f64,
    pub growth_weight: f64,
    pub score_variance_divisor: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            quality_weight: 0.40,
            game_weight: 0.35,
            growth_weight: 0.25,
            score_variance_divisor: 25.0,
        }
    }
}

impl From<&crate::config::AggregationConfig> for AggregationSettings {
    fn from(config: &crate::config::AggregationConfig) -> Self {
        Self {
            quality_weight: config.quality_weight,
            game_weight: config.game_weight,
            growth_weight: config.growth_weight,
            score_variance_divisor: config.score_variance_divisor,
        }
    }
}

/// Request-level facts the aggregator cannot derive from the opinions.
#[derive(Debug, Clone, Default)]
pub struct ConsensusContext {
    pub elapsed_seconds: f64,
    pub budget_utilization: f64,
}

/// Combine a full panel into one aggregate verdict.
///
/// The caller guarantees a full panel by substituting fallbacks for
/// failed seats first; this function fails fast on anything else.
pub fn build_consensus(
    opinions: &[Opinion],
    settings: &AggregationSettings,
    context: &ConsensusContext,
) -> Result<Aggregate, ConsensusError> {
    if opinions.len() != PANEL_SIZE {
        return Err(ConsensusError::OpinionCount {
            expected: PANEL_SIZE,
            got: opinions.len(),
        });
    }
    for (position, (opinion, expected)) in
        opinions.iter().zip(ProducerKind::all()).enumerate()
    {
        if opinion.producer != expected {
            return Err(ConsensusError::SeatOrder {
                position,
                expected,
                got: opinion.producer,
            });
        }
    }

    let game = game_insights(&opinions[0]);
    let quality = quality_insights(&opinions[1]);
    let growth = growth_insights(&opinions[2]);

    let game_value = score_or_midpoint(game.recommendation_score);
    let quality_value = score_or_midpoint(quality.educational_value);
    let growth_value = score_or_midpoint(growth.growth_potential);

    let weighted_score = round2(
        settings.quality_weight * quality_value
            + settings.game_weight * game_value
            + settings.growth_weight * growth_value,
    );

    let confidences: Vec<f64> = opinions.iter().map(|o| o.confidence).collect();
    let agreement = agreement_scores(opinions, settings);
    let disagreements = identify_disagreements(&confidences, game_value, quality_value);
    let recommended_action = recommend_action(weighted_score, quality_value);

    let confidence_level = confidences.iter().sum::<f64>() / confidences.len() as f64;

    let mut per_seat = std::collections::BTreeMap::new();
    for opinion in opinions {
        per_seat.insert(opinion.producer.slug().to_string(), opinion.cost);
    }
    let total = per_seat.values().sum();

    let fallback_seats = opinions
        .iter()
        .filter(|o| o.origin == OpinionOrigin::Fallback)
        .count();

    Ok(Aggregate {
        weighted_score,
        recommended_action,
        confidence_level,
        agreement,
        disagreements,
        seats: opinions.iter().map(SeatSummary::from_opinion).collect(),
        priority_improvements: priority_improvements(&game, &quality, &growth),
        next_steps: next_steps(recommended_action),
        publishing_strategy: growth.platform_scores.clone(),
        coverage_topics: game.must_cover_topics.clone(),
        safety_notes: growth.safety_considerations.clone(),
        cost: CostBreakdown { per_seat, total },
        metrics: ProcessingMetrics {
            elapsed_seconds: context.elapsed_seconds,
            budget_utilization: context.budget_utilization,
            fallback_seats,
            timed_out: false,
        },
    })
}

/// Pre-built safe verdict for a whole-panel failure.
///
/// Returned when the group deadline elapses before the panel joins; the
/// individual results (if any ever arrive) are discarded, and the seats
/// shown are the fallback constants.
pub fn emergency_aggregate(elapsed_seconds: f64) -> Aggregate {
    let seats: Vec<SeatSummary> = ProducerKind::all()
        .iter()
        .map(|&kind| SeatSummary::from_opinion(&fallback_opinion(kind)))
        .collect();

    let mut per_seat = std::collections::BTreeMap::new();
    for seat in &seats {
        per_seat.insert(seat.producer.slug().to_string(), seat.cost);
    }
    let total = per_seat.values().sum();

    Aggregate {
        weighted_score: SCORE_MIDPOINT,
        recommended_action: RecommendedAction::ManualReviewRequired,
        confidence_level: 0.1,
        agreement: AgreementScores::default(),
        disagreements: vec![Disagreement {
            kind: DisagreementKind::TotalFailure,
            description: "panel deadline elapsed before any seat finished".to_string(),
            severity: DisagreementSeverity::High,
        }],
        seats,
        priority_improvements: Vec::new(),
        next_steps: next_steps(RecommendedAction::ManualReviewRequired),
        publishing_strategy: std::collections::BTreeMap::new(),
        coverage_topics: Vec::new(),
        safety_notes: Vec::new(),
        cost: CostBreakdown { per_seat, total },
        metrics: ProcessingMetrics {
            elapsed_seconds,
            budget_utilization: 0.0,
            fallback_seats: PANEL_SIZE,
            timed_out: true,
        },
    }
}

fn game_insights(opinion: &Opinion) -> GameInsights {
    match &opinion.insights {
        Insights::Game(game) => game.clone(),
        _ => GameInsights::default(),
    }
}

fn quality_insights(opinion: &Opinion) -> QualityInsights {
    match &opinion.insights {
        Insights::Quality(quality) => quality.clone(),
        _ => QualityInsights::default(),
    }
}

fn growth_insights(opinion: &Opinion) -> GrowthInsights {
    match &opinion.insights {
        Insights::Growth(growth) => growth.clone(),
        _ => GrowthInsights::default(),
    }
}

fn score_or_midpoint(score: Option<f64>) -> f64 {
    score.unwrap_or(SCORE_MIDPOINT).clamp(1.0, 10.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Population variance (divide by n, not n-1).
fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn agreement_scores(opinions: &[Opinion], settings: &AggregationSettings) -> AgreementScores {
    let confidences: Vec<f64> = opinions.iter().map(|o| o.confidence).collect();
    let confidence_agreement = (1.0 - population_variance(&confidences)).max(0.0);

    let key_scores: Vec<f64> = opinions
        .iter()
        .filter_map(|o| o.insights.key_score())
        .collect();

    let recommendation_agreement = if key_scores.len() >= 2 {
        (1.0 - population_variance(&key_scores) / settings.score_variance_divisor).max(0.0)
    } else {
        // Neutral when there is nothing to compare.
        0.5
    };

    AgreementScores {
        confidence_agreement,
        recommendation_agreement,
        overall: (confidence_agreement + recommendation_agreement) / 2.0,
    }
}

fn identify_disagreements(
    confidences: &[f64],
    game_value: f64,
    quality_value: f64,
) -> Vec<Disagreement> {
    let mut disagreements = Vec::new();

    let max_conf = confidences.iter().cloned().fold(f64::MIN, f64::max);
    let min_conf = confidences.iter().cloned().fold(f64::MAX, f64::min);
    let spread = max_conf - min_conf;

    if spread > CONFIDENCE_SPLIT_GAP {
        disagreements.push(Disagreement {
            kind: DisagreementKind::ConfidenceSplit,
            description: format!(
                "seat confidence varies from {:.2} to {:.2}",
                min_conf, max_conf
            ),
            severity: if spread < CONFIDENCE_SPLIT_HIGH {
                DisagreementSeverity::Medium
            } else {
                DisagreementSeverity::High
            },
        });
    }

    if (game_value - quality_value).abs() > SCORE_SPLIT_GAP {
        disagreements.push(Disagreement {
            kind: DisagreementKind::ScoreSplit,
            description: format!(
                "game score ({:.0}) and review quality score ({:.0}) differ significantly",
                game_value, quality_value
            ),
            severity: DisagreementSeverity::Medium,
        });
    }

    disagreements
}

/// Decision table on (weighted score, quality value).
fn recommend_action(weighted_score: f64, quality_value: f64) -> RecommendedAction {
    if weighted_score >= 8.0 && quality_value >= 7.0 {
        RecommendedAction::PublishWithMinorImprovements
    } else if weighted_score >= 6.0 && quality_value >= 6.0 {
        RecommendedAction::ImproveThenPublish
    } else if quality_value < 5.0 {
        RecommendedAction::FocusOnEducationalValue
    } else {
        RecommendedAction::SubstantialImprovementsNeeded
    }
}

/// Top improvements pulled across the panel, capped at four.
fn priority_improvements(
    game: &GameInsights,
    quality: &QualityInsights,
    growth: &GrowthInsights,
) -> Vec<String> {
    let mut improvements: Vec<String> = quality
        .improvement_suggestions
        .iter()
        .take(2)
        .cloned()
        .collect();

    if !game.must_cover_topics.is_empty() {
        let topics: Vec<String> = game.must_cover_topics.iter().take(2).cloned().collect();
        improvements.push(format!("Ensure coverage of: {}", topics.join(", ")));
    }

    if let Some(first) = growth.safety_considerations.first() {
        improvements.push(format!("Safety: {}", first));
    }

    improvements.truncate(4);
    improvements
}

fn next_steps(action: RecommendedAction) -> Vec<String> {
    match action {
        RecommendedAction::PublishWithMinorImprovements => vec![
            "Apply the minor improvements from the quality assessment".to_string(),
            "Optimize for the recommended platforms".to_string(),
            "Schedule publication during the suggested posting window".to_string(),
            "Prepare for community engagement".to_string(),
        ],
        RecommendedAction::ImproveThenPublish => vec![
            "Address the educational improvements first".to_string(),
            "Add the missing coverage topics".to_string(),
            "Run the revised cut past a parent or guardian".to_string(),
            "Apply platform-specific optimizations".to_string(),
        ],
        RecommendedAction::ManualReviewRequired => vec![
            "Automated analysis failed; review the footage manually".to_string(),
            "Re-run the panel once the model endpoint is reachable".to_string(),
        ],
        _ => vec![
            "Focus on explaining the game more clearly".to_string(),
            "Add more detailed game analysis".to_string(),
            "Double-check age-appropriateness".to_string(),
            "Consider restructuring the review format".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpinionOrigin;

    fn opinion(kind: ProducerKind, confidence: f64, key_score: Option<f64>) -> Opinion {
        let insights = match kind {
            ProducerKind::GameAnalyst => Insights::Game(GameInsights {
                recommendation_score: key_score,
                must_cover_topics: vec!["comfort".to_string(), "price".to_string()],
                ..GameInsights::default()
            }),
            ProducerKind::ReviewQuality => Insights::Quality(QualityInsights {
                educational_value: key_score,
                improvement_suggestions: vec![
                    "tighten the intro".to_string(),
                    "show more gameplay".to_string(),
                    "mention system requirements".to_string(),
                ],
                ..QualityInsights::default()
            }),
            ProducerKind::AudienceGrowth => Insights::Growth(GrowthInsights {
                growth_potential: key_score,
                platform_scores: [("youtube".to_string(), 8.0)].into_iter().collect(),
                safety_considerations: vec!["keep comments moderated".to_string()],
                ..GrowthInsights::default()
            }),
        };

        Opinion {
            producer: kind,
            origin: OpinionOrigin::Live,
            confidence,
            insights,
            cost: 0.05,
            latency_seconds: 1.0,
            prompt_tokens: 200,
        }
    }

    fn panel(
        game: (f64, Option<f64>),
        quality: (f64, Option<f64>),
        growth: (f64, Option<f64>),
    ) -> Vec<Opinion> {
        vec![
            opinion(ProducerKind::GameAnalyst, game.0, game.1),
            opinion(ProducerKind::ReviewQuality, quality.0, quality.1),
            opinion(ProducerKind::AudienceGrowth, growth.0, growth.1),
        ]
    }

    fn settings() -> AggregationSettings {
        AggregationSettings::default()
    }

    fn context() -> ConsensusContext {
        ConsensusContext {
            elapsed_seconds: 3.0,
            budget_utilization: 0.5,
        }
    }

    #[test]
    fn test_weighted_score_formula() {
        // 0.4*9 + 0.35*8 + 0.25*6 = 7.90
        let opinions = panel((0.8, Some(8.0)), (0.9, Some(9.0)), (0.6, Some(6.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();

        assert_eq!(aggregate.weighted_score, 7.9);
        assert_eq!(
            aggregate.recommended_action,
            RecommendedAction::ImproveThenPublish
        );
    }

    #[test]
    fn test_all_midpoints_yield_midpoint() {
        let opinions = panel((0.5, Some(5.0)), (0.5, Some(5.0)), (0.5, Some(5.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
        assert_eq!(aggregate.weighted_score, 5.0);
    }

    #[test]
    fn test_missing_scores_default_to_midpoint() {
        let opinions = panel((0.5, None), (0.5, None), (0.5, None));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
        assert_eq!(aggregate.weighted_score, 5.0);
        // Fewer than two comparable scores: neutral agreement.
        assert!((aggregate.agreement.recommendation_agreement - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_stays_in_range() {
        let low = panel((0.1, Some(1.0)), (0.1, Some(1.0)), (0.1, Some(1.0)));
        let high = panel((1.0, Some(10.0)), (1.0, Some(10.0)), (1.0, Some(10.0)));
        let wild = panel((1.0, Some(500.0)), (1.0, Some(-3.0)), (1.0, Some(10.0)));

        for opinions in [low, high, wild] {
            let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
            assert!(aggregate.weighted_score >= 1.0);
            assert!(aggregate.weighted_score <= 10.0);
        }
    }

    #[test]
    fn test_identical_confidences_agree_fully() {
        let opinions = panel((0.9, Some(7.0)), (0.9, Some(7.0)), (0.9, Some(7.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
        assert_eq!(aggregate.agreement.confidence_agreement, 1.0);
    }

    #[test]
    fn test_confidence_split_high_severity() {
        let opinions = panel((0.1, Some(7.0)), (0.9, Some(7.0)), (0.5, Some(7.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();

        let split = aggregate
            .disagreements
            .iter()
            .find(|d| d.kind == DisagreementKind::ConfidenceSplit)
            .expect("confidence split expected");
        assert_eq!(split.severity, DisagreementSeverity::High);
    }

    #[test]
    fn test_confidence_split_medium_severity() {
        let opinions = panel((0.5, Some(7.0)), (0.9, Some(7.0)), (0.7, Some(7.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();

        let split = aggregate
            .disagreements
            .iter()
            .find(|d| d.kind == DisagreementKind::ConfidenceSplit)
            .expect("confidence split expected");
        assert_eq!(split.severity, DisagreementSeverity::Medium);
    }

    #[test]
    fn test_score_split_detected() {
        let opinions = panel((0.8, Some(9.0)), (0.8, Some(4.0)), (0.8, Some(6.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();

        assert!(aggregate
            .disagreements
            .iter()
            .any(|d| d.kind == DisagreementKind::ScoreSplit
                && d.severity == DisagreementSeverity::Medium));
    }

    #[test]
    fn test_close_panel_has_no_disagreements() {
        let opinions = panel((0.8, Some(7.0)), (0.7, Some(8.0)), (0.75, Some(7.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
        assert!(aggregate.disagreements.is_empty());
    }

    #[test]
    fn test_wrong_opinion_count_fails_fast() {
        let mut opinions = panel((0.8, Some(7.0)), (0.8, Some(7.0)), (0.8, Some(7.0)));

        opinions.pop();
        let err = build_consensus(&opinions, &settings(), &context()).unwrap_err();
        assert!(matches!(
            err,
            ConsensusError::OpinionCount {
                expected: 3,
                got: 2
            }
        ));

        opinions.push(opinion(ProducerKind::AudienceGrowth, 0.8, Some(7.0)));
        opinions.push(opinion(ProducerKind::AudienceGrowth, 0.8, Some(7.0)));
        let err = build_consensus(&opinions, &settings(), &context()).unwrap_err();
        assert!(matches!(
            err,
            ConsensusError::OpinionCount {
                expected: 3,
                got: 4
            }
        ));
    }

    #[test]
    fn test_out_of_order_seats_fail_fast() {
        let mut opinions = panel((0.8, Some(7.0)), (0.8, Some(7.0)), (0.8, Some(7.0)));
        opinions.swap(0, 1);

        let err = build_consensus(&opinions, &settings(), &context()).unwrap_err();
        assert!(matches!(err, ConsensusError::SeatOrder { position: 0, .. }));
    }

    #[test]
    fn test_action_decision_table() {
        let cases = [
            (
                (Some(9.0), Some(9.0), Some(8.0)),
                RecommendedAction::PublishWithMinorImprovements,
            ),
            (
                (Some(8.0), Some(9.0), Some(6.0)),
                RecommendedAction::ImproveThenPublish,
            ),
            (
                (Some(6.0), Some(3.0), Some(5.0)),
                RecommendedAction::FocusOnEducationalValue,
            ),
            (
                (Some(5.0), Some(5.0), Some(5.0)),
                RecommendedAction::SubstantialImprovementsNeeded,
            ),
        ];

        for ((game, quality, growth), expected) in cases {
            let opinions = panel((0.7, game), (0.7, quality), (0.7, growth));
            let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
            assert_eq!(aggregate.recommended_action, expected);
        }
    }

    #[test]
    fn test_determinism() {
        let opinions = panel((0.8, Some(8.0)), (0.9, Some(9.0)), (0.6, Some(6.0)));
        let first = build_consensus(&opinions, &settings(), &context()).unwrap();
        let second = build_consensus(&opinions, &settings(), &context()).unwrap();

        assert_eq!(first.weighted_score, second.weighted_score);
        assert_eq!(first.recommended_action, second.recommended_action);
        assert_eq!(first.disagreements.len(), second.disagreements.len());
    }

    #[test]
    fn test_priority_improvements_are_capped() {
        let opinions = panel((0.8, Some(8.0)), (0.9, Some(9.0)), (0.6, Some(6.0)));
        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();

        assert!(aggregate.priority_improvements.len() <= 4);
        assert_eq!(aggregate.priority_improvements[0], "tighten the intro");
        assert!(aggregate
            .priority_improvements
            .iter()
            .any(|i| i.starts_with("Ensure coverage of:")));
    }

    #[test]
    fn test_fallback_seats_counted() {
        let mut opinions = panel((0.8, Some(8.0)), (0.9, Some(9.0)), (0.6, Some(6.0)));
        opinions[2] = fallback_opinion(ProducerKind::AudienceGrowth);

        let aggregate = build_consensus(&opinions, &settings(), &context()).unwrap();
        assert_eq!(aggregate.metrics.fallback_seats, 1);
    }

    #[test]
    fn test_configurable_variance_divisor() {
        let opinions = panel((0.8, Some(9.0)), (0.8, Some(4.0)), (0.8, Some(5.0)));

        let default = build_consensus(&opinions, &settings(), &context()).unwrap();
        let strict = build_consensus(
            &opinions,
            &AggregationSettings {
                score_variance_divisor: 5.0,
                ..AggregationSettings::default()
            },
            &context(),
        )
        .unwrap();

        assert!(strict.agreement.recommendation_agreement < default.agreement.recommendation_agreement);
    }

    #[test]
    fn test_emergency_aggregate_shape() {
        let aggregate = emergency_aggregate(120.0);

        assert_eq!(
            aggregate.recommended_action,
            RecommendedAction::ManualReviewRequired
        );
        assert_eq!(aggregate.weighted_score, 5.0);
        assert!(aggregate.confidence_level <= 0.1);
        assert_eq!(aggregate.metrics.fallback_seats, 3);
        assert!(aggregate.metrics.timed_out);
        assert!(aggregate
            .disagreements
            .iter()
            .any(|d| d.kind == DisagreementKind::TotalFailure));
        assert_eq!(aggregate.seats.len(), 3);
    }
}
