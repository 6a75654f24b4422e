//! Fallback substitution for failed seats.
//!
//! A total function from seat to a constant, mid-range opinion. The
//! aggregator always receives a full panel: when a seat fails, its hole
//! is filled here, flagged with [`OpinionOrigin::Fallback`] so nothing
//! downstream mistakes the substitute for a live judgment.

use crate::models::{
    GameInsights, GrowthInsights, Insights, Opinion, OpinionOrigin, ProducerKind, QualityInsights,
};

/// Confidence assigned to every fallback opinion.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Midpoint of the 1-10 score scale.
const FALLBACK_SCORE: f64 = 5.0;

/// Nominal cost attributed to a fallback substitution.
const FALLBACK_COST: f64 = 0.01;

/// Build the fallback opinion for one seat. Never fails.
pub fn fallback_opinion(kind: ProducerKind) -> Opinion {
    Opinion {
        producer: kind,
        origin: OpinionOrigin::Fallback,
        confidence: FALLBACK_CONFIDENCE,
        insights: fallback_insights(kind),
        cost: FALLBACK_COST,
        latency_seconds: 0.0,
        prompt_tokens: 0,
    }
}

fn fallback_insights(kind: ProducerKind) -> Insights {
    match kind {
        ProducerKind::GameAnalyst => Insights::Game(GameInsights {
            recommendation_score: Some(FALLBACK_SCORE),
            must_cover_topics: vec![
                "gameplay".to_string(),
                "graphics".to_string(),
                "price".to_string(),
            ],
            unique_features: vec!["VR experience".to_string()],
            recommendation_reason: Some("Standard VR game review needed".to_string()),
            ..GameInsights::default()
        }),
        ProducerKind::ReviewQuality => Insights::Quality(QualityInsights {
            educational_value: Some(FALLBACK_SCORE),
            completeness_score: Some(FALLBACK_SCORE),
            age_appropriate: Some(true),
            improvement_suggestions: vec![
                "add more detail".to_string(),
                "explain clearly".to_string(),
            ],
            ..QualityInsights::default()
        }),
        ProducerKind::AudienceGrowth => Insights::Growth(GrowthInsights {
            growth_potential: Some(FALLBACK_SCORE),
            platform_scores: [("youtube".to_string(), 7.0), ("tiktok".to_string(), 5.0)]
                .into_iter()
                .collect(),
            safety_considerations: vec!["parent oversight required".to_string()],
            optimal_posting_time: Some("weekday_evening".to_string()),
            ..GrowthInsights::default()
        }),
    }
}
