//! Markdown and JSON report generation.
//!
//! This module renders one persisted analysis record into a
//! human-readable Markdown report or a machine-readable JSON document.

use crate::config::ReportConfig;
use crate::models::{Aggregate, AnalysisMetadata, AnalysisRecord, OpinionOrigin};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(record: &AnalysisRecord, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# RevuPanel Analysis\n\n");

    output.push_str(&generate_metadata_section(&record.metadata));
    output.push_str(&generate_verdict_section(&record.aggregate));

    if config.include_seat_sections {
        output.push_str(&generate_panel_section(&record.aggregate));
    }

    output.push_str(&generate_disagreements_section(&record.aggregate));
    output.push_str(&generate_guidance_section(&record.aggregate, config));

    if config.include_cost_breakdown {
        output.push_str(&generate_cost_section(&record.aggregate));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &AnalysisMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Game:** {}\n", metadata.game.name));
    section.push_str(&format!("- **Genre:** {}\n", metadata.game.genre));
    section.push_str(&format!("- **Platform:** {}\n", metadata.game.platform));
    if let Some(price) = metadata.game.price {
        section.push_str(&format!("- **Price:** ${:.2}\n", price));
    }
    section.push_str(&format!("- **Footage:** `{}`\n", metadata.video_reference));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the verdict section.
fn generate_verdict_section(aggregate: &Aggregate) -> String {
    let mut section = String::new();

    section.push_str("## Verdict\n\n");
    section.push_str(&format!(
        "{} **{}**\n\n",
        aggregate.recommended_action.emoji(),
        aggregate.recommended_action.headline()
    ));
    section.push_str(&format!(
        "- **Weighted Score:** {:.2} / 10\n",
        aggregate.weighted_score
    ));
    section.push_str(&format!(
        "- **Panel Confidence:** {:.0}%\n",
        aggregate.confidence_level * 100.0
    ));
    section.push_str(&format!(
        "- **Panel Agreement:** {:.0}%\n",
        aggregate.agreement.overall * 100.0
    ));

    if aggregate.metrics.timed_out {
        section.push_str(
            "\n> ⚠️ The panel deadline elapsed before any analyst finished. \
This verdict is an emergency placeholder; re-run the analysis.\n",
        );
    } else if aggregate.metrics.fallback_seats > 0 {
        section.push_str(&format!(
            "\n> ⚠️ {} of {} analysts failed and were replaced by fallback opinions.\n",
            aggregate.metrics.fallback_seats,
            aggregate.seats.len()
        ));
    }

    section.push('\n');

    section
}

/// Generate the per-seat panel table.
fn generate_panel_section(aggregate: &Aggregate) -> String {
    let mut section = String::new();

    section.push_str("## Panel\n\n");
    section.push_str("| Analyst | Origin | Confidence | Score | Latency |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for seat in &aggregate.seats {
        let origin = match seat.origin {
            OpinionOrigin::Live => "live",
            OpinionOrigin::Fallback => "**fallback**",
        };
        let score = seat
            .key_score
            .map(|s| format!("{:.0}", s))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {:.2} | {} | {:.1}s |\n",
            seat.producer, origin, seat.confidence, score, seat.latency_seconds
        ));
    }
    section.push('\n');

    section
}

/// Generate the disagreements section.
fn generate_disagreements_section(aggregate: &Aggregate) -> String {
    if aggregate.disagreements.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Disagreements\n\n");
    for disagreement in &aggregate.disagreements {
        section.push_str(&format!(
            "- **{}**: {}\n",
            disagreement.severity, disagreement.description
        ));
    }
    section.push('\n');

    section
}

/// Generate improvements, next steps, and publishing guidance.
fn generate_guidance_section(aggregate: &Aggregate, config: &ReportConfig) -> String {
    let mut section = String::new();

    if !aggregate.priority_improvements.is_empty() {
        section.push_str("## Priority Improvements\n\n");
        for (i, improvement) in aggregate
            .priority_improvements
            .iter()
            .take(config.max_list_items)
            .enumerate()
        {
            section.push_str(&format!("{}. {}\n", i + 1, improvement));
        }
        section.push('\n');
    }

    if !aggregate.next_steps.is_empty() {
        section.push_str("## Next Steps\n\n");
        for step in aggregate.next_steps.iter().take(config.max_list_items) {
            section.push_str(&format!("- {}\n", step));
        }
        section.push('\n');
    }

    if !aggregate.publishing_strategy.is_empty() {
        section.push_str("## Publishing Strategy\n\n");
        section.push_str("| Platform | Fit |\n");
        section.push_str("|:---|:---:|\n");

        let mut platforms: Vec<_> = aggregate.publishing_strategy.iter().collect();
        platforms.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

        for (platform, score) in platforms {
            section.push_str(&format!("| {} | {:.0}/10 |\n", platform, score));
        }
        section.push('\n');
    }

    if !aggregate.coverage_topics.is_empty() {
        section.push_str("## Must-Cover Topics\n\n");
        for topic in aggregate.coverage_topics.iter().take(config.max_list_items) {
            section.push_str(&format!("- {}\n", topic));
        }
        section.push('\n');
    }

    if !aggregate.safety_notes.is_empty() {
        section.push_str("## Safety Notes\n\n");
        for note in aggregate.safety_notes.iter().take(config.max_list_items) {
            section.push_str(&format!("- {}\n", note));
        }
        section.push('\n');
    }

    section
}

/// Generate the cost breakdown section.
fn generate_cost_section(aggregate: &Aggregate) -> String {
    let mut section = String::new();

    section.push_str("## Cost\n\n");
    section.push_str("| Analyst | Cost |\n");
    section.push_str("|:---|:---:|\n");

    for (seat, cost) in &aggregate.cost.per_seat {
        section.push_str(&format!("| {} | ${:.3} |\n", seat, cost));
    }
    section.push_str(&format!("| **Total** | **${:.3}** |\n\n", aggregate.cost.total));

    section.push_str(&format!(
        "Budget utilization: {:.0}%\n\n",
        aggregate.metrics.budget_utilization * 100.0
    ));

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by RevuPanel*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(record: &AnalysisRecord) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgreementScores, CostBreakdown, Disagreement, DisagreementKind, DisagreementSeverity,
        GameMetadata, ProcessingMetrics, ProducerKind, RecommendedAction, SeatSummary,
    };
    use chrono::Utc;

    fn create_test_record() -> AnalysisRecord {
        let aggregate = Aggregate {
            weighted_score: 7.9,
            recommended_action: RecommendedAction::ImproveThenPublish,
            confidence_level: 0.77,
            agreement: AgreementScores {
                confidence_agreement: 0.98,
                recommendation_agreement: 0.93,
                overall: 0.955,
            },
            disagreements: vec![Disagreement {
                kind: DisagreementKind::ScoreSplit,
                description: "game score (9) and review quality score (5) differ significantly"
                    .to_string(),
                severity: DisagreementSeverity::Medium,
            }],
            seats: vec![
                SeatSummary {
                    producer: ProducerKind::GameAnalyst,
                    origin: OpinionOrigin::Live,
                    confidence: 0.8,
                    key_score: Some(8.0),
                    cost: 0.05,
                    latency_seconds: 2.1,
                },
                SeatSummary {
                    producer: ProducerKind::ReviewQuality,
                    origin: OpinionOrigin::Live,
                    confidence: 0.9,
                    key_score: Some(9.0),
                    cost: 0.05,
                    latency_seconds: 1.8,
                },
                SeatSummary {
                    producer: ProducerKind::AudienceGrowth,
                    origin: OpinionOrigin::Fallback,
                    confidence: 0.5,
                    key_score: Some(5.0),
                    cost: 0.01,
                    latency_seconds: 0.0,
                },
            ],
            priority_improvements: vec!["tighten the intro".to_string()],
            next_steps: vec!["Address the educational improvements first".to_string()],
            publishing_strategy: [("youtube".to_string(), 9.0), ("tiktok".to_string(), 6.0)]
                .into_iter()
                .collect(),
            coverage_topics: vec!["comfort".to_string()],
            safety_notes: vec!["keep comments moderated".to_string()],
            cost: CostBreakdown {
                per_seat: [
                    ("game_analyst".to_string(), 0.05),
                    ("review_quality".to_string(), 0.05),
                    ("audience_growth".to_string(), 0.01),
                ]
                .into_iter()
                .collect(),
                total: 0.11,
            },
            metrics: ProcessingMetrics {
                elapsed_seconds: 4.2,
                budget_utilization: 0.55,
                fallback_seats: 1,
                timed_out: false,
            },
        };

        AnalysisRecord {
            metadata: AnalysisMetadata {
                video_reference: "clips/beat_blade.mp4".to_string(),
                game: GameMetadata {
                    name: "Beat Blade".to_string(),
                    genre: "rhythm".to_string(),
                    platform: "VR".to_string(),
                    price: Some(29.99),
                    target_audience: None,
                },
                analysis_date: Utc::now(),
                model_used: "llama3.2:latest".to_string(),
                duration_seconds: 4.2,
            },
            aggregate,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let record = create_test_record();
        let markdown = generate_markdown_report(&record, &ReportConfig::default());

        assert!(markdown.contains("# RevuPanel Analysis"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("Beat Blade"));
        assert!(markdown.contains("## Verdict"));
        assert!(markdown.contains("Improve, then publish"));
        assert!(markdown.contains("7.90 / 10"));
        assert!(markdown.contains("## Panel"));
        assert!(markdown.contains("**fallback**"));
        assert!(markdown.contains("## Disagreements"));
        assert!(markdown.contains("## Cost"));
    }

    #[test]
    fn test_fallback_warning_present() {
        let record = create_test_record();
        let markdown = generate_markdown_report(&record, &ReportConfig::default());
        assert!(markdown.contains("1 of 3 analysts failed"));
    }

    #[test]
    fn test_timed_out_warning() {
        let mut record = create_test_record();
        record.aggregate.metrics.timed_out = true;
        let markdown = generate_markdown_report(&record, &ReportConfig::default());
        assert!(markdown.contains("emergency placeholder"));
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let record = create_test_record();
        let config = ReportConfig {
            include_seat_sections: false,
            include_cost_breakdown: false,
            max_list_items: 5,
        };
        let markdown = generate_markdown_report(&record, &config);

        assert!(!markdown.contains("## Panel"));
        assert!(!markdown.contains("## Cost"));
        assert!(markdown.contains("## Verdict"));
    }

    #[test]
    fn test_list_items_are_capped() {
        let mut record = create_test_record();
        record.aggregate.priority_improvements =
            (0..10).map(|i| format!("improvement {}", i)).collect();

        let config = ReportConfig {
            max_list_items: 3,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&record, &config);

        assert!(markdown.contains("improvement 2"));
        assert!(!markdown.contains("improvement 3"));
    }

    #[test]
    fn test_generate_json_report() {
        let record = create_test_record();
        let json = generate_json_report(&record).unwrap();

        assert!(json.contains("\"weighted_score\""));
        assert!(json.contains("\"improve_then_publish\""));
        assert!(json.contains("\"seats\""));
    }
}
