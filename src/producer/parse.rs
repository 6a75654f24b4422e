//! Reply parsing for the analyst seats.
//!
//! Models are asked for pure JSON but do not always comply: replies may
//! be wrapped in markdown fences or surrounded by prose. Parsing first
//! extracts the JSON object, then deserializes it strictly into the
//! seat's typed insight struct. A reply that cannot be parsed is a
//! malformed-reply error; missing fields simply become their documented
//! defaults.

use crate::models::{GameInsights, GrowthInsights, Insights, ProducerKind, QualityInsights};
use crate::producer::ProducerError;

/// Parse one seat's reply into its typed insight payload.
pub fn parse_insights(kind: ProducerKind, reply: &str) -> Result<Insights, ProducerError> {
    let json_text = extract_json_object(reply).ok_or_else(|| ProducerError::MalformedReply {
        producer: kind,
        reason: "no JSON object found in reply".to_string(),
    })?;

    let parsed = match kind {
        ProducerKind::GameAnalyst => {
            serde_json::from_str::<GameInsights>(json_text).map(Insights::Game)
        }
        ProducerKind::ReviewQuality => {
            serde_json::from_str::<QualityInsights>(json_text).map(Insights::Quality)
        }
        ProducerKind::AudienceGrowth => {
            serde_json::from_str::<GrowthInsights>(json_text).map(Insights::Growth)
        }
    };

    parsed.map_err(|e| ProducerError::MalformedReply {
        producer: kind,
        reason: e.to_string(),
    })
}

/// Extract the outermost JSON object from a reply.
///
/// Strips markdown fences, then slices from the first `{` to the last
/// `}`. Returns `None` when no object is present.
fn extract_json_object(reply: &str) -> Option<&str> {
    let mut text = reply.trim();

    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    Some(&text[start..=end])
}
