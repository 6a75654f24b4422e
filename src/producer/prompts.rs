//! Prompt builders for the analyst seats.
//!
//! Each seat gets a fixed system prompt and a user prompt assembled from
//! the request context. User prompts spell out the exact JSON shape the
//! parser expects; the endpoint is additionally asked for JSON output at
//! the API level.

use crate::models::{ProducerKind, ReviewRequest};

/// System prompt for the game analyst seat.
const GAME_SYSTEM_PROMPT: &str = "You are a VR gaming specialist advising a young \
game reviewer. Judge only the game itself: mechanics, comfort, and what a complete \
review of it has to cover. Reply with a single JSON object and nothing else.";

/// System prompt for the review quality seat.
const QUALITY_SYSTEM_PROMPT: &str = "You are an editor for educational gaming \
content made by young creators. Judge only the review itself: how well it teaches \
other players about the game and how it could be clearer. Reply with a single JSON \
object and nothing else.";

/// System prompt for the audience growth seat.
const GROWTH_SYSTEM_PROMPT: &str = "You are a gaming-community advisor focused on \
safe, positive channel growth for young creators. Judge only the audience side: \
who this review can reach and how to publish it responsibly. Reply with a single \
JSON object and nothing else.";

/// Build the (system, user) prompt pair for one seat.
pub fn build(kind: ProducerKind, request: &ReviewRequest) -> (String, String) {
    match kind {
        ProducerKind::GameAnalyst => (GAME_SYSTEM_PROMPT.to_string(), game_prompt(request)),
        ProducerKind::ReviewQuality => {
            (QUALITY_SYSTEM_PROMPT.to_string(), quality_prompt(request))
        }
        ProducerKind::AudienceGrowth => {
            (GROWTH_SYSTEM_PROMPT.to_string(), growth_prompt(request))
        }
    }
}

fn game_context(request: &ReviewRequest) -> String {
    let game = &request.game;
    let mut context = String::new();

    context.push_str(&format!("Game: {}\n", game.name));
    context.push_str(&format!("Genre: {}\n", game.genre));
    context.push_str(&format!("Platform: {}\n", game.platform));
    if let Some(price) = game.price {
        context.push_str(&format!("Price: ${:.2}\n", price));
    }
    if let Some(ref audience) = game.target_audience {
        context.push_str(&format!("Target audience: {}\n", audience));
    }
    context.push_str(&format!("Review footage: {}\n", request.video_reference));

    context
}

fn game_prompt(request: &ReviewRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("Assess this VR game so the reviewer knows what their review must address.\n\n");
    prompt.push_str(&game_context(request));
    prompt.push_str(
        "\nCover the core VR mechanics, what sets the game apart in its genre, \
interaction and comfort quality, and which topics a complete review cannot skip. \
Score 1-10 fields on a 1-10 scale.\n\n",
    );
    prompt.push_str("Answer in exactly this JSON shape:\n");
    prompt.push_str(
        r#"{
  "recommendation_score": 7,
  "interaction_quality": 7,
  "comfort_rating": 7,
  "vr_mechanics": ["..."],
  "unique_features": ["..."],
  "must_cover_topics": ["..."],
  "genre_comparison": "...",
  "recommendation_reason": "...",
  "target_audience_match": "...",
  "review_talking_points": ["..."]
}"#,
    );

    prompt
}

fn quality_prompt(request: &ReviewRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("Assess the educational quality of this VR game review.\n\n");
    prompt.push_str(&game_context(request));
    prompt.push_str(
        "\nJudge how much the review helps other players decide about the game: \
educational value, structure, clarity, completeness, and engagement, each on a \
1-10 scale. Note missing topics and concrete ways to improve, and whether the \
content suits a teen audience.\n\n",
    );
    prompt.push_str("Answer in exactly this JSON shape:\n");
    prompt.push_str(
        r#"{
  "educational_value": 7,
  "structure_quality": 7,
  "clarity_score": 7,
  "completeness_score": 7,
  "engagement_score": 7,
  "age_appropriate": true,
  "missing_topics": ["..."],
  "improvement_suggestions": ["..."],
  "strengths": ["..."]
}"#,
    );

    prompt
}

fn growth_prompt(request: &ReviewRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("Assess the audience potential of this VR game review.\n\n");
    prompt.push_str(&game_context(request));
    prompt.push_str(
        "\nJudge community interest in the game, alignment with current VR topics, \
appeal to a young audience, and per-platform fit, each on a 1-10 scale. Recommend \
posting timing, hashtags, and engagement opportunities that are safe for a young \
creator.\n\n",
    );
    prompt.push_str("Answer in exactly this JSON shape:\n");
    prompt.push_str(
        r#"{
  "growth_potential": 7,
  "community_interest": 7,
  "trend_alignment": 7,
  "young_audience_appeal": 7,
  "platform_scores": {"youtube": 7, "tiktok": 7},
  "optimal_posting_time": "...",
  "recommended_hashtags": ["..."],
  "engagement_opportunities": ["..."],
  "safety_considerations": ["..."],
  "content_optimization": ["..."]
}"#,
    );

    prompt
}
