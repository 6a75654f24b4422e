//! Opinion producers: one external model call per analyst seat.
//!
//! A producer builds its seat's prompt, checks its budget slot, performs
//! one chat call, and parses the reply into a typed opinion. Every
//! failure mode is normalized into [`ProducerError`] so the coordinator
//! can substitute a fallback opinion instead of propagating transport
//! errors.

pub mod fallback;
pub mod llm;
pub mod parse;
pub mod prompts;

pub use llm::{ChatBackend, ChatRequest, LlmClient};

use crate::budget::BudgetLedger;
use crate::models::{Opinion, OpinionOrigin, ProducerKind, ReviewRequest};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Why a seat failed to produce a live opinion.
///
/// All variants signal "use fallback"; none of them abort the request.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("{producer} budget exhausted: {spent:.3} of {limit:.3} spent, call estimated at {estimate:.3}")]
    BudgetExhausted {
        producer: ProducerKind,
        spent: f64,
        limit: f64,
        estimate: f64,
    },

    #[error("cannot connect to the model endpoint at {url}")]
    Connect { url: String },

    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("{producer} returned a malformed reply: {reason}")]
    MalformedReply {
        producer: ProducerKind,
        reason: String,
    },

    #[error("model request failed: {0}")]
    Request(String),
}

/// Fixed per-seat call parameters.
#[derive(Debug, Clone, Copy)]
pub struct ProducerSpec {
    pub kind: ProducerKind,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Pre-call cost estimate, also recorded as the actual spend.
    pub estimated_cost: f64,
}

impl ProducerSpec {
    /// Call parameters for one seat.
    pub fn for_kind(kind: ProducerKind) -> Self {
        match kind {
            ProducerKind::GameAnalyst => Self {
                kind,
                max_tokens: 1200,
                temperature: 0.3,
                estimated_cost: 0.05,
            },
            ProducerKind::ReviewQuality => Self {
                kind,
                max_tokens: 1000,
                temperature: 0.2,
                estimated_cost: 0.05,
            },
            ProducerKind::AudienceGrowth => Self {
                kind,
                max_tokens: 800,
                temperature: 0.4,
                estimated_cost: 0.04,
            },
        }
    }
}

/// One analyst seat, ready to produce an opinion.
pub struct OpinionProducer {
    spec: ProducerSpec,
}

impl OpinionProducer {
    pub fn new(kind: ProducerKind) -> Self {
        Self {
            spec: ProducerSpec::for_kind(kind),
        }
    }

    pub fn kind(&self) -> ProducerKind {
        self.spec.kind
    }

    #[allow(dead_code)] // Utility accessor
    pub fn estimated_cost(&self) -> f64 {
        self.spec.estimated_cost
    }

    /// Attempt one model call for this seat.
    ///
    /// The budget check is advisory and happens immediately before the
    /// call; spend is recorded by the coordinator once the panel joins.
    pub async fn produce<B: ChatBackend>(
        &self,
        backend: &B,
        request: &ReviewRequest,
        ledger: &BudgetLedger,
    ) -> Result<Opinion, ProducerError> {
        let kind = self.spec.kind;

        if !ledger.can_spend(kind, self.spec.estimated_cost) {
            let slot = ledger.slot(kind);
            return Err(ProducerError::BudgetExhausted {
                producer: kind,
                spent: slot.spent,
                limit: slot.limit,
                estimate: self.spec.estimated_cost,
            });
        }

        let (system_prompt, user_prompt) = prompts::build(kind, request);
        let prompt_tokens = (system_prompt.len() + user_prompt.len()) / 4;

        let chat = ChatRequest {
            system_prompt,
            user_prompt,
            max_tokens: self.spec.max_tokens,
            temperature: self.spec.temperature,
            json_output: true,
        };

        let started = Instant::now();
        let reply = backend.chat(&chat).await?;
        let latency_seconds = started.elapsed().as_secs_f64();

        let insights = parse::parse_insights(kind, &reply)?;
        debug_assert_eq!(insights.kind(), kind);
        let confidence = (insights.key_score().unwrap_or(5.0) / 10.0).clamp(0.0, 1.0);

        debug!(
            "{} answered in {:.2}s (confidence {:.2})",
            kind, latency_seconds, confidence
        );

        Ok(Opinion {
            producer: kind,
            origin: OpinionOrigin::Live,
            confidence,
            insights,
            cost: self.spec.estimated_cost,
            latency_seconds,
            prompt_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameMetadata;

    struct CannedBackend {
        reply: String,
    }

    impl ChatBackend for CannedBackend {
        fn chat(
            &self,
            _request: &ChatRequest,
        ) -> impl std::future::Future<Output = Result<String, ProducerError>> + Send {
            let reply = self.reply.clone();
            async move { Ok(reply) }
        }
    }

    struct FailingBackend;

    impl ChatBackend for FailingBackend {
        fn chat(
            &self,
            _request: &ChatRequest,
        ) -> impl std::future::Future<Output = Result<String, ProducerError>> + Send {
            async move {
                Err(ProducerError::Connect {
                    url: "http://localhost:11434".to_string(),
                })
            }
        }
    }

    fn request() -> ReviewRequest {
        ReviewRequest {
            video_reference: "footage.mp4".to_string(),
            game: GameMetadata {
                name: "Beat Blade".to_string(),
                genre: "rhythm".to_string(),
                platform: "VR".to_string(),
                price: Some(29.99),
                target_audience: Some("teens".to_string()),
            },
        }
    }

    fn ledger() -> BudgetLedger {
        BudgetLedger::new(0.07, 0.07, 0.06, 0.20).unwrap()
    }

    #[tokio::test]
    async fn test_produce_live_opinion() {
        let backend = CannedBackend {
            reply: r#"{"recommendation_score": 8, "must_cover_topics": ["comfort"]}"#.to_string(),
        };
        let producer = OpinionProducer::new(ProducerKind::GameAnalyst);

        let opinion = producer
            .produce(&backend, &request(), &ledger())
            .await
            .unwrap();

        assert_eq!(opinion.producer, ProducerKind::GameAnalyst);
        assert_eq!(opinion.origin, OpinionOrigin::Live);
        assert!((opinion.confidence - 0.8).abs() < 1e-9);
        assert!((opinion.cost - 0.05).abs() < 1e-9);
        assert!(opinion.prompt_tokens > 0);
    }

    #[tokio::test]
    async fn test_produce_without_key_score_defaults_midpoint() {
        let backend = CannedBackend {
            reply: r#"{"unique_features": ["hand tracking"]}"#.to_string(),
        };
        let producer = OpinionProducer::new(ProducerKind::GameAnalyst);

        let opinion = producer
            .produce(&backend, &request(), &ledger())
            .await
            .unwrap();

        assert!((opinion.confidence - 0.5).abs() < 1e-9);
        assert_eq!(opinion.insights.key_score(), None);
    }

    #[tokio::test]
    async fn test_produce_surfaces_backend_failure() {
        let producer = OpinionProducer::new(ProducerKind::ReviewQuality);
        let err = producer
            .produce(&FailingBackend, &request(), &ledger())
            .await
            .unwrap_err();
        assert!(matches!(err, ProducerError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_produce_respects_budget() {
        let backend = CannedBackend {
            reply: r#"{"growth_potential": 7}"#.to_string(),
        };
        let mut ledger = ledger();
        ledger.record_spend(ProducerKind::AudienceGrowth, 0.05);

        let producer = OpinionProducer::new(ProducerKind::AudienceGrowth);
        let err = producer
            .produce(&backend, &request(), &ledger)
            .await
            .unwrap_err();
        assert!(matches!(err, ProducerError::BudgetExhausted { .. }));
    }

    #[test]
    fn test_call_parameters_per_seat() {
        let game = ProducerSpec::for_kind(ProducerKind::GameAnalyst);
        let growth = ProducerSpec::for_kind(ProducerKind::AudienceGrowth);
        assert_eq!(game.max_tokens, 1200);
        assert!((growth.estimated_cost - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_produce_drives_without_a_full_runtime() {
        let backend = CannedBackend {
            reply: r#"{"growth_potential": 6}"#.to_string(),
        };
        let producer = OpinionProducer::new(ProducerKind::AudienceGrowth);

        let opinion =
            tokio_test::block_on(producer.produce(&backend, &request(), &ledger())).unwrap();
        assert_eq!(opinion.insights.key_score(), Some(6.0));
    }
}
