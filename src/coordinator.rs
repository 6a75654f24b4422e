//! Panel coordination: concurrent seat calls under one deadline.
//!
//! A single coordinating task launches all three producers at once and
//! joins them under the group deadline. Seats that fail individually
//! are replaced by fallback opinions before aggregation; if the whole
//! panel misses the deadline, the batch is discarded and an emergency
//! verdict is returned instead. Dropping the joined futures at the
//! deadline aborts the seats' in-flight HTTP requests.

use crate::analysis::{
    build_consensus, emergency_aggregate, AggregationSettings, ConsensusContext, ConsensusError,
};
use crate::budget::BudgetLedger;
use crate::models::{Aggregate, ProducerKind, ReviewRequest};
use crate::producer::fallback::fallback_opinion;
use crate::producer::{ChatBackend, OpinionProducer};
use futures::future::join_all;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, warn};

/// Rolling metrics for the lifetime of one coordinator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetrics {
    pub reviews_processed: u32,
    pub total_cost: f64,
    pub avg_processing_seconds: f64,
    pub timeouts: u32,
}

impl SessionMetrics {
    fn record(&mut self, aggregate: &Aggregate, elapsed_seconds: f64) {
        self.reviews_processed += 1;
        self.total_cost += aggregate.cost.total;

        let n = f64::from(self.reviews_processed);
        self.avg_processing_seconds =
            (self.avg_processing_seconds * (n - 1.0) + elapsed_seconds) / n;

        if aggregate.metrics.timed_out {
            self.timeouts += 1;
        }
    }
}

/// Coordinates the analyst panel for review-processing requests.
pub struct PanelCoordinator<B: ChatBackend> {
    backend: B,
    ledger: BudgetLedger,
    settings: AggregationSettings,
    group_timeout: Duration,
    session: SessionMetrics,
}

impl<B: ChatBackend> PanelCoordinator<B> {
    pub fn new(
        backend: B,
        ledger: BudgetLedger,
        settings: AggregationSettings,
        group_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            ledger,
            settings,
            group_timeout,
            session: SessionMetrics::default(),
        }
    }

    /// Process one review request through the full panel.
    ///
    /// Always resolves to a well-formed aggregate unless the panel
    /// itself violates the aggregation contract, which cannot happen
    /// through this path and would indicate a bug.
    pub async fn process_review(
        &mut self,
        request: &ReviewRequest,
    ) -> Result<Aggregate, ConsensusError> {
        let started = Instant::now();
        info!("Analyst panel starting for '{}'", request.game.name);

        let producers: Vec<OpinionProducer> = ProducerKind::all()
            .into_iter()
            .map(OpinionProducer::new)
            .collect();

        let panel = join_all(
            producers
                .iter()
                .map(|producer| producer.produce(&self.backend, request, &self.ledger)),
        );

        let joined = timeout(self.group_timeout, panel).await;

        let results = match joined {
            Ok(results) => results,
            Err(_) => {
                // The joined futures were just dropped, cancelling any
                // in-flight seat calls.
                warn!(
                    "panel deadline of {}s elapsed; returning emergency verdict",
                    self.group_timeout.as_secs()
                );
                let elapsed = started.elapsed().as_secs_f64();
                let aggregate = emergency_aggregate(elapsed);
                self.session.record(&aggregate, elapsed);
                return Ok(aggregate);
            }
        };

        // Spend is recorded sequentially here, after the panel joins;
        // seats never touch the ledger concurrently.
        let mut opinions = Vec::with_capacity(results.len());
        for (producer, result) in producers.iter().zip(results) {
            match result {
                Ok(opinion) => {
                    self.ledger.record_spend(opinion.producer, opinion.cost);
                    opinions.push(opinion);
                }
                Err(e) => {
                    warn!("{} failed: {}; substituting fallback", producer.kind(), e);
                    opinions.push(fallback_opinion(producer.kind()));
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        let context = ConsensusContext {
            elapsed_seconds: elapsed,
            budget_utilization: self.ledger.utilization(),
        };

        let aggregate = build_consensus(&opinions, &self.settings, &context)?;

        for warning in self.ledger.warnings() {
            warn!("{}", warning);
        }

        self.session.record(&aggregate, elapsed);
        info!(
            "Panel verdict: {:.2} ({})",
            aggregate.weighted_score, aggregate.recommended_action
        );

        Ok(aggregate)
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn session_metrics(&self) -> &SessionMetrics {
        &self.session
    }

    /// Reset budgets and metrics for a new session.
    pub fn reset_session(&mut self) {
        self.ledger.reset();
        self.session = SessionMetrics::default();
    }
}
