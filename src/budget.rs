//! Per-seat budget tracking.
//!
//! Each analyst seat has its own spending slot; the ledger is advisory.
//! `can_spend` is consulted immediately before a call and there is no
//! reservation step, which is acceptable for a fixed panel of three
//! seats whose spend is recorded sequentially after the panel joins.

use crate::models::ProducerKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Utilization level above which the ledger emits advisory warnings.
const WARN_UTILIZATION: f64 = 0.9;

/// Session spend above which the ledger emits a cost warning (USD).
const WARN_SESSION_COST: f64 = 10.0;

/// Errors raised when constructing a ledger from configuration.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("seat budgets ({slots:.2}) exceed the per-review limit ({total:.2})")]
    SlotsExceedTotal { slots: f64, total: f64 },
    #[error("budget limit for {producer} must be positive, got {limit}")]
    NonPositiveLimit { producer: ProducerKind, limit: f64 },
}

/// One seat's cumulative spend against its limit.
///
/// Spend only ever increases; `reset` is the only way back to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSlot {
    pub limit: f64,
    pub spent: f64,
    pub requests: u32,
}

impl BudgetSlot {
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            spent: 0.0,
            requests: 0,
        }
    }

    /// True iff recording `amount` would stay within the limit.
    pub fn can_spend(&self, amount: f64) -> bool {
        self.spent + amount <= self.limit
    }

    /// Record an actual spend. Monotonic: there is no rollback.
    pub fn record_spend(&mut self, amount: f64) {
        self.spent += amount;
        self.requests += 1;
    }

    /// Fraction of the limit already spent.
    pub fn utilization(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        self.spent / self.limit
    }

    /// Mean cost per recorded request.
    #[allow(dead_code)] // Utility for budget status displays
    pub fn avg_cost_per_request(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.spent / f64::from(self.requests)
    }
}

/// Budget ledger for the whole panel: one slot per seat plus a
/// per-review total used for utilization reporting.
///
/// Slots are per-seat and never contended, so no locking discipline is
/// needed; the coordinator records spend after each call completes.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLedger {
    game: BudgetSlot,
    quality: BudgetSlot,
    growth: BudgetSlot,
    review_total: f64,
}

impl BudgetLedger {
    /// Build a ledger, rejecting configurations whose seat limits exceed
    /// the per-review total.
    pub fn new(
        game_limit: f64,
        quality_limit: f64,
        growth_limit: f64,
        review_total: f64,
    ) -> Result<Self, BudgetError> {
        for (kind, limit) in [
            (ProducerKind::GameAnalyst, game_limit),
            (ProducerKind::ReviewQuality, quality_limit),
            (ProducerKind::AudienceGrowth, growth_limit),
        ] {
            if limit <= 0.0 {
                return Err(BudgetError::NonPositiveLimit {
                    producer: kind,
                    limit,
                });
            }
        }

        let slots = game_limit + quality_limit + growth_limit;
        if slots > review_total {
            return Err(BudgetError::SlotsExceedTotal {
                slots,
                total: review_total,
            });
        }

        Ok(Self {
            game: BudgetSlot::new(game_limit),
            quality: BudgetSlot::new(quality_limit),
            growth: BudgetSlot::new(growth_limit),
            review_total,
        })
    }

    pub fn slot(&self, kind: ProducerKind) -> &BudgetSlot {
        match kind {
            ProducerKind::GameAnalyst => &self.game,
            ProducerKind::ReviewQuality => &self.quality,
            ProducerKind::AudienceGrowth => &self.growth,
        }
    }

    fn slot_mut(&mut self, kind: ProducerKind) -> &mut BudgetSlot {
        match kind {
            ProducerKind::GameAnalyst => &mut self.game,
            ProducerKind::ReviewQuality => &mut self.quality,
            ProducerKind::AudienceGrowth => &mut self.growth,
        }
    }

    /// Advisory pre-call check for one seat.
    pub fn can_spend(&self, kind: ProducerKind, amount: f64) -> bool {
        self.slot(kind).can_spend(amount)
    }

    /// Record actual spend for one seat.
    pub fn record_spend(&mut self, kind: ProducerKind, amount: f64) {
        self.slot_mut(kind).record_spend(amount);
    }

    /// Total spend across all seats this session.
    pub fn total_spent(&self) -> f64 {
        self.game.spent + self.quality.spent + self.growth.spent
    }

    /// Per-review budget configured for the whole panel.
    #[allow(dead_code)] // Utility accessor (utilization covers the common case)
    pub fn review_total(&self) -> f64 {
        self.review_total
    }

    /// Spend as a fraction of the per-review total.
    pub fn utilization(&self) -> f64 {
        if self.review_total <= 0.0 {
            return 0.0;
        }
        self.total_spent() / self.review_total
    }

    /// Advisory warnings: near-exhausted slots and high session cost.
    /// Never used to block a call.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for kind in ProducerKind::all() {
            let slot = self.slot(kind);
            if slot.utilization() > WARN_UTILIZATION {
                warnings.push(format!(
                    "{} budget {:.0}% utilized ({:.3} of {:.3})",
                    kind,
                    slot.utilization() * 100.0,
                    slot.spent,
                    slot.limit
                ));
            }
        }

        if self.total_spent() > WARN_SESSION_COST {
            warnings.push(format!("session cost high: ${:.2}", self.total_spent()));
        }

        warnings
    }

    /// Reset all slots for a new session.
    pub fn reset(&mut self) {
        for kind in ProducerKind::all() {
            let slot = self.slot_mut(kind);
            slot.spent = 0.0;
            slot.requests = 0;
        }
    }
}
