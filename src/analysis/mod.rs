//! Opinion aggregation and consensus building.
//!
//! This module combines the panel's opinions into one verdict.

pub mod consensus;

pub use consensus::{
    build_consensus, emergency_aggregate, AggregationSettings, ConsensusContext, ConsensusError,
};
