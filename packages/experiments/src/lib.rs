// ABOUTME: A/B tests for landing pages and calls to action
// ABOUTME: Deterministic assignment, de-duplicated events and z-test results

pub mod assignment;
pub mod results;
pub mod storage;
pub mod types;

pub use assignment::{assign_variant, bucket};
pub use results::{compute_results, z_score, VariantCounts, MIN_IMPRESSIONS, Z_CRITICAL};
pub use storage::ExperimentStorage;
pub use types::{
    Assignment, EventKind, Experiment, ExperimentCreateInput, ExperimentResults, ExperimentStatus,
    ExperimentUpdateInput, Variant, VariantInput, VariantResult,
};
