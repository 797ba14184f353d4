// ABOUTME: Deterministic variant assignment
// ABOUTME: A visitor hashes to the same variant for the life of an experiment

use sha2::{Digest, Sha256};

use crate::types::{Experiment, ExperimentStatus, Variant};

/// Stable bucket for a visitor: first 8 bytes of SHA-256("{key}:{visitor}")
pub fn bucket(experiment_key: &str, visitor_id: &str) -> u64 {
    let digest = Sha256::digest(format!("{}:{}", experiment_key, visitor_id).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Pick the variant a visitor should see.
///
/// Only running experiments split traffic; any other status serves the
/// control. Returns None when the experiment has no variants.
pub fn assign_variant<'a>(experiment: &'a Experiment, visitor_id: &str) -> Option<&'a Variant> {
    if experiment.status != ExperimentStatus::Running {
        return experiment.control().or_else(|| experiment.variants.first());
    }

    let total: u64 = experiment
        .variants
        .iter()
        .map(|v| v.weight.max(0) as u64)
        .sum();
    if total == 0 {
        return experiment.control().or_else(|| experiment.variants.first());
    }

    let mut point = bucket(&experiment.key, visitor_id) % total;
    for variant in &experiment.variants {
        let weight = variant.weight.max(0) as u64;
        if point < weight {
            return Some(variant);
        }
        point -= weight;
    }

    experiment.variants.last()
}
