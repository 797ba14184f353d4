// ABOUTME: Conversion statistics for experiment variants
// ABOUTME: Two-proportion z-test of each variant against the control

use crate::types::{Experiment, ExperimentResults, VariantResult};

/// |z| at or above this is significant at the 95% level (two-sided)
pub const Z_CRITICAL: f64 = 1.96;

/// Both arms need this many impressions before significance is claimed
pub const MIN_IMPRESSIONS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantCounts {
    pub impressions: i64,
    pub conversions: i64,
}

impl VariantCounts {
    pub fn rate(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.conversions as f64 / self.impressions as f64
        }
    }
}

/// Pooled two-proportion z-score of `variant` against `control`.
///
/// None when either arm has no impressions or the pooled variance is zero.
pub fn z_score(control: VariantCounts, variant: VariantCounts) -> Option<f64> {
    if control.impressions == 0 || variant.impressions == 0 {
        return None;
    }

    let n1 = control.impressions as f64;
    let n2 = variant.impressions as f64;
    let pooled = (control.conversions + variant.conversions) as f64 / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 || !se.is_finite() {
        return None;
    }

    Some((variant.rate() - control.rate()) / se)
}

/// Build per-variant results; `counts` is looked up by variant id
pub fn compute_results(
    experiment: &Experiment,
    counts: impl Fn(&str) -> VariantCounts,
) -> ExperimentResults {
    let control_counts = experiment.control().map(|c| counts(&c.id));

    let variants: Vec<VariantResult> = experiment
        .variants
        .iter()
        .map(|variant| {
            let own = counts(&variant.id);
            let (lift, z) = match control_counts {
                Some(control) if !variant.is_control => {
                    let lift = (control.rate() > 0.0)
                        .then(|| (own.rate() - control.rate()) / control.rate());
                    (lift, z_score(control, own))
                }
                _ => (None, None),
            };
            let enough_data = control_counts
                .map(|c| c.impressions >= MIN_IMPRESSIONS)
                .unwrap_or(false)
                && own.impressions >= MIN_IMPRESSIONS;

            VariantResult {
                variant_key: variant.key.clone(),
                variant_name: variant.name.clone(),
                is_control: variant.is_control,
                impressions: own.impressions,
                conversions: own.conversions,
                conversion_rate: own.rate(),
                lift,
                z_score: z,
                significant: enough_data && z.map(|z| z.abs() >= Z_CRITICAL).unwrap_or(false),
            }
        })
        .collect();

    let control_rate = control_counts.map(|c| c.rate()).unwrap_or(0.0);
    let winner = variants
        .iter()
        .filter(|v| !v.is_control && v.significant && v.conversion_rate > control_rate)
        .max_by(|a, b| a.conversion_rate.total_cmp(&b.conversion_rate))
        .map(|v| v.variant_key.clone());

    ExperimentResults {
        experiment_id: experiment.id.clone(),
        experiment_key: experiment.key.clone(),
        status: experiment.status,
        variants,
        winner,
    }
}
