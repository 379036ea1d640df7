use std::collections::HashSet;

use crate::model::stats::{GeneStat, UndefinedReason, UndefinedStatistic};
use crate::model::timecourse::TimePoint;
use crate::pipeline::stage3_normalize::NormalizedMatrix;

#[derive(Debug, Clone)]
pub struct Stage4Output {
    pub stats: Vec<GeneStat>,
    pub undefined: Vec<UndefinedStatistic>,
    pub high_variance: Vec<String>,
}

/// Exact zeros are dropouts, not biological zeros.
pub fn mask_dropouts(row: &[Option<f64>]) -> Vec<Option<f64>> {
    row.iter()
        .map(|v| match v {
            Some(x) if *x == 0.0 => None,
            other => *other,
        })
        .collect()
}

/// Mean and population standard deviation over the non-missing entries.
pub fn mean_std(values: &[Option<f64>]) -> GeneStat {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return GeneStat::undefined();
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    GeneStat {
        mean: Some(mean),
        std: Some(var.sqrt()),
    }
}

pub fn run_stage4(
    normalized: &NormalizedMatrix,
    time_point: &TimePoint,
    variance_threshold: Option<f64>,
) -> Stage4Output {
    let mut stats = Vec::with_capacity(normalized.values.len());
    let mut undefined = Vec::new();
    let mut high_variance = Vec::new();
    let zero_max: HashSet<usize> = normalized.zero_max_rows.iter().copied().collect();

    for (idx, row) in normalized.values.iter().enumerate() {
        let masked = mask_dropouts(row);
        let stat = mean_std(&masked);
        let gene = &normalized.genes[idx];

        if stat.mean.is_none() {
            let reason = if zero_max.contains(&idx) {
                UndefinedReason::ZeroRowMaximum
            } else {
                UndefinedReason::AllDropout
            };
            undefined.push(UndefinedStatistic {
                time_point: time_point.label.clone(),
                gene: gene.clone(),
                reason,
            });
        }

        if let (Some(threshold), Some(var)) = (variance_threshold, stat.variance()) {
            if var > threshold {
                high_variance.push(gene.clone());
            }
        }
        stats.push(stat);
    }

    if !undefined.is_empty() {
        tracing::warn!(
            "time point {}: {} genes have undefined mean/std",
            time_point.label,
            undefined.len()
        );
    }
    if let Some(threshold) = variance_threshold {
        if high_variance.is_empty() {
            tracing::info!(
                "time point {}: all gene variances within {}",
                time_point.label,
                threshold
            );
        } else {
            tracing::warn!(
                "time point {}: {} genes exceed variance threshold {}",
                time_point.label,
                high_variance.len(),
                threshold
            );
        }
    }

    Stage4Output {
        stats,
        undefined,
        high_variance,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_aggregate.rs"]
mod tests;
