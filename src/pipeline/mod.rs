use thiserror::Error;

use crate::input::gene_list::GeneList;
use crate::input::table::CsvTable;
use crate::input::{DuplicateKeyError, InputError};
use crate::model::stats::UndefinedStatistic;
use crate::model::timecourse::{TimeCourseConfig, TimePoint};
use crate::report::TimePointSummary;

pub mod stage1_filter;
pub mod stage2_restrict;
pub mod stage3_normalize;
pub mod stage4_aggregate;
pub mod stage5_assemble;
pub mod stage6_export;

use stage1_filter::FilterError;
use stage2_restrict::run_stage2;
use stage3_normalize::run_stage3;
use stage4_aggregate::run_stage4;
use stage5_assemble::{AssembledTables, TimePointResult, run_stage5};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{table} has no key column '{column}'")]
    MissingKeyColumn { table: String, column: String },
    #[error("{table} has more than one column named '{column}'")]
    DuplicateColumn { table: String, column: String },
    #[error("{table} has no replicate columns")]
    NoReplicates { table: String },
    #[error("{table} row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("no allow-listed gene found in time point {time_point}")]
    EmptyRestriction { time_point: String },
    #[error(
        "gene set of time point {time_point} differs from {reference}: {missing} missing, {extra} extra (e.g. '{example}')"
    )]
    GeneSetMismatch {
        reference: String,
        time_point: String,
        missing: usize,
        extra: usize,
        example: String,
    },
    #[error("configuration lists no time points")]
    EmptyConfig,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("expected {expected} time-point tables, got {found}")]
    TimePointCount { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeParams {
    pub variance_threshold: Option<f64>,
}

/// A Stage-1 table handed to Stage 2, with the name used in diagnostics.
#[derive(Debug, Clone)]
pub struct TimePointInput {
    pub time_point: TimePoint,
    pub source_name: String,
    pub table: CsvTable,
}

#[derive(Debug, Clone)]
pub struct NormalizeOutput {
    pub tables: AssembledTables,
    pub time_points: Vec<TimePointSummary>,
    pub undefined: Vec<UndefinedStatistic>,
}

/// Stage 2: restrict, rename, normalize, aggregate and assemble every time point.
pub fn normalize_time_course(
    config: &TimeCourseConfig,
    inputs: &[TimePointInput],
    gene_list: &GeneList,
    params: &NormalizeParams,
) -> Result<NormalizeOutput, PipelineError> {
    if inputs.len() != config.time_points.len() {
        return Err(ValidationError::TimePointCount {
            expected: config.time_points.len(),
            found: inputs.len(),
        }
        .into());
    }

    let mut results = Vec::with_capacity(inputs.len());
    let mut summaries = Vec::with_capacity(inputs.len());
    let mut undefined = Vec::new();

    for input in inputs {
        let tp = &input.time_point;
        let restriction = run_stage2(
            &input.table,
            &input.source_name,
            &config.key_column,
            tp,
            gene_list,
        )?;
        let normalized = run_stage3(&restriction.matrix);
        let stage4 = run_stage4(&normalized, tp, params.variance_threshold);

        summaries.push(TimePointSummary {
            label: tp.label.clone(),
            time: tp.time.clone(),
            marker: tp.marker.clone(),
            n_replicates: restriction.matrix.columns.len(),
            n_genes_input: restriction.n_genes_input,
            n_genes_retained: restriction.matrix.n_genes(),
            absent_from_table: restriction.absent_from_table,
            n_zero_max_rows: normalized.zero_max_rows.len(),
            n_undefined: stage4.undefined.len(),
            high_variance_genes: stage4.high_variance,
        });
        undefined.extend(stage4.undefined);
        results.push(TimePointResult {
            time_point: tp.clone(),
            normalized,
            stats: stage4.stats,
        });
    }

    let tables = run_stage5(config, &results)?;
    Ok(NormalizeOutput {
        tables,
        time_points: summaries,
        undefined,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
