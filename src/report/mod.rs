use serde::Serialize;

use crate::model::stats::UndefinedStatistic;

pub mod json;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct TimePointSummary {
    pub label: String,
    pub time: String,
    pub marker: String,
    pub n_replicates: usize,
    pub n_genes_input: usize,
    pub n_genes_retained: usize,
    pub absent_from_table: Vec<String>,
    pub n_zero_max_rows: usize,
    pub n_undefined: usize,
    pub high_variance_genes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub sample: String,
    pub n_allow_listed: usize,
    pub variance_threshold: Option<f64>,
    pub n_genes_combined: usize,
    pub time_points: Vec<TimePointSummary>,
    pub undefined_statistics: Vec<UndefinedStatistic>,
    pub outputs: Vec<String>,
}

/// Shortest round-trip form; integral values keep a trailing `.0`. Missing is an empty cell.
pub fn format_f64(v: Option<f64>) -> String {
    match v {
        None => String::new(),
        Some(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => format!("{x:.1}"),
        Some(x) => format!("{x}"),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
