use std::collections::{BTreeSet, HashMap};

use crate::input::table::CsvTable;
use crate::model::stats::GeneStat;
use crate::model::timecourse::{DEFAULT_KEY_COLUMN, TimeCourseConfig, TimePoint};
use crate::pipeline::ValidationError;
use crate::pipeline::stage3_normalize::NormalizedMatrix;
use crate::report::format_f64;

pub const OBS_TIME_HEADER: &str = "time";

#[derive(Debug, Clone)]
pub struct TimePointResult {
    pub time_point: TimePoint,
    pub normalized: NormalizedMatrix,
    pub stats: Vec<GeneStat>,
}

impl TimePointResult {
    fn row_index(&self) -> HashMap<&str, usize> {
        self.normalized
            .genes
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AssembledTables {
    pub normalized: Vec<(TimePoint, CsvTable)>,
    pub summaries: Vec<(TimePoint, CsvTable)>,
    pub combined: CsvTable,
    /// Headerless rows; the first row carries the column names.
    pub observations: Vec<Vec<String>>,
}

pub fn normalized_table(result: &TimePointResult) -> CsvTable {
    let mut header = vec![DEFAULT_KEY_COLUMN.to_string()];
    header.extend(result.normalized.columns.iter().cloned());
    let mut table = CsvTable::new(header);
    for (gene, row) in result.normalized.genes.iter().zip(&result.normalized.values) {
        let mut out = vec![gene.clone()];
        out.extend(row.iter().map(|v| format_f64(*v)));
        table.rows.push(out);
    }
    table
}

pub fn summary_table(config: &TimeCourseConfig, result: &TimePointResult) -> CsvTable {
    let mut table = normalized_table(result);
    table.header.push(config.mean_column(&result.time_point));
    table.header.push(config.std_column(&result.time_point));
    for (row, stat) in table.rows.iter_mut().zip(&result.stats) {
        row.push(format_f64(stat.mean));
        row.push(format_f64(stat.std));
    }
    table
}

/// All time points must carry the same gene set; values are later aligned by gene, not position.
pub fn check_alignment(results: &[TimePointResult]) -> Result<(), ValidationError> {
    let Some(first) = results.first() else {
        return Ok(());
    };
    let reference: BTreeSet<&str> = first.normalized.genes.iter().map(|g| g.as_str()).collect();
    for result in &results[1..] {
        let genes: BTreeSet<&str> = result.normalized.genes.iter().map(|g| g.as_str()).collect();
        if genes != reference {
            let missing: Vec<&str> = reference.difference(&genes).copied().collect();
            let extra: Vec<&str> = genes.difference(&reference).copied().collect();
            let example = missing
                .first()
                .or_else(|| extra.first())
                .map(|s| s.to_string())
                .unwrap_or_default();
            return Err(ValidationError::GeneSetMismatch {
                reference: first.time_point.label.clone(),
                time_point: result.time_point.label.clone(),
                missing: missing.len(),
                extra: extra.len(),
                example,
            });
        }
    }
    Ok(())
}

/// Summaries joined on gene, in the first time point's gene order.
pub fn combined_table(config: &TimeCourseConfig, results: &[TimePointResult]) -> CsvTable {
    let summaries: Vec<CsvTable> = results.iter().map(|r| summary_table(config, r)).collect();
    let indices: Vec<HashMap<&str, usize>> = results.iter().map(|r| r.row_index()).collect();

    let mut header = vec![DEFAULT_KEY_COLUMN.to_string()];
    for s in &summaries {
        header.extend(s.header.iter().skip(1).cloned());
    }
    let mut table = CsvTable::new(header);

    let Some(first) = results.first() else {
        return table;
    };
    for gene in &first.normalized.genes {
        let mut row = vec![gene.clone()];
        let mut complete = true;
        for (summary, index) in summaries.iter().zip(&indices) {
            match index.get(gene.as_str()) {
                Some(&i) => row.extend(summary.rows[i].iter().skip(1).cloned()),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            table.rows.push(row);
        }
    }
    table
}

/// Mean and std rows per gene, sorted by row name, transposed so time points become rows.
pub fn observation_rows(results: &[TimePointResult]) -> Vec<Vec<String>> {
    let Some(first) = results.first() else {
        return Vec::new();
    };
    let indices: Vec<HashMap<&str, usize>> = results.iter().map(|r| r.row_index()).collect();

    let mut stacked: Vec<(String, Vec<Option<f64>>)> = Vec::with_capacity(first.stats.len() * 2);
    for gene in &first.normalized.genes {
        let lookup = |pick: fn(&GeneStat) -> Option<f64>| -> Vec<Option<f64>> {
            results
                .iter()
                .zip(&indices)
                .map(|(r, idx)| idx.get(gene.as_str()).and_then(|&i| pick(&r.stats[i])))
                .collect()
        };
        stacked.push((format!("{gene}_obs"), lookup(|s: &GeneStat| s.mean)));
        stacked.push((format!("{gene}_obs_std"), lookup(|s: &GeneStat| s.std)));
    }
    stacked.sort_by(|a, b| a.0.cmp(&b.0));

    let mut rows = Vec::with_capacity(results.len() + 1);
    let mut names = vec![OBS_TIME_HEADER.to_string()];
    names.extend(stacked.iter().map(|(name, _)| name.clone()));
    rows.push(names);
    for (t, result) in results.iter().enumerate() {
        let mut row = vec![result.time_point.time.clone()];
        row.extend(stacked.iter().map(|(_, values)| format_f64(values[t])));
        rows.push(row);
    }
    rows
}

pub fn run_stage5(
    config: &TimeCourseConfig,
    results: &[TimePointResult],
) -> Result<AssembledTables, ValidationError> {
    check_alignment(results)?;

    let normalized = results
        .iter()
        .map(|r| (r.time_point.clone(), normalized_table(r)))
        .collect();
    let summaries = results
        .iter()
        .map(|r| (r.time_point.clone(), summary_table(config, r)))
        .collect();
    let combined = combined_table(config, results);
    let observations = observation_rows(results);

    tracing::info!(
        "assembled {} genes across {} time points ({} observation columns)",
        combined.n_rows(),
        results.len(),
        observations.first().map_or(0, |r| r.len().saturating_sub(1))
    );

    Ok(AssembledTables {
        normalized,
        summaries,
        combined,
        observations,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_assemble.rs"]
mod tests;
