use thiserror::Error;

use crate::input::table::CsvTable;
use crate::model::timecourse::{TimeCourseConfig, TimePoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{table} has no key column '{column}'")]
    MissingKeyColumn { table: String, column: String },
    #[error("no column of {table} matches time point {label} (marker '{marker}')")]
    NoMatchingColumns {
        table: String,
        label: String,
        marker: String,
    },
}

#[derive(Debug, Clone)]
pub struct FilteredSubset {
    pub time_point: TimePoint,
    pub table: CsvTable,
}

/// Keeps the key column plus every column whose name contains the time point marker.
/// Rows are neither dropped nor reordered.
pub fn filter_columns(
    table: &CsvTable,
    table_name: &str,
    key_column: &str,
    time_point: &TimePoint,
) -> Result<CsvTable, FilterError> {
    let key_idx = table
        .column_index(key_column)
        .ok_or_else(|| FilterError::MissingKeyColumn {
            table: table_name.to_string(),
            column: key_column.to_string(),
        })?;

    let mut selected = vec![key_idx];
    for (idx, name) in table.header.iter().enumerate() {
        if idx != key_idx && name.contains(&time_point.marker) {
            selected.push(idx);
        }
    }
    if selected.len() == 1 {
        return Err(FilterError::NoMatchingColumns {
            table: table_name.to_string(),
            label: time_point.label.clone(),
            marker: time_point.marker.clone(),
        });
    }

    let header = selected.iter().map(|&i| table.header[i].clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| {
            selected
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(CsvTable { header, rows })
}

pub fn run_stage1(
    table: &CsvTable,
    table_name: &str,
    config: &TimeCourseConfig,
) -> Result<Vec<FilteredSubset>, FilterError> {
    let mut out = Vec::with_capacity(config.time_points.len());
    for tp in &config.time_points {
        let subset = filter_columns(table, table_name, &config.key_column, tp)?;
        tracing::info!(
            "time point {}: {} of {} columns match '{}'",
            tp.label,
            subset.n_cols() - 1,
            table.n_cols() - 1,
            tp.marker
        );
        out.push(FilteredSubset {
            time_point: tp.clone(),
            table: subset,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_filter.rs"]
mod tests;
