use std::collections::{HashMap, HashSet};

use crate::input::gene_list::GeneList;
use crate::input::table::CsvTable;
use crate::input::{DuplicateKeyError, InputError};
use crate::model::timecourse::{DEFAULT_KEY_COLUMN, TimePoint};
use crate::pipeline::{PipelineError, ValidationError};

/// Numeric replicate matrix keyed by gene. `None` is a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    pub key_column: String,
    pub genes: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CountMatrix {
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }
}

#[derive(Debug, Clone)]
pub struct Restriction {
    pub matrix: CountMatrix,
    pub n_genes_input: usize,
    /// Allow-listed genes that the count table does not contain.
    pub absent_from_table: Vec<String>,
}

pub fn parse_cell(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan")
    {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(format!("'{trimmed}' is not a number")),
    }
}

/// Renames the key column to `gene_name` and the replicate columns to
/// `<marker>_<i>` (original order), then parses the counts.
pub fn parse_count_matrix(
    table: &CsvTable,
    table_name: &str,
    key_column: &str,
    time_point: &TimePoint,
) -> Result<CountMatrix, PipelineError> {
    let key_idx = table
        .column_index(key_column)
        .ok_or_else(|| ValidationError::MissingKeyColumn {
            table: table_name.to_string(),
            column: key_column.to_string(),
        })?;

    let replicate_idx: Vec<usize> = (0..table.n_cols()).filter(|&i| i != key_idx).collect();
    if replicate_idx.is_empty() {
        return Err(ValidationError::NoReplicates {
            table: table_name.to_string(),
        }
        .into());
    }
    let columns = (1..=replicate_idx.len())
        .map(|i| time_point.replicate_name(i))
        .collect();

    let mut genes = Vec::with_capacity(table.n_rows());
    let mut values = Vec::with_capacity(table.n_rows());
    for (row_no, row) in table.rows.iter().enumerate() {
        if row.len() != table.n_cols() {
            return Err(ValidationError::RaggedRow {
                table: table_name.to_string(),
                row: row_no + 1,
                expected: table.n_cols(),
                found: row.len(),
            }
            .into());
        }
        let gene = row[key_idx].trim();

        let mut parsed = Vec::with_capacity(replicate_idx.len());
        for &col in &replicate_idx {
            let v = parse_cell(&row[col]).map_err(|msg| {
                InputError::Parse(format!(
                    "{} row {} column '{}': {}",
                    table_name,
                    row_no + 1,
                    table.header[col],
                    msg
                ))
            })?;
            parsed.push(v);
        }
        genes.push(gene.to_string());
        values.push(parsed);
    }

    Ok(CountMatrix {
        key_column: DEFAULT_KEY_COLUMN.to_string(),
        genes,
        columns,
        values,
    })
}

/// Inner join with the allow-list. Keeps the count table's row order.
/// Only allow-listed genes must be unique; repeats of genes the join drops
/// are logged and discarded with them.
pub fn restrict_to_gene_list(
    matrix: CountMatrix,
    gene_list: &GeneList,
    source_name: &str,
) -> Result<Restriction, DuplicateKeyError> {
    let n_genes_input = matrix.n_genes();
    let present: HashSet<&str> = matrix.genes.iter().map(|g| g.as_str()).collect();
    let absent_from_table = gene_list
        .genes
        .iter()
        .filter(|g| !present.contains(g.as_str()))
        .cloned()
        .collect();

    let CountMatrix {
        key_column,
        genes,
        columns,
        values,
    } = matrix;
    // gene -> 1-based data row of its first occurrence
    let mut kept: HashMap<String, usize> = HashMap::new();
    let mut dropped: HashSet<String> = HashSet::new();
    let mut n_dropped_repeats = 0usize;
    let mut kept_genes = Vec::new();
    let mut kept_values = Vec::new();
    for (row_no, (gene, row)) in genes.into_iter().zip(values).enumerate() {
        if !gene_list.contains(&gene) {
            if !dropped.insert(gene) {
                n_dropped_repeats += 1;
            }
            continue;
        }
        if let Some(&first_row) = kept.get(&gene) {
            return Err(DuplicateKeyError {
                source_name: source_name.to_string(),
                key: gene,
                first_row,
                duplicate_row: row_no + 1,
            });
        }
        kept.insert(gene.clone(), row_no + 1);
        kept_genes.push(gene);
        kept_values.push(row);
    }
    if n_dropped_repeats > 0 {
        tracing::warn!(
            "{}: {} repeated rows of genes outside the allow-list ignored",
            source_name,
            n_dropped_repeats
        );
    }

    Ok(Restriction {
        matrix: CountMatrix {
            key_column,
            genes: kept_genes,
            columns,
            values: kept_values,
        },
        n_genes_input,
        absent_from_table,
    })
}

pub fn run_stage2(
    table: &CsvTable,
    table_name: &str,
    key_column: &str,
    time_point: &TimePoint,
    gene_list: &GeneList,
) -> Result<Restriction, PipelineError> {
    let matrix = parse_count_matrix(table, table_name, key_column, time_point)?;
    let restriction = restrict_to_gene_list(matrix, gene_list, table_name)?;
    if restriction.matrix.n_genes() == 0 {
        return Err(ValidationError::EmptyRestriction {
            time_point: time_point.label.clone(),
        }
        .into());
    }
    tracing::info!(
        "time point {}: {} of {} genes retained by allow-list ({} allow-listed genes absent)",
        time_point.label,
        restriction.matrix.n_genes(),
        restriction.n_genes_input,
        restriction.absent_from_table.len()
    );
    Ok(restriction)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_restrict.rs"]
mod tests;
