use crate::pipeline::stage2_restrict::CountMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatrix {
    pub genes: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Row indices whose maximum was zero or missing.
    pub zero_max_rows: Vec<usize>,
}

pub fn row_maximum(row: &[Option<f64>]) -> Option<f64> {
    row.iter()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
}

/// Divides each value by the row maximum. A zero or missing maximum makes the whole row missing.
pub fn normalize_row(row: &[Option<f64>]) -> Vec<Option<f64>> {
    match row_maximum(row) {
        Some(max) if max != 0.0 => row.iter().map(|v| v.map(|x| x / max)).collect(),
        _ => vec![None; row.len()],
    }
}

pub fn run_stage3(matrix: &CountMatrix) -> NormalizedMatrix {
    let mut values = Vec::with_capacity(matrix.values.len());
    let mut zero_max_rows = Vec::new();
    for (idx, row) in matrix.values.iter().enumerate() {
        let normalized = normalize_row(row);
        if !row.is_empty() && normalized.iter().all(|v| v.is_none()) {
            zero_max_rows.push(idx);
        }
        values.push(normalized);
    }
    if !zero_max_rows.is_empty() {
        tracing::warn!(
            "{} of {} genes have a zero row maximum and normalize to missing",
            zero_max_rows.len(),
            matrix.genes.len()
        );
    }
    NormalizedMatrix {
        genes: matrix.genes.clone(),
        columns: matrix.columns.clone(),
        values,
        zero_max_rows,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_normalize.rs"]
mod tests;
