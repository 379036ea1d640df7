use std::collections::HashMap;
use std::path::Path;

use crate::input::table::{CsvTable, read_csv_table};
use crate::input::{DuplicateKeyError, InputError};

/// Gene allow-list used as an inner-join filter.
#[derive(Debug, Clone, Default)]
pub struct GeneList {
    pub genes: Vec<String>,
    index: HashMap<String, usize>,
}

impl GeneList {
    pub fn from_genes<I, S>(genes: I, source_name: &str) -> Result<Self, DuplicateKeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rows(
            genes.into_iter().enumerate().map(|(i, g)| (i + 1, g)),
            source_name,
        )
    }

    /// Builds the list from `(data_row, gene)` pairs, rows 1-based as in the file.
    pub fn from_rows<I, S>(rows: I, source_name: &str) -> Result<Self, DuplicateKeyError>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let mut list = GeneList::default();
        for (row, gene) in rows {
            let gene = gene.into();
            if let Some(&first_row) = list.index.get(&gene) {
                return Err(DuplicateKeyError {
                    source_name: source_name.to_string(),
                    key: gene,
                    first_row,
                    duplicate_row: row,
                });
            }
            list.index.insert(gene.clone(), row);
            list.genes.push(gene);
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.index.contains_key(gene)
    }
}

pub fn load_gene_list(path: &Path, key_column: &str) -> Result<GeneList, InputError> {
    let table = read_csv_table(path, key_column)?;
    gene_list_from_table(&table, &path.display().to_string(), key_column)
}

pub fn gene_list_from_table(
    table: &CsvTable,
    source_name: &str,
    key_column: &str,
) -> Result<GeneList, InputError> {
    let col = table
        .column_index(key_column)
        .ok_or_else(|| InputError::MissingColumn {
            path: source_name.to_string(),
            column: key_column.to_string(),
        })?;

    let mut genes = Vec::with_capacity(table.n_rows());
    for (row_no, row) in table.rows.iter().enumerate() {
        let gene = row.get(col).map(|s| s.trim()).unwrap_or("");
        if gene.is_empty() {
            tracing::warn!(
                "{} row {} has an empty gene name; skipping",
                source_name,
                row_no + 1
            );
            continue;
        }
        genes.push((row_no + 1, gene.to_string()));
    }

    let list = GeneList::from_rows(genes, source_name)?;
    if list.is_empty() {
        return Err(InputError::Parse(format!("{source_name} lists no genes")));
    }
    tracing::info!("loaded {} allow-listed genes from {}", list.len(), source_name);
    Ok(list)
}
