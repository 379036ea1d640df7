use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::input::{InputError, open_maybe_gz};
use crate::pipeline::ValidationError;

/// A CSV table kept as text. Cells are not reinterpreted so filtered
/// subsets are written back exactly as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.header.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

pub fn read_csv_table(path: &Path, key_column: &str) -> Result<CsvTable, InputError> {
    let reader = open_maybe_gz(path)?;
    parse_csv_table(reader, &path.display().to_string(), key_column)
}

pub fn parse_csv_table<R: Read>(
    reader: R,
    source_name: &str,
    key_column: &str,
) -> Result<CsvTable, InputError> {
    let csv_err = |source: csv::Error| InputError::Csv {
        path: source_name.to_string(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut header: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|s| s.to_string())
        .collect();
    if header.is_empty() || (header.len() == 1 && header[0].is_empty()) {
        return Err(InputError::Parse(format!("{source_name} has no header")));
    }
    let n_fields = header.len();
    let drop_index = normalize_key_header(&mut header, key_column);
    check_unique_header(&header, source_name)?;

    let mut rows = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        if record.len() != n_fields {
            return Err(ValidationError::RaggedRow {
                table: source_name.to_string(),
                row: row_no + 1,
                expected: n_fields,
                found: record.len(),
            }
            .into());
        }
        let skip = usize::from(drop_index);
        rows.push(record.iter().skip(skip).map(|s| s.to_string()).collect());
    }

    tracing::debug!(
        "read {}: {} columns, {} rows",
        source_name,
        header.len(),
        rows.len()
    );

    Ok(CsvTable { header, rows })
}

/// An index column exported without a name (blank, or pandas' `Unnamed: 0`)
/// is the gene identifier column, unless another column already carries the
/// key name. In that case the index column is removed and `true` is returned
/// so the caller drops the matching field from every row.
pub fn normalize_key_header(header: &mut Vec<String>, key_column: &str) -> bool {
    let Some(first) = header.first() else {
        return false;
    };
    let trimmed = first.trim_start_matches('\u{feff}').trim().to_string();
    if !(trimmed.is_empty() || trimmed == "Unnamed: 0") {
        header[0] = trimmed;
        return false;
    }
    if header[1..].iter().any(|h| h == key_column) {
        header.remove(0);
        return true;
    }
    header[0] = key_column.to_string();
    false
}

fn check_unique_header(header: &[String], source_name: &str) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(header.len());
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateColumn {
                table: source_name.to_string(),
                column: name.clone(),
            });
        }
    }
    Ok(())
}

pub fn write_csv_table(path: &Path, table: &CsvTable) -> Result<(), InputError> {
    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    rows.push(table.header.clone());
    rows.extend(table.rows.iter().cloned());
    write_csv_rows(path, &rows)
}

/// Writes rows verbatim with no header handling.
pub fn write_csv_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), InputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let csv_err = |source: csv::Error| InputError::Csv {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}
