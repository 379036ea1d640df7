use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub mod gene_list;
pub mod table;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{path} has no '{column}' column")]
    MissingColumn { path: String, column: String },
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
    #[error(transparent)]
    Validation(#[from] crate::pipeline::ValidationError),
}

/// A join key that occurs more than once in one table. Rows are 1-based data rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate key '{key}' in {source_name} (rows {first_row} and {duplicate_row})")]
pub struct DuplicateKeyError {
    pub source_name: String,
    pub key: String,
    pub first_row: usize,
    pub duplicate_row: usize,
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|e| {
        InputError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Returns `path`, or `path.gz` when only the compressed variant exists.
pub fn resolve_maybe_gz(path: &Path) -> Result<std::path::PathBuf, InputError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let mut gz = path.as_os_str().to_owned();
    gz.push(".gz");
    let gz = std::path::PathBuf::from(gz);
    if gz.exists() {
        return Ok(gz);
    }
    Err(InputError::MissingInput(path.display().to_string()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
