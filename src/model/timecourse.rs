use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::{InputError, open_maybe_gz};
use crate::pipeline::ValidationError;

pub const DEFAULT_KEY_COLUMN: &str = "gene_name";

/// One experimental time point and the column-name marker that selects its replicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    /// File-name label, e.g. `0h`.
    pub label: String,
    /// Value written into the observation table's `time` column, e.g. `0`.
    pub time: String,
    /// Substring that replicate column names of this time point contain, e.g. `H358_A`.
    pub marker: String,
}

impl TimePoint {
    pub fn new(label: &str, time: &str, marker: &str) -> Self {
        Self {
            label: label.to_string(),
            time: time.to_string(),
            marker: marker.to_string(),
        }
    }

    /// Canonical replicate column name, 1-based.
    pub fn replicate_name(&self, index: usize) -> String {
        format!("{}_{}", self.marker, index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCourseConfig {
    pub sample: String,
    #[serde(default = "default_key_column")]
    pub key_column: String,
    pub time_points: Vec<TimePoint>,
}

fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

impl TimeCourseConfig {
    /// H358 layout: A=0h, B=4h, C=24h, D=72h.
    pub fn h358_v1() -> Self {
        Self {
            sample: "H358".to_string(),
            key_column: default_key_column(),
            time_points: vec![
                TimePoint::new("0h", "0", "H358_A"),
                TimePoint::new("4h", "4", "H358_B"),
                TimePoint::new("24h", "24", "H358_C"),
                TimePoint::new("72h", "72", "H358_D"),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, InputError> {
        let reader = open_maybe_gz(path)?;
        let config: TimeCourseConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.time_points.is_empty() {
            return Err(ValidationError::EmptyConfig);
        }
        if self.key_column.trim().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "key_column must not be empty".to_string(),
            ));
        }
        let mut labels = BTreeSet::new();
        let mut markers = BTreeSet::new();
        for tp in &self.time_points {
            if tp.marker.is_empty() {
                return Err(ValidationError::InvalidConfig(format!(
                    "time point {} has an empty marker",
                    tp.label
                )));
            }
            if !labels.insert(tp.label.as_str()) {
                return Err(ValidationError::InvalidConfig(format!(
                    "duplicate time point label {}",
                    tp.label
                )));
            }
            if !markers.insert(tp.marker.as_str()) {
                return Err(ValidationError::InvalidConfig(format!(
                    "duplicate time point marker {}",
                    tp.marker
                )));
            }
        }
        for a in &self.time_points {
            for b in &self.time_points {
                if a.marker != b.marker && b.marker.contains(&a.marker) {
                    tracing::warn!(
                        "marker {} is a substring of marker {}; time point {} will also select {} columns",
                        a.marker,
                        b.marker,
                        a.label,
                        b.label
                    );
                }
            }
        }
        Ok(())
    }

    pub fn mean_column(&self, tp: &TimePoint) -> String {
        format!("{}_{}_mean", self.sample, tp.time)
    }

    pub fn std_column(&self, tp: &TimePoint) -> String {
        format!("{}_{}_std", self.sample, tp.time)
    }
}

impl Default for TimeCourseConfig {
    fn default() -> Self {
        Self::h358_v1()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/timecourse.rs"]
mod tests;
