use std::fs;
use std::path::{Path, PathBuf};

use crate::input::InputError;
use crate::input::table::{write_csv_rows, write_csv_table};
use crate::model::timecourse::{TimeCourseConfig, TimePoint};
use crate::pipeline::stage1_filter::FilteredSubset;
use crate::pipeline::stage5_assemble::AssembledTables;
use crate::report::RunSummary;
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;

pub fn filtered_file_name(config: &TimeCourseConfig, tp: &TimePoint) -> String {
    format!("columns_filter_{}_{}.csv", config.sample, tp.label)
}

pub fn normalized_file_name(config: &TimeCourseConfig, tp: &TimePoint) -> String {
    format!("normalized_{}_{}.csv", config.sample, tp.label)
}

pub fn summary_file_name(config: &TimeCourseConfig, tp: &TimePoint) -> String {
    format!("summary_{}_{}.csv", config.sample, tp.label)
}

pub fn combined_file_name(config: &TimeCourseConfig) -> String {
    format!("combined_summary_{}.csv", config.sample)
}

pub fn observation_file_name(config: &TimeCourseConfig) -> String {
    format!("d2d_observations_{}.csv", config.sample)
}

pub fn write_filtered_subsets(
    out_dir: &Path,
    config: &TimeCourseConfig,
    subsets: &[FilteredSubset],
) -> Result<Vec<PathBuf>, InputError> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(subsets.len());
    for subset in subsets {
        let path = out_dir.join(filtered_file_name(config, &subset.time_point));
        write_csv_table(&path, &subset.table)?;
        tracing::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn write_assembled(
    out_dir: &Path,
    config: &TimeCourseConfig,
    tables: &AssembledTables,
) -> Result<Vec<PathBuf>, InputError> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    for (tp, table) in &tables.normalized {
        let path = out_dir.join(normalized_file_name(config, tp));
        write_csv_table(&path, table)?;
        written.push(path);
    }
    for (tp, table) in &tables.summaries {
        let path = out_dir.join(summary_file_name(config, tp));
        write_csv_table(&path, table)?;
        written.push(path);
    }

    let combined = out_dir.join(combined_file_name(config));
    write_csv_table(&combined, &tables.combined)?;
    written.push(combined);

    let observations = out_dir.join(observation_file_name(config));
    write_csv_rows(&observations, &tables.observations)?;
    written.push(observations);

    for path in &written {
        tracing::info!("wrote {}", path.display());
    }
    Ok(written)
}

/// Writes `summary.json` and `report.txt`.
pub fn write_reports(out_dir: &Path, summary: &RunSummary) -> Result<Vec<PathBuf>, InputError> {
    fs::create_dir_all(out_dir)?;

    let json_path = out_dir.join("summary.json");
    fs::write(&json_path, render_summary_json(summary)?)?;

    let report_path = out_dir.join("report.txt");
    fs::write(&report_path, render_report_text(summary))?;

    Ok(vec![json_path, report_path])
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_export.rs"]
mod tests;
