mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::input::gene_list::load_gene_list;
use crate::input::resolve_maybe_gz;
use crate::input::table::read_csv_table;
use crate::model::timecourse::TimeCourseConfig;
use crate::pipeline::stage1_filter::run_stage1;
use crate::pipeline::stage6_export::{
    filtered_file_name, write_assembled, write_filtered_subsets, write_reports,
};
use crate::pipeline::{
    NormalizeParams, PipelineError, TimePointInput, normalize_time_course,
};
use crate::report::RunSummary;

const FILTERED_SUBDIR: &str = "filtered";

#[derive(Debug, Parser)]
#[command(
    name = "kira-obsprep",
    version,
    about = "Filter, max-normalize and summarize time-course scRNA-seq counts into D2D observations"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a raw count table into one column subset per time point.
    Filter(FilterArgs),
    /// Normalize and summarize the per-time-point subsets against a gene allow-list.
    Normalize(NormalizeArgs),
    /// Run filter and normalize back to back.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// JSON time-course configuration (sample, key_column, time_points).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the sample name used in output file and column names.
    #[arg(long)]
    sample: Option<String>,

    /// Override the gene identifier column name.
    #[arg(long)]
    key_column: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct FilterArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct NormalizeArgs {
    /// Directory holding the `filter` outputs.
    #[arg(long)]
    input_dir: PathBuf,

    #[arg(long)]
    gene_list: PathBuf,

    #[arg(long)]
    out: PathBuf,

    /// Report genes whose population variance exceeds this value.
    #[arg(long)]
    variance_threshold: Option<f64>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    gene_list: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    variance_threshold: Option<f64>,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(err) = run(cli.command) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), PipelineError> {
    match command {
        Command::Filter(args) => {
            let config = resolve_config(&args.config)?;
            run_filter(&args.input, &args.out, &config)?;
        }
        Command::Normalize(args) => {
            let config = resolve_config(&args.config)?;
            let params = NormalizeParams {
                variance_threshold: args.variance_threshold,
            };
            run_normalize(&args.input_dir, &args.gene_list, &args.out, &config, &params)?;
        }
        Command::Run(args) => {
            let config = resolve_config(&args.config)?;
            let params = NormalizeParams {
                variance_threshold: args.variance_threshold,
            };
            let filtered_dir = args.out.join(FILTERED_SUBDIR);
            run_filter(&args.input, &filtered_dir, &config)?;
            run_normalize(&filtered_dir, &args.gene_list, &args.out, &config, &params)?;
        }
    }
    Ok(())
}

fn resolve_config(args: &ConfigArgs) -> Result<TimeCourseConfig, PipelineError> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("loading time-course configuration from {}", path.display());
            TimeCourseConfig::load(path)?
        }
        None => TimeCourseConfig::h358_v1(),
    };
    if let Some(sample) = &args.sample {
        config.sample = sample.clone();
    }
    if let Some(key) = &args.key_column {
        config.key_column = key.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_filter(
    input: &Path,
    out_dir: &Path,
    config: &TimeCourseConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let table = read_csv_table(input, &config.key_column)?;
    tracing::info!(
        "read {}: {} rows, {} columns",
        input.display(),
        table.n_rows(),
        table.n_cols()
    );
    let subsets = run_stage1(&table, &input.display().to_string(), config)?;
    Ok(write_filtered_subsets(out_dir, config, &subsets)?)
}

fn load_stage1_outputs(
    input_dir: &Path,
    config: &TimeCourseConfig,
) -> Result<Vec<TimePointInput>, PipelineError> {
    let mut inputs = Vec::with_capacity(config.time_points.len());
    for tp in &config.time_points {
        let path = resolve_maybe_gz(&input_dir.join(filtered_file_name(config, tp)))?;
        let table = read_csv_table(&path, &config.key_column)?;
        inputs.push(TimePointInput {
            time_point: tp.clone(),
            source_name: path.display().to_string(),
            table,
        });
    }
    Ok(inputs)
}

fn run_normalize(
    input_dir: &Path,
    gene_list_path: &Path,
    out_dir: &Path,
    config: &TimeCourseConfig,
    params: &NormalizeParams,
) -> Result<RunSummary, PipelineError> {
    let gene_list = load_gene_list(gene_list_path, &config.key_column)?;
    let inputs = load_stage1_outputs(input_dir, config)?;
    let output = normalize_time_course(config, &inputs, &gene_list, params)?;

    let mut outputs = write_assembled(out_dir, config, &output.tables)?;
    outputs.push(out_dir.join("summary.json"));
    outputs.push(out_dir.join("report.txt"));

    let summary = RunSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sample: config.sample.clone(),
        n_allow_listed: gene_list.len(),
        variance_threshold: params.variance_threshold,
        n_genes_combined: output.tables.combined.n_rows(),
        time_points: output.time_points,
        undefined_statistics: output.undefined,
        outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
    };
    write_reports(out_dir, &summary)?;
    tracing::info!(
        "normalized {} genes over {} time points into {}",
        summary.n_genes_combined,
        summary.time_points.len(),
        out_dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
