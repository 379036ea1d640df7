use std::fmt::Write;

use crate::report::{RunSummary, TimePointSummary};

const MAX_LISTED: usize = 20;

pub fn render_report_text(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("Time-Course Observation Preparation Report\n");
    out.push_str("==========================================\n\n");

    let _ = writeln!(out, "Tool: {} {}", summary.tool, summary.version);
    let _ = writeln!(out, "Sample: {}", summary.sample);
    let _ = writeln!(out, "Allow-listed genes: {}", summary.n_allow_listed);
    let _ = writeln!(out, "Genes in combined table: {}", summary.n_genes_combined);
    if let Some(threshold) = summary.variance_threshold {
        let _ = writeln!(out, "Variance threshold: {threshold}");
    }
    out.push('\n');

    out.push_str("1. Time points\n");
    for tp in &summary.time_points {
        render_time_point(&mut out, tp);
    }
    out.push('\n');

    out.push_str("2. Undefined statistics\n");
    if summary.undefined_statistics.is_empty() {
        out.push_str("None.\n");
    } else {
        for entry in summary.undefined_statistics.iter().take(MAX_LISTED) {
            let _ = writeln!(
                out,
                "{}\t{}\t{}",
                entry.time_point,
                entry.gene,
                entry.reason.as_str()
            );
        }
        if summary.undefined_statistics.len() > MAX_LISTED {
            let _ = writeln!(
                out,
                "... {} more (see summary.json)",
                summary.undefined_statistics.len() - MAX_LISTED
            );
        }
    }
    out.push('\n');

    out.push_str("3. Outputs\n");
    for path in &summary.outputs {
        let _ = writeln!(out, "{path}");
    }

    out
}

fn render_time_point(out: &mut String, tp: &TimePointSummary) {
    let _ = writeln!(
        out,
        "{} (t={}, marker {}): {} replicates, {}/{} genes retained, {} zero-maximum rows, {} undefined",
        tp.label,
        tp.time,
        tp.marker,
        tp.n_replicates,
        tp.n_genes_retained,
        tp.n_genes_input,
        tp.n_zero_max_rows,
        tp.n_undefined
    );
    if !tp.absent_from_table.is_empty() {
        let _ = writeln!(
            out,
            "  allow-listed but absent: {}",
            list_head(&tp.absent_from_table)
        );
    }
    if !tp.high_variance_genes.is_empty() {
        let _ = writeln!(
            out,
            "  high variance: {}",
            list_head(&tp.high_variance_genes)
        );
    }
}

fn list_head(items: &[String]) -> String {
    let mut joined = items
        .iter()
        .take(MAX_LISTED)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > MAX_LISTED {
        let _ = write!(joined, " (+{} more)", items.len() - MAX_LISTED);
    }
    joined
}
