use super::*;
use crate::input::table::CsvTable;

fn config() -> TimeCourseConfig {
    TimeCourseConfig::h358_v1()
}

#[test]
fn test_file_names() {
    let config = config();
    let tp = &config.time_points[2];
    assert_eq!(filtered_file_name(&config, tp), "columns_filter_H358_24h.csv");
    assert_eq!(normalized_file_name(&config, tp), "normalized_H358_24h.csv");
    assert_eq!(summary_file_name(&config, tp), "summary_H358_24h.csv");
    assert_eq!(combined_file_name(&config), "combined_summary_H358.csv");
    assert_eq!(observation_file_name(&config), "d2d_observations_H358.csv");
}

#[test]
fn test_write_filtered_subsets() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let subsets = vec![FilteredSubset {
        time_point: config.time_points[0].clone(),
        table: CsvTable {
            header: vec!["gene_name".to_string(), "H358_A_x".to_string()],
            rows: vec![vec!["G1".to_string(), "3".to_string()]],
        },
    }];
    let written = write_filtered_subsets(dir.path(), &config, &subsets).unwrap();
    assert_eq!(written, vec![dir.path().join("columns_filter_H358_0h.csv")]);
    assert_eq!(
        std::fs::read_to_string(&written[0]).unwrap(),
        "gene_name,H358_A_x\nG1,3\n"
    );
}

#[test]
fn test_write_assembled_observations_are_headerless() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let tp = config.time_points[0].clone();
    let table = CsvTable {
        header: vec!["gene_name".to_string(), "H358_A_1".to_string()],
        rows: vec![vec!["A".to_string(), "1.0".to_string()]],
    };
    let tables = AssembledTables {
        normalized: vec![(tp.clone(), table.clone())],
        summaries: vec![(tp, table.clone())],
        combined: table,
        observations: vec![
            vec!["time".to_string(), "A_obs".to_string()],
            vec!["0".to_string(), "1.0".to_string()],
        ],
    };
    let written = write_assembled(dir.path(), &config, &tables).unwrap();
    assert_eq!(written.len(), 4);
    let obs = std::fs::read_to_string(dir.path().join("d2d_observations_H358.csv")).unwrap();
    assert_eq!(obs, "time,A_obs\n0,1.0\n");
    assert!(dir.path().join("normalized_H358_0h.csv").exists());
    assert!(dir.path().join("summary_H358_0h.csv").exists());
    assert!(dir.path().join("combined_summary_H358.csv").exists());
}

#[test]
fn test_write_reports() {
    let dir = tempfile::tempdir().unwrap();
    let summary = RunSummary {
        tool: "kira-obsprep".to_string(),
        version: "0.0.0".to_string(),
        sample: "H358".to_string(),
        n_allow_listed: 1,
        variance_threshold: None,
        n_genes_combined: 1,
        time_points: Vec::new(),
        undefined_statistics: Vec::new(),
        outputs: Vec::new(),
    };
    let written = write_reports(dir.path(), &summary).unwrap();
    assert_eq!(written.len(), 2);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(json["sample"], "H358");
    let text = std::fs::read_to_string(&written[1]).unwrap();
    assert!(text.contains("Sample: H358"));
}
