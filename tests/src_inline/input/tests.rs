use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use super::gene_list::{GeneList, gene_list_from_table, load_gene_list};
use super::table::{CsvTable, parse_csv_table, read_csv_table, write_csv_rows, write_csv_table};
use super::*;
use crate::pipeline::ValidationError;

fn table(text: &str) -> CsvTable {
    parse_csv_table(text.as_bytes(), "test.csv", "gene_name").unwrap()
}

#[test]
fn test_unnamed_first_header_becomes_key() {
    let t = table(",H358_A_x,H358_B_y\nG1,1,2\n");
    assert_eq!(t.header, vec!["gene_name", "H358_A_x", "H358_B_y"]);

    let t = table("Unnamed: 0,H358_A_x\nG1,1\n");
    assert_eq!(t.header[0], "gene_name");

    let t = table("\u{feff}gene_name,H358_A_x\nG1,1\n");
    assert_eq!(t.header[0], "gene_name");
}

#[test]
fn test_named_first_header_is_kept() {
    let t = table("symbol,H358_A_x\nG1,1\n");
    assert_eq!(t.header[0], "symbol");
    assert_eq!(t.column_index("gene_name"), None);
}

#[test]
fn test_ragged_csv_is_an_error() {
    let err = parse_csv_table(
        "gene_name,a,b\nG1,1,2\nG2,1\n".as_bytes(),
        "bad.csv",
        "gene_name",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        InputError::Validation(ValidationError::RaggedRow {
            table: ref name,
            row: 2,
            expected: 3,
            found: 2,
        }) if name == "bad.csv"
    ));
    assert!(err.to_string().contains("bad.csv"));
}

#[test]
fn test_unnamed_index_column_is_dropped_when_key_exists() {
    let t = table(",gene_name\n0,A\n1,B\n");
    assert_eq!(t.header, vec!["gene_name"]);
    assert_eq!(t.rows, vec![vec!["A"], vec!["B"]]);

    let t = table("Unnamed: 0,gene_name,H358_A_x\n0,A,3\n");
    assert_eq!(t.header, vec!["gene_name", "H358_A_x"]);
    assert_eq!(t.rows[0], vec!["A", "3"]);

    let list = gene_list_from_table(&table(",gene_name\n0,A\n1,B\n"), "genes.csv", "gene_name")
        .unwrap();
    assert_eq!(list.genes, vec!["A", "B"]);
}

#[test]
fn test_duplicate_header_is_rejected() {
    let err = parse_csv_table("gene_name,x,x\nA,1,2\n".as_bytes(), "dup.csv", "gene_name")
        .unwrap_err();
    assert!(matches!(
        err,
        InputError::Validation(ValidationError::DuplicateColumn { ref column, .. }) if column == "x"
    ));
}

#[test]
fn test_gzip_input_is_decompressed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counts.csv.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(b",H358_A_1\nG1,3\nG2,0\n").unwrap();
    std::fs::write(&path, enc.finish().unwrap()).unwrap();

    let t = read_csv_table(&path, "gene_name").unwrap();
    assert_eq!(t.n_rows(), 2);
    assert_eq!(t.rows[0], vec!["G1", "3"]);
}

#[test]
fn test_resolve_maybe_gz() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("a.csv");
    std::fs::write(dir.path().join("a.csv.gz"), b"").unwrap();
    assert_eq!(
        resolve_maybe_gz(&plain).unwrap(),
        dir.path().join("a.csv.gz")
    );
    std::fs::write(&plain, b"").unwrap();
    assert_eq!(resolve_maybe_gz(&plain).unwrap(), plain);
    assert!(matches!(
        resolve_maybe_gz(&dir.path().join("missing.csv")),
        Err(InputError::MissingInput(_))
    ));
}

#[test]
fn test_write_then_read_preserves_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("t.csv");
    let t = table("gene_name,a\n\"G,1\",0.50\nG2,\n");
    write_csv_table(&path, &t).unwrap();
    let back = read_csv_table(&path, "gene_name").unwrap();
    assert_eq!(back, t);
}

#[test]
fn test_write_rows_has_no_header_handling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.csv");
    let rows = vec![
        vec!["time".to_string(), "A_obs".to_string()],
        vec!["0".to_string(), "0.75".to_string()],
    ];
    write_csv_rows(&path, &rows).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "time,A_obs\n0,0.75\n");
}

#[test]
fn test_gene_list_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genes.csv");
    std::fs::write(&path, "node,gene_name\n1,TP53\n2,\n3,KRAS\n").unwrap();
    let list = load_gene_list(&path, "gene_name").unwrap();
    assert_eq!(list.genes, vec!["TP53", "KRAS"]);
    assert!(list.contains("KRAS"));
    assert!(!list.contains("EGFR"));
}

#[test]
fn test_gene_list_requires_key_column() {
    let t = table("gene_name,x\nA,1\n");
    let renamed = CsvTable {
        header: vec!["symbol".to_string(), "x".to_string()],
        rows: t.rows.clone(),
    };
    let err = gene_list_from_table(&renamed, "genes.csv", "gene_name").unwrap_err();
    assert!(matches!(err, InputError::MissingColumn { .. }));
}

#[test]
fn test_gene_list_rejects_duplicates() {
    let err = GeneList::from_genes(["A", "B", "A"], "genes.csv").unwrap_err();
    assert_eq!(
        err,
        DuplicateKeyError {
            source_name: "genes.csv".to_string(),
            key: "A".to_string(),
            first_row: 1,
            duplicate_row: 3,
        }
    );

    let t = table("gene_name\nA\nA\n");
    assert!(matches!(
        gene_list_from_table(&t, "genes.csv", "gene_name"),
        Err(InputError::DuplicateKey(_))
    ));
}

#[test]
fn test_gene_list_duplicate_reports_file_rows() {
    let t = table("node,gene_name\n1,A\n2,\n3,A\n");
    match gene_list_from_table(&t, "genes.csv", "gene_name") {
        Err(InputError::DuplicateKey(e)) => {
            assert_eq!(e.key, "A");
            assert_eq!(e.first_row, 1);
            assert_eq!(e.duplicate_row, 3);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_gene_list_must_not_be_empty() {
    let t = table("gene_name\n\n");
    assert!(matches!(
        gene_list_from_table(&t, "genes.csv", "gene_name"),
        Err(InputError::Parse(_))
    ));
}
