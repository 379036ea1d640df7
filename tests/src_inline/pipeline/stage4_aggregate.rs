use super::*;

fn normalized(values: Vec<Vec<Option<f64>>>, zero_max_rows: Vec<usize>) -> NormalizedMatrix {
    NormalizedMatrix {
        genes: (0..values.len()).map(|i| format!("G{i}")).collect(),
        columns: vec!["H358_A_1".to_string(); values.first().map_or(0, |r| r.len())],
        values,
        zero_max_rows,
    }
}

fn tp0() -> TimePoint {
    TimePoint::new("0h", "0", "H358_A")
}

#[test]
fn test_one_dropout_mean_and_population_std() {
    let stat = mean_std(&mask_dropouts(&[Some(0.5), Some(0.0), Some(1.0)]));
    assert_eq!(stat.mean, Some(0.75));
    assert_eq!(stat.std, Some(0.25));
}

#[test]
fn test_masking_keeps_exactly_the_nonzero_entries() {
    let rows = vec![
        vec![Some(0.0), Some(0.2), None, Some(1.0), Some(0.0)],
        vec![Some(0.0), Some(0.0)],
        vec![Some(1.0), Some(1.0)],
    ];
    for row in rows {
        let nonzero = row.iter().flatten().filter(|v| **v != 0.0).count();
        let masked = mask_dropouts(&row);
        assert_eq!(masked.iter().flatten().count(), nonzero);
        assert_eq!(masked.len(), row.len());
    }
}

#[test]
fn test_single_value_has_zero_std() {
    let stat = mean_std(&[None, Some(0.4)]);
    assert_eq!(stat.mean, Some(0.4));
    assert_eq!(stat.std, Some(0.0));
}

#[test]
fn test_undefined_statistics_are_reported_with_reason() {
    let m = normalized(
        vec![
            vec![None, None],
            vec![Some(0.0), Some(0.0)],
            vec![Some(0.5), Some(1.0)],
        ],
        vec![0],
    );
    let out = run_stage4(&m, &tp0(), None);
    assert_eq!(out.stats.len(), 3);
    assert_eq!(out.stats[0], GeneStat::undefined());
    assert_eq!(out.stats[1], GeneStat::undefined());
    assert_eq!(out.stats[2].mean, Some(0.75));
    assert_eq!(
        out.undefined,
        vec![
            UndefinedStatistic {
                time_point: "0h".to_string(),
                gene: "G0".to_string(),
                reason: UndefinedReason::ZeroRowMaximum,
            },
            UndefinedStatistic {
                time_point: "0h".to_string(),
                gene: "G1".to_string(),
                reason: UndefinedReason::AllDropout,
            },
        ]
    );
    assert!(out.high_variance.is_empty());
}

#[test]
fn test_variance_threshold_flags_genes() {
    let m = normalized(
        vec![vec![Some(0.1), Some(1.0)], vec![Some(0.9), Some(1.0)]],
        vec![],
    );
    let out = run_stage4(&m, &tp0(), Some(0.01));
    assert_eq!(out.high_variance, vec!["G0"]);

    let out = run_stage4(&m, &tp0(), None);
    assert!(out.high_variance.is_empty());
}

#[test]
fn test_many_zero_max_rows_keep_their_reason() {
    let mut values = Vec::new();
    let mut zero_max_rows = Vec::new();
    for i in 0..500 {
        if i % 2 == 0 {
            values.push(vec![None, None]);
            zero_max_rows.push(i);
        } else {
            values.push(vec![Some(0.0), Some(0.0)]);
        }
    }
    let out = run_stage4(&normalized(values, zero_max_rows), &tp0(), None);
    assert_eq!(out.undefined.len(), 500);
    let zero_max = out
        .undefined
        .iter()
        .filter(|u| u.reason == UndefinedReason::ZeroRowMaximum)
        .count();
    assert_eq!(zero_max, 250);
    assert_eq!(out.undefined[0].reason, UndefinedReason::ZeroRowMaximum);
    assert_eq!(out.undefined[1].reason, UndefinedReason::AllDropout);
}
