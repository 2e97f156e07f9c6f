//! FILENAME: tests/test_pivot.rs
//! Integration tests for pivots, marginals and descriptives on the
//! age x condition recall data.

mod common;

use common::{assert_almost_eq, assert_matrix, WordsFixture};
use engine::{CellValue, DiagnosticKind, Diagnostics, Table, TableError};
use pivot_engine::{
    calculate_pivot, AggregationType, Dataset, ErrorBarStyle, Exclusions, PivotRequest,
    PivotValue,
};

fn words() -> Dataset {
    Dataset::new(WordsFixture::table())
}

fn text(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|&v| CellValue::from(v)).collect()
}

// ============================================================================
// PIVOT TESTS
// ============================================================================

#[test]
fn test_age_by_condition_means() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS").rows(["AGE"]).cols(["CONDITION"]);
    let result = ds.pivot(&request).unwrap();

    assert_matrix(
        &result.to_matrix(),
        &[&[11.0, 7.0, 13.4, 12.0, 6.9], &[14.8, 6.5, 17.6, 19.3, 7.6]],
    );
    assert_eq!(result.row_keys, vec![text(&["old"]), text(&["young"])]);
    assert_eq!(
        result.col_keys.iter().map(|k| k[0].repr()).collect::<Vec<_>>(),
        vec!["adjective", "counting", "imagery", "intention", "rhyming"]
    );
}

#[test]
fn test_condition_by_age_sums() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS")
        .rows(["CONDITION"])
        .cols(["AGE"])
        .aggregate_named("sum")
        .unwrap();
    let result = ds.pivot(&request).unwrap();

    assert_matrix(
        &result.to_matrix(),
        &[
            &[110.0, 148.0],
            &[70.0, 65.0],
            &[134.0, 176.0],
            &[120.0, 193.0],
            &[69.0, 76.0],
        ],
    );
}

#[test]
fn test_subject_average_by_age() {
    let mut ds = words();
    let result = ds.pivot(&PivotRequest::new("SUBJECT").rows(["AGE"])).unwrap();

    assert_eq!(result.shape(), (2, 1));
    assert_matrix(&result.to_matrix(), &[&[25.5], &[75.5]]);
}

#[test]
fn test_exclusion_removes_age_group() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS")
        .rows(["CONDITION"])
        .exclude("AGE", ["old"]);
    let result = ds.pivot(&request).unwrap();

    assert_matrix(&result.to_matrix(), &[&[14.8], &[6.5], &[17.6], &[19.3], &[7.6]]);
    assert!(ds.diagnostics().is_empty());
}

#[test]
fn test_split_exclusions_match_combined_ones() {
    let table = WordsFixture::table();

    let combined = PivotRequest::new("WORDS")
        .rows(["AGE"])
        .exclude("CONDITION", ["counting", "rhyming"]);
    let split = PivotRequest::new("WORDS")
        .rows(["AGE"])
        .exclude("CONDITION", ["counting"])
        .exclude("CONDITION", ["rhyming", "counting"]);

    let a = calculate_pivot(&table, &combined, &mut Diagnostics::new()).unwrap();
    let b = calculate_pivot(&table, &split, &mut Diagnostics::new()).unwrap();
    assert_eq!(a.cells, b.cells);
}

#[test]
fn test_no_factor_pivot_matches_whole_column() {
    let mut ds = words();
    let descriptives = ds.descriptives("WORDS").unwrap();

    for (aggregate, expected) in [
        (AggregationType::Average, descriptives.mean),
        (AggregationType::StdDev, descriptives.stdev),
        (AggregationType::Var, descriptives.var),
        (AggregationType::Rms, descriptives.rms),
        (AggregationType::Median, descriptives.median),
        (AggregationType::Sem, descriptives.sem),
        (AggregationType::Min, descriptives.min),
        (AggregationType::Max, descriptives.max),
        (AggregationType::Range, descriptives.range),
    ] {
        let result = ds.pivot(&PivotRequest::new("WORDS").aggregate(aggregate)).unwrap();
        assert_eq!(result.shape(), (1, 1));
        assert_almost_eq(result.cells[0][0].as_f64().unwrap(), expected.unwrap());
    }

    let count = ds.pivot(&PivotRequest::new("WORDS").aggregate(AggregationType::Count)).unwrap();
    assert_eq!(count.cells[0][0], PivotValue::Count(descriptives.count));
}

#[test]
fn test_grouped_skew() {
    let table = Table::from_columns(vec![
        ("F", text(&["a", "a", "a", "b", "b", "b"])),
        ("V", [1.0, 2.0, 6.0, 2.0, 4.0, 6.0].iter().map(|&v| CellValue::Number(v)).collect()),
    ]);
    let request = PivotRequest::new("V").rows(["F"]).aggregate_named("skewness").unwrap();
    let result = calculate_pivot(&table, &request, &mut Diagnostics::new()).unwrap();

    // a: mean 3, m2 = 14/3, m3 = 6
    assert_almost_eq(result.cells[0][0].as_f64().unwrap(), 0.5951700641);
    assert_almost_eq(result.cells[1][0].as_f64().unwrap(), 0.0);
}

#[test]
fn test_count_and_descriptives_skip_blank_cells() {
    let table = Table::from_columns(vec![
        ("x", vec![CellValue::Number(1.0), CellValue::Number(2.0), CellValue::Number(3.0)]),
        ("z", vec![CellValue::Number(9.0), CellValue::from(""), CellValue::Number(11.0)]),
    ]);
    let mut ds = Dataset::new(table);
    let count = ds.pivot(&PivotRequest::new("z").aggregate(AggregationType::Count)).unwrap().cells[0][0].clone();

    assert_eq!(count, PivotValue::Count(2));
    assert_eq!(count, PivotValue::Count(ds.descriptives("z").unwrap().count));
}

#[test]
fn test_whole_column_stdev() {
    let mut ds = words();
    let result = ds.pivot(&PivotRequest::new("WORDS").aggregate_named("stdev").unwrap()).unwrap();
    assert_almost_eq(result.cells[0][0].as_f64().unwrap(), 5.191085988);
}

#[test]
fn test_group_concat_keeps_row_order() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS")
        .rows(["AGE"])
        .cols(["CONDITION"])
        .aggregate(AggregationType::GroupConcat);
    let result = ds.pivot(&request).unwrap();

    // old x counting
    let expected: Vec<CellValue> = WordsFixture::WORDS[..10].iter().map(|&w| CellValue::Number(w)).collect();
    assert_eq!(result.cells[0][1].as_list().unwrap(), expected.as_slice());
}

#[test]
fn test_dense_count_with_unobserved_cells() {
    let table = Table::from_columns(vec![
        ("A", text(&["x", "x", "y"])),
        ("B", text(&["p", "q", "p"])),
        ("V", vec![CellValue::Number(1.0), CellValue::Number(2.0), CellValue::Number(3.0)]),
    ]);
    let request = PivotRequest::new("V")
        .rows(["A"])
        .cols(["B"])
        .aggregate(AggregationType::Count);

    let result = calculate_pivot(&table, &request, &mut Diagnostics::new()).unwrap();
    assert_eq!(result.to_matrix(), vec![vec![Some(1.0), Some(1.0)], vec![Some(1.0), Some(0.0)]]);
}

#[test]
fn test_missing_factor_reports_first_name() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS").rows(["AGE", "NOTAKEY"]).cols(["ALSO"]);
    assert_eq!(ds.pivot(&request).unwrap_err(), TableError::KeyError("NOTAKEY".to_string()));
}

#[test]
fn test_ragged_column_is_rejected() {
    let mut ds = words();
    ds.table_mut().get_column_mut("AGE").unwrap().push(CellValue::from("old"));

    let err = ds.pivot(&PivotRequest::new("WORDS").rows(["AGE"])).unwrap_err();
    assert_eq!(err, TableError::ShapeError);
}

#[test]
fn test_unused_exclusion_warns_and_continues() {
    let mut ds = words();
    let request = PivotRequest::new("WORDS").rows(["AGE"]).exclude("AGE", ["middle"]);
    let result = ds.pivot(&request).unwrap();

    assert_eq!(result.shape(), (2, 1));
    assert_eq!(ds.diagnostics().count_of(DiagnosticKind::UnusedExclusion), 1);
}

#[test]
fn test_attach_doubles_rows() {
    let mut ds = words();
    let copy = WordsFixture::table();
    ds.attach(&copy).unwrap();

    let table = ds.table();
    assert_eq!(table.row_count(), 200);
    for i in 0..100 {
        assert_eq!(table.row(i), table.row(100 + i));
    }
}

// ============================================================================
// MARGINALS & DESCRIPTIVES
// ============================================================================

#[test]
fn test_marginals_age_by_condition() {
    let mut ds = words();
    let factors = vec!["AGE".to_string(), "CONDITION".to_string()];
    let m = ds.marginals("WORDS", &factors, &Exclusions::new()).unwrap();

    let means = [11.0, 7.0, 13.4, 12.0, 6.9, 14.8, 6.5, 17.6, 19.3, 7.6];
    let sems = [
        0.788810638, 0.577350269, 1.423610434, 1.183215957, 0.674124947,
        1.103529690, 0.453382350, 0.819213715, 0.843932593, 0.618241233,
    ];

    assert_eq!(m.len(), 10);
    assert_eq!(m.counts, vec![10; 10]);
    for i in 0..10 {
        assert_almost_eq(m.means[i].unwrap(), means[i]);
        assert_almost_eq(m.sems[i].unwrap(), sems[i]);
        assert_almost_eq(m.ci_lower[i].unwrap(), means[i] - 1.96 * m.sems[i].unwrap());
    }
    assert_eq!(m.labels[2], text(&["old", "imagery"]));

    let bars = m.error_bars(ErrorBarStyle::Ci95).unwrap();
    assert_almost_eq(bars[0], 1.96 * 0.788810638);
}

#[test]
fn test_error_bars_fail_for_single_value_cells() {
    let mut ds = Dataset::new(Table::from_columns(vec![
        ("F", text(&["a", "a", "b"])),
        ("V", vec![CellValue::Number(1.0), CellValue::Number(2.0), CellValue::Number(3.0)]),
    ]));
    let m = ds.marginals("V", &["F".to_string()], &Exclusions::new()).unwrap();

    let err = m.error_bars(ErrorBarStyle::Ci95).unwrap_err();
    assert_eq!(err.to_string(), "cell count too low to calculate ci");
}

#[test]
fn test_descriptives_of_words() {
    let ds = words();
    let d = ds.descriptives("WORDS").unwrap();

    assert_eq!(d.count, 100);
    assert_almost_eq(d.mean.unwrap(), 11.61);
    assert_almost_eq(d.var.unwrap(), 26.94737374);
    assert_almost_eq(d.stdev.unwrap(), 5.191085988);
    assert_almost_eq(d.sem.unwrap(), 5.191085988 / 10.0);
    assert_almost_eq(d.rms.unwrap(), 12.70708464);
    assert_eq!(d.min, Some(3.0));
    assert_eq!(d.max, Some(23.0));
    assert_eq!(d.range, Some(20.0));
    assert_eq!(d.median, Some(11.0));
    assert_almost_eq(d.ci95_lower.unwrap(), 11.61 - 0.5191085988 * 1.96);
    assert_almost_eq(d.ci95_upper.unwrap(), 11.61 + 0.5191085988 * 1.96);
}

#[test]
fn test_select_column_with_exclusion() {
    let mut ds = words();
    let young = ds
        .select_column("WORDS", &Exclusions::new().with("AGE", ["old"]))
        .unwrap();
    assert_eq!(young.len(), 50);
    assert_eq!(young[0], CellValue::Number(8.0));
}

#[test]
fn test_request_from_json_drives_a_pivot() {
    let mut ds = words();
    let request = PivotRequest::from_json(&serde_json::json!({
        "target": "WORDS",
        "rows": ["AGE"],
        "aggregate": "count"
    }))
    .unwrap();
    let result = ds.pivot(&request).unwrap();
    assert_eq!(result.cells, vec![vec![PivotValue::Count(50)], vec![PivotValue::Count(50)]]);
}
