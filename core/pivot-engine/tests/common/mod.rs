//! FILENAME: tests/common/mod.rs
//! Fixtures for the pivot engine integration tests.

#![allow(dead_code)]

use engine::{CellValue, Table};

/// Words recalled by 100 subjects, by age group and study condition.
pub struct WordsFixture;

impl WordsFixture {
    pub const CONDITIONS: [&'static str; 5] = ["counting", "rhyming", "adjective", "imagery", "intention"];

    pub const WORDS: [f64; 100] = [
        9., 8., 6., 8., 10., 4., 6., 5., 7., 7., 7., 9., 6., 6., 6., 11., 6., 3., 8., 7.,
        11., 13., 8., 6., 14., 11., 13., 13., 10., 11., 12., 11., 16., 11., 9., 23., 12., 10., 19., 11.,
        10., 19., 14., 5., 10., 11., 14., 15., 11., 11., 8., 6., 4., 6., 7., 6., 5., 7., 9., 7.,
        10., 7., 8., 10., 4., 7., 10., 6., 7., 7., 14., 11., 18., 14., 13., 22., 17., 16., 12., 11.,
        20., 16., 16., 15., 18., 16., 20., 22., 14., 19., 21., 19., 17., 15., 22., 16., 22., 22., 18., 21.,
    ];

    /// SUBJECT (1..=100), AGE, CONDITION and WORDS. The first 50 subjects
    /// are old, and each condition covers 10 consecutive subjects per age.
    pub fn table() -> Table {
        let subject = (1..=100).map(|s| CellValue::Number(s as f64)).collect();
        let age = (0..100)
            .map(|i| CellValue::from(if i < 50 { "old" } else { "young" }))
            .collect();
        let condition = (0..100)
            .map(|i| CellValue::from(Self::CONDITIONS[(i % 50) / 10]))
            .collect();
        let words = Self::WORDS.iter().map(|&w| CellValue::Number(w)).collect();

        Table::from_columns(vec![
            ("SUBJECT", subject),
            ("AGE", age),
            ("CONDITION", condition),
            ("WORDS", words),
        ])
    }
}

/// Assert that two floats agree to seven decimal places.
pub fn assert_almost_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-7,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// Assert a result matrix cell by cell with `assert_almost_eq`.
pub fn assert_matrix(actual: &[Vec<Option<f64>>], expected: &[&[f64]]) {
    assert_eq!(actual.len(), expected.len(), "row count");
    for (row, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(a.len(), e.len(), "column count of row {}", row);
        for (value, &want) in a.iter().zip(e.iter()) {
            match value {
                Some(v) => assert_almost_eq(*v, want),
                None => panic!("missing value in row {}, expected {}", row, want),
            }
        }
    }
}
