//! FILENAME: tests/common/mod.rs
//! Fixtures for the persistence integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A small suppression-ratio study: GROUP x CYCLE x AGE.
pub struct SuppressionFixture;

impl SuppressionFixture {
    pub const CSV: &'static str = "\
SUBJECT,GROUP,AGE,CYCLE,SUPPRESSION
1,AA,old,1,20
2,AA,young,1,8
3,AA,old,2,24
4,AA,young,2,10
5,AB,old,1,18
6,AB,young,1,7
7,AB,old,2,32
8,AB,young,2,11
9,LAB,old,1,28
10,LAB,young,1,11
11,LAB,old,2,34
12,LAB,young,2,12
";

    /// Writes the fixture into `dir` and returns its path.
    pub fn write_to(dir: &Path) -> PathBuf {
        let path = dir.join("suppression~subjectXgroupXageXcycle.csv");
        fs::write(&path, Self::CSV).unwrap();
        path
    }
}

/// Reads a file and splits it on CRLF, dropping the trailing empty piece.
pub fn read_lines(path: &Path) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    let mut lines: Vec<String> = text.split("\r\n").map(str::to_string).collect();
    if lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines
}
