//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable description of one pivot request.
//!
//! This module contains all the types needed to DESCRIBE a pivot:
//! - Which column is summarized, and by which row/column factors
//! - Which aggregate is applied to each bucket
//! - Which factor values are excluded before grouping
//!
//! These structures are plain data with `Default` impls so they can be
//! built in code, loaded from JSON, and stored next to the result they
//! produced.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use engine::{CellValue, TableError, TableResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for pivot buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Count,
    Average,
    StdDev,
    Sem,
    Var,
    Rms,
    Min,
    Max,
    Range,
    Median,
    Skew,
    GroupConcat,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Average
    }
}

impl AggregationType {
    /// Every aggregation, in declaration order.
    pub const ALL: [AggregationType; 13] = [
        AggregationType::Sum,
        AggregationType::Count,
        AggregationType::Average,
        AggregationType::StdDev,
        AggregationType::Sem,
        AggregationType::Var,
        AggregationType::Rms,
        AggregationType::Min,
        AggregationType::Max,
        AggregationType::Range,
        AggregationType::Median,
        AggregationType::Skew,
        AggregationType::GroupConcat,
    ];

    /// Resolves a user-supplied aggregate name. Matching is case-insensitive
    /// and accepts the common aliases.
    pub fn parse(name: &str) -> TableResult<Self> {
        let aggregation = match name.trim().to_ascii_lowercase().as_str() {
            "sum" => AggregationType::Sum,
            "count" | "n" => AggregationType::Count,
            "avg" | "mean" | "average" => AggregationType::Average,
            "stdev" | "sd" | "std" | "stddev" => AggregationType::StdDev,
            "sem" | "se" => AggregationType::Sem,
            "var" | "variance" => AggregationType::Var,
            "rms" => AggregationType::Rms,
            "min" => AggregationType::Min,
            "max" => AggregationType::Max,
            "range" => AggregationType::Range,
            "median" => AggregationType::Median,
            "skew" | "skewness" => AggregationType::Skew,
            "group_concat" | "concat" => AggregationType::GroupConcat,
            _ => return Err(TableError::UnknownAggregate(name.to_string())),
        };
        Ok(aggregation)
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::Average => "avg",
            AggregationType::StdDev => "stdev",
            AggregationType::Sem => "sem",
            AggregationType::Var => "var",
            AggregationType::Rms => "rms",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Range => "range",
            AggregationType::Median => "median",
            AggregationType::Skew => "skew",
            AggregationType::GroupConcat => "group_concat",
        }
    }

    /// Whether the aggregate reduces numbers (as opposed to counting or
    /// concatenating whatever the bucket holds).
    pub fn is_numeric(self) -> bool {
        !matches!(self, AggregationType::Count | AggregationType::GroupConcat)
    }
}

impl FromStr for AggregationType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregationType::parse(s)
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// EXCLUSIONS
// ============================================================================

/// Per-factor value blacklist applied before grouping.
/// Fields are kept in name order; adding the same value twice is a no-op,
/// so repeated or split exclusion specs produce identical row sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exclusions {
    fields: BTreeMap<String, Vec<CellValue>>,
}

impl Exclusions {
    pub fn new() -> Self {
        Exclusions { fields: BTreeMap::new() }
    }

    /// Adds values to the blacklist of `field`, skipping duplicates.
    pub fn exclude<I, V>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let entry = self.fields.entry(field.into()).or_default();
        for value in values {
            let value = value.into();
            if !entry.contains(&value) {
                entry.push(value);
            }
        }
    }

    /// Builder form of [`Exclusions::exclude`].
    pub fn with<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.exclude(field, values);
        self
    }

    /// Merges another exclusion set into this one (union per field).
    pub fn merge(&mut self, other: &Exclusions) {
        for (field, values) in &other.fields {
            self.exclude(field.clone(), values.iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    /// Excluded fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[CellValue])> {
        self.fields
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, values)| (field.as_str(), values.as_slice()))
    }

    /// Whether `value` is excluded for `field`.
    pub fn is_excluded(&self, field: &str, value: &CellValue) -> bool {
        self.fields
            .get(field)
            .map_or(false, |values| values.contains(value))
    }

    /// Human-readable description, e.g.
    /// `WORDS where AGE not in {old} or CYCLE not in {1; 2}`.
    /// Values are joined with `; ` when the output is comma-delimited so
    /// the description stays a single field.
    pub fn describe(&self, target: &str, delimiter: u8) -> String {
        let value_sep = if delimiter == b',' { "; " } else { ", " };
        let clauses: Vec<String> = self
            .fields()
            .map(|(field, values)| {
                let rendered: Vec<String> = values.iter().map(CellValue::display_value).collect();
                format!("{} not in {{{}}}", field, rendered.join(value_sep))
            })
            .collect();

        if clauses.is_empty() {
            target.to_string()
        } else {
            format!("{} where {}", target, clauses.join(" or "))
        }
    }
}

// ============================================================================
// PIVOT REQUEST
// ============================================================================

/// The complete description of one pivot call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotRequest {
    /// The column whose values are aggregated.
    pub target: String,

    /// Row factors, outermost first.
    #[serde(default)]
    pub rows: Vec<String>,

    /// Column factors, outermost first.
    #[serde(default)]
    pub cols: Vec<String>,

    /// The aggregate applied to every bucket.
    #[serde(default)]
    pub aggregate: AggregationType,

    /// Values removed from consideration before grouping.
    #[serde(default)]
    pub exclude: Exclusions,
}

impl PivotRequest {
    /// A request that averages `target` over the whole table.
    pub fn new(target: impl Into<String>) -> Self {
        PivotRequest {
            target: target.into(),
            ..PivotRequest::default()
        }
    }

    pub fn rows<I, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows = rows.into_iter().map(Into::into).collect();
        self
    }

    pub fn cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cols = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn aggregate(mut self, aggregate: AggregationType) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Sets the aggregate from a (case-insensitive, aliased) name.
    pub fn aggregate_named(mut self, name: &str) -> TableResult<Self> {
        self.aggregate = AggregationType::parse(name)?;
        Ok(self)
    }

    pub fn exclude<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.exclude.exclude(field, values);
        self
    }

    /// Adds every exclusion of `exclusions` to the request.
    pub fn excluding(mut self, exclusions: &Exclusions) -> Self {
        self.exclude.merge(exclusions);
        self
    }

    /// Builds a request from a loosely-typed JSON object:
    ///
    /// `{"target": "WORDS", "rows": ["AGE"], "cols": [], "aggregate": "AVG",
    ///   "exclude": {"AGE": ["old"]}}`
    ///
    /// `rows` and `cols` must be arrays of strings; a bare string is
    /// rejected rather than split into characters.
    pub fn from_json(value: &serde_json::Value) -> TableResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| TableError::TypeError("pivot request must be an object".to_string()))?;

        let target = object
            .get("target")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| TableError::TypeError("target should be a string".to_string()))?;

        let mut request = PivotRequest::new(target);
        request.rows = factor_list(object.get("rows"), "rows")?;
        request.cols = factor_list(object.get("cols"), "cols")?;

        if let Some(aggregate) = object.get("aggregate") {
            let name = aggregate
                .as_str()
                .ok_or_else(|| TableError::TypeError("aggregate should be a string".to_string()))?;
            request.aggregate = AggregationType::parse(name)?;
        }

        if let Some(exclude) = object.get("exclude") {
            let fields = exclude
                .as_object()
                .ok_or_else(|| TableError::TypeError("exclude should be a mapping".to_string()))?;
            for (field, values) in fields {
                let values = values.as_array().ok_or_else(|| {
                    TableError::TypeError(format!("exclude['{}'] should be a list", field))
                })?;
                let cells = values.iter().map(json_to_cell).collect::<TableResult<Vec<_>>>()?;
                request.exclude.exclude(field.clone(), cells);
            }
        }

        Ok(request)
    }
}

fn factor_list(value: Option<&serde_json::Value>, what: &str) -> TableResult<Vec<String>> {
    let not_a_list = || TableError::TypeError(format!("{} should be a list", what));
    match value {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(not_a_list))
            .collect(),
        Some(_) => Err(not_a_list()),
    }
}

fn json_to_cell(value: &serde_json::Value) -> TableResult<CellValue> {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .ok_or_else(|| TableError::TypeError(format!("unsupported number {}", n))),
        serde_json::Value::String(s) => Ok(CellValue::Text(s.clone())),
        serde_json::Value::Null => Ok(CellValue::Missing),
        other => Err(TableError::TypeError(format!("unsupported exclusion value {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aggregate_names_are_case_insensitive() {
        assert_eq!(AggregationType::parse("AVG").unwrap(), AggregationType::Average);
        assert_eq!(AggregationType::parse("avg").unwrap(), AggregationType::Average);
        assert_eq!(AggregationType::parse("Average").unwrap(), AggregationType::Average);
        assert_eq!(AggregationType::parse("SD").unwrap(), AggregationType::StdDev);
        assert_eq!("group_concat".parse::<AggregationType>().unwrap(), AggregationType::GroupConcat);
    }

    #[test]
    fn test_unknown_aggregate_fails_fast() {
        let err = AggregationType::parse("mode").unwrap_err();
        assert_eq!(err, TableError::UnknownAggregate("mode".to_string()));
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for aggregation in AggregationType::ALL {
            assert_eq!(AggregationType::parse(aggregation.name()).unwrap(), aggregation);
        }
    }

    #[test]
    fn test_exclusions_are_idempotent() {
        let mut once = Exclusions::new();
        once.exclude("CYCLE", [1, 2]);

        let mut twice = Exclusions::new();
        twice.exclude("CYCLE", [1]);
        twice.exclude("CYCLE", [2, 1]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_request_merges_exclusion_sets() {
        let request = PivotRequest::new("WORDS")
            .exclude("AGE", ["old"])
            .excluding(&Exclusions::new().with("AGE", ["old", "young"]).with("CONDITION", ["counting"]));

        let expected = Exclusions::new()
            .with("AGE", ["old", "young"])
            .with("CONDITION", ["counting"]);
        assert_eq!(request.exclude, expected);
        assert!(!AggregationType::Count.is_numeric());
        assert!(AggregationType::Skew.is_numeric());
    }

    #[test]
    fn test_describe_exclusions() {
        let exclusions = Exclusions::new()
            .with("GROUP", ["AB"])
            .with("CYCLE", [1, 2]);

        assert_eq!(
            exclusions.describe("SUPPRESSION", b','),
            "SUPPRESSION where CYCLE not in {1; 2} or GROUP not in {AB}"
        );
        assert_eq!(
            exclusions.describe("SUPPRESSION", b'\t'),
            "SUPPRESSION where CYCLE not in {1, 2} or GROUP not in {AB}"
        );
        assert_eq!(Exclusions::new().describe("SUPPRESSION", b','), "SUPPRESSION");
    }

    #[test]
    fn test_request_from_json() {
        let request = PivotRequest::from_json(&json!({
            "target": "WORDS",
            "rows": ["AGE"],
            "aggregate": "AVG",
            "exclude": {"CONDITION": ["counting", 3]}
        }))
        .unwrap();

        assert_eq!(request.rows, vec!["AGE".to_string()]);
        assert!(request.cols.is_empty());
        assert_eq!(request.aggregate, AggregationType::Average);
        assert!(request.exclude.is_excluded("CONDITION", &CellValue::Number(3.0)));
    }

    #[test]
    fn test_request_from_json_rejects_bare_strings() {
        let err = PivotRequest::from_json(&json!({"target": "SUBJECT", "rows": "AGE"})).unwrap_err();
        assert_eq!(err.to_string(), "rows should be a list");

        let err = PivotRequest::from_json(&json!({"target": "SUBJECT", "cols": 42})).unwrap_err();
        assert_eq!(err, TableError::TypeError("cols should be a list".to_string()));
    }

    #[test]
    fn test_request_serde_round_trip() {
        let request = PivotRequest::new("WORDS")
            .rows(["AGE"])
            .cols(["CONDITION"])
            .aggregate(AggregationType::Sum)
            .exclude("AGE", ["old"]);

        let json = serde_json::to_string(&request).unwrap();
        let back: PivotRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
