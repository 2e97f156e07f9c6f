//! FILENAME: core/pivot-engine/src/cache.rs
//! Factor Cache - Interned, ordered levels for the grouping factors.
//!
//! The cache is designed for:
//! - One O(n) pass per factor over the rows that survive exclusion
//! - Each distinct value stored once and referenced by a compact id
//! - Levels sorted once, so every row maps to its level rank in O(1)
//!
//! Architecture:
//! - `FactorCache` interns one factor column and knows each row's level
//! - `AxisCache` combines the factors of one axis (rows or columns) into
//!   the dense Cartesian product of their levels
//! - `build_filter_mask` turns exclusions into the row set the axes see

use std::cmp::Ordering;

use engine::{CellValue, DiagnosticKind, Diagnostics, Table, TableResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::Exclusions;

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a factor's level store.
/// Using u32 to save memory (supports up to 4B distinct values per factor).
pub type ValueId = u32;

/// Marks a row that was removed by the exclusion filter.
pub const VALUE_ID_EXCLUDED: ValueId = u32::MAX;

/// Level ranks of one key, outermost factor first.
pub type KeyPath = SmallVec<[usize; 4]>;

/// A normalized, hashable representation of a cell value.
/// Used as keys in the distinct value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheValue {
    Missing,
    Number(OrderedFloat),
    Text(String),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Missing => CacheValue::Missing,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
        }
    }
}

impl CacheValue {
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            CacheValue::Missing => CellValue::Missing,
            CacheValue::Number(n) => CellValue::Number(n.0),
            CacheValue::Text(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash equal
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// FACTOR CACHE
// ============================================================================

/// Cache for a single factor column.
/// Stores the distinct values of the surviving rows in sorted order.
#[derive(Debug, Clone)]
pub struct FactorCache {
    /// The factor column label.
    pub name: String,

    /// Map from value to its id (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// Distinct values in first-seen order (indexed by ValueId).
    id_to_value: Vec<CacheValue>,

    /// Sort position of each ValueId.
    rank_of_id: Vec<usize>,

    /// ValueIds in ascending value order.
    sorted_ids: Vec<ValueId>,

    /// ValueId of every source row, `VALUE_ID_EXCLUDED` for filtered rows.
    row_ids: Vec<ValueId>,
}

impl FactorCache {
    /// Interns the values of `column` for the rows where `mask` is true.
    pub fn build(name: &str, column: &[CellValue], mask: &[bool]) -> Self {
        let mut cache = FactorCache {
            name: name.to_string(),
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            rank_of_id: Vec::new(),
            sorted_ids: Vec::new(),
            row_ids: Vec::with_capacity(column.len()),
        };

        for (value, &included) in column.iter().zip(mask.iter()) {
            let id = if included {
                cache.intern(CacheValue::from(value))
            } else {
                VALUE_ID_EXCLUDED
            };
            cache.row_ids.push(id);
        }

        cache.rebuild_sort_order();
        cache
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    fn intern(&mut self, value: CacheValue) -> ValueId {
        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Rebuilds the sorted order of distinct values.
    fn rebuild_sort_order(&mut self) {
        self.sorted_ids = (0..self.id_to_value.len() as ValueId).collect();
        self.sorted_ids.sort_by(|&a, &b| {
            let va = &self.id_to_value[a as usize];
            let vb = &self.id_to_value[b as usize];
            Self::compare_cache_values(va, vb)
        });

        self.rank_of_id = vec![0; self.id_to_value.len()];
        for (rank, &id) in self.sorted_ids.iter().enumerate() {
            self.rank_of_id[id as usize] = rank;
        }
    }

    /// Comparison function for sorting CacheValues.
    fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
        match (a, b) {
            (CacheValue::Missing, CacheValue::Missing) => Ordering::Equal,
            (CacheValue::Missing, _) => Ordering::Less,
            (_, CacheValue::Missing) => Ordering::Greater,

            (CacheValue::Number(na), CacheValue::Number(nb)) => na.0.total_cmp(&nb.0),
            (CacheValue::Number(_), _) => Ordering::Less,
            (_, CacheValue::Number(_)) => Ordering::Greater,

            (CacheValue::Text(ta), CacheValue::Text(tb)) => ta.cmp(tb),
        }
    }

    /// Returns the number of distinct values among the surviving rows.
    pub fn level_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Distinct values in sorted order.
    pub fn levels(&self) -> Vec<CellValue> {
        self.sorted_ids
            .iter()
            .map(|&id| self.id_to_value[id as usize].to_cell_value())
            .collect()
    }

    /// The value at a sort position.
    pub fn level(&self, rank: usize) -> Option<CellValue> {
        self.sorted_ids
            .get(rank)
            .map(|&id| self.id_to_value[id as usize].to_cell_value())
    }

    /// Sort position of the value in `row`, `None` for excluded rows.
    pub fn rank_of_row(&self, row: usize) -> Option<usize> {
        match self.row_ids.get(row) {
            Some(&id) if id != VALUE_ID_EXCLUDED => Some(self.rank_of_id[id as usize]),
            _ => None,
        }
    }
}

// ============================================================================
// AXIS CACHE
// ============================================================================

/// The factors of one pivot axis and the dense product of their levels.
/// An axis without factors has exactly one (empty) key.
#[derive(Debug, Clone, Default)]
pub struct AxisCache {
    pub factors: Vec<FactorCache>,
}

impl AxisCache {
    pub fn build<S: AsRef<str>>(table: &Table, names: &[S], mask: &[bool]) -> TableResult<Self> {
        let factors = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                table
                    .get_column(name)
                    .map(|column| FactorCache::build(name, column, mask))
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(AxisCache { factors })
    }

    /// Number of keys on this axis: the product of the level counts.
    pub fn len(&self) -> usize {
        self.factors.iter().map(FactorCache::level_count).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `row` on this axis (first factor varies slowest).
    pub fn index_of_row(&self, row: usize) -> Option<usize> {
        let mut index = 0;
        for factor in &self.factors {
            index = index * factor.level_count() + factor.rank_of_row(row)?;
        }
        Some(index)
    }

    /// Every key of the axis, in order, as level ranks.
    pub fn key_paths(&self) -> Vec<KeyPath> {
        let sizes: KeyPath = self.factors.iter().map(FactorCache::level_count).collect();
        let total = self.len();
        let mut paths = Vec::with_capacity(total);
        if total == 0 {
            return paths;
        }

        // Odometer over the level ranks, last factor spinning fastest.
        let mut current: KeyPath = SmallVec::from_elem(0, sizes.len());
        for _ in 0..total {
            paths.push(current.clone());
            for pos in (0..sizes.len()).rev() {
                current[pos] += 1;
                if current[pos] < sizes[pos] {
                    break;
                }
                current[pos] = 0;
            }
        }
        paths
    }

    /// Every key of the axis, in order, as factor values.
    pub fn keys(&self) -> Vec<Vec<CellValue>> {
        self.key_paths()
            .iter()
            .map(|path| {
                path.iter()
                    .zip(self.factors.iter())
                    .map(|(&rank, factor)| factor.level(rank).unwrap_or(CellValue::Missing))
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Builds the row mask for `exclusions`: true keeps the row.
/// Every excluded value that never occurs in its column is reported as an
/// `UnusedExclusion` warning; the filter still applies the rest.
pub fn build_filter_mask(
    table: &Table,
    exclusions: &Exclusions,
    row_count: usize,
    diagnostics: &mut Diagnostics,
) -> TableResult<Vec<bool>> {
    let mut mask = vec![true; row_count];

    for (field, excluded) in exclusions.fields() {
        let column = table.get_column(field)?;
        let mut seen = vec![false; excluded.len()];

        for (row, value) in column.iter().enumerate().take(row_count) {
            if let Some(pos) = excluded.iter().position(|e| e == value) {
                seen[pos] = true;
                mask[row] = false;
            }
        }

        for (value, found) in excluded.iter().zip(seen) {
            if found {
                continue;
            }
            diagnostics.warn(
                DiagnosticKind::UnusedExclusion,
                format!(
                    "exclusion value '{}' never occurs in column '{}'",
                    value.display_value(),
                    field
                ),
            );
        }
    }

    Ok(mask)
}
