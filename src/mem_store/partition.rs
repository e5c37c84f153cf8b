use std::collections::HashMap;

use fnv::{FnvHashMap, FnvHashSet};

use crate::ingest::row::{Filter, InsertRow};
use crate::mem_store::dictionary::{Dictionary, ValueId, VALUE_ID_FILTER_UNSPECIFIED, VALUE_ID_UNKNOWN};

/// Dense id assigned to a column in the order it was first observed.
/// Stable for the lifetime of the partition.
type ColumnId = u8;

/// The composite key a row's value-ids hash to: `[column_num, v0, v1, ...]`,
/// one entry per column in column-id order, `VALUE_ID_UNKNOWN` where the row
/// didn't supply a value. Boxed so the row index can own it without an
/// extra indirection per lookup.
type RowKey = Box<[u16]>;

/// An append-only, column-major store of `(value-vector, counter)` rows for
/// one named partition of a cube.
///
/// Every row is deduplicated on its composite key: inserting the same
/// combination of column values twice adds the two counts together rather
/// than creating two rows.
#[derive(Debug, Default)]
pub struct Partition {
    column_ids: FnvHashMap<String, ColumnId>,
    column_names: Vec<String>,
    dictionaries: Vec<Dictionary>,
    columns: Vec<Vec<ValueId>>,
    counters: Vec<u64>,
    row_index: FnvHashMap<RowKey, u32>,
}

impl Partition {
    pub fn new() -> Partition {
        Partition::default()
    }

    pub fn row_num(&self) -> usize {
        self.counters.len()
    }

    pub fn column_num(&self) -> usize {
        self.column_names.len()
    }

    fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.column_ids.get(name).copied()
    }

    /// Inserts or increments a row. Returns `false`, leaving the partition
    /// byte-for-byte unchanged, if any value in `row` would overflow its
    /// column's dictionary.
    pub fn insert(&mut self, row: &InsertRow) -> bool {
        for (column, value) in &row.columns {
            if let Some(id) = self.column_id(column) {
                if !self.dictionaries[id as usize].can_intern(value) {
                    return false;
                }
            }
            // A brand-new column starts with an empty dictionary, which can
            // always intern its first value.
        }

        for (column, _) in &row.columns {
            if self.column_id(column).is_none() {
                let id = self.column_names.len() as ColumnId;
                self.column_ids.insert(column.clone(), id);
                self.column_names.push(column.clone());
                self.dictionaries.push(Dictionary::new());
                self.columns.push(vec![VALUE_ID_UNKNOWN; self.row_num()]);
            }
        }

        let mut key = Vec::with_capacity(self.column_num() + 1);
        key.push(self.column_num() as u16);
        for c in 0..self.column_num() {
            let id = match row.columns.get(&self.column_names[c]) {
                Some(value) => self.dictionaries[c]
                    .intern(value)
                    .expect("dictionary capacity already checked"),
                None => VALUE_ID_UNKNOWN,
            };
            key.push(id);
        }

        match self.row_index.get(key.as_slice()) {
            Some(&row_index) => {
                self.counters[row_index as usize] += row.count;
            }
            None => {
                let row_index = self.row_num() as u32;
                for c in 0..self.column_num() {
                    self.columns[c].push(key[c + 1]);
                }
                self.counters.push(0);
                self.row_index.insert(key.into_boxed_slice(), row_index);
                self.counters[row_index as usize] += row.count;
            }
        }
        true
    }

    /// Resolves a filter against this partition's columns. `None` means the
    /// filter names a column this partition has never seen, so the whole
    /// partition contributes zero matches.
    fn resolve_filter(&self, filter: &Filter) -> Option<FnvHashMap<ColumnId, FnvHashSet<ValueId>>> {
        let mut resolved: FnvHashMap<ColumnId, FnvHashSet<ValueId>> = FnvHashMap::default();
        for (column, value) in &filter.constraints {
            let column_id = self.column_id(column)?;
            let value_id = self.dictionaries[column_id as usize]
                .lookup(value)
                .unwrap_or(VALUE_ID_FILTER_UNSPECIFIED);
            resolved.entry(column_id).or_default().insert(value_id);
        }
        Some(resolved)
    }

    fn row_matches(&self, row: usize, constraints: &FnvHashMap<ColumnId, FnvHashSet<ValueId>>) -> bool {
        constraints.iter().all(|(&column_id, allowed)| {
            allowed.contains(&self.columns[column_id as usize][row])
        })
    }

    /// Sum of counters over rows matching `filter` (every row if `None`).
    pub fn count(&self, filter: Option<&Filter>) -> u64 {
        let constraints = match filter {
            None => FnvHashMap::default(),
            Some(f) => match self.resolve_filter(f) {
                Some(c) => c,
                None => return 0,
            },
        };
        (0..self.row_num())
            .filter(|&row| self.row_matches(row, &constraints))
            .map(|row| self.counters[row])
            .sum()
    }

    /// Sum of counters over matching rows, bucketed by the string value of
    /// `group_column`. Empty if this partition has no such column. Rows
    /// that never had a value for `group_column` (value-id `UNKNOWN`) are
    /// excluded from every bucket rather than assigned a placeholder key.
    pub fn count_grouped(&self, filter: Option<&Filter>, group_column: &str) -> HashMap<String, u64> {
        let mut result = HashMap::new();
        let group_id = match self.column_id(group_column) {
            Some(id) => id,
            None => return result,
        };
        let constraints = match filter {
            None => FnvHashMap::default(),
            Some(f) => match self.resolve_filter(f) {
                Some(c) => c,
                None => return result,
            },
        };
        for row in 0..self.row_num() {
            if !self.row_matches(row, &constraints) {
                continue;
            }
            let value_id = self.columns[group_id as usize][row];
            if let Some(value) = self.dictionaries[group_id as usize].reverse(value_id) {
                *result.entry(value.to_string()).or_insert(0) += self.counters[row];
            }
        }
        result
    }

    /// Adds every column name and its full set of distinct values to `dest`.
    pub fn extend_column_value_set(&self, dest: &mut HashMap<String, std::collections::HashSet<String>>) {
        for (column, &id) in &self.column_ids {
            let dictionary = &self.dictionaries[id as usize];
            let values = dest.entry(column.clone()).or_default();
            for row in 0..self.row_num() {
                let value_id = self.columns[id as usize][row];
                if let Some(value) = dictionary.reverse(value_id) {
                    values.insert(value.to_string());
                }
            }
        }
    }

    /// Visits every stored row as `(column -> value, count)`, skipping
    /// columns the row never had a value for. Used by the dump writer;
    /// `partition_name` is threaded in by the caller since a partition does
    /// not know its own name.
    pub fn for_each_row(&self, mut visitor: impl FnMut(&HashMap<String, String>, u64)) {
        for row in 0..self.row_num() {
            let mut columns = HashMap::new();
            for c in 0..self.column_num() {
                let value_id = self.columns[c][row];
                if let Some(value) = self.dictionaries[c].reverse(value_id) {
                    columns.insert(self.column_names[c].clone(), value.to_string());
                }
            }
            visitor(&columns, self.counters[row]);
        }
    }
}
