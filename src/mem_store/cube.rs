use std::collections::{HashMap, HashSet};

use crate::ingest::row::{Filter, InsertRow};
use crate::mem_store::partition::Partition;

/// The result of a (possibly grouped) count: a single running total, or a
/// value -> count breakdown when a group column was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountResult {
    Scalar(u64),
    Grouped(HashMap<String, u64>),
}

fn in_range(name: &str, from: Option<&str>, to: Option<&str>) -> bool {
    from.map_or(true, |f| name >= f) && to.map_or(true, |t| name <= t)
}

/// A named collection of partitions, ordered lexicographically (byte-wise)
/// by partition name for range queries.
#[derive(Debug, Default)]
pub struct Cube {
    partitions: HashMap<String, Partition>,
}

impl Cube {
    pub fn new() -> Cube {
        Cube::default()
    }

    /// Inserts into the named partition, creating it if this is its first row.
    pub fn insert(&mut self, row: &InsertRow) -> bool {
        self.partitions
            .entry(row.partition.clone())
            .or_insert_with(Partition::new)
            .insert(row)
    }

    fn selected(&self, from: Option<&str>, to: Option<&str>) -> impl Iterator<Item = (&String, &Partition)> {
        self.partitions
            .iter()
            .filter(move |(name, _)| in_range(name, from, to))
    }

    pub fn count_from_to(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        filter: Option<&Filter>,
        group_column: Option<&str>,
    ) -> CountResult {
        match group_column {
            None => {
                let total = self.selected(from, to).map(|(_, p)| p.count(filter)).sum();
                CountResult::Scalar(total)
            }
            Some(group_column) => {
                let mut merged: HashMap<String, u64> = HashMap::new();
                for (_, partition) in self.selected(from, to) {
                    for (value, count) in partition.count_grouped(filter, group_column) {
                        *merged.entry(value).or_insert(0) += count;
                    }
                }
                CountResult::Grouped(merged)
            }
        }
    }

    pub fn pcount_from_to(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        filter: Option<&Filter>,
        group_column: Option<&str>,
    ) -> HashMap<String, CountResult> {
        self.selected(from, to)
            .map(|(name, partition)| {
                let result = match group_column {
                    None => CountResult::Scalar(partition.count(filter)),
                    Some(group_column) => CountResult::Grouped(partition.count_grouped(filter, group_column)),
                };
                (name.clone(), result)
            })
            .collect()
    }

    /// Drops every partition whose name falls in `[from, to]`. Returns how
    /// many were dropped.
    pub fn delete_partition_from_to(&mut self, from: Option<&str>, to: Option<&str>) -> usize {
        let names: Vec<String> = self.selected(from, to).map(|(name, _)| name.clone()).collect();
        for name in &names {
            self.partitions.remove(name);
        }
        names.len()
    }

    pub fn get_columns_to_value_set(&self, from: Option<&str>, to: Option<&str>) -> HashMap<String, HashSet<String>> {
        let mut dest = HashMap::new();
        for (_, partition) in self.selected(from, to) {
            partition.extend_column_value_set(&mut dest);
        }
        dest
    }

    pub fn partition_names(&self) -> Vec<String> {
        self.partitions.keys().cloned().collect()
    }

    pub fn has_partition(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    pub fn for_each_partition(&self, mut visitor: impl FnMut(&str, &Partition)) {
        for (name, partition) in &self.partitions {
            visitor(name, partition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(partition: &str, columns: &[(&str, &str)], count: u64) -> InsertRow {
        InsertRow {
            cube: "c".to_string(),
            partition: partition.to_string(),
            columns: columns.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            count,
        }
    }

    #[test]
    fn insert_auto_creates_partitions() {
        let mut cube = Cube::new();
        assert!(!cube.has_partition("p1"));
        cube.insert(&row("p1", &[("col", "a")], 3));
        assert!(cube.has_partition("p1"));
    }

    #[test]
    fn range_scan_is_inclusive_and_byte_wise() {
        let mut cube = Cube::new();
        cube.insert(&row("p1", &[("col", "a")], 3));
        cube.insert(&row("p2", &[("col", "b")], 7));
        cube.insert(&row("p3", &[("col", "c")], 100));
        match cube.count_from_to(Some("p1"), Some("p2"), None, None) {
            CountResult::Scalar(total) => assert_eq!(total, 10),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn reversed_range_selects_nothing() {
        let mut cube = Cube::new();
        cube.insert(&row("p1", &[("col", "a")], 3));
        match cube.count_from_to(Some("p2"), Some("p1"), None, None) {
            CountResult::Scalar(total) => assert_eq!(total, 0),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn pcount_groups_results_by_partition_name() {
        let mut cube = Cube::new();
        cube.insert(&row("p1", &[("col", "a")], 3));
        cube.insert(&row("p2", &[("col", "b")], 7));
        let result = cube.pcount_from_to(Some("p1"), Some("p2"), None, None);
        assert_eq!(result.get("p1"), Some(&CountResult::Scalar(3)));
        assert_eq!(result.get("p2"), Some(&CountResult::Scalar(7)));
    }

    #[test]
    fn delete_partition_range_drops_only_matched_partitions() {
        let mut cube = Cube::new();
        cube.insert(&row("p1", &[("col", "a")], 1));
        cube.insert(&row("p2", &[("col", "a")], 1));
        let dropped = cube.delete_partition_from_to(Some("p1"), Some("p1"));
        assert_eq!(dropped, 1);
        assert!(!cube.has_partition("p1"));
        assert!(cube.has_partition("p2"));
    }
}
