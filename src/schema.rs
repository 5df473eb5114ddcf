//! Schema comparison between two datasets

use crate::dataset::Column;
use crate::value::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Set relationship between two schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Columns present in both, in the first dataset's order and casing
    pub common: Vec<String>,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub type_mismatches: IndexMap<String, TypeMismatch>,
}

impl SchemaDiff {
    pub fn has_changes(&self) -> bool {
        !self.only_in_a.is_empty() || !self.only_in_b.is_empty() || !self.type_mismatches.is_empty()
    }
}

/// Differing declared types for a common column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub type_a: DataType,
    pub type_b: DataType,
}

/// A common column located in both datasets
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPair {
    /// Canonical (first dataset) name
    pub name: String,
    pub index_a: usize,
    pub index_b: usize,
    pub type_a: DataType,
    pub type_b: DataType,
}

/// Schema diff plus the column positions needed by later phases
#[derive(Debug, Clone)]
pub struct SchemaMatch {
    pub diff: SchemaDiff,
    pub pairs: Vec<ColumnPair>,
    case_sensitive: bool,
    lookup: HashMap<String, usize>,
    /// Normalized names shared by more than one column in a dataset
    collided: HashSet<String>,
}

impl SchemaMatch {
    /// Find the common column a caller-supplied name refers to
    pub fn resolve(&self, name: &str) -> Option<&ColumnPair> {
        self.lookup
            .get(&normalize(name, self.case_sensitive))
            .map(|&idx| &self.pairs[idx])
    }

    /// True when `name` folds onto more than one column of either dataset
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.collided.contains(&normalize(name, self.case_sensitive))
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// Schema comparator
pub struct SchemaComparator;

impl SchemaComparator {
    /// Compare two schemas. Name matching follows `case_sensitive`; the first
    /// schema's casing is canonical.
    ///
    /// When two columns of one dataset fold onto the same name, the first one
    /// takes part in matching and the later one is reported as unique to its
    /// dataset.
    pub fn compare(a: &[Column], b: &[Column], case_sensitive: bool) -> SchemaMatch {
        let mut collided = HashSet::new();
        let a_index = index_by_name(a, case_sensitive, "first", &mut collided);
        let b_index = index_by_name(b, case_sensitive, "second", &mut collided);

        let mut diff = SchemaDiff::default();
        let mut pairs = Vec::new();
        let mut lookup = HashMap::new();
        let mut matched_b = vec![false; b.len()];

        for (index_a, col_a) in a.iter().enumerate() {
            let key = normalize(&col_a.name, case_sensitive);
            if a_index.get(&key) != Some(&index_a) {
                diff.only_in_a.push(col_a.name.clone());
                continue;
            }

            match b_index.get(&key) {
                Some(&index_b) => {
                    let col_b = &b[index_b];
                    matched_b[index_b] = true;

                    if col_a.data_type != col_b.data_type {
                        diff.type_mismatches.insert(
                            col_a.name.clone(),
                            TypeMismatch {
                                type_a: col_a.data_type,
                                type_b: col_b.data_type,
                            },
                        );
                    }

                    diff.common.push(col_a.name.clone());
                    lookup.insert(key, pairs.len());
                    pairs.push(ColumnPair {
                        name: col_a.name.clone(),
                        index_a,
                        index_b,
                        type_a: col_a.data_type,
                        type_b: col_b.data_type,
                    });
                }
                None => diff.only_in_a.push(col_a.name.clone()),
            }
        }

        diff.only_in_b = b
            .iter()
            .zip(matched_b)
            .filter(|(_, matched)| !matched)
            .map(|(col, _)| col.name.clone())
            .collect();

        if diff.common.is_empty() {
            log::warn!("Datasets share no columns");
        }

        SchemaMatch {
            diff,
            pairs,
            case_sensitive,
            lookup,
            collided,
        }
    }
}

fn normalize(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// First column per normalized name; later collisions are recorded and logged
fn index_by_name(
    columns: &[Column],
    case_sensitive: bool,
    which: &str,
    collided: &mut HashSet<String>,
) -> HashMap<String, usize> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let key = normalize(&column.name, case_sensitive);
        match index.get(&key) {
            Some(&first) => {
                log::warn!(
                    "Column '{}' in the {} dataset collides with '{}'; treating it as unmatched",
                    column.name,
                    which,
                    columns[first].name
                );
                collided.insert(key);
            }
            None => {
                index.insert(key, idx);
            }
        }
    }
    index
}
