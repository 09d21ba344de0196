//! Detection of operations issued more than once with identical text.

use serde::Serialize;
use std::collections::HashMap;

/// Entries sharing one label, in label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Duplicates {
    /// Only groups with at least two members, by first occurrence.
    groups: Vec<DuplicateGroup>,
    group_of: HashMap<usize, usize>,
}

/// Content hash of a label. Exact match: case and whitespace matter.
pub fn content_hash(label: &str) -> String {
    blake3::hash(label.as_bytes()).to_hex().to_string()
}

impl Duplicates {
    pub fn detect<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut order: Vec<DuplicateGroup> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();

        for (index, label) in labels.into_iter().enumerate() {
            let key = content_hash(label);
            match slot_of.get(&key) {
                Some(&slot) => order[slot].indices.push(index),
                None => {
                    slot_of.insert(key.clone(), order.len());
                    order.push(DuplicateGroup {
                        key,
                        indices: vec![index],
                    });
                }
            }
        }

        let groups: Vec<DuplicateGroup> = order
            .into_iter()
            .filter(|group| group.indices.len() >= 2)
            .collect();

        let mut group_of = HashMap::new();
        for (slot, group) in groups.iter().enumerate() {
            for &index in &group.indices {
                group_of.insert(index, slot);
            }
        }

        Self { groups, group_of }
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Number of entries involved in duplication (not the number of groups).
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.indices.len()).sum()
    }

    pub fn group_of(&self, index: usize) -> Option<&DuplicateGroup> {
        self.group_of.get(&index).map(|&slot| &self.groups[slot])
    }

    /// The other members of `index`'s group, for cross-linking.
    pub fn others(&self, index: usize) -> Vec<usize> {
        self.group_of(index)
            .map(|g| g.indices.iter().copied().filter(|&i| i != index).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn two_identical_labels_form_one_group() {
        let dups = Duplicates::detect(["A", "A", "B"]);

        assert_eq!(
            dups.groups(),
            &[DuplicateGroup {
                key: content_hash("A"),
                indices: vec![0, 1],
            }]
        );
        assert_eq!(dups.total_count(), 2);
        assert_eq!(dups.group_of(2), None);
        assert_eq!(dups.others(1), vec![0]);
    }

    #[test]
    fn match_is_exact() {
        let dups = Duplicates::detect([
            "SELECT * FROM t WHERE id = 1",
            "SELECT * FROM t WHERE id = 2",
            "select * from t where id = 1",
            "SELECT * FROM t  WHERE id = 1",
        ]);
        assert!(dups.groups().is_empty());
        assert_eq!(dups.total_count(), 0);
    }

    #[test]
    fn count_sums_group_sizes() {
        let dups = Duplicates::detect(["x", "y", "x", "y", "x", "z"]);
        assert_eq!(dups.groups().len(), 2);
        assert_eq!(dups.groups()[0].indices, vec![0, 2, 4]);
        assert_eq!(dups.groups()[1].indices, vec![1, 3]);
        assert_eq!(dups.total_count(), 5);
    }

    proptest! {
        #[test]
        fn detection_is_idempotent(labels in prop::collection::vec("[ab]{0,2}", 0..20)) {
            let first = Duplicates::detect(labels.iter().map(String::as_str));
            let second = Duplicates::detect(labels.iter().map(String::as_str));
            prop_assert_eq!(first.groups(), second.groups());
            for group in first.groups() {
                prop_assert!(group.indices.len() >= 2);
                prop_assert!(group.indices.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
