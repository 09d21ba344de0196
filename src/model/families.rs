//! Grouping of operations into families by their normalized label prefix.
//!
//! For SQL the family of `SELECT a FROM t WHERE id = 3` is `SELECT a FROM t`:
//! everything before the first boundary keyword found after the anchor.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Primary,
    Other,
}

/// Keywords driving family extraction. Matching is ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyRules {
    primary: String,
    anchor: String,
    boundaries: Vec<String>,
}

impl Default for FamilyRules {
    fn default() -> Self {
        Self::new("select", "from", ["where", "order by"])
    }
}

impl FamilyRules {
    /// `boundaries` are tried in order; the first one present wins.
    pub fn new(
        primary: impl Into<String>,
        anchor: impl Into<String>,
        boundaries: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let lower = |s: String| s.to_ascii_lowercase();
        Self {
            primary: lower(primary.into()),
            anchor: lower(anchor.into()),
            boundaries: boundaries
                .into_iter()
                .map(|b| lower(b.into()))
                .filter(|b| !b.is_empty())
                .collect(),
        }
    }

    pub fn bucket_of(&self, label: &str) -> Bucket {
        if label.to_ascii_lowercase().starts_with(&self.primary) {
            Bucket::Primary
        } else {
            Bucket::Other
        }
    }

    pub fn family_key(&self, label: &str) -> String {
        // ASCII lowering keeps byte offsets valid for `label`.
        let lower = label.to_ascii_lowercase();
        let from = if self.anchor.is_empty() {
            0
        } else {
            lower.find(&self.anchor).unwrap_or(0)
        };

        let cut = self
            .boundaries
            .iter()
            .find_map(|b| lower[from..].find(b.as_str()).map(|pos| from + pos))
            .unwrap_or_else(|| label.char_indices().last().map_or(0, |(pos, _)| pos));

        label[..cut].split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyRanking {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct Slot {
    bucket: Bucket,
    count: usize,
    /// When the key last (re)entered its bucket.
    since: usize,
}

/// Per-bucket occurrence counts of family keys.
///
/// A key lives in exactly one bucket. When an entry of the other kind shows up
/// the key moves there and its count starts again at one.
#[derive(Debug, Clone, Default)]
pub struct Families {
    slots: HashMap<String, Slot>,
}

impl Families {
    pub fn aggregate<'a>(rules: &FamilyRules, labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut slots: HashMap<String, Slot> = HashMap::new();
        for (seq, label) in labels.into_iter().enumerate() {
            let bucket = rules.bucket_of(label);
            let key = rules.family_key(label);
            match slots.get_mut(&key) {
                Some(slot) if slot.bucket == bucket => slot.count += 1,
                Some(slot) => {
                    tracing::debug!(family = %key, to = ?bucket, "family changes bucket");
                    *slot = Slot { bucket, count: 1, since: seq };
                }
                None => {
                    slots.insert(key, Slot { bucket, count: 1, since: seq });
                }
            }
        }
        Self { slots }
    }

    /// Families of `bucket`, most frequent first.
    pub fn ranked(&self, bucket: Bucket) -> Vec<FamilyRanking> {
        let mut members: Vec<(&String, &Slot)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.bucket == bucket)
            .collect();
        members.sort_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.since.cmp(&b.since)));
        members
            .into_iter()
            .map(|(key, slot)| FamilyRanking {
                key: key.clone(),
                count: slot.count,
            })
            .collect()
    }

    /// Number of distinct families over both buckets.
    pub fn distinct_count(&self) -> usize {
        self.slots.len()
    }
}
