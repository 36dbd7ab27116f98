pub mod client;
pub mod config;
pub mod espn;
pub mod extract;
pub mod normalize;
pub mod shape;
pub mod store;
pub mod sync;
pub mod table;

use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of ESPN wire format
// ---------------------------------------------------------------------------

/// A raw stat value as it came off the wire.
///
/// Numbers are parsed eagerly during extraction; anything that is not plainly
/// numeric stays text so dash-encoded combos ("6-8") survive until splitting.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric view of the value. Text is re-parsed with the same rules the
    /// extractor uses, so "1,024" reads as 1024.0 and "6-8" reads as `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => extract::parse_numeric(s),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Number(_) => None,
            RawValue::Text(s) => Some(s),
        }
    }
}

/// One name/value pair produced while walking a category tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatEntry {
    pub name: String,
    pub value: RawValue,
    pub source_tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedStat {
    pub value: RawValue,
    /// Every payload/category that wrote this key, not just the winner.
    pub provenance: BTreeSet<String>,
}

/// Flat raw-name → value map for one athlete, built fresh per invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedStatMap {
    entries: BTreeMap<String, ExtractedStat>,
}

impl ExtractedStatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins on the value; provenance accumulates.
    pub fn insert(&mut self, entry: RawStatEntry) {
        let RawStatEntry { name, value, source_tag } = entry;
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing.value = value;
                existing.provenance.insert(source_tag);
            }
            None => {
                self.entries.insert(
                    name,
                    ExtractedStat { value, provenance: BTreeSet::from([source_tag]) },
                );
            }
        }
    }

    /// Merge a later map into this one. Values from `later` win per key and
    /// provenance sets are unioned.
    pub fn absorb(&mut self, later: ExtractedStatMap) {
        for (name, stat) in later.entries {
            match self.entries.get_mut(&name) {
                Some(existing) => {
                    existing.value = stat.value;
                    existing.provenance.extend(stat.provenance);
                }
                None => {
                    self.entries.insert(name, stat);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.entries.get(name).map(|s| &s.value)
    }

    pub fn provenance(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(name).map(|s| &s.provenance)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RawStatEntry> for ExtractedStatMap {
    fn from_iter<I: IntoIterator<Item = RawStatEntry>>(iter: I) -> Self {
        let mut map = Self::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

/// The normalized output: every declared canonical field, in table order.
///
/// Fields are private so a record cannot be edited after assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPlayerRecord {
    athlete_id: String,
    stats: Vec<(String, f64)>,
}

impl CanonicalPlayerRecord {
    pub(crate) fn new(athlete_id: String, stats: Vec<(String, f64)>) -> Self {
        Self { athlete_id, stats }
    }

    pub fn athlete_id(&self) -> &str {
        &self.athlete_id
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.stats.iter().find(|(name, _)| name == field).map(|(_, v)| *v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, f64)> {
        self.stats.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

struct OrderedStats<'a>(&'a [(String, f64)]);

impl Serialize for OrderedStats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for CanonicalPlayerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("CanonicalPlayerRecord", 2)?;
        record.serialize_field("athleteId", &self.athlete_id)?;
        record.serialize_field("stats", &OrderedStats(&self.stats))?;
        record.end()
    }
}
