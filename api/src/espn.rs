/// ESPN API raw wire types — serde shapes for the athlete stat category trees.
/// Categories are deserialized one at a time so a single malformed category
/// can be skipped without losing the rest of the payload. Inside a category,
/// labels, rows and stat objects stay loose `Value`s and are read entry by
/// entry.
use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Column-label categories  (common v3 athlete stats)
// ---------------------------------------------------------------------------

/// `{ name, names: [...], statistics: [{ season, stats: [...] }] }`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct NamesCategory {
    pub name: Option<Value>,
    #[serde(rename = "displayName")]
    pub display_name: Option<Value>,
    /// Column labels; `names[i]` describes `stats[i]` of every row.
    /// Non-string labels leave their column unnamed.
    pub names: Option<Vec<Value>>,
    pub statistics: Option<Vec<Value>>,
}

impl NamesCategory {
    pub fn label(&self, index: usize) -> String {
        category_label(self.name.as_ref(), self.display_name.as_ref(), index)
    }

    /// Column label at `i`, if it is a non-blank string.
    pub fn column(&self, i: usize) -> Option<&str> {
        self.names
            .as_ref()?
            .get(i)?
            .as_str()
            .filter(|n| !n.trim().is_empty())
    }

    /// The first statistics row, when it has the row form.
    pub fn first_row(&self) -> Option<StatisticsRow> {
        let first = self.statistics.as_ref()?.first()?;
        serde_json::from_value(first.clone()).ok()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StatisticsRow {
    pub season: Option<SeasonMarker>,
    /// Positional values. ESPN sends strings, but numbers and nulls appear too.
    pub stats: Option<Vec<Value>>,
}

/// Season markers come as `{ "year": 2025 }`, a bare year, or a year string.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SeasonMarker {
    Detailed {
        year: Option<Value>,
        #[serde(rename = "displayName")]
        display_name: Option<String>,
    },
    Year(i64),
    Text(String),
    Unknown(Value),
}

impl SeasonMarker {
    /// The season year this marker names, if it can be read.
    pub fn year(&self) -> Option<i64> {
        match self {
            SeasonMarker::Detailed { year, display_name } => year
                .as_ref()
                .and_then(|y| match y {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
                .or_else(|| display_name.as_deref().and_then(leading_year)),
            SeasonMarker::Year(y) => Some(*y),
            SeasonMarker::Text(s) => leading_year(s),
            SeasonMarker::Unknown(_) => None,
        }
    }
}

// "2025" and "2025-26" both name the 2025 season.
fn leading_year(s: &str) -> Option<i64> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 4 { digits.parse().ok() } else { None }
}

// ---------------------------------------------------------------------------
// Stat-object categories  (site v2 athlete statistics, core v2 splits)
// ---------------------------------------------------------------------------

/// `{ name, stats: [{ name, value, displayValue }] }` — used both under
/// `categories[]` and under `splits.categories[]`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StatCategory {
    pub name: Option<Value>,
    #[serde(rename = "displayName")]
    pub display_name: Option<Value>,
    pub stats: Option<Vec<Value>>,
}

impl StatCategory {
    pub fn label(&self, index: usize) -> String {
        category_label(self.name.as_ref(), self.display_name.as_ref(), index)
    }

    /// Stat objects that deserialize and carry a string name; others are dropped.
    pub fn stat_objects(&self) -> impl Iterator<Item = StatObject> + '_ {
        self.stats
            .iter()
            .flatten()
            .filter_map(|raw| serde_json::from_value::<StatObject>(raw.clone()).ok())
            .filter(|stat| stat.name().is_some())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StatObject {
    pub name: Option<Value>,
    pub value: Option<Value>,
    #[serde(rename = "displayValue")]
    pub display_value: Option<Value>,
}

impl StatObject {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref()?.as_str().filter(|n| !n.trim().is_empty())
    }
}

// Labels only feed provenance tags, so a non-string name falls back to the
// display name and then to the category's position.
fn category_label(name: Option<&Value>, display_name: Option<&Value>, index: usize) -> String {
    name.and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| display_name.and_then(Value::as_str).filter(|s| !s.trim().is_empty()))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("#{index}"))
}
