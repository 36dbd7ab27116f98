//! Structural classification of athlete stat payloads.
//!
//! The three ESPN stat endpoints share no envelope type, so a payload is
//! probed for the paths each shape needs. Probes are independent: one payload
//! may carry several shapes, and each one found is extracted.
use serde_json::Value;

/// A category tree recognised inside a payload, borrowing its category array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// `categories[]` with `names[]` column labels and positional `statistics[].stats[]`.
    CategoryNames(&'a [Value]),
    /// `categories[]` with `stats[]` of `{name, value, displayValue}` objects.
    CategoryStats(&'a [Value]),
    /// `splits.categories[]` holding the same stat-object form.
    Splits(&'a [Value]),
}

impl PayloadShape<'_> {
    /// Short label used in provenance tags.
    pub fn tag(&self) -> &'static str {
        match self {
            PayloadShape::CategoryNames(_) => "names",
            PayloadShape::CategoryStats(_) => "stats",
            PayloadShape::Splits(_) => "splits",
        }
    }
}

/// Every shape the payload matches, in fixed order: names, stats, splits.
/// An empty result means the payload is malformed for our purposes.
pub fn classify(payload: &Value) -> Vec<PayloadShape<'_>> {
    let mut shapes = Vec::new();

    if let Some(categories) = array_at(payload, "categories") {
        if categories.iter().any(is_names_category) {
            shapes.push(PayloadShape::CategoryNames(categories));
        }
        if categories.iter().any(is_stats_category) {
            shapes.push(PayloadShape::CategoryStats(categories));
        }
    }

    if let Some(categories) = payload.get("splits").and_then(|s| array_at(s, "categories"))
        && categories.iter().any(is_stats_category)
    {
        shapes.push(PayloadShape::Splits(categories));
    }

    shapes
}

fn array_at<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

fn is_names_category(category: &Value) -> bool {
    array_at(category, "names").is_some() && array_at(category, "statistics").is_some()
}

fn is_stats_category(category: &Value) -> bool {
    array_at(category, "stats").is_some_and(|stats| stats.iter().all(Value::is_object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_shape_is_recognised() {
        let payload = json!({
            "categories": [{
                "name": "passing",
                "names": ["completions"],
                "statistics": [{"stats": ["20"]}]
            }]
        });
        let shapes = classify(&payload);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].tag(), "names");
    }

    #[test]
    fn stats_and_splits_shapes_are_recognised() {
        let stats = json!({"categories": [{"name": "rushing", "stats": [{"name": "rushingYards", "value": 80}]}]});
        let splits = json!({"splits": {"categories": [{"name": "receiving", "stats": []}]}});

        assert_eq!(classify(&stats).iter().map(|s| s.tag()).collect::<Vec<_>>(), vec!["stats"]);
        assert_eq!(classify(&splits).iter().map(|s| s.tag()).collect::<Vec<_>>(), vec!["splits"]);
    }

    #[test]
    fn one_payload_can_match_every_shape() {
        let payload = json!({
            "categories": [
                {"name": "passing", "names": ["completions"], "statistics": [{"stats": ["20"]}]},
                {"name": "rushing", "stats": [{"name": "rushingYards", "value": 80}]}
            ],
            "splits": {"categories": [{"name": "receiving", "stats": [{"name": "receptions", "value": 5}]}]}
        });
        let tags: Vec<&str> = classify(&payload).iter().map(|s| s.tag()).collect();
        assert_eq!(tags, vec!["names", "stats", "splits"]);
    }

    #[test]
    fn positional_stats_arrays_are_not_stat_objects() {
        // `stats` must hold objects; bare strings belong to a names-shape row.
        let payload = json!({"categories": [{"name": "x", "stats": ["1", "2"]}]});
        assert!(classify(&payload).is_empty());
    }

    #[test]
    fn unknown_payloads_match_nothing() {
        assert!(classify(&json!({"athlete": {"id": "1"}})).is_empty());
        assert!(classify(&json!([])).is_empty());
        assert!(classify(&json!({"categories": "passing"})).is_empty());
    }
}
