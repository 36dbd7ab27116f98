use crate::espn::{NamesCategory, StatCategory};
use crate::shape::{PayloadShape, classify};
use crate::{ExtractedStatMap, RawStatEntry, RawValue};
use log::{debug, warn};
use serde_json::Value;

/// Parse a wire value as a plain number after dropping thousands separators.
///
/// Returns `None` for anything else, including dash combos ("6-8"),
/// percent strings, blanks and non-finite results.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Classify one payload and run every matching extraction rule over it.
/// `source` is the payload's endpoint index, carried into provenance tags.
pub fn extract_payload(payload: &Value, source: usize, target_season: u16) -> ExtractedStatMap {
    let shapes = classify(payload);
    if shapes.is_empty() {
        warn!("payload from endpoint {source} matches no known stat shape; skipping");
        return ExtractedStatMap::new();
    }

    let mut map = ExtractedStatMap::new();
    for shape in shapes {
        map.absorb(extract_shape(&shape, source, target_season));
    }
    map
}

pub fn extract_shape(shape: &PayloadShape<'_>, source: usize, target_season: u16) -> ExtractedStatMap {
    match shape {
        PayloadShape::CategoryNames(categories) => {
            extract_category_names(categories, source, target_season)
        }
        PayloadShape::CategoryStats(categories) | PayloadShape::Splits(categories) => {
            extract_stat_objects(shape.tag(), categories, source)
        }
    }
}

/// Combine per-payload maps in endpoint-list order; later payloads win per key.
pub fn merge_payloads<I>(maps: I) -> ExtractedStatMap
where
    I: IntoIterator<Item = ExtractedStatMap>,
{
    maps.into_iter().fold(ExtractedStatMap::new(), |mut merged, map| {
        merged.absorb(map);
        merged
    })
}

// ---------------------------------------------------------------------------
// Column-label categories
// ---------------------------------------------------------------------------

fn extract_category_names(categories: &[Value], source: usize, target_season: u16) -> ExtractedStatMap {
    let mut map = ExtractedStatMap::new();

    for (index, raw) in categories.iter().enumerate() {
        let Ok(category) = serde_json::from_value::<NamesCategory>(raw.clone()) else {
            debug!("endpoint {source}: names category #{index} is malformed; skipping");
            continue;
        };
        let label = category.label(index);
        if category.names.is_none() {
            debug!("endpoint {source}: category {label} lacks names; skipping");
            continue;
        }

        // Only the first row is considered; later rows are prior seasons or splits.
        let Some(row) = category.first_row() else {
            debug!("endpoint {source}: category {label} has no usable statistics row; skipping");
            continue;
        };
        if let Some(year) = row.season.as_ref().and_then(|s| s.year())
            && year != i64::from(target_season)
        {
            debug!("endpoint {source}: category {label} is season {year}, want {target_season}");
            continue;
        }

        let stats = row.stats.unwrap_or_default();
        let tag = source_tag("names", &label, source);
        for (i, cell) in stats.iter().enumerate() {
            let (Some(name), Some(value)) = (category.column(i), positional_value(cell)) else {
                continue;
            };
            map.insert(RawStatEntry { name: name.to_owned(), value, source_tag: tag.clone() });
        }
    }

    map
}

fn positional_value(value: &Value) -> Option<RawValue> {
    match value {
        Value::String(s) => Some(match parse_numeric(s) {
            Some(n) => RawValue::Number(n),
            None => RawValue::Text(s.clone()),
        }),
        Value::Number(n) => n.as_f64().map(RawValue::Number),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Stat-object categories (plain and splits)
// ---------------------------------------------------------------------------

fn extract_stat_objects(shape_tag: &str, categories: &[Value], source: usize) -> ExtractedStatMap {
    let mut map = ExtractedStatMap::new();

    for (index, raw) in categories.iter().enumerate() {
        let Ok(category) = serde_json::from_value::<StatCategory>(raw.clone()) else {
            debug!("endpoint {source}: {shape_tag} category #{index} is malformed; skipping");
            continue;
        };
        let label = category.label(index);
        let tag = source_tag(shape_tag, &label, source);

        for stat in category.stat_objects() {
            let Some(name) = stat.name().map(str::to_owned) else {
                continue;
            };
            let number = stat
                .value
                .as_ref()
                .and_then(json_number)
                .or_else(|| stat.display_value.as_ref().and_then(json_number))
                .unwrap_or_else(|| {
                    debug!("endpoint {source}: {name} in {label} has no numeric value; using 0");
                    0.0
                });
            map.insert(RawStatEntry {
                name,
                value: RawValue::Number(number),
                source_tag: tag.clone(),
            });
        }
    }

    map
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn source_tag(shape_tag: &str, category: &str, source: usize) -> String {
    format!("{shape_tag}:{category}@{source}")
}
