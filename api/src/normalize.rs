use crate::client::FetchedPayload;
use crate::extract::{extract_payload, merge_payloads, parse_numeric};
use crate::table::{CanonicalFieldSpec, ComboSpec, DerivedSpec, NormalizationTable};
use crate::{CanonicalPlayerRecord, ExtractedStatMap, RawStatEntry, RawValue};
use log::{debug, warn};

/// Output of the pure post-fetch pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Merged raw map after combo splitting, kept for diagnostics.
    pub extracted: ExtractedStatMap,
    pub record: CanonicalPlayerRecord,
}

/// Extract → merge → split → resolve → derive → assemble.
///
/// Payloads are merged in endpoint-index order no matter how they are passed
/// in, so the same payload set always yields the same record.
pub fn normalize_payloads(
    athlete_id: &str,
    payloads: &[FetchedPayload],
    table: &NormalizationTable,
    target_season: u16,
) -> Normalized {
    let mut ordered: Vec<&FetchedPayload> = payloads.iter().collect();
    ordered.sort_by_key(|p| p.endpoint_index);

    let mut extracted = merge_payloads(
        ordered
            .iter()
            .map(|p| extract_payload(&p.body, p.endpoint_index, target_season)),
    );
    split_combos(&mut extracted, &table.combos);

    let mut resolved = resolve_aliases(&extracted, &table.fields);
    apply_derived(&mut resolved, &table.derived);

    let record = assemble_record(athlete_id, resolved);
    debug!(
        "normalized athlete {athlete_id}: {} raw keys -> {} canonical fields",
        extracted.len(),
        record.len()
    );
    Normalized { extracted, record }
}

// ---------------------------------------------------------------------------
// Combo splitting
// ---------------------------------------------------------------------------

/// Inject `made`/`attempted` raw keys for every configured combo whose value
/// looks like "<number>-<number>". Injected keys overwrite same-named raw keys.
pub fn split_combos(map: &mut ExtractedStatMap, combos: &[ComboSpec]) {
    for combo in combos {
        let Some(raw) = map.get(&combo.combo_key).and_then(RawValue::as_text) else {
            continue;
        };
        let Some((made, attempted)) = split_made_attempted(raw) else {
            debug!("{} = {raw:?} is not a made-attempted pair", combo.combo_key);
            continue;
        };

        let tag = format!("combo:{}", combo.combo_key);
        map.insert(RawStatEntry {
            name: combo.made_key.clone(),
            value: RawValue::Number(made),
            source_tag: tag.clone(),
        });
        map.insert(RawStatEntry {
            name: combo.attempted_key.clone(),
            value: RawValue::Number(attempted),
            source_tag: tag,
        });
    }
}

/// "6-8" → (6.0, 8.0). Halves that fail to parse read as 0.
fn split_made_attempted(raw: &str) -> Option<(f64, f64)> {
    let (made, attempted) = raw.trim().split_once('-')?;
    if made.trim().is_empty() || attempted.trim().is_empty() {
        return None;
    }
    let half = |s: &str| {
        parse_numeric(s).unwrap_or_else(|| {
            warn!("combo half {s:?} of {raw:?} is not numeric; using 0");
            0.0
        })
    };
    Some((half(made), half(attempted)))
}

// ---------------------------------------------------------------------------
// Alias resolution
// ---------------------------------------------------------------------------

/// Resolve every canonical field in declaration order.
pub fn resolve_aliases(map: &ExtractedStatMap, fields: &[CanonicalFieldSpec]) -> Vec<(String, f64)> {
    fields
        .iter()
        .map(|spec| (spec.canonical_name.clone(), resolve_field(map, spec)))
        .collect()
}

/// The first alias present in the map supplies the value, even when that
/// value is zero or unparseable (which reads as 0). No alias present → 0.
pub fn resolve_field(map: &ExtractedStatMap, spec: &CanonicalFieldSpec) -> f64 {
    let Some((alias, value)) = spec
        .aliases
        .iter()
        .find_map(|alias| map.get(alias).map(|v| (alias, v)))
    else {
        return 0.0;
    };

    value.as_number().unwrap_or_else(|| {
        warn!("{} <- {alias} = {value:?} is not numeric; using 0", spec.canonical_name);
        0.0
    })
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Recompute each configured percentage when its denominator is positive.
/// With a zero or missing denominator the resolved value is left alone.
pub fn apply_derived(resolved: &mut [(String, f64)], derived: &[DerivedSpec]) {
    let lookup = |fields: &[(String, f64)], name: &str| {
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    };

    for d in derived {
        let numerator = lookup(resolved, &d.numerator_field).unwrap_or(0.0);
        let Some(denominator) = lookup(resolved, &d.denominator_field).filter(|v| *v > 0.0) else {
            continue;
        };
        if let Some(slot) = resolved.iter_mut().find(|(n, _)| *n == d.percentage_field) {
            slot.1 = numerator / denominator * 100.0;
        }
    }
}

pub fn assemble_record(athlete_id: &str, resolved: Vec<(String, f64)>) -> CanonicalPlayerRecord {
    CanonicalPlayerRecord::new(athlete_id.to_owned(), resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(entries: &[(&str, RawValue)]) -> ExtractedStatMap {
        entries
            .iter()
            .map(|(name, value)| RawStatEntry {
                name: (*name).into(),
                value: value.clone(),
                source_tag: "test".into(),
            })
            .collect()
    }

    fn field(name: &str, aliases: &[&str]) -> CanonicalFieldSpec {
        CanonicalFieldSpec {
            canonical_name: name.into(),
            aliases: aliases.iter().map(|a| (*a).into()).collect(),
            is_derived: false,
        }
    }

    fn payload(endpoint_index: usize, body: serde_json::Value) -> FetchedPayload {
        FetchedPayload { endpoint_index, url: format!("http://test/{endpoint_index}"), body }
    }

    #[test]
    fn combo_splits_into_made_and_attempted() {
        let mut map = raw(&[("fieldGoalsMade-fieldGoalAttempts", RawValue::Text("6-8".into()))]);
        split_combos(&mut map, &NormalizationTable::football().combos);

        assert_eq!(map.get("fieldGoalsMade"), Some(&RawValue::Number(6.0)));
        assert_eq!(map.get("fieldGoalAttempts"), Some(&RawValue::Number(8.0)));
        assert!(map.provenance("fieldGoalsMade").unwrap().contains("combo:fieldGoalsMade-fieldGoalAttempts"));
    }

    #[test]
    fn combo_with_bad_half_defaults_that_half() {
        let mut map = raw(&[("extraPointsMade-extraPointAttempts", RawValue::Text("x-3".into()))]);
        split_combos(&mut map, &NormalizationTable::football().combos);

        assert_eq!(map.get("extraPointsMade"), Some(&RawValue::Number(0.0)));
        assert_eq!(map.get("extraPointAttempts"), Some(&RawValue::Number(3.0)));
    }

    #[test]
    fn non_combo_values_are_left_alone() {
        let mut map = raw(&[
            ("fieldGoalsMade-fieldGoalAttempts", RawValue::Number(6.0)),
            ("extraPointsMade-extraPointAttempts", RawValue::Text("--".into())),
        ]);
        split_combos(&mut map, &NormalizationTable::football().combos);

        assert!(!map.contains_key("fieldGoalsMade"));
        assert!(!map.contains_key("extraPointsMade"));
    }

    #[test]
    fn first_present_alias_wins_even_when_zero() {
        let spec = field("passYards", &["passingYards", "netPassingYards"]);
        let map = raw(&[
            ("netPassingYards", RawValue::Number(280.0)),
            ("passingYards", RawValue::Number(0.0)),
        ]);
        assert_eq!(resolve_field(&map, &spec), 0.0);
    }

    #[test]
    fn alias_precedence_ignores_insertion_order() {
        let spec = field("passYards", &["passingYards", "netPassingYards"]);
        let forward = raw(&[
            ("passingYards", RawValue::Number(300.0)),
            ("netPassingYards", RawValue::Number(280.0)),
        ]);
        let backward = raw(&[
            ("netPassingYards", RawValue::Number(280.0)),
            ("passingYards", RawValue::Number(300.0)),
        ]);
        assert_eq!(resolve_field(&forward, &spec), 300.0);
        assert_eq!(resolve_field(&backward, &spec), 300.0);
    }

    #[test]
    fn unparseable_present_alias_reads_as_zero() {
        let spec = field("passLong", &["longPassing", "LNG"]);
        let map = raw(&[("longPassing", RawValue::Text("62t".into())), ("LNG", RawValue::Number(62.0))]);
        assert_eq!(resolve_field(&map, &spec), 0.0);
    }

    #[test]
    fn missing_aliases_default_to_zero() {
        let spec = field("stuffs", &["stuffs"]);
        assert_eq!(resolve_field(&ExtractedStatMap::new(), &spec), 0.0);
    }

    #[test]
    fn derived_percentage_overrides_feed_value() {
        let table = NormalizationTable::football();
        let map = raw(&[
            ("receptions", RawValue::Number(5.0)),
            ("receivingTargets", RawValue::Number(10.0)),
            ("catchPct", RawValue::Number(73.0)),
        ]);
        let mut resolved = resolve_aliases(&map, &table.fields);
        apply_derived(&mut resolved, &table.derived);

        let catch = resolved.iter().find(|(n, _)| n == "catchPercentage").unwrap().1;
        assert_eq!(catch, 50.0);
    }

    #[test]
    fn zero_denominator_keeps_resolved_value() {
        let table = NormalizationTable::football();
        let map = raw(&[
            ("receptions", RawValue::Number(5.0)),
            ("receivingTargets", RawValue::Number(0.0)),
            ("catchPct", RawValue::Number(73.0)),
        ]);
        let mut resolved = resolve_aliases(&map, &table.fields);
        apply_derived(&mut resolved, &table.derived);

        let catch = resolved.iter().find(|(n, _)| n == "catchPercentage").unwrap().1;
        assert_eq!(catch, 73.0);
        assert!(resolved.iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn undeclared_percentages_are_never_derived() {
        let table = NormalizationTable::football();
        let map = raw(&[
            ("extraPointsMade", RawValue::Number(3.0)),
            ("extraPointAttempts", RawValue::Number(4.0)),
            ("extraPointPct", RawValue::Number(12.0)),
        ]);
        let mut resolved = resolve_aliases(&map, &table.fields);
        apply_derived(&mut resolved, &table.derived);

        let xp = resolved.iter().find(|(n, _)| n == "extraPointPercentage").unwrap().1;
        assert_eq!(xp, 12.0);
    }

    #[test]
    fn scenario_names_payload_without_attempts() {
        let body = json!({
            "categories": [{
                "names": ["completions", "passingYards"],
                "statistics": [{"season": {"year": 2025}, "stats": ["20", "300"]}]
            }]
        });
        let table = NormalizationTable::football();
        let out = normalize_payloads("3139477", &[payload(0, body)], &table, 2025);

        assert_eq!(out.record.get("passCompletions"), Some(20.0));
        assert_eq!(out.record.get("passYards"), Some(300.0));
        assert_eq!(out.record.get("completionPercentage"), Some(0.0));
    }

    #[test]
    fn every_declared_field_is_present() {
        let table = NormalizationTable::football();
        let out = normalize_payloads("1", &[], &table, 2025);

        assert_eq!(out.record.len(), table.fields.len());
        for spec in &table.fields {
            assert_eq!(out.record.get(&spec.canonical_name), Some(0.0));
        }
    }

    #[test]
    fn combo_feeds_derived_field_goal_percentage() {
        let body = json!({
            "categories": [{
                "name": "kicking",
                "names": ["fieldGoalsMade-fieldGoalAttempts", "fieldGoalPct"],
                "statistics": [{"stats": ["6-8", "70.0"]}]
            }]
        });
        let out = normalize_payloads("1", &[payload(0, body)], &NormalizationTable::football(), 2025);

        assert_eq!(out.record.get("fieldGoalsMade"), Some(6.0));
        assert_eq!(out.record.get("fieldGoalAttempts"), Some(8.0));
        assert_eq!(out.record.get("fieldGoalPercentage"), Some(75.0));
    }

    #[test]
    fn endpoint_order_decides_duplicates_not_slice_order() {
        let early = json!({"categories": [{"name": "r", "stats": [{"name": "rushingYards", "value": 50}]}]});
        let late = json!({"categories": [{"name": "r", "stats": [{"name": "rushingYards", "value": 90}]}]});
        let table = NormalizationTable::football();

        let a = normalize_payloads("1", &[payload(0, early.clone()), payload(2, late.clone())], &table, 2025);
        let b = normalize_payloads("1", &[payload(2, late), payload(0, early)], &table, 2025);

        assert_eq!(a.record.get("rushYards"), Some(90.0));
        assert_eq!(a, b);
    }

    #[test]
    fn rerunning_yields_identical_bytes() {
        let body = json!({
            "categories": [{"name": "receiving", "stats": [
                {"name": "receptions", "value": 7},
                {"name": "receivingTargets", "value": 9},
                {"name": "receivingYards", "displayValue": "1,104"}
            ]}]
        });
        let table = NormalizationTable::football();
        let payloads = [payload(0, body)];

        let first = serde_json::to_vec(&normalize_payloads("9", &payloads, &table, 2025).record).unwrap();
        let second = serde_json::to_vec(&normalize_payloads("9", &payloads, &table, 2025).record).unwrap();
        assert_eq!(first, second);
    }
}
