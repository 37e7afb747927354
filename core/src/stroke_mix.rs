use std::cmp::Reverse;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::Serialize;
use serde_json::Value;

use crate::lenient::coerce_number;
use crate::models::{Session, SessionAnalytics, SetRecord};

/// Distansefeltene serveren har brukt i `by_stroke`, i prioritert rekkefølge.
const DISTANCE_KEYS: [&str; 5] = ["total_distance_m", "distance_m_total", "total_m", "meters", "distance"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeDistance {
    pub stroke: String,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeShare {
    pub stroke: String,
    pub percent: f64,
}

/// Første distansefelt som finnes og ikke er `null` vinner. Ugyldig tall gir 0.
fn pick_distance(entry: &Value) -> f64 {
    DISTANCE_KEYS
        .iter()
        .filter_map(|k| entry.get(*k))
        .find(|v| !v.is_null())
        .and_then(coerce_number)
        .unwrap_or(0.0)
}

fn normalize_stroke(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => "unknown".to_string(),
    }
}

/// `by_stroke` som liste av (slagart, meter), uansett om serveren sendte
/// objekt-map eller array.
pub fn by_stroke_entries(by_stroke: &Value) -> Vec<StrokeDistance> {
    match by_stroke {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let name = item
                    .get("stroke")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .or_else(|| item.get("name").and_then(Value::as_str));
                StrokeDistance { stroke: normalize_stroke(name), distance_m: pick_distance(item) }
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(stroke, info)| StrokeDistance {
                stroke: normalize_stroke(Some(stroke)),
                distance_m: pick_distance(info),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Summerer meter per slagart over alle sett.
pub fn totals_from_sets<'a, I>(sets: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a SetRecord>,
{
    let mut totals = BTreeMap::new();
    for set in sets {
        *totals.entry(set.stroke_key()).or_insert(0.0) += set.meters();
    }
    totals
}

/// Summerer meter per slagart fra ferdigberegnet analytics.
///
/// `None` når INGEN post har `by_stroke` – da skal hele batchen falle tilbake
/// til rå sett. Poster uten analytics bidrar med ingenting.
pub fn totals_from_analytics(analytics: &[Option<SessionAnalytics>]) -> Option<BTreeMap<String, f64>> {
    let mut had_any = false;
    let mut totals = BTreeMap::new();
    for by in analytics.iter().flatten().filter_map(|a| a.by_stroke.as_ref()) {
        if by.is_null() {
            continue;
        }
        had_any = true;
        for e in by_stroke_entries(by) {
            *totals.entry(e.stroke).or_insert(0.0) += e.distance_m;
        }
    }
    had_any.then_some(totals)
}

pub fn has_any_by_stroke(analytics: &[Option<SessionAnalytics>]) -> bool {
    analytics
        .iter()
        .flatten()
        .any(|a| a.by_stroke.as_ref().is_some_and(|v| !v.is_null()))
}

/// Prosentfordeling, synkende. Tomt resultat når totalen er 0 (aldri NaN).
pub fn to_percentages(totals: &BTreeMap<String, f64>) -> Vec<StrokeShare> {
    let grand: f64 = totals.values().sum();
    if !(grand.is_finite() && grand > 0.0) {
        return Vec::new();
    }
    let mut out: Vec<StrokeShare> = totals
        .iter()
        .map(|(stroke, m)| StrokeShare { stroke: stroke.clone(), percent: m / grand * 100.0 })
        .collect();
    // stabil sortering: like prosenter beholder alfabetisk rekkefølge
    out.sort_by_key(|s| Reverse(OrderedFloat(s.percent)));
    out
}

/// Stroke mix over mange økter med batch-nivå fallback.
///
/// `sessions` brukes kun hvis ingen analytics-post har `by_stroke`.
pub fn stroke_mix(analytics: &[Option<SessionAnalytics>], sessions: &[Option<Session>]) -> Vec<StrokeShare> {
    let totals = match totals_from_analytics(analytics) {
        Some(t) => t,
        None => totals_from_sets(sessions.iter().flatten().flat_map(|s| s.sets.iter())),
    };
    to_percentages(&totals)
}

/// Distanse per slagart for én økt (donut på detaljsiden).
///
/// Analytics brukes når den gir minst én post; ellers regnes det fra settene,
/// og bare slagarter med meter > 0 tas med.
pub fn session_distances(analytics: Option<&SessionAnalytics>, detail: &Session) -> Vec<StrokeDistance> {
    let primary = analytics
        .and_then(|a| a.by_stroke.as_ref())
        .map(by_stroke_entries)
        .unwrap_or_default();
    if !primary.is_empty() {
        return primary;
    }
    totals_from_sets(&detail.sets)
        .into_iter()
        .filter(|(_, m)| *m > 0.0)
        .map(|(stroke, distance_m)| StrokeDistance { stroke, distance_m })
        .collect()
}
