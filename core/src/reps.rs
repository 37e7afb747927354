use serde::Serialize;

use crate::format::format_seconds;
use crate::models::{Session, SetRecord};
use crate::rpe::mean;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepPoint {
    pub x: String,
    pub sec: f64,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpePoint {
    pub x: String,
    pub rpe: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetRepPoint {
    pub rep: String,
    pub sec: f64,
}

/// Én rad i settabellen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetRow {
    pub number: usize,
    pub prescription: String,
    pub name: Option<String>,
    pub pace_per_100_sec: Option<f64>,
    pub avg_rpe: Option<f64>,
}

fn rep_label(set_idx: usize, rep_idx: usize) -> String {
    format!("S{} R{}", set_idx + 1, rep_idx + 1)
}

/// Rep-tider over hele økten. Ikke-numeriske tider hoppes over, men
/// beholder plassen sin i nummereringen.
pub fn rep_series(session: &Session) -> Vec<RepPoint> {
    let mut pts = Vec::new();
    for (si, set) in session.sets.iter().enumerate() {
        for (ri, t) in set.rep_times_sec.iter().enumerate() {
            if let Some(sec) = *t {
                pts.push(RepPoint {
                    x: rep_label(si, ri),
                    sec,
                    rpe: set.rpe.get(ri).copied().flatten(),
                });
            }
        }
    }
    pts
}

pub fn rpe_per_rep(session: &Session) -> Vec<RpePoint> {
    session
        .sets
        .iter()
        .enumerate()
        .flat_map(|(si, set)| {
            set.rpe
                .iter()
                .enumerate()
                .filter_map(move |(ri, v)| v.map(|rpe| RpePoint { x: rep_label(si, ri), rpe }))
        })
        .collect()
}

/// Rep-tider for ett sett, merket "#1", "#2", ...
pub fn set_rep_times(set: &SetRecord) -> Vec<SetRepPoint> {
    set.rep_times_sec
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.map(|sec| SetRepPoint { rep: format!("#{}", i + 1), sec }))
        .collect()
}

/// "10 × 100m free @ 2:00"
pub fn prescription(set: &SetRecord) -> String {
    let reps = set.rep_count();
    let distance = set.distance_m.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
    let stroke = set.stroke.as_deref().unwrap_or("unknown");
    let mut out = format!("{reps} × {distance}m {stroke}");
    if let Some(iv) = set.interval_sec.filter(|iv| *iv > 0.0) {
        out.push_str(&format!(" @ {}", format_seconds(iv)));
    }
    out
}

/// Pace per 100 m = snitt rep-tid / distanse × 100.
pub fn set_pace_per_100(set: &SetRecord) -> Option<f64> {
    let avg = mean(set.numeric_rep_times()).filter(|a| *a > 0.0)?;
    let distance = set.distance_m.filter(|d| *d > 0.0)?;
    Some(avg / distance * 100.0)
}

pub fn set_rows(session: &Session) -> Vec<SetRow> {
    session
        .sets
        .iter()
        .enumerate()
        .map(|(i, set)| SetRow {
            number: i + 1,
            prescription: prescription(set),
            name: set.name.clone().filter(|n| !n.is_empty()),
            pace_per_100_sec: set_pace_per_100(set),
            avg_rpe: mean(set.numeric_rpe()),
        })
        .collect()
}
