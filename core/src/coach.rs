use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{SessionSummary, Swimmer};

/// Vindu for volumkolonnen i trenerens oversikt.
pub const VOLUME_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwimmerSnapshot {
    pub swimmer_id: String,
    pub name: String,
    pub last_date: Option<NaiveDate>,
    pub volume_14d: f64,
}

/// Siste øktdato og meter de siste 14 dagene (fra og med `today - 14`).
pub fn snapshot(swimmer: &Swimmer, sessions: &[SessionSummary], today: NaiveDate) -> SwimmerSnapshot {
    let since = today - Duration::days(VOLUME_WINDOW_DAYS);
    let volume_14d = sessions
        .iter()
        .filter(|s| s.date.is_some_and(|d| d >= since))
        .map(|s| s.total_distance_m.unwrap_or(0.0))
        .sum();
    let last_date = sessions.iter().filter_map(|s| s.date).max();
    SwimmerSnapshot {
        swimmer_id: swimmer.id.clone(),
        name: swimmer.display_name().to_string(),
        last_date,
        volume_14d,
    }
}
