use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;

use crate::models::SessionSummary;

/// Filter for øktlisten: fritekst i notater og inkluderende datointervall.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub query: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl SessionFilter {
    pub fn matches(&self, s: &SessionSummary) -> bool {
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let notes = s.notes.as_deref().unwrap_or("").to_lowercase();
            if !notes.contains(&q.to_lowercase()) {
                return false;
            }
        }
        // økter uten dato faller aldri ut på datogrensene
        if let Some(date) = s.date {
            if self.from.is_some_and(|from| date < from) {
                return false;
            }
            if self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [SessionSummary]) -> Vec<&'a SessionSummary> {
        rows.iter().filter(|s| self.matches(s)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    TotalDistance,
    AvgPace,
    AvgRpe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

fn key_value(s: &SessionSummary, key: SortKey) -> Option<OrderedFloat<f64>> {
    let v = match key {
        SortKey::Date => s.date.map(|d| d.num_days_from_ce() as f64),
        SortKey::TotalDistance => s.total_distance_m,
        SortKey::AvgPace => s.avg_pace_sec_per,
        SortKey::AvgRpe => s.avg_rpe,
    };
    v.map(OrderedFloat)
}

/// Stabil sortering; manglende verdier regnes som lavest.
pub fn sort_sessions(rows: &mut [&SessionSummary], key: SortKey, dir: SortDir) {
    rows.sort_by(|a, b| {
        let ord: Ordering = key_value(a, key).cmp(&key_value(b, key));
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}
