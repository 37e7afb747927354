use chrono::NaiveDate;
use serde::Serialize;

use crate::models::SessionSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacePoint {
    #[serde(rename = "dateLabel")]
    pub date_label: String,
    pub pace_per_100: f64,
}

/// Sekunder per 100 m fra (sek per `basis` meter). `None` når basis mangler eller er <= 0.
pub fn pace_per_100(avg_pace_sec_per: Option<f64>, pace_basis_m: Option<f64>) -> Option<f64> {
    match (avg_pace_sec_per, pace_basis_m) {
        (Some(p), Some(b)) if b > 0.0 => {
            let v = p * 100.0 / b;
            v.is_finite().then_some(v)
        }
        _ => None,
    }
}

/// Kort datoetikett for akser/tabeller, f.eks. "08 Jan".
pub fn short_date_label(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d %b").to_string(),
        None => "-".to_string(),
    }
}

/// Pace-serie i inputrekkefølge. Økter uten gyldig pace gir ingen punkt
/// (ingen nullfylling, ingen interpolasjon). Sortering er kallerens ansvar.
pub fn pace_series<'a, I>(sessions: I) -> Vec<PacePoint>
where
    I: IntoIterator<Item = &'a SessionSummary>,
{
    sessions
        .into_iter()
        .filter_map(|s| {
            let per100 = pace_per_100(s.avg_pace_sec_per, s.pace_basis_m)?;
            Some(PacePoint { date_label: short_date_label(s.date), pace_per_100: per100 })
        })
        .collect()
}
