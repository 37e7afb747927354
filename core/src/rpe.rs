use serde::Serialize;

use crate::models::{Session, SessionSummary};

/// De tre faste intensitetsbøttene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RpeBand {
    #[serde(rename = "1-3")]
    Easy,
    #[serde(rename = "4-6")]
    Moderate,
    #[serde(rename = "7-10")]
    Hard,
}

impl RpeBand {
    pub const ALL: [RpeBand; 3] = [RpeBand::Easy, RpeBand::Moderate, RpeBand::Hard];

    pub fn label(self) -> &'static str {
        match self {
            RpeBand::Easy => "1-3",
            RpeBand::Moderate => "4-6",
            RpeBand::Hard => "7-10",
        }
    }

    /// Klassifiserer på `floor(avg)`: 6.99 → "4-6", 7.0 → "7-10".
    pub fn classify(avg_rpe: f64) -> Option<RpeBand> {
        if !avg_rpe.is_finite() {
            return None;
        }
        let v = avg_rpe.floor();
        Some(if v <= 3.0 {
            RpeBand::Easy
        } else if v <= 6.0 {
            RpeBand::Moderate
        } else {
            RpeBand::Hard
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RpeBucket {
    pub bucket: RpeBand,
    pub count: usize,
}

/// Alt som kan gi en snitt-RPE for én økt.
pub trait AverageRpe {
    fn average_rpe(&self) -> Option<f64>;
}

impl AverageRpe for SessionSummary {
    fn average_rpe(&self) -> Option<f64> {
        self.avg_rpe
    }
}

impl AverageRpe for Session {
    /// `totals.avg_rpe` hvis serveren har regnet den, ellers snittet av alle
    /// numeriske RPE-verdier i alle sett.
    fn average_rpe(&self) -> Option<f64> {
        if let Some(avg) = self.totals.as_ref().and_then(|t| t.avg_rpe) {
            return Some(avg);
        }
        mean(self.sets.iter().flat_map(|s| s.numeric_rpe()))
    }
}

impl<T: AverageRpe> AverageRpe for &T {
    fn average_rpe(&self) -> Option<f64> {
        (*self).average_rpe()
    }
}

pub(crate) fn mean<I: IntoIterator<Item = f64>>(xs: I) -> Option<f64> {
    let (sum, n) = xs.into_iter().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Histogram over snitt-RPE. Alle tre bøttene er alltid med (stabile akser);
/// økter uten RPE telles ikke.
pub fn rpe_buckets<T: AverageRpe>(sessions: &[T]) -> Vec<RpeBucket> {
    let mut counts = [0usize; 3];
    for band in sessions.iter().filter_map(|s| s.average_rpe()).filter_map(RpeBand::classify) {
        counts[band as usize] += 1;
    }
    RpeBand::ALL
        .into_iter()
        .zip(counts)
        .map(|(bucket, count)| RpeBucket { bucket, count })
        .collect()
}
