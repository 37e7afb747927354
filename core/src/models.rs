use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
    Free,
    Fly,
    Back,
    Breast,
    Im,
}

impl Stroke {
    pub fn as_str(self) -> &'static str {
        match self {
            Stroke::Free => "free",
            Stroke::Fly => "fly",
            Stroke::Back => "back",
            Stroke::Breast => "breast",
            Stroke::Im => "im",
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Swimmer,
    Coach,
}

impl Role {
    /// Ukjente etiketter behandles som svømmer (samme fallback som innloggingen).
    pub fn from_label(s: &str) -> Role {
        if s.trim().eq_ignore_ascii_case("coach") {
            Role::Coach
        } else {
            Role::Swimmer
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Swimmer => "swimmer",
            Role::Coach => "coach",
        })
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// LESEMODELLER (tolerante, slik serveren faktisk sender dem)
// ──────────────────────────────────────────────────────────────────────────────

/// Ett sett slik det kommer fra `GET /sessions/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetRecord {
    #[serde(default, deserialize_with = "lenient::coerced")]
    pub distance_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub reps: Option<f64>,
    #[serde(default, deserialize_with = "lenient::coerced")]
    pub interval_sec: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub stroke: Option<String>,
    #[serde(
        default,
        alias = "rep_times",
        alias = "times_sec",
        alias = "times",
        deserialize_with = "lenient::number_list"
    )]
    pub rep_times_sec: Vec<Option<f64>>,
    #[serde(default, alias = "rpe_array", deserialize_with = "lenient::number_list")]
    pub rpe: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
}

impl SetRecord {
    /// Antall reps: `reps` hvis satt, ellers lengden på rep-tidene, ellers 0.
    pub fn rep_count(&self) -> f64 {
        self.reps.unwrap_or(self.rep_times_sec.len() as f64)
    }

    /// Meter i settet = distanse × reps. Ugyldige tall gir 0.
    pub fn meters(&self) -> f64 {
        let m = self.distance_m.unwrap_or(0.0) * self.rep_count();
        if m.is_finite() { m } else { 0.0 }
    }

    /// Slagart i små bokstaver, "unknown" når den mangler.
    pub fn stroke_key(&self) -> String {
        match self.stroke.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => "unknown".to_string(),
        }
    }

    pub fn numeric_rpe(&self) -> impl Iterator<Item = f64> + '_ {
        self.rpe.iter().flatten().copied()
    }

    pub fn numeric_rep_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.rep_times_sec.iter().flatten().copied()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    #[serde(default, deserialize_with = "lenient::coerced")]
    pub total_distance_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_rpe: Option<f64>,
}

/// Full økt med nestede sett.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub sets: Vec<SetRecord>,
    #[serde(default)]
    pub totals: Option<SessionTotals>,
}

/// Rad fra `GET /me/sessions` og `GET /coach/swimmers/{id}/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::coerced")]
    pub total_distance_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_pace_sec_per: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pace_basis_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_rpe: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub avg_pace_formatted: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(default, deserialize_with = "lenient::coerced")]
    pub total_distance_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_pace_sec_per: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub pace_basis_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_rpe: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub avg_pace_formatted: Option<String>,
}

/// Svar fra `GET /sessions/{id}/analytics`.
///
/// `by_stroke` holdes som rå JSON: serveren har levert både objekt-map og
/// array, med flere navn på distansefeltet. Se `stroke_mix`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionAnalytics {
    #[serde(default)]
    pub summary: Option<AnalyticsSummary>,
    #[serde(default)]
    pub by_stroke: Option<Value>,
    #[serde(default)]
    pub best_set: Option<Value>,
}

impl SessionAnalytics {
    pub fn best_set_label(&self) -> Option<&str> {
        let best = self.best_set.as_ref()?;
        best.get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| best.get("label").and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Swimmer {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
}

impl Swimmer {
    /// Brukernavn først, e-post som fallback.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("-")
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// SKRIVEMODELLER (strenge, validert før sending)
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSet {
    pub distance_m: u32,
    pub reps: u32,
    pub interval_sec: u32,
    pub stroke: Stroke,
    pub rpe: Vec<u8>,
    pub rep_times_sec: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub pace_per_m: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { limit: 50, pace_per_m: 100 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthUser {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub role: Role,
    pub invite_code: String,
}
