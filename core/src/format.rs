//! Tekstformatering av tider og pace.

use crate::models::SessionSummary;

/// Sekunder → `m:ss` eller `h:mm:ss`. Ikke-endelige verdier gir "-".
pub fn format_seconds(total: f64) -> String {
    if !total.is_finite() {
        return "-".to_string();
    }
    let total = total.round().max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// "1:30 /100m"
pub fn format_pace_per_100(sec_per_100: f64) -> String {
    format!("{} /100m", format_seconds(sec_per_100))
}

/// Pace-celle i økttabellen: serverens ferdigformaterte tekst først,
/// ellers rå "90s / 100m", ellers "-".
pub fn summary_pace_cell(s: &SessionSummary) -> String {
    if let Some(f) = s.avg_pace_formatted.as_deref().filter(|f| !f.is_empty()) {
        return f.to_string();
    }
    match (s.avg_pace_sec_per, s.pace_basis_m) {
        (Some(p), Some(b)) if p != 0.0 && b != 0.0 => format!("{p}s / {b}m"),
        _ => "-".to_string(),
    }
}

pub fn format_optional(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{x:.decimals$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_formatting() {
        assert_eq!(format_seconds(90.0), "1:30");
        assert_eq!(format_seconds(59.6), "1:00");
        assert_eq!(format_seconds(3725.0), "1:02:05");
        assert_eq!(format_seconds(-5.0), "0:00");
        assert_eq!(format_seconds(f64::NAN), "-");
    }

    #[test]
    fn pace_cell_prefers_server_text() {
        let mut s = SessionSummary {
            avg_pace_sec_per: Some(90.0),
            pace_basis_m: Some(100.0),
            ..Default::default()
        };
        assert_eq!(summary_pace_cell(&s), "90s / 100m");
        s.avg_pace_formatted = Some("1:30 /100m".into());
        assert_eq!(summary_pace_cell(&s), "1:30 /100m");
        s.avg_pace_formatted = None;
        s.pace_basis_m = None;
        assert_eq!(summary_pace_cell(&s), "-");
    }
}
