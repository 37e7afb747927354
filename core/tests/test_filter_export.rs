use chrono::NaiveDate;
use serde_json::json;
use swimlog_core::export::{csv_row_count, session_csv_file_name, write_export, RangeExport};
use swimlog_core::filter::{sort_sessions, SessionFilter, SortDir, SortKey};
use swimlog_core::models::{Role, SessionSummary, SetRecord};
use swimlog_core::reps::{prescription, set_rep_times};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rows() -> Vec<SessionSummary> {
    serde_json::from_value(json!([
        {"id": "a", "date": "2024-01-05", "notes": "Threshold", "total_distance_m": 3000, "avg_pace_sec_per": 85, "avg_rpe": 7},
        {"id": "b", "date": "2024-01-20", "notes": "easy recovery", "total_distance_m": 1500, "avg_pace_sec_per": 100},
        {"id": "c", "notes": "no date, threshold", "total_distance_m": 2000, "avg_rpe": 4},
        {"id": "d", "date": "2024-02-02", "total_distance_m": null, "avg_pace_sec_per": 80, "avg_rpe": 9}
    ]))
    .unwrap()
}

fn ids(v: &[&SessionSummary]) -> Vec<String> {
    v.iter().map(|s| s.id.clone()).collect()
}

#[test]
fn query_is_case_insensitive_substring() {
    let all = rows();
    let f = SessionFilter { query: Some("THRESHOLD".into()), ..Default::default() };
    assert_eq!(ids(&f.apply(&all)), vec!["a", "c"]);
}

#[test]
fn date_range_is_inclusive_and_keeps_undated() {
    let all = rows();
    let f = SessionFilter { query: None, from: Some(d(2024, 1, 5)), to: Some(d(2024, 1, 20)) };
    assert_eq!(ids(&f.apply(&all)), vec!["a", "b", "c"]);
}

#[test]
fn sort_defaults_to_date_desc_with_missing_lowest() {
    let all = rows();
    let mut v = SessionFilter::default().apply(&all);
    sort_sessions(&mut v, SortKey::default(), SortDir::default());
    assert_eq!(ids(&v), vec!["d", "b", "a", "c"]);

    sort_sessions(&mut v, SortKey::TotalDistance, SortDir::Asc);
    assert_eq!(ids(&v), vec!["d", "b", "c", "a"]);

    sort_sessions(&mut v, SortKey::AvgPace, SortDir::Asc);
    assert_eq!(ids(&v), vec!["c", "d", "a", "b"]);

    sort_sessions(&mut v, SortKey::AvgRpe, SortDir::Desc);
    assert_eq!(ids(&v), vec!["d", "a", "c", "b"]);
}

#[test]
fn csv_file_names() {
    assert_eq!(session_csv_file_name("12", Some(d(2024, 3, 9))), "session-12-2024-03-09.csv");
    assert_eq!(session_csv_file_name("12", None), "session-12-session.csv");

    let range = RangeExport { start: Some(d(2024, 1, 1)), end: None, swimmer_id: Some("5".into()) };
    assert_eq!(range.file_name(), "range-2024-01-01-all.csv");
}

#[test]
fn swimmer_id_only_sent_for_coaches() {
    let range = RangeExport { start: Some(d(2024, 1, 1)), end: Some(d(2024, 1, 31)), swimmer_id: Some("5".into()) };

    let coach = range.query_pairs(Some(Role::Coach));
    assert!(coach.contains(&("swimmer_id", "5".to_string())));
    assert!(coach.contains(&("end", "2024-01-31".to_string())));

    let swimmer = range.query_pairs(Some(Role::Swimmer));
    assert_eq!(swimmer.len(), 2);
    assert!(swimmer.iter().all(|(k, _)| *k != "swimmer_id"));

    assert!(RangeExport::default().query_pairs(Some(Role::Coach)).is_empty());
}

#[test]
fn export_is_written_and_counted() {
    let bytes = b"date,set,rep,time\n2024-01-01,1,1,80\n2024-01-01,1,2,81\n2024-01-01,2,1\n";
    assert_eq!(csv_row_count(bytes).unwrap(), 3);
    assert_eq!(csv_row_count(b"date,set\n").unwrap(), 0);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exports");
    let path = write_export(bytes, &out, "session-1-2024-01-01.csv").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), bytes.to_vec());
}

#[test]
fn set_prescription_and_rep_labels() {
    let set: SetRecord = serde_json::from_value(json!({
        "distance_m": 50, "reps": 3, "interval_sec": 65, "stroke": "fly",
        "rep_times_sec": [31.5, "x", 32]
    }))
    .unwrap();
    assert_eq!(prescription(&set), "3 × 50m fly @ 1:05");

    let pts = set_rep_times(&set);
    let labels: Vec<&str> = pts.iter().map(|p| p.rep.as_str()).collect();
    assert_eq!(labels, vec!["#1", "#3"]);

    let bare = SetRecord::default();
    assert_eq!(prescription(&bare), "0 × ?m unknown");
}
