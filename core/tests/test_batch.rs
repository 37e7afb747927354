use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};
use swimlog_core::api::{CoachReader, SessionReader};
use swimlog_core::batch::{fetch_batch, fetch_batch_chunked, load_stroke_mix, Latest};
use swimlog_core::config::ClientConfig;
use swimlog_core::error::ApiError;
use swimlog_core::filter::{SessionFilter, SortDir, SortKey};
use swimlog_core::models::{ListQuery, Session, SessionAnalytics, SessionSummary, Swimmer};
use swimlog_core::views::{coach_overview, load_session_detail, Dashboard};

/// Leser med faste svar per id. Ids som mangler i en tabell gir 500.
#[derive(Default)]
struct StubReader {
    rows: Vec<SessionSummary>,
    analytics: HashMap<String, Value>,
    details: HashMap<String, Value>,
    detail_calls: AtomicUsize,
}

fn server_error() -> ApiError {
    ApiError::Http { status: 500, detail: "boom".into() }
}

impl SessionReader for StubReader {
    fn list_my_sessions(&self, _query: ListQuery) -> Result<Vec<SessionSummary>, ApiError> {
        Ok(self.rows.clone())
    }

    fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let v = self.details.get(id).ok_or_else(server_error)?;
        Ok(serde_json::from_value(v.clone()).unwrap())
    }

    fn get_session_analytics(&self, id: &str, _pace_per_m: u32) -> Result<SessionAnalytics, ApiError> {
        let v = self.analytics.get(id).ok_or_else(server_error)?;
        Ok(serde_json::from_value(v.clone()).unwrap())
    }
}

fn ids(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn failed_items_become_none_and_order_is_kept() {
    let input = ids(&["1", "2", "3", "4"]);
    let out = fetch_batch(&input, |id| {
        if id == "3" {
            Err(ApiError::Network("timeout".into()))
        } else {
            Ok(id.parse::<u32>().unwrap() * 10)
        }
    });
    assert_eq!(out, vec![Some(10), Some(20), None, Some(40)]);
}

#[test]
fn stale_generation_is_discarded() {
    let latest: Latest<Vec<u32>> = Latest::new();
    let slow = latest.begin();
    let fast = latest.begin();

    assert!(latest.publish(fast, vec![2]));
    assert!(!latest.publish(slow, vec![1]));
    assert_eq!(latest.get(), Some(vec![2]));
}

/// Leser der `get_session_analytics` venter til testen slipper den fram.
struct GatedReader {
    rows: Vec<SessionSummary>,
    by_stroke: Value,
    started: Mutex<Option<mpsc::Sender<()>>>,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl GatedReader {
    fn open(id: &str, by_stroke: Value) -> Self {
        let rows = serde_json::from_value(json!([{"id": id, "date": "2024-01-01"}])).unwrap();
        Self { rows, by_stroke, started: Mutex::new(None), gate: Mutex::new(None) }
    }
}

impl SessionReader for GatedReader {
    fn list_my_sessions(&self, _query: ListQuery) -> Result<Vec<SessionSummary>, ApiError> {
        if let Some(tx) = self.started.lock().unwrap().take() {
            tx.send(()).unwrap();
        }
        Ok(self.rows.clone())
    }

    fn get_session(&self, _id: &str) -> Result<Session, ApiError> {
        Err(server_error())
    }

    fn get_session_analytics(&self, _id: &str, _pace_per_m: u32) -> Result<SessionAnalytics, ApiError> {
        if let Some(rx) = self.gate.lock().unwrap().as_ref() {
            rx.recv().unwrap();
        }
        Ok(serde_json::from_value(json!({"by_stroke": self.by_stroke.clone()})).unwrap())
    }
}

#[test]
fn slower_dashboard_load_yields_to_newer_one() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let slow = GatedReader::open("1", json!({"back": {"meters": 400}}));
    *slow.started.lock().unwrap() = Some(started_tx);
    *slow.gate.lock().unwrap() = Some(release_rx);
    let fast = GatedReader::open("2", json!({"free": {"meters": 200}}));

    let dash = Dashboard::new();
    let cfg = ClientConfig::default();
    let filter = SessionFilter::default();

    std::thread::scope(|scope| {
        let older = scope.spawn(|| dash.load(&slow, &cfg, &filter, SortKey::Date, SortDir::Desc));
        started_rx.recv().unwrap();

        let newer = dash
            .load(&fast, &cfg, &filter, SortKey::Date, SortDir::Desc)
            .unwrap()
            .expect("nyeste lasting skal vises");
        assert_eq!(newer.stroke_mix[0].stroke, "free");

        release_tx.send(()).unwrap();
        let stale = older.join().unwrap().unwrap();
        assert!(stale.is_none(), "utdatert lasting skal forkastes");
    });

    let kept = dash.stroke_mix().unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].stroke, "free");
}

#[test]
fn refresh_returns_published_mix() {
    let mut api = StubReader::default();
    api.analytics.insert("1".into(), json!({"by_stroke": {"fly": {"meters": 100}}}));
    let dash = Dashboard::new();

    let mix = dash.refresh_stroke_mix(&api, &ids(&["1"]), 100).unwrap();
    assert_eq!(mix[0].stroke, "fly");
    assert_eq!(dash.stroke_mix(), Some(mix));
}

#[test]
fn chunked_batch_caps_concurrency_and_keeps_order() {
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let input = ids(&["1", "2", "3", "4", "5", "6", "7"]);

    let out = fetch_batch_chunked(&input, 3, |id| {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        in_flight.fetch_sub(1, Ordering::SeqCst);
        if id == "5" {
            return Err(server_error());
        }
        Ok(id.parse::<u32>().unwrap())
    });

    assert_eq!(out, vec![Some(1), Some(2), Some(3), Some(4), None, Some(6), Some(7)]);
    assert!(peak.load(Ordering::SeqCst) <= 3, "maks {} samtidige", peak.load(Ordering::SeqCst));

    // chunk 0 behandles som 1
    let serial = fetch_batch_chunked(&input[..2], 0, |id| Ok(id.len()));
    assert_eq!(serial, vec![Some(1), Some(1)]);
}

#[test]
fn stroke_mix_uses_analytics_without_fetching_details() {
    let mut api = StubReader::default();
    api.analytics.insert("1".into(), json!({"by_stroke": [{"stroke": "free", "total_distance_m": 300}]}));
    api.analytics.insert("2".into(), json!({"summary": {"total_distance_m": 900}}));
    // "3" mangler: analytics-kallet feiler og posten blir tom

    let mix = load_stroke_mix(&api, &ids(&["1", "2", "3"]), 100);
    assert_eq!(mix.len(), 1);
    assert_eq!(mix[0].stroke, "free");
    assert!((mix[0].percent - 100.0).abs() < 1e-9);
    assert_eq!(api.detail_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn stroke_mix_falls_back_to_details_when_no_by_stroke() {
    let mut api = StubReader::default();
    api.analytics.insert("1".into(), json!({"summary": {}}));
    api.details.insert(
        "1".into(),
        json!({"id": 1, "sets": [{"distance_m": 100, "reps": 3, "stroke": "back"}]}),
    );
    api.details.insert(
        "2".into(),
        json!({"id": 2, "sets": [{"distance_m": 100, "reps": 1, "stroke": "free"}]}),
    );

    let mix = load_stroke_mix(&api, &ids(&["1", "2", "3"]), 100);
    assert_eq!(api.detail_calls.load(Ordering::SeqCst), 3);
    assert_eq!(mix[0].stroke, "back");
    assert!((mix[0].percent - 75.0).abs() < 1e-9);
    assert_eq!(mix[1].stroke, "free");
}

#[test]
fn dashboard_filters_before_batching() {
    let rows: Vec<SessionSummary> = serde_json::from_value(json!([
        {"id": 1, "date": "2024-01-08", "notes": "Sprint", "avg_pace_sec_per": 78, "pace_basis_m": 50, "avg_rpe": 7.5},
        {"id": 2, "date": "2024-01-01", "notes": "sprint drills", "avg_pace_sec_per": 80, "pace_basis_m": 100, "avg_rpe": 5},
        {"id": 3, "date": "2024-01-03", "notes": "easy", "avg_rpe": 2}
    ]))
    .unwrap();
    let mut api = StubReader { rows, ..Default::default() };
    api.analytics.insert("1".into(), json!({"by_stroke": {"fly": {"meters": 100}}}));
    api.analytics.insert("3".into(), json!({"by_stroke": {"free": {"meters": 900}}}));

    let filter = SessionFilter { query: Some("SPRINT".into()), ..Default::default() };
    let dash = Dashboard::new();
    let view = dash
        .load(&api, &ClientConfig::default(), &filter, SortKey::Date, SortDir::Desc)
        .unwrap()
        .expect("ingen konkurrerende lasting");

    let shown: Vec<&str> = view.sessions.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(shown, vec!["1", "2"]);
    // pace-serien er kronologisk uansett tabellsortering
    let pace: Vec<f64> = view.sessions.pace.iter().map(|p| p.pace_per_100).collect();
    assert_eq!(pace, vec![80.0, 156.0]);
    // økt 3 er filtrert bort og skal ikke med i stroke mix
    assert_eq!(view.stroke_mix.len(), 1);
    assert_eq!(view.stroke_mix[0].stroke, "fly");
    assert_eq!(dash.stroke_mix().map(|m| m.len()), Some(1));
}

#[test]
fn session_detail_survives_missing_analytics() {
    let mut api = StubReader::default();
    api.details.insert(
        "7".into(),
        json!({
            "id": 7,
            "date": "2024-02-10",
            "totals": {"total_distance_m": 600},
            "sets": [
                {"distance_m": 100, "reps": 2, "interval_sec": 120, "stroke": "free", "rpe": [5, 6], "rep_times_sec": [80, 84]},
                {"distance_m": 50, "reps": 4, "stroke": "breast", "rpe": [7, 7, 8, 8], "rep_times_sec": [45, null, 46, 47]}
            ]
        }),
    );

    let view = load_session_detail(&api, "7", 100).unwrap();
    assert_eq!(view.total_distance_m, 600.0);
    assert_eq!(view.avg_pace, "-");
    assert_eq!(view.best_set, None);
    assert_eq!(view.reps.len(), 5);
    assert_eq!(view.reps[4].x, "S2 R4");
    assert_eq!(view.sets[0].prescription, "2 × 100m free @ 2:00");
    assert_eq!(view.sets[0].pace_per_100_sec, Some(82.0));
    assert_eq!(view.stroke_distances.len(), 2);
    // (5+6+7+7+8+8)/6 = 6.83 → "4-6"
    assert_eq!(view.rpe[1].count, 1);

    assert_eq!(view.set_reps.len(), view.sets.len());
    let labels: Vec<&str> = view.set_reps[1].iter().map(|p| p.rep.as_str()).collect();
    assert_eq!(labels, vec!["#1", "#3", "#4"]);
    assert_eq!(view.set_reps[0][1].sec, 84.0);
}

#[test]
fn session_detail_requires_the_session() {
    let api = StubReader::default();
    assert!(load_session_detail(&api, "404", 100).is_err());
}

struct StubCoach {
    swimmers: Vec<Swimmer>,
    sessions: HashMap<String, Vec<SessionSummary>>,
}

impl CoachReader for StubCoach {
    fn list_swimmers(&self) -> Result<Vec<Swimmer>, ApiError> {
        Ok(self.swimmers.clone())
    }

    fn list_swimmer_sessions(&self, swimmer_id: &str, _query: ListQuery) -> Result<Vec<SessionSummary>, ApiError> {
        self.sessions.get(swimmer_id).cloned().ok_or_else(server_error)
    }

    fn get_swimmer_session(&self, _swimmer_id: &str, _session_id: &str) -> Result<Session, ApiError> {
        Err(server_error())
    }
}

#[test]
fn coach_overview_tolerates_failing_swimmer() {
    let swimmers: Vec<Swimmer> = serde_json::from_value(json!([
        {"id": 1, "username": "ada"},
        {"id": 2, "email": "bo@example.com"}
    ]))
    .unwrap();
    let rows: Vec<SessionSummary> = serde_json::from_value(json!([
        {"id": 10, "date": "2024-03-01", "total_distance_m": 2000},
        {"id": 11, "date": "2024-03-14", "total_distance_m": "1500"},
        {"id": 12, "date": "2024-02-01", "total_distance_m": 5000}
    ]))
    .unwrap();
    let api = StubCoach { swimmers, sessions: HashMap::from([("1".to_string(), rows)]) };

    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let out = coach_overview(&api, &ClientConfig::default(), today).unwrap();
    let one_at_a_time = ClientConfig { max_batch: 1, ..Default::default() };
    assert_eq!(coach_overview(&api, &one_at_a_time, today).unwrap(), out);

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].name, "ada");
    assert_eq!(out[0].last_date, NaiveDate::from_ymd_opt(2024, 3, 14));
    assert_eq!(out[0].volume_14d, 3500.0);
    assert_eq!(out[1].name, "bo@example.com");
    assert_eq!(out[1].last_date, None);
    assert_eq!(out[1].volume_14d, 0.0);
}
