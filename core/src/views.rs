//! Visningsmodeller: setter sammen API-kall og aggregatorene til det
//! presentasjonslaget trenger.

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::{CoachReader, SessionReader};
use crate::batch::{fetch_batch_chunked, load_stroke_mix, Latest};
use crate::coach::{snapshot, SwimmerSnapshot};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::filter::{sort_sessions, SessionFilter, SortDir, SortKey};
use crate::format::format_pace_per_100;
use crate::models::{ListQuery, Session, SessionAnalytics, SessionSummary};
use crate::pace::{pace_per_100, pace_series, short_date_label, PacePoint};
use crate::reps::{rep_series, rpe_per_rep, set_rep_times, set_rows, RepPoint, RpePoint, SetRepPoint, SetRow};
use crate::rpe::{rpe_buckets, AverageRpe, RpeBucket};
use crate::stroke_mix::{session_distances, StrokeDistance, StrokeShare};

/// Økttabell med tilhørende pace-serie og RPE-histogram.
#[derive(Debug, Clone, Serialize)]
pub struct SessionsView {
    pub rows: Vec<SessionSummary>,
    /// Kronologisk, eldst først, uavhengig av tabellsorteringen.
    pub pace: Vec<PacePoint>,
    pub rpe: Vec<RpeBucket>,
}

impl SessionsView {
    pub fn build(rows: &[SessionSummary], filter: &SessionFilter, key: SortKey, dir: SortDir) -> Self {
        let mut visible = filter.apply(rows);
        sort_sessions(&mut visible, key, dir);

        let mut chronological = visible.clone();
        sort_sessions(&mut chronological, SortKey::Date, SortDir::Asc);

        Self {
            pace: pace_series(chronological),
            rpe: rpe_buckets(&visible),
            rows: visible.into_iter().cloned().collect(),
        }
    }

    /// Id-ene batchen skal hente for, i tabellrekkefølge, maks `max`.
    pub fn batch_ids(&self, max: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.id.clone())
            .filter(|id| !id.is_empty())
            .take(max)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub sessions: SessionsView,
    pub stroke_mix: Vec<StrokeShare>,
}

/// Holder siste stroke mix mellom oppdateringer.
#[derive(Debug, Default)]
pub struct Dashboard {
    stroke_mix: Latest<Vec<StrokeShare>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(None)` hvis en nyere lasting startet underveis; da er denne
    /// visningen utdatert og skal ikke vises.
    pub fn load<R>(
        &self,
        api: &R,
        cfg: &ClientConfig,
        filter: &SessionFilter,
        key: SortKey,
        dir: SortDir,
    ) -> Result<Option<DashboardView>, ApiError>
    where
        R: SessionReader + ?Sized,
    {
        let ticket = self.stroke_mix.begin();
        let query = ListQuery { limit: cfg.session_limit, pace_per_m: cfg.pace_per_m };
        let rows = api.list_my_sessions(query)?;
        log::info!("[dashboard] {} økter hentet", rows.len());

        let sessions = SessionsView::build(&rows, filter, key, dir);
        let ids = sessions.batch_ids(cfg.max_batch);
        let stroke_mix = load_stroke_mix(api, &ids, cfg.pace_per_m);
        if !self.stroke_mix.publish(ticket, stroke_mix.clone()) {
            log::debug!("[dashboard] nyere lasting startet, forkaster visningen");
            return Ok(None);
        }
        Ok(Some(DashboardView { sessions, stroke_mix }))
    }

    /// Starter en ny batch. `None` hvis en nyere batch startet før denne ble
    /// ferdig; den nyere beholdes.
    pub fn refresh_stroke_mix<R>(&self, api: &R, ids: &[String], pace_per_m: u32) -> Option<Vec<StrokeShare>>
    where
        R: SessionReader + ?Sized,
    {
        let ticket = self.stroke_mix.begin();
        let mix = load_stroke_mix(api, ids, pace_per_m);
        self.stroke_mix.publish(ticket, mix.clone()).then_some(mix)
    }

    pub fn stroke_mix(&self) -> Option<Vec<StrokeShare>> {
        self.stroke_mix.get()
    }
}

/// Alt detaljsiden for én økt viser.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetailView {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub date_label: String,
    pub notes: Option<String>,
    pub total_distance_m: f64,
    pub avg_pace: String,
    pub avg_rpe: Option<f64>,
    pub best_set: Option<String>,
    pub reps: Vec<RepPoint>,
    pub rpe_per_rep: Vec<RpePoint>,
    pub rpe: Vec<RpeBucket>,
    pub stroke_distances: Vec<StrokeDistance>,
    pub sets: Vec<SetRow>,
    /// Repetisjonstider per sett, samme rekkefølge som `sets`.
    pub set_reps: Vec<Vec<SetRepPoint>>,
}

impl SessionDetailView {
    /// `analytics` er valgfri: trenerens detaljvisning har bare selve økten.
    pub fn from_parts(session: &Session, analytics: Option<&SessionAnalytics>) -> Self {
        let summary = analytics.and_then(|a| a.summary.as_ref());

        let total_distance_m = summary
            .and_then(|s| s.total_distance_m)
            .or_else(|| session.totals.as_ref().and_then(|t| t.total_distance_m))
            .unwrap_or_else(|| session.sets.iter().map(|s| s.meters()).sum());

        let avg_pace = summary
            .and_then(|s| s.avg_pace_formatted.clone().filter(|f| !f.is_empty()))
            .or_else(|| {
                summary
                    .and_then(|s| pace_per_100(s.avg_pace_sec_per, s.pace_basis_m))
                    .map(format_pace_per_100)
            })
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: session.id.clone(),
            date: session.date,
            date_label: short_date_label(session.date),
            notes: session.notes.clone().filter(|n| !n.is_empty()),
            total_distance_m,
            avg_pace,
            avg_rpe: session.average_rpe(),
            best_set: analytics.and_then(|a| a.best_set_label()).map(str::to_string),
            reps: rep_series(session),
            rpe_per_rep: rpe_per_rep(session),
            rpe: rpe_buckets(&[session]),
            stroke_distances: session_distances(analytics, session),
            sets: set_rows(session),
            set_reps: session.sets.iter().map(set_rep_times).collect(),
        }
    }
}

/// Henter økt og analytics parallelt. Analytics som feiler gir bare en
/// tynnere visning; selve økten må finnes.
pub fn load_session_detail<R>(api: &R, id: &str, pace_per_m: u32) -> Result<SessionDetailView, ApiError>
where
    R: SessionReader + ?Sized,
{
    let (session, analytics) = std::thread::scope(|scope| {
        let analytics = scope.spawn(|| api.get_session_analytics(id, pace_per_m));
        let session = api.get_session(id);
        (session, analytics.join())
    });
    let session = session?;
    let analytics = match analytics {
        Ok(Ok(a)) => Some(a),
        Ok(Err(e)) => {
            log::warn!("[detail] analytics for {id} feilet: {e}");
            None
        }
        Err(_) => {
            log::error!("[detail] analytics-tråden for {id} panikket");
            None
        }
    };
    Ok(SessionDetailView::from_parts(&session, analytics.as_ref()))
}

/// Trenerens oversikt: én rad per svømmer. Svømmere der henting feiler får
/// tomme verdier i stedet for å stoppe hele oversikten.
pub fn coach_overview<C>(api: &C, cfg: &ClientConfig, today: NaiveDate) -> Result<Vec<SwimmerSnapshot>, ApiError>
where
    C: CoachReader + ?Sized,
{
    let swimmers = api.list_swimmers()?;
    let ids: Vec<String> = swimmers.iter().map(|s| s.id.clone()).collect();
    let query = ListQuery { limit: cfg.coach_session_limit, pace_per_m: cfg.pace_per_m };
    let sessions = fetch_batch_chunked(&ids, cfg.max_batch, |id| api.list_swimmer_sessions(id, query));

    Ok(swimmers
        .iter()
        .zip(sessions)
        .map(|(swimmer, rows)| snapshot(swimmer, rows.as_deref().unwrap_or_default(), today))
        .collect())
}

/// Én svømmers økter, sett fra treneren.
pub fn swimmer_sessions<C>(
    api: &C,
    cfg: &ClientConfig,
    swimmer_id: &str,
    filter: &SessionFilter,
    key: SortKey,
    dir: SortDir,
) -> Result<SessionsView, ApiError>
where
    C: CoachReader + ?Sized,
{
    let query = ListQuery { limit: cfg.coach_session_limit, pace_per_m: cfg.pace_per_m };
    let rows = api.list_swimmer_sessions(swimmer_id, query)?;
    Ok(SessionsView::build(&rows, filter, key, dir))
}
