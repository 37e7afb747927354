//! Parallelle, uavhengige kall som samles i én batch.
//!
//! Hvert element som feiler blir `None` ("ingen data") i stedet for å velte
//! hele batchen. [`Latest`] merker hver batch med et generasjonsnummer slik at
//! et tregt, eldre resultat ikke overskriver et nyere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::api::SessionReader;
use crate::error::ApiError;
use crate::metrics;
use crate::stroke_mix::{has_any_by_stroke, stroke_mix, StrokeShare};

/// Kjører `fetch` for hver id samtidig (én tråd per id) og venter på alle.
/// Rekkefølgen i resultatet følger `ids`.
pub fn fetch_batch<T, F>(ids: &[String], fetch: F) -> Vec<Option<T>>
where
    T: Send,
    F: Fn(&str) -> Result<T, ApiError> + Sync,
{
    let fetch = &fetch;
    std::thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| scope.spawn(move || fetch(id.as_str())))
            .collect();

        handles
            .into_iter()
            .zip(ids)
            .map(|(handle, id)| match handle.join() {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    log::warn!("[batch] id={id}: {e} – tolkes som tom");
                    metrics::global().batch_item_failure();
                    None
                }
                Err(_) => {
                    log::error!("[batch] id={id}: arbeidstråden panikket");
                    metrics::global().batch_item_failure();
                    None
                }
            })
            .collect()
    })
}

/// Som [`fetch_batch`], men med høyst `chunk` kall i gang samtidig.
pub fn fetch_batch_chunked<T, F>(ids: &[String], chunk: usize, fetch: F) -> Vec<Option<T>>
where
    T: Send,
    F: Fn(&str) -> Result<T, ApiError> + Sync,
{
    ids.chunks(chunk.max(1))
        .flat_map(|part| fetch_batch(part, &fetch))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}

/// Siste publiserte verdi; resultater fra utdaterte batcher forkastes.
#[derive(Debug)]
pub struct Latest<T> {
    generation: Generation,
    value: Mutex<Option<T>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self { generation: Generation::default(), value: Mutex::new(None) }
    }
}

impl<T: Clone> Latest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        self.generation.begin()
    }

    /// `false` hvis en nyere batch er startet etter `ticket`.
    pub fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.generation.is_current(ticket) {
            log::debug!("[batch] forkaster utdatert resultat (ticket={})", ticket.0);
            metrics::global().stale_batch_discarded();
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn get(&self) -> Option<T> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Stroke mix for et sett økter: analytics for alle først, rå sett kun hvis
/// ingen av dem hadde `by_stroke`.
pub fn load_stroke_mix<R>(api: &R, ids: &[String], pace_per_m: u32) -> Vec<StrokeShare>
where
    R: SessionReader + ?Sized,
{
    if ids.is_empty() {
        return Vec::new();
    }
    let analytics = fetch_batch(ids, |id| api.get_session_analytics(id, pace_per_m));
    if has_any_by_stroke(&analytics) {
        return stroke_mix(&analytics, &[]);
    }
    log::debug!("[batch] ingen analytics med by_stroke – henter {} øktdetaljer", ids.len());
    let details = fetch_batch(ids, |id| api.get_session(id));
    stroke_mix(&analytics, &details)
}
