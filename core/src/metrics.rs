use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Tellere for klienten. Én global instans via [`global`].
pub struct Metrics {
    registry: Registry,
    api_requests: IntCounterVec,
    api_failures: IntCounterVec,
    auth_cleared: IntCounter,
    batch_item_failures: IntCounter,
    stale_batches_discarded: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let api_requests = IntCounterVec::new(
            Opts::new("swimlog_api_requests_total", "HTTP-kall mot API-et per rute"),
            &["route"],
        )?;
        let api_failures = IntCounterVec::new(
            Opts::new("swimlog_api_failures_total", "Feilede API-kall per feiltype"),
            &["kind"],
        )?;
        let auth_cleared = IntCounter::new(
            "swimlog_auth_cleared_total",
            "Ganger innloggingen ble slettet etter 401",
        )?;
        let batch_item_failures = IntCounter::new(
            "swimlog_batch_item_failures_total",
            "Enkeltkall i en batch som feilet og ble tolket som tom data",
        )?;
        let stale_batches_discarded = IntCounter::new(
            "swimlog_stale_batches_discarded_total",
            "Batch-resultater forkastet fordi en nyere batch var startet",
        )?;

        registry.register(Box::new(api_requests.clone()))?;
        registry.register(Box::new(api_failures.clone()))?;
        registry.register(Box::new(auth_cleared.clone()))?;
        registry.register(Box::new(batch_item_failures.clone()))?;
        registry.register(Box::new(stale_batches_discarded.clone()))?;

        Ok(Self {
            registry,
            api_requests,
            api_failures,
            auth_cleared,
            batch_item_failures,
            stale_batches_discarded,
        })
    }

    pub fn api_request(&self, route: &str) {
        self.api_requests.with_label_values(&[route]).inc();
    }

    pub fn api_failure(&self, kind: &str) {
        self.api_failures.with_label_values(&[kind]).inc();
    }

    pub fn auth_cleared(&self) {
        self.auth_cleared.inc();
    }

    pub fn batch_item_failure(&self) {
        self.batch_item_failures.inc();
    }

    pub fn stale_batch_discarded(&self) {
        self.stale_batches_discarded.inc();
    }

    pub fn requests_for(&self, route: &str) -> u64 {
        self.api_requests.with_label_values(&[route]).get()
    }

    pub fn stale_batches(&self) -> u64 {
        self.stale_batches_discarded.get()
    }

    pub fn auth_cleared_count(&self) -> u64 {
        self.auth_cleared.get()
    }

    /// Prometheus tekstformat.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            log::warn!("[metrics] kunne ikke serialisere: {e}");
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

static METRICS: Lazy<Metrics> =
    Lazy::new(|| Metrics::new().expect("statiske metrikknavn er unike"));

pub fn global() -> &'static Metrics {
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_registered_counters() {
        let m = Metrics::new().unwrap();
        m.api_request("GET /me/sessions");
        m.api_request("GET /me/sessions");
        m.stale_batch_discarded();
        assert_eq!(m.requests_for("GET /me/sessions"), 2);
        assert_eq!(m.stale_batches(), 1);
        let text = m.render();
        assert!(text.contains("swimlog_api_requests_total"));
        assert!(text.contains("swimlog_stale_batches_discarded_total 1"));
    }
}
