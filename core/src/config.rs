use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::load_json;

/// Overstyrer `base_url` fra miljøet.
pub const BASE_URL_ENV: &str = "SWIMLOG_API_BASE_URL";

const APP_DIR: &str = "swimlog";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Rot for alle API-kall, uten avsluttende `/`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Pace-basis som sendes som `pace_per_m`.
    pub pace_per_m: u32,
    /// `limit` for egne økter (dashboard).
    pub session_limit: u32,
    /// `limit` per svømmer i trenervisningen.
    pub coach_session_limit: u32,
    /// Maks antall økter som hentes analytics for i én batch.
    pub max_batch: usize,
    pub credentials_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_secs: 10,
            pace_per_m: 100,
            session_limit: 200,
            coach_session_limit: 100,
            max_batch: 50,
            credentials_path: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn with_base_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self
    }

    /// Eksplisitt sti fra konfig, ellers `<config_dir>/swimlog/credentials.json`.
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .map(|d| d.join(APP_DIR).join("credentials.json"))
                .unwrap_or_else(|| PathBuf::from(".swimlog-credentials.json"))
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
}

/// Leser konfig fra disk (manglende fil → default) og legger på miljøvariabelen.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, StorageError> {
    let resolved = path.map(Path::to_path_buf).or_else(default_config_path);
    let cfg = match resolved.as_deref() {
        Some(p) => match load_json::<ClientConfig>(p)? {
            Some(cfg) => {
                log::info!("konfig lastet fra {}", p.display());
                cfg
            }
            None => {
                log::debug!("fant ikke konfig på {}, bruker default", p.display());
                ClientConfig::default()
            }
        },
        None => ClientConfig::default(),
    };
    Ok(cfg.with_base_url_override(std::env::var(BASE_URL_ENV).ok()))
}
