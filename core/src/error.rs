use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::models::Role;

/// Feil fra API-laget. Ingenting her prøves på nytt automatisk.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Fikk ikke noe svar i det hele tatt (DNS, TLS, tilkobling, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// 401 fra serveren, uansett rute. Innloggingen er allerede slettet når
    /// denne returneres; `detail` er serverens tekst (f.eks. feil passord).
    #[error("login required: {detail}")]
    Unauthorized { detail: String },

    #[error("{detail}")]
    Http { status: u16, detail: String },

    #[error("could not decode response from {endpoint} at '{path}': {message}")]
    Decode {
        endpoint: String,
        path: String,
        message: String,
    },

    #[error("not logged in; run `swimlog login` first")]
    LoginRequired,

    #[error("this action requires the {required} role")]
    Forbidden { required: Role },
}

impl ApiError {
    /// Etikett for `api_failures_total`.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "network",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Http { .. } => "http",
            ApiError::Decode { .. } => "decode",
            ApiError::LoginRequired => "login_required",
            ApiError::Forbidden { .. } => "forbidden",
        }
    }

    /// Feilmelding fra en ikke-2xx respons: serverens `detail` hvis den finnes.
    pub fn from_status(status: u16, body: &str) -> ApiError {
        ApiError::Http { status, detail: detail_from_body(status, body) }
    }
}

/// `{"detail": "..."}` → teksten; strukturerte `detail` (valideringslister) som JSON;
/// ellers "HTTP {status}".
pub fn detail_from_body(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .filter(|d| !d.is_null());
    match detail {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::String(_)) | None => format!("HTTP {status}"),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
