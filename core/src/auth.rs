use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, StorageError};
use crate::metrics;
use crate::models::{LoginResponse, Role};
use crate::storage::{clear_credentials, load_credentials, save_credentials};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub role: Role,
}

/// Innloggingstilstand for hele prosessen.
///
/// Sendes eksplisitt inn til API-klienten. `login` setter den, `logout` og
/// enhver 401 tømmer den. Med `store` speiles tilstanden til en fil.
#[derive(Debug, Default)]
pub struct AuthContext {
    state: Mutex<Option<Credentials>>,
    store: Option<PathBuf>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_credentials(creds: Credentials) -> Self {
        Self { state: Mutex::new(Some(creds)), store: None }
    }

    /// Laster eventuell lagret innlogging og skriver senere endringer tilbake.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let creds = load_credentials(&path)?;
        Ok(Self { state: Mutex::new(creds), store: Some(path) })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn login(&self, token: impl Into<String>, role: Role) -> Result<(), StorageError> {
        let creds = Credentials { token: token.into(), role };
        if let Some(path) = &self.store {
            save_credentials(&creds, path)?;
        }
        *self.lock() = Some(creds);
        Ok(())
    }

    /// Tar token og rolle fra innloggingssvaret.
    pub fn login_from_response(&self, resp: &LoginResponse) -> Result<Role, StorageError> {
        let role = resolve_role(resp);
        self.login(resp.access_token.clone(), role)?;
        Ok(role)
    }

    pub fn logout(&self) -> Result<(), StorageError> {
        *self.lock() = None;
        match &self.store {
            Some(path) => clear_credentials(path),
            None => Ok(()),
        }
    }

    /// Kalles av API-laget ved 401, uansett hvilket kall som utløste den.
    pub fn clear_on_unauthorized(&self) {
        let had = self.lock().take().is_some();
        if had {
            log::warn!("[API] 401 – innlogging slettet, ny innlogging kreves");
            metrics::global().auth_cleared();
        }
        if let Some(path) = &self.store {
            if let Err(e) = clear_credentials(path) {
                log::error!("[API] kunne ikke slette lagret innlogging: {e}");
            }
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.lock().clone()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.lock().as_ref().map(|c| c.token.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.lock().as_ref().map(|c| c.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }

    /// Rutevakt: krever innlogging, og eventuelt en bestemt rolle.
    pub fn require(&self, role: Option<Role>) -> Result<(), ApiError> {
        match (self.role(), role) {
            (None, _) => Err(ApiError::LoginRequired),
            (Some(have), Some(want)) if have != want => Err(ApiError::Forbidden { required: want }),
            _ => Ok(()),
        }
    }
}

/// Payload-delen av en JWT. Ingen signatursjekk – kun for å lese rollen.
pub fn decode_jwt_payload(token: &str) -> Option<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Rolle fra svaret, så fra `user.role`, så fra JWT-payload, ellers svømmer.
pub fn resolve_role(resp: &LoginResponse) -> Role {
    resp.role
        .clone()
        .filter(|r| !r.is_empty())
        .or_else(|| resp.user.as_ref().and_then(|u| u.role.clone()))
        .or_else(|| {
            decode_jwt_payload(&resp.access_token)
                .and_then(|p| p.get("role").and_then(Value::as_str).map(str::to_string))
        })
        .map(|r| Role::from_label(&r))
        .unwrap_or(Role::Swimmer)
}
