// core/src/api.rs
use std::io::Read;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use serde_path_to_error as spte;
use ureq::{Agent, Request, Response};

use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::export::RangeExport;
use crate::metrics;
use crate::models::{
    ListQuery, LoginRequest, LoginResponse, NewSession, NewSet, Session, SessionAnalytics,
    SessionSummary, SetRecord, SignupRequest, Swimmer,
};

/// Lesing av egne økter og analytics.
pub trait SessionReader: Send + Sync {
    fn list_my_sessions(&self, query: ListQuery) -> Result<Vec<SessionSummary>, ApiError>;
    fn get_session(&self, id: &str) -> Result<Session, ApiError>;
    fn get_session_analytics(&self, id: &str, pace_per_m: u32) -> Result<SessionAnalytics, ApiError>;
}

/// Trenerens innsyn i svømmerne sine.
pub trait CoachReader: Send + Sync {
    fn list_swimmers(&self) -> Result<Vec<Swimmer>, ApiError>;
    fn list_swimmer_sessions(&self, swimmer_id: &str, query: ListQuery) -> Result<Vec<SessionSummary>, ApiError>;
    fn get_swimmer_session(&self, swimmer_id: &str, session_id: &str) -> Result<Session, ApiError>;
}

/// Skriving: opprett økt, legg til sett.
pub trait SessionWriter {
    fn create_session(&self, new: &NewSession) -> Result<Session, ApiError>;
    fn add_set(&self, session_id: &str, set: &NewSet) -> Result<SetRecord, ApiError>;
}

pub trait ExportSource {
    fn export_session_csv(&self, session_id: &str) -> Result<Vec<u8>, ApiError>;
    fn export_range_csv(&self, range: &RangeExport) -> Result<Vec<u8>, ApiError>;
}

/// Oversetter en ikke-2xx status til feil. 401 tømmer innloggingen, uansett kall.
pub fn handle_status(status: u16, body: &str, auth: &AuthContext) -> ApiError {
    if status == 401 {
        auth.clear_on_unauthorized();
        return ApiError::Unauthorized { detail: crate::error::detail_from_body(status, body) };
    }
    ApiError::from_status(status, body)
}

/// Dekoder JSON med feltsti i feilmeldingen.
pub fn decode_body<T: DeserializeOwned>(route: &str, body: &str) -> Result<T, ApiError> {
    let mut de = serde_json::Deserializer::from_str(body);
    spte::deserialize(&mut de).map_err(|e| ApiError::Decode {
        endpoint: route.to_string(),
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

/// REST-klient – blocking (ureq), trådsikker, deler `AuthContext` med resten av prosessen.
pub struct HttpSwimApi {
    agent: Agent,
    base_url: String,
    auth: Arc<AuthContext>,
}

impl HttpSwimApi {
    pub fn new(cfg: &ClientConfig, auth: Arc<AuthContext>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(cfg.timeout()).build();
        Self {
            agent,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: &str, path: &str) -> Request {
        let req = self.agent.request(method, &self.url(path));
        match self.auth.bearer_token() {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    fn send(&self, route: &'static str, result: Result<Response, ureq::Error>) -> Result<Response, ApiError> {
        metrics::global().api_request(route);
        let out = match result {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                log::warn!("[API] {route} → {status}");
                Err(handle_status(status, &body, &self.auth))
            }
            Err(ureq::Error::Transport(t)) => {
                // logg detaljer så "network error" ikke blir ugjennomsiktig
                log::error!("[API] nettverksfeil: route={route} base_url={} – {t}", self.base_url);
                Err(ApiError::Network(t.to_string()))
            }
        };
        if let Err(e) = &out {
            metrics::global().api_failure(e.kind());
        }
        out
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        route: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut req = self.request("GET", path);
        for (k, v) in query {
            req = req.query(k, v);
        }
        let resp = self.send(route, req.call())?;
        read_json(route, resp)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        route: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.request("POST", path);
        let resp = self.send(route, req.send_json(body))?;
        read_json(route, resp)
    }

    fn get_bytes(&self, route: &'static str, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        let mut req = self.request("GET", path);
        for (k, v) in query {
            req = req.query(k, v);
        }
        let resp = self.send(route, req.call())?;
        let mut buf = Vec::new();
        resp.into_reader()
            .read_to_end(&mut buf)
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(buf)
    }

    /// `identifier` kan være brukernavn eller e-post.
    pub fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { identifier, password };
        self.post_json("POST /auth/login", "/auth/login", &body)
    }

    /// Krever invitasjonskode; svaret (`{"message":"ok"}`) brukes ikke.
    pub fn signup(&self, req: &SignupRequest) -> Result<(), ApiError> {
        let _: Value = self.post_json("POST /auth/signup", "/auth/signup", req)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(route: &str, resp: Response) -> Result<T, ApiError> {
    let body = resp.into_string().map_err(|e| ApiError::Network(e.to_string()))?;
    decode_body(route, &body)
}

fn list_params(q: ListQuery) -> [(&'static str, String); 2] {
    [("limit", q.limit.to_string()), ("pace_per_m", q.pace_per_m.to_string())]
}

impl SessionReader for HttpSwimApi {
    fn list_my_sessions(&self, query: ListQuery) -> Result<Vec<SessionSummary>, ApiError> {
        self.get_json("GET /me/sessions", "/me/sessions", &list_params(query))
    }

    fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        self.get_json("GET /sessions/{id}", &format!("/sessions/{id}"), &[])
    }

    fn get_session_analytics(&self, id: &str, pace_per_m: u32) -> Result<SessionAnalytics, ApiError> {
        self.get_json(
            "GET /sessions/{id}/analytics",
            &format!("/sessions/{id}/analytics"),
            &[("pace_per_m", pace_per_m.to_string())],
        )
    }
}

impl CoachReader for HttpSwimApi {
    fn list_swimmers(&self) -> Result<Vec<Swimmer>, ApiError> {
        self.get_json("GET /coach/swimmers", "/coach/swimmers", &[])
    }

    fn list_swimmer_sessions(&self, swimmer_id: &str, query: ListQuery) -> Result<Vec<SessionSummary>, ApiError> {
        self.get_json(
            "GET /coach/swimmers/{id}/sessions",
            &format!("/coach/swimmers/{swimmer_id}/sessions"),
            &list_params(query),
        )
    }

    fn get_swimmer_session(&self, swimmer_id: &str, session_id: &str) -> Result<Session, ApiError> {
        self.get_json(
            "GET /coach/swimmers/{id}/sessions/{sid}",
            &format!("/coach/swimmers/{swimmer_id}/sessions/{session_id}"),
            &[],
        )
    }
}

impl SessionWriter for HttpSwimApi {
    fn create_session(&self, new: &NewSession) -> Result<Session, ApiError> {
        self.post_json("POST /me/sessions", "/me/sessions", new)
    }

    fn add_set(&self, session_id: &str, set: &NewSet) -> Result<SetRecord, ApiError> {
        self.post_json(
            "POST /me/sessions/{id}/sets",
            &format!("/me/sessions/{session_id}/sets"),
            set,
        )
    }
}

impl ExportSource for HttpSwimApi {
    fn export_session_csv(&self, session_id: &str) -> Result<Vec<u8>, ApiError> {
        self.get_bytes("GET /export/session/{id}.csv", &format!("/export/session/{session_id}.csv"), &[])
    }

    fn export_range_csv(&self, range: &RangeExport) -> Result<Vec<u8>, ApiError> {
        let role = self.auth.role();
        self.get_bytes("GET /export/range.csv", "/export/range.csv", &range.query_pairs(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::models::Role;

    #[test]
    fn status_401_clears_credentials() {
        let auth = AuthContext::with_credentials(Credentials { token: "abc".into(), role: Role::Coach });
        let err = handle_status(401, r#"{"detail":"Not authenticated"}"#, &auth);
        assert!(matches!(err, ApiError::Unauthorized { ref detail } if detail == "Not authenticated"));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn other_statuses_keep_credentials() {
        let auth = AuthContext::with_credentials(Credentials { token: "abc".into(), role: Role::Swimmer });
        let err = handle_status(403, r#"{"detail":"Coach only"}"#, &auth);
        assert_eq!(err.to_string(), "Coach only");
        assert!(auth.is_authenticated());
    }

    #[test]
    fn decode_error_reports_field_path() {
        let err = decode_body::<Vec<Swimmer>>("GET /coach/swimmers", r#"[{"id": 1, "username": "a"}, 42]"#)
            .unwrap_err();
        match err {
            ApiError::Decode { endpoint, path, .. } => {
                assert_eq!(endpoint, "GET /coach/swimmers");
                assert_eq!(path, "[1]");
            }
            other => panic!("forventet Decode, fikk {other:?}"),
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let cfg = ClientConfig { base_url: "http://localhost:8000/api/".into(), ..Default::default() };
        let api = HttpSwimApi::new(&cfg, Arc::new(AuthContext::anonymous()));
        assert_eq!(api.url("/me/sessions"), "http://localhost:8000/api/me/sessions");
    }
}
