//! swimlog_core: aggregering av treningsøkter, økt-utkast og REST-klient
//! for svømmeloggen.

pub mod api;
pub mod auth;
pub mod authoring;
pub mod batch;
pub mod cli;
pub mod coach;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod lenient;
pub mod metrics;
pub mod models;
pub mod pace;
pub mod reps;
pub mod rpe;
pub mod storage;
pub mod stroke_mix;
pub mod views;

pub use api::{CoachReader, ExportSource, HttpSwimApi, SessionReader, SessionWriter};
pub use auth::{AuthContext, Credentials};
pub use authoring::{SessionDraft, SetDraft, SubmitError, ValidationError};
pub use error::{ApiError, StorageError};
pub use models::{Role, Session, SessionAnalytics, SessionSummary, SetRecord, Stroke, Swimmer};
pub use pace::pace_series;
pub use rpe::rpe_buckets;
pub use stroke_mix::stroke_mix;
