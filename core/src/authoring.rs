//! Ny økt i klienten: utkast, validering og sekvensiell innsending.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::SessionWriter;
use crate::error::ApiError;
use crate::models::{NewSession, NewSet, Stroke};

pub const DISTANCE_RANGE: (f64, f64) = (1.0, 1500.0);
pub const REPS_RANGE: (f64, f64) = (1.0, 50.0);
pub const INTERVAL_RANGE: (f64, f64) = (10.0, 3600.0);
pub const RPE_RANGE: (f64, f64) = (1.0, 10.0);
pub const REP_TIME_RANGE: (f64, f64) = (10.0, 3600.0);

/// Én generell melding; feltspesifikke meldinger gis ikke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please complete all fields correctly (check each set's reps/RPE/times).")]
pub struct ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("no set at index {0}")]
    NoSuchSet(usize),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Create(ApiError),

    /// Økten finnes på serveren med `persisted` sett; resten ble ikke sendt.
    #[error("{source}")]
    AddSet {
        index: usize,
        session_id: String,
        persisted: usize,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub session_id: String,
    pub sets_added: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepField {
    Rpe,
    RepTimes,
}

fn int_in(v: f64, (lo, hi): (f64, f64)) -> bool {
    v.is_finite() && v.fract() == 0.0 && v >= lo && v <= hi
}

fn num_in(v: f64, (lo, hi): (f64, f64)) -> bool {
    v.is_finite() && v >= lo && v <= hi
}

/// Sett under redigering. Tallfeltene er `f64` fordi de speiler skjemafelt;
/// heltallskravene sjekkes i [`SetDraft::is_valid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetDraft {
    pub distance_m: f64,
    pub reps: f64,
    pub interval_sec: f64,
    pub stroke: Stroke,
    /// Brukes til å fylle nye rep-plasser når `reps` endres.
    pub rpe_template: f64,
    pub time_template: f64,
    #[serde(default)]
    pub rpe: Vec<f64>,
    #[serde(default)]
    pub rep_times_sec: Vec<f64>,
    pub name: String,
}

impl Default for SetDraft {
    fn default() -> Self {
        Self::blank()
    }
}

impl SetDraft {
    /// 10 × 100 m fri @ 120 s, RPE 5, 90 s per rep.
    pub fn blank() -> Self {
        Self {
            distance_m: 100.0,
            reps: 10.0,
            interval_sec: 120.0,
            stroke: Stroke::Free,
            rpe_template: 5.0,
            time_template: 90.0,
            rpe: vec![5.0; 10],
            rep_times_sec: vec![90.0; 10],
            name: String::new(),
        }
    }

    /// Kutter eller forlenger begge rep-listene til `new_reps` (minst 1).
    /// Eksisterende verdier beholdes på samme indeks; nye plasser får malverdiene.
    pub fn resize_reps(&mut self, new_reps: u32) {
        let n = new_reps.max(1) as usize;
        self.reps = n as f64;
        self.rpe.resize(n, self.rpe_template);
        self.rep_times_sec.resize(n, self.time_template);
    }

    /// Overskriver hele listen med malverdien.
    pub fn fill_defaults(&mut self, field: RepField) {
        let n = self.rep_slots();
        match field {
            RepField::Rpe => self.rpe = vec![self.rpe_template; n],
            RepField::RepTimes => self.rep_times_sec = vec![self.time_template; n],
        }
    }

    /// Fyller kun lister som er helt tomme (typisk utkast lest fra fil).
    pub fn fill_missing(&mut self) {
        if self.rpe.is_empty() {
            self.fill_defaults(RepField::Rpe);
        }
        if self.rep_times_sec.is_empty() {
            self.fill_defaults(RepField::RepTimes);
        }
    }

    pub fn set_rep_value(&mut self, field: RepField, index: usize, value: f64) -> bool {
        let list = match field {
            RepField::Rpe => &mut self.rpe,
            RepField::RepTimes => &mut self.rep_times_sec,
        };
        match list.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn rep_slots(&self) -> usize {
        if self.reps.is_finite() && self.reps > 0.0 { self.reps as usize } else { 0 }
    }

    pub fn is_valid(&self) -> bool {
        int_in(self.distance_m, DISTANCE_RANGE)
            && int_in(self.reps, REPS_RANGE)
            && int_in(self.interval_sec, INTERVAL_RANGE)
            && self.rpe.len() as f64 == self.reps
            && self.rpe.iter().all(|v| int_in(*v, RPE_RANGE))
            && self.rep_times_sec.len() as f64 == self.reps
            && self.rep_times_sec.iter().all(|v| num_in(*v, REP_TIME_RANGE))
    }

    /// Forutsetter `is_valid()`.
    fn to_new_set(&self) -> NewSet {
        let name = self.name.trim();
        NewSet {
            distance_m: self.distance_m as u32,
            reps: self.reps as u32,
            interval_sec: self.interval_sec as u32,
            stroke: self.stroke,
            rpe: self.rpe.iter().map(|v| *v as u8).collect(),
            rep_times_sec: self.rep_times_sec.clone(),
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDraft {
    pub date: Option<NaiveDate>,
    pub notes: String,
    pub sets: Vec<SetDraft>,
}

impl Default for SessionDraft {
    fn default() -> Self {
        Self { date: None, notes: String::new(), sets: vec![SetDraft::blank()] }
    }
}

impl SessionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mut(&mut self, index: usize) -> Result<&mut SetDraft, DraftError> {
        self.sets.get_mut(index).ok_or(DraftError::NoSuchSet(index))
    }

    /// Returnerer indeksen til det nye settet.
    pub fn add_set(&mut self) -> usize {
        self.sets.push(SetDraft::blank());
        self.sets.len() - 1
    }

    /// Det siste settet kan ikke fjernes.
    pub fn remove_set(&mut self, index: usize) -> bool {
        if self.sets.len() <= 1 || index >= self.sets.len() {
            return false;
        }
        self.sets.remove(index);
        true
    }

    pub fn resize_reps(&mut self, set_index: usize, new_reps: u32) -> Result<(), DraftError> {
        self.set_mut(set_index)?.resize_reps(new_reps);
        Ok(())
    }

    pub fn fill_defaults(&mut self, set_index: usize, field: RepField) -> Result<(), DraftError> {
        self.set_mut(set_index)?.fill_defaults(field);
        Ok(())
    }

    /// Veksler mellom tomt navn og "Set N".
    pub fn toggle_auto_name(&mut self, set_index: usize) -> Result<(), DraftError> {
        let set = self.set_mut(set_index)?;
        set.name = if set.name.is_empty() { format!("Set {}", set_index + 1) } else { String::new() };
        Ok(())
    }

    pub fn fill_missing(&mut self) {
        self.sets.iter_mut().for_each(SetDraft::fill_missing);
    }

    pub fn validate_all(&self) -> bool {
        if self.date.is_none() {
            log::debug!("utkast ugyldig: dato mangler");
            return false;
        }
        match self.sets.iter().position(|s| !s.is_valid()) {
            Some(i) => {
                log::debug!("utkast ugyldig: sett {} bryter grensene", i + 1);
                false
            }
            None => true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.validate_all() { Ok(()) } else { Err(ValidationError) }
    }

    pub fn payload(&self) -> Result<(NewSession, Vec<NewSet>), ValidationError> {
        self.validate()?;
        let date = self.date.ok_or(ValidationError)?;
        let session = NewSession { date, notes: self.notes.clone() };
        Ok((session, self.sets.iter().map(SetDraft::to_new_set).collect()))
    }

    /// Oppretter økten og legger deretter til settene ett og ett, i rekkefølge.
    ///
    /// Første feil stopper resten. Ingen rollback: sett som allerede er sendt
    /// blir liggende på serveren.
    pub fn submit<W: SessionWriter + ?Sized>(&self, api: &W) -> Result<SubmitOutcome, SubmitError> {
        let (new_session, sets) = self.payload()?;
        log::info!("oppretter økt {} med {} sett", new_session.date, sets.len());

        let created = api.create_session(&new_session).map_err(SubmitError::Create)?;
        if created.id.is_empty() {
            return Err(SubmitError::Create(ApiError::Decode {
                endpoint: "POST /me/sessions".into(),
                path: "id".into(),
                message: "response did not contain a session id".into(),
            }));
        }

        for (index, set) in sets.iter().enumerate() {
            if let Err(source) = api.add_set(&created.id, set) {
                log::error!(
                    "sett {} av {} feilet for økt {}: {source}",
                    index + 1,
                    sets.len(),
                    created.id
                );
                return Err(SubmitError::AddSet {
                    index,
                    session_id: created.id.clone(),
                    persisted: index,
                    source,
                });
            }
        }

        Ok(SubmitOutcome { session_id: created.id, sets_added: sets.len() })
    }
}
