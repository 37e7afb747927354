use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::StorageError;
use crate::models::Role;

/// Parametre for `GET /export/range.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeExport {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub swimmer_id: Option<String>,
}

impl RangeExport {
    /// `swimmer_id` sendes bare for trenere; tomme felt utelates.
    pub fn query_pairs(&self, role: Option<Role>) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(s) = self.start {
            out.push(("start", s.format("%Y-%m-%d").to_string()));
        }
        if let Some(e) = self.end {
            out.push(("end", e.format("%Y-%m-%d").to_string()));
        }
        if role == Some(Role::Coach) {
            if let Some(id) = self.swimmer_id.as_deref().filter(|id| !id.is_empty()) {
                out.push(("swimmer_id", id.to_string()));
            }
        }
        out
    }

    pub fn file_name(&self) -> String {
        let part = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "all".into());
        format!("range-{}-{}.csv", part(self.start), part(self.end))
    }
}

/// `session-{id}-{yyyy-mm-dd}.csv`, eller `session-{id}-session.csv` uten dato.
pub fn session_csv_file_name(session_id: &str, date: Option<NaiveDate>) -> String {
    let date_str = date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "session".to_string());
    format!("session-{session_id}-{date_str}.csv")
}

/// Antall datarader (uten header) i en CSV-eksport.
pub fn csv_row_count(bytes: &[u8]) -> Result<usize, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(bytes);
    let mut n = 0;
    for rec in rdr.records() {
        rec?;
        n += 1;
    }
    Ok(n)
}

/// Skriver eksporten til `dir/name` og returnerer stien.
pub fn write_export(bytes: &[u8], dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(dir).map_err(|source| StorageError::Io { path: dir.to_path_buf(), source })?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).map_err(|source| StorageError::Io { path: path.clone(), source })?;
    log::info!("CSV lagret til {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
