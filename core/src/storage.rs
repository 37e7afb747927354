use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Credentials;
use crate::error::StorageError;

/// Leser JSON fra disk. Finnes ikke filen, returneres `None`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|source| StorageError::Io { path: path.to_path_buf(), source })?;
    let value = serde_json::from_str(&contents)
        .map_err(|source| StorageError::Json { path: path.to_path_buf(), source })?;
    Ok(Some(value))
}

/// Lagrer som JSON (pretty-print), oppretter mappen ved behov.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), StorageError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|source| StorageError::Io { path: dir.to_path_buf(), source })?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| StorageError::Json { path: path.to_path_buf(), source })?;
    std::fs::write(path, json).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })
}

/// Leser lagret innlogging. Manglende fil betyr "ikke innlogget".
pub fn load_credentials(path: &Path) -> Result<Option<Credentials>, StorageError> {
    let creds: Option<Credentials> = load_json(path)?;
    match &creds {
        Some(c) => log::info!("innlogging lastet fra {} (role={})", path.display(), c.role),
        None => log::debug!("fant ingen innlogging på {}", path.display()),
    }
    Ok(creds)
}

pub fn save_credentials(creds: &Credentials, path: &Path) -> Result<(), StorageError> {
    save_json(creds, path)?;
    log::info!("innlogging lagret til {} (role={})", path.display(), creds.role);
    Ok(())
}

/// Sletter lagret innlogging. Allerede slettet er ikke en feil.
pub fn clear_credentials(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("innlogging slettet ({})", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Io { path: path.to_path_buf(), source }),
    }
}
