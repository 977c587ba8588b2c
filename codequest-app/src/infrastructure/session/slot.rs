use chrono::{DateTime, Utc};
use codequest_errors::AppError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// A value plus the instant after which it must be treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Durable key-value slot holding one session value.
pub trait SessionSlot: Send + Sync {
    fn read(&self) -> Result<Option<StoredValue>, AppError>;
    fn write(&self, value: &StoredValue) -> Result<(), AppError>;
    fn remove(&self) -> Result<(), AppError>;
}

/// Keeps the value in a JSON file, readable only by the owner on Unix.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionSlot for FileSlot {
    fn read(&self) -> Result<Option<StoredValue>, AppError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    fn write(&self, value: &StoredValue) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string(value).map_err(|e| AppError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| AppError::Storage(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| AppError::Storage(e.to_string()))?;
        }

        Ok(())
    }

    fn remove(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<StoredValue>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionSlot for MemorySlot {
    fn read(&self) -> Result<Option<StoredValue>, AppError> {
        Ok(self
            .value
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))?
            .clone())
    }

    fn write(&self, value: &StoredValue) -> Result<(), AppError> {
        *self
            .value
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))? = Some(value.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), AppError> {
        *self
            .value
            .lock()
            .map_err(|e| AppError::Storage(e.to_string()))? = None;
        Ok(())
    }
}
