//! Persistence of named filter configurations.
//!
//! One pretty-printed JSON document per configuration, `<directory>/<name>.json`.
//! Saving is strict (an invalid configuration is never written); loading is
//! lenient (a stored document that no longer validates is returned with a
//! logged warning, so tightening rules never loses a saved filter).

mod document;
mod name;

pub use document::{
    CURRENT_SCHEMA_VERSION, FilterConfiguration, SUPPORTED_SCHEMA_VERSIONS,
    supports_schema_version,
};
pub use name::check_name;

use crate::filter::{CancellationToken, FilterService, ValidationResult};
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DOCUMENT_EXTENSION: &str = "json";
/// Extension of the sibling a document is written to before the rename
const TEMP_EXTENSION: &str = "json.tmp";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration validation failed: {}", .0.errors.join("; "))]
    Validation(ValidationResult),

    #[error("Invalid configuration name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration operation was cancelled")]
    Cancelled,
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Platform configuration directory for saved filters
pub fn default_directory() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("log-filter").join("filters"))
}

/// File-backed configuration store.
///
/// All reads and writes go through one exclusive region per instance, so a
/// reader never sees a half-written document and writes to different names
/// never race on the directory.
#[derive(Debug)]
pub struct ConfigurationStore {
    directory: PathBuf,
    service: FilterService,
    lock: Mutex<()>,
}

impl ConfigurationStore {
    pub fn new(directory: impl Into<PathBuf>, service: FilterService) -> Self {
        Self {
            directory: directory.into(),
            service,
            lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn supports_schema_version(&self, version: &str) -> bool {
        supports_schema_version(version)
    }

    /// Schema version, name legality and every criterion
    pub fn validate(&self, config: &FilterConfiguration) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(reason) = check_name(&config.name) {
            result.add_error(format!("Invalid configuration name '{}': {reason}", config.name));
        }
        if !supports_schema_version(&config.schema_version) {
            result.add_error(format!(
                "Unsupported schema version: {}. Supported versions: {}",
                config.schema_version,
                SUPPORTED_SCHEMA_VERSIONS.join(", ")
            ));
        }
        if config.criteria.is_empty() {
            result.add_warning("Configuration has no criteria and matches every record");
        }
        result.merge(self.service.validate_filter_criteria(&config.criteria));
        result
    }

    /// Validate, stamp and write `config`. Returns the document path.
    ///
    /// `config` receives the new timestamps only once the document is on disk.
    pub fn save(&self, config: &mut FilterConfiguration) -> Result<PathBuf, StoreError> {
        let stamped = self.prepare(config)?;
        let json = self.export_to_text(&stamped)?;
        let path = {
            let _guard = self.lock.lock();
            self.write_document(&stamped.name, &json)?
        };
        *config = stamped;
        Ok(path)
    }

    /// Like [`Self::save`], but gives up with `Cancelled` if the token fires
    /// while waiting for the exclusive region.
    pub fn save_with_cancel(
        &self,
        config: &mut FilterConfiguration,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, StoreError> {
        let stamped = self.prepare(config)?;
        let json = self.export_to_text(&stamped)?;
        let path = {
            let _guard = self.lock_cancellable(cancel)?;
            self.write_document(&stamped.name, &json)?
        };
        *config = stamped;
        Ok(path)
    }

    /// Load a configuration by name; `Ok(None)` when no such document exists
    pub fn load(&self, name: &str) -> Result<Option<FilterConfiguration>, StoreError> {
        let path = self.document_path(name)?;
        let raw = {
            let _guard = self.lock.lock();
            match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(io_error(&path, e)),
            }
        };

        let config = self.import_from_text(&raw)?;
        let validation = self.validate(&config);
        if !validation.is_valid {
            tracing::warn!(
                config_name = name,
                errors = ?validation.errors,
                "Loaded configuration does not pass validation"
            );
        }
        if config.name != name {
            tracing::warn!(
                config_name = name,
                stored_name = %config.name,
                "Configuration document name differs from its file name"
            );
        }
        Ok(Some(config))
    }

    /// Names of all stored configurations, sorted
    pub fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock();
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.directory, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.directory, e))?.path();
            let is_document = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION);
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if is_document => names.push(stem.to_string()),
                _ => tracing::debug!(path = %path.display(), "Skipping non-document entry"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove a configuration; `Ok(false)` if it did not exist
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let path = self.document_path(name)?;
        let _guard = self.lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(config_name = name, "Deleted filter configuration");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    pub fn export_to_text(&self, config: &FilterConfiguration) -> Result<String, StoreError> {
        serde_json::to_string_pretty(config).map_err(StoreError::Serialization)
    }

    pub fn import_from_text(&self, text: &str) -> Result<FilterConfiguration, StoreError> {
        serde_json::from_str(text).map_err(StoreError::Deserialization)
    }

    /// Validate `config` and return a stamped copy ready to write
    fn prepare(&self, config: &FilterConfiguration) -> Result<FilterConfiguration, StoreError> {
        let validation = self.validate(config);
        if !validation.is_valid {
            return Err(StoreError::Validation(validation));
        }
        for warning in &validation.warnings {
            tracing::debug!(config_name = %config.name, warning = %warning, "Configuration warning");
        }
        let mut stamped = config.clone();
        stamped.touch(Utc::now());
        Ok(stamped)
    }

    fn lock_cancellable(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, ()>, StoreError> {
        loop {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            if let Some(guard) = self.lock.try_lock_for(LOCK_POLL_INTERVAL) {
                return Ok(guard);
            }
        }
    }

    fn document_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        check_name(name).map_err(|reason| StoreError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        Ok(self
            .directory
            .join(format!("{name}.{DOCUMENT_EXTENSION}")))
    }

    /// Write via a temporary sibling and rename, so the document is replaced whole.
    /// The sibling is removed if either step fails. Caller holds the lock.
    fn write_document(&self, name: &str, json: &str) -> Result<PathBuf, StoreError> {
        let path = self.document_path(name)?;
        fs::create_dir_all(&self.directory).map_err(|e| io_error(&self.directory, e))?;

        let tmp_path = self.directory.join(format!("{name}.{TEMP_EXTENSION}"));
        let written = fs::write(&tmp_path, json)
            .map_err(|e| io_error(&tmp_path, e))
            .and_then(|()| fs::rename(&tmp_path, &path).map_err(|e| io_error(&path, e)));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path)
                && cleanup.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary document");
            }
            return Err(err);
        }

        tracing::info!(config_name = name, path = %path.display(), "Saved filter configuration");
        Ok(path)
    }
}
