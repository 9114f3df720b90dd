//! Host process field access.
//!
//! The workflow host owns a flat set of named string fields per process
//! instance. [`ProcessStateBridge`] reads and writes them by semantic role,
//! using the field names from configuration. Reads never fail: a missing or
//! blank field reads as absent.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;
use signflow_types::{ProcessStatusCode, Signatory};
use signflow_util::config::{FieldNames, SignflowConfig, StatusValues};
use thiserror::Error;
use tracing::debug;

/// Separator for several signatories in one name/email field.
pub const SIGNER_SEPARATOR: char = ';';

#[derive(Debug, Error)]
pub enum FieldStoreError {
    #[error("field store I/O error at {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("field store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait FieldStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str) -> Result<(), FieldStoreError>;
}

/// Fields held in memory, for hosts that sync them back themselves.
#[derive(Debug, Default)]
pub struct MemoryFieldStore {
    fields: Mutex<IndexMap<String, String>>,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self {
            fields: Mutex::new(fields),
        }
    }

    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl FieldStore for MemoryFieldStore {
    fn get(&self, name: &str) -> Option<String> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) -> Result<(), FieldStoreError> {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Fields persisted as a flat JSON object; every write rewrites the file.
///
/// Non-string values are read in their JSON form and preserved on write.
#[derive(Debug)]
pub struct JsonFileFieldStore {
    path: PathBuf,
    fields: Mutex<IndexMap<String, Value>>,
}

impl JsonFileFieldStore {
    /// Open the store. A missing file starts empty; an unreadable one is an
    /// error so that host data is never overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FieldStoreError> {
        let path = path.into();
        let fields = match fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => IndexMap::new(),
            Ok(data) => serde_json::from_str(&data)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(source) => {
                return Err(FieldStoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        debug!(path = %path.display(), "field store opened");
        Ok(Self {
            path,
            fields: Mutex::new(fields),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_locked(&self, fields: &IndexMap<String, Value>) -> Result<(), FieldStoreError> {
        let io_error = |source| FieldStoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let data = serde_json::to_string_pretty(fields)?;
        fs::write(&self.path, data).map_err(io_error)
    }
}

impl FieldStore for JsonFileFieldStore {
    fn get(&self, name: &str) -> Option<String> {
        let fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        match fields.get(name)? {
            Value::Null => None,
            Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<(), FieldStoreError> {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = fields.clone();
        updated.insert(name.to_string(), Value::String(value.to_string()));
        self.save_locked(&updated)?;
        *fields = updated;
        Ok(())
    }
}

fn split_field(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| raw.split(SIGNER_SEPARATOR).map(|part| part.trim().to_string()).collect())
        .unwrap_or_default()
}

/// Typed view over the host's process fields.
pub struct ProcessStateBridge {
    store: Arc<dyn FieldStore>,
    fields: FieldNames,
    statuses: StatusValues,
}

impl ProcessStateBridge {
    pub fn new(config: &SignflowConfig, store: Arc<dyn FieldStore>) -> Self {
        Self {
            store,
            fields: config.fields.clone(),
            statuses: config.status_values.clone(),
        }
    }

    fn read(&self, name: &str) -> Option<String> {
        self.store
            .get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn envelope_id(&self) -> Option<String> {
        self.read(&self.fields.envelope_id)
    }

    pub fn document_id(&self) -> Option<String> {
        self.read(&self.fields.document_id)
    }

    /// Raw literal in the signature status field.
    pub fn signature_status_literal(&self) -> Option<String> {
        self.read(&self.fields.signature_status)
    }

    /// The stored status, when it is one of the configured literals.
    pub fn signature_status(&self) -> Option<ProcessStatusCode> {
        self.signature_status_literal()
            .and_then(|literal| self.statuses.code_for(&literal))
    }

    /// Signatories from the name and email fields, paired by position.
    ///
    /// Entries blank on both sides are skipped; a half-filled entry is kept so
    /// that validation can report it.
    pub fn signatories(&self) -> Vec<Signatory> {
        let names = split_field(self.read(&self.fields.signer_name));
        let emails = split_field(self.read(&self.fields.signer_email));
        let count = names.len().max(emails.len());
        (0..count)
            .map(|index| {
                Signatory::new(
                    names.get(index).cloned().unwrap_or_default(),
                    emails.get(index).cloned().unwrap_or_default(),
                )
            })
            .filter(|signatory| !signatory.name.is_empty() || !signatory.email.is_empty())
            .collect()
    }

    pub fn record_envelope_id(&self, envelope_id: &str) -> Result<(), FieldStoreError> {
        debug!(field = %self.fields.envelope_id, envelope_id, "recording envelope id");
        self.store.set(&self.fields.envelope_id, envelope_id)
    }

    pub fn record_status(&self, code: ProcessStatusCode) -> Result<(), FieldStoreError> {
        let literal = self.statuses.literal(code);
        debug!(field = %self.fields.signature_status, status = %code, literal, "recording signature status");
        self.store.set(&self.fields.signature_status, literal)
    }
}
