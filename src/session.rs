// src/session.rs
// Last signed-in account, persisted as a small JSON file

use crate::error::DropError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub account_id: String,
    /// Raw `view_account` result at the time the session was stored
    pub account: Value,
    pub remembered_at: DateTime<Utc>,
}

pub struct SessionStore {
    path: PathBuf,
    session: Option<Session>,
}

impl SessionStore {
    /// A missing file is an empty store; an unreadable one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DropError> {
        let path = path.into();
        let session = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| DropError::Session(format!("{}: {}", path.display(), e)))?;
            Some(serde_json::from_str(&content).map_err(|e| DropError::Session(e.to_string()))?)
        } else {
            None
        };
        Ok(Self { path, session })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remember(&mut self, account_id: &str, account: Value) -> Result<(), DropError> {
        let session = Session {
            account_id: account_id.to_string(),
            account,
            remembered_at: Utc::now(),
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DropError::Session(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&session).map_err(|e| DropError::Session(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| DropError::Session(e.to_string()))?;
        debug!(%account_id, path = %self.path.display(), "session stored");
        self.session = Some(session);
        Ok(())
    }

    pub fn forget(&mut self) -> Result<(), DropError> {
        self.session = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DropError::Session(e.to_string())),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.account_id.as_str())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}
