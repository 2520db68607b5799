//! Per-session upload staging
//!
//! Every session owns one directory under the upload root. Uploading again
//! replaces the previous set of files; clearing or expiring a session deletes
//! its directory.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::RelayError;
use crate::models::{FileDescriptor, UploadedFile};

/// Session file storage used by the HTTP handlers
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace the session's files with `uploads`, removing whatever was staged before
    async fn put(
        &self,
        session_id: &str,
        uploads: Vec<UploadedFile>,
    ) -> Result<Vec<FileDescriptor>, RelayError>;

    /// Files currently staged for the session; empty when unknown or expired
    async fn get(&self, session_id: &str) -> Vec<FileDescriptor>;

    /// Delete the session's files and forget it. Unknown sessions are a no-op.
    async fn clear(&self, session_id: &str) -> Result<(), RelayError>;

    /// Clear every expired session, returning how many were removed
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug)]
struct SessionEntry {
    files: Vec<FileDescriptor>,
    touched_at: DateTime<Utc>,
}

/// `SessionStore` backed by the local filesystem
///
/// Calls for the same session are serialized by a per-session lock; distinct
/// sessions never contend.
pub struct DiskSessionStore {
    root: PathBuf,
    ttl: TimeDelta,
    sessions: DashMap<String, Arc<Mutex<SessionEntry>>>,
}

impl DiskSessionStore {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            sessions: DashMap::new(),
        }
    }

    /// Directory holding a session's files
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn slot(&self, session_id: &str) -> Arc<Mutex<SessionEntry>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionEntry {
                    files: Vec::new(),
                    touched_at: Utc::now(),
                }))
            })
            .value()
            .clone()
    }

    fn existing_slot(&self, session_id: &str) -> Option<Arc<Mutex<SessionEntry>>> {
        self.sessions.get(session_id).map(|slot| slot.value().clone())
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.touched_at > self.ttl
    }
}

#[async_trait]
impl SessionStore for DiskSessionStore {
    async fn put(
        &self,
        session_id: &str,
        uploads: Vec<UploadedFile>,
    ) -> Result<Vec<FileDescriptor>, RelayError> {
        let (_slot, mut entry) = self.lock_current(session_id).await;

        let dir = self.session_dir(session_id);
        remove_dir_if_exists(&dir).await?;
        tokio::fs::create_dir_all(&dir).await?;

        let mut files = Vec::with_capacity(uploads.len());
        for (index, upload) in uploads.into_iter().enumerate() {
            let path = dir.join(format!("{}_{}", index, sanitize_file_name(&upload.file_name)));
            tokio::fs::write(&path, &upload.bytes).await?;
            files.push(FileDescriptor {
                path,
                display_name: upload.file_name,
                mime_type: upload.mime_type,
            });
        }

        entry.files = files.clone();
        entry.touched_at = Utc::now();

        tracing::info!(session = %session_id, count = files.len(), "staged session files");
        Ok(files)
    }

    async fn get(&self, session_id: &str) -> Vec<FileDescriptor> {
        let Some(slot) = self.existing_slot(session_id) else {
            return Vec::new();
        };

        let mut entry = slot.clone().lock_owned().await;
        if !self.is_current(session_id, &slot) {
            // Cleared while we waited
            return Vec::new();
        }

        let now = Utc::now();
        if !self.is_expired(&entry, now) {
            entry.touched_at = now;
            return entry.files.clone();
        }

        if let Err(e) = self.clear_locked(session_id, &slot, &mut entry).await {
            tracing::warn!(session = %session_id, error = %e, "failed to clear expired session");
        }
        Vec::new()
    }

    async fn clear(&self, session_id: &str) -> Result<(), RelayError> {
        // Also covers directories left over from an earlier process
        let (slot, mut entry) = self.lock_current(session_id).await;
        self.clear_locked(session_id, &slot, &mut entry).await
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let candidates: Vec<(String, Arc<Mutex<SessionEntry>>)> = self
            .sessions
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect();

        let mut removed = 0;
        for (session_id, slot) in candidates {
            let mut entry = slot.clone().lock_owned().await;
            if !self.is_current(&session_id, &slot) || !self.is_expired(&entry, now) {
                continue;
            }
            match self.clear_locked(&session_id, &slot, &mut entry).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(session = %session_id, error = %e, "failed to purge session")
                }
            }
        }
        removed
    }
}

impl DiskSessionStore {
    /// Lock the session's live slot, creating it if needed
    ///
    /// A slot can be dropped from the map while we wait on its lock; in that
    /// case the lookup is retried so callers only ever mutate the live slot.
    async fn lock_current(
        &self,
        session_id: &str,
    ) -> (Arc<Mutex<SessionEntry>>, OwnedMutexGuard<SessionEntry>) {
        loop {
            let slot = self.slot(session_id);
            let entry = slot.clone().lock_owned().await;
            if self.is_current(session_id, &slot) {
                return (slot, entry);
            }
        }
    }

    fn is_current(&self, session_id: &str, slot: &Arc<Mutex<SessionEntry>>) -> bool {
        self.existing_slot(session_id)
            .is_some_and(|current| Arc::ptr_eq(&current, slot))
    }

    /// Remove a session whose entry lock the caller holds
    async fn clear_locked(
        &self,
        session_id: &str,
        slot: &Arc<Mutex<SessionEntry>>,
        entry: &mut SessionEntry,
    ) -> Result<(), RelayError> {
        remove_dir_if_exists(&self.session_dir(session_id)).await?;
        entry.files.clear();
        self.sessions
            .remove_if(session_id, |_, current| Arc::ptr_eq(current, slot));

        tracing::info!(session = %session_id, "cleared session files");
        Ok(())
    }
}

/// Session tokens become directory names, so only plain tokens are accepted
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 64
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Fresh random session token
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Keep `[A-Za-z0-9._-]`, replace the rest, never produce a dot-only name
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}

async fn remove_dir_if_exists(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
