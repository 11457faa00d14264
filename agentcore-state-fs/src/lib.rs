#![deny(missing_docs)]
//! Filesystem-backed, crash-safe persistence for sessions and messages (§6).
//!
//! Directory layout, rooted at a configured base directory:
//!
//! ```text
//! <base>/sessions.json                 — array of SessionMeta
//! <base>/<session_id>/messages.json    — array of storage-JSON messages
//! ```
//!
//! Every write goes through [`write_json_atomic`]: content lands at
//! `<path>.tmp` first and is renamed into place only after the write
//! succeeds, so a crash mid-write leaves a stale `.tmp` instead of a
//! corrupt target file.

use std::path::{Path, PathBuf};

use agentcore_types::{AgentKind, Message, MessageId, SessionId, StorageError, UsageTotals};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Session-level metadata persisted alongside its messages (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: SessionId,
    pub title: Option<String>,
    #[serde(default)]
    pub parent_id: Option<SessionId>,
    pub agent_type: AgentKind,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub total_usage: UsageTotals,
}

/// Filesystem-backed store. All CRUD operations hold an internal mutex for
/// the duration of a JSON read-modify-write cycle (§5 "Shared resources").
pub struct FsStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FsStore {
    /// Create a store rooted at the given base directory. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), lock: Mutex::new(()) }
    }

    fn sessions_path(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    fn messages_path(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id).join("messages.json")
    }

    /// Load every persisted `SessionMeta`. A missing file is an empty list,
    /// not an error — there is simply no prior state yet.
    pub async fn load_sessions(&self) -> Result<Vec<SessionMeta>, StorageError> {
        let _guard = self.lock.lock().await;
        read_json_array(&self.sessions_path()).await
    }

    /// Insert or replace a `SessionMeta` by id and persist the full list
    /// (§4.5 "Session-level metadata ... is written whenever a message is
    /// added or the title is set").
    pub async fn save_session_meta(&self, meta: SessionMeta) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<SessionMeta> = read_json_array(&self.sessions_path()).await?;
        match all.iter_mut().find(|m| m.id == meta.id) {
            Some(existing) => *existing = meta,
            None => all.push(meta),
        }
        write_json_atomic(&self.sessions_path(), &all).await
    }

    /// Load every message persisted for a session, in storage order. A
    /// missing file is an empty list.
    pub async fn load_messages(&self, session_id: &str) -> Result<Vec<Message>, StorageError> {
        let _guard = self.lock.lock().await;
        read_json_array(&self.messages_path(session_id)).await
    }

    /// Append a newly-created message to its session's store (§4.5 "every
    /// `add_message` writes the message via store's `save`").
    pub async fn save_message(&self, session_id: &str, message: &Message) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let path = self.messages_path(session_id);
        let mut all: Vec<Message> = read_json_array(&path).await?;
        all.push(message.clone());
        write_json_atomic(&path, &all).await
    }

    /// Overwrite a previously-saved message in place, by id (§4.5 "every
    /// tool-result mutation during pruning writes the containing message").
    pub async fn update_message(&self, session_id: &str, message: &Message) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let path = self.messages_path(session_id);
        let mut all: Vec<Message> = read_json_array(&path).await?;
        match all.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message.clone(),
            None => return Err(StorageError::SessionNotFound(format!("{session_id}/{}", message.id))),
        }
        write_json_atomic(&path, &all).await
    }
}

/// Read a JSON array file, treating "not found" as an empty array and a
/// parse failure as [`StorageError::Corrupt`] (kind 8 — callers decide
/// whether to fall back to empty).
async fn read_json_array<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt { path: path.display().to_string(), reason: e.to_string() }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StorageError::Io(e.to_string())),
    }
}

/// Write-temp-then-rename: `value` lands at `<path>.tmp`, then is renamed
/// onto `path` only once the write succeeds (§5 "Persistence atomicity").
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| StorageError::Io(e.to_string()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let contents = serde_json::to_string_pretty(value).map_err(|e| StorageError::Corrupt { path: path.display().to_string(), reason: e.to_string() })?;
    tokio::fs::write(&tmp, contents).await.map_err(|e| StorageError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| StorageError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_types::Role;

    fn meta(id: &str) -> SessionMeta {
        SessionMeta { id: id.to_string(), title: None, parent_id: None, agent_type: AgentKind::General, created_at: 0, updated_at: 0, total_usage: UsageTotals::default() }
    }

    #[tokio::test]
    async fn load_sessions_on_empty_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.load_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_session_meta_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save_session_meta(meta("s1")).await.unwrap();
        let all = store.load_sessions().await.unwrap();
        assert_eq!(all, vec![meta("s1")]);
    }

    #[tokio::test]
    async fn save_session_meta_replaces_existing_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save_session_meta(meta("s1")).await.unwrap();
        let mut updated = meta("s1");
        updated.title = Some("renamed".into());
        store.save_session_meta(updated.clone()).await.unwrap();
        let all = store.load_sessions().await.unwrap();
        assert_eq!(all, vec![updated]);
    }

    #[tokio::test]
    async fn save_message_appends_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let m1 = Message::new(MessageId::from("m1"), Role::User, "s1".to_string(), 0);
        let m2 = Message::new(MessageId::from("m2"), Role::Assistant, "s1".to_string(), 1);
        store.save_message("s1", &m1).await.unwrap();
        store.save_message("s1", &m2).await.unwrap();
        let loaded = store.load_messages("s1").await.unwrap();
        assert_eq!(loaded.iter().map(|m| m.id.clone()).collect::<Vec<_>>(), vec!["m1".to_string(), "m2".to_string()]);
    }

    #[tokio::test]
    async fn update_message_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let mut m1 = Message::new(MessageId::from("m1"), Role::Assistant, "s1".to_string(), 0);
        store.save_message("s1", &m1).await.unwrap();
        m1.add_text("now finished");
        store.update_message("s1", &m1).await.unwrap();
        let loaded = store.load_messages("s1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text(), "now finished");
    }

    #[tokio::test]
    async fn update_message_missing_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let m1 = Message::new(MessageId::from("m1"), Role::User, "s1".to_string(), 0);
        let result = store.update_message("s1", &m1).await;
        assert!(matches!(result, Err(StorageError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn corrupt_messages_file_surfaces_as_corrupt_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let session_dir = dir.path().join("s1");
        tokio::fs::create_dir_all(&session_dir).await.unwrap();
        tokio::fs::write(session_dir.join("messages.json"), b"not json").await.unwrap();
        let result = store.load_messages("s1").await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_tmp_file_behind_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save_session_meta(meta("s1")).await.unwrap();
        assert!(!dir.path().join("sessions.json.tmp").exists());
        assert!(dir.path().join("sessions.json").exists());
    }
}
