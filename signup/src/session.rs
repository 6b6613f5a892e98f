use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::Mutex;

use crate::dir::DataDirectory;

/// Key of the bearer token in the session file.
pub const TOKEN_KEY: &str = "token";

/// An authenticated session, represented by the bearer token returned by the API.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn new(token: String) -> Self {
        Session(token)
    }
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session(REDACTED)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Reading session file: {0}")]
    ReadingFile(String),
    #[error("Writing session file: {0}")]
    WritingFile(String),
    #[error("Parsing session file: {0}")]
    ParsingFile(String),
}

type Entries = BTreeMap<String, String>;

/// Position of a write in the order the writes were requested.
///
/// Reserved synchronously with [`SessionStore::reserve`] when the write is
/// decided, then given to [`SessionStore::persist`] which may run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WriteTicket(u64);

/// Durable key/value store the session token is persisted in, so it
/// survives restarts.
///
/// Clones share the same write ordering: a write is dropped if a write
/// requested after it was already applied.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    next_ticket: Arc<AtomicU64>,
    // Ticket of the last applied write.
    applied: Arc<Mutex<Option<WriteTicket>>>,
}

impl SessionStore {
    pub fn new(datadir: &DataDirectory) -> Self {
        Self {
            path: datadir.session_file_path(),
            next_ticket: Arc::new(AtomicU64::new(0)),
            applied: Arc::new(Mutex::new(None)),
        }
    }

    fn parse(content: &[u8]) -> Result<Entries, SessionStoreError> {
        serde_json::from_slice::<Entries>(content)
            .map_err(|e| SessionStoreError::ParsingFile(e.to_string()))
    }

    // A corrupt file holds no session, it is overwritten on the next write.
    fn parse_or_reset(content: &[u8]) -> Entries {
        Self::parse(content).unwrap_or_else(|e| {
            tracing::warn!("Something wrong with the session file: {}", e);
            tracing::warn!("Session file is reset");
            Entries::new()
        })
    }

    /// Read the persisted session, if any. Meant to be called once at startup.
    pub fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::ReadingFile(e.to_string())),
        };
        Ok(Self::parse_or_reset(&content)
            .remove(TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .map(Session::new))
    }

    async fn read_entries(&self) -> Result<Entries, SessionStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(content) => Ok(Self::parse_or_reset(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(SessionStoreError::ReadingFile(e.to_string())),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), SessionStoreError> {
        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(SessionStoreError::WritingFile(e.to_string()))
                }
                _ => Ok(()),
            };
        }
        let content = serde_json::to_vec_pretty(entries).map_err(|e| {
            SessionStoreError::WritingFile(format!("Failed to serialize session: {}", e))
        })?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            tracing::warn!("failed to write to file: {:?}", e);
            SessionStoreError::WritingFile(e.to_string())
        })
    }

    /// Take the next place in the write order.
    pub fn reserve(&self) -> WriteTicket {
        WriteTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Persist the session, or forget it if `None`, leaving other entries of
    /// the file untouched.
    ///
    /// Writes never interleave, and a write whose ticket is older than the
    /// last applied one is skipped.
    pub async fn persist(
        &self,
        ticket: WriteTicket,
        session: Option<&Session>,
    ) -> Result<(), SessionStoreError> {
        let mut applied = self.applied.lock().await;
        if matches!(*applied, Some(last) if last > ticket) {
            tracing::debug!("Skipping outdated session write {:?}", ticket);
            return Ok(());
        }

        let mut entries = self.read_entries().await?;
        let changed = match session {
            Some(session) => {
                entries.insert(TOKEN_KEY.to_string(), session.token().to_string())
                    != Some(session.token().to_string())
            }
            None => entries.remove(TOKEN_KEY).is_some(),
        };
        if changed {
            self.write_entries(&entries).await?;
        }
        *applied = Some(ticket);
        Ok(())
    }

    /// Persist the session.
    pub async fn store(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.persist(self.reserve(), Some(session)).await
    }

    /// Forget the persisted session.
    pub async fn clear(&self) -> Result<(), SessionStoreError> {
        self.persist(self.reserve(), None).await
    }
}
