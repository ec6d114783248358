//! Durable mapping from a chat channel to the email thread it mirrors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryThreadStore;
pub use sqlite::SqliteThreadStore;

/// One row of the `email_threads` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailThread {
    pub channel_id: String,
    pub thread_id: String,
    /// Id of the prompt message while a reply is being recorded, `None` when idle.
    pub recording_message_id: Option<String>,
}

impl EmailThread {
    pub fn new(channel_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: thread_id.into(),
            recording_message_id: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording_message_id.is_some()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("channel '{0}' is already linked to an email thread")]
    ChannelAlreadyLinked(String),
    #[error("email thread '{0}' is already linked to another channel")]
    ThreadAlreadyLinked(String),
    #[error("channel '{0}' is not linked to an email thread")]
    NotFound(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn get(&self, channel_id: &str) -> StoreResult<Option<EmailThread>>;

    /// Set or clear the recording marker. Fails with [`StoreError::NotFound`]
    /// when the channel has no row.
    async fn set_recording_marker(
        &self,
        channel_id: &str,
        message_id: Option<&str>,
    ) -> StoreResult<()>;

    async fn insert(&self, thread: EmailThread) -> StoreResult<()>;

    /// Every row, ordered by channel id.
    async fn list(&self) -> StoreResult<Vec<EmailThread>>;
}
