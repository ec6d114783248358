//! SQLite-backed [`ThreadStore`].

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::debug;

use super::{EmailThread, StoreError, StoreResult, ThreadStore};

#[derive(Debug)]
pub struct SqliteThreadStore {
    db_path: PathBuf,
}

impl SqliteThreadStore {
    /// Opens the database at `path`, creating the file and schema if needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        debug!(path = %store.db_path.display(), "thread store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> StoreResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS email_threads (
                channel_id TEXT PRIMARY KEY NOT NULL,
                thread_id TEXT NOT NULL UNIQUE,
                recording_message_id TEXT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS thread_id_idx ON email_threads (thread_id);
            "#,
        )?;
        Ok(())
    }
}

fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmailThread> {
    Ok(EmailThread {
        channel_id: row.get(0)?,
        thread_id: row.get(1)?,
        recording_message_id: row.get(2)?,
    })
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn get(&self, channel_id: &str) -> StoreResult<Option<EmailThread>> {
        let connection = self.open_connection()?;
        let thread = connection
            .query_row(
                "SELECT channel_id, thread_id, recording_message_id
                 FROM email_threads WHERE channel_id = ?1",
                params![channel_id],
                row_to_thread,
            )
            .optional()?;
        Ok(thread)
    }

    async fn set_recording_marker(
        &self,
        channel_id: &str,
        message_id: Option<&str>,
    ) -> StoreResult<()> {
        let connection = self.open_connection()?;
        let updated = connection.execute(
            "UPDATE email_threads SET recording_message_id = ?2 WHERE channel_id = ?1",
            params![channel_id, message_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(channel_id.to_string()));
        }
        Ok(())
    }

    async fn insert(&self, thread: EmailThread) -> StoreResult<()> {
        let mut connection = self.open_connection()?;
        let transaction = connection.transaction()?;

        let channel_taken: bool = transaction.query_row(
            "SELECT EXISTS(SELECT 1 FROM email_threads WHERE channel_id = ?1)",
            params![thread.channel_id],
            |row| row.get(0),
        )?;
        if channel_taken {
            return Err(StoreError::ChannelAlreadyLinked(thread.channel_id));
        }

        let inserted = transaction.execute(
            "INSERT INTO email_threads (channel_id, thread_id, recording_message_id)
             VALUES (?1, ?2, ?3)",
            params![thread.channel_id, thread.thread_id, thread.recording_message_id],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::ThreadAlreadyLinked(thread.thread_id));
            }
            Err(err) => return Err(err.into()),
        }
        transaction.commit()?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<EmailThread>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT channel_id, thread_id, recording_message_id
             FROM email_threads ORDER BY channel_id",
        )?;
        let threads = statement
            .query_map([], row_to_thread)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn marker_survives_reopen() {
        let temp = tempdir().expect("create tempdir");
        let db_path = temp.path().join("data").join("database.sqlite");

        {
            let store = SqliteThreadStore::open(&db_path).expect("open store");
            store.insert(EmailThread::new("C1", "T1")).await.expect("insert");
            store
                .set_recording_marker("C1", Some("42"))
                .await
                .expect("set marker");
        }

        let store = SqliteThreadStore::open(&db_path).expect("reopen store");
        let thread = store.get("C1").await.expect("get").expect("row");
        assert_eq!(thread.thread_id, "T1");
        assert_eq!(thread.recording_message_id.as_deref(), Some("42"));

        store.set_recording_marker("C1", None).await.expect("clear marker");
        let thread = store.get("C1").await.expect("get").expect("row");
        assert_eq!(thread.recording_message_id, None);
    }

    #[tokio::test]
    async fn thread_ids_are_unique() {
        let temp = tempdir().expect("create tempdir");
        let store = SqliteThreadStore::open(temp.path().join("db.sqlite")).expect("open store");

        store.insert(EmailThread::new("C1", "T1")).await.expect("insert");
        let same_thread = store.insert(EmailThread::new("C2", "T1")).await;
        assert!(matches!(same_thread, Err(StoreError::ThreadAlreadyLinked(id)) if id == "T1"));

        let same_channel = store.insert(EmailThread::new("C1", "T9")).await;
        assert!(matches!(same_channel, Err(StoreError::ChannelAlreadyLinked(id)) if id == "C1"));

        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn marker_on_unknown_channel_is_not_found() {
        let temp = tempdir().expect("create tempdir");
        let store = SqliteThreadStore::open(temp.path().join("db.sqlite")).expect("open store");

        assert!(store.get("C404").await.expect("get").is_none());
        let err = store.set_recording_marker("C404", Some("1")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "C404"));
    }

    #[tokio::test]
    async fn list_is_ordered_by_channel() {
        let temp = tempdir().expect("create tempdir");
        let store = SqliteThreadStore::open(temp.path().join("db.sqlite")).expect("open store");
        store.insert(EmailThread::new("C2", "T2")).await.expect("insert");
        store.insert(EmailThread::new("C1", "T1")).await.expect("insert");

        let channels: Vec<String> = store
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|t| t.channel_id)
            .collect();
        assert_eq!(channels, vec!["C1", "C2"]);
    }
}
