//! In-process [`ThreadStore`], used by tests and dry runs.

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use super::{EmailThread, StoreError, StoreResult, ThreadStore};

#[derive(Debug, Default)]
pub struct InMemoryThreadStore {
    threads: DashMap<String, EmailThread>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: impl IntoIterator<Item = EmailThread>) -> Self {
        let store = Self::new();
        for thread in threads {
            store.threads.insert(thread.channel_id.clone(), thread);
        }
        store
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn get(&self, channel_id: &str) -> StoreResult<Option<EmailThread>> {
        Ok(self.threads.get(channel_id).map(|entry| entry.value().clone()))
    }

    async fn set_recording_marker(
        &self,
        channel_id: &str,
        message_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut thread = self
            .threads
            .get_mut(channel_id)
            .ok_or_else(|| StoreError::NotFound(channel_id.to_string()))?;
        thread.recording_message_id = message_id.map(str::to_string);
        Ok(())
    }

    async fn insert(&self, thread: EmailThread) -> StoreResult<()> {
        if self
            .threads
            .iter()
            .any(|entry| entry.thread_id == thread.thread_id)
        {
            return Err(StoreError::ThreadAlreadyLinked(thread.thread_id));
        }
        match self.threads.entry(thread.channel_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::ChannelAlreadyLinked(thread.channel_id)),
            Entry::Vacant(slot) => {
                slot.insert(thread);
                Ok(())
            }
        }
    }

    async fn list(&self) -> StoreResult<Vec<EmailThread>> {
        let mut threads: Vec<EmailThread> =
            self.threads.iter().map(|entry| entry.value().clone()).collect();
        threads.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        Ok(threads)
    }
}
