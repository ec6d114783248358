//! Per-channel advisory lock, local to this process.

use std::sync::Arc;

use dashmap::DashSet;
use tracing::trace;

/// Set of channel ids currently held. Cloning shares the set.
#[derive(Debug, Clone, Default)]
pub struct ChannelLocks {
    held: Arc<DashSet<String>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `channel_id`. `None` if someone already holds it.
    pub fn try_acquire(&self, channel_id: &str) -> Option<ChannelLockGuard> {
        if !self.held.insert(channel_id.to_string()) {
            trace!(channel_id, "channel lock contended");
            return None;
        }
        trace!(channel_id, "channel lock acquired");
        Some(ChannelLockGuard {
            held: self.held.clone(),
            channel_id: channel_id.to_string(),
        })
    }

    pub fn is_locked(&self, channel_id: &str) -> bool {
        self.held.contains(channel_id)
    }
}

/// Releases its channel when dropped, on every exit path.
#[derive(Debug)]
pub struct ChannelLockGuard {
    held: Arc<DashSet<String>>,
    channel_id: String,
}

impl Drop for ChannelLockGuard {
    fn drop(&mut self) {
        self.held.remove(&self.channel_id);
        trace!(channel_id = %self.channel_id, "channel lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let locks = ChannelLocks::new();
        let guard = locks.try_acquire("C1").expect("first acquire");
        assert!(locks.try_acquire("C1").is_none());
        assert!(locks.is_locked("C1"));

        drop(guard);
        assert!(!locks.is_locked("C1"));
        assert!(locks.try_acquire("C1").is_some());
    }

    #[test]
    fn channels_are_independent() {
        let locks = ChannelLocks::new();
        let _c1 = locks.try_acquire("C1").expect("C1");
        assert!(locks.try_acquire("C2").is_some());
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn bail_out(locks: &ChannelLocks) -> Result<(), &'static str> {
            let _guard = locks.try_acquire("C1").ok_or("busy")?;
            Err("failed while holding the lock")
        }

        let locks = ChannelLocks::new();
        assert!(bail_out(&locks).is_err());
        assert!(!locks.is_locked("C1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exactly_one_concurrent_winner() {
        let locks = ChannelLocks::new();
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            tasks.push(tokio::spawn(async move {
                locks.try_acquire("C1").map(|guard| {
                    std::mem::forget(guard);
                })
            }));
        }
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
