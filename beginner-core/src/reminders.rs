use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// What a member asked to be reminded of, and where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReminderPayload {
    pub content: String,
    pub message_id: u64,
    pub channel_id: u64,
}

/// Scheduler key for a member's reminder; one live reminder per member.
pub fn reminder_key(user_id: u64) -> String {
    format!("reminder-{user_id}")
}

/// One-shot delayed tasks keyed by name.
///
/// Tasks live only in memory and cannot be cancelled; shutting the process
/// down drops them.
#[derive(Clone, Debug, Default)]
pub struct ReminderScheduler {
    pending: Arc<Mutex<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler(payload)` once after `delay`.
    ///
    /// With `no_duplication` set, returns `false` and schedules nothing when
    /// a task under `key` is still pending. The key is released before the
    /// handler runs.
    pub async fn schedule<P, F, Fut>(
        &self,
        key: impl Into<String>,
        delay: Duration,
        payload: P,
        handler: F,
        no_duplication: bool,
    ) -> bool
    where
        P: Send + 'static,
        F: FnOnce(P) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let key = key.into();
        let fire_at = TimeDelta::from_std(delay)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        {
            let mut pending = self.pending.lock().await;
            let slots = pending.entry(key.clone()).or_default();
            if no_duplication && !slots.is_empty() {
                debug!(%key, "task already scheduled");
                return false;
            }
            slots.push(fire_at);
        }

        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut pending = pending.lock().await;
                if let Some(slots) = pending.get_mut(&key) {
                    if let Some(index) = slots.iter().position(|slot| *slot == fire_at) {
                        slots.remove(index);
                    }
                    if slots.is_empty() {
                        pending.remove(&key);
                    }
                }
            }

            if let Err(source) = handler(payload).await {
                error!(?source, %key, "scheduled task failed");
            }
        });

        true
    }

    pub async fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().await.contains_key(key)
    }

    /// Earliest fire time of the tasks pending under `key`.
    pub async fn next_fire_time(&self, key: &str) -> Option<DateTime<Utc>> {
        self.pending
            .lock()
            .await
            .get(key)
            .and_then(|slots| slots.iter().min().copied())
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{mpsc, oneshot};

    use super::{ReminderPayload, ReminderScheduler, reminder_key};

    const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

    fn payload(content: &str) -> ReminderPayload {
        ReminderPayload {
            content: content.to_owned(),
            message_id: 1,
            channel_id: 2,
        }
    }

    #[test]
    fn keys_are_per_member() {
        assert_eq!(reminder_key(42), "reminder-42");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_keys_are_rejected_until_the_task_fires() {
        let scheduler = ReminderScheduler::new();
        let (fired_tx, fired_rx) = oneshot::channel();

        let scheduled = scheduler
            .schedule(
                "r1",
                FIVE_MINUTES,
                payload("first"),
                move |payload: ReminderPayload| async move {
                    let _ = fired_tx.send(payload.content);
                    Ok(())
                },
                true,
            )
            .await;
        assert!(scheduled);
        assert!(scheduler.is_pending("r1").await);
        assert!(scheduler.next_fire_time("r1").await.is_some());

        let duplicate = scheduler
            .schedule("r1", FIVE_MINUTES, payload("second"), |_| async { Ok(()) }, true)
            .await;
        assert!(!duplicate);
        assert_eq!(scheduler.pending_count().await, 1);

        assert_eq!(fired_rx.await.unwrap(), "first");
        assert!(!scheduler.is_pending("r1").await);

        let again = scheduler
            .schedule("r1", FIVE_MINUTES, payload("third"), |_| async { Ok(()) }, true)
            .await;
        assert!(again);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_are_allowed_when_requested() {
        let scheduler = ReminderScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for delay in [FIVE_MINUTES, FIVE_MINUTES * 2] {
            let tx = tx.clone();
            assert!(
                scheduler
                    .schedule(
                        "shared",
                        delay,
                        delay,
                        move |delay| async move {
                            let _ = tx.send(delay);
                            Ok(())
                        },
                        false,
                    )
                    .await
            );
        }
        assert_eq!(scheduler.pending_count().await, 2);

        assert_eq!(rx.recv().await, Some(FIVE_MINUTES));
        assert!(scheduler.is_pending("shared").await);
        assert_eq!(rx.recv().await, Some(FIVE_MINUTES * 2));
        assert!(!scheduler.is_pending("shared").await);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_handlers_release_their_key() {
        let scheduler = ReminderScheduler::new();
        scheduler
            .schedule(
                "boom",
                Duration::from_secs(60),
                (),
                |()| async { Err(anyhow::anyhow!("channel deleted")) },
                true,
            )
            .await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(!scheduler.is_pending("boom").await);
    }
}
