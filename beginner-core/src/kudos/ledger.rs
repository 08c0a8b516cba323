use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use async_trait::async_trait;
use beginner_database::KudosStore;
use beginner_database::model::kudos::{
    KudosAccount, KudosEmojiMap, LeaderboardEntry, StreakCounts,
};
use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use super::streak::{StreakAward, evaluate_streak};

#[derive(Debug, Error)]
pub enum KudosError {
    #[error("cannot spend {requested} kudos, only {available} available")]
    InsufficientFunds { requested: i64, available: i64 },
    #[error("kudos amounts must be positive, got {0}")]
    InvalidAmount(i64),
    #[error("members cannot give kudos to themselves")]
    SelfTransfer,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A single balance change, handed to the [`LedgerSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub guild_id: u64,
    pub user_id: u64,
    pub delta: i64,
    pub balance: i64,
    pub reason: Option<String>,
}

/// Where balance changes are announced. Announcing is best effort: an error
/// here never undoes the change it describes.
#[async_trait]
pub trait LedgerSink: Send + Sync + Debug {
    async fn record(&self, entry: &LedgerEntry) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub giver_balance: i64,
    pub receiver_balance: i64,
}

type AccountKey = (u64, u64);
type LockMap = Arc<SyncMutex<HashMap<AccountKey, Arc<Mutex<()>>>>>;

/// Holds one account's lock. Dropping the last handle on an account removes
/// its entry from the lock map.
struct AccountGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: AccountKey,
    locks: LockMap,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Handles are only cloned under the map lock, so a count of one here
        // means nobody holds or waits on this account.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Kudos balances, streaks and guild kudos settings.
///
/// Read-modify-write sequences on an account run under that account's lock,
/// so concurrent events for the same member cannot interleave.
#[derive(Clone, Debug)]
pub struct KudosLedger {
    store: Arc<dyn KudosStore>,
    sink: Arc<dyn LedgerSink>,
    locks: LockMap,
}

impl KudosLedger {
    pub fn new(store: Arc<dyn KudosStore>, sink: Arc<dyn LedgerSink>) -> Self {
        Self {
            store,
            sink,
            locks: Arc::default(),
        }
    }

    async fn lock_account(&self, key: AccountKey) -> AccountGuard {
        // Created first so a cancelled wait still prunes the entry.
        let mut handle = AccountGuard {
            guard: None,
            key,
            locks: Arc::clone(&self.locks),
        };
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };

        handle.guard = Some(lock.lock_owned().await);
        handle
    }

    /// Accounts with a live lock handle.
    #[cfg(test)]
    fn locked_accounts(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn announce(&self, entry: LedgerEntry) {
        if let Err(source) = self.sink.record(&entry).await {
            warn!(
                ?source,
                guild_id = entry.guild_id,
                user_id = entry.user_id,
                delta = entry.delta,
                "failed to announce kudos ledger entry"
            );
        }
    }

    pub async fn get(&self, guild_id: u64, user_id: u64) -> Result<i64, KudosError> {
        Ok(self.store.balance(guild_id, user_id).await?)
    }

    pub async fn account(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<KudosAccount>, KudosError> {
        Ok(self.store.account(guild_id, user_id).await?)
    }

    /// Credit `amount` kudos and announce it with `reason`.
    pub async fn give(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: i64,
        reason: impl Into<String>,
    ) -> Result<i64, KudosError> {
        if amount <= 0 {
            return Err(KudosError::InvalidAmount(amount));
        }

        let balance = {
            let _guard = self.lock_account((guild_id, user_id)).await;
            self.store.credit(guild_id, user_id, amount).await?
        };

        self.announce(LedgerEntry {
            guild_id,
            user_id,
            delta: amount,
            balance,
            reason: Some(reason.into()),
        })
        .await;

        Ok(balance)
    }

    /// Debit `amount` kudos. Fails without touching the balance when it does
    /// not cover `amount`.
    pub async fn take(&self, guild_id: u64, user_id: u64, amount: i64) -> Result<i64, KudosError> {
        if amount <= 0 {
            return Err(KudosError::InvalidAmount(amount));
        }

        let balance = {
            let _guard = self.lock_account((guild_id, user_id)).await;
            self.debit_locked(guild_id, user_id, amount).await?
        };

        self.announce(LedgerEntry {
            guild_id,
            user_id,
            delta: -amount,
            balance,
            reason: None,
        })
        .await;

        Ok(balance)
    }

    async fn debit_locked(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: i64,
    ) -> Result<i64, KudosError> {
        match self.store.debit(guild_id, user_id, amount).await? {
            Some(balance) => Ok(balance),
            None => Err(KudosError::InsufficientFunds {
                requested: amount,
                available: self.store.balance(guild_id, user_id).await?,
            }),
        }
    }

    /// Administrative overwrite used by bulk imports. Not announced.
    pub async fn set(&self, guild_id: u64, user_id: u64, amount: i64) -> Result<(), KudosError> {
        if amount < 0 {
            return Err(KudosError::InvalidAmount(amount));
        }

        let _guard = self.lock_account((guild_id, user_id)).await;
        self.store.set_balance(guild_id, user_id, amount).await?;
        Ok(())
    }

    /// Move kudos from `giver` to `receiver`.
    ///
    /// The giver is debited first, so an uncovered transfer changes nothing.
    pub async fn transfer(
        &self,
        guild_id: u64,
        giver_id: u64,
        receiver_id: u64,
        amount: i64,
        reason: impl Into<String>,
    ) -> Result<TransferReceipt, KudosError> {
        if amount <= 0 {
            return Err(KudosError::InvalidAmount(amount));
        }
        if giver_id == receiver_id {
            return Err(KudosError::SelfTransfer);
        }

        let receipt = {
            // Fixed order so two opposing transfers cannot deadlock.
            let (first, second) = if giver_id < receiver_id {
                (giver_id, receiver_id)
            } else {
                (receiver_id, giver_id)
            };
            let _first = self.lock_account((guild_id, first)).await;
            let _second = self.lock_account((guild_id, second)).await;

            let giver_balance = self.debit_locked(guild_id, giver_id, amount).await?;
            let receiver_balance = match self.store.credit(guild_id, receiver_id, amount).await {
                Ok(balance) => balance,
                Err(source) => {
                    if let Err(refund) = self.store.credit(guild_id, giver_id, amount).await {
                        error!(
                            ?refund,
                            guild_id, giver_id, amount, "failed to refund kudos after a failed transfer"
                        );
                    }
                    return Err(source.into());
                }
            };

            TransferReceipt {
                giver_balance,
                receiver_balance,
            }
        };

        self.announce(LedgerEntry {
            guild_id,
            user_id: receiver_id,
            delta: amount,
            balance: receipt.receiver_balance,
            reason: Some(reason.into()),
        })
        .await;
        self.announce(LedgerEntry {
            guild_id,
            user_id: giver_id,
            delta: -amount,
            balance: receipt.giver_balance,
            reason: None,
        })
        .await;

        Ok(receipt)
    }

    /// Credit the daily activity bonus for a message sent on `today`.
    ///
    /// The last active date is moved to `today` before the bonus is worked
    /// out, so duplicate events on the same day award nothing.
    pub async fn record_daily_activity(
        &self,
        guild_id: u64,
        user_id: u64,
        mention: &str,
        today: NaiveDate,
    ) -> Result<Option<StreakAward>, KudosError> {
        let (award, balance) = {
            let _guard = self.lock_account((guild_id, user_id)).await;

            let last_active = self.store.last_active_date(guild_id, user_id).await?;
            if last_active == Some(today) {
                return Ok(None);
            }

            self.store
                .set_last_active_date(guild_id, user_id, today)
                .await?;
            let streaks = self.store.streaks(guild_id, user_id).await?;

            let Some(award) = evaluate_streak(last_active, today, streaks) else {
                return Ok(None);
            };

            if let Some(streak) = award.streak {
                self.store.set_streak(guild_id, user_id, streak).await?;
            }
            let balance = self.store.credit(guild_id, user_id, award.kudos).await?;
            (award, balance)
        };

        debug!(guild_id, user_id, kudos = award.kudos, streak = ?award.streak, "daily kudos awarded");

        self.announce(LedgerEntry {
            guild_id,
            user_id,
            delta: award.kudos,
            balance,
            reason: Some(award.reason(mention)),
        })
        .await;

        Ok(Some(award))
    }

    pub async fn leaderboard(&self, guild_id: u64) -> Result<Vec<LeaderboardEntry>, KudosError> {
        Ok(self.store.leaderboard(guild_id).await?)
    }

    pub async fn last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<NaiveDate>, KudosError> {
        Ok(self.store.last_active_date(guild_id, user_id).await?)
    }

    pub async fn set_last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<(), KudosError> {
        let _guard = self.lock_account((guild_id, user_id)).await;
        Ok(self
            .store
            .set_last_active_date(guild_id, user_id, date)
            .await?)
    }

    pub async fn streaks(&self, guild_id: u64, user_id: u64) -> Result<StreakCounts, KudosError> {
        Ok(self.store.streaks(guild_id, user_id).await?)
    }

    pub async fn set_streak(
        &self,
        guild_id: u64,
        user_id: u64,
        streak: u32,
    ) -> Result<StreakCounts, KudosError> {
        let _guard = self.lock_account((guild_id, user_id)).await;
        Ok(self.store.set_streak(guild_id, user_id, streak).await?)
    }

    pub async fn kudos_emoji(&self, guild_id: u64) -> Result<KudosEmojiMap, KudosError> {
        Ok(self.store.kudos_emoji(guild_id).await?)
    }

    pub async fn set_kudos_emoji(
        &self,
        guild_id: u64,
        emoji: &KudosEmojiMap,
    ) -> Result<(), KudosError> {
        Ok(self.store.set_kudos_emoji(guild_id, emoji).await?)
    }

    pub async fn ledger_channel(&self, guild_id: u64) -> Result<Option<u64>, KudosError> {
        Ok(self.store.ledger_channel(guild_id).await?)
    }

    pub async fn set_ledger_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<(), KudosError> {
        Ok(self.store.set_ledger_channel(guild_id, channel_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use beginner_database::MemoryKudosStore;
    use chrono::{Days, NaiveDate};
    use tokio::sync::Mutex;

    use super::{KudosError, KudosLedger, LedgerEntry, LedgerSink, TransferReceipt};

    const GUILD: u64 = 10;

    #[derive(Debug, Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LedgerEntry>>,
    }

    #[async_trait]
    impl LedgerSink for RecordingSink {
        async fn record(&self, entry: &LedgerEntry) -> anyhow::Result<()> {
            self.entries.lock().await.push(entry.clone());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingSink;

    #[async_trait]
    impl LedgerSink for FailingSink {
        async fn record(&self, _entry: &LedgerEntry) -> anyhow::Result<()> {
            anyhow::bail!("ledger channel unreachable")
        }
    }

    fn ledger() -> (KudosLedger, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let ledger = KudosLedger::new(Arc::new(MemoryKudosStore::new()), sink.clone());
        (ledger, sink)
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn gives_accumulate_and_rank_on_the_leaderboard() {
        let (ledger, sink) = ledger();
        ledger.give(GUILD, 2, 14, "seed").await.unwrap();
        assert_eq!(ledger.give(GUILD, 1, 10, "x").await.unwrap(), 10);
        assert_eq!(ledger.give(GUILD, 1, 5, "y").await.unwrap(), 15);

        let board = ledger.leaderboard(GUILD).await.unwrap();
        assert_eq!(board[0].user_id, 1);
        assert_eq!(board[0].balance, 15);
        assert_eq!(board[1].user_id, 2);

        let entries = sink.entries.lock().await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].reason.as_deref(), Some("y"));
        assert_eq!(entries[2].balance, 15);
    }

    #[tokio::test]
    async fn take_never_overdraws() {
        let (ledger, sink) = ledger();
        ledger.give(GUILD, 1, 3, "seed").await.unwrap();

        let err = ledger.take(GUILD, 1, 4).await.unwrap_err();
        assert!(matches!(
            err,
            KudosError::InsufficientFunds {
                requested: 4,
                available: 3
            }
        ));
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 3);
        assert_eq!(sink.entries.lock().await.len(), 1);

        assert_eq!(ledger.take(GUILD, 1, 3).await.unwrap(), 0);
        assert!(matches!(
            ledger.take(GUILD, 1, 1).await.unwrap_err(),
            KudosError::InsufficientFunds { available: 0, .. }
        ));
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let (ledger, _sink) = ledger();
        assert!(matches!(
            ledger.give(GUILD, 1, 0, "nothing").await.unwrap_err(),
            KudosError::InvalidAmount(0)
        ));
        assert!(matches!(
            ledger.take(GUILD, 1, -5).await.unwrap_err(),
            KudosError::InvalidAmount(-5)
        ));
        assert!(matches!(
            ledger.set(GUILD, 1, -1).await.unwrap_err(),
            KudosError::InvalidAmount(-1)
        ));
    }

    #[tokio::test]
    async fn sink_failures_do_not_roll_back() {
        let ledger = KudosLedger::new(Arc::new(MemoryKudosStore::new()), Arc::new(FailingSink));
        assert_eq!(ledger.give(GUILD, 1, 8, "x").await.unwrap(), 8);
        assert_eq!(ledger.take(GUILD, 1, 2).await.unwrap(), 6);
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn transfer_moves_kudos_between_members() {
        let (ledger, sink) = ledger();
        ledger.set(GUILD, 1, 20).await.unwrap();

        let receipt = ledger
            .transfer(GUILD, 1, 2, 8, "<@1> gave <@2> kudos")
            .await
            .unwrap();
        assert_eq!(
            receipt,
            TransferReceipt {
                giver_balance: 12,
                receiver_balance: 8,
            }
        );

        let entries = sink.entries.lock().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, 2);
        assert_eq!(entries[0].delta, 8);
        assert_eq!(entries[1].user_id, 1);
        assert_eq!(entries[1].delta, -8);
    }

    #[tokio::test]
    async fn uncovered_transfer_changes_nothing() {
        let (ledger, sink) = ledger();
        ledger.set(GUILD, 1, 5).await.unwrap();

        assert!(matches!(
            ledger.transfer(GUILD, 1, 2, 6, "too much").await.unwrap_err(),
            KudosError::InsufficientFunds {
                requested: 6,
                available: 5
            }
        ));
        assert!(matches!(
            ledger.transfer(GUILD, 1, 1, 1, "self").await.unwrap_err(),
            KudosError::SelfTransfer
        ));
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 5);
        assert_eq!(ledger.get(GUILD, 2).await.unwrap(), 0);
        assert!(sink.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_transfers_keep_balances_non_negative() {
        let (ledger, _sink) = ledger();
        ledger.set(GUILD, 1, 10).await.unwrap();

        let mut handles = Vec::new();
        for receiver in 2..22 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.transfer(GUILD, 1, receiver, 1, "burst").await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn daily_activity_follows_the_streak_policy() {
        let (ledger, sink) = ledger();
        let day0 = start();

        let award = ledger
            .record_daily_activity(GUILD, 1, "<@1>", day0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(award.kudos, 32);
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 32);
        assert_eq!(ledger.streaks(GUILD, 1).await.unwrap().current, 1);

        assert!(
            ledger
                .record_daily_activity(GUILD, 1, "<@1>", day0)
                .await
                .unwrap()
                .is_none()
        );

        let day1 = day0 + Days::new(1);
        let award = ledger
            .record_daily_activity(GUILD, 1, "<@1>", day1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(award.kudos, 4);
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 36);
        assert_eq!(ledger.streaks(GUILD, 1).await.unwrap().current, 2);

        for offset in 2..7 {
            ledger
                .record_daily_activity(GUILD, 1, "<@1>", day0 + Days::new(offset))
                .await
                .unwrap();
        }

        let streaks = ledger.streaks(GUILD, 1).await.unwrap();
        assert_eq!((streaks.current, streaks.best), (7, 7));
        // 32 + 5 * 4 + 16 for the seventh day
        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 68);
        assert_eq!(
            ledger.last_active_date(GUILD, 1).await.unwrap(),
            Some(day0 + Days::new(6))
        );

        let entries = sink.entries.lock().await;
        assert_eq!(
            entries.last().and_then(|entry| entry.reason.as_deref()),
            Some("<@1> has messaged every day for 1 week!")
        );
    }

    #[tokio::test]
    async fn daily_activity_after_a_gap_keeps_streak() {
        let (ledger, _sink) = ledger();
        ledger.set_streak(GUILD, 1, 3).await.unwrap();
        ledger.set_last_active_date(GUILD, 1, start()).await.unwrap();

        let award = ledger
            .record_daily_activity(GUILD, 1, "<@1>", start() + Days::new(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(award.kudos, 4);
        assert_eq!(award.streak, None);

        let streaks = ledger.streaks(GUILD, 1).await.unwrap();
        assert_eq!((streaks.current, streaks.best), (3, 3));
    }

    #[tokio::test]
    async fn account_reports_balance_and_streak() {
        let (ledger, _sink) = ledger();
        assert!(ledger.account(GUILD, 1).await.unwrap().is_none());

        ledger
            .record_daily_activity(GUILD, 1, "<@1>", start())
            .await
            .unwrap();

        let account = ledger.account(GUILD, 1).await.unwrap().unwrap();
        assert_eq!(account.balance, 32);
        assert_eq!(account.current_streak, 1);
        assert_eq!(account.last_active_date, Some(start()));
    }

    #[tokio::test]
    async fn account_locks_are_released_after_use() {
        let (ledger, _sink) = ledger();
        for user_id in 0..500 {
            ledger.give(GUILD, user_id, 1, "one-off").await.unwrap();
        }
        ledger.transfer(GUILD, 1, 2, 1, "pass it on").await.unwrap();
        ledger.take(GUILD, 3, 1).await.unwrap();
        ledger
            .record_daily_activity(GUILD, 4, "<@4>", start())
            .await
            .unwrap();
        assert_eq!(ledger.locked_accounts(), 0);
    }

    #[tokio::test]
    async fn concurrent_gives_share_one_lock_and_still_release_it() {
        let (ledger, _sink) = ledger();
        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.give(GUILD, 1, 2, "burst").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(ledger.get(GUILD, 1).await.unwrap(), 100);
        assert_eq!(ledger.locked_accounts(), 0);
    }

    #[tokio::test]
    async fn guild_settings_round_trip_through_the_store() {
        let (ledger, _sink) = ledger();
        assert_eq!(ledger.ledger_channel(GUILD).await.unwrap(), None);
        ledger.set_ledger_channel(GUILD, 77).await.unwrap();
        assert_eq!(ledger.ledger_channel(GUILD).await.unwrap(), Some(77));

        let emoji = beginner_database::model::kudos::KudosEmojiMap::from_pairs([("star", 2)]);
        ledger.set_kudos_emoji(GUILD, &emoji).await.unwrap();
        assert_eq!(ledger.kudos_emoji(GUILD).await.unwrap().get("star"), Some(2));
    }
}
