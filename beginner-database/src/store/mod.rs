mod memory;
mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::kudos::{KudosAccount, KudosEmojiMap, LeaderboardEntry, StreakCounts};

pub use memory::MemoryKudosStore;

/// Persistence seam for the kudos ledger.
///
/// Every method is a single atomic step; the ledger layers per-account
/// locking on top for multi-step sequences. Implementations must never let a
/// balance go below zero: `debit` refuses instead.
#[async_trait]
pub trait KudosStore: Send + Sync + Debug {
    async fn account(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<KudosAccount>>;

    /// Current balance, `0` for members without an account.
    async fn balance(&self, guild_id: u64, user_id: u64) -> anyhow::Result<i64>;

    /// Add to a balance and return the new total.
    async fn credit(&self, guild_id: u64, user_id: u64, amount: i64) -> anyhow::Result<i64>;

    /// Subtract from a balance when it covers `amount`; `Ok(None)` otherwise.
    async fn debit(&self, guild_id: u64, user_id: u64, amount: i64)
    -> anyhow::Result<Option<i64>>;

    async fn set_balance(&self, guild_id: u64, user_id: u64, balance: i64) -> anyhow::Result<()>;

    async fn leaderboard(&self, guild_id: u64) -> anyhow::Result<Vec<LeaderboardEntry>>;

    async fn last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> anyhow::Result<Option<NaiveDate>>;

    async fn set_last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
        date: NaiveDate,
    ) -> anyhow::Result<()>;

    async fn streaks(&self, guild_id: u64, user_id: u64) -> anyhow::Result<StreakCounts>;

    /// Set the current streak, raising the best streak when exceeded.
    async fn set_streak(
        &self,
        guild_id: u64,
        user_id: u64,
        streak: u32,
    ) -> anyhow::Result<StreakCounts>;

    async fn kudos_emoji(&self, guild_id: u64) -> anyhow::Result<KudosEmojiMap>;

    async fn set_kudos_emoji(&self, guild_id: u64, emoji: &KudosEmojiMap) -> anyhow::Result<()>;

    async fn ledger_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>>;

    async fn set_ledger_channel(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<()>;
}
