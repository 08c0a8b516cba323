use async_trait::async_trait;
use chrono::NaiveDate;

use super::KudosStore;
use crate::database::Database;
use crate::impls::{kudos, kudos_config};
use crate::model::kudos::{KudosAccount, KudosEmojiMap, LeaderboardEntry, StreakCounts};

#[async_trait]
impl KudosStore for Database {
    async fn account(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<KudosAccount>> {
        kudos::get_account(self, guild_id, user_id).await
    }

    async fn balance(&self, guild_id: u64, user_id: u64) -> anyhow::Result<i64> {
        kudos::get_kudos(self, guild_id, user_id).await
    }

    async fn credit(&self, guild_id: u64, user_id: u64, amount: i64) -> anyhow::Result<i64> {
        kudos::add_kudos(self, guild_id, user_id, amount).await
    }

    async fn debit(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: i64,
    ) -> anyhow::Result<Option<i64>> {
        kudos::remove_kudos(self, guild_id, user_id, amount).await
    }

    async fn set_balance(&self, guild_id: u64, user_id: u64, balance: i64) -> anyhow::Result<()> {
        kudos::set_kudos(self, guild_id, user_id, balance).await
    }

    async fn leaderboard(&self, guild_id: u64) -> anyhow::Result<Vec<LeaderboardEntry>> {
        kudos::get_leaderboard(self, guild_id).await
    }

    async fn last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> anyhow::Result<Option<NaiveDate>> {
        kudos::get_last_active_date(self, guild_id, user_id).await
    }

    async fn set_last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
        date: NaiveDate,
    ) -> anyhow::Result<()> {
        kudos::set_last_active_date(self, guild_id, user_id, date).await
    }

    async fn streaks(&self, guild_id: u64, user_id: u64) -> anyhow::Result<StreakCounts> {
        kudos::get_streaks(self, guild_id, user_id).await
    }

    async fn set_streak(
        &self,
        guild_id: u64,
        user_id: u64,
        streak: u32,
    ) -> anyhow::Result<StreakCounts> {
        kudos::set_streak(self, guild_id, user_id, streak).await
    }

    async fn kudos_emoji(&self, guild_id: u64) -> anyhow::Result<KudosEmojiMap> {
        kudos_config::get_kudos_emoji(self, guild_id).await
    }

    async fn set_kudos_emoji(&self, guild_id: u64, emoji: &KudosEmojiMap) -> anyhow::Result<()> {
        kudos_config::set_kudos_emoji(self, guild_id, emoji).await
    }

    async fn ledger_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        kudos_config::get_ledger_channel_id(self, guild_id).await
    }

    async fn set_ledger_channel(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<()> {
        kudos_config::set_ledger_channel_id(self, guild_id, channel_id).await
    }
}
