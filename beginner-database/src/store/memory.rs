use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::KudosStore;
use crate::model::kudos::{KudosAccount, KudosEmojiMap, LeaderboardEntry, StreakCounts};

#[derive(Clone, Debug, Default)]
struct MemoryAccount {
    created: u64,
    balance: i64,
    last_active_date: Option<NaiveDate>,
    current_streak: u32,
    best_streak: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_created: u64,
    accounts: HashMap<(u64, u64), MemoryAccount>,
    emoji: HashMap<u64, KudosEmojiMap>,
    ledger_channels: HashMap<u64, u64>,
}

impl MemoryState {
    fn account_mut(&mut self, guild_id: u64, user_id: u64) -> &mut MemoryAccount {
        let next_created = &mut self.next_created;
        self.accounts.entry((guild_id, user_id)).or_insert_with(|| {
            let created = *next_created;
            *next_created += 1;
            MemoryAccount {
                created,
                ..MemoryAccount::default()
            }
        })
    }
}

/// Process-local kudos storage. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryKudosStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryKudosStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KudosStore for MemoryKudosStore {
    async fn account(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<KudosAccount>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&(guild_id, user_id))
            .map(|account| KudosAccount {
                guild_id,
                user_id,
                balance: account.balance,
                last_active_date: account.last_active_date,
                current_streak: account.current_streak,
                best_streak: account.best_streak,
            }))
    }

    async fn balance(&self, guild_id: u64, user_id: u64) -> anyhow::Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&(guild_id, user_id))
            .map_or(0, |account| account.balance))
    }

    async fn credit(&self, guild_id: u64, user_id: u64, amount: i64) -> anyhow::Result<i64> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(guild_id, user_id);
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("kudos balance overflow"))?;
        Ok(account.balance)
    }

    async fn debit(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: i64,
    ) -> anyhow::Result<Option<i64>> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(&(guild_id, user_id)) else {
            return Ok(None);
        };

        if account.balance < amount {
            return Ok(None);
        }

        account.balance -= amount;
        Ok(Some(account.balance))
    }

    async fn set_balance(&self, guild_id: u64, user_id: u64, balance: i64) -> anyhow::Result<()> {
        anyhow::ensure!(balance >= 0, "kudos balance cannot be negative");
        let mut state = self.state.lock().await;
        state.account_mut(guild_id, user_id).balance = balance;
        Ok(())
    }

    async fn leaderboard(&self, guild_id: u64) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let state = self.state.lock().await;
        let mut rows: Vec<(u64, LeaderboardEntry)> = state
            .accounts
            .iter()
            .filter(|((guild, _), _)| *guild == guild_id)
            .map(|((_, user_id), account)| {
                (
                    account.created,
                    LeaderboardEntry {
                        user_id: *user_id,
                        balance: account.balance,
                    },
                )
            })
            .collect();

        rows.sort_by(|left, right| {
            right
                .1
                .balance
                .cmp(&left.1.balance)
                .then_with(|| left.0.cmp(&right.0))
        });

        Ok(rows.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> anyhow::Result<Option<NaiveDate>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&(guild_id, user_id))
            .and_then(|account| account.last_active_date))
    }

    async fn set_last_active_date(
        &self,
        guild_id: u64,
        user_id: u64,
        date: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.account_mut(guild_id, user_id).last_active_date = Some(date);
        Ok(())
    }

    async fn streaks(&self, guild_id: u64, user_id: u64) -> anyhow::Result<StreakCounts> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&(guild_id, user_id))
            .map(|account| StreakCounts {
                current: account.current_streak,
                best: account.best_streak,
            })
            .unwrap_or_default())
    }

    async fn set_streak(
        &self,
        guild_id: u64,
        user_id: u64,
        streak: u32,
    ) -> anyhow::Result<StreakCounts> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(guild_id, user_id);
        account.current_streak = streak;
        account.best_streak = account.best_streak.max(streak);
        Ok(StreakCounts {
            current: account.current_streak,
            best: account.best_streak,
        })
    }

    async fn kudos_emoji(&self, guild_id: u64) -> anyhow::Result<KudosEmojiMap> {
        let state = self.state.lock().await;
        Ok(state.emoji.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn set_kudos_emoji(&self, guild_id: u64, emoji: &KudosEmojiMap) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.emoji.insert(guild_id, emoji.clone());
        Ok(())
    }

    async fn ledger_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        let state = self.state.lock().await;
        Ok(state.ledger_channels.get(&guild_id).copied())
    }

    async fn set_ledger_channel(&self, guild_id: u64, channel_id: u64) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.ledger_channels.insert(guild_id, channel_id);
        Ok(())
    }
}
