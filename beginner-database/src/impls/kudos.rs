use anyhow::Context as _;
use chrono::NaiveDate;

use crate::database::Database;
use crate::model::kudos::{KudosAccount, LeaderboardEntry, StreakCounts};

#[derive(sqlx::FromRow)]
struct AccountRow {
    balance: i64,
    last_active_date: Option<NaiveDate>,
    current_streak: i32,
    best_streak: i32,
}

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    user_id: i64,
    balance: i64,
}

fn account_key(guild_id: u64, user_id: u64) -> anyhow::Result<(i64, i64)> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;
    Ok((guild_id_i64, user_id_i64))
}

fn streak_counts(current: i32, best: i32) -> anyhow::Result<StreakCounts> {
    Ok(StreakCounts {
        current: u32::try_from(current).context("current_streak out of u32 range")?,
        best: u32::try_from(best).context("best_streak out of u32 range")?,
    })
}

pub async fn get_account(
    db: &Database,
    guild_id: u64,
    user_id: u64,
) -> anyhow::Result<Option<KudosAccount>> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let row: Option<AccountRow> = sqlx::query_as(
        "SELECT balance, last_active_date, current_streak, best_streak
         FROM kudos_accounts
         WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    row.map(|row| {
        let streaks = streak_counts(row.current_streak, row.best_streak)?;
        Ok(KudosAccount {
            guild_id,
            user_id,
            balance: row.balance,
            last_active_date: row.last_active_date,
            current_streak: streaks.current,
            best_streak: streaks.best,
        })
    })
    .transpose()
}

pub async fn get_kudos(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<i64> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let balance: Option<i64> = sqlx::query_scalar(
        "SELECT balance FROM kudos_accounts WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    Ok(balance.unwrap_or(0))
}

/// Add `amount` to a balance, creating the account on first touch.
pub async fn add_kudos(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    amount: i64,
) -> anyhow::Result<i64> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let balance: i64 = sqlx::query_scalar(
        "INSERT INTO kudos_accounts (guild_id, user_id, balance)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, user_id)
         DO UPDATE SET balance = kudos_accounts.balance + EXCLUDED.balance
         RETURNING balance",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(amount)
    .fetch_one(db.pool())
    .await?;

    Ok(balance)
}

/// Subtract `amount` only when the balance covers it. Returns `None` and
/// leaves the row untouched otherwise.
pub async fn remove_kudos(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    amount: i64,
) -> anyhow::Result<Option<i64>> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let balance: Option<i64> = sqlx::query_scalar(
        "UPDATE kudos_accounts
         SET balance = balance - $3
         WHERE guild_id = $1 AND user_id = $2 AND balance >= $3
         RETURNING balance",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(amount)
    .fetch_optional(db.pool())
    .await?;

    Ok(balance)
}

pub async fn set_kudos(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    balance: i64,
) -> anyhow::Result<()> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    sqlx::query(
        "INSERT INTO kudos_accounts (guild_id, user_id, balance)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, user_id) DO UPDATE SET balance = EXCLUDED.balance",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(balance)
    .execute(db.pool())
    .await?;

    Ok(())
}

/// All accounts of a guild, highest balance first. Ties keep account
/// creation order.
pub async fn get_leaderboard(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        "SELECT user_id, balance
         FROM kudos_accounts
         WHERE guild_id = $1
         ORDER BY balance DESC, id ASC",
    )
    .bind(guild_id_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(LeaderboardEntry {
                user_id: u64::try_from(row.user_id).context("user_id row out of u64 range")?,
                balance: row.balance,
            })
        })
        .collect()
}

pub async fn get_last_active_date(
    db: &Database,
    guild_id: u64,
    user_id: u64,
) -> anyhow::Result<Option<NaiveDate>> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let date: Option<NaiveDate> = sqlx::query_scalar(
        "SELECT last_active_date FROM kudos_accounts WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?
    .flatten();

    Ok(date)
}

pub async fn set_last_active_date(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    date: NaiveDate,
) -> anyhow::Result<()> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    sqlx::query(
        "INSERT INTO kudos_accounts (guild_id, user_id, last_active_date)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, user_id)
         DO UPDATE SET last_active_date = EXCLUDED.last_active_date",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(date)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn get_streaks(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<StreakCounts> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;

    let row: Option<(i32, i32)> = sqlx::query_as(
        "SELECT current_streak, best_streak
         FROM kudos_accounts
         WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    match row {
        Some((current, best)) => streak_counts(current, best),
        None => Ok(StreakCounts::default()),
    }
}

/// Overwrite the current streak and raise the best streak to match it.
pub async fn set_streak(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    streak: u32,
) -> anyhow::Result<StreakCounts> {
    let (guild_id_i64, user_id_i64) = account_key(guild_id, user_id)?;
    let streak_i32 = i32::try_from(streak).context("streak out of i32 range")?;

    let (current, best): (i32, i32) = sqlx::query_as(
        "INSERT INTO kudos_accounts (guild_id, user_id, current_streak, best_streak)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (guild_id, user_id)
         DO UPDATE SET current_streak = EXCLUDED.current_streak,
                       best_streak = GREATEST(kudos_accounts.best_streak, EXCLUDED.current_streak)
         RETURNING current_streak, best_streak",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(streak_i32)
    .fetch_one(db.pool())
    .await?;

    streak_counts(current, best)
}
