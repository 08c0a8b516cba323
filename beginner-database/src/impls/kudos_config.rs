use anyhow::Context as _;
use sqlx::types::Json;

use crate::cache::{CONFIG_CACHE_TTL, invalidate_kudos_config, kudos_emoji_key, ledger_channel_key};
use crate::database::Database;
use crate::model::kudos::KudosEmojiMap;

pub async fn get_kudos_emoji(db: &Database, guild_id: u64) -> anyhow::Result<KudosEmojiMap> {
    let cache_key = kudos_emoji_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let emoji: Option<Json<KudosEmojiMap>> =
                sqlx::query_scalar("SELECT emoji FROM kudos_guild_config WHERE guild_id = $1")
                    .bind(guild_id_i64)
                    .fetch_optional(db.pool())
                    .await?;

            Ok(emoji.map(|Json(map)| map).unwrap_or_default())
        })
        .await
}

pub async fn set_kudos_emoji(
    db: &Database,
    guild_id: u64,
    emoji: &KudosEmojiMap,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO kudos_guild_config (guild_id, emoji)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET emoji = EXCLUDED.emoji",
    )
    .bind(guild_id_i64)
    .bind(Json(emoji))
    .execute(db.pool())
    .await?;

    invalidate_kudos_config(db.cache(), guild_id).await?;

    Ok(())
}

pub async fn get_ledger_channel_id(db: &Database, guild_id: u64) -> anyhow::Result<Option<u64>> {
    let cache_key = ledger_channel_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let channel_id: Option<i64> = sqlx::query_scalar(
                "SELECT ledger_channel_id FROM kudos_guild_config WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?
            .flatten();

            channel_id
                .map(u64::try_from)
                .transpose()
                .context("ledger_channel_id out of u64 range")
        })
        .await
}

pub async fn set_ledger_channel_id(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = i64::try_from(channel_id).context("channel_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO kudos_guild_config (guild_id, ledger_channel_id)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET ledger_channel_id = EXCLUDED.ledger_channel_id",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .execute(db.pool())
    .await?;

    invalidate_kudos_config(db.cache(), guild_id).await?;

    Ok(())
}
