pub mod free;

use poise::serenity_prelude as serenity;

use beginner_core::help_channels::{ChannelKind, ChannelSnapshot};

/// Snapshot a guild's channels for rotation planning.
pub fn snapshot_channels<'a>(
    channels: impl IntoIterator<Item = &'a serenity::GuildChannel>,
) -> Vec<ChannelSnapshot> {
    channels
        .into_iter()
        .map(|channel| ChannelSnapshot {
            id: channel.id.get(),
            name: channel.name.clone(),
            kind: match channel.kind {
                serenity::ChannelType::Text => ChannelKind::Text,
                serenity::ChannelType::Category => ChannelKind::Category,
                _ => ChannelKind::Other,
            },
            parent_id: channel.parent_id.map(|parent| parent.get()),
            position: channel.position,
        })
        .collect()
}

/// Current channels of a guild, fetched over HTTP.
pub async fn fetch_snapshot(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
) -> serenity::Result<Vec<ChannelSnapshot>> {
    let channels = guild_id.channels(http).await?;
    Ok(snapshot_channels(channels.values()))
}
