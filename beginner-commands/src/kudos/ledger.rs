use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::kudos::embeds::LEDGER_CHANNEL_GREETING;
use crate::kudos::kudos_admin_guild;
use beginner_core::{Context, Error};
use beginner_utils::parse::parse_channel_id;

pub const META: CommandMeta = CommandMeta {
    name: "kudos ledger",
    desc: "Sets the channel where kudos changes are announced.",
    category: "kudos",
    usage: "!kudos ledger <#channel>",
};

/// Set the kudos ledger channel.
#[poise::command(prefix_command, slash_command, category = "Kudos")]
pub async fn ledger(
    ctx: Context<'_>,
    #[description = "Channel mention or id"] channel: String,
) -> Result<(), Error> {
    let Some(guild_id) = kudos_admin_guild(ctx).await? else {
        return Ok(());
    };

    let Some(channel_id) = parse_channel_id(&channel) else {
        ctx.say("Provide a valid channel mention or id.").await?;
        return Ok(());
    };

    ctx.data()
        .kudos
        .set_ledger_channel(guild_id.get(), channel_id)
        .await?;
    info!(guild_id = guild_id.get(), channel_id, "kudos ledger channel set");

    serenity::ChannelId::new(channel_id)
        .say(ctx.http(), LEDGER_CHANNEL_GREETING)
        .await?;
    Ok(())
}
