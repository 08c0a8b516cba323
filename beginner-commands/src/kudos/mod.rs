pub mod embeds;
pub mod emoji;
pub mod import;
pub mod leaderboard;
pub mod ledger;

use poise::serenity_prelude as serenity;
use serenity::Mentionable;

use crate::CommandMeta;
use crate::kudos::embeds::balance_description;
use crate::utility::embeds::guild_only_message;
use beginner_core::{Context, Error};
use beginner_utils::embed::{KUDOS_EMBED_COLOR, titled_embed};
use beginner_utils::permissions::member_has_permission;

use emoji::emoji;
use import::import;
use leaderboard::leaderboard;
use ledger::ledger;

pub const META: CommandMeta = CommandMeta {
    name: "kudos",
    desc: "Shows how many kudos you have to give.",
    category: "kudos",
    usage: "!kudos",
};

/// Show your kudos balance.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Kudos",
    subcommands("leaderboard", "import", "ledger", "emoji")
)]
pub async fn kudos(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let account = ctx
        .data()
        .kudos
        .account(guild_id.get(), ctx.author().id.get())
        .await?;

    let embed = titled_embed(
        "Kudos",
        balance_description(&ctx.author().mention().to_string(), account.as_ref()),
        KUDOS_EMBED_COLOR,
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Guild id of the invocation when the author may manage kudos settings.
///
/// Members without MANAGE_CHANNELS are ignored silently.
pub(crate) async fn kudos_admin_guild(ctx: Context<'_>) -> Result<Option<serenity::GuildId>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(None);
    };

    let allowed = member_has_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_CHANNELS,
    )
    .await?;

    Ok(allowed.then_some(guild_id))
}
