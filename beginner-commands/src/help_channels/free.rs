use crate::CommandMeta;
use crate::help_channels::fetch_snapshot;
use crate::utility::embeds::guild_only_message;
use beginner_core::help_channels::HelpLayout;
use beginner_core::{Context, Error};

pub const META: CommandMeta = CommandMeta {
    name: "free",
    desc: "Points you at a help channel nobody is using.",
    category: "help channels",
    usage: "!free",
};

/// Find a free help channel.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Help Channels",
    aliases("free-channel")
)]
pub async fn free(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let channels = fetch_snapshot(ctx.http(), guild_id).await?;
    let free_channel = HelpLayout::resolve(&channels, &ctx.data().community)
        .and_then(|layout| layout.first_available(&channels));

    match free_channel {
        Some(channel_id) => {
            ctx.say(format!(
                "Please use this free channel which is currently not in use:\n<#{channel_id}>"
            ))
            .await?;
        }
        None => {
            ctx.say("There are no free help channels right now.").await?;
        }
    }

    Ok(())
}
