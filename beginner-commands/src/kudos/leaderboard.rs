use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::debug;

use crate::CommandMeta;
use crate::kudos::embeds::{LEADERBOARD_SIZE, LeaderboardRow, leaderboard_embed};
use crate::utility::embeds::guild_only_message;
use beginner_core::{Context, Error};

pub const META: CommandMeta = CommandMeta {
    name: "kudos leaderboard",
    desc: "Shows the members with the most kudos.",
    category: "kudos",
    usage: "!kudos leaderboard",
};

/// Show the kudos leaderboard.
#[poise::command(prefix_command, slash_command, category = "Kudos")]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let ledger = &ctx.data().kudos;
    let author_id = ctx.author().id;
    let leaders = ledger.leaderboard(guild_id.get()).await?;
    let invoker_balance = ledger.get(guild_id.get(), author_id.get()).await?;

    let mut rows = Vec::with_capacity(LEADERBOARD_SIZE);
    for entry in leaders.into_iter().take(LEADERBOARD_SIZE) {
        let user_id = serenity::UserId::new(entry.user_id);
        let display_name = match guild_id.member(ctx.http(), user_id).await {
            Ok(member) => Some(member.display_name().to_owned()),
            Err(source) => {
                debug!(?source, user_id = entry.user_id, "leaderboard member not found");
                None
            }
        };

        rows.push(LeaderboardRow {
            display_name,
            balance: entry.balance,
            is_invoker: user_id == author_id,
        });
    }

    let embed = leaderboard_embed(&ctx.author().mention().to_string(), invoker_balance, &rows);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
