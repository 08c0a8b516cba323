use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::kudos::kudos_admin_guild;
use beginner_core::kudos::{ImportOutcome, import_balances};
use beginner_core::{Context, Error};
use beginner_utils::parse::parse_kudos_import;

pub const META: CommandMeta = CommandMeta {
    name: "kudos import",
    desc: "Sets balances from an attached file of `userId,points` lines.",
    category: "kudos",
    usage: "!kudos import <file>",
};

const MESSAGE_LIMIT: usize = 1900;

/// Import kudos balances from a file.
#[poise::command(prefix_command, slash_command, category = "Kudos")]
pub async fn import(
    ctx: Context<'_>,
    #[description = "File of userId,points lines"] file: serenity::Attachment,
) -> Result<(), Error> {
    let Some(guild_id) = kudos_admin_guild(ctx).await? else {
        return Ok(());
    };

    let contents = file.download().await?;
    let lines = parse_kudos_import(&String::from_utf8_lossy(&contents));

    let http = ctx.http();
    let outcomes = import_balances(&ctx.data().kudos, guild_id.get(), lines, |user_id| async move {
        match guild_id.member(http, serenity::UserId::new(user_id)).await {
            Ok(member) => Ok(Some(member.display_name().to_owned())),
            Err(serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)))
                if response.status_code.as_u16() == 404 =>
            {
                Ok(None)
            }
            Err(source) => Err(source.into()),
        }
    })
    .await?;

    info!(
        guild_id = guild_id.get(),
        lines = outcomes.len(),
        "kudos import finished"
    );

    for chunk in chunk_lines(outcomes.iter().filter_map(report_line)) {
        ctx.say(chunk).await?;
    }

    Ok(())
}

fn report_line(outcome: &ImportOutcome) -> Option<String> {
    match outcome {
        ImportOutcome::Imported {
            display_name,
            points,
            ..
        } => Some(format!("{display_name} now has {points} kudos")),
        ImportOutcome::Departed { user_id, points } => Some(format!(
            "{user_id} is no longer a member, they had {points} kudos"
        )),
        ImportOutcome::Unresolved { user_id, points } => Some(format!(
            "Could not look up {user_id}, skipped {points} kudos"
        )),
        ImportOutcome::Malformed { .. } => None,
    }
}

/// Join report lines into messages that fit under Discord's length limit.
fn chunk_lines(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in lines {
        if !current.is_empty() && current.len() + line.len() + 1 > MESSAGE_LIMIT {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
