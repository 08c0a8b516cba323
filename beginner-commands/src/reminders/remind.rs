use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::{debug, info};

use crate::CommandMeta;
use beginner_core::reminders::{ReminderPayload, reminder_key};
use beginner_core::{Context, Error};
use beginner_utils::cleanup::send_transient;
use beginner_utils::embed::{BLUE_EMBED_COLOR, author_embed};
use beginner_utils::formatting::format_compact_duration;
use beginner_utils::parse::parse_reminder_duration;

pub const META: CommandMeta = CommandMeta {
    name: "remind",
    desc: "Pings you with a message after a delay.",
    category: "reminders",
    usage: "!remind <123d|123h|123m|123> <message>",
};

/// Set a reminder for yourself.
#[poise::command(
    prefix_command,
    category = "Reminders",
    aliases("remind-me", "remindme")
)]
pub async fn remind(
    ctx: Context<'_>,
    #[description = "Delay such as 2d, 3h, 45m or 45"] duration: String,
    #[description = "What to remind you of"]
    #[rest]
    message: String,
) -> Result<(), Error> {
    let http = Arc::clone(&ctx.serenity_context().http);
    let mention = ctx.author().mention();

    let delay = match parse_reminder_duration(&duration) {
        Ok(delay) => delay,
        Err(source) => {
            debug!(%duration, %source, "rejected reminder duration");
            reply(&http, ctx.channel_id(), format!("{mention} {source}")).await?;
            return Ok(());
        }
    };

    let payload = ReminderPayload {
        content: message,
        message_id: ctx.id(),
        channel_id: ctx.channel_id().get(),
    };

    let handler_http = Arc::clone(&http);
    let scheduled = ctx
        .data()
        .reminders
        .schedule(
            reminder_key(ctx.author().id.get()),
            delay,
            payload,
            move |payload| deliver_reminder(handler_http, payload),
            true,
        )
        .await;

    let text = if scheduled {
        info!(
            user_id = ctx.author().id.get(),
            delay = %format_compact_duration(delay),
            "reminder scheduled"
        );
        format!("{mention} a reminder has been set")
    } else {
        let remaining = ctx
            .data()
            .reminders
            .next_fire_time(&reminder_key(ctx.author().id.get()))
            .await
            .and_then(|fire_at| (fire_at - Utc::now()).to_std().ok());
        duplicate_reminder_text(&mention.to_string(), remaining)
    };
    reply(&http, ctx.channel_id(), text).await?;

    Ok(())
}

fn duplicate_reminder_text(mention: &str, remaining: Option<Duration>) -> String {
    match remaining {
        Some(remaining) => format!(
            "{mention} you already have a reminder scheduled, it fires in {}",
            format_compact_duration(remaining)
        ),
        None => format!("{mention} you already have a reminder scheduled"),
    }
}

async fn reply(
    http: &Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    content: String,
) -> Result<(), Error> {
    send_transient(http, channel_id, serenity::CreateMessage::new().content(content)).await?;
    Ok(())
}

/// Ping the author of the message that set the reminder.
async fn deliver_reminder(http: Arc<serenity::Http>, payload: ReminderPayload) -> anyhow::Result<()> {
    let channel_id = serenity::ChannelId::new(payload.channel_id);
    let message = channel_id
        .message(&http, serenity::MessageId::new(payload.message_id))
        .await?;

    let embed = author_embed("Reminder ⏰", None, payload.content, BLUE_EMBED_COLOR);
    channel_id
        .send_message(
            &http,
            serenity::CreateMessage::new()
                .content(message.author.mention().to_string())
                .embed(embed),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::duplicate_reminder_text;

    #[test]
    fn duplicate_replies_say_when_the_reminder_fires() {
        assert_eq!(
            duplicate_reminder_text("<@1>", Some(Duration::from_secs(90 * 60))),
            "<@1> you already have a reminder scheduled, it fires in 1h 30m"
        );
    }

    #[test]
    fn duplicate_replies_without_a_fire_time_stay_short() {
        assert_eq!(
            duplicate_reminder_text("<@1>", None),
            "<@1> you already have a reminder scheduled"
        );
    }
}
