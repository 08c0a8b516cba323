use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use beginner_commands::help_channels::fetch_snapshot;
use beginner_core::dispatch::EventListener;
use beginner_core::help_channels::{HelpLayout, RotationPlan};
use beginner_utils::embed::{GREEN_EMBED_COLOR, author_embed};

use super::BotContext;

const AVAILABLE_NOTICE: &str = "Feel free to ask any of your Python related questions in this channel!";

/// Moves help channels between the available and occupied categories as
/// people use them.
pub struct HelpRotatorListener;

async fn execute_plan(
    ctx: &BotContext,
    guild_id: serenity::GuildId,
    plan: RotationPlan,
) -> anyhow::Result<()> {
    let http = ctx.http();

    if let Some(channel_id) = plan.announce {
        let icon_url = ctx
            .serenity
            .cache
            .guild(guild_id)
            .and_then(|guild| guild.icon_url());
        let embed = author_embed(
            "This Channel Is Available",
            icon_url,
            AVAILABLE_NOTICE,
            GREEN_EMBED_COLOR,
        );
        serenity::ChannelId::new(channel_id)
            .send_message(http, serenity::CreateMessage::new().embed(embed))
            .await?;
    }

    for change in plan.moves {
        serenity::ChannelId::new(change.channel_id)
            .edit(
                http,
                serenity::EditChannel::new()
                    .category(Some(serenity::ChannelId::new(change.category_id)))
                    .position(change.position),
            )
            .await?;
        debug!(
            channel_id = change.channel_id,
            category_id = change.category_id,
            position = change.position,
            "moved help channel"
        );
    }

    Ok(())
}

#[async_trait]
impl EventListener<BotContext> for HelpRotatorListener {
    fn name(&self) -> &'static str {
        "help_rotator"
    }

    async fn on_message(&self, ctx: &BotContext, message: &serenity::Message) -> anyhow::Result<()> {
        if message.author.bot {
            return Ok(());
        }
        let Some(guild_id) = message.guild_id else {
            return Ok(());
        };

        let prefix = &ctx.data.community.help_channel_prefix;
        let cached_other_channel = ctx
            .serenity
            .cache
            .channel(message.channel_id)
            .is_some_and(|channel| !channel.name.starts_with(prefix.as_str()));
        if cached_other_channel {
            return Ok(());
        }

        let channels = fetch_snapshot(ctx.http(), guild_id).await?;
        let Some(layout) = HelpLayout::resolve(&channels, &ctx.data.community) else {
            debug!(guild_id = guild_id.get(), "help categories not found");
            return Ok(());
        };
        let Some(plan) = layout.plan_rotation(message.channel_id.get(), &channels) else {
            return Ok(());
        };

        if let Some(freed) = plan.announce {
            info!(
                claimed = message.channel_id.get(),
                freed, "rotating help channels"
            );
        }
        execute_plan(ctx, guild_id, plan).await
    }
}
