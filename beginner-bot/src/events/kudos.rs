use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::Mentionable;
use tracing::{debug, info};

use beginner_commands::kudos::embeds::{display_emoji, kudos_info_embed};
use beginner_core::dispatch::EventListener;
use beginner_core::kudos::KudosError;
use beginner_utils::cleanup::send_transient;

use super::BotContext;

/// Kudos info on startup, reaction transfers and the daily message bonus.
pub struct KudosListener;

/// The name kudos emoji are keyed by.
fn reaction_emoji_name(emoji: &serenity::ReactionType) -> Option<&str> {
    match emoji {
        serenity::ReactionType::Custom { name, .. } => name.as_deref(),
        serenity::ReactionType::Unicode(value) => Some(value.as_str()),
        _ => None,
    }
}

/// Givers who lost send access to a channel may still thank people in the
/// help archive.
fn giver_may_react(can_send: bool, in_archive: bool) -> bool {
    can_send || in_archive
}

/// Bots, self reactions and members who already left get nothing.
fn skip_receiver(author_is_bot: bool, self_reaction: bool, author_in_guild: bool) -> bool {
    author_is_bot || self_reaction || !author_in_guild
}

fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

/// Category id of the help archive, read from the cache.
fn archive_category(ctx: &BotContext, guild_id: serenity::GuildId) -> Option<serenity::ChannelId> {
    let name = &ctx.data.community.help_archive_category;
    let guild = ctx.serenity.cache.guild(guild_id)?;
    guild
        .channels
        .values()
        .find(|channel| channel.kind == serenity::ChannelType::Category && &channel.name == name)
        .map(|channel| channel.id)
}

#[async_trait]
impl EventListener<BotContext> for KudosListener {
    fn name(&self) -> &'static str {
        "kudos"
    }

    async fn on_ready(&self, ctx: &BotContext) -> anyhow::Result<()> {
        let Some(channel_id) = ctx.data.community.kudos_info_channel_id else {
            return Ok(());
        };

        let channel_id = serenity::ChannelId::new(channel_id);
        let Some(channel) = channel_id.to_channel(ctx.http()).await?.guild() else {
            debug!(channel_id = channel_id.get(), "kudos info channel is not a guild channel");
            return Ok(());
        };

        let map = ctx.data.kudos.kudos_emoji(channel.guild_id.get()).await?;
        let guild_emojis = channel.guild_id.emojis(ctx.http()).await?;

        let mut embed = kudos_info_embed(&map, |name| display_emoji(&guild_emojis, name));
        if let Some(expert) = guild_emojis.iter().find(|emoji| emoji.name == "expert") {
            embed = embed.thumbnail(expert.url());
        }

        channel_id
            .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
            .await?;
        info!(channel_id = channel_id.get(), "posted kudos info");
        Ok(())
    }

    async fn on_reaction_add(
        &self,
        ctx: &BotContext,
        reaction: &serenity::Reaction,
    ) -> anyhow::Result<()> {
        let Some(guild_id) = reaction.guild_id else {
            return Ok(());
        };

        let giver = match &reaction.member {
            Some(member) => member.user.clone(),
            None => reaction.user(&ctx.serenity).await?,
        };
        if giver.bot {
            return Ok(());
        }

        let Some(emoji) = reaction_emoji_name(&reaction.emoji) else {
            return Ok(());
        };
        let Some(points) = ctx.data.kudos.kudos_emoji(guild_id.get()).await?.get(emoji) else {
            return Ok(());
        };
        if points <= 0 {
            return Ok(());
        }

        let Some(channel) = reaction.channel_id.to_channel(&ctx.serenity).await?.guild() else {
            return Ok(());
        };
        let can_send = match channel.permissions_for_user(&ctx.serenity.cache, giver.id) {
            Ok(permissions) => permissions.send_messages(),
            Err(source) => {
                debug!(?source, channel_id = channel.id.get(), "permissions not cached, allowing reaction");
                true
            }
        };
        let in_archive = channel.parent_id.is_some()
            && channel.parent_id == archive_category(ctx, guild_id);
        if !giver_may_react(can_send, in_archive) {
            return Ok(());
        }

        let message = reaction.message(&ctx.serenity).await?;
        let receiver = match guild_id.member(ctx.http(), message.author.id).await {
            Ok(member) => Some(member),
            Err(source) if is_not_found(&source) => None,
            Err(source) => return Err(source.into()),
        };
        if skip_receiver(
            message.author.bot,
            message.author.id == giver.id,
            receiver.is_some(),
        ) {
            return Ok(());
        }
        let receiver_name = receiver
            .as_ref()
            .map_or_else(|| message.author.display_name(), |member| member.display_name())
            .to_owned();

        let reason = format!("{} gave {} kudos", giver.mention(), message.author.mention());
        let receipt = match ctx
            .data
            .kudos
            .transfer(
                guild_id.get(),
                giver.id.get(),
                message.author.id.get(),
                points,
                reason,
            )
            .await
        {
            Ok(receipt) => receipt,
            Err(KudosError::InsufficientFunds {
                requested,
                available,
            }) => {
                send_transient(
                    ctx.http(),
                    reaction.channel_id,
                    serenity::CreateMessage::new().content(format!(
                        "{} you can't give {requested} kudos, you only have {available}",
                        giver.mention()
                    )),
                )
                .await?;
                return Ok(());
            }
            Err(source) => return Err(source.into()),
        };

        send_transient(
            ctx.http(),
            reaction.channel_id,
            serenity::CreateMessage::new()
                .content(format!(
                    "{} you gave {receiver_name} {points} kudos, you have {} left to give.",
                    giver.mention(),
                    receipt.giver_balance
                ))
                .reference_message(&message)
                .allowed_mentions(
                    serenity::CreateAllowedMentions::new()
                        .all_users(true)
                        .replied_user(false),
                ),
        )
        .await?;
        Ok(())
    }

    async fn on_message(&self, ctx: &BotContext, message: &serenity::Message) -> anyhow::Result<()> {
        if message.author.bot {
            return Ok(());
        }
        let Some(guild_id) = message.guild_id else {
            return Ok(());
        };
        if message.member.as_ref().is_some_and(|member| member.pending) {
            return Ok(());
        }

        let award = ctx
            .data
            .kudos
            .record_daily_activity(
                guild_id.get(),
                message.author.id.get(),
                &message.author.mention().to_string(),
                Utc::now().date_naive(),
            )
            .await?;

        if let Some(award) = award {
            debug!(
                user_id = message.author.id.get(),
                kudos = award.kudos,
                streak = ?award.streak,
                "daily kudos awarded"
            );
        }
        Ok(())
    }
}
