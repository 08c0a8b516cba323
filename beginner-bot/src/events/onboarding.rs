use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use rand::prelude::*;
use serenity::Mentionable;
use tracing::{debug, info, warn};

use beginner_core::config::CommunityConfig;
use beginner_core::dispatch::{EventListener, MemberUpdate};
use beginner_core::onboarding::{WELCOME_MESSAGES, completed_screening, render_welcome};

use super::BotContext;

const MEMBER_PAGE_SIZE: u64 = 1000;
const WELCOME_SCAN_PAUSE: Duration = Duration::from_secs(1);

/// Welcomes members once they pass membership screening and watches for
/// join bursts.
pub struct OnboardingListener;

/// Members that passed screening but never got the member role, usually
/// because the bot was offline at the time.
fn needs_welcome(member: &serenity::Member) -> bool {
    !member.user.bot && !member.pending && member.roles.is_empty()
}

fn random_welcome(mention: &str) -> String {
    let template = WELCOME_MESSAGES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Welcome {}!!!");
    render_welcome(template, mention)
}

async fn find_channel(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    name: &str,
) -> anyhow::Result<Option<serenity::ChannelId>> {
    let channels = guild_id.channels(http).await?;
    Ok(channels
        .values()
        .find(|channel| channel.name == name)
        .map(|channel| channel.id))
}

async fn find_role(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    name: &str,
) -> anyhow::Result<Option<serenity::RoleId>> {
    let roles = guild_id.roles(http).await?;
    Ok(roles
        .values()
        .find(|role| role.name == name)
        .map(|role| role.id))
}

async fn notify_staff(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    config: &CommunityConfig,
    content: String,
) -> anyhow::Result<()> {
    let Some(staff) = find_channel(http, guild_id, &config.staff_channel).await? else {
        warn!(guild_id = guild_id.get(), channel = %config.staff_channel, "staff channel not found");
        return Ok(());
    };
    staff.say(http, content).await?;
    Ok(())
}

async fn welcome_member(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    config: &CommunityConfig,
) -> anyhow::Result<()> {
    debug!(guild_id = guild_id.get(), user_id = user_id.get(), "welcoming member");

    let mut message = random_welcome(&user_id.mention().to_string());
    let emojis = guild_id.emojis(http).await?;
    if let Some(wave) = emojis.iter().find(|emoji| emoji.name == config.welcome_emoji) {
        message = format!("{wave} {message}");
    }

    match find_channel(http, guild_id, &config.welcome_channel).await? {
        Some(channel) => {
            channel.say(http, message).await?;
        }
        None => {
            warn!(guild_id = guild_id.get(), channel = %config.welcome_channel, "welcome channel not found");
        }
    }

    match find_role(http, guild_id, &config.member_role).await? {
        Some(role) => {
            http.add_member_role(guild_id, user_id, role, Some("Completed membership screening"))
                .await?;
        }
        None => {
            warn!(guild_id = guild_id.get(), role = %config.member_role, "member role not found");
        }
    }

    Ok(())
}

async fn unwelcomed_members(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
) -> anyhow::Result<Vec<serenity::UserId>> {
    let mut found = Vec::new();
    let mut after = None;

    loop {
        let page = guild_id.members(http, Some(MEMBER_PAGE_SIZE), after).await?;
        found.extend(
            page.iter()
                .filter(|member| needs_welcome(member))
                .map(|member| member.user.id),
        );

        match page.last() {
            Some(last) if page.len() as u64 == MEMBER_PAGE_SIZE => after = Some(last.user.id),
            _ => break,
        }
    }

    Ok(found)
}

/// Welcomes each member in turn, pausing between them. A failed welcome is
/// logged and the rest still go out. Returns how many succeeded.
async fn welcome_each<F, Fut>(members: Vec<serenity::UserId>, mut welcome: F) -> usize
where
    F: FnMut(serenity::UserId) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut welcomed = 0;
    for user_id in members {
        match welcome(user_id).await {
            Ok(()) => welcomed += 1,
            Err(source) => warn!(?source, user_id = user_id.get(), "failed to welcome member"),
        }
        tokio::time::sleep(WELCOME_SCAN_PAUSE).await;
    }
    welcomed
}

#[async_trait]
impl EventListener<BotContext> for OnboardingListener {
    fn name(&self) -> &'static str {
        "onboarding"
    }

    async fn on_ready(&self, ctx: &BotContext) -> anyhow::Result<()> {
        let http = ctx.http();
        let config = &ctx.data.community;

        for guild in http.get_guilds(None, None).await? {
            debug!(guild_id = guild.id.get(), "scanning for unwelcomed members");
            let members = unwelcomed_members(http, guild.id).await?;
            if members.is_empty() {
                debug!(guild_id = guild.id.get(), "all members have been welcomed");
                continue;
            }

            info!(guild_id = guild.id.get(), count = members.len(), "welcoming members missed while offline");
            notify_staff(
                http,
                guild.id,
                config,
                format!(
                    "I just restarted and found {} who accepted the rules while I was away. I'll welcome them now.",
                    members.len()
                ),
            )
            .await?;

            let total = members.len();
            let welcomed = welcome_each(members, |user_id| {
                welcome_member(http, guild.id, user_id, config)
            })
            .await;
            info!(guild_id = guild.id.get(), welcomed, total, "finished welcoming missed members");
        }

        Ok(())
    }

    async fn on_member_update(&self, ctx: &BotContext, update: &MemberUpdate<'_>) -> anyhow::Result<()> {
        let event = update.event;
        if !completed_screening(update.old.map(|member| member.pending), event.pending) {
            return Ok(());
        }

        let http = ctx.http();
        let config = &ctx.data.community;
        let outcome = ctx
            .data
            .onboarding
            .register_join(event.guild_id.get(), event.user.id.get(), Utc::now())
            .await;

        if outcome.mass_join_detected {
            warn!(guild_id = event.guild_id.get(), "possible mass join, pausing welcome messages");
            let mods = match find_role(http, event.guild_id, &config.mod_role).await? {
                Some(role) => role.mention().to_string(),
                None => format!("@{}", config.mod_role),
            };
            notify_staff(
                http,
                event.guild_id,
                config,
                format!("{mods} We may be experiencing a mass join attack. Disabling welcome messages for 5 minutes."),
            )
            .await?;
        }

        if outcome.welcome {
            welcome_member(http, event.guild_id, event.user.id, config).await?;
        } else {
            let since = ctx.data.onboarding.welcome_suppressed_since(event.guild_id.get()).await;
            debug!(
                guild_id = event.guild_id.get(),
                user_id = event.user.id.get(),
                ?since,
                "welcome skipped during join burst cooldown"
            );
        }

        Ok(())
    }
}
