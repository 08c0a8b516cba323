mod events;
mod ledger_sink;

use std::sync::{Arc, LazyLock};

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use beginner_core::config::{BotConfig, RedisConfig};
use beginner_core::dispatch::{EventDispatcher, MemberUpdate};
use beginner_core::kudos::KudosLedger;
use beginner_core::onboarding::OnboardingState;
use beginner_core::reminders::ReminderScheduler;
use beginner_core::{Data, Error};
use beginner_database::{CacheService, Database, KudosStore, MIGRATOR, MemoryKudosStore};

use events::BotContext;
use ledger_sink::ChannelLedgerSink;

static LISTENERS: LazyLock<EventDispatcher<BotContext>> = LazyLock::new(events::dispatcher);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        if *metadata.level() > tracing::Level::INFO {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;
    debug!(?config, "configuration loaded");

    let store = connect_store(&config).await?;
    let community = Arc::new(config.community.clone());
    let guild_id = config.guild_id;

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: beginner_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(beginner_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Beginner bot is online.");

                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    serenity::GuildId::new(guild_id),
                )
                .await?;

                let sink = ChannelLedgerSink::new(Arc::clone(&ctx.http), Arc::clone(&store));
                Ok(Data {
                    kudos: KudosLedger::new(store, Arc::new(sink)),
                    onboarding: OnboardingState::new(),
                    reminders: ReminderScheduler::new(),
                    community,
                })
            })
        })
        .build();

    info!(listeners = LISTENERS.len(), "Beginner bot is connecting...");

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

/// Postgres-backed kudos storage when `DATABASE_URL` is set, otherwise an
/// in-memory store that forgets everything on restart.
async fn connect_store(config: &BotConfig) -> anyhow::Result<Arc<dyn KudosStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; kudos are kept in memory and lost on restart.");
        return Ok(Arc::new(MemoryKudosStore::new()));
    };

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    info!("PostgreSQL connection established.");

    let cache = connect_cache(&config.redis).await;
    let db = Database::with_cache(db_pool, cache);

    if config.auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    Ok(Arc::new(db))
}

async fn connect_cache(redis: &RedisConfig) -> CacheService {
    let prefix = redis.key_prefix.clone();
    if !redis.enabled {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(prefix);
    }

    let Some(redis_url) = redis.url.as_deref() else {
        warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
        return CacheService::disabled(prefix);
    };

    let cache = match CacheService::redis(redis_url, prefix.clone()) {
        Ok(cache) => {
            info!(key_prefix = %prefix, "Redis cache enabled.");
            cache
        }
        Err(err) => {
            warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
            return CacheService::disabled(prefix);
        }
    };

    match cache.ping().await {
        Ok(()) => info!("Redis cache health check passed."),
        Err(err) => warn!(
            ?err,
            "Redis cache ping failed; cache operations will continue with fallback behavior."
        ),
    }

    cache
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, command = %ctx.command().qualified_name, "command error");

            let embed = beginner_utils::embed::titled_embed(
                "Command Error",
                "Something went wrong while running this command.",
                beginner_utils::embed::DEFAULT_EMBED_COLOR,
            );

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!("Usage: `!{}`", ctx.command().qualified_name);
            let description = match input {
                Some(input) => format!("Invalid argument: `{input}`\n{usage}"),
                None => format!("Missing required argument.\n{usage}"),
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    let bot = BotContext {
        serenity: ctx.clone(),
        data: data.clone(),
    };

    match event {
        serenity::FullEvent::Ready { .. } => {
            LISTENERS.dispatch_ready(&bot).await;
        }
        serenity::FullEvent::Message { new_message } => {
            LISTENERS.dispatch_message(&bot, new_message).await;
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            LISTENERS.dispatch_reaction_add(&bot, add_reaction).await;
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            new,
            event,
        } => {
            let update = MemberUpdate {
                old: old_if_available.as_ref(),
                new: new.as_ref(),
                event,
            };
            LISTENERS.dispatch_member_update(&bot, &update).await;
        }
        _ => {}
    }

    Ok(())
}
