//! Fan-out of gateway events to the bot's feature listeners.
//!
//! The dispatcher is generic over the context handed to listeners so the
//! binary can bundle the serenity context with [`crate::Data`] without this
//! crate depending on a live gateway.

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{debug, error};

/// A guild member update together with the cached member from before it.
#[derive(Clone, Copy, Debug)]
pub struct MemberUpdate<'a> {
    pub old: Option<&'a serenity::Member>,
    pub new: Option<&'a serenity::Member>,
    pub event: &'a serenity::GuildMemberUpdateEvent,
}

/// One feature's reaction to gateway events. Every hook defaults to a no-op.
#[async_trait]
pub trait EventListener<C: Sync + ?Sized>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_ready(&self, _ctx: &C) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_message(&self, _ctx: &C, _message: &serenity::Message) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_reaction_add(
        &self,
        _ctx: &C,
        _reaction: &serenity::Reaction,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_member_update(&self, _ctx: &C, _update: &MemberUpdate<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Invokes listeners in registration order. A failing listener is logged and
/// the remaining listeners still run.
pub struct EventDispatcher<C: Sync + ?Sized> {
    listeners: Vec<Box<dyn EventListener<C>>>,
}

impl<C: Sync + ?Sized> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<C: Sync + ?Sized> EventDispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, listener: impl EventListener<C> + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn report(listener: &dyn EventListener<C>, event: &'static str, result: anyhow::Result<()>) {
        if let Err(source) = result {
            error!(listener = listener.name(), event, ?source, "event listener failed");
        }
    }

    pub async fn dispatch_ready(&self, ctx: &C) {
        for listener in &self.listeners {
            Self::report(listener.as_ref(), "ready", listener.on_ready(ctx).await);
        }
    }

    pub async fn dispatch_message(&self, ctx: &C, message: &serenity::Message) {
        for listener in &self.listeners {
            Self::report(
                listener.as_ref(),
                "message",
                listener.on_message(ctx, message).await,
            );
        }
    }

    pub async fn dispatch_reaction_add(&self, ctx: &C, reaction: &serenity::Reaction) {
        for listener in &self.listeners {
            Self::report(
                listener.as_ref(),
                "reaction_add",
                listener.on_reaction_add(ctx, reaction).await,
            );
        }
    }

    pub async fn dispatch_member_update(&self, ctx: &C, update: &MemberUpdate<'_>) {
        debug!(
            user_id = update.event.user.id.get(),
            has_old = update.old.is_some(),
            "dispatching member update"
        );
        for listener in &self.listeners {
            Self::report(
                listener.as_ref(),
                "member_update",
                listener.on_member_update(ctx, update).await,
            );
        }
    }
}
