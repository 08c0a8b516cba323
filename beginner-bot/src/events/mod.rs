pub mod help_rotator;
pub mod kudos;
pub mod onboarding;

use std::sync::Arc;

use poise::serenity_prelude as serenity;

use beginner_core::Data;
use beginner_core::dispatch::EventDispatcher;

/// What every listener gets for one event.
#[derive(Clone)]
pub struct BotContext {
    pub serenity: serenity::Context,
    pub data: Data,
}

impl BotContext {
    pub fn http(&self) -> &Arc<serenity::Http> {
        &self.serenity.http
    }
}

/// Listeners in the order they see each event.
pub fn dispatcher() -> EventDispatcher<BotContext> {
    EventDispatcher::new()
        .register(kudos::KudosListener)
        .register(onboarding::OnboardingListener)
        .register(help_rotator::HelpRotatorListener)
}
