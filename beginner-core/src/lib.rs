pub mod config;
pub mod dispatch;
pub mod help_channels;
pub mod kudos;
pub mod onboarding;
pub mod reminders;

use std::sync::Arc;

use config::CommunityConfig;
use kudos::KudosLedger;
use onboarding::OnboardingState;
use reminders::ReminderScheduler;

pub type Error = anyhow::Error;

/// State shared by every command and event listener.
#[derive(Clone, Debug)]
pub struct Data {
    pub kudos: KudosLedger,
    pub onboarding: OnboardingState,
    pub reminders: ReminderScheduler,
    pub community: Arc<CommunityConfig>,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
