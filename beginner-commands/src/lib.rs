pub mod help_channels;
pub mod kudos;
pub mod reminders;
pub mod utility;

use beginner_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    kudos::META,
    kudos::leaderboard::META,
    kudos::import::META,
    kudos::ledger::META,
    kudos::emoji::META,
    reminders::remind::META,
    help_channels::free::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        kudos::kudos(),
        reminders::remind::remind(),
        help_channels::free::free(),
    ]
}
