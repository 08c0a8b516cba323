/// Delayed deletion of transient bot replies.
pub mod cleanup;
/// Embed colors and small embed builders shared across commands.
pub mod embed;
/// Human-readable formatting helpers.
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;
/// Permission helper utilities.
pub mod permissions;
