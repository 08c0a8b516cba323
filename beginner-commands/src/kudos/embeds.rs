use poise::serenity_prelude as serenity;

use beginner_database::model::kudos::{KudosAccount, KudosEmojiMap};
use beginner_utils::embed::KUDOS_EMBED_COLOR;
use beginner_utils::formatting::{kudos_amount, pluralize};

pub const LEADERBOARD_SIZE: usize = 5;
pub const NO_KUDOS_EMOJI_MESSAGE: &str = "*No kudos emoji are set*";
pub const LEDGER_CHANNEL_GREETING: &str = "This is now the Kudos Ledger!";
const OLD_MEMBER: &str = "*Old Member*";

/// Balance line for `!kudos`, plus the daily streak once there is one.
pub fn balance_description(mention: &str, account: Option<&KudosAccount>) -> String {
    let balance = account.map_or(0, |account| account.balance);
    let mut description = format!("{mention} you have {}", kudos_amount(balance));
    if let Some(account) = account.filter(|account| account.current_streak > 0) {
        description.push_str(&format!(
            "\nStreak: {} (best {})",
            pluralize(u64::from(account.current_streak), "day"),
            pluralize(u64::from(account.best_streak), "day")
        ));
    }
    description
}

/// Show a kudos emoji by name, using the guild's custom emoji when one
/// matches.
pub fn display_emoji(guild_emojis: &[serenity::Emoji], name: &str) -> String {
    guild_emojis
        .iter()
        .find(|emoji| emoji.name == name)
        .map(ToString::to_string)
        .unwrap_or_else(|| name.to_owned())
}

/// One `<emoji> <points>` line per kudos emoji, cheapest first.
pub fn emoji_listing(map: &KudosEmojiMap, render: impl Fn(&str) -> String) -> String {
    map.iter_by_points()
        .into_iter()
        .map(|(name, points)| format!("{} {}", render(name), points))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn kudos_info_embed(
    map: &KudosEmojiMap,
    render: impl Fn(&str) -> String,
) -> serenity::CreateEmbed {
    let lines = map
        .iter_by_points()
        .into_iter()
        .map(|(name, points)| format!("{} {} kudos", render(name), points))
        .collect::<Vec<_>>()
        .join("\n");

    serenity::CreateEmbed::new()
        .title("Kudos")
        .description(format!(
            "You can give people kudos by reacting to their message with these emoji:\n{lines}\n\
             You can also earn kudos by sending one message every day (UTC) and maintaining that streak."
        ))
        .color(KUDOS_EMBED_COLOR)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// `None` once the member has left the guild.
    pub display_name: Option<String>,
    pub balance: i64,
    pub is_invoker: bool,
}

pub fn leaderboard_lines(rows: &[LeaderboardRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let name = row.display_name.as_deref().unwrap_or(OLD_MEMBER);
            let entry = format!("{}. {} has {} kudos", index + 1, name, row.balance);
            if row.is_invoker {
                format!("**{entry}**")
            } else {
                entry
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn leaderboard_embed(
    invoker_mention: &str,
    invoker_balance: i64,
    rows: &[LeaderboardRow],
) -> serenity::CreateEmbed {
    let board = if rows.is_empty() {
        "Nobody has any kudos yet.".to_owned()
    } else {
        leaderboard_lines(rows)
    };

    serenity::CreateEmbed::new()
        .title("Kudos Leaderboard")
        .description(format!(
            "{invoker_mention} you have {}",
            kudos_amount(invoker_balance)
        ))
        .field("Leader Board", board, false)
        .color(KUDOS_EMBED_COLOR)
}

#[cfg(test)]
mod tests {
    use beginner_database::model::kudos::{KudosAccount, KudosEmojiMap};

    use super::{LeaderboardRow, balance_description, emoji_listing, leaderboard_lines};

    fn account(balance: i64, current_streak: u32, best_streak: u32) -> KudosAccount {
        KudosAccount {
            guild_id: 1,
            user_id: 2,
            balance,
            last_active_date: None,
            current_streak,
            best_streak,
        }
    }

    #[test]
    fn balance_shows_the_streak_once_started() {
        assert_eq!(
            balance_description("<@2>", Some(&account(40, 3, 8))),
            "<@2> you have 40 kudos\nStreak: 3 days (best 8 days)"
        );
        assert_eq!(
            balance_description("<@2>", Some(&account(40, 0, 8))),
            "<@2> you have 40 kudos"
        );
    }

    #[test]
    fn unknown_members_have_no_kudos() {
        assert_eq!(balance_description("<@2>", None), "<@2> you have no kudos");
    }

    #[test]
    fn listing_is_ordered_by_points() {
        let map = KudosEmojiMap::from_pairs([("expert", 16), ("star", 2), ("heart", 4)]);
        let listing = emoji_listing(&map, |name| format!(":{name}:"));
        assert_eq!(listing, ":star: 2\n:heart: 4\n:expert: 16");
    }

    #[test]
    fn leaderboard_bolds_the_invoker_and_hides_departed_names() {
        let rows = vec![
            LeaderboardRow {
                display_name: Some("Ada".to_owned()),
                balance: 40,
                is_invoker: false,
            },
            LeaderboardRow {
                display_name: None,
                balance: 30,
                is_invoker: false,
            },
            LeaderboardRow {
                display_name: Some("Grace".to_owned()),
                balance: 12,
                is_invoker: true,
            },
        ];

        assert_eq!(
            leaderboard_lines(&rows),
            "1. Ada has 40 kudos\n2. *Old Member* has 30 kudos\n**3. Grace has 12 kudos**"
        );
    }
}
