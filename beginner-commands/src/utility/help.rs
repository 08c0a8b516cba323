use crate::utility::embeds::{grouped_help_description, unknown_category_message};
use crate::{COMMANDS, CommandMeta};
use beginner_core::{Context, Error};
use beginner_utils::embed::{DEFAULT_EMBED_COLOR, titled_embed};

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Only show this category"]
    #[rest]
    category: Option<String>,
) -> Result<(), Error> {
    let category = category
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_ascii_lowercase);

    let mut categories: Vec<&str> = COMMANDS.iter().map(|command| command.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted) = category.as_deref()
        && !categories.contains(&wanted)
    {
        ctx.say(unknown_category_message(wanted, &categories)).await?;
        return Ok(());
    }

    let commands = sorted_commands(category.as_deref());
    let embed = titled_embed(
        "Available Commands",
        grouped_help_description(&commands),
        DEFAULT_EMBED_COLOR,
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut filtered: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|command| category.is_none_or(|wanted| command.category == wanted))
        .collect();

    filtered.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    filtered
}

#[cfg(test)]
mod tests {
    use super::sorted_commands;

    #[test]
    fn filters_and_sorts_by_category_then_name() {
        let kudos = sorted_commands(Some("kudos"));
        let names: Vec<_> = kudos.iter().map(|command| command.name).collect();
        assert_eq!(
            names,
            vec![
                "kudos",
                "kudos emoji",
                "kudos import",
                "kudos leaderboard",
                "kudos ledger",
            ]
        );

        let all = sorted_commands(None);
        assert!(all.windows(2).all(|pair| pair[0].category <= pair[1].category));
    }
}
