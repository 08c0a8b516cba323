use crate::CommandMeta;
use crate::kudos::embeds::{NO_KUDOS_EMOJI_MESSAGE, display_emoji, emoji_listing};
use crate::kudos::kudos_admin_guild;
use crate::utility::embeds::guild_only_message;
use beginner_core::{Context, Error};
use beginner_database::model::kudos::KudosEmojiMap;
use beginner_utils::parse::parse_kudos_emoji_pairs;

pub const META: CommandMeta = CommandMeta {
    name: "kudos emoji",
    desc: "Shows the kudos emoji, or sets them from emoji/point pairs.",
    category: "kudos",
    usage: "!kudos emoji [<emoji> <points>]...",
};

/// Show or set the kudos emoji.
#[poise::command(prefix_command, slash_command, category = "Kudos")]
pub async fn emoji(
    ctx: Context<'_>,
    #[description = "Emoji and point pairs, e.g. ⭐ 2 <:expert:123> 16"]
    #[rest]
    pairs: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let pairs = pairs
        .as_deref()
        .map(parse_kudos_emoji_pairs)
        .filter(|pairs| !pairs.is_empty());

    if let Some(pairs) = pairs {
        if kudos_admin_guild(ctx).await?.is_none() {
            return Ok(());
        }

        let map = KudosEmojiMap::from_pairs(pairs);
        ctx.data()
            .kudos
            .set_kudos_emoji(guild_id.get(), &map)
            .await?;

        let guild_emojis = guild_id.emojis(ctx.http()).await.unwrap_or_default();
        let listing = emoji_listing(&map, |name| display_emoji(&guild_emojis, name));
        ctx.say(format!("Set kudos emoji\n{listing}")).await?;
        return Ok(());
    }

    let map = ctx.data().kudos.kudos_emoji(guild_id.get()).await?;
    if map.is_empty() {
        ctx.say(NO_KUDOS_EMOJI_MESSAGE).await?;
        return Ok(());
    }

    let guild_emojis = guild_id.emojis(ctx.http()).await.unwrap_or_default();
    ctx.say(emoji_listing(&map, |name| display_emoji(&guild_emojis, name)))
        .await?;
    Ok(())
}
