use poise::serenity_prelude as serenity;

/// Kudos announcements and leaderboards.
pub const KUDOS_EMBED_COLOR: u32 = 0x42_85_F4;
/// Reminders.
pub const BLUE_EMBED_COLOR: u32 = 0x00_66_FF;
/// "This channel is available" notices.
pub const GREEN_EMBED_COLOR: u32 = 0x00_CC_66;
/// Generic replies and errors.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_55_30;

/// Build a titled embed in the given color.
pub fn titled_embed(
    title: impl Into<String>,
    description: impl Into<String>,
    color: u32,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(color)
}

/// Build an embed whose heading is rendered as the author line, optionally
/// with an icon.
pub fn author_embed(
    author: impl Into<String>,
    icon_url: Option<String>,
    description: impl Into<String>,
    color: u32,
) -> serenity::CreateEmbed {
    let mut author = serenity::CreateEmbedAuthor::new(author);
    if let Some(url) = icon_url {
        author = author.icon_url(url);
    }

    serenity::CreateEmbed::new()
        .author(author)
        .description(description)
        .color(color)
}
