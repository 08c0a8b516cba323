use crate::CommandMeta;

pub fn guild_only_message() -> &'static str {
    "This command only works inside a server."
}

pub fn unknown_category_message(wanted: &str, valid: &[&str]) -> String {
    let valid = valid
        .iter()
        .map(|category| title_case(category))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Unknown category: {}\nValid categories: {valid}",
        title_case(wanted)
    )
}

/// Commands grouped under bold category headings, one `usage`: description
/// line per command.
pub fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut out = String::new();
    let mut heading: Option<&str> = None;

    for command in commands {
        if heading != Some(command.category) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("**{}**\n", title_case(command.category)));
            heading = Some(command.category);
        }

        out.push_str(&format!("`{}`: {}\n", command.usage, command.desc));
    }

    if out.is_empty() {
        return "No commands available.".to_owned();
    }

    out.trim_end().to_owned()
}

/// `help channels` -> `Help Channels`.
fn title_case(category: &str) -> String {
    category
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
