use std::time::Duration;

use thiserror::Error;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("durations must be of the format `123d`, `123h`, or `123m`/`123`")]
    InvalidDurationFormat,
    #[error("cannot set a reminder for less than a minute")]
    DurationTooShort,
}

/// Parse a reminder delay: `<N>d`, `<N>h`, `<N>m` or a bare `<N>` in minutes.
///
/// Only a single unit is accepted. Anything under one minute is rejected.
pub fn parse_reminder_duration(raw: &str) -> Result<Duration, DurationError> {
    let value = raw.trim();
    let Some(last) = value.chars().last() else {
        return Err(DurationError::InvalidDurationFormat);
    };

    let (digits, unit_seconds) = match last.to_ascii_lowercase() {
        'd' => (&value[..value.len() - 1], SECONDS_PER_DAY),
        'h' => (&value[..value.len() - 1], SECONDS_PER_HOUR),
        'm' => (&value[..value.len() - 1], SECONDS_PER_MINUTE),
        _ if value.bytes().all(|byte| byte.is_ascii_digit()) => (value, SECONDS_PER_MINUTE),
        _ => return Err(DurationError::InvalidDurationFormat),
    };

    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(DurationError::InvalidDurationFormat);
    }

    let amount = digits
        .parse::<u64>()
        .map_err(|_| DurationError::InvalidDurationFormat)?;
    let seconds = amount
        .checked_mul(unit_seconds)
        .ok_or(DurationError::InvalidDurationFormat)?;

    if seconds < SECONDS_PER_MINUTE {
        return Err(DurationError::DurationTooShort);
    }

    Ok(Duration::from_secs(seconds))
}

/// Accept a raw channel id or a `<#id>` mention.
pub fn parse_channel_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }

    raw.strip_prefix("<#")?.strip_suffix('>')?.parse::<u64>().ok()
}

/// Reduce an emoji token to the name kudos are keyed by.
///
/// Custom emoji arrive as `<:name:id>` or `<a:name:id>`; unicode emoji and
/// plain names are returned unchanged.
pub fn emoji_name(token: &str) -> &str {
    let Some(inner) = token.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) else {
        return token;
    };

    let mut parts = inner.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("" | "a"), Some(name), Some(id))
            if !name.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            name
        }
        _ => token,
    }
}

/// Parse `<emoji> <points>` pairs such as `:star: 2 <:expert:123> 16`.
///
/// Tokens that do not form a pair are skipped.
pub fn parse_kudos_emoji_pairs(input: &str) -> Vec<(String, i64)> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let mut pairs = Vec::new();
    let mut index = 0;

    while index + 1 < tokens.len() {
        if let Ok(points) = tokens[index + 1].parse::<i64>()
            && points >= 0
        {
            pairs.push((emoji_name(tokens[index]).to_owned(), points));
            index += 2;
        } else {
            index += 1;
        }
    }

    pairs
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportLine {
    Entry { user_id: u64, points: i64 },
    Malformed(String),
}

/// Split a kudos import file into `userId,points` entries.
///
/// Blank lines are ignored; anything else that does not parse, including
/// negative points, is returned as [`ImportLine::Malformed`].
pub fn parse_kudos_import(contents: &str) -> Vec<ImportLine> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parsed = line.split_once(',').and_then(|(user_id, points)| {
                let user_id = user_id.trim().parse::<u64>().ok()?;
                let points = points.trim().parse::<i64>().ok().filter(|p| *p >= 0)?;
                Some(ImportLine::Entry { user_id, points })
            });
            parsed.unwrap_or_else(|| ImportLine::Malformed(line.to_owned()))
        })
        .collect()
}
