use std::time::Duration;

/// `1 week`, `3 weeks`.
pub fn pluralize(count: u64, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Balance as shown to members; an empty balance reads as "no kudos".
pub fn kudos_amount(balance: i64) -> String {
    if balance > 0 {
        format!("{balance} kudos")
    } else {
        "no kudos".to_owned()
    }
}

/// Format a delay at minute precision (e.g. 1m, 2h, 1d 3h, 1h 30m).
pub fn format_compact_duration(duration: Duration) -> String {
    let total_minutes = duration.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0m".to_owned()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{format_compact_duration, kudos_amount, pluralize};

    #[test]
    fn pluralizes_words() {
        assert_eq!(pluralize(1, "week"), "1 week");
        assert_eq!(pluralize(2, "week"), "2 weeks");
        assert_eq!(pluralize(0, "week"), "0 weeks");
    }

    #[test]
    fn empty_balances_read_as_no_kudos() {
        assert_eq!(kudos_amount(0), "no kudos");
        assert_eq!(kudos_amount(12), "12 kudos");
    }

    #[test]
    fn compact_duration_formatting() {
        assert_eq!(format_compact_duration(Duration::from_secs(59)), "0m");
        assert_eq!(format_compact_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_compact_duration(Duration::from_secs(5_400)), "1h 30m");
        assert_eq!(format_compact_duration(Duration::from_secs(86_400)), "1d");
        assert_eq!(format_compact_duration(Duration::from_secs(93_660)), "1d 2h 1m");
    }
}
