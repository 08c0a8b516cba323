use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

/// How long join events are remembered.
pub const JOIN_HISTORY_RETENTION: TimeDelta = TimeDelta::minutes(10);
/// Window scanned for a join burst.
pub const MASS_JOIN_WINDOW: TimeDelta = TimeDelta::minutes(1);
/// Joins inside [`MASS_JOIN_WINDOW`] that count as a burst.
pub const MASS_JOIN_THRESHOLD: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinEvent {
    pub at: DateTime<Utc>,
    pub user_id: u64,
}

/// Rolling log of recent member activations. Reads drop anything older
/// than the retention window first.
#[derive(Clone, Debug)]
pub struct JoinHistoryWindow {
    retention: TimeDelta,
    events: VecDeque<JoinEvent>,
}

impl Default for JoinHistoryWindow {
    fn default() -> Self {
        Self::new(JOIN_HISTORY_RETENTION)
    }
}

impl JoinHistoryWindow {
    pub fn new(retention: TimeDelta) -> Self {
        Self {
            retention,
            events: VecDeque::new(),
        }
    }

    pub fn add(&mut self, user_id: u64, at: DateTime<Utc>) {
        self.events.push_back(JoinEvent { at, user_id });
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let oldest = now - self.retention;
        self.events.retain(|event| event.at >= oldest);
    }

    /// Events still inside the retention window, oldest first.
    pub fn events(&mut self, now: DateTime<Utc>) -> impl Iterator<Item = &JoinEvent> {
        self.prune(now);
        self.events.iter()
    }

    pub fn count_since(&mut self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> usize {
        self.events(now).filter(|event| event.at >= cutoff).count()
    }

    pub fn under_mass_attack(&mut self, now: DateTime<Utc>) -> bool {
        self.count_since(now - MASS_JOIN_WINDOW, now) >= MASS_JOIN_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::JoinHistoryWindow;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + TimeDelta::seconds(seconds)
    }

    #[test]
    fn four_joins_in_a_minute_is_a_burst() {
        let mut window = JoinHistoryWindow::default();
        for (user_id, offset) in [(1, 0), (2, 10), (3, 30)] {
            window.add(user_id, at(offset));
        }
        assert!(!window.under_mass_attack(at(30)));

        window.add(4, at(59));
        assert!(window.under_mass_attack(at(59)));
    }

    #[test]
    fn spread_out_joins_are_not_a_burst() {
        let mut window = JoinHistoryWindow::default();
        for (user_id, offset) in [(1, 0), (2, 40), (3, 80), (4, 120)] {
            window.add(user_id, at(offset));
        }
        assert!(!window.under_mass_attack(at(120)));
        assert_eq!(window.count_since(at(0), at(120)), 4);
    }

    #[test]
    fn events_expire_after_retention() {
        let mut window = JoinHistoryWindow::default();
        for user_id in 1..=4 {
            window.add(user_id, at(0));
        }
        assert_eq!(window.count_since(at(-60), at(600)), 4);

        assert_eq!(window.count_since(at(-60), at(601)), 0);
        assert_eq!(window.events(at(601)).count(), 0);
        assert!(!window.under_mass_attack(at(601)));
    }
}
