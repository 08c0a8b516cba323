use beginner_database::model::kudos::StreakCounts;
use beginner_utils::formatting::pluralize;
use chrono::NaiveDate;

/// Awarded for a member's first ever credited message.
pub const FIRST_TIME_BONUS: i64 = 32;
/// Awarded for the first message of each UTC day.
pub const DAILY_MESSAGE_BONUS: i64 = 4;
/// Replaces the daily bonus when a streak reaches a multiple of seven days.
pub const WEEKLY_STREAK_BONUS: i64 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreakAwardKind {
    FirstMessage,
    DailyMessage,
    WeeklyStreak { weeks: u32 },
}

/// Outcome of a member's first message on a new day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakAward {
    pub kind: StreakAwardKind,
    pub kudos: i64,
    /// New current streak, when the streak changes.
    pub streak: Option<u32>,
}

impl StreakAward {
    /// Ledger reason line for this award.
    pub fn reason(&self, mention: &str) -> String {
        match self.kind {
            StreakAwardKind::FirstMessage => format!("{mention} has joined the server!!!"),
            StreakAwardKind::DailyMessage => {
                format!("{mention} has sent their first message of the day!")
            }
            StreakAwardKind::WeeklyStreak { weeks } => format!(
                "{mention} has messaged every day for {}!",
                pluralize(u64::from(weeks), "week")
            ),
        }
    }
}

/// Decide the daily activity bonus.
///
/// Returns `None` when the member was already credited `today`. A gap of more
/// than a day (or a date going backwards) still earns the daily bonus but
/// leaves the streak untouched.
pub fn evaluate_streak(
    last_active: Option<NaiveDate>,
    today: NaiveDate,
    streaks: StreakCounts,
) -> Option<StreakAward> {
    if last_active == Some(today) {
        return None;
    }

    if streaks.best == 0 {
        return Some(StreakAward {
            kind: StreakAwardKind::FirstMessage,
            kudos: FIRST_TIME_BONUS,
            streak: Some(1),
        });
    }

    let continues = last_active
        .and_then(|date| date.succ_opt())
        .is_some_and(|next| next == today);
    if !continues {
        return Some(StreakAward {
            kind: StreakAwardKind::DailyMessage,
            kudos: DAILY_MESSAGE_BONUS,
            streak: None,
        });
    }

    let streak = streaks.current.saturating_add(1);
    let award = if streak % 7 == 0 {
        StreakAward {
            kind: StreakAwardKind::WeeklyStreak { weeks: streak / 7 },
            kudos: WEEKLY_STREAK_BONUS,
            streak: Some(streak),
        }
    } else {
        StreakAward {
            kind: StreakAwardKind::DailyMessage,
            kudos: DAILY_MESSAGE_BONUS,
            streak: Some(streak),
        }
    };

    Some(award)
}

#[cfg(test)]
mod tests {
    use beginner_database::model::kudos::StreakCounts;
    use chrono::NaiveDate;

    use super::{
        DAILY_MESSAGE_BONUS, FIRST_TIME_BONUS, StreakAward, StreakAwardKind, WEEKLY_STREAK_BONUS,
        evaluate_streak,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn counts(current: u32, best: u32) -> StreakCounts {
        StreakCounts { current, best }
    }

    #[test]
    fn same_day_is_a_no_op() {
        assert_eq!(evaluate_streak(Some(day(5)), day(5), counts(3, 3)), None);
        assert_eq!(evaluate_streak(Some(day(5)), day(5), counts(0, 0)), None);
    }

    #[test]
    fn first_activity_gets_the_welcome_bonus() {
        let award = evaluate_streak(None, day(1), counts(0, 0)).unwrap();
        assert_eq!(
            award,
            StreakAward {
                kind: StreakAwardKind::FirstMessage,
                kudos: FIRST_TIME_BONUS,
                streak: Some(1),
            }
        );
        assert_eq!(award.reason("<@1>"), "<@1> has joined the server!!!");
    }

    #[test]
    fn consecutive_day_advances_the_streak() {
        let award = evaluate_streak(Some(day(1)), day(2), counts(1, 1)).unwrap();
        assert_eq!(award.kudos, DAILY_MESSAGE_BONUS);
        assert_eq!(award.streak, Some(2));
    }

    #[test]
    fn seventh_day_replaces_daily_with_weekly_bonus() {
        let award = evaluate_streak(Some(day(6)), day(7), counts(6, 6)).unwrap();
        assert_eq!(award.kind, StreakAwardKind::WeeklyStreak { weeks: 1 });
        assert_eq!(award.kudos, WEEKLY_STREAK_BONUS);
        assert_eq!(award.streak, Some(7));
        assert_eq!(
            award.reason("<@1>"),
            "<@1> has messaged every day for 1 week!"
        );

        let award = evaluate_streak(Some(day(13)), day(14), counts(13, 13)).unwrap();
        assert_eq!(award.kind, StreakAwardKind::WeeklyStreak { weeks: 2 });
        assert_eq!(
            award.reason("<@1>"),
            "<@1> has messaged every day for 2 weeks!"
        );
    }

    #[test]
    fn gaps_and_regressions_keep_the_streak() {
        for last in [Some(day(1)), Some(day(20)), None] {
            let award = evaluate_streak(last, day(10), counts(4, 9)).unwrap();
            assert_eq!(award.kind, StreakAwardKind::DailyMessage);
            assert_eq!(award.kudos, DAILY_MESSAGE_BONUS);
            assert_eq!(award.streak, None);
        }
    }

    #[test]
    fn month_boundaries_count_as_consecutive() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let award = evaluate_streak(Some(last), day(1), counts(2, 5)).unwrap();
        assert_eq!(award.streak, Some(3));
    }
}
