mod join_history;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

pub use join_history::{
    JOIN_HISTORY_RETENTION, JoinEvent, JoinHistoryWindow, MASS_JOIN_THRESHOLD, MASS_JOIN_WINDOW,
};

/// How long welcome messages stay off after a join burst is detected.
pub const WELCOME_COOLDOWN: TimeDelta = TimeDelta::minutes(5);

pub const WELCOME_MESSAGES: &[&str] = &[
    "Everybody say hi to {}!!!",
    "Say hello to our newest member {}!!!",
    "Welcome to our newest & coolest member {}!!!",
    "Hey hey hey!!! {} has joined the party!!!",
];

/// Fill a [`WELCOME_MESSAGES`] template with the member mention.
pub fn render_welcome(template: &str, mention: &str) -> String {
    template.replacen("{}", mention, 1)
}

/// A member finished membership screening when they go from pending to not
/// pending. Without the cached old member the transition cannot be seen.
pub fn completed_screening(old_pending: Option<bool>, new_pending: bool) -> bool {
    old_pending == Some(true) && !new_pending
}

/// Per-guild "welcome messages disabled since" timestamps.
#[derive(Clone, Debug, Default)]
pub struct WelcomeSuppression {
    since: HashMap<u64, DateTime<Utc>>,
}

impl WelcomeSuppression {
    pub fn suppressed_since(&self, guild_id: u64) -> Option<DateTime<Utc>> {
        self.since.get(&guild_id).copied()
    }

    /// Start (or restart) the cooldown at `at`.
    pub fn suppress(&mut self, guild_id: u64, at: DateTime<Utc>) {
        self.since.insert(guild_id, at);
    }

    pub fn is_suppressed(&self, guild_id: u64, now: DateTime<Utc>) -> bool {
        self.suppressed_since(guild_id)
            .is_some_and(|since| since >= now - WELCOME_COOLDOWN)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    /// This join tipped the guild into a burst; staff should be alerted.
    pub mass_join_detected: bool,
    /// Whether the new member should get a welcome message.
    pub welcome: bool,
}

#[derive(Debug, Default)]
struct OnboardingInner {
    windows: HashMap<u64, JoinHistoryWindow>,
    suppression: WelcomeSuppression,
}

/// Join history and welcome suppression for every guild the bot serves.
#[derive(Clone, Debug, Default)]
pub struct OnboardingState {
    inner: Arc<Mutex<OnboardingInner>>,
}

impl OnboardingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a member activation and decide whether to welcome them.
    ///
    /// Detecting a burst re-arms the cooldown, which also silences the
    /// welcome for the member that triggered it.
    pub async fn register_join(&self, guild_id: u64, user_id: u64, now: DateTime<Utc>) -> JoinOutcome {
        let mut inner = self.inner.lock().await;
        let window = inner.windows.entry(guild_id).or_default();
        window.add(user_id, now);
        let mass_join_detected = window.under_mass_attack(now);

        if mass_join_detected {
            inner.suppression.suppress(guild_id, now);
        }

        JoinOutcome {
            mass_join_detected,
            welcome: !inner.suppression.is_suppressed(guild_id, now),
        }
    }

    pub async fn welcome_suppressed_since(&self, guild_id: u64) -> Option<DateTime<Utc>> {
        self.inner.lock().await.suppression.suppressed_since(guild_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::{OnboardingState, WELCOME_MESSAGES, completed_screening, render_welcome};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + TimeDelta::seconds(seconds)
    }

    #[test]
    fn screening_transition_needs_the_old_state() {
        assert!(completed_screening(Some(true), false));
        assert!(!completed_screening(Some(false), false));
        assert!(!completed_screening(Some(true), true));
        assert!(!completed_screening(None, false));
    }

    #[test]
    fn welcome_templates_take_the_mention() {
        assert_eq!(
            render_welcome(WELCOME_MESSAGES[0], "<@5>"),
            "Everybody say hi to <@5>!!!"
        );
        assert!(WELCOME_MESSAGES.iter().all(|line| line.contains("{}")));
    }

    #[tokio::test]
    async fn burst_suppresses_welcomes_for_five_minutes() {
        let state = OnboardingState::new();
        for user_id in 1..=3 {
            let outcome = state.register_join(1, user_id, at(user_id as i64)).await;
            assert!(outcome.welcome);
            assert!(!outcome.mass_join_detected);
        }

        let outcome = state.register_join(1, 4, at(4)).await;
        assert!(outcome.mass_join_detected);
        assert!(!outcome.welcome);
        assert_eq!(state.welcome_suppressed_since(1).await, Some(at(4)));

        // Other guilds are unaffected.
        assert!(state.register_join(2, 9, at(5)).await.welcome);

        let outcome = state.register_join(1, 5, at(200)).await;
        assert!(!outcome.mass_join_detected);
        assert!(!outcome.welcome);

        let outcome = state.register_join(1, 6, at(305)).await;
        assert!(outcome.welcome);
    }

    #[tokio::test]
    async fn repeated_bursts_rearm_the_cooldown() {
        let state = OnboardingState::new();
        for user_id in 1..=4 {
            state.register_join(1, user_id, at(0)).await;
        }
        // Still inside the one minute window, so this join re-arms.
        let outcome = state.register_join(1, 5, at(50)).await;
        assert!(outcome.mass_join_detected);
        assert_eq!(state.welcome_suppressed_since(1).await, Some(at(50)));

        assert!(!state.register_join(1, 6, at(320)).await.welcome);
        assert!(state.register_join(1, 7, at(351)).await.welcome);
    }

    #[tokio::test]
    async fn suppression_is_tracked_per_guild() {
        let state = OnboardingState::new();
        for user_id in 1..=4 {
            state.register_join(1, user_id, at(0)).await;
        }
        state.register_join(2, 10, at(0)).await;

        assert_eq!(state.welcome_suppressed_since(1).await, Some(at(0)));
        assert_eq!(state.welcome_suppressed_since(2).await, None);
    }
}
