use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted kudos state for one member of one guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KudosAccount {
    pub guild_id: u64,
    pub user_id: u64,
    pub balance: i64,
    pub last_active_date: Option<NaiveDate>,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreakCounts {
    pub current: u32,
    pub best: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: u64,
    pub balance: i64,
}

/// Emoji name to point value mapping configured per guild.
///
/// Keys are unique; display order is ascending by point value with the emoji
/// name as the tie breaker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KudosEmojiMap {
    points: BTreeMap<String, i64>,
}

impl KudosEmojiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(emoji, points)` pairs. Later duplicates win.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            points: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, points: i64) -> Option<i64> {
        self.points.insert(name.into(), points)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.points.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Entries ordered by point value, then by name.
    pub fn iter_by_points(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> = self
            .points
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        entries.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.0.cmp(right.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::KudosEmojiMap;

    #[test]
    fn emoji_map_orders_by_points_then_name() {
        let map = KudosEmojiMap::from_pairs([("expert", 16), ("thumbsup", 2), ("star", 2)]);
        assert_eq!(
            map.iter_by_points(),
            vec![("star", 2), ("thumbsup", 2), ("expert", 16)]
        );
    }

    #[test]
    fn emoji_map_keys_are_unique() {
        let mut map = KudosEmojiMap::from_pairs([("star", 2), ("star", 5)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("star"), Some(5));

        assert_eq!(map.insert("star", 8), Some(5));
        assert_eq!(map.get("star"), Some(8));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn emoji_map_serializes_as_plain_object() {
        let map = KudosEmojiMap::from_pairs([("star", 2)]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"star":2}"#);
        assert_eq!(serde_json::from_str::<KudosEmojiMap>(&json).unwrap(), map);
    }
}
