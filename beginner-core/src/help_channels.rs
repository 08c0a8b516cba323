//! Rotation of help channels between the "available" and "occupied"
//! categories. Planning works on a snapshot of the guild's channels so it can
//! be reasoned about without a gateway connection.

use crate::config::CommunityConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Category,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub id: u64,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<u64>,
    pub position: u16,
}

/// Where the help categories live in one guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpLayout {
    pub available_category: u64,
    pub occupied_category: u64,
    pub channel_prefix: String,
    /// Position newly freed channels are moved to.
    pub available_anchor_position: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelpPool {
    Available,
    Occupied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMove {
    pub channel_id: u64,
    pub category_id: u64,
    pub position: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationPlan {
    /// Channel that should be announced as available.
    pub announce: Option<u64>,
    pub moves: Vec<ChannelMove>,
}

impl HelpLayout {
    /// Find the help categories by name. `None` when either is missing.
    pub fn resolve(channels: &[ChannelSnapshot], config: &CommunityConfig) -> Option<Self> {
        let category = |name: &str| {
            channels
                .iter()
                .find(|channel| channel.kind == ChannelKind::Category && channel.name == name)
                .map(|channel| channel.id)
        };

        let available_anchor_position = channels
            .iter()
            .find(|channel| channel.name == config.help_available_anchor)
            .map(|channel| channel.position);

        Some(Self {
            available_category: category(&config.help_available_category)?,
            occupied_category: category(&config.help_occupied_category)?,
            channel_prefix: config.help_channel_prefix.clone(),
            available_anchor_position,
        })
    }

    pub fn classify(&self, channel: &ChannelSnapshot) -> Option<HelpPool> {
        if channel.kind != ChannelKind::Text || !channel.name.starts_with(&self.channel_prefix) {
            return None;
        }

        match channel.parent_id {
            Some(parent) if parent == self.available_category => Some(HelpPool::Available),
            Some(parent) if parent == self.occupied_category => Some(HelpPool::Occupied),
            _ => None,
        }
    }

    /// Text channels of a category ordered by position.
    fn category_channels<'a>(
        &self,
        channels: &'a [ChannelSnapshot],
        category_id: u64,
    ) -> Vec<&'a ChannelSnapshot> {
        let mut members: Vec<&ChannelSnapshot> = channels
            .iter()
            .filter(|channel| {
                channel.kind == ChannelKind::Text && channel.parent_id == Some(category_id)
            })
            .collect();
        members.sort_by_key(|channel| (channel.position, channel.id));
        members
    }

    /// First channel in the available category, for pointing people at.
    pub fn first_available(&self, channels: &[ChannelSnapshot]) -> Option<u64> {
        self.category_channels(channels, self.available_category)
            .first()
            .map(|channel| channel.id)
    }

    /// Work out the channel moves caused by a message in `source_id`.
    ///
    /// A message in an available channel claims it: the lowest occupied
    /// channel is freed to replace it and the source moves to the top of the
    /// occupied category. A message in an occupied channel bumps it to the
    /// top. Returns `None` when nothing needs to move.
    pub fn plan_rotation(
        &self,
        source_id: u64,
        channels: &[ChannelSnapshot],
    ) -> Option<RotationPlan> {
        let source = channels.iter().find(|channel| channel.id == source_id)?;
        let pool = self.classify(source)?;

        let occupied = self.category_channels(channels, self.occupied_category);
        let top_occupied = occupied.first().map(|channel| channel.position);

        match pool {
            HelpPool::Occupied => {
                let top = top_occupied?;
                if occupied.first().is_some_and(|channel| channel.id == source_id) {
                    return None;
                }

                Some(RotationPlan {
                    announce: None,
                    moves: vec![ChannelMove {
                        channel_id: source_id,
                        category_id: self.occupied_category,
                        position: top,
                    }],
                })
            }
            HelpPool::Available => {
                let next = occupied
                    .iter()
                    .rev()
                    .find(|channel| channel.name.starts_with(&self.channel_prefix))?;

                Some(RotationPlan {
                    announce: Some(next.id),
                    moves: vec![
                        ChannelMove {
                            channel_id: next.id,
                            category_id: self.available_category,
                            position: self.available_anchor_position.unwrap_or(source.position),
                        },
                        ChannelMove {
                            channel_id: source_id,
                            category_id: self.occupied_category,
                            position: top_occupied.unwrap_or(0),
                        },
                    ],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelKind, ChannelMove, ChannelSnapshot, HelpLayout, HelpPool};
    use crate::config::CommunityConfig;

    const AVAILABLE: u64 = 100;
    const OCCUPIED: u64 = 200;

    fn channel(id: u64, name: &str, parent: Option<u64>, position: u16) -> ChannelSnapshot {
        ChannelSnapshot {
            id,
            name: name.to_owned(),
            kind: ChannelKind::Text,
            parent_id: parent,
            position,
        }
    }

    fn category(id: u64, name: &str) -> ChannelSnapshot {
        ChannelSnapshot {
            id,
            name: name.to_owned(),
            kind: ChannelKind::Category,
            parent_id: None,
            position: 0,
        }
    }

    fn guild() -> Vec<ChannelSnapshot> {
        vec![
            category(AVAILABLE, "Help: Available"),
            category(OCCUPIED, "Help: Occupied"),
            channel(1, "python-help-1", Some(AVAILABLE), 3),
            channel(2, "python-help-2", Some(AVAILABLE), 4),
            channel(9, "web-dev-help", Some(AVAILABLE), 5),
            channel(3, "python-help-3", Some(OCCUPIED), 10),
            channel(4, "python-help-4", Some(OCCUPIED), 11),
            channel(5, "python-help-5", Some(OCCUPIED), 12),
            channel(6, "general", None, 1),
        ]
    }

    fn layout(channels: &[ChannelSnapshot]) -> HelpLayout {
        HelpLayout::resolve(channels, &CommunityConfig::default()).unwrap()
    }

    #[test]
    fn resolves_categories_by_name() {
        let channels = guild();
        let layout = layout(&channels);
        assert_eq!(layout.available_category, AVAILABLE);
        assert_eq!(layout.occupied_category, OCCUPIED);
        assert_eq!(layout.available_anchor_position, Some(5));

        assert!(HelpLayout::resolve(&channels[2..], &CommunityConfig::default()).is_none());
    }

    #[test]
    fn classifies_help_channels_only() {
        let channels = guild();
        let layout = layout(&channels);
        assert_eq!(layout.classify(&channels[2]), Some(HelpPool::Available));
        assert_eq!(layout.classify(&channels[5]), Some(HelpPool::Occupied));
        assert_eq!(layout.classify(&channels[4]), None);
        assert_eq!(layout.classify(&channels[8]), None);
    }

    #[test]
    fn claiming_an_available_channel_frees_the_lowest_occupied_one() {
        let channels = guild();
        let plan = layout(&channels).plan_rotation(1, &channels).unwrap();

        assert_eq!(plan.announce, Some(5));
        assert_eq!(
            plan.moves,
            vec![
                ChannelMove {
                    channel_id: 5,
                    category_id: AVAILABLE,
                    position: 5,
                },
                ChannelMove {
                    channel_id: 1,
                    category_id: OCCUPIED,
                    position: 10,
                },
            ]
        );
    }

    #[test]
    fn occupied_channels_bump_to_the_top() {
        let channels = guild();
        let layout = layout(&channels);
        let plan = layout.plan_rotation(4, &channels).unwrap();
        assert_eq!(plan.announce, None);
        assert_eq!(
            plan.moves,
            vec![ChannelMove {
                channel_id: 4,
                category_id: OCCUPIED,
                position: 10,
            }]
        );

        assert!(layout.plan_rotation(3, &channels).is_none());
    }

    #[test]
    fn no_rotation_without_a_spare_channel() {
        let channels: Vec<_> = guild()
            .into_iter()
            .filter(|channel| channel.parent_id != Some(OCCUPIED))
            .collect();
        assert!(layout(&channels).plan_rotation(1, &channels).is_none());
        assert!(layout(&channels).plan_rotation(6, &channels).is_none());
    }

    #[test]
    fn points_at_the_first_available_channel() {
        let channels = guild();
        assert_eq!(layout(&channels).first_available(&channels), Some(1));
    }
}
