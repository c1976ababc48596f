//! The normalized store: six collections plus connection status.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pubsync_core::{ChannelOccupancy, Schema};

/// Everything the client knows, keyed for lookup.
///
/// Relationship lists are ascending by far-end id and hold one entry per id.
/// Message lists are ascending by timetoken.
#[derive(Debug, Clone)]
pub struct SyncState<S: Schema> {
    pub users: HashMap<String, S::User>,
    pub spaces: HashMap<String, S::Space>,
    /// Keyed by user id; each list is ordered by space id.
    pub memberships_by_user: HashMap<String, Vec<S::Membership>>,
    /// Keyed by space id; each list is ordered by user id.
    pub members_by_space: HashMap<String, Vec<S::Member>>,
    pub messages_by_channel: HashMap<String, Vec<S::Message>>,
    pub presence: PresenceState<S::Presence>,
    pub connection: ConnectionState,
}

// Written out so entity types need not be `Default`.
impl<S: Schema> Default for SyncState<S> {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            spaces: HashMap::new(),
            memberships_by_user: HashMap::new(),
            members_by_space: HashMap::new(),
            messages_by_channel: HashMap::new(),
            presence: PresenceState::default(),
            connection: ConnectionState::default(),
        }
    }
}

impl<S: Schema> SyncState<S> {
    pub fn user(&self, user_id: &str) -> Option<&S::User> {
        self.users.get(user_id)
    }

    pub fn space(&self, space_id: &str) -> Option<&S::Space> {
        self.spaces.get(space_id)
    }

    pub fn memberships(&self, user_id: &str) -> &[S::Membership] {
        self.memberships_by_user
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn members(&self, space_id: &str) -> &[S::Member] {
        self.members_by_space
            .get(space_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn messages(&self, channel: &str) -> &[S::Message] {
        self.messages_by_channel
            .get(channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn occupancy(&self, channel: &str) -> Option<&ChannelOccupancy<S::Presence>> {
        self.presence.by_channel.get(channel)
    }

    /// Collection sizes, for logging.
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            users: self.users.len(),
            spaces: self.spaces.len(),
            memberships: self.memberships_by_user.values().map(Vec::len).sum(),
            members: self.members_by_space.values().map(Vec::len).sum(),
            messages: self.messages_by_channel.values().map(Vec::len).sum(),
            channels_with_presence: self.presence.by_channel.len(),
            connection: self.connection,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PresenceState<P> {
    pub by_channel: HashMap<String, ChannelOccupancy<P>>,
    /// As last reported by a here-now fetch.
    pub total_occupancy: u32,
    pub total_channels: u32,
}

impl<P> Default for PresenceState<P> {
    fn default() -> Self {
        Self {
            by_channel: HashMap::new(),
            total_occupancy: 0,
            total_channels: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    NotConnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub users: usize,
    pub spaces: usize,
    pub memberships: usize,
    pub members: usize,
    pub messages: usize,
    pub channels_with_presence: usize,
    pub connection: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsync_core::Envelope;
    use pubsync_world::{MemberObject, MembershipObject, SpaceObject, UserObject};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Note {
        body: String,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Mood {
        mood: String,
    }

    #[derive(Debug, Clone, Default)]
    struct NoteSchema;

    impl Schema for NoteSchema {
        type User = UserObject;
        type Space = SpaceObject;
        type Membership = MembershipObject;
        type Member = MemberObject;
        type Message = Envelope<Note>;
        type Presence = Mood;
    }

    #[test]
    fn starts_empty_and_disconnected() {
        let state = SyncState::<NoteSchema>::default();

        assert!(state.user("u1").is_none());
        assert!(state.memberships("u1").is_empty());
        assert!(state.messages("lobby").is_empty());
        assert!(state.occupancy("lobby").is_none());
        assert_eq!(
            state.summary(),
            StateSummary {
                users: 0,
                spaces: 0,
                memberships: 0,
                members: 0,
                messages: 0,
                channels_with_presence: 0,
                connection: ConnectionState::NotConnected,
            }
        );
    }
}
