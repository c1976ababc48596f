//! Live stream notifications, pushed by the backend while subscribed.
//!
//! Every variant describes something the service observed. These arrive in no
//! particular order relative to fetch and mutation responses, and may repeat.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::patch::{ObjectPatch, SpaceField, UserField};
use crate::types::{MemberObject, MembershipObject, WireMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    User,
    Space,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::User => write!(f, "user"),
            ObjectKind::Space => write!(f, "space"),
        }
    }
}

/// A patch for one object kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "patch", rename_all = "snake_case")]
pub enum ObjectUpdate {
    User(ObjectPatch<UserField>),
    Space(ObjectPatch<SpaceField>),
}

/// A membership notification. One push carries both views of the link; either
/// half can be missing when the service omitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipEvent {
    pub user_id: String,
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberObject>,
}

impl MembershipEvent {
    /// Build an event carrying both halves of one link.
    pub fn from_membership(membership: MembershipObject) -> Self {
        let member = membership.to_member(None);
        Self {
            user_id: membership.user_id.clone(),
            space_id: membership.space_id.clone(),
            membership: Some(membership),
            member: Some(member),
        }
    }

    pub fn with_member(mut self, member: MemberObject) -> Self {
        self.member = Some(member);
        self
    }
}

/// Presence change for one channel. Interval announcements batch several
/// joins/leaves/timeouts into a single push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub channel: String,
    pub occupancy: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joined: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub left: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timed_out: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state_changes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
    DisconnectedUnexpectedly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageReceived {
        message: WireMessage,
    },
    ObjectUpdated {
        update: ObjectUpdate,
    },
    ObjectDeleted {
        kind: ObjectKind,
        id: String,
    },
    MembershipAdded {
        event: MembershipEvent,
    },
    MembershipUpdated {
        event: MembershipEvent,
    },
    MembershipRemoved {
        user_id: String,
        space_id: String,
    },
    PresenceChanged {
        event: PresenceEvent,
    },
    ConnectionChanged {
        status: ConnectionStatus,
    },
}

impl StreamEvent {
    /// The snake_case type string, matching the serde tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::MessageReceived { .. } => "message_received",
            StreamEvent::ObjectUpdated { .. } => "object_updated",
            StreamEvent::ObjectDeleted { .. } => "object_deleted",
            StreamEvent::MembershipAdded { .. } => "membership_added",
            StreamEvent::MembershipUpdated { .. } => "membership_updated",
            StreamEvent::MembershipRemoved { .. } => "membership_removed",
            StreamEvent::PresenceChanged { .. } => "presence_changed",
            StreamEvent::ConnectionChanged { .. } => "connection_changed",
        }
    }

    /// Parse one stream event from its JSON form.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_matches_serde_tag() {
        let events = vec![
            StreamEvent::ObjectDeleted {
                kind: ObjectKind::User,
                id: "u1".into(),
            },
            StreamEvent::MembershipRemoved {
                user_id: "u1".into(),
                space_id: "s1".into(),
            },
            StreamEvent::PresenceChanged {
                event: PresenceEvent {
                    channel: "c".into(),
                    occupancy: 1,
                    ..Default::default()
                },
            },
            StreamEvent::ConnectionChanged {
                status: ConnectionStatus::Connected,
            },
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], json!(event.event_type()));
            assert_eq!(StreamEvent::from_payload(&value).unwrap(), event);
        }
    }

    #[test]
    fn presence_event_lists_default_to_empty() {
        let event = StreamEvent::from_payload(&json!({
            "type": "presence_changed",
            "event": { "channel": "lobby", "occupancy": 2, "joined": ["a"] }
        }))
        .unwrap();

        let StreamEvent::PresenceChanged { event } = event else {
            panic!("expected presence event");
        };
        assert_eq!(event.joined, vec!["a".to_string()]);
        assert!(event.left.is_empty());
        assert!(event.state_changes.is_empty());
    }
}
