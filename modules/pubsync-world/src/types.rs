use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Ordering ---

/// Server-assigned message token. Unique and strictly increasing per channel,
/// not a wall-clock guarantee.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timetoken(pub u64);

impl Timetoken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Timetoken {
    fn from(value: u64) -> Self {
        Timetoken(value)
    }
}

impl std::fmt::Display for Timetoken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Objects ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserObject {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub e_tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceObject {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub e_tag: String,
}

/// A user's link to a space, seen from the user's side.
///
/// Identified by `(user_id, space_id)`; within a user's list the space id is
/// the key. The embedded space is only present when the request asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipObject {
    pub user_id: String,
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceObject>,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub e_tag: String,
}

/// The same link seen from the space's side. Keyed by user id within a
/// space's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberObject {
    pub space_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserObject>,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub e_tag: String,
}

// --- Messages ---

/// A published message as delivered by history or the live stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub channel: String,
    pub timetoken: Timetoken,
    pub payload: serde_json::Value,
}

// --- Presence ---

/// Occupancy for one channel. A `None` state means the user is present but
/// has not published any state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPresence {
    pub occupancy: u32,
    #[serde(default)]
    pub occupants: BTreeMap<String, Option<serde_json::Value>>,
}

// --- Pagination ---

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub status: u16,
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            status: 200,
            data,
            total_count: None,
            next: None,
            prev: None,
        }
    }

    pub fn with_cursors(mut self, next: Option<String>, prev: Option<String>) -> Self {
        self.next = next;
        self.prev = prev;
        self
    }
}

impl MembershipObject {
    /// Mirror this link into the space-side shape.
    pub fn to_member(&self, user: Option<UserObject>) -> MemberObject {
        MemberObject {
            space_id: self.space_id.clone(),
            user_id: self.user_id.clone(),
            user,
            is_moderator: self.is_moderator,
            custom: self.custom.clone(),
            created: self.created,
            updated: self.updated,
            e_tag: self.e_tag.clone(),
        }
    }
}

impl MemberObject {
    /// Mirror this link into the user-side shape.
    pub fn to_membership(&self, space: Option<SpaceObject>) -> MembershipObject {
        MembershipObject {
            user_id: self.user_id.clone(),
            space_id: self.space_id.clone(),
            space,
            is_moderator: self.is_moderator,
            custom: self.custom.clone(),
            created: self.created,
            updated: self.updated,
            e_tag: self.e_tag.clone(),
        }
    }
}
