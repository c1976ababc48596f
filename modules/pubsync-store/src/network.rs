//! The network collaborator.
//!
//! Transport, retries and timeouts live behind [`PubSubApi`]. The store only
//! sees typed results, and every failure comes back as a [`SyncError`] that is
//! handed to the caller unchanged.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pubsync_common::Result;
use pubsync_world::{
    ChannelPresence, MemberObject, MembershipObject, Page, SpaceObject, Timetoken, UserObject,
    WireMessage,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Paging and include flags shared by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Cursor of the page to start after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Cursor of the page to stop before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default)]
    pub include_custom: bool,
    /// Ask for the embedded far-end object on relationship lists.
    #[serde(default)]
    pub include_embedded: bool,
    #[serde(default)]
    pub include_total_count: bool,
}

impl ListRequest {
    pub fn first_page(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// The request for the page after `page`, if there is one.
    pub fn after<T>(&self, page: &Page<T>) -> Option<Self> {
        page.next.as_ref().map(|cursor| Self {
            start: Some(cursor.clone()),
            end: None,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
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
}

impl UserDraft {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            external_id: None,
            profile_url: None,
            email: None,
            custom: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDraft {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

impl SpaceDraft {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            custom: None,
        }
    }
}

/// One side of a link being created or changed. `id` names the far end: a
/// space id when sent from the user's side, a user id from the space's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDraft {
    pub id: String,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

impl LinkDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_moderator: false,
            custom: None,
        }
    }

    pub fn moderator(mut self) -> Self {
        self.is_moderator = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub channel: String,
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub channels: Vec<String>,
    /// Exclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timetoken>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timetoken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_channel: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HereNowRequest {
    pub channels: Vec<String>,
    #[serde(default)]
    pub include_state: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStateRequest {
    pub user_id: String,
    pub channels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HereNowResponse {
    pub by_channel: BTreeMap<String, ChannelPresence>,
    pub total_occupancy: u32,
    pub total_channels: u32,
}

// ---------------------------------------------------------------------------
// PubSubApi
// ---------------------------------------------------------------------------

/// Everything the store asks of the backend.
///
/// Implementations are injected; nothing in the store reaches for a global
/// client.
#[async_trait]
pub trait PubSubApi: Send + Sync {
    // Users
    async fn fetch_users(&self, request: &ListRequest) -> Result<Page<UserObject>>;
    async fn fetch_user(&self, user_id: &str) -> Result<UserObject>;
    async fn create_user(&self, draft: &UserDraft) -> Result<UserObject>;
    async fn update_user(&self, draft: &UserDraft) -> Result<UserObject>;
    async fn delete_user(&self, user_id: &str) -> Result<()>;

    // Spaces
    async fn fetch_spaces(&self, request: &ListRequest) -> Result<Page<SpaceObject>>;
    async fn fetch_space(&self, space_id: &str) -> Result<SpaceObject>;
    async fn create_space(&self, draft: &SpaceDraft) -> Result<SpaceObject>;
    async fn update_space(&self, draft: &SpaceDraft) -> Result<SpaceObject>;
    async fn delete_space(&self, space_id: &str) -> Result<()>;

    // Memberships (user side)
    async fn fetch_memberships(
        &self,
        user_id: &str,
        request: &ListRequest,
    ) -> Result<Page<MembershipObject>>;
    async fn join_spaces(
        &self,
        user_id: &str,
        spaces: &[LinkDraft],
    ) -> Result<Page<MembershipObject>>;
    async fn update_memberships(
        &self,
        user_id: &str,
        spaces: &[LinkDraft],
    ) -> Result<Page<MembershipObject>>;
    /// Returns the memberships the user still holds.
    async fn leave_spaces(
        &self,
        user_id: &str,
        space_ids: &[String],
    ) -> Result<Page<MembershipObject>>;

    // Members (space side)
    async fn fetch_members(
        &self,
        space_id: &str,
        request: &ListRequest,
    ) -> Result<Page<MemberObject>>;
    async fn add_members(&self, space_id: &str, users: &[LinkDraft])
        -> Result<Page<MemberObject>>;
    async fn update_members(
        &self,
        space_id: &str,
        users: &[LinkDraft],
    ) -> Result<Page<MemberObject>>;
    /// Returns the members the space still holds.
    async fn remove_members(
        &self,
        space_id: &str,
        user_ids: &[String],
    ) -> Result<Page<MemberObject>>;

    // Messages
    async fn send_message(&self, request: &PublishRequest) -> Result<Timetoken>;
    async fn fetch_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<BTreeMap<String, Vec<WireMessage>>>;

    // Presence
    async fn here_now(&self, request: &HereNowRequest) -> Result<HereNowResponse>;
    async fn presence_state(
        &self,
        request: &PresenceStateRequest,
    ) -> Result<BTreeMap<String, serde_json::Value>>;
}
