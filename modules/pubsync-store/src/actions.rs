//! Everything that can happen to the store.
//!
//! Actions carry wire shapes. Reducers decode them into the schema's
//! application types, so one action vocabulary serves every schema.
//!
//! Command results, live stream events and failures all arrive here:
//! - `User` / `Space` / `Membership` / `Member` / `Message` / `Presence` /
//!   `Connection` are the typed actions reducers act on.
//! - `Stream` is a raw live event. The listener fans it out into typed
//!   actions; no reducer reads it directly.
//! - `RequestFailed` is recorded for inspection and changes nothing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use pubsync_common::SyncError;
use pubsync_engine::ActionLike;
use pubsync_world::{
    MemberObject, MembershipEvent, MembershipObject, ObjectPatch, Page, SpaceField, SpaceObject,
    StreamEvent, Timetoken, UserField, UserObject, WireMessage,
};

use crate::network::{
    HereNowRequest, HereNowResponse, HistoryRequest, LinkDraft, ListRequest,
    PresenceStateRequest, PublishRequest, SpaceDraft, UserDraft,
};

// ---------------------------------------------------------------------------
// SyncAction: the engine's action type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "action", rename_all = "snake_case")]
pub enum SyncAction {
    User(UserAction),
    Space(SpaceAction),
    Membership(MembershipAction),
    Member(MemberAction),
    Message(MessageAction),
    Presence(PresenceAction),
    Connection(ConnectionAction),
    Stream(StreamEvent),
    RequestFailed(RequestFailure),
}

impl SyncAction {
    pub fn domain(&self) -> &'static str {
        match self {
            SyncAction::User(_) => "user",
            SyncAction::Space(_) => "space",
            SyncAction::Membership(_) => "membership",
            SyncAction::Member(_) => "member",
            SyncAction::Message(_) => "message",
            SyncAction::Presence(_) => "presence",
            SyncAction::Connection(_) => "connection",
            SyncAction::Stream(_) => "stream",
            SyncAction::RequestFailed(_) => "request",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::User(a) => a.action_type(),
            SyncAction::Space(a) => a.action_type(),
            SyncAction::Membership(a) => a.action_type(),
            SyncAction::Member(a) => a.action_type(),
            SyncAction::Message(a) => a.action_type(),
            SyncAction::Presence(a) => a.action_type(),
            SyncAction::Connection(a) => a.action_type(),
            SyncAction::Stream(e) => e.event_type(),
            SyncAction::RequestFailed(_) => "failed",
        }
    }
}

impl ActionLike for SyncAction {
    fn action_type_str(&self) -> String {
        format!("{}.{}", self.domain(), self.name())
    }

    fn to_record_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("SyncAction serialization should never fail")
    }
}

impl From<UserAction> for SyncAction {
    fn from(action: UserAction) -> Self {
        SyncAction::User(action)
    }
}

impl From<SpaceAction> for SyncAction {
    fn from(action: SpaceAction) -> Self {
        SyncAction::Space(action)
    }
}

impl From<MembershipAction> for SyncAction {
    fn from(action: MembershipAction) -> Self {
        SyncAction::Membership(action)
    }
}

impl From<MemberAction> for SyncAction {
    fn from(action: MemberAction) -> Self {
        SyncAction::Member(action)
    }
}

impl From<MessageAction> for SyncAction {
    fn from(action: MessageAction) -> Self {
        SyncAction::Message(action)
    }
}

impl From<PresenceAction> for SyncAction {
    fn from(action: PresenceAction) -> Self {
        SyncAction::Presence(action)
    }
}

impl From<ConnectionAction> for SyncAction {
    fn from(action: ConnectionAction) -> Self {
        SyncAction::Connection(action)
    }
}

impl From<StreamEvent> for SyncAction {
    fn from(event: StreamEvent) -> Self {
        SyncAction::Stream(event)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    FetchingUsers { request: ListRequest },
    UsersRetrieved { page: Page<UserObject> },
    FetchingUser { user_id: String },
    UserRetrieved { user: UserObject },
    CreatingUser { draft: UserDraft },
    UserCreated { user: UserObject },
    UpdatingUser { draft: UserDraft },
    UserUpdated { user: UserObject },
    DeletingUser { user_id: String },
    UserDeleted { user_id: String },
    UserPatched { patch: ObjectPatch<UserField> },
}

impl UserAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            UserAction::FetchingUsers { .. } => "fetching_users",
            UserAction::UsersRetrieved { .. } => "users_retrieved",
            UserAction::FetchingUser { .. } => "fetching_user",
            UserAction::UserRetrieved { .. } => "user_retrieved",
            UserAction::CreatingUser { .. } => "creating_user",
            UserAction::UserCreated { .. } => "user_created",
            UserAction::UpdatingUser { .. } => "updating_user",
            UserAction::UserUpdated { .. } => "user_updated",
            UserAction::DeletingUser { .. } => "deleting_user",
            UserAction::UserDeleted { .. } => "user_deleted",
            UserAction::UserPatched { .. } => "user_patched",
        }
    }
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpaceAction {
    FetchingSpaces { request: ListRequest },
    SpacesRetrieved { page: Page<SpaceObject> },
    FetchingSpace { space_id: String },
    SpaceRetrieved { space: SpaceObject },
    CreatingSpace { draft: SpaceDraft },
    SpaceCreated { space: SpaceObject },
    UpdatingSpace { draft: SpaceDraft },
    SpaceUpdated { space: SpaceObject },
    DeletingSpace { space_id: String },
    SpaceDeleted { space_id: String },
    SpacePatched { patch: ObjectPatch<SpaceField> },
}

impl SpaceAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            SpaceAction::FetchingSpaces { .. } => "fetching_spaces",
            SpaceAction::SpacesRetrieved { .. } => "spaces_retrieved",
            SpaceAction::FetchingSpace { .. } => "fetching_space",
            SpaceAction::SpaceRetrieved { .. } => "space_retrieved",
            SpaceAction::CreatingSpace { .. } => "creating_space",
            SpaceAction::SpaceCreated { .. } => "space_created",
            SpaceAction::UpdatingSpace { .. } => "updating_space",
            SpaceAction::SpaceUpdated { .. } => "space_updated",
            SpaceAction::DeletingSpace { .. } => "deleting_space",
            SpaceAction::SpaceDeleted { .. } => "space_deleted",
            SpaceAction::SpacePatched { .. } => "space_patched",
        }
    }
}

// ---------------------------------------------------------------------------
// Memberships (user side) and live link events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipAction {
    FetchingMemberships {
        user_id: String,
        request: ListRequest,
    },
    MembershipsRetrieved {
        user_id: String,
        page: Page<MembershipObject>,
    },
    JoiningSpaces {
        user_id: String,
        spaces: Vec<LinkDraft>,
    },
    SpacesJoined {
        user_id: String,
        page: Page<MembershipObject>,
    },
    UpdatingMemberships {
        user_id: String,
        spaces: Vec<LinkDraft>,
    },
    MembershipsUpdated {
        user_id: String,
        page: Page<MembershipObject>,
    },
    LeavingSpaces {
        user_id: String,
        space_ids: Vec<String>,
    },
    SpacesLeft {
        user_id: String,
        page: Page<MembershipObject>,
        left_ids: Vec<String>,
    },
    /// Live: a link appeared. Carries both halves.
    UserAddedToSpace { event: MembershipEvent },
    /// Live: a link changed. Carries both halves.
    MembershipUpdatedOnSpace { event: MembershipEvent },
    /// Live: a link went away.
    UserRemovedFromSpace { user_id: String, space_id: String },
}

impl MembershipAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            MembershipAction::FetchingMemberships { .. } => "fetching_memberships",
            MembershipAction::MembershipsRetrieved { .. } => "memberships_retrieved",
            MembershipAction::JoiningSpaces { .. } => "joining_spaces",
            MembershipAction::SpacesJoined { .. } => "spaces_joined",
            MembershipAction::UpdatingMemberships { .. } => "updating_memberships",
            MembershipAction::MembershipsUpdated { .. } => "memberships_updated",
            MembershipAction::LeavingSpaces { .. } => "leaving_spaces",
            MembershipAction::SpacesLeft { .. } => "spaces_left",
            MembershipAction::UserAddedToSpace { .. } => "user_added_to_space",
            MembershipAction::MembershipUpdatedOnSpace { .. } => "membership_updated_on_space",
            MembershipAction::UserRemovedFromSpace { .. } => "user_removed_from_space",
        }
    }
}

// ---------------------------------------------------------------------------
// Members (space side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberAction {
    FetchingMembers {
        space_id: String,
        request: ListRequest,
    },
    MembersRetrieved {
        space_id: String,
        page: Page<MemberObject>,
    },
    AddingMembers {
        space_id: String,
        users: Vec<LinkDraft>,
    },
    MembersAdded {
        space_id: String,
        page: Page<MemberObject>,
    },
    UpdatingMembers {
        space_id: String,
        users: Vec<LinkDraft>,
    },
    MembersUpdated {
        space_id: String,
        page: Page<MemberObject>,
    },
    RemovingMembers {
        space_id: String,
        user_ids: Vec<String>,
    },
    MembersRemoved {
        space_id: String,
        page: Page<MemberObject>,
        removed_ids: Vec<String>,
    },
}

impl MemberAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            MemberAction::FetchingMembers { .. } => "fetching_members",
            MemberAction::MembersRetrieved { .. } => "members_retrieved",
            MemberAction::AddingMembers { .. } => "adding_members",
            MemberAction::MembersAdded { .. } => "members_added",
            MemberAction::UpdatingMembers { .. } => "updating_members",
            MemberAction::MembersUpdated { .. } => "members_updated",
            MemberAction::RemovingMembers { .. } => "removing_members",
            MemberAction::MembersRemoved { .. } => "members_removed",
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageAction {
    SendingMessage {
        request: PublishRequest,
    },
    MessageSent {
        channel: String,
        content: serde_json::Value,
        timetoken: Timetoken,
    },
    FetchingHistory {
        request: HistoryRequest,
    },
    HistoryRetrieved {
        messages_by_channel: BTreeMap<String, Vec<WireMessage>>,
    },
    MessageReceived {
        message: WireMessage,
    },
}

impl MessageAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            MessageAction::SendingMessage { .. } => "sending_message",
            MessageAction::MessageSent { .. } => "message_sent",
            MessageAction::FetchingHistory { .. } => "fetching_history",
            MessageAction::HistoryRetrieved { .. } => "history_retrieved",
            MessageAction::MessageReceived { .. } => "message_received",
        }
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceAction {
    FetchingHereNow {
        request: HereNowRequest,
    },
    HereNowRetrieved {
        response: HereNowResponse,
    },
    FetchingPresenceState {
        request: PresenceStateRequest,
    },
    PresenceStateRetrieved {
        user_id: String,
        state_by_channel: BTreeMap<String, serde_json::Value>,
    },
    Joined {
        channel: String,
        occupancy: u32,
        user_ids: Vec<String>,
    },
    Left {
        channel: String,
        occupancy: u32,
        user_ids: Vec<String>,
    },
    TimedOut {
        channel: String,
        occupancy: u32,
        user_ids: Vec<String>,
    },
    StateChanged {
        channel: String,
        occupancy: u32,
        states: BTreeMap<String, serde_json::Value>,
    },
    /// Occupancy moved without naming anyone.
    OccupancyChanged {
        channel: String,
        occupancy: u32,
    },
}

impl PresenceAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            PresenceAction::FetchingHereNow { .. } => "fetching_here_now",
            PresenceAction::HereNowRetrieved { .. } => "here_now_retrieved",
            PresenceAction::FetchingPresenceState { .. } => "fetching_presence_state",
            PresenceAction::PresenceStateRetrieved { .. } => "presence_state_retrieved",
            PresenceAction::Joined { .. } => "joined",
            PresenceAction::Left { .. } => "left",
            PresenceAction::TimedOut { .. } => "timed_out",
            PresenceAction::StateChanged { .. } => "state_changed",
            PresenceAction::OccupancyChanged { .. } => "occupancy_changed",
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionAction {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            ConnectionAction::Connecting => "connecting",
            ConnectionAction::Connected => "connected",
            ConnectionAction::Disconnected => "disconnected",
        }
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Which network call a failure or scripted response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    FetchUsers,
    FetchUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
    FetchSpaces,
    FetchSpace,
    CreateSpace,
    UpdateSpace,
    DeleteSpace,
    FetchMemberships,
    JoinSpaces,
    UpdateMemberships,
    LeaveSpaces,
    FetchMembers,
    AddMembers,
    UpdateMembers,
    RemoveMembers,
    SendMessage,
    FetchHistory,
    HereNow,
    PresenceState,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::FetchUsers => "fetch_users",
            RequestKind::FetchUser => "fetch_user",
            RequestKind::CreateUser => "create_user",
            RequestKind::UpdateUser => "update_user",
            RequestKind::DeleteUser => "delete_user",
            RequestKind::FetchSpaces => "fetch_spaces",
            RequestKind::FetchSpace => "fetch_space",
            RequestKind::CreateSpace => "create_space",
            RequestKind::UpdateSpace => "update_space",
            RequestKind::DeleteSpace => "delete_space",
            RequestKind::FetchMemberships => "fetch_memberships",
            RequestKind::JoinSpaces => "join_spaces",
            RequestKind::UpdateMemberships => "update_memberships",
            RequestKind::LeaveSpaces => "leave_spaces",
            RequestKind::FetchMembers => "fetch_members",
            RequestKind::AddMembers => "add_members",
            RequestKind::UpdateMembers => "update_members",
            RequestKind::RemoveMembers => "remove_members",
            RequestKind::SendMessage => "send_message",
            RequestKind::FetchHistory => "fetch_history",
            RequestKind::HereNow => "here_now",
            RequestKind::PresenceState => "presence_state",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFailure {
    pub request: RequestKind,
    pub error: SyncError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_type_is_domain_dot_name() {
        let action: SyncAction = UserAction::UserDeleted {
            user_id: "u1".into(),
        }
        .into();
        assert_eq!(action.action_type_str(), "user.user_deleted");

        let action: SyncAction = ConnectionAction::Connected.into();
        assert_eq!(action.action_type_str(), "connection.connected");

        let failed = SyncAction::RequestFailed(RequestFailure {
            request: RequestKind::FetchUser,
            error: SyncError::NotFound("u1".into()),
        });
        assert_eq!(failed.action_type_str(), "request.failed");
    }

    #[test]
    fn payload_names_domain_and_type() {
        let action: SyncAction = MembershipAction::UserRemovedFromSpace {
            user_id: "u1".into(),
            space_id: "s1".into(),
        }
        .into();

        let payload = action.to_record_payload();
        assert_eq!(payload["domain"], json!("membership"));
        assert_eq!(payload["action"]["type"], json!("user_removed_from_space"));
        assert_eq!(payload["action"]["space_id"], json!("s1"));
    }

    #[test]
    fn failure_payload_keeps_the_error() {
        let failed = SyncAction::RequestFailed(RequestFailure {
            request: RequestKind::HereNow,
            error: SyncError::Api {
                status: 503,
                message: "busy".into(),
            },
        });

        let payload = failed.to_record_payload();
        assert_eq!(payload["action"]["request"], json!("here_now"));
        assert_eq!(payload["action"]["error"]["kind"], json!("api"));

        let back: SyncAction = serde_json::from_value(payload).unwrap();
        assert_eq!(back, failed);
    }
}
