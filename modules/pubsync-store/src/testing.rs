// Test doubles and fixtures for the store.
//
// - MemoryNetwork (PubSubApi): scripted replies per request kind, FIFO, with
//   optional delay, plus a record of every call made.
// - Fixture builders for wire objects with a fixed base time.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use pubsync_common::{Result, SyncError};
use pubsync_world::{
    MemberObject, MembershipObject, Page, SpaceObject, Timetoken, UserObject, WireMessage,
};

use crate::actions::RequestKind;
use crate::network::{
    HereNowRequest, HereNowResponse, HistoryRequest, LinkDraft, ListRequest, PresenceStateRequest,
    PubSubApi, PublishRequest, SpaceDraft, UserDraft,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Base time plus `offset_secs`. Every fixture is stamped relative to it.
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + ChronoDuration::seconds(offset_secs)
}

/// A user named after its id in upper case.
pub fn user(id: &str, e_tag: &str, offset_secs: i64) -> UserObject {
    UserObject {
        id: id.into(),
        name: id.to_uppercase(),
        external_id: None,
        profile_url: None,
        email: None,
        custom: None,
        created: at(0),
        updated: at(offset_secs),
        e_tag: e_tag.into(),
    }
}

pub fn space(id: &str, e_tag: &str, offset_secs: i64) -> SpaceObject {
    SpaceObject {
        id: id.into(),
        name: id.to_uppercase(),
        description: None,
        custom: None,
        created: at(0),
        updated: at(offset_secs),
        e_tag: e_tag.into(),
    }
}

pub fn membership(user_id: &str, space_id: &str, e_tag: &str, offset_secs: i64) -> MembershipObject {
    MembershipObject {
        user_id: user_id.into(),
        space_id: space_id.into(),
        space: None,
        is_moderator: false,
        custom: None,
        created: at(0),
        updated: at(offset_secs),
        e_tag: e_tag.into(),
    }
}

pub fn member(space_id: &str, user_id: &str, e_tag: &str, offset_secs: i64) -> MemberObject {
    membership(user_id, space_id, e_tag, offset_secs).to_member(None)
}

pub fn message(channel: &str, timetoken: u64, payload: Value) -> WireMessage {
    WireMessage {
        channel: channel.into(),
        timetoken: Timetoken(timetoken),
        payload,
    }
}

// ---------------------------------------------------------------------------
// MemoryNetwork
// ---------------------------------------------------------------------------

struct Scripted {
    delay: Option<Duration>,
    outcome: std::result::Result<Value, SyncError>,
}

/// One call the store made, with its arguments as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub request: RequestKind,
    pub args: Value,
}

/// Scripted network. Replies are consumed in order per request kind; a call
/// with nothing scripted fails with `SyncError::NotFound`.
#[derive(Default)]
pub struct MemoryNetwork {
    scripts: Mutex<HashMap<RequestKind, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn on(self, request: RequestKind, reply: impl Serialize) -> Self {
        self.push(request, None, to_value(reply));
        self
    }

    /// Queue a successful reply that arrives after `delay`.
    pub fn on_delayed(self, request: RequestKind, delay: Duration, reply: impl Serialize) -> Self {
        self.push(request, Some(delay), to_value(reply));
        self
    }

    /// Queue a failure.
    pub fn fail(self, request: RequestKind, error: SyncError) -> Self {
        self.push(request, None, Err(error));
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, request: RequestKind) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.request == request)
            .count()
    }

    fn push(
        &self,
        request: RequestKind,
        delay: Option<Duration>,
        outcome: std::result::Result<Value, SyncError>,
    ) {
        lock(&self.scripts)
            .entry(request)
            .or_default()
            .push_back(Scripted { delay, outcome });
    }

    async fn reply<T: DeserializeOwned>(&self, request: RequestKind, args: Value) -> Result<T> {
        lock(&self.calls).push(RecordedCall { request, args });

        let scripted = lock(&self.scripts)
            .get_mut(&request)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = scripted else {
            return Err(SyncError::NotFound(format!(
                "no scripted reply for {request}"
            )));
        };

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        let value = scripted.outcome?;
        Ok(serde_json::from_value(value)?)
    }
}

fn to_value(reply: impl Serialize) -> std::result::Result<Value, SyncError> {
    serde_json::to_value(reply).map_err(SyncError::from)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl PubSubApi for MemoryNetwork {
    async fn fetch_users(&self, request: &ListRequest) -> Result<Page<UserObject>> {
        self.reply(RequestKind::FetchUsers, json!(request)).await
    }

    async fn fetch_user(&self, user_id: &str) -> Result<UserObject> {
        self.reply(RequestKind::FetchUser, json!({ "user_id": user_id }))
            .await
    }

    async fn create_user(&self, draft: &UserDraft) -> Result<UserObject> {
        self.reply(RequestKind::CreateUser, json!(draft)).await
    }

    async fn update_user(&self, draft: &UserDraft) -> Result<UserObject> {
        self.reply(RequestKind::UpdateUser, json!(draft)).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.reply(RequestKind::DeleteUser, json!({ "user_id": user_id }))
            .await
    }

    async fn fetch_spaces(&self, request: &ListRequest) -> Result<Page<SpaceObject>> {
        self.reply(RequestKind::FetchSpaces, json!(request)).await
    }

    async fn fetch_space(&self, space_id: &str) -> Result<SpaceObject> {
        self.reply(RequestKind::FetchSpace, json!({ "space_id": space_id }))
            .await
    }

    async fn create_space(&self, draft: &SpaceDraft) -> Result<SpaceObject> {
        self.reply(RequestKind::CreateSpace, json!(draft)).await
    }

    async fn update_space(&self, draft: &SpaceDraft) -> Result<SpaceObject> {
        self.reply(RequestKind::UpdateSpace, json!(draft)).await
    }

    async fn delete_space(&self, space_id: &str) -> Result<()> {
        self.reply(RequestKind::DeleteSpace, json!({ "space_id": space_id }))
            .await
    }

    async fn fetch_memberships(
        &self,
        user_id: &str,
        request: &ListRequest,
    ) -> Result<Page<MembershipObject>> {
        self.reply(
            RequestKind::FetchMemberships,
            json!({ "user_id": user_id, "request": request }),
        )
        .await
    }

    async fn join_spaces(
        &self,
        user_id: &str,
        spaces: &[LinkDraft],
    ) -> Result<Page<MembershipObject>> {
        self.reply(
            RequestKind::JoinSpaces,
            json!({ "user_id": user_id, "spaces": spaces }),
        )
        .await
    }

    async fn update_memberships(
        &self,
        user_id: &str,
        spaces: &[LinkDraft],
    ) -> Result<Page<MembershipObject>> {
        self.reply(
            RequestKind::UpdateMemberships,
            json!({ "user_id": user_id, "spaces": spaces }),
        )
        .await
    }

    async fn leave_spaces(
        &self,
        user_id: &str,
        space_ids: &[String],
    ) -> Result<Page<MembershipObject>> {
        self.reply(
            RequestKind::LeaveSpaces,
            json!({ "user_id": user_id, "space_ids": space_ids }),
        )
        .await
    }

    async fn fetch_members(
        &self,
        space_id: &str,
        request: &ListRequest,
    ) -> Result<Page<MemberObject>> {
        self.reply(
            RequestKind::FetchMembers,
            json!({ "space_id": space_id, "request": request }),
        )
        .await
    }

    async fn add_members(
        &self,
        space_id: &str,
        users: &[LinkDraft],
    ) -> Result<Page<MemberObject>> {
        self.reply(
            RequestKind::AddMembers,
            json!({ "space_id": space_id, "users": users }),
        )
        .await
    }

    async fn update_members(
        &self,
        space_id: &str,
        users: &[LinkDraft],
    ) -> Result<Page<MemberObject>> {
        self.reply(
            RequestKind::UpdateMembers,
            json!({ "space_id": space_id, "users": users }),
        )
        .await
    }

    async fn remove_members(
        &self,
        space_id: &str,
        user_ids: &[String],
    ) -> Result<Page<MemberObject>> {
        self.reply(
            RequestKind::RemoveMembers,
            json!({ "space_id": space_id, "user_ids": user_ids }),
        )
        .await
    }

    async fn send_message(&self, request: &PublishRequest) -> Result<Timetoken> {
        self.reply(RequestKind::SendMessage, json!(request)).await
    }

    async fn fetch_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<BTreeMap<String, Vec<WireMessage>>> {
        self.reply(RequestKind::FetchHistory, json!(request)).await
    }

    async fn here_now(&self, request: &HereNowRequest) -> Result<HereNowResponse> {
        self.reply(RequestKind::HereNow, json!(request)).await
    }

    async fn presence_state(
        &self,
        request: &PresenceStateRequest,
    ) -> Result<BTreeMap<String, Value>> {
        self.reply(RequestKind::PresenceState, json!(request)).await
    }
}
