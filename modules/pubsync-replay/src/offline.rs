use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use pubsync_common::{Result, SyncError};
use pubsync_store::{
    HereNowRequest, HereNowResponse, HistoryRequest, LinkDraft, ListRequest, PresenceStateRequest,
    PubSubApi, PublishRequest, SpaceDraft, UserDraft,
};
use pubsync_world::{
    MemberObject, MembershipObject, Page, SpaceObject, Timetoken, UserObject, WireMessage,
};

/// Network stand-in for replays. Every request fails; only ingested stream
/// events reach the store.
pub struct OfflineApi;

fn offline<T>(request: &str) -> Result<T> {
    Err(SyncError::Network(format!("{request}: offline replay")))
}

#[async_trait]
impl PubSubApi for OfflineApi {
    async fn fetch_users(&self, _: &ListRequest) -> Result<Page<UserObject>> {
        offline("fetch_users")
    }

    async fn fetch_user(&self, _: &str) -> Result<UserObject> {
        offline("fetch_user")
    }

    async fn create_user(&self, _: &UserDraft) -> Result<UserObject> {
        offline("create_user")
    }

    async fn update_user(&self, _: &UserDraft) -> Result<UserObject> {
        offline("update_user")
    }

    async fn delete_user(&self, _: &str) -> Result<()> {
        offline("delete_user")
    }

    async fn fetch_spaces(&self, _: &ListRequest) -> Result<Page<SpaceObject>> {
        offline("fetch_spaces")
    }

    async fn fetch_space(&self, _: &str) -> Result<SpaceObject> {
        offline("fetch_space")
    }

    async fn create_space(&self, _: &SpaceDraft) -> Result<SpaceObject> {
        offline("create_space")
    }

    async fn update_space(&self, _: &SpaceDraft) -> Result<SpaceObject> {
        offline("update_space")
    }

    async fn delete_space(&self, _: &str) -> Result<()> {
        offline("delete_space")
    }

    async fn fetch_memberships(&self, _: &str, _: &ListRequest) -> Result<Page<MembershipObject>> {
        offline("fetch_memberships")
    }

    async fn join_spaces(&self, _: &str, _: &[LinkDraft]) -> Result<Page<MembershipObject>> {
        offline("join_spaces")
    }

    async fn update_memberships(
        &self,
        _: &str,
        _: &[LinkDraft],
    ) -> Result<Page<MembershipObject>> {
        offline("update_memberships")
    }

    async fn leave_spaces(&self, _: &str, _: &[String]) -> Result<Page<MembershipObject>> {
        offline("leave_spaces")
    }

    async fn fetch_members(&self, _: &str, _: &ListRequest) -> Result<Page<MemberObject>> {
        offline("fetch_members")
    }

    async fn add_members(&self, _: &str, _: &[LinkDraft]) -> Result<Page<MemberObject>> {
        offline("add_members")
    }

    async fn update_members(&self, _: &str, _: &[LinkDraft]) -> Result<Page<MemberObject>> {
        offline("update_members")
    }

    async fn remove_members(&self, _: &str, _: &[String]) -> Result<Page<MemberObject>> {
        offline("remove_members")
    }

    async fn send_message(&self, _: &PublishRequest) -> Result<Timetoken> {
        offline("send_message")
    }

    async fn fetch_history(
        &self,
        _: &HistoryRequest,
    ) -> Result<BTreeMap<String, Vec<WireMessage>>> {
        offline("fetch_history")
    }

    async fn here_now(&self, _: &HereNowRequest) -> Result<HereNowResponse> {
        offline("here_now")
    }

    async fn presence_state(&self, _: &PresenceStateRequest) -> Result<BTreeMap<String, Value>> {
        offline("presence_state")
    }
}
