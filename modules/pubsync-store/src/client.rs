//! Command facade over the injected network API.
//!
//! Every command follows the same shape: dispatch a "started" action, await
//! the network outside the writer lock, then dispatch the result or a
//! failure. The caller gets the network result back unchanged.
//!
//! Writes are serialized by a `tokio::sync::Mutex` around an `Arc` of the
//! state. Each dispatch goes through `Arc::make_mut`, so a snapshot handed
//! out earlier is never mutated underneath its holder.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use pubsync_common::{Config, Result, SyncError};
use pubsync_core::{DefaultSchema, Schema};
use pubsync_engine::{ActionLike, Engine, MemoryActionLog};
use pubsync_world::{
    MemberObject, MembershipObject, Page, SpaceObject, StreamEvent, Timetoken, UserObject,
    WireMessage,
};

use crate::actions::{
    MemberAction, MembershipAction, MessageAction, PresenceAction, RequestFailure, RequestKind,
    SpaceAction, SyncAction, UserAction,
};
use crate::listener::StreamListener;
use crate::network::{
    HereNowRequest, HereNowResponse, HistoryRequest, LinkDraft, ListRequest, PresenceStateRequest,
    PubSubApi, PublishRequest, SpaceDraft, UserDraft,
};
use crate::reducer::SyncReducer;
use crate::state::SyncState;

pub type SyncEngine<S> = Engine<
    SyncAction,
    SyncState<S>,
    (),
    SyncReducer<S>,
    StreamListener<S>,
    Arc<MemoryActionLog>,
>;

pub struct SyncClient<S: Schema = DefaultSchema> {
    api: Arc<dyn PubSubApi>,
    engine: SyncEngine<S>,
    log: Arc<MemoryActionLog>,
    state: Mutex<Arc<SyncState<S>>>,
    user_id: String,
}

impl<S: Schema> SyncClient<S> {
    pub fn new(api: Arc<dyn PubSubApi>, config: &Config) -> Self {
        let log = Arc::new(MemoryActionLog::new(config.action_log_capacity));
        let engine = Engine::new(
            SyncReducer::new(),
            StreamListener::new(),
            log.clone(),
            config.run_id.clone(),
        );

        info!(
            user_id = %config.user_id,
            run_id = %config.run_id,
            "Sync client ready"
        );

        Self {
            api,
            engine,
            log,
            state: Mutex::new(Arc::new(SyncState::default())),
            user_id: config.user_id.clone(),
        }
    }

    /// The user this client acts as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn run_id(&self) -> &str {
        self.engine.run_id()
    }

    /// A consistent view of the store. Later dispatches never change it.
    pub async fn snapshot(&self) -> Arc<SyncState<S>> {
        self.state.lock().await.clone()
    }

    pub fn action_log(&self) -> &MemoryActionLog {
        &self.log
    }

    /// Run one action (and whatever it routes to) through the store.
    pub async fn dispatch(&self, action: SyncAction) -> anyhow::Result<usize> {
        let mut guard = self.state.lock().await;
        let state = Arc::make_mut(&mut *guard);
        self.engine.dispatch(action, state, &()).await
    }

    /// Feed one live stream event into the store.
    pub async fn ingest(&self, event: StreamEvent) -> anyhow::Result<usize> {
        self.dispatch(SyncAction::Stream(event)).await
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub async fn fetch_users(&self, request: ListRequest) -> Result<Page<UserObject>> {
        self.apply(UserAction::FetchingUsers {
            request: request.clone(),
        })
        .await;
        let result = self.api.fetch_users(&request).await;
        self.settle(RequestKind::FetchUsers, result, |page| {
            UserAction::UsersRetrieved { page: page.clone() }.into()
        })
        .await
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<UserObject> {
        self.apply(UserAction::FetchingUser {
            user_id: user_id.to_string(),
        })
        .await;
        let result = self.api.fetch_user(user_id).await;
        self.settle(RequestKind::FetchUser, result, |user| {
            UserAction::UserRetrieved { user: user.clone() }.into()
        })
        .await
    }

    pub async fn create_user(&self, draft: UserDraft) -> Result<UserObject> {
        self.apply(UserAction::CreatingUser {
            draft: draft.clone(),
        })
        .await;
        let result = self.api.create_user(&draft).await;
        self.settle(RequestKind::CreateUser, result, |user| {
            UserAction::UserCreated { user: user.clone() }.into()
        })
        .await
    }

    pub async fn update_user(&self, draft: UserDraft) -> Result<UserObject> {
        self.apply(UserAction::UpdatingUser {
            draft: draft.clone(),
        })
        .await;
        let result = self.api.update_user(&draft).await;
        self.settle(RequestKind::UpdateUser, result, |user| {
            UserAction::UserUpdated { user: user.clone() }.into()
        })
        .await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.apply(UserAction::DeletingUser {
            user_id: user_id.to_string(),
        })
        .await;
        let result = self.api.delete_user(user_id).await;
        self.settle(RequestKind::DeleteUser, result, |_| {
            UserAction::UserDeleted {
                user_id: user_id.to_string(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Spaces
    // -----------------------------------------------------------------------

    pub async fn fetch_spaces(&self, request: ListRequest) -> Result<Page<SpaceObject>> {
        self.apply(SpaceAction::FetchingSpaces {
            request: request.clone(),
        })
        .await;
        let result = self.api.fetch_spaces(&request).await;
        self.settle(RequestKind::FetchSpaces, result, |page| {
            SpaceAction::SpacesRetrieved { page: page.clone() }.into()
        })
        .await
    }

    pub async fn fetch_space(&self, space_id: &str) -> Result<SpaceObject> {
        self.apply(SpaceAction::FetchingSpace {
            space_id: space_id.to_string(),
        })
        .await;
        let result = self.api.fetch_space(space_id).await;
        self.settle(RequestKind::FetchSpace, result, |space| {
            SpaceAction::SpaceRetrieved {
                space: space.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn create_space(&self, draft: SpaceDraft) -> Result<SpaceObject> {
        self.apply(SpaceAction::CreatingSpace {
            draft: draft.clone(),
        })
        .await;
        let result = self.api.create_space(&draft).await;
        self.settle(RequestKind::CreateSpace, result, |space| {
            SpaceAction::SpaceCreated {
                space: space.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn update_space(&self, draft: SpaceDraft) -> Result<SpaceObject> {
        self.apply(SpaceAction::UpdatingSpace {
            draft: draft.clone(),
        })
        .await;
        let result = self.api.update_space(&draft).await;
        self.settle(RequestKind::UpdateSpace, result, |space| {
            SpaceAction::SpaceUpdated {
                space: space.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn delete_space(&self, space_id: &str) -> Result<()> {
        self.apply(SpaceAction::DeletingSpace {
            space_id: space_id.to_string(),
        })
        .await;
        let result = self.api.delete_space(space_id).await;
        self.settle(RequestKind::DeleteSpace, result, |_| {
            SpaceAction::SpaceDeleted {
                space_id: space_id.to_string(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Memberships
    // -----------------------------------------------------------------------

    pub async fn fetch_memberships(
        &self,
        user_id: &str,
        request: ListRequest,
    ) -> Result<Page<MembershipObject>> {
        self.apply(MembershipAction::FetchingMemberships {
            user_id: user_id.to_string(),
            request: request.clone(),
        })
        .await;
        let result = self.api.fetch_memberships(user_id, &request).await;
        self.settle(RequestKind::FetchMemberships, result, |page| {
            MembershipAction::MembershipsRetrieved {
                user_id: user_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn join_spaces(
        &self,
        user_id: &str,
        spaces: Vec<LinkDraft>,
    ) -> Result<Page<MembershipObject>> {
        self.apply(MembershipAction::JoiningSpaces {
            user_id: user_id.to_string(),
            spaces: spaces.clone(),
        })
        .await;
        let result = self.api.join_spaces(user_id, &spaces).await;
        self.settle(RequestKind::JoinSpaces, result, |page| {
            MembershipAction::SpacesJoined {
                user_id: user_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn update_memberships(
        &self,
        user_id: &str,
        spaces: Vec<LinkDraft>,
    ) -> Result<Page<MembershipObject>> {
        self.apply(MembershipAction::UpdatingMemberships {
            user_id: user_id.to_string(),
            spaces: spaces.clone(),
        })
        .await;
        let result = self.api.update_memberships(user_id, &spaces).await;
        self.settle(RequestKind::UpdateMemberships, result, |page| {
            MembershipAction::MembershipsUpdated {
                user_id: user_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn leave_spaces(
        &self,
        user_id: &str,
        space_ids: Vec<String>,
    ) -> Result<Page<MembershipObject>> {
        self.apply(MembershipAction::LeavingSpaces {
            user_id: user_id.to_string(),
            space_ids: space_ids.clone(),
        })
        .await;
        let result = self.api.leave_spaces(user_id, &space_ids).await;
        self.settle(RequestKind::LeaveSpaces, result, |page| {
            MembershipAction::SpacesLeft {
                user_id: user_id.to_string(),
                page: page.clone(),
                left_ids: space_ids.clone(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    pub async fn fetch_members(
        &self,
        space_id: &str,
        request: ListRequest,
    ) -> Result<Page<MemberObject>> {
        self.apply(MemberAction::FetchingMembers {
            space_id: space_id.to_string(),
            request: request.clone(),
        })
        .await;
        let result = self.api.fetch_members(space_id, &request).await;
        self.settle(RequestKind::FetchMembers, result, |page| {
            MemberAction::MembersRetrieved {
                space_id: space_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn add_members(
        &self,
        space_id: &str,
        users: Vec<LinkDraft>,
    ) -> Result<Page<MemberObject>> {
        self.apply(MemberAction::AddingMembers {
            space_id: space_id.to_string(),
            users: users.clone(),
        })
        .await;
        let result = self.api.add_members(space_id, &users).await;
        self.settle(RequestKind::AddMembers, result, |page| {
            MemberAction::MembersAdded {
                space_id: space_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn update_members(
        &self,
        space_id: &str,
        users: Vec<LinkDraft>,
    ) -> Result<Page<MemberObject>> {
        self.apply(MemberAction::UpdatingMembers {
            space_id: space_id.to_string(),
            users: users.clone(),
        })
        .await;
        let result = self.api.update_members(space_id, &users).await;
        self.settle(RequestKind::UpdateMembers, result, |page| {
            MemberAction::MembersUpdated {
                space_id: space_id.to_string(),
                page: page.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn remove_members(
        &self,
        space_id: &str,
        user_ids: Vec<String>,
    ) -> Result<Page<MemberObject>> {
        self.apply(MemberAction::RemovingMembers {
            space_id: space_id.to_string(),
            user_ids: user_ids.clone(),
        })
        .await;
        let result = self.api.remove_members(space_id, &user_ids).await;
        self.settle(RequestKind::RemoveMembers, result, |page| {
            MemberAction::MembersRemoved {
                space_id: space_id.to_string(),
                page: page.clone(),
                removed_ids: user_ids.clone(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub async fn send_message(
        &self,
        channel: &str,
        content: serde_json::Value,
    ) -> Result<Timetoken> {
        let request = PublishRequest {
            channel: channel.to_string(),
            content,
        };
        self.apply(MessageAction::SendingMessage {
            request: request.clone(),
        })
        .await;
        let result = self.api.send_message(&request).await;
        self.settle(RequestKind::SendMessage, result, |timetoken| {
            MessageAction::MessageSent {
                channel: request.channel.clone(),
                content: request.content.clone(),
                timetoken: *timetoken,
            }
            .into()
        })
        .await
    }

    pub async fn fetch_history(
        &self,
        request: HistoryRequest,
    ) -> Result<BTreeMap<String, Vec<WireMessage>>> {
        self.apply(MessageAction::FetchingHistory {
            request: request.clone(),
        })
        .await;
        let result = self.api.fetch_history(&request).await;
        self.settle(RequestKind::FetchHistory, result, |history| {
            MessageAction::HistoryRetrieved {
                messages_by_channel: history.clone(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    pub async fn here_now(&self, request: HereNowRequest) -> Result<HereNowResponse> {
        self.apply(PresenceAction::FetchingHereNow {
            request: request.clone(),
        })
        .await;
        let result = self.api.here_now(&request).await;
        self.settle(RequestKind::HereNow, result, |response| {
            PresenceAction::HereNowRetrieved {
                response: response.clone(),
            }
            .into()
        })
        .await
    }

    pub async fn presence_state(
        &self,
        request: PresenceStateRequest,
    ) -> Result<BTreeMap<String, serde_json::Value>> {
        self.apply(PresenceAction::FetchingPresenceState {
            request: request.clone(),
        })
        .await;
        let result = self.api.presence_state(&request).await;
        self.settle(RequestKind::PresenceState, result, |state_by_channel| {
            PresenceAction::PresenceStateRetrieved {
                user_id: request.user_id.clone(),
                state_by_channel: state_by_channel.clone(),
            }
            .into()
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Dispatch on behalf of a command. The store's own plumbing cannot
    /// change what the command returns, so a dispatch error is only logged.
    async fn apply(&self, action: impl Into<SyncAction>) {
        let action = action.into();
        let action_type = action.action_type_str();
        if let Err(err) = self.dispatch(action).await {
            warn!(action = %action_type, error = %err, "Dispatch failed");
        }
    }

    async fn settle<T: Send + Sync>(
        &self,
        request: RequestKind,
        result: Result<T>,
        on_success: impl FnOnce(&T) -> SyncAction + Send,
    ) -> Result<T> {
        match &result {
            Ok(value) => self.apply(on_success(value)).await,
            Err(error) => {
                warn!(
                    request = %request,
                    status = ?error.status(),
                    error = %error,
                    "Request failed"
                );
                self.apply(failure(request, error)).await;
            }
        }
        result
    }
}

fn failure(request: RequestKind, error: &SyncError) -> SyncAction {
    SyncAction::RequestFailed(RequestFailure {
        request,
        error: error.clone(),
    })
}
