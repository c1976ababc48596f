pub mod actions;
pub mod client;
pub mod listener;
pub mod network;
pub mod reducer;
pub mod reducers;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use actions::{
    ConnectionAction, MemberAction, MembershipAction, MessageAction, PresenceAction,
    RequestFailure, RequestKind, SpaceAction, SyncAction, UserAction,
};
pub use client::{SyncClient, SyncEngine};
pub use listener::{translate, StreamListener};
pub use network::{
    HereNowRequest, HereNowResponse, HistoryRequest, LinkDraft, ListRequest, PresenceStateRequest,
    PubSubApi, PublishRequest, SpaceDraft, UserDraft,
};
pub use reducer::SyncReducer;
pub use state::{ConnectionState, PresenceState, StateSummary, SyncState};
