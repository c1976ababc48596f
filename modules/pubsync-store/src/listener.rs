//! Live stream listener.
//!
//! Routes each raw [`StreamEvent`] into the typed actions reducers act on.
//! Live events and command results then share one code path and one
//! conflict rule.

use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use tracing::trace;

use pubsync_core::Schema;
use pubsync_engine::{RecordedAction, Router};
use pubsync_world::{ConnectionStatus, ObjectKind, ObjectUpdate, PresenceEvent, StreamEvent};

use crate::actions::{
    ConnectionAction, MembershipAction, MessageAction, PresenceAction, SpaceAction, SyncAction,
    UserAction,
};
use crate::state::SyncState;

pub struct StreamListener<S> {
    _schema: PhantomData<fn() -> S>,
}

impl<S> StreamListener<S> {
    pub fn new() -> Self {
        Self {
            _schema: PhantomData,
        }
    }
}

impl<S> Default for StreamListener<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S: Schema> Router<SyncAction, SyncState<S>, ()> for StreamListener<S> {
    async fn route(
        &self,
        action: &SyncAction,
        recorded: &RecordedAction,
        _state: &SyncState<S>,
        _deps: &(),
    ) -> Result<Vec<SyncAction>> {
        let SyncAction::Stream(event) = action else {
            return Ok(vec![]);
        };

        let actions = translate(event);
        trace!(
            seq = recorded.seq,
            event = event.event_type(),
            emitted = actions.len(),
            "Stream event routed"
        );
        Ok(actions)
    }
}

/// The typed actions one stream event stands for.
pub fn translate(event: &StreamEvent) -> Vec<SyncAction> {
    match event {
        StreamEvent::MessageReceived { message } => vec![MessageAction::MessageReceived {
            message: message.clone(),
        }
        .into()],

        StreamEvent::ObjectUpdated { update } => vec![match update {
            ObjectUpdate::User(patch) => UserAction::UserPatched {
                patch: patch.clone(),
            }
            .into(),
            ObjectUpdate::Space(patch) => SpaceAction::SpacePatched {
                patch: patch.clone(),
            }
            .into(),
        }],

        StreamEvent::ObjectDeleted { kind, id } => vec![match kind {
            ObjectKind::User => UserAction::UserDeleted { user_id: id.clone() }.into(),
            ObjectKind::Space => SpaceAction::SpaceDeleted {
                space_id: id.clone(),
            }
            .into(),
        }],

        StreamEvent::MembershipAdded { event } => vec![MembershipAction::UserAddedToSpace {
            event: event.clone(),
        }
        .into()],

        StreamEvent::MembershipUpdated { event } => {
            vec![MembershipAction::MembershipUpdatedOnSpace {
                event: event.clone(),
            }
            .into()]
        }

        StreamEvent::MembershipRemoved { user_id, space_id } => {
            vec![MembershipAction::UserRemovedFromSpace {
                user_id: user_id.clone(),
                space_id: space_id.clone(),
            }
            .into()]
        }

        StreamEvent::PresenceChanged { event } => presence_actions(event),

        StreamEvent::ConnectionChanged { status } => vec![match status {
            ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => {
                ConnectionAction::Connecting
            }
            ConnectionStatus::Connected => ConnectionAction::Connected,
            ConnectionStatus::Disconnected | ConnectionStatus::DisconnectedUnexpectedly => {
                ConnectionAction::Disconnected
            }
        }
        .into()],
    }
}

/// One action per non-empty part of a presence event. An event naming
/// nobody still carries the new occupancy.
fn presence_actions(event: &PresenceEvent) -> Vec<SyncAction> {
    let channel = &event.channel;
    let occupancy = event.occupancy;
    let mut actions: Vec<SyncAction> = Vec::new();

    if !event.joined.is_empty() {
        actions.push(
            PresenceAction::Joined {
                channel: channel.clone(),
                occupancy,
                user_ids: event.joined.clone(),
            }
            .into(),
        );
    }
    if !event.left.is_empty() {
        actions.push(
            PresenceAction::Left {
                channel: channel.clone(),
                occupancy,
                user_ids: event.left.clone(),
            }
            .into(),
        );
    }
    if !event.timed_out.is_empty() {
        actions.push(
            PresenceAction::TimedOut {
                channel: channel.clone(),
                occupancy,
                user_ids: event.timed_out.clone(),
            }
            .into(),
        );
    }
    if !event.state_changes.is_empty() {
        actions.push(
            PresenceAction::StateChanged {
                channel: channel.clone(),
                occupancy,
                states: event.state_changes.clone(),
            }
            .into(),
        );
    }

    if actions.is_empty() {
        actions.push(
            PresenceAction::OccupancyChanged {
                channel: channel.clone(),
                occupancy,
            }
            .into(),
        );
    }
    actions
}
