//! Pure state updates for the store.
//!
//! The reducer hands every action to every collection's reducer. No I/O;
//! failures and "request started" actions leave state untouched.

use std::marker::PhantomData;

use tracing::debug;

use pubsync_core::Schema;
use pubsync_engine::Reducer;

use crate::actions::SyncAction;
use crate::reducers::{connection, member, membership, message, presence, space, user};
use crate::state::SyncState;

pub struct SyncReducer<S> {
    _schema: PhantomData<fn() -> S>,
}

impl<S> SyncReducer<S> {
    pub fn new() -> Self {
        Self {
            _schema: PhantomData,
        }
    }
}

impl<S> Default for SyncReducer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Schema> Reducer<SyncAction, SyncState<S>> for SyncReducer<S> {
    fn reduce(&self, state: &mut SyncState<S>, action: &SyncAction) {
        if let SyncAction::RequestFailed(failure) = action {
            debug!(request = %failure.request, "Failure recorded, state unchanged");
            return;
        }

        user::reduce::<S>(&mut state.users, action);
        space::reduce::<S>(&mut state.spaces, action);
        membership::reduce::<S>(&mut state.memberships_by_user, action);
        member::reduce::<S>(&mut state.members_by_space, action);
        message::reduce::<S>(&mut state.messages_by_channel, action);
        presence::reduce(&mut state.presence, action);
        connection::reduce(&mut state.connection, action);
    }
}
