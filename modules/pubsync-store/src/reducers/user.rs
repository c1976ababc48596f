use std::collections::HashMap;

use pubsync_core::Schema;
use pubsync_world::UserObject;

use super::{apply_patch, upsert_all};
use crate::actions::{MemberAction, MembershipAction, SyncAction, UserAction};

pub fn reduce<S: Schema>(users: &mut HashMap<String, S::User>, action: &SyncAction) {
    match action {
        SyncAction::User(action) => match action {
            UserAction::UsersRetrieved { page } => upsert_all(users, &page.data),
            UserAction::UserRetrieved { user }
            | UserAction::UserCreated { user }
            | UserAction::UserUpdated { user } => upsert_all(users, [user]),
            UserAction::UserDeleted { user_id } => {
                users.remove(user_id);
            }
            UserAction::UserPatched { patch } => {
                apply_patch::<S::User, UserObject, _>(users, patch)
            }
            _ => {}
        },

        // Users embedded in member lists
        SyncAction::Member(
            MemberAction::MembersRetrieved { page, .. }
            | MemberAction::MembersAdded { page, .. }
            | MemberAction::MembersUpdated { page, .. }
            | MemberAction::MembersRemoved { page, .. },
        ) => upsert_all(users, page.data.iter().filter_map(|m| m.user.as_ref())),

        // User embedded in a live link event
        SyncAction::Membership(
            MembershipAction::UserAddedToSpace { event }
            | MembershipAction::MembershipUpdatedOnSpace { event },
        ) => upsert_all(
            users,
            event.member.as_ref().and_then(|m| m.user.as_ref()),
        ),

        _ => {}
    }
}
