//! Space-side links. Mirrors removals made from the user side.

use std::collections::HashMap;

use pubsync_core::{transcode_all, transcode_embedded, Relationship, Schema};
use pubsync_world::{MemberObject, Page};

use super::{merge_links, remove_links};
use crate::actions::{MemberAction, MembershipAction, SyncAction};

pub fn reduce<S: Schema>(
    members_by_space: &mut HashMap<String, Vec<S::Member>>,
    action: &SyncAction,
) {
    match action {
        SyncAction::Member(action) => match action {
            MemberAction::MembersRetrieved { space_id, page }
            | MemberAction::MembersAdded { space_id, page }
            | MemberAction::MembersUpdated { space_id, page } => {
                merge_page::<S>(members_by_space, space_id, page)
            }
            MemberAction::MembersRemoved {
                space_id,
                page,
                removed_ids,
            } => {
                if let Some(list) = members_by_space.get_mut(space_id) {
                    remove_links(list, removed_ids);
                }
                merge_page::<S>(members_by_space, space_id, page);
            }
            _ => {}
        },

        SyncAction::Membership(action) => match action {
            MembershipAction::UserAddedToSpace { event }
            | MembershipAction::MembershipUpdatedOnSpace { event } => {
                let decoded: Option<S::Member> = transcode_embedded(event.member.as_ref());
                if let Some(member) = decoded {
                    merge_links(
                        members_by_space
                            .entry(member.space_id().to_string())
                            .or_default(),
                        vec![member],
                    );
                }
            }
            MembershipAction::UserRemovedFromSpace { user_id, space_id } => {
                if let Some(list) = members_by_space.get_mut(space_id) {
                    remove_links(list, std::slice::from_ref(user_id));
                }
            }
            // Spaces a user left lose that member too
            MembershipAction::SpacesLeft {
                user_id, left_ids, ..
            } => {
                for space_id in left_ids {
                    if let Some(list) = members_by_space.get_mut(space_id) {
                        remove_links(list, std::slice::from_ref(user_id));
                    }
                }
            }
            _ => {}
        },

        _ => {}
    }
}

fn merge_page<S: Schema>(
    members_by_space: &mut HashMap<String, Vec<S::Member>>,
    space_id: &str,
    page: &Page<MemberObject>,
) {
    let decoded: Vec<S::Member> = transcode_all(&page.data);
    merge_links(
        members_by_space.entry(space_id.to_string()).or_default(),
        decoded,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{member, membership};
    use pubsync_core::DefaultSchema;
    use pubsync_world::MembershipEvent;

    type Members = HashMap<String, Vec<MemberObject>>;

    fn run(members: &mut Members, action: impl Into<SyncAction>) {
        reduce::<DefaultSchema>(members, &action.into());
    }

    fn user_ids(members: &Members, space_id: &str) -> Vec<String> {
        members
            .get(space_id)
            .map(|list| list.iter().map(|m| m.user_id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn removal_then_remaining_page() {
        let mut members = Members::new();
        run(
            &mut members,
            MemberAction::MembersAdded {
                space_id: "s1".into(),
                page: Page::new(vec![
                    member("s1", "u2", "e1", 0),
                    member("s1", "u1", "e1", 0),
                    member("s1", "u3", "e1", 0),
                ]),
            },
        );
        assert_eq!(user_ids(&members, "s1"), vec!["u1", "u2", "u3"]);

        run(
            &mut members,
            MemberAction::MembersRemoved {
                space_id: "s1".into(),
                page: Page::new(vec![member("s1", "u3", "e1", 0)]),
                removed_ids: vec!["u1".into(), "u2".into()],
            },
        );
        assert_eq!(user_ids(&members, "s1"), vec!["u3"]);
    }

    #[test]
    fn live_event_lands_in_the_space_list() {
        let mut members = Members::new();
        run(
            &mut members,
            MembershipAction::UserAddedToSpace {
                event: MembershipEvent::from_membership(membership("u1", "s1", "e1", 0)),
            },
        );
        assert_eq!(user_ids(&members, "s1"), vec!["u1"]);

        run(
            &mut members,
            MembershipAction::UserRemovedFromSpace {
                user_id: "u1".into(),
                space_id: "s1".into(),
            },
        );
        assert!(user_ids(&members, "s1").is_empty());
    }

    #[test]
    fn leaving_spaces_drops_the_mirrored_member() {
        let mut members = Members::new();
        for space_id in ["s1", "s2"] {
            run(
                &mut members,
                MemberAction::MembersRetrieved {
                    space_id: space_id.into(),
                    page: Page::new(vec![
                        member(space_id, "u1", "e1", 0),
                        member(space_id, "u2", "e1", 0),
                    ]),
                },
            );
        }

        run(
            &mut members,
            MembershipAction::SpacesLeft {
                user_id: "u1".into(),
                page: Page::new(vec![]),
                left_ids: vec!["s1".into()],
            },
        );

        assert_eq!(user_ids(&members, "s1"), vec!["u2"]);
        assert_eq!(user_ids(&members, "s2"), vec!["u1", "u2"]);
    }

    #[test]
    fn live_link_is_filed_under_its_own_space() {
        let mut members = Members::new();
        let event = MembershipEvent {
            space_id: "s9".into(),
            ..MembershipEvent::from_membership(membership("u1", "s1", "e1", 0))
        };

        run(&mut members, MembershipAction::MembershipUpdatedOnSpace { event });

        assert_eq!(user_ids(&members, "s1"), vec!["u1"]);
        assert!(!members.contains_key("s9"));
    }
}
