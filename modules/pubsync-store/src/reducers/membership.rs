//! User-side links. Mirrors removals made from the space side.

use std::collections::HashMap;

use pubsync_core::{transcode_all, transcode_embedded, Relationship, Schema};
use pubsync_world::{MembershipObject, Page};

use super::{merge_links, remove_links};
use crate::actions::{MemberAction, MembershipAction, SyncAction};

pub fn reduce<S: Schema>(
    memberships_by_user: &mut HashMap<String, Vec<S::Membership>>,
    action: &SyncAction,
) {
    match action {
        SyncAction::Membership(action) => match action {
            MembershipAction::MembershipsRetrieved { user_id, page }
            | MembershipAction::SpacesJoined { user_id, page }
            | MembershipAction::MembershipsUpdated { user_id, page } => {
                merge_page::<S>(memberships_by_user, user_id, page)
            }
            MembershipAction::SpacesLeft {
                user_id,
                page,
                left_ids,
            } => {
                if let Some(list) = memberships_by_user.get_mut(user_id) {
                    remove_links(list, left_ids);
                }
                merge_page::<S>(memberships_by_user, user_id, page);
            }
            MembershipAction::UserAddedToSpace { event }
            | MembershipAction::MembershipUpdatedOnSpace { event } => {
                let decoded: Option<S::Membership> =
                    transcode_embedded(event.membership.as_ref());
                // Filed under the link's own user, not the event header
                if let Some(membership) = decoded {
                    merge_links(
                        memberships_by_user
                            .entry(membership.user_id().to_string())
                            .or_default(),
                        vec![membership],
                    );
                }
            }
            MembershipAction::UserRemovedFromSpace { user_id, space_id } => {
                if let Some(list) = memberships_by_user.get_mut(user_id) {
                    remove_links(list, std::slice::from_ref(space_id));
                }
            }
            _ => {}
        },

        // Members removed from a space lose that membership too
        SyncAction::Member(MemberAction::MembersRemoved {
            space_id,
            removed_ids,
            ..
        }) => {
            for user_id in removed_ids {
                if let Some(list) = memberships_by_user.get_mut(user_id) {
                    remove_links(list, std::slice::from_ref(space_id));
                }
            }
        }

        _ => {}
    }
}

fn merge_page<S: Schema>(
    memberships_by_user: &mut HashMap<String, Vec<S::Membership>>,
    user_id: &str,
    page: &Page<MembershipObject>,
) {
    let decoded: Vec<S::Membership> = transcode_all(&page.data);
    merge_links(
        memberships_by_user.entry(user_id.to_string()).or_default(),
        decoded,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::membership;
    use pubsync_core::DefaultSchema;
    use pubsync_world::MembershipEvent;

    type Memberships = HashMap<String, Vec<MembershipObject>>;

    fn run(memberships: &mut Memberships, action: impl Into<SyncAction>) {
        reduce::<DefaultSchema>(memberships, &action.into());
    }

    fn space_ids(memberships: &Memberships, user_id: &str) -> Vec<String> {
        memberships
            .get(user_id)
            .map(|list| list.iter().map(|m| m.space_id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn pages_merge_in_space_id_order() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::MembershipsRetrieved {
                user_id: "u1".into(),
                page: Page::new(vec![
                    membership("u1", "s3", "e1", 0),
                    membership("u1", "s1", "e1", 0),
                ]),
            },
        );
        run(
            &mut memberships,
            MembershipAction::MembershipsRetrieved {
                user_id: "u1".into(),
                page: Page::new(vec![membership("u1", "s2", "e1", 0)]),
            },
        );

        assert_eq!(space_ids(&memberships, "u1"), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn stale_page_keeps_newer_membership() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::MembershipsUpdated {
                user_id: "u1".into(),
                page: Page::new(vec![membership("u1", "s1", "e2", 10)]),
            },
        );
        run(
            &mut memberships,
            MembershipAction::MembershipsRetrieved {
                user_id: "u1".into(),
                page: Page::new(vec![membership("u1", "s1", "e1", 1)]),
            },
        );

        let list = &memberships["u1"];
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].e_tag, "e2");
    }

    #[test]
    fn newer_page_replaces_membership_in_place() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::MembershipsRetrieved {
                user_id: "u1".into(),
                page: Page::new(vec![
                    membership("u1", "s1", "e1", 0),
                    membership("u1", "s2", "e1", 0),
                ]),
            },
        );
        run(
            &mut memberships,
            MembershipAction::MembershipsUpdated {
                user_id: "u1".into(),
                page: Page::new(vec![membership("u1", "s1", "e2", 4)]),
            },
        );

        let list = &memberships["u1"];
        assert_eq!(space_ids(&memberships, "u1"), vec!["s1", "s2"]);
        assert_eq!(list[0].e_tag, "e2");
    }

    #[test]
    fn spaces_left_removes_then_merges_remaining() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::SpacesJoined {
                user_id: "u1".into(),
                page: Page::new(vec![
                    membership("u1", "s1", "e1", 0),
                    membership("u1", "s2", "e1", 0),
                ]),
            },
        );
        run(
            &mut memberships,
            MembershipAction::SpacesLeft {
                user_id: "u1".into(),
                page: Page::new(vec![membership("u1", "s2", "e1", 0)]),
                left_ids: vec!["s1".into()],
            },
        );

        assert_eq!(space_ids(&memberships, "u1"), vec!["s2"]);
    }

    #[test]
    fn live_add_and_remove_touch_the_user_list() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::UserAddedToSpace {
                event: MembershipEvent::from_membership(membership("u1", "s1", "e1", 0)),
            },
        );
        assert_eq!(space_ids(&memberships, "u1"), vec!["s1"]);

        run(
            &mut memberships,
            MembershipAction::UserRemovedFromSpace {
                user_id: "u1".into(),
                space_id: "s1".into(),
            },
        );
        assert!(space_ids(&memberships, "u1").is_empty());
    }

    #[test]
    fn live_add_is_idempotent() {
        let mut memberships = Memberships::new();
        let event = MembershipEvent::from_membership(membership("u1", "s1", "e1", 0));
        for _ in 0..2 {
            run(
                &mut memberships,
                MembershipAction::UserAddedToSpace {
                    event: event.clone(),
                },
            );
        }
        assert_eq!(memberships["u1"].len(), 1);
    }

    #[test]
    fn member_removal_drops_the_mirrored_membership() {
        let mut memberships = Memberships::new();
        run(
            &mut memberships,
            MembershipAction::MembershipsRetrieved {
                user_id: "u1".into(),
                page: Page::new(vec![
                    membership("u1", "s1", "e1", 0),
                    membership("u1", "s2", "e1", 0),
                ]),
            },
        );
        run(
            &mut memberships,
            MemberAction::MembersRemoved {
                space_id: "s1".into(),
                page: Page::new(vec![]),
                removed_ids: vec!["u1".into()],
            },
        );

        assert_eq!(space_ids(&memberships, "u1"), vec!["s2"]);
    }

    #[test]
    fn live_link_is_filed_under_its_own_user() {
        let mut memberships = Memberships::new();
        let event = MembershipEvent {
            user_id: "u9".into(),
            ..MembershipEvent::from_membership(membership("u1", "s1", "e1", 0))
        };

        run(&mut memberships, MembershipAction::UserAddedToSpace { event });

        assert_eq!(space_ids(&memberships, "u1"), vec!["s1"]);
        assert!(!memberships.contains_key("u9"));
    }
}
