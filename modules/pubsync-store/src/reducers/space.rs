use std::collections::HashMap;

use pubsync_core::Schema;
use pubsync_world::SpaceObject;

use super::{apply_patch, upsert_all};
use crate::actions::{MembershipAction, SpaceAction, SyncAction};

pub fn reduce<S: Schema>(spaces: &mut HashMap<String, S::Space>, action: &SyncAction) {
    match action {
        SyncAction::Space(action) => match action {
            SpaceAction::SpacesRetrieved { page } => upsert_all(spaces, &page.data),
            SpaceAction::SpaceRetrieved { space }
            | SpaceAction::SpaceCreated { space }
            | SpaceAction::SpaceUpdated { space } => upsert_all(spaces, [space]),
            SpaceAction::SpaceDeleted { space_id } => {
                spaces.remove(space_id);
            }
            SpaceAction::SpacePatched { patch } => {
                apply_patch::<S::Space, SpaceObject, _>(spaces, patch)
            }
            _ => {}
        },

        // Spaces embedded in membership lists
        SyncAction::Membership(action) => match action {
            MembershipAction::MembershipsRetrieved { page, .. }
            | MembershipAction::SpacesJoined { page, .. }
            | MembershipAction::MembershipsUpdated { page, .. }
            | MembershipAction::SpacesLeft { page, .. } => {
                upsert_all(spaces, page.data.iter().filter_map(|m| m.space.as_ref()))
            }
            MembershipAction::UserAddedToSpace { event }
            | MembershipAction::MembershipUpdatedOnSpace { event } => upsert_all(
                spaces,
                event.membership.as_ref().and_then(|m| m.space.as_ref()),
            ),
            _ => {}
        },

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, membership, space};
    use pubsync_core::DefaultSchema;
    use pubsync_world::{MembershipEvent, MembershipObject, ObjectPatch, Page, SpaceField};

    type Spaces = HashMap<String, SpaceObject>;

    fn run(spaces: &mut Spaces, action: impl Into<SyncAction>) {
        reduce::<DefaultSchema>(spaces, &action.into());
    }

    #[test]
    fn fetched_spaces_are_upserted() {
        let mut spaces = Spaces::new();
        run(
            &mut spaces,
            SpaceAction::SpacesRetrieved {
                page: Page::new(vec![space("s1", "e1", 0), space("s2", "e1", 0)]),
            },
        );
        run(&mut spaces, SpaceAction::SpaceUpdated { space: space("s1", "e2", 3) });

        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces["s1"].e_tag, "e2");
    }

    #[test]
    fn delete_removes_the_space() {
        let mut spaces = Spaces::new();
        run(&mut spaces, SpaceAction::SpaceCreated { space: space("s1", "e1", 0) });
        run(&mut spaces, SpaceAction::SpaceDeleted { space_id: "s1".into() });
        assert!(spaces.is_empty());
    }

    #[test]
    fn patch_clears_an_optional_field() {
        let mut spaces = Spaces::new();
        let mut described = space("s1", "e1", 0);
        described.description = Some("old".into());
        run(&mut spaces, SpaceAction::SpaceRetrieved { space: described });

        let patch = ObjectPatch::new("s1", "e2", at(2)).with_change(SpaceField::Description(None));
        run(&mut spaces, SpaceAction::SpacePatched { patch });

        assert_eq!(spaces["s1"].description, None);
        assert_eq!(spaces["s1"].e_tag, "e2");
    }

    #[test]
    fn spaces_embedded_in_memberships_are_upserted() {
        let mut spaces = Spaces::new();
        let joined = MembershipObject {
            space: Some(space("s1", "e1", 0)),
            ..membership("u1", "s1", "m1", 0)
        };
        run(
            &mut spaces,
            MembershipAction::SpacesJoined {
                user_id: "u1".into(),
                page: Page::new(vec![joined.clone()]),
            },
        );
        assert!(spaces.contains_key("s1"));

        let newer = MembershipObject {
            space: Some(space("s1", "e2", 9)),
            ..joined
        };
        run(
            &mut spaces,
            MembershipAction::MembershipUpdatedOnSpace {
                event: MembershipEvent::from_membership(newer),
            },
        );
        assert_eq!(spaces["s1"].e_tag, "e2");
    }
}
