//! The single conflict rule shared by every collection.

use chrono::{DateTime, Utc};
use pubsync_world::{MemberObject, MembershipObject, SpaceObject, UserObject};

/// Identity and version of a synced entity.
///
/// `created` is deliberately absent: it never takes part in precedence.
pub trait Versioned {
    /// Unique within the entity's collection. For relationships this is the
    /// id of the far end (space id for memberships, user id for members).
    fn id(&self) -> &str;
    fn e_tag(&self) -> &str;
    fn updated(&self) -> DateTime<Utc>;
}

/// May `candidate` replace `current`?
///
/// True only for the same id, a different e_tag, and a strictly later
/// `updated`. An equal e_tag is a no-op whatever the timestamps say; an equal
/// or earlier timestamp is a no-op whatever the e_tag says.
pub fn can_replace<T: Versioned + ?Sized>(current: &T, candidate: &T) -> bool {
    current.id() == candidate.id()
        && current.e_tag() != candidate.e_tag()
        && candidate.updated() > current.updated()
}

impl Versioned for UserObject {
    fn id(&self) -> &str {
        &self.id
    }

    fn e_tag(&self) -> &str {
        &self.e_tag
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Versioned for SpaceObject {
    fn id(&self) -> &str {
        &self.id
    }

    fn e_tag(&self) -> &str {
        &self.e_tag
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Versioned for MembershipObject {
    fn id(&self) -> &str {
        &self.space_id
    }

    fn e_tag(&self) -> &str {
        &self.e_tag
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Versioned for MemberObject {
    fn id(&self) -> &str {
        &self.user_id
    }

    fn e_tag(&self) -> &str {
        &self.e_tag
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Doc {
        pub id: String,
        pub e_tag: String,
        pub updated: DateTime<Utc>,
        pub body: &'static str,
    }

    impl Versioned for Doc {
        fn id(&self) -> &str {
            &self.id
        }

        fn e_tag(&self) -> &str {
            &self.e_tag
        }

        fn updated(&self) -> DateTime<Utc> {
            self.updated
        }
    }

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn doc(id: &str, e_tag: &str, offset_secs: i64) -> Doc {
        Doc {
            id: id.into(),
            e_tag: e_tag.into(),
            updated: t0() + Duration::seconds(offset_secs),
            body: "",
        }
    }

    #[test]
    fn same_etag_never_replaces() {
        let a = doc("u1", "e1", 0);
        let b = doc("u1", "e1", 1);
        assert!(!can_replace(&a, &b));
    }

    #[test]
    fn older_timestamp_never_replaces() {
        let a = doc("u1", "e1", 0);
        let c = doc("u1", "e2", -1);
        assert!(!can_replace(&a, &c));
    }

    #[test]
    fn equal_timestamp_never_replaces() {
        let a = doc("u1", "e1", 0);
        let b = doc("u1", "e2", 0);
        assert!(!can_replace(&a, &b));
    }

    #[test]
    fn newer_version_with_new_etag_replaces() {
        let a = doc("u1", "e1", 0);
        let d = doc("u1", "e2", 1);
        assert!(can_replace(&a, &d));
        // Not symmetric: the older one can never win back.
        assert!(!can_replace(&d, &a));
    }

    #[test]
    fn different_ids_never_replace() {
        let a = doc("u1", "e1", 0);
        let other = doc("u2", "e2", 10);
        assert!(!can_replace(&a, &other));
    }

    #[test]
    fn relationship_identity_is_the_far_end() {
        let membership = MembershipObject {
            user_id: "u1".into(),
            space_id: "s1".into(),
            space: None,
            is_moderator: false,
            custom: None,
            created: t0(),
            updated: t0(),
            e_tag: "m1".into(),
        };
        let member = membership.to_member(None);

        assert_eq!(Versioned::id(&membership), "s1");
        assert_eq!(Versioned::id(&member), "u1");
    }
}
