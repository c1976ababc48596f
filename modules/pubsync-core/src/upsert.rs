//! Upserts for keyed maps and id-ordered lists.
//!
//! Every replacement goes through [`can_replace`]; none of these functions
//! compares timestamps or e_tags on its own. A `Some` return is the value that
//! was displaced, so callers can tell which updates took.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::mem;

use crate::conflict::{can_replace, Versioned};

/// Insert `candidate` when its id is absent, otherwise replace the stored
/// value if the conflict rule allows it.
pub fn upsert_keyed<T: Versioned>(map: &mut HashMap<String, T>, candidate: T) -> Option<T> {
    match map.entry(candidate.id().to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(candidate);
            None
        }
        Entry::Occupied(mut slot) => {
            if can_replace(slot.get(), &candidate) {
                Some(slot.insert(candidate))
            } else {
                None
            }
        }
    }
}

/// Replace an existing entry only. An absent id is a no-op, never an insert.
pub fn update_keyed<T: Versioned>(map: &mut HashMap<String, T>, candidate: T) -> Option<T> {
    let current = map.get_mut(candidate.id())?;
    if can_replace(current, &candidate) {
        Some(mem::replace(current, candidate))
    } else {
        None
    }
}

/// Upsert into a list holding at most one entry per id.
///
/// The scan stops at the first id match whether or not the candidate wins.
/// Only a list with no match grows, so this never introduces a duplicate id.
pub fn upsert_ordered<T: Versioned>(list: &mut Vec<T>, candidate: T) -> Option<T> {
    match list.iter_mut().find(|existing| existing.id() == candidate.id()) {
        Some(existing) => {
            if can_replace(existing, &candidate) {
                Some(mem::replace(existing, candidate))
            } else {
                None
            }
        }
        None => {
            list.push(candidate);
            None
        }
    }
}

/// Apply [`upsert_ordered`] per candidate, in input order. Returns only the
/// elements that were actually displaced.
pub fn bulk_upsert<T, I>(list: &mut Vec<T>, candidates: I) -> Vec<T>
where
    T: Versioned,
    I: IntoIterator<Item = T>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| upsert_ordered(list, candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::tests::{doc, Doc};

    #[test]
    fn keyed_insert_then_older_never_replaces() {
        let mut map = HashMap::new();

        assert!(upsert_keyed(&mut map, doc("u1", "e2", 10)).is_none());
        assert_eq!(map.len(), 1);

        assert!(upsert_keyed(&mut map, doc("u1", "e1", 5)).is_none());
        assert_eq!(map["u1"].e_tag, "e2");
    }

    #[test]
    fn keyed_newer_replaces_and_returns_old() {
        let mut map = HashMap::new();
        upsert_keyed(&mut map, doc("u1", "e1", 0));

        let replaced = upsert_keyed(&mut map, doc("u1", "e2", 1)).unwrap();
        assert_eq!(replaced.e_tag, "e1");
        assert_eq!(map["u1"].e_tag, "e2");
    }

    #[test]
    fn update_only_does_not_insert() {
        let mut map: HashMap<String, Doc> = HashMap::new();
        assert!(update_keyed(&mut map, doc("u1", "e1", 0)).is_none());
        assert!(map.is_empty());

        map.insert("u1".into(), doc("u1", "e1", 0));
        let replaced = update_keyed(&mut map, doc("u1", "e2", 1)).unwrap();
        assert_eq!(replaced.e_tag, "e1");
        assert_eq!(map["u1"].e_tag, "e2");
    }

    #[test]
    fn ordered_upsert_is_idempotent() {
        let mut once = vec![doc("a", "e1", 0), doc("b", "e1", 0)];
        let x = doc("a", "e2", 1);

        assert!(upsert_ordered(&mut once, x.clone()).is_some());
        let mut twice = once.clone();
        assert!(upsert_ordered(&mut twice, x).is_none());
        assert_eq!(once, twice);
    }

    #[test]
    fn ordered_upsert_appends_unknown_ids() {
        let mut list = vec![doc("a", "e1", 0)];
        assert!(upsert_ordered(&mut list, doc("c", "e1", 0)).is_none());
        assert!(upsert_ordered(&mut list, doc("b", "e1", 0)).is_none());

        let ids: Vec<&str> = list.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn ordered_upsert_replaces_in_place() {
        let mut list = vec![doc("a", "e1", 0), doc("b", "e1", 0), doc("c", "e1", 0)];
        upsert_ordered(&mut list, doc("b", "e2", 1));

        assert_eq!(list[1].id, "b");
        assert_eq!(list[1].e_tag, "e2");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn bulk_upsert_reports_only_replacements() {
        let mut list = vec![doc("a", "e1", 0), doc("b", "e1", 0)];
        let replaced = bulk_upsert(
            &mut list,
            vec![
                doc("a", "e2", 1),  // newer: replaces
                doc("b", "e1", 5),  // same e_tag: no-op
                doc("c", "e1", 0),  // new: appended
                doc("c", "e2", -1), // older than the appended one: no-op
            ],
        );

        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].id, "a");
        assert_eq!(replaced[0].e_tag, "e1");
        assert_eq!(list.len(), 3);
        assert_eq!(list[2].e_tag, "e1");
    }

    #[test]
    fn bulk_upsert_collapses_duplicate_candidates() {
        let mut list = Vec::new();
        bulk_upsert(&mut list, vec![doc("a", "e1", 0), doc("a", "e2", 1)]);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].e_tag, "e2");
    }
}
