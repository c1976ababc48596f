//! Per-collection reducers.
//!
//! Each one sees every action and touches only its own collection. Embedded
//! objects are picked up by the reducer that owns their kind, so one action
//! can land in several collections within a single pass.

pub mod connection;
pub mod member;
pub mod membership;
pub mod message;
pub mod presence;
pub mod space;
pub mod user;

use std::collections::HashMap;

use tracing::debug;

use pubsync_core::{
    bulk_upsert, dedup_merge, transcode, update_keyed, upsert_keyed, PatchableEntity, Transcode,
    Versioned,
};
use pubsync_world::{ObjectPatch, PatchTarget};

/// Decode and upsert each wire object into a keyed map.
pub(crate) fn upsert_all<'a, T, W>(
    map: &mut HashMap<String, T>,
    wires: impl IntoIterator<Item = &'a W>,
) where
    T: Versioned + Transcode<W>,
    W: 'a,
{
    for wire in wires {
        if let Some(value) = transcode::<T, W>(wire) {
            upsert_keyed(map, value);
        }
    }
}

/// Merge decoded links into an id-ordered list.
///
/// New ids are inserted in order; ids already present go through the
/// conflict rule, so a stale page never overwrites a newer link.
pub(crate) fn merge_links<T>(list: &mut Vec<T>, incoming: Vec<T>)
where
    T: Versioned + Clone + PartialEq,
{
    if incoming.is_empty() {
        return;
    }
    *list = dedup_merge(list, incoming.clone(), |link| link.id().to_string(), true);
    bulk_upsert(list, incoming);
}

pub(crate) fn remove_links<T: Versioned>(list: &mut Vec<T>, ids: &[String]) {
    list.retain(|link| !ids.iter().any(|id| id == link.id()));
}

/// Write a live field patch onto the stored value.
///
/// Lookup, patch the wire projection, decode, then replace under the
/// conflict rule. Without a stored base there is nothing to patch.
pub(crate) fn apply_patch<T, W, F>(map: &mut HashMap<String, T>, patch: &ObjectPatch<F>)
where
    T: PatchableEntity<W>,
    W: PatchTarget<Field = F>,
{
    let Some(current) = map.get(&patch.id) else {
        debug!(id = %patch.id, "Patch for unknown object, skipped");
        return;
    };
    let Some(patched) = patch.apply(current.to_wire()) else {
        return;
    };
    let Some(candidate) = transcode::<T, W>(&patched) else {
        return;
    };
    if update_keyed(map, candidate).is_none() {
        debug!(id = %patch.id, e_tag = %patch.e_tag, "Stale patch ignored");
    }
}
