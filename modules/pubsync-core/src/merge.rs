//! Ordered merges: paginated continuations and per-channel message streams.

use std::collections::HashMap;

use tracing::debug;

use pubsync_world::Timetoken;

use crate::schema::MessageEnvelope;

/// Merge `incoming` into `sorted_self`, keeping the result ascending by
/// `key_of` with at most one element per incoming key.
///
/// `sorted_self` must already be ascending. `incoming` is sorted here. On a
/// key collision the incoming value wins unless `preserve_original` is set.
/// Incoming values that share a key collapse the same way, so an empty
/// `sorted_self` still yields one element per key.
///
/// The starting cursor is found by scanning back from the tail, which is
/// cheap for the usual "append the next page" workload. Landing in the middle
/// costs an insert that shifts the remainder.
pub fn dedup_merge<T, K, F>(
    sorted_self: &[T],
    mut incoming: Vec<T>,
    key_of: F,
    preserve_original: bool,
) -> Vec<T>
where
    T: Clone + PartialEq,
    K: Ord,
    F: Fn(&T) -> K,
{
    if incoming.is_empty() {
        return sorted_self.to_vec();
    }
    incoming.sort_by(|a, b| key_of(a).cmp(&key_of(b)));

    let mut merged = sorted_self.to_vec();

    // Everything before the cursor is strictly below the smallest incoming key.
    let first_key = key_of(&incoming[0]);
    let mut cursor = merged.len();
    while cursor > 0 && key_of(&merged[cursor - 1]) >= first_key {
        cursor -= 1;
    }

    for value in incoming {
        if merged.get(cursor) == Some(&value) {
            continue;
        }

        let key = key_of(&value);
        while cursor < merged.len() && key_of(&merged[cursor]) < key {
            cursor += 1;
        }

        if cursor == merged.len() {
            merged.push(value);
        } else if key_of(&merged[cursor]) == key {
            if !preserve_original {
                merged[cursor] = value;
            }
        } else {
            merged.insert(cursor, value);
        }
    }

    merged
}

/// Merge messages into a channel's ascending history.
///
/// Incoming messages already present in `current` are skipped, as are
/// repeats inside `incoming`. A message whose timetoken is already taken by a
/// different payload is dropped: timetokens are assigned once and the first
/// copy wins.
pub fn merge_messages<T: MessageEnvelope>(current: &[T], incoming: Vec<T>) -> Vec<T> {
    let known: HashMap<Timetoken, &T> = current
        .iter()
        .map(|message| (message.timetoken(), message))
        .collect();

    let mut remainder: Vec<T> = incoming
        .into_iter()
        .filter(|message| match known.get(&message.timetoken()) {
            None => true,
            Some(existing) => {
                if *existing != message {
                    debug!(
                        channel = message.channel(),
                        timetoken = %message.timetoken(),
                        "Conflicting payload for known timetoken, message dropped"
                    );
                }
                false
            }
        })
        .collect();

    // Stable sort keeps arrival order among equal timetokens; dedup keeps the first.
    remainder.sort_by_key(|message| message.timetoken());
    remainder.dedup_by(|later, earlier| later.timetoken() == earlier.timetoken());

    if current.is_empty() {
        return remainder;
    }
    if remainder.is_empty() {
        return current.to_vec();
    }

    let in_order = match (current.last(), remainder.first()) {
        (Some(last), Some(first)) => last.timetoken() < first.timetoken(),
        _ => true,
    };

    let mut merged = current.to_vec();
    merged.extend(remainder);
    if !in_order {
        merged.sort_by_key(|message| message.timetoken());
    }
    merged
}
