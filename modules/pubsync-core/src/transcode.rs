//! Representation adapter: wire shape → application type.
//!
//! Decoding is fallible per value and failures stop at the value that failed.
//! An embedded object that does not decode leaves its field empty; one bad
//! item in a list drops only that item. The foreign-key ids are plain strings
//! on the wire, so the containing entity stays usable either way.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use pubsync_world::{ChannelPresence, MemberObject, MembershipObject, SpaceObject, UserObject};

use crate::schema::ChannelOccupancy;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscodeError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TranscodeError {
    fn from(err: serde_json::Error) -> Self {
        TranscodeError::Decode(err.to_string())
    }
}

/// Build `Self` from the wire shape `W`.
pub trait Transcode<W>: Sized {
    fn transcode(wire: &W) -> Result<Self, TranscodeError>;
}

/// Project an application value back onto its wire shape. Needed wherever a
/// field patch has to be written onto a stored value.
pub trait ToWire<W> {
    fn to_wire(&self) -> W;
}

/// Decode one value. Never fails past this boundary.
pub fn transcode<T, W>(wire: &W) -> Option<T>
where
    T: Transcode<W>,
{
    match T::transcode(wire) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(
                target_type = std::any::type_name::<T>(),
                error = %err,
                "Transcode failed, value dropped"
            );
            None
        }
    }
}

/// Decode an optional embedded value independently of its container.
pub fn transcode_embedded<T, W>(wire: Option<&W>) -> Option<T>
where
    T: Transcode<W>,
{
    wire.and_then(|value| transcode(value))
}

/// Decode every item that can be decoded; the rest are dropped.
pub fn transcode_all<T, W>(wires: &[W]) -> Vec<T>
where
    T: Transcode<W>,
{
    wires.iter().filter_map(|wire| transcode(wire)).collect()
}

/// Decode per-user presence states for one channel.
///
/// A `null` state stays "present, no state". A state that does not decode
/// drops that occupant from the snapshot.
pub fn decode_occupancy<P: DeserializeOwned>(presence: &ChannelPresence) -> ChannelOccupancy<P> {
    let occupants = presence
        .occupants
        .iter()
        .filter_map(|(user_id, state)| match state {
            None | Some(serde_json::Value::Null) => Some((user_id.clone(), None)),
            Some(value) => decode_state::<P>(value).map(|state| (user_id.clone(), Some(state))),
        })
        .collect();

    ChannelOccupancy {
        occupancy: presence.occupancy,
        occupants,
    }
}

/// Decode one opaque presence state.
pub fn decode_state<P: DeserializeOwned>(value: &serde_json::Value) -> Option<P> {
    match serde_json::from_value::<P>(value.clone()) {
        Ok(state) => Some(state),
        Err(err) => {
            debug!(error = %err, "Presence state did not decode, occupant dropped");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Wire shapes are valid application types as-is
// ---------------------------------------------------------------------------

impl Transcode<UserObject> for UserObject {
    fn transcode(wire: &UserObject) -> Result<Self, TranscodeError> {
        Ok(wire.clone())
    }
}

impl ToWire<UserObject> for UserObject {
    fn to_wire(&self) -> UserObject {
        self.clone()
    }
}

impl Transcode<SpaceObject> for SpaceObject {
    fn transcode(wire: &SpaceObject) -> Result<Self, TranscodeError> {
        Ok(wire.clone())
    }
}

impl ToWire<SpaceObject> for SpaceObject {
    fn to_wire(&self) -> SpaceObject {
        self.clone()
    }
}

impl Transcode<MembershipObject> for MembershipObject {
    fn transcode(wire: &MembershipObject) -> Result<Self, TranscodeError> {
        Ok(wire.clone())
    }
}

impl Transcode<MemberObject> for MemberObject {
    fn transcode(wire: &MemberObject) -> Result<Self, TranscodeError> {
        Ok(wire.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;
    use serde_json::json;

    /// An application user that insists on a typed profile.
    #[derive(Debug, Clone, PartialEq)]
    struct Profile {
        id: String,
        handle: String,
    }

    #[derive(Deserialize)]
    struct ProfileCustom {
        handle: String,
    }

    impl Transcode<UserObject> for Profile {
        fn transcode(wire: &UserObject) -> Result<Self, TranscodeError> {
            let custom = wire
                .custom
                .clone()
                .ok_or_else(|| TranscodeError::MissingField("custom".into()))?;
            let custom: ProfileCustom = serde_json::from_value(custom)?;
            Ok(Profile {
                id: wire.id.clone(),
                handle: custom.handle,
            })
        }
    }

    fn user(id: &str, custom: Option<serde_json::Value>) -> UserObject {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        UserObject {
            id: id.into(),
            name: id.to_uppercase(),
            external_id: None,
            profile_url: None,
            email: None,
            custom,
            created: t,
            updated: t,
            e_tag: "e1".into(),
        }
    }

    #[test]
    fn one_bad_item_drops_only_itself() {
        let wires = vec![
            user("a", Some(json!({"handle": "@a"}))),
            user("b", None),
            user("c", Some(json!({"handle": "@c"}))),
            user("d", Some(json!({"handle": 42}))),
        ];

        let profiles: Vec<Profile> = transcode_all(&wires);
        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(profiles[1].handle, "@c");
    }

    #[test]
    fn embedded_failure_is_absent_not_fatal() {
        let bad = user("b", None);
        assert!(transcode_embedded::<Profile, _>(Some(&bad)).is_none());
        assert!(transcode_embedded::<Profile, UserObject>(None).is_none());
    }

    #[test]
    fn occupancy_keeps_null_state_and_drops_undecodable() {
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        struct Mood {
            mood: String,
        }

        let mut presence = ChannelPresence {
            occupancy: 3,
            ..Default::default()
        };
        presence.occupants.insert("a".into(), None);
        presence
            .occupants
            .insert("b".into(), Some(json!({"mood": "happy"})));
        presence.occupants.insert("c".into(), Some(json!([1, 2])));

        let typed: ChannelOccupancy<Mood> = decode_occupancy(&presence);
        assert_eq!(typed.occupancy, 3);
        assert_eq!(typed.occupants.len(), 2);
        assert_eq!(typed.occupants["a"], None);
        assert_eq!(
            typed.occupants["b"],
            Some(Mood {
                mood: "happy".into()
            })
        );
    }
}
