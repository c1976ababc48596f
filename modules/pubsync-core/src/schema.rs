//! The application's chosen representation per entity kind.
//!
//! A [`Schema`] names one concrete type for each of the six kinds. Collections
//! are generic over it, so the capability contract is checked at compile time:
//! each type must be versioned (or timetoken-ordered) and decodable from its
//! wire shape.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pubsync_world::{
    MemberObject, MembershipObject, SpaceObject, Timetoken, UserObject, WireMessage,
};

use crate::conflict::Versioned;
use crate::transcode::{ToWire, Transcode, TranscodeError};

/// A versioned entity decodable from wire shape `W`.
pub trait Entity<W>:
    Versioned + Transcode<W> + Clone + PartialEq + Debug + Send + Sync + 'static
{
}

impl<T, W> Entity<W> for T where
    T: Versioned + Transcode<W> + Clone + PartialEq + Debug + Send + Sync + 'static
{
}

/// An entity that field patches can be written onto.
pub trait PatchableEntity<W>: Entity<W> + ToWire<W> {}

impl<T, W> PatchableEntity<W> for T where T: Entity<W> + ToWire<W> {}

/// Both ends of a user↔space link.
pub trait Relationship {
    fn user_id(&self) -> &str;
    fn space_id(&self) -> &str;
}

impl Relationship for MembershipObject {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn space_id(&self) -> &str {
        &self.space_id
    }
}

impl Relationship for MemberObject {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn space_id(&self) -> &str {
        &self.space_id
    }
}

/// A message with a decoded payload. Identity is the timetoken; equal
/// timetokens mean the same message.
pub trait MessageEnvelope:
    Transcode<WireMessage> + Clone + PartialEq + Debug + Send + Sync + 'static
{
    type Content;

    fn channel(&self) -> &str;
    fn timetoken(&self) -> Timetoken;
    fn content(&self) -> &Self::Content;
}

/// The stock envelope: payload decoded with serde into `C`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<C> {
    pub channel: String,
    pub timetoken: Timetoken,
    pub content: C,
}

impl<C: DeserializeOwned> Transcode<WireMessage> for Envelope<C> {
    fn transcode(wire: &WireMessage) -> Result<Self, TranscodeError> {
        Ok(Envelope {
            channel: wire.channel.clone(),
            timetoken: wire.timetoken,
            content: serde_json::from_value(wire.payload.clone())?,
        })
    }
}

impl<C> MessageEnvelope for Envelope<C>
where
    C: DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static,
{
    type Content = C;

    fn channel(&self) -> &str {
        &self.channel
    }

    fn timetoken(&self) -> Timetoken {
        self.timetoken
    }

    fn content(&self) -> &C {
        &self.content
    }
}

/// Presence for one channel with decoded states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOccupancy<P> {
    pub occupancy: u32,
    pub occupants: BTreeMap<String, Option<P>>,
}

impl<P> Default for ChannelOccupancy<P> {
    fn default() -> Self {
        Self {
            occupancy: 0,
            occupants: BTreeMap::new(),
        }
    }
}

/// One concrete type per entity kind.
pub trait Schema: Debug + Clone + Default + Send + Sync + 'static {
    type User: PatchableEntity<UserObject>;
    type Space: PatchableEntity<SpaceObject>;
    type Membership: Entity<MembershipObject> + Relationship;
    type Member: Entity<MemberObject> + Relationship;
    type Message: MessageEnvelope;
    type Presence: DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static;
}

/// Wire shapes all the way down, with message content of type `C`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultSchema<C = serde_json::Value>(PhantomData<fn() -> C>);

impl<C> Default for DefaultSchema<C> {
    fn default() -> Self {
        DefaultSchema(PhantomData)
    }
}

impl<C> Schema for DefaultSchema<C>
where
    C: DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static,
{
    type User = UserObject;
    type Space = SpaceObject;
    type Membership = MembershipObject;
    type Member = MemberObject;
    type Message = Envelope<C>;
    type Presence = serde_json::Value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::transcode;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Chat {
        text: String,
    }

    #[test]
    fn envelope_decodes_typed_content() {
        let wire = WireMessage {
            channel: "lobby".into(),
            timetoken: Timetoken(7),
            payload: json!({"text": "hello"}),
        };

        let envelope: Envelope<Chat> = transcode(&wire).unwrap();
        assert_eq!(envelope.channel(), "lobby");
        assert_eq!(envelope.timetoken(), Timetoken(7));
        assert_eq!(envelope.content().text, "hello");
    }

    #[test]
    fn envelope_with_wrong_payload_is_absent() {
        let wire = WireMessage {
            channel: "lobby".into(),
            timetoken: Timetoken(8),
            payload: json!("just a string"),
        };

        assert!(transcode::<Envelope<Chat>, _>(&wire).is_none());
    }
}
