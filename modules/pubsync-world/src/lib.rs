//! Backend facts: what the pub/sub service hands us.
//!
//! Everything here mirrors the wire: paginated object shapes, message
//! envelopes, presence snapshots, field patches and the live stream events.
//! No conflict rules, no collections, no opinions about application types.

pub mod events;
pub mod patch;
pub mod types;

pub use events::{
    ConnectionStatus, MembershipEvent, ObjectKind, ObjectUpdate, PresenceEvent, StreamEvent,
};
pub use patch::{ObjectPatch, PatchTarget, SpaceField, UserField};
pub use types::{
    ChannelPresence, MemberObject, MembershipObject, Page, SpaceObject, Timetoken, UserObject,
    WireMessage,
};
