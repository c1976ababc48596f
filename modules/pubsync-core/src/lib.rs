//! Pure building blocks for keeping synced collections consistent.
//!
//! - [`conflict`] decides whether one version of an entity may replace another.
//! - [`upsert`] applies that rule to keyed maps and id-ordered lists.
//! - [`merge`] merges paginated continuations and message streams in order.
//! - [`transcode`] turns wire shapes into application types without letting
//!   one bad embedded value sink its container.
//! - [`schema`] bundles the application's chosen type per entity kind.
//!
//! Nothing here locks, allocates shared state, or performs I/O. Callers are
//! expected to serialize writes.

pub mod conflict;
pub mod merge;
pub mod schema;
pub mod transcode;
pub mod upsert;

pub use conflict::{can_replace, Versioned};
pub use merge::{dedup_merge, merge_messages};
pub use schema::{
    ChannelOccupancy, DefaultSchema, Entity, Envelope, MessageEnvelope, PatchableEntity,
    Relationship, Schema,
};
pub use transcode::{
    decode_occupancy, decode_state, transcode, transcode_all, transcode_embedded,
    ToWire, Transcode, TranscodeError,
};
pub use upsert::{bulk_upsert, update_keyed, upsert_keyed, upsert_ordered};
