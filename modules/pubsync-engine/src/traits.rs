//! Core traits for the dispatch engine.

use anyhow::Result;
use async_trait::async_trait;

use crate::record::RecordedAction;

/// Anything the engine can dispatch. The type string is `domain.name` and is
/// what the log and the tracing spans key on.
pub trait ActionLike: Clone + Send + Sync + 'static {
    /// Dotted type name, e.g. `user.users_retrieved`.
    fn action_type_str(&self) -> String;

    /// JSON payload stored alongside the type in the action log.
    fn to_record_payload(&self) -> serde_json::Value;
}

/// Pure state updates. No I/O, no side effects.
///
/// Called for every action, roots and routed children alike, before routing.
/// Request failures reach it too and must leave state as it was.
pub trait Reducer<A: ActionLike, S: Send>: Send + Sync {
    fn reduce(&self, state: &mut S, action: &A);
}

/// Turns an action into zero or more follow-up actions.
///
/// Runs after the reducer, so `state` already reflects `action`. In the store
/// this is where one raw stream event fans out into typed updates; the
/// returned actions are queued behind any siblings already waiting.
#[async_trait]
pub trait Router<A: ActionLike, S: Send + Sync, D: Send + Sync>: Send + Sync {
    async fn route(
        &self,
        action: &A,
        recorded: &RecordedAction,
        state: &S,
        deps: &D,
    ) -> Result<Vec<A>>;
}

/// Records actions and hands back their sequence numbers.
///
/// Implemented by `MemoryActionLog`, and for `Arc<R>` so a log can be shared
/// with whoever wants to read it.
#[async_trait]
pub trait ActionRecorder: Send + Sync {
    /// Record a root action (no parent).
    async fn record(
        &self,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction>;

    /// Record an action emitted while handling `parent_seq`. `root_seq` is
    /// the chain's root, passed along so it survives eviction of the parent.
    async fn record_child(
        &self,
        parent_seq: i64,
        root_seq: i64,
        action_type: String,
        payload: serde_json::Value,
        run_id: &str,
    ) -> Result<RecordedAction>;
}
