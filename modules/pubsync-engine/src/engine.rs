//! The dispatch loop behind the store's single writer.

use std::collections::VecDeque;
use std::marker::PhantomData;

use anyhow::Result;
use tracing::trace;

use crate::traits::{ActionLike, ActionRecorder, Reducer, Router};

/// Serializes every update to one piece of state.
///
/// Each action is recorded, reduced, then routed. Routed children are queued
/// breadth first, so all typed updates fanned out from one stream event land
/// before any of their own follow-ups. Every child records both its parent
/// and the root it descends from.
pub struct Engine<A, S, D, Red, Rout, R>
where
    A: ActionLike,
    S: Send + Sync,
    D: Send + Sync,
    Red: Reducer<A, S>,
    Rout: Router<A, S, D>,
    R: ActionRecorder,
{
    reducer: Red,
    router: Rout,
    recorder: R,
    run_id: String,
    _phantom: PhantomData<fn() -> (A, S, D)>,
}

impl<A, S, D, Red, Rout, R> Engine<A, S, D, Red, Rout, R>
where
    A: ActionLike,
    S: Send + Sync,
    D: Send + Sync,
    Red: Reducer<A, S>,
    Rout: Router<A, S, D>,
    R: ActionRecorder,
{
    pub fn new(reducer: Red, router: Rout, recorder: R, run_id: String) -> Self {
        Self {
            reducer,
            router,
            recorder,
            run_id,
            _phantom: PhantomData,
        }
    }

    /// Run `action` and everything routed from it to completion.
    ///
    /// Returns the number of actions processed, the root included. A recorder
    /// or router error stops the loop; updates already reduced stay applied.
    pub async fn dispatch(&self, action: A, state: &mut S, deps: &D) -> Result<usize> {
        // (action, (parent seq, root seq)) for children
        let mut queue: VecDeque<(A, Option<(i64, i64)>)> = VecDeque::new();
        queue.push_back((action, None));
        let mut processed = 0;

        while let Some((current, lineage)) = queue.pop_front() {
            let action_type = current.action_type_str();
            let payload = current.to_record_payload();

            let recorded = match lineage {
                None => self.recorder.record(action_type, payload, &self.run_id).await?,
                Some((parent, root)) => {
                    self.recorder
                        .record_child(parent, root, action_type, payload, &self.run_id)
                        .await?
                }
            };
            let root = lineage.map_or(recorded.seq, |(_, root)| root);
            trace!(seq = recorded.seq, action = %recorded.action_type, "Dispatching");

            self.reducer.reduce(state, &current);
            processed += 1;

            // Router sees the state this action produced
            let children = self.router.route(&current, &recorded, state, deps).await?;
            queue.extend(
                children
                    .into_iter()
                    .map(|child| (child, Some((recorded.seq, root)))),
            );
        }

        Ok(processed)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The recorder this engine writes to.
    pub fn recorder(&self) -> &R {
        &self.recorder
    }
}
