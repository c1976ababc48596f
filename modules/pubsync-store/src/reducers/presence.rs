//! Per-channel occupancy and occupant state.
//!
//! Here-now fetches replace a channel's snapshot wholesale. Live events edit
//! it in place: joins never overwrite a state that is already known, leaves
//! and timeouts drop the occupant, and state changes overwrite.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use pubsync_core::{decode_occupancy, decode_state, ChannelOccupancy};

use crate::actions::{PresenceAction, SyncAction};
use crate::state::PresenceState;

pub fn reduce<P: DeserializeOwned>(presence: &mut PresenceState<P>, action: &SyncAction) {
    let SyncAction::Presence(action) = action else {
        return;
    };

    match action {
        PresenceAction::HereNowRetrieved { response } => {
            for (channel, snapshot) in &response.by_channel {
                presence
                    .by_channel
                    .insert(channel.clone(), decode_occupancy(snapshot));
            }
            presence.total_occupancy = response.total_occupancy;
            presence.total_channels = response.total_channels;
        }
        PresenceAction::PresenceStateRetrieved {
            user_id,
            state_by_channel,
        } => {
            for (channel, state) in state_by_channel {
                let occupancy = presence.by_channel.entry(channel.clone()).or_default();
                set_state(occupancy, user_id, state);
            }
        }
        PresenceAction::Joined {
            channel,
            occupancy,
            user_ids,
        } => {
            let snapshot = channel_mut(presence, channel, *occupancy);
            for user_id in user_ids {
                snapshot.occupants.entry(user_id.clone()).or_insert(None);
            }
        }
        PresenceAction::Left {
            channel,
            occupancy,
            user_ids,
        }
        | PresenceAction::TimedOut {
            channel,
            occupancy,
            user_ids,
        } => {
            let snapshot = channel_mut(presence, channel, *occupancy);
            for user_id in user_ids {
                snapshot.occupants.remove(user_id);
            }
        }
        PresenceAction::StateChanged {
            channel,
            occupancy,
            states,
        } => {
            let snapshot = channel_mut(presence, channel, *occupancy);
            set_states(snapshot, states);
        }
        PresenceAction::OccupancyChanged { channel, occupancy } => {
            channel_mut(presence, channel, *occupancy);
        }
        PresenceAction::FetchingHereNow { .. } | PresenceAction::FetchingPresenceState { .. } => {}
    }
}

fn channel_mut<'a, P>(
    presence: &'a mut PresenceState<P>,
    channel: &str,
    occupancy: u32,
) -> &'a mut ChannelOccupancy<P> {
    let snapshot = presence.by_channel.entry(channel.to_string()).or_default();
    snapshot.occupancy = occupancy;
    snapshot
}

fn set_states<P: DeserializeOwned>(
    snapshot: &mut ChannelOccupancy<P>,
    states: &BTreeMap<String, Value>,
) {
    for (user_id, state) in states {
        set_state(snapshot, user_id, state);
    }
}

/// `null` clears the state; an undecodable state leaves the occupant as is.
fn set_state<P: DeserializeOwned>(
    snapshot: &mut ChannelOccupancy<P>,
    user_id: &str,
    state: &Value,
) {
    if state.is_null() {
        snapshot.occupants.insert(user_id.to_string(), None);
    } else if let Some(decoded) = decode_state::<P>(state) {
        snapshot.occupants.insert(user_id.to_string(), Some(decoded));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HereNowResponse;
    use pubsync_world::ChannelPresence;
    use serde_json::json;

    fn run(presence: &mut PresenceState<Value>, action: PresenceAction) {
        reduce(presence, &action.into());
    }

    fn here_now(channel: &str, occupants: &[(&str, Option<Value>)]) -> PresenceAction {
        let mut snapshot = ChannelPresence {
            occupancy: occupants.len() as u32,
            ..Default::default()
        };
        for (user_id, state) in occupants {
            snapshot.occupants.insert(user_id.to_string(), state.clone());
        }
        let mut by_channel = BTreeMap::new();
        by_channel.insert(channel.to_string(), snapshot);

        PresenceAction::HereNowRetrieved {
            response: HereNowResponse {
                by_channel,
                total_occupancy: occupants.len() as u32,
                total_channels: 1,
            },
        }
    }

    #[test]
    fn here_now_sets_snapshot_and_totals() {
        let mut presence = PresenceState::default();
        run(
            &mut presence,
            here_now("lobby", &[("a", None), ("b", Some(json!({"mood": "ok"})))]),
        );

        let lobby = &presence.by_channel["lobby"];
        assert_eq!(lobby.occupancy, 2);
        assert_eq!(lobby.occupants["a"], None);
        assert_eq!(lobby.occupants["b"], Some(json!({"mood": "ok"})));
        assert_eq!(presence.total_occupancy, 2);
        assert_eq!(presence.total_channels, 1);
    }

    #[test]
    fn join_does_not_clobber_known_state() {
        let mut presence = PresenceState::default();
        run(
            &mut presence,
            here_now("lobby", &[("a", Some(json!({"mood": "ok"})))]),
        );
        run(
            &mut presence,
            PresenceAction::Joined {
                channel: "lobby".into(),
                occupancy: 2,
                user_ids: vec!["a".into(), "b".into()],
            },
        );

        let lobby = &presence.by_channel["lobby"];
        assert_eq!(lobby.occupancy, 2);
        assert_eq!(lobby.occupants["a"], Some(json!({"mood": "ok"})));
        assert_eq!(lobby.occupants["b"], None);
    }

    #[test]
    fn leave_and_timeout_remove_occupants() {
        let mut presence = PresenceState::default();
        run(
            &mut presence,
            here_now("lobby", &[("a", None), ("b", None), ("c", None)]),
        );
        run(
            &mut presence,
            PresenceAction::Left {
                channel: "lobby".into(),
                occupancy: 2,
                user_ids: vec!["a".into()],
            },
        );
        run(
            &mut presence,
            PresenceAction::TimedOut {
                channel: "lobby".into(),
                occupancy: 1,
                user_ids: vec!["b".into()],
            },
        );

        let lobby = &presence.by_channel["lobby"];
        assert_eq!(lobby.occupancy, 1);
        assert_eq!(lobby.occupants.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn state_change_overwrites_and_null_clears() {
        let mut presence = PresenceState::default();
        run(
            &mut presence,
            here_now("lobby", &[("a", Some(json!(1))), ("b", Some(json!(2)))]),
        );

        let mut states = BTreeMap::new();
        states.insert("a".to_string(), json!(10));
        states.insert("b".to_string(), Value::Null);
        run(
            &mut presence,
            PresenceAction::StateChanged {
                channel: "lobby".into(),
                occupancy: 2,
                states,
            },
        );

        let lobby = &presence.by_channel["lobby"];
        assert_eq!(lobby.occupants["a"], Some(json!(10)));
        assert_eq!(lobby.occupants["b"], None);
    }

    #[test]
    fn fetched_state_lands_on_every_channel() {
        let mut presence = PresenceState::default();
        let mut state_by_channel = BTreeMap::new();
        state_by_channel.insert("lobby".to_string(), json!({"typing": true}));
        state_by_channel.insert("games".to_string(), json!({"typing": false}));

        run(
            &mut presence,
            PresenceAction::PresenceStateRetrieved {
                user_id: "me".into(),
                state_by_channel,
            },
        );

        assert_eq!(
            presence.by_channel["lobby"].occupants["me"],
            Some(json!({"typing": true}))
        );
        assert_eq!(
            presence.by_channel["games"].occupants["me"],
            Some(json!({"typing": false}))
        );
    }

    #[test]
    fn typed_state_that_fails_to_decode_is_left_alone() {
        #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
        struct Typing {
            typing: bool,
        }

        let mut presence: PresenceState<Typing> = PresenceState::default();
        let mut states = BTreeMap::new();
        states.insert("a".to_string(), json!({"typing": true}));
        states.insert("b".to_string(), json!("garbage"));

        reduce(
            &mut presence,
            &PresenceAction::StateChanged {
                channel: "lobby".into(),
                occupancy: 2,
                states,
            }
            .into(),
        );

        let lobby = &presence.by_channel["lobby"];
        assert_eq!(lobby.occupants["a"], Some(Typing { typing: true }));
        assert!(!lobby.occupants.contains_key("b"));
    }
}
