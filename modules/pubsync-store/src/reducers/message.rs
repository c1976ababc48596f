use std::collections::HashMap;

use pubsync_core::{merge_messages, transcode, transcode_all, Schema};
use pubsync_world::WireMessage;

use crate::actions::{MessageAction, SyncAction};

pub fn reduce<S: Schema>(
    messages_by_channel: &mut HashMap<String, Vec<S::Message>>,
    action: &SyncAction,
) {
    let SyncAction::Message(action) = action else {
        return;
    };

    match action {
        MessageAction::MessageSent {
            channel,
            content,
            timetoken,
        } => {
            let wire = WireMessage {
                channel: channel.clone(),
                timetoken: *timetoken,
                payload: content.clone(),
            };
            if let Some(message) = transcode::<S::Message, _>(&wire) {
                merge_into::<S>(messages_by_channel, channel, vec![message]);
            }
        }
        MessageAction::MessageReceived { message } => {
            if let Some(decoded) = transcode::<S::Message, _>(message) {
                merge_into::<S>(messages_by_channel, &message.channel, vec![decoded]);
            }
        }
        MessageAction::HistoryRetrieved {
            messages_by_channel: history,
        } => {
            for (channel, wires) in history {
                let decoded: Vec<S::Message> = transcode_all(wires);
                merge_into::<S>(messages_by_channel, channel, decoded);
            }
        }
        MessageAction::SendingMessage { .. } | MessageAction::FetchingHistory { .. } => {}
    }
}

fn merge_into<S: Schema>(
    messages_by_channel: &mut HashMap<String, Vec<S::Message>>,
    channel: &str,
    incoming: Vec<S::Message>,
) {
    let current = messages_by_channel.entry(channel.to_string()).or_default();
    let merged = merge_messages(current, incoming);
    *current = merged;
}
