use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use pubsync_core::Schema;
use pubsync_store::SyncClient;
use pubsync_world::StreamEvent;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub actions: usize,
    pub skipped: usize,
}

/// Feed one JSON stream event per line into `client`. Blank lines are
/// ignored; lines that do not parse are counted and skipped.
pub async fn replay<S, R>(client: &SyncClient<S>, reader: R) -> Result<ReplayStats>
where
    S: Schema,
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReplayStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: StreamEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(line = line_no, error = %err, "Skipping unparseable event");
                stats.skipped += 1;
                continue;
            }
        };

        debug!(line = line_no, event = event.event_type(), "Replaying");
        stats.actions += client.ingest(event).await?;
        stats.events += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pubsync_common::Config;
    use pubsync_core::DefaultSchema;
    use pubsync_store::ConnectionState;

    use crate::offline::OfflineApi;

    fn client() -> SyncClient<DefaultSchema> {
        let config = Config::from_lookup(|key: &str| {
            (key == "PUBSYNC_USER_ID").then(|| "replayer".to_string())
        })
        .unwrap();
        SyncClient::new(Arc::new(OfflineApi), &config)
    }

    #[tokio::test]
    async fn replays_events_and_skips_bad_lines() {
        let input = concat!(
            r#"{"type":"connection_changed","status":"connected"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"type":"message_received","message":{"channel":"lobby","timetoken":5,"payload":"hi"}}"#,
            "\n",
            r#"{"type":"presence_changed","event":{"channel":"lobby","occupancy":1,"joined":["a"]}}"#,
            "\n",
        );
        let client = client();

        let stats = replay(&client, input.as_bytes()).await.unwrap();

        assert_eq!(
            stats,
            ReplayStats {
                events: 3,
                actions: 6,
                skipped: 1,
            }
        );
        let state = client.snapshot().await;
        assert_eq!(state.connection, ConnectionState::Connected);
        assert_eq!(state.messages("lobby").len(), 1);
        assert_eq!(state.occupancy("lobby").unwrap().occupancy, 1);
    }

    #[tokio::test]
    async fn offline_commands_fail_without_touching_state() {
        let client = client();
        let before = client.snapshot().await.summary();

        let err = client.fetch_user("u1").await.unwrap_err();

        assert!(err.to_string().contains("offline replay"));
        assert_eq!(client.snapshot().await.summary(), before);
    }
}
