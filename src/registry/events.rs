//! Live channel-emote updates over the 7tv EventAPI websocket.
//!
//! The socket drops regularly in the wild; the client reconnects forever
//! with capped exponential backoff and resubscribes on every new session.
//! Set changes are applied to the shared registry as single-emote upserts
//! and removals, each swapping in a fresh snapshot.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Report, eyre};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use super::{EmoteRegistry, seventv};
use crate::models::emote::EmoteProvider;

const EVENTS_URL: &str = "wss://events.7tv.io/v3";

const OP_DISPATCH: u8 = 0;
const OP_HELLO: u8 = 1;
const OP_HEARTBEAT: u8 = 2;
const OP_SUBSCRIBE: u8 = 35;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct Envelope {
    op: u8,
    #[serde(default)]
    d: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Hello {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct Dispatch {
    #[serde(rename = "type")]
    kind: String,
    body: ChangeBody,
}

#[derive(Debug, Deserialize)]
struct ChangeBody {
    #[serde(default)]
    pushed: Vec<ChangeField>,
    #[serde(default)]
    pulled: Vec<ChangeField>,
    #[serde(default)]
    updated: Vec<ChangeField>,
}

#[derive(Debug, Deserialize)]
struct ChangeField {
    value: Option<seventv::ActiveEmote>,
    old_value: Option<OldValue>,
}

#[derive(Debug, Deserialize)]
struct OldValue {
    id: String,
}

pub struct SevenTvEventClient {
    registry: Arc<EmoteRegistry>,
    emote_set_id: String,
}

impl SevenTvEventClient {
    pub fn new(registry: Arc<EmoteRegistry>, emote_set_id: String) -> Self {
        Self {
            registry,
            emote_set_id,
        }
    }

    /// Runs until the task is dropped. Every connection attempt that fails
    /// or closes doubles the next delay, up to the cap; a successful
    /// session resets it.
    pub async fn run(self) {
        let mut delay = INITIAL_BACKOFF;
        loop {
            match self.connect_and_listen().await {
                Ok(()) => {
                    tracing::info!("event socket closed cleanly, reconnecting");
                    delay = INITIAL_BACKOFF;
                }
                Err(e) => {
                    tracing::warn!(error = %e, retry_in = ?delay, "event socket error");
                }
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_BACKOFF);
        }
    }

    async fn connect_and_listen(&self) -> Result<(), Report> {
        let (ws_stream, _) = connect_async(EVENTS_URL).await?;
        tracing::info!(set = %self.emote_set_id, "connected to 7tv event socket");
        let (mut write, mut read) = ws_stream.split();

        let subscribe = json!({
            "op": OP_SUBSCRIBE,
            "d": {
                "type": "emote_set.update",
                "condition": { "object_id": self.emote_set_id },
            },
        });
        write
            .send(WsMessage::Text(subscribe.to_string().into()))
            .await?;

        while let Some(msg) = read.next().await {
            match msg? {
                WsMessage::Text(text) => self.handle_frame(text.as_str()),
                WsMessage::Close(frame) => {
                    return Err(eyre!("event socket closed: {:?}", frame));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn handle_frame(&self, raw: &str) {
        // Frames are attacker-adjacent input like everything else on the
        // wire; unparseable ones are logged and skipped.
        let envelope: Envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable event frame");
                return;
            }
        };

        match envelope.op {
            OP_HELLO => {
                if let Ok(hello) = serde_json::from_value::<Hello>(envelope.d) {
                    tracing::info!(session = %hello.session_id, "event session established");
                }
            }
            OP_HEARTBEAT => {
                tracing::trace!("event heartbeat");
            }
            OP_DISPATCH => {
                match serde_json::from_value::<Dispatch>(envelope.d) {
                    Ok(dispatch) if dispatch.kind == "emote_set.update" => {
                        self.apply_update(dispatch.body);
                    }
                    Ok(dispatch) => {
                        tracing::debug!(kind = %dispatch.kind, "ignoring dispatch");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "unparseable dispatch payload");
                    }
                }
            }
            other => {
                tracing::trace!(op = other, "ignoring event opcode");
            }
        }
    }

    fn apply_update(&self, body: ChangeBody) {
        for change in body.pushed {
            if let Some(emote) = change.value.and_then(seventv::convert_active) {
                tracing::info!(code = %emote.code, "channel emote added");
                self.registry
                    .upsert_channel_emote(EmoteProvider::SevenTv, emote);
            }
        }
        for change in body.pulled {
            if let Some(old) = change.old_value {
                tracing::info!(id = %old.id, "channel emote removed");
                self.registry
                    .remove_channel_emote(EmoteProvider::SevenTv, &old.id);
            }
        }
        // Renames arrive as updated entries carrying both halves.
        for change in body.updated {
            if let Some(old) = change.old_value {
                self.registry
                    .remove_channel_emote(EmoteProvider::SevenTv, &old.id);
            }
            if let Some(emote) = change.value.and_then(seventv::convert_active) {
                tracing::info!(code = %emote.code, "channel emote updated");
                self.registry
                    .upsert_channel_emote(EmoteProvider::SevenTv, emote);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ChatUser;
    use crate::registry::EmoteLookup;

    fn client() -> SevenTvEventClient {
        SevenTvEventClient::new(Arc::new(EmoteRegistry::new()), "set-1".into())
    }

    fn dispatch_frame(body: serde_json::Value) -> String {
        json!({
            "op": OP_DISPATCH,
            "d": { "type": "emote_set.update", "body": body },
        })
        .to_string()
    }

    #[test]
    fn garbage_frames_are_ignored() {
        let client = client();
        client.handle_frame("not json");
        client.handle_frame("{\"op\": 99}");
        assert!(client.registry.is_empty());
    }

    #[test]
    fn pushed_emote_lands_in_registry() {
        let client = client();
        let frame = dispatch_frame(json!({
            "pushed": [{
                "value": {
                    "id": "01X",
                    "name": "NewEmote",
                    "flags": 0,
                    "data": {
                        "animated": false,
                        "host": { "url": "//cdn.7tv.app/emote/01X" },
                    },
                },
            }],
        }));
        client.handle_frame(&frame);

        let user: Option<&ChatUser> = None;
        assert!(client.registry.lookup("NewEmote", user).is_some());
    }

    #[test]
    fn pulled_emote_is_removed() {
        let client = client();
        let push = dispatch_frame(json!({
            "pushed": [{
                "value": {
                    "id": "01X",
                    "name": "NewEmote",
                    "flags": 0,
                    "data": {
                        "animated": false,
                        "host": { "url": "//cdn.7tv.app/emote/01X" },
                    },
                },
            }],
        }));
        client.handle_frame(&push);

        let pull = dispatch_frame(json!({
            "pulled": [{ "old_value": { "id": "01X" } }],
        }));
        client.handle_frame(&pull);

        assert!(client.registry.lookup("NewEmote", None).is_none());
    }
}
