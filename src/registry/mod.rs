//! Emote registry: per-provider snapshot maps with channel-over-global
//! lookup precedence.
//!
//! Provider refreshes and EventAPI updates build a fresh combined map and
//! swap it in wholesale; the tokenizer only ever sees immutable snapshots,
//! so lookups never observe a half-applied refresh.

pub mod bttv;
pub mod events;
pub mod ffz;
pub mod seventv;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::emote::{Emote, EmoteProvider};
use crate::models::user::ChatUser;

/// The lookup contract the tokenizer consumes: a token and an optional
/// viewing user in, an eligible emote or nothing out.
pub trait EmoteLookup {
    fn lookup(&self, code: &str, user: Option<&ChatUser>) -> Option<Arc<Emote>>;
}

/// Plain maps satisfy the contract too; tests and one-off callers use this.
impl EmoteLookup for HashMap<String, Arc<Emote>> {
    fn lookup(&self, code: &str, user: Option<&ChatUser>) -> Option<Arc<Emote>> {
        self.get(code)
            .filter(|e| e.restriction.allows(user))
            .cloned()
    }
}

type EmoteMap = Arc<HashMap<String, Arc<Emote>>>;

/// Lowest to highest precedence; later providers win code collisions and
/// channel sets beat global sets.
const PROVIDER_PRECEDENCE: [EmoteProvider; 4] = [
    EmoteProvider::Ffz,
    EmoteProvider::Bttv,
    EmoteProvider::SevenTv,
    EmoteProvider::Platform,
];

#[derive(Default)]
struct Inner {
    global: HashMap<EmoteProvider, EmoteMap>,
    channel: HashMap<EmoteProvider, EmoteMap>,
    combined: EmoteMap,
}

impl Inner {
    fn rebuild(&mut self) {
        let mut combined = HashMap::new();
        for provider in PROVIDER_PRECEDENCE {
            if let Some(set) = self.global.get(&provider) {
                for (code, emote) in set.iter() {
                    combined.insert(code.clone(), emote.clone());
                }
            }
        }
        for provider in PROVIDER_PRECEDENCE {
            if let Some(set) = self.channel.get(&provider) {
                for (code, emote) in set.iter() {
                    combined.insert(code.clone(), emote.clone());
                }
            }
        }
        self.combined = Arc::new(combined);
    }
}

/// Read-mostly emote store shared between the async refresh tasks and the
/// synchronous tokenizer.
#[derive(Default)]
pub struct EmoteRegistry {
    inner: RwLock<Inner>,
}

impl EmoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one provider's global set.
    pub fn install_global(&self, provider: EmoteProvider, emotes: Vec<Emote>) {
        self.install(provider, emotes, false);
    }

    /// Replaces one provider's channel set.
    pub fn install_channel(&self, provider: EmoteProvider, emotes: Vec<Emote>) {
        self.install(provider, emotes, true);
    }

    fn install(&self, provider: EmoteProvider, emotes: Vec<Emote>, channel: bool) {
        let count = emotes.len();
        let map: HashMap<String, Arc<Emote>> = emotes
            .into_iter()
            .map(|e| (e.code.clone(), Arc::new(e)))
            .collect();

        let mut inner = self.inner.write();
        let sets = if channel {
            &mut inner.channel
        } else {
            &mut inner.global
        };
        sets.insert(provider, Arc::new(map));
        inner.rebuild();

        tracing::info!(
            provider = provider.as_str(),
            channel,
            count,
            "installed emote set"
        );
    }

    /// Adds or replaces a single emote in a provider's channel set. Used by
    /// live set-update dispatches.
    pub fn upsert_channel_emote(&self, provider: EmoteProvider, emote: Emote) {
        let mut inner = self.inner.write();
        let mut map: HashMap<String, Arc<Emote>> = inner
            .channel
            .get(&provider)
            .map(|m| m.as_ref().clone())
            .unwrap_or_default();
        map.insert(emote.code.clone(), Arc::new(emote));
        inner.channel.insert(provider, Arc::new(map));
        inner.rebuild();
    }

    /// Removes a single emote from a provider's channel set by id.
    pub fn remove_channel_emote(&self, provider: EmoteProvider, id: &str) {
        let mut inner = self.inner.write();
        let Some(existing) = inner.channel.get(&provider) else {
            return;
        };
        let mut map = existing.as_ref().clone();
        map.retain(|_, e| e.id != id);
        inner.channel.insert(provider, Arc::new(map));
        inner.rebuild();
    }

    /// Current combined snapshot; cheap to clone and safe to hold across a
    /// whole line's processing.
    pub fn snapshot(&self) -> EmoteMap {
        self.inner.read().combined.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().combined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EmoteLookup for EmoteRegistry {
    fn lookup(&self, code: &str, user: Option<&ChatUser>) -> Option<Arc<Emote>> {
        let snapshot = self.snapshot();
        snapshot
            .get(code)
            .filter(|e| e.restriction.allows(user))
            .cloned()
    }
}
