//! emoteline — chat line tokenizer and third-party emote replacer.
//!
//! The core (`pipeline`) splits a chat line into whitespace-delimited
//! tokens, classifies them against an emote registry, resolves emote
//! modifiers and zero-width overlays, and reconstructs the line as text
//! and rendered-emote items. Registries (`registry`) hold per-provider
//! emote snapshots fed by the 7tv, bttv and ffz APIs, with live channel
//! updates over the 7tv event socket.

pub mod config;
pub mod flags;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod render;

pub use flags::ChatFlags;
pub use models::emote::{Emote, EmoteImages, EmoteNode, EmoteProvider, EmoteScale, Restriction};
pub use models::message::{ChatMessage, InputSpan, LineNode, LineOutcome};
pub use models::user::ChatUser;
pub use pipeline::{RenderOptions, process_line};
pub use registry::{EmoteLookup, EmoteRegistry};
