//! Bitmask feature toggles for the chat pipeline.
//!
//! Settings events flip individual bits; the pipeline only ever asks
//! `has(...)` questions. Passed by value into each invocation so that no
//! shared mutable state crosses lines.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatFlags: u32 {
        /// Honor prefix/suffix emote modifiers.
        const MODIFIERS = 1 << 0;
        /// Prefer animated image variants where a provider serves one.
        const ANIMATED = 1 << 1;
        /// Attach zero-width emotes as overlays instead of rendering inline.
        const ZERO_WIDTH = 1 << 2;
        /// Linkify urls found in surviving plain-text tokens.
        const LINKS = 1 << 3;
    }
}

impl ChatFlags {
    pub fn has(self, flag: ChatFlags) -> bool {
        self.contains(flag)
    }
}

impl Default for ChatFlags {
    fn default() -> Self {
        ChatFlags::all()
    }
}
