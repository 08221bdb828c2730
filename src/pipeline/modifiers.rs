//! The closed set of emote modifier keywords.
//!
//! A modifier token never renders itself; it decorates an adjacent emote
//! with a CSS-style class. Prefix modifiers (`w!`-style) must precede
//! their emote, suffix modifiers (FFZ/7TV-style codes) must follow it.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    Prefix,
    Suffix,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Modifier {
    /// Exact chat token that activates the modifier.
    pub key: &'static str,
    /// Class applied to the decorated emote's rendering.
    pub class: &'static str,
    pub kind: ModifierKind,
}

/// The full modifier table. Order is cosmetic; lookup is by exact token.
pub static MODIFIERS: &[Modifier] = &[
    Modifier { key: "w!", class: "wide", kind: ModifierKind::Prefix },
    Modifier { key: "h!", class: "flip-horizontal", kind: ModifierKind::Prefix },
    Modifier { key: "v!", class: "flip-vertical", kind: ModifierKind::Prefix },
    Modifier { key: "z!", class: "zoom", kind: ModifierKind::Prefix },
    Modifier { key: "c!", class: "cursed", kind: ModifierKind::Prefix },
    Modifier { key: "l!", class: "rotate-left", kind: ModifierKind::Prefix },
    Modifier { key: "r!", class: "rotate-right", kind: ModifierKind::Prefix },
    Modifier { key: "p!", class: "party", kind: ModifierKind::Prefix },
    Modifier { key: "s!", class: "shake", kind: ModifierKind::Prefix },
    Modifier { key: "ffzW", class: "wide", kind: ModifierKind::Suffix },
    Modifier { key: "ffzX", class: "flip-horizontal", kind: ModifierKind::Suffix },
    Modifier { key: "ffzY", class: "flip-vertical", kind: ModifierKind::Suffix },
    Modifier { key: "ffzCursed", class: "cursed", kind: ModifierKind::Suffix },
];

static BY_KEY: Lazy<HashMap<&'static str, &'static Modifier>> =
    Lazy::new(|| MODIFIERS.iter().map(|m| (m.key, m)).collect());

impl Modifier {
    pub fn from_token(token: &str) -> Option<&'static Modifier> {
        BY_KEY.get(token).copied()
    }

    pub fn prefix_from_token(token: &str) -> Option<&'static Modifier> {
        Self::from_token(token).filter(|m| m.kind == ModifierKind::Prefix)
    }

    pub fn suffix_from_token(token: &str) -> Option<&'static Modifier> {
        Self::from_token(token).filter(|m| m.kind == ModifierKind::Suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_suffix_lookup_are_disjoint() {
        assert!(Modifier::prefix_from_token("w!").is_some());
        assert!(Modifier::suffix_from_token("w!").is_none());
        assert!(Modifier::suffix_from_token("ffzW").is_some());
        assert!(Modifier::prefix_from_token("ffzW").is_none());
    }

    #[test]
    fn unknown_token_is_not_a_modifier() {
        assert!(Modifier::from_token("Kappa").is_none());
        assert!(Modifier::from_token("W!").is_none());
        assert!(Modifier::from_token("").is_none());
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = MODIFIERS.iter().map(|m| m.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), MODIFIERS.len());
    }
}
