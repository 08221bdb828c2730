//! The chat line tokenizer and emote replacer.
//!
//! Pure core: a line comes in as input spans, goes out as output items.
//! No host-page concern lives here; presentation adapters decide what a
//! `LineNode` becomes. Each invocation owns all of its state (modifier
//! scratch, zero-width queue, cap counters), so concurrent calls for
//! different lines never interact.

pub mod links;
pub mod modifiers;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::flags::ChatFlags;
use crate::models::emote::{Emote, EmoteNode, EmoteScale};
use crate::models::message::{InputSpan, LineNode, LineOutcome};
use crate::models::user::ChatUser;
use crate::registry::EmoteLookup;
use links::TextOrUrl;
use modifiers::{Modifier, ModifierKind};

/// Emote ids subject to the per-line render cap. Carried over verbatim from
/// the settings this replaces; the list is configuration, not inference.
pub const DEFAULT_CAPPED_EMOTE_IDS: &[&str] = &["01FGVJ3P9R000FFJ97ZB8MWV52"];

/// Renders of a capped emote allowed per line before the rest are dropped.
pub const DEFAULT_EMOTE_CAP: u32 = 10;

/// Per-invocation settings. Built from [`crate::config::Config`] once and
/// passed by reference; nothing here is mutated across lines.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub flags: ChatFlags,
    pub scale: EmoteScale,
    pub capped_emote_ids: HashSet<String>,
    pub emote_cap: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            flags: ChatFlags::default(),
            scale: EmoteScale::default(),
            capped_emote_ids: DEFAULT_CAPPED_EMOTE_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            emote_cap: DEFAULT_EMOTE_CAP,
        }
    }
}

/// Classification of one token, parallel to the token array.
#[derive(Clone)]
enum Part {
    Emote(Arc<Emote>),
    Mod(&'static Modifier),
}

/// What a token slot will contribute to the reconstructed line. `None`
/// means the slot was consumed (modifier, queued zero-width, capped) and
/// leaves no output and no separator.
enum Slot {
    Text(String),
    Node(LineNode),
}

#[derive(Default)]
struct LineState {
    cap_counts: HashMap<String, u32>,
    zw_queue: Vec<PendingOverlay>,
    /// Last rendered inline emote, as (span, slot) into the working slots.
    anchor: Option<(usize, usize)>,
    modified: bool,
}

struct PendingOverlay {
    span: usize,
    index: usize,
    node: EmoteNode,
}

/// Runs the tokenizer over one chat line.
///
/// Returns [`LineOutcome::Unchanged`] when no token was recognized as
/// special, in which case the caller must leave its original nodes alone.
/// Never panics on arbitrary chat text; unknown tokens pass through as
/// literal text.
pub fn process_line(
    spans: &[InputSpan],
    user: Option<&ChatUser>,
    registry: &dyn EmoteLookup,
    opts: &RenderOptions,
) -> LineOutcome {
    let mut state = LineState::default();
    let mut span_slots: Vec<Vec<Option<Slot>>> = Vec::with_capacity(spans.len());

    for (si, span) in spans.iter().enumerate() {
        match span {
            InputSpan::Node(node) => {
                span_slots.push(vec![Some(Slot::Node(node.clone()))]);
            }
            InputSpan::Text(text) => {
                span_slots.push(process_text_span(si, text, user, registry, opts, &mut state));
            }
        }
    }

    // Zero-width emotes still queued after the walk attach to the last
    // emote rendered earlier in the line; without any anchor they drop.
    if !state.zw_queue.is_empty() {
        match state.anchor {
            Some((si, idx)) => {
                if let Some(Some(Slot::Node(LineNode::Emote(node)))) =
                    span_slots[si].get_mut(idx)
                {
                    node.overlays
                        .extend(state.zw_queue.drain(..).map(|p| p.node));
                }
            }
            None => {
                tracing::trace!(
                    count = state.zw_queue.len(),
                    "zero-width emotes with no anchor in line, dropping"
                );
            }
        }
        state.zw_queue.clear();
    }

    if !state.modified {
        return LineOutcome::Unchanged;
    }

    let mut out = Vec::new();
    for slots in span_slots {
        reconstruct_span(slots, opts, &mut out);
    }
    LineOutcome::Modified(out)
}

fn process_text_span(
    si: usize,
    text: &str,
    user: Option<&ChatUser>,
    registry: &dyn EmoteLookup,
    opts: &RenderOptions,
    state: &mut LineState,
) -> Vec<Option<Slot>> {
    // Split on single spaces; empty tokens from repeated spaces keep their
    // position so reconstruction preserves the original spacing.
    let tokens: Vec<&str> = text.split(' ').collect();
    let mut parts: Vec<Option<Part>> = vec![None; tokens.len()];
    let mut slots: Vec<Option<Slot>> = tokens
        .iter()
        .map(|t| Some(Slot::Text(t.to_string())))
        .collect();
    let modifiers_on = opts.flags.has(ChatFlags::MODIFIERS);

    for (j, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            continue;
        }

        // Deep links replace their token outright and can never serve as a
        // modifier target.
        if links::is_steam_lobby_link(token) {
            slots[j] = Some(Slot::Node(LineNode::link(*token, *token)));
            state.modified = true;
            continue;
        }

        if modifiers_on {
            if let Some(m) = Modifier::prefix_from_token(token) {
                parts[j] = Some(Part::Mod(m));
            }
        }
        if let Some(emote) = registry.lookup(token, user) {
            if !emote.modifier_only {
                parts[j] = Some(Part::Emote(emote));
            }
        }
        if modifiers_on {
            if let Some(m) = Modifier::suffix_from_token(token) {
                parts[j] = Some(Part::Mod(m));
            }
        }

        let triggers = match &parts[j] {
            Some(Part::Emote(_)) => true,
            Some(Part::Mod(m)) => m.kind == ModifierKind::Suffix,
            None => false,
        };
        if triggers {
            resolve_at(j, si, &parts, &mut slots, opts, state);
        }
    }

    slots
}

/// Backward scan from `j`: collect suffix modifiers until an emote part is
/// found (the target), then prefix modifiers below it; stop at the first
/// entry that fits neither. Consumed modifier slots are nulled only once a
/// target exists — a suffix keyword with no emote anchor is no modifier at
/// all and its token stays literal.
fn resolve_at(
    j: usize,
    si: usize,
    parts: &[Option<Part>],
    slots: &mut [Option<Slot>],
    opts: &RenderOptions,
    state: &mut LineState,
) {
    let mut prefix_mods: Vec<&'static Modifier> = Vec::new();
    let mut suffix_mods: Vec<&'static Modifier> = Vec::new();
    let mut consumed: Vec<usize> = Vec::new();
    let mut target: Option<(usize, Arc<Emote>)> = None;

    let mut i = j as isize;
    while i >= 0 {
        let idx = i as usize;
        match &parts[idx] {
            Some(Part::Mod(m)) if target.is_none() && m.kind == ModifierKind::Suffix => {
                suffix_mods.push(*m);
                consumed.push(idx);
            }
            Some(Part::Emote(emote)) if target.is_none() => {
                target = Some((idx, emote.clone()));
            }
            Some(Part::Mod(m)) if target.is_some() && m.kind == ModifierKind::Prefix => {
                prefix_mods.push(*m);
                consumed.push(idx);
            }
            _ => break,
        }
        i -= 1;
    }

    let Some((emote_index, emote)) = target else {
        return;
    };

    // Collected bottom-up; apply in document order.
    prefix_mods.reverse();
    suffix_mods.reverse();

    for &idx in &consumed {
        slots[idx] = None;
    }

    let classes: Vec<String> = prefix_mods
        .iter()
        .chain(suffix_mods.iter())
        .map(|m| m.class.to_string())
        .collect();
    let animated = opts.flags.has(ChatFlags::ANIMATED);

    if emote.zero_width && opts.flags.has(ChatFlags::ZERO_WIDTH) {
        let node = emote.render(&prefix_mods, &suffix_mods, &classes, opts.scale, animated);
        slots[emote_index] = None;
        // A suffix arriving after the emote was queued re-resolves the same
        // slot; replace the queued entry rather than stacking a duplicate.
        match state
            .zw_queue
            .iter_mut()
            .find(|p| p.span == si && p.index == emote_index)
        {
            Some(pending) => pending.node = node,
            None => state.zw_queue.push(PendingOverlay {
                span: si,
                index: emote_index,
                node,
            }),
        }
        state.modified = true;
        return;
    }

    if opts.capped_emote_ids.contains(&emote.id) {
        let count = state.cap_counts.entry(emote.id.clone()).or_insert(0);
        *count += 1;
        if *count > opts.emote_cap {
            tracing::trace!(code = %emote.code, "per-line emote cap reached, dropping render");
            slots[emote_index] = None;
            state.modified = true;
            return;
        }
    }

    let mut node = emote.render(&prefix_mods, &suffix_mods, &classes, opts.scale, animated);

    // A suffix binding re-renders an emote slot that may already carry
    // overlays; keep them.
    if let Some(Slot::Node(LineNode::Emote(prev))) = &slots[emote_index] {
        node.overlays = prev.overlays.clone();
    }

    node.overlays
        .extend(state.zw_queue.drain(..).map(|p| p.node));

    slots[emote_index] = Some(Slot::Node(LineNode::Emote(node)));
    state.anchor = Some((si, emote_index));
    state.modified = true;
}

/// Emits surviving slots in order with a single space between any two of
/// them. Nulled slots contribute neither output nor separators.
fn reconstruct_span(slots: Vec<Option<Slot>>, opts: &RenderOptions, out: &mut Vec<LineNode>) {
    let mut first = true;
    for slot in slots {
        let Some(slot) = slot else { continue };
        if !first {
            out.push(LineNode::Space);
        }
        first = false;
        match slot {
            Slot::Node(node) => out.push(node),
            Slot::Text(token) => {
                if opts.flags.has(ChatFlags::LINKS) && !token.is_empty() {
                    for run in links::parse_text_for_urls(&token) {
                        match run {
                            TextOrUrl::Text(t) => out.push(LineNode::Text(t)),
                            TextOrUrl::Url(u) => out.push(LineNode::link(u.clone(), u)),
                        }
                    }
                } else {
                    out.push(LineNode::Text(token));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emote::{EmoteImages, EmoteProvider, Restriction};
    use pretty_assertions::assert_eq;

    fn images(id: &str) -> EmoteImages {
        EmoteImages {
            url_1x: format!("https://cdn.test/{id}/1x"),
            url_2x: format!("https://cdn.test/{id}/2x"),
            url_4x: format!("https://cdn.test/{id}/4x"),
        }
    }

    fn emote(id: &str, code: &str) -> Emote {
        Emote::new(id, code, EmoteProvider::SevenTv, images(id))
    }

    fn registry() -> HashMap<String, Arc<Emote>> {
        let mut map = HashMap::new();
        for e in [
            emote("e-kappa", "Kappa"),
            emote("e-pog", "PogChamp"),
            Emote {
                zero_width: true,
                ..emote("e-snow", "SoSnowy")
            },
            Emote {
                zero_width: true,
                ..emote("e-hat", "SantaHat")
            },
            Emote {
                modifier_only: true,
                ..emote("e-ffzw", "ffzW")
            },
            Emote {
                restriction: Restriction::SubscriberOnly,
                ..emote("e-legacy", "LegacySub")
            },
        ] {
            map.insert(e.code.clone(), Arc::new(e));
        }
        map
    }

    fn run(text: &str) -> LineOutcome {
        let reg = registry();
        process_line(
            &[InputSpan::text(text)],
            None,
            &reg,
            &RenderOptions::default(),
        )
    }

    fn emote_nodes(outcome: &LineOutcome) -> Vec<EmoteNode> {
        outcome
            .nodes()
            .unwrap_or_default()
            .iter()
            .filter_map(|n| match n {
                LineNode::Emote(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn plain_line_is_unchanged() {
        assert_eq!(run("hello there friend"), LineOutcome::Unchanged);
    }

    #[test]
    fn lone_prefix_modifier_stays_literal() {
        assert_eq!(run("w! nothing here"), LineOutcome::Unchanged);
    }

    #[test]
    fn emote_token_is_replaced() {
        let outcome = run("hello Kappa world");
        let nodes = outcome.nodes().expect("modified");
        assert_eq!(
            nodes,
            &[
                LineNode::Text("hello".into()),
                LineNode::Space,
                LineNode::Emote(emote_nodes(&outcome)[0].clone()),
                LineNode::Space,
                LineNode::Text("world".into()),
            ]
        );
        assert_eq!(emote_nodes(&outcome)[0].code, "Kappa");
    }

    #[test]
    fn prefix_modifier_binds_forward() {
        let outcome = run("w! Kappa");
        let nodes = emote_nodes(&outcome);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].has_class("wide"));
        assert_eq!(nodes[0].prefix_classes, vec!["wide".to_string()]);
        // The w! slot is consumed: one surviving slot, no separators.
        assert_eq!(outcome.nodes().unwrap().len(), 1);
    }

    #[test]
    fn suffix_modifier_binds_backward() {
        let outcome = run("Kappa ffzW");
        let nodes = emote_nodes(&outcome);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].has_class("wide"));
        assert_eq!(nodes[0].suffix_classes, vec!["wide".to_string()]);
        assert_eq!(outcome.nodes().unwrap().len(), 1);
    }

    #[test]
    fn both_directions_stack_on_one_emote() {
        let outcome = run("h! w! Kappa ffzY");
        let nodes = emote_nodes(&outcome);
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            nodes[0].prefix_classes,
            vec!["flip-horizontal".to_string(), "wide".to_string()]
        );
        assert_eq!(nodes[0].suffix_classes, vec!["flip-vertical".to_string()]);
        assert_eq!(outcome.nodes().unwrap().len(), 1);
    }

    #[test]
    fn orphan_suffix_is_discarded_as_modifier() {
        let outcome = run("ffzW Kappa");
        let nodes = outcome.nodes().expect("Kappa still renders");
        assert_eq!(nodes[0], LineNode::Text("ffzW".into()));
        assert_eq!(nodes[1], LineNode::Space);
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 1);
        assert!(emotes[0].classes.is_empty());
    }

    #[test]
    fn prefix_does_not_reach_past_an_emote() {
        // w! binds PogChamp, not Kappa.
        let outcome = run("w! PogChamp Kappa");
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 2);
        assert!(emotes[0].has_class("wide"));
        assert!(emotes[1].classes.is_empty());
    }

    #[test]
    fn modifiers_disabled_leaves_keywords_literal() {
        let reg = registry();
        let opts = RenderOptions {
            flags: ChatFlags::default() - ChatFlags::MODIFIERS,
            ..RenderOptions::default()
        };
        let outcome = process_line(&[InputSpan::text("w! Kappa")], None, &reg, &opts);
        let nodes = outcome.nodes().expect("Kappa still renders");
        assert_eq!(nodes[0], LineNode::Text("w!".into()));
        assert!(emote_nodes(&outcome)[0].classes.is_empty());
    }

    #[test]
    fn zero_width_attaches_to_preceding_emote() {
        let outcome = run("Kappa SoSnowy");
        let nodes = outcome.nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes[0].code, "Kappa");
        assert_eq!(emotes[0].overlays.len(), 1);
        assert_eq!(emotes[0].overlays[0].code, "SoSnowy");
    }

    #[test]
    fn zero_width_before_emote_attaches_forward() {
        let outcome = run("SoSnowy Kappa");
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 1);
        assert_eq!(emotes[0].code, "Kappa");
        assert_eq!(emotes[0].overlays[0].code, "SoSnowy");
    }

    #[test]
    fn multiple_zero_width_emotes_stack() {
        let outcome = run("Kappa SoSnowy SantaHat");
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 1);
        let codes: Vec<_> = emotes[0].overlays.iter().map(|o| o.code.as_str()).collect();
        assert_eq!(codes, vec!["SoSnowy", "SantaHat"]);
    }

    #[test]
    fn zero_width_with_no_anchor_is_dropped() {
        let outcome = run("SoSnowy");
        // Modified (the slot was consumed) but nothing to attach to.
        assert_eq!(outcome, LineOutcome::Modified(vec![]));
    }

    #[test]
    fn zero_width_carries_its_own_modifiers() {
        let outcome = run("Kappa w! SoSnowy");
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 1);
        let overlay = &emotes[0].overlays[0];
        assert_eq!(overlay.code, "SoSnowy");
        assert!(overlay.has_class("wide"));
        assert!(emotes[0].classes.is_empty());
    }

    #[test]
    fn modifier_only_emote_is_not_an_emote_part() {
        // ffzW resolves in the registry but is flagged modifier-only, so a
        // lone occurrence renders as text, not as an emote.
        let outcome = run("ffzW");
        assert_eq!(outcome, LineOutcome::Unchanged);
    }

    #[test]
    fn subscriber_restriction_respects_user() {
        let reg = registry();
        let opts = RenderOptions::default();
        let non_sub = ChatUser::new("u1", "viewer");
        let outcome = process_line(
            &[InputSpan::text("LegacySub")],
            Some(&non_sub),
            &reg,
            &opts,
        );
        assert_eq!(outcome, LineOutcome::Unchanged);

        let sub = ChatUser::new("u2", "fan").subscriber(true);
        let outcome = process_line(&[InputSpan::text("LegacySub")], Some(&sub), &reg, &opts);
        assert_eq!(emote_nodes(&outcome).len(), 1);

        // No user at all means no restriction context.
        let outcome = process_line(&[InputSpan::text("LegacySub")], None, &reg, &opts);
        assert_eq!(emote_nodes(&outcome).len(), 1);
    }

    #[test]
    fn capped_emote_stops_rendering_past_the_cap() {
        let mut reg = registry();
        let capped = emote("e-big", "BigOne");
        reg.insert("BigOne".into(), Arc::new(capped));
        let opts = RenderOptions {
            capped_emote_ids: std::iter::once("e-big".to_string()).collect(),
            emote_cap: 10,
            ..RenderOptions::default()
        };
        let line = vec!["BigOne"; 11].join(" ");
        let outcome = process_line(&[InputSpan::text(&line)], None, &reg, &opts);
        let nodes = outcome.nodes().unwrap();
        let rendered = nodes
            .iter()
            .filter(|n| matches!(n, LineNode::Emote(_)))
            .count();
        let spaces = nodes
            .iter()
            .filter(|n| matches!(n, LineNode::Space))
            .count();
        assert_eq!(rendered, 10);
        assert_eq!(spaces, 9);
    }

    #[test]
    fn cap_counter_is_per_invocation() {
        let mut reg = registry();
        reg.insert("BigOne".into(), Arc::new(emote("e-big", "BigOne")));
        let opts = RenderOptions {
            capped_emote_ids: std::iter::once("e-big".to_string()).collect(),
            emote_cap: 10,
            ..RenderOptions::default()
        };
        for _ in 0..3 {
            let outcome = process_line(&[InputSpan::text("BigOne")], None, &reg, &opts);
            assert_eq!(emote_nodes(&outcome).len(), 1);
        }
    }

    #[test]
    fn steam_lobby_link_becomes_anchor() {
        let outcome = run("join steam://joinlobby/730/109775241/76561198 now");
        let nodes = outcome.nodes().unwrap();
        assert_eq!(
            nodes[2],
            LineNode::link(
                "steam://joinlobby/730/109775241/76561198",
                "steam://joinlobby/730/109775241/76561198"
            )
        );
    }

    #[test]
    fn steam_lobby_link_is_not_a_modifier_target() {
        let outcome = run("w! steam://joinlobby/1/2/3");
        let nodes = outcome.nodes().unwrap();
        // w! survives as literal text; the link renders unmodified.
        assert_eq!(nodes[0], LineNode::Text("w!".into()));
        assert_eq!(nodes[1], LineNode::Space);
        assert!(matches!(nodes[2], LineNode::Link { .. }));
    }

    #[test]
    fn repeated_spaces_survive_reconstruction() {
        let outcome = run("Kappa  trailing");
        let nodes = outcome.nodes().unwrap();
        // Tokens: ["Kappa", "", "trailing"] — the empty slot survives and
        // keeps both separators.
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[1], LineNode::Space);
        assert_eq!(nodes[2], LineNode::Text(String::new()));
        assert_eq!(nodes[3], LineNode::Space);
    }

    #[test]
    fn pass_through_spans_are_kept_in_place() {
        let reg = registry();
        let spans = vec![
            InputSpan::Node(LineNode::link("https://host/u/alice", "@alice")),
            InputSpan::text(" Kappa"),
        ];
        let outcome = process_line(&spans, None, &reg, &RenderOptions::default());
        let nodes = outcome.nodes().unwrap();
        assert_eq!(nodes[0], LineNode::link("https://host/u/alice", "@alice"));
        assert!(matches!(nodes.last(), Some(LineNode::Emote(_))));
    }

    #[test]
    fn zero_width_queue_attaches_across_spans() {
        let reg = registry();
        let spans = vec![InputSpan::text("Kappa"), InputSpan::text("SoSnowy")];
        let outcome = process_line(&spans, None, &reg, &RenderOptions::default());
        let emotes = emote_nodes(&outcome);
        assert_eq!(emotes.len(), 1);
        assert_eq!(emotes[0].overlays[0].code, "SoSnowy");
    }
}
