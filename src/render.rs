//! Thin presentation adapter over the pipeline's output items.
//!
//! The core never touches a display surface; these helpers turn a
//! reconstructed line back into strings, either losslessly (emotes as
//! their codes) or annotated for terminal inspection.

use crate::models::emote::EmoteNode;
use crate::models::message::LineNode;

/// Lossless text form: emotes render as their codes, links as their
/// labels. A line of plain-text tokens round-trips to the original string.
pub fn to_plain_text(nodes: &[LineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            LineNode::Text(text) => out.push_str(text),
            LineNode::Space => out.push(' '),
            LineNode::Link { label, .. } => out.push_str(label),
            LineNode::Emote(emote) => out.push_str(&emote.code),
        }
    }
    out
}

/// Human-readable form for the terminal: emotes in brackets with their
/// classes and stacked overlays visible.
pub fn to_annotated(nodes: &[LineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            LineNode::Text(text) => out.push_str(text),
            LineNode::Space => out.push(' '),
            LineNode::Link { href, .. } => {
                out.push('<');
                out.push_str(href);
                out.push('>');
            }
            LineNode::Emote(emote) => out.push_str(&annotate_emote(emote)),
        }
    }
    out
}

fn annotate_emote(node: &EmoteNode) -> String {
    let mut out = String::from("[");
    out.push_str(&node.code);
    if !node.classes.is_empty() {
        out.push('|');
        out.push_str(&node.classes.join(","));
    }
    for overlay in &node.overlays {
        out.push('+');
        out.push_str(&annotate_emote(overlay));
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::emote::{Emote, EmoteImages, EmoteProvider, EmoteScale};
    use pretty_assertions::assert_eq;

    fn node(code: &str) -> EmoteNode {
        Emote::new("id", code, EmoteProvider::Bttv, EmoteImages::default()).render(
            &[],
            &[],
            &[],
            EmoteScale::X1,
            false,
        )
    }

    #[test]
    fn plain_text_uses_emote_codes() {
        let nodes = vec![
            LineNode::Text("hi".into()),
            LineNode::Space,
            LineNode::Emote(node("Kappa")),
        ];
        assert_eq!(to_plain_text(&nodes), "hi Kappa");
    }

    #[test]
    fn annotated_shows_overlays() {
        let mut base = node("Kappa");
        base.overlays.push(node("SoSnowy"));
        assert_eq!(to_annotated(&[LineNode::Emote(base)]), "[Kappa+[SoSnowy]]");
    }
}
