use super::emote::EmoteNode;
use super::user::ChatUser;
use chrono::{DateTime, Local};

/// One item of a reconstructed chat line.
#[derive(Clone, Debug, PartialEq)]
pub enum LineNode {
    Text(String),
    /// Single-space separator reinserted between surviving token slots.
    Space,
    Link { href: String, label: String },
    Emote(EmoteNode),
}

impl LineNode {
    pub fn link(href: impl Into<String>, label: impl Into<String>) -> Self {
        LineNode::Link {
            href: href.into(),
            label: label.into(),
        }
    }
}

/// One input span of a chat line. A line is a sequence of sibling spans:
/// plain text to be tokenized, or an already-rendered node (mention pill,
/// badge, ...) that passes through untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSpan {
    Text(String),
    Node(LineNode),
}

impl InputSpan {
    pub fn text(s: impl Into<String>) -> Self {
        InputSpan::Text(s.into())
    }
}

/// Result of running the tokenizer over one line. `Unchanged` means no
/// token was recognized as special and the caller must leave the original
/// nodes alone.
#[derive(Clone, Debug, PartialEq)]
pub enum LineOutcome {
    Unchanged,
    Modified(Vec<LineNode>),
}

impl LineOutcome {
    pub fn is_modified(&self) -> bool {
        matches!(self, LineOutcome::Modified(_))
    }

    pub fn nodes(&self) -> Option<&[LineNode]> {
        match self {
            LineOutcome::Unchanged => None,
            LineOutcome::Modified(nodes) => Some(nodes),
        }
    }
}

/// A chat message as fed to the pipeline by a lifecycle caller.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub user: Option<ChatUser>,
    pub spans: Vec<InputSpan>,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn from_text(user: Option<ChatUser>, text: impl Into<String>) -> Self {
        Self {
            user,
            spans: vec![InputSpan::Text(text.into())],
            timestamp: Local::now(),
        }
    }
}
