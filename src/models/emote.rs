use crate::models::user::ChatUser;
use crate::pipeline::modifiers::Modifier;

/// Origin service of an emote. Each provider keeps independent global and
/// per-channel sets; lookup precedence between them lives in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmoteProvider {
    /// The host platform's own (legacy) emotes.
    Platform,
    SevenTv,
    Bttv,
    Ffz,
}

impl EmoteProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmoteProvider::Platform => "platform",
            EmoteProvider::SevenTv => "7tv",
            EmoteProvider::Bttv => "bttv",
            EmoteProvider::Ffz => "ffz",
        }
    }
}

/// Pixel-density variant to render at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmoteScale {
    #[default]
    X1,
    X2,
    X4,
}

/// Image urls by pixel density for one emote. Providers that only serve a
/// single density repeat the url.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmoteImages {
    pub url_1x: String,
    pub url_2x: String,
    pub url_4x: String,
}

impl EmoteImages {
    pub fn at(&self, scale: EmoteScale) -> &str {
        match scale {
            EmoteScale::X1 => &self.url_1x,
            EmoteScale::X2 => &self.url_2x,
            EmoteScale::X4 => &self.url_4x,
        }
    }
}

/// Eligibility predicate attached to an emote, evaluated against the
/// viewing user at lookup time. An unknown user means no restriction
/// context: the emote is treated as eligible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Restriction {
    #[default]
    None,
    SubscriberOnly,
}

impl Restriction {
    pub fn allows(&self, user: Option<&ChatUser>) -> bool {
        match self {
            Restriction::None => true,
            Restriction::SubscriberOnly => user.map_or(true, |u| u.subscriber),
        }
    }
}

/// One emote as known to the registry. Immutable once constructed; shared
/// via `Arc` and replaced wholesale when a provider set refreshes.
#[derive(Clone, Debug, PartialEq)]
pub struct Emote {
    pub id: String,
    pub code: String,
    pub provider: EmoteProvider,
    pub images: EmoteImages,
    /// Animated variant urls, when the provider serves one.
    pub animated: Option<EmoteImages>,
    /// The emote is itself a modifier alias (FFZ modifier emotes) and never
    /// renders standalone.
    pub modifier_only: bool,
    /// Renders as an overlay on the preceding emote instead of inline.
    pub zero_width: bool,
    pub restriction: Restriction,
}

impl Emote {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        provider: EmoteProvider,
        images: EmoteImages,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            provider,
            images,
            animated: None,
            modifier_only: false,
            zero_width: false,
            restriction: Restriction::None,
        }
    }

    /// Url for the given density, preferring the animated variant when one
    /// exists and animation is wanted.
    pub fn url(&self, scale: EmoteScale, animated: bool) -> &str {
        if animated {
            if let Some(images) = &self.animated {
                return images.at(scale);
            }
        }
        self.images.at(scale)
    }

    /// Renders the emote into an output node, carrying the resolved prefix
    /// and suffix modifiers plus the combined class list separately so the
    /// presentation layer can style them however it likes.
    pub fn render(
        &self,
        prefix: &[&'static Modifier],
        suffix: &[&'static Modifier],
        classes: &[String],
        scale: EmoteScale,
        animated: bool,
    ) -> EmoteNode {
        EmoteNode {
            id: self.id.clone(),
            code: self.code.clone(),
            provider: self.provider,
            url: self.url(scale, animated).to_string(),
            prefix_classes: prefix.iter().map(|m| m.class.to_string()).collect(),
            suffix_classes: suffix.iter().map(|m| m.class.to_string()).collect(),
            classes: classes.to_vec(),
            overlays: Vec::new(),
        }
    }
}

/// The rendered form of an emote, opaque to the tokenizer core. Zero-width
/// emotes stack inside `overlays` rather than appearing as siblings.
#[derive(Clone, Debug, PartialEq)]
pub struct EmoteNode {
    pub id: String,
    pub code: String,
    pub provider: EmoteProvider,
    pub url: String,
    pub prefix_classes: Vec<String>,
    pub suffix_classes: Vec<String>,
    pub classes: Vec<String>,
    pub overlays: Vec<EmoteNode>,
}

impl EmoteNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}
