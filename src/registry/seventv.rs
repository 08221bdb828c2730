use eyre::{Context, Report};
use serde::Deserialize;

use crate::models::emote::{Emote, EmoteImages, EmoteProvider};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GLOBAL_SET_URL: &str = "https://7tv.io/v3/emote-sets/global";
const USER_URL: &str = "https://7tv.io/v3/users/twitch";

/// Set-level flag marking an emote as zero-width.
const ACTIVE_EMOTE_FLAG_ZERO_WIDTH: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct EmoteSet {
    pub id: String,
    #[serde(default)]
    pub emotes: Vec<ActiveEmote>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveEmote {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    pub data: Option<EmoteData>,
}

#[derive(Debug, Deserialize)]
pub struct EmoteData {
    #[serde(default)]
    pub animated: bool,
    pub host: EmoteHost,
}

#[derive(Debug, Deserialize)]
pub struct EmoteHost {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    emote_set: Option<EmoteSet>,
}

#[derive(Clone)]
pub struct SevenTvClient {
    client: reqwest::Client,
}

impl SevenTvClient {
    pub fn new() -> Result<Self, Report> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build 7tv http client")?;
        Ok(Self { client })
    }

    pub async fn global_emotes(&self) -> Result<Vec<Emote>, Report> {
        let set = self
            .client
            .get(GLOBAL_SET_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<EmoteSet>()
            .await
            .context("Could not parse 7tv global emote set")?;

        Ok(set.emotes.into_iter().filter_map(convert_active).collect())
    }

    /// Fetches a channel's active emote set for the given platform user id.
    /// Returns the set id (needed to subscribe to live updates) alongside
    /// the converted emotes.
    pub async fn channel_emotes(&self, platform_user_id: &str) -> Result<(String, Vec<Emote>), Report> {
        let user = self
            .client
            .get(format!("{USER_URL}/{platform_user_id}"))
            .send()
            .await?
            .error_for_status()?
            .json::<UserResponse>()
            .await
            .context("Could not parse 7tv user response")?;

        let Some(set) = user.emote_set else {
            tracing::info!(platform_user_id, "channel has no 7tv emote set");
            return Ok((String::new(), Vec::new()));
        };

        let emotes = set.emotes.into_iter().filter_map(convert_active).collect();
        Ok((set.id, emotes))
    }
}

/// Converts an active set emote to the registry model. Emotes without
/// resolvable image data are skipped.
pub(crate) fn convert_active(active: ActiveEmote) -> Option<Emote> {
    let data = active.data?;
    // Host urls come back protocol-relative.
    let base = if data.host.url.starts_with("//") {
        format!("https:{}", data.host.url)
    } else {
        data.host.url.clone()
    };
    let images = EmoteImages {
        url_1x: format!("{base}/1x.webp"),
        url_2x: format!("{base}/2x.webp"),
        url_4x: format!("{base}/4x.webp"),
    };

    let mut emote = Emote::new(active.id, active.name, EmoteProvider::SevenTv, images.clone());
    if data.animated {
        emote.animated = Some(images);
    }
    emote.zero_width = active.flags & ACTIVE_EMOTE_FLAG_ZERO_WIDTH != 0;
    Some(emote)
}
