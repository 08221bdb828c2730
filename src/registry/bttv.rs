use eyre::{Context, Report};
use serde::Deserialize;

use crate::models::emote::{Emote, EmoteImages, EmoteProvider};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GLOBAL_URL: &str = "https://api.betterttv.net/3/cached/emotes/global";
const USER_URL: &str = "https://api.betterttv.net/3/cached/users/twitch";
const CDN_URL: &str = "https://cdn.betterttv.net/emote";

/// BTTV does not flag zero-width emotes in its API; the community list of
/// overlay codes is fixed and well known.
const ZERO_WIDTH_CODES: &[&str] = &[
    "SoSnowy", "IceCold", "SantaHat", "TopHat", "ReinDeer", "CandyCane", "cvMask", "cvHazmat",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BttvEmote {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub animated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    #[serde(default)]
    channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    shared_emotes: Vec<BttvEmote>,
}

#[derive(Clone)]
pub struct BttvClient {
    client: reqwest::Client,
}

impl BttvClient {
    pub fn new() -> Result<Self, Report> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build bttv http client")?;
        Ok(Self { client })
    }

    pub async fn global_emotes(&self) -> Result<Vec<Emote>, Report> {
        let emotes = self
            .client
            .get(GLOBAL_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<BttvEmote>>()
            .await
            .context("Could not parse bttv global emotes")?;

        Ok(emotes.into_iter().map(convert).collect())
    }

    /// Channel and shared emotes for the given platform user id. An unknown
    /// user yields an empty set rather than an error; bttv returns 404 for
    /// channels it has never seen.
    pub async fn channel_emotes(&self, platform_user_id: &str) -> Result<Vec<Emote>, Report> {
        let response = self
            .client
            .get(format!("{USER_URL}/{platform_user_id}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(platform_user_id, "channel unknown to bttv");
            return Ok(Vec::new());
        }

        let user = response
            .error_for_status()?
            .json::<UserResponse>()
            .await
            .context("Could not parse bttv user response")?;

        Ok(user
            .channel_emotes
            .into_iter()
            .chain(user.shared_emotes)
            .map(convert)
            .collect())
    }
}

fn convert(raw: BttvEmote) -> Emote {
    let images = EmoteImages {
        url_1x: format!("{CDN_URL}/{}/1x", raw.id),
        url_2x: format!("{CDN_URL}/{}/2x", raw.id),
        url_4x: format!("{CDN_URL}/{}/3x", raw.id),
    };
    let zero_width = ZERO_WIDTH_CODES.contains(&raw.code.as_str());

    let mut emote = Emote::new(raw.id, raw.code, EmoteProvider::Bttv, images.clone());
    if raw.animated {
        emote.animated = Some(images);
    }
    emote.zero_width = zero_width;
    emote
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_overlay_codes_convert_as_zero_width() {
        let emote = convert(BttvEmote {
            id: "5e76d338d6581c3724c0f0b2".into(),
            code: "SoSnowy".into(),
            animated: true,
        });
        assert!(emote.zero_width);
        assert!(emote.animated.is_some());
        assert_eq!(
            emote.images.url_1x,
            "https://cdn.betterttv.net/emote/5e76d338d6581c3724c0f0b2/1x"
        );
    }

    #[test]
    fn regular_emote_is_not_zero_width() {
        let emote = convert(BttvEmote {
            id: "abc".into(),
            code: "catJAM".into(),
            animated: false,
        });
        assert!(!emote.zero_width);
        assert!(emote.animated.is_none());
    }
}
