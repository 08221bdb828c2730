use std::collections::HashMap;

use eyre::{Context, Report};
use serde::Deserialize;

use crate::models::emote::{Emote, EmoteImages, EmoteProvider};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GLOBAL_URL: &str = "https://api.frankerfacez.com/v1/set/global";
const ROOM_URL: &str = "https://api.frankerfacez.com/v1/room/id";

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    #[serde(default)]
    default_sets: Vec<u64>,
    sets: HashMap<String, FfzSet>,
}

#[derive(Debug, Deserialize)]
struct RoomResponse {
    room: Room,
    sets: HashMap<String, FfzSet>,
}

#[derive(Debug, Deserialize)]
struct Room {
    set: u64,
}

#[derive(Debug, Deserialize)]
pub struct FfzSet {
    #[serde(default)]
    pub emoticons: Vec<FfzEmoticon>,
}

#[derive(Debug, Deserialize)]
pub struct FfzEmoticon {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub modifier: bool,
    #[serde(default)]
    pub urls: HashMap<String, String>,
}

#[derive(Clone)]
pub struct FfzClient {
    client: reqwest::Client,
}

impl FfzClient {
    pub fn new() -> Result<Self, Report> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build ffz http client")?;
        Ok(Self { client })
    }

    pub async fn global_emotes(&self) -> Result<Vec<Emote>, Report> {
        let response = self
            .client
            .get(GLOBAL_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<GlobalResponse>()
            .await
            .context("Could not parse ffz global sets")?;

        let mut emotes = Vec::new();
        for set_id in &response.default_sets {
            if let Some(set) = response.sets.get(&set_id.to_string()) {
                emotes.extend(set.emoticons.iter().map(convert));
            }
        }
        Ok(emotes)
    }

    pub async fn channel_emotes(&self, platform_user_id: &str) -> Result<Vec<Emote>, Report> {
        let response = self
            .client
            .get(format!("{ROOM_URL}/{platform_user_id}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(platform_user_id, "channel unknown to ffz");
            return Ok(Vec::new());
        }

        let room = response
            .error_for_status()?
            .json::<RoomResponse>()
            .await
            .context("Could not parse ffz room response")?;

        let set_key = room.room.set.to_string();
        let Some(set) = room.sets.get(&set_key) else {
            return Ok(Vec::new());
        };
        Ok(set.emoticons.iter().map(convert).collect())
    }
}

fn convert(raw: &FfzEmoticon) -> Emote {
    // FFZ serves densities sparsely; fall back down the ladder.
    let url_1x = raw.urls.get("1").cloned().unwrap_or_default();
    let url_2x = raw.urls.get("2").cloned().unwrap_or_else(|| url_1x.clone());
    let url_4x = raw.urls.get("4").cloned().unwrap_or_else(|| url_2x.clone());

    let mut emote = Emote::new(
        raw.id.to_string(),
        raw.name.clone(),
        EmoteProvider::Ffz,
        EmoteImages {
            url_1x,
            url_2x,
            url_4x,
        },
    );
    emote.modifier_only = raw.modifier;
    emote
}
