//! Loading and saving of pipeline configuration.
//!
//! A base file shipped next to the binary (`config/emoteline.toml`) is
//! merged under the user's own file in the platform config directory;
//! the user file wins field by field. Missing files fall back to the
//! defaults below, which match the behavior the settings replace.

use eyre::{Context, eyre};
use figment::{
    Figment,
    providers::{Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::flags::ChatFlags;
use crate::models::emote::EmoteScale;
use crate::pipeline::{DEFAULT_CAPPED_EMOTE_IDS, DEFAULT_EMOTE_CAP, RenderOptions};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Platform user id of the channel whose third-party sets to load.
    pub channel_id: Option<String>,
    pub flags: ChatFlags,
    /// Preferred pixel density: 1, 2 or 4.
    pub emote_scale: u8,
    pub capped_emote_ids: Vec<String>,
    pub emote_cap: u32,
    pub providers: ProviderToggles,
    pub show_timestamps: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProviderToggles {
    pub seventv: bool,
    pub bttv: bool,
    pub ffz: bool,
}

impl Default for ProviderToggles {
    fn default() -> Self {
        Self {
            seventv: true,
            bttv: true,
            ffz: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_id: None,
            flags: ChatFlags::default(),
            emote_scale: 1,
            capped_emote_ids: DEFAULT_CAPPED_EMOTE_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            emote_cap: DEFAULT_EMOTE_CAP,
            providers: ProviderToggles::default(),
            show_timestamps: false,
        }
    }
}

impl Config {
    /// Per-invocation settings handed to the tokenizer.
    pub fn render_options(&self) -> RenderOptions {
        let scale = match self.emote_scale {
            2 => EmoteScale::X2,
            4 => EmoteScale::X4,
            _ => EmoteScale::X1,
        };
        RenderOptions {
            flags: self.flags,
            scale,
            capped_emote_ids: self.capped_emote_ids.iter().cloned().collect::<HashSet<_>>(),
            emote_cap: self.emote_cap,
        }
    }
}

fn get_config_path() -> Result<PathBuf, eyre::Report> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| eyre!("Could not find a config directory"))?
        .join(env!("CARGO_PKG_NAME"));

    Ok(config_dir.join("emoteline.toml"))
}

pub async fn load() -> Result<Config, eyre::Report> {
    let user_config_path = get_config_path()?;
    tracing::info!("Loading user config from {:?}", user_config_path);

    let base_config_path = "config/emoteline.toml";
    tracing::info!("Loading base config from {:?}", base_config_path);

    let config: Config = Figment::new()
        .merge(Toml::file(base_config_path))
        .merge(Toml::file(&user_config_path))
        .extract()
        .context("Could not load config")?;

    if !user_config_path.exists() {
        if let Err(e) = save(&config).await {
            tracing::warn!("Failed to save initial config: {}", e);
        }
    }

    Ok(config)
}

pub async fn save(config: &Config) -> Result<(), eyre::Report> {
    let path = get_config_path()?;
    tracing::info!("Saving config to {:?}", path);

    let bytes = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
    }

    let mut file = tokio::fs::File::create(path)
        .await
        .context("Failed to create config file")?;

    file.write_all(bytes.as_bytes())
        .await
        .context("Failed to write config to file")?;

    Ok(())
}
