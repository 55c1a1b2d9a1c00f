use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/honorbot/config.toml";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub llm: Llm,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    pub command_prefix: String,
    /// Role names whose members may deduct honor points.
    pub privileged_roles: Vec<String>,
    /// Channel that receives a notice when a user cannot be DMed.
    pub fallback_channel_id: u64,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Llm {
    /// OpenAI-compatible chat-completion endpoint.
    pub api_url: String,
    pub api_key: String,
    pub model_name: String,
    /// Persona system prompt sent with every relayed message.
    pub system: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    /// Channel where every non-command message is relayed to the model.
    /// DMs are always relayed.
    pub channel_id: u64,
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(config)
    }
}
