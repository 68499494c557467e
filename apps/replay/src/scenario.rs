//! Scripted sessions replayed against the sidebar.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use guild_sidebar::InMemorySource;
use serde::Deserialize;
use shared::{
    domain::{GuildId, ReadIndicator},
    error::ApiError,
    protocol::{GatewayEvent, GuildSnapshot, ReadyState},
};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub ready: Option<ReadyState>,
    #[serde(default)]
    pub guilds: Vec<GuildSnapshot>,
    #[serde(default)]
    pub read_states: Vec<ReadStateSeed>,
    #[serde(default)]
    pub fetch_failure: Option<ApiError>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct ReadStateSeed {
    pub guild_id: GuildId,
    pub state: ReadIndicator,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Step {
    Publish(GatewayEvent),
    Select { guild_id: GuildId },
    Unselect,
    Invalidate,
    InvalidateUnreads,
    Hide,
    Show,
    Settle,
    SetReady(Option<ReadyState>),
    CacheGuild(GuildSnapshot),
    ForgetGuild { guild_id: GuildId },
    SetReadState { guild_id: GuildId, state: ReadIndicator },
    SetFetchFailure(Option<ApiError>),
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid scenario '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads the initial session state into `source`.
    pub fn seed(&self, source: &InMemorySource) {
        source.set_ready(self.ready.clone());
        for guild in &self.guilds {
            source.upsert_guild(guild.clone());
        }
        for seed in &self.read_states {
            source.set_read_state(seed.guild_id, seed.state);
        }
        source.set_fetch_failure(self.fetch_failure.clone().map(Into::into));
    }
}
