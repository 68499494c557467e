use serde::{Deserialize, Serialize};

use crate::domain::{FolderId, GuildId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSnapshot {
    pub guild_id: GuildId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl GuildSnapshot {
    pub fn new(guild_id: GuildId, name: impl Into<String>) -> Self {
        Self {
            guild_id,
            name: name.into(),
            icon_url: None,
        }
    }
}

/// A user-defined group of guilds as stored in the account settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    pub guild_ids: Vec<GuildId>,
}

impl FolderSnapshot {
    pub fn new(guild_ids: Vec<GuildId>) -> Self {
        Self {
            folder_id: None,
            name: None,
            color: None,
            guild_ids,
        }
    }
}

/// Session settings delivered with the ready payload. `folders` is `None` when
/// the account never stored a folder layout, which is different from an
/// empty layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<FolderSnapshot>>,
    #[serde(default)]
    pub guild_positions: Vec<GuildId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GatewayEvent {
    Ready,
    ReadStateUpdated {
        guild_id: GuildId,
    },
    GuildCreated {
        guild: GuildSnapshot,
    },
    GuildUpdated {
        guild_id: GuildId,
    },
    GuildDeleted {
        guild_id: GuildId,
        #[serde(default)]
        unavailable: bool,
    },
}
