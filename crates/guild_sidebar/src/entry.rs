use shared::{
    domain::{GuildId, ReadIndicator},
    protocol::GuildSnapshot,
};
use tracing::debug;

use crate::{folder::FolderIndex, source::GuildSource};

/// One guild row in the sidebar, either at the top level or inside a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildEntry {
    id: GuildId,
    name: String,
    icon_url: Option<String>,
    unread: ReadIndicator,
    selected: bool,
    unavailable: bool,
    parent: Option<FolderIndex>,
}

impl GuildEntry {
    /// Creates an entry that only knows its ID. Call [`GuildEntry::update`] or
    /// [`GuildEntry::invalidate`] to fill in the display fields.
    pub fn new(id: GuildId) -> Self {
        Self {
            id,
            name: String::new(),
            icon_url: None,
            unread: ReadIndicator::Read,
            selected: false,
            unavailable: false,
            parent: None,
        }
    }

    pub fn from_snapshot(snapshot: &GuildSnapshot) -> Self {
        let mut entry = Self::new(snapshot.guild_id);
        entry.update(snapshot);
        entry
    }

    pub fn id(&self) -> GuildId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon_url(&self) -> Option<&str> {
        self.icon_url.as_deref()
    }

    pub fn unread(&self) -> ReadIndicator {
        self.unread
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    pub fn parent_folder(&self) -> Option<FolderIndex> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<FolderIndex>) {
        self.parent = parent;
    }

    /// Overwrites the display fields. A fresh snapshot means the guild is
    /// reachable again.
    pub fn update(&mut self, snapshot: &GuildSnapshot) {
        debug_assert_eq!(snapshot.guild_id, self.id);
        self.name.clone_from(&snapshot.name);
        self.icon_url.clone_from(&snapshot.icon_url);
        self.unavailable = false;
    }

    /// Reloads everything from the source's cache and read state.
    pub fn invalidate(&mut self, source: &dyn GuildSource) {
        match source.cached_guild(self.id) {
            Some(snapshot) => self.update(&snapshot),
            None => {
                debug!(guild_id = %self.id, "guild missing from cache");
                self.set_unavailable();
            }
        }
        self.invalidate_unread(source);
    }

    pub fn invalidate_unread(&mut self, source: &dyn GuildSource) {
        self.unread = source.read_state(self.id);
    }

    pub fn set_unavailable(&mut self) {
        self.unavailable = true;
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn unselect(&mut self) {
        self.selected = false;
    }
}
