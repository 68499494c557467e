use std::fmt;

use shared::{
    domain::{FolderId, GuildId, ReadIndicator},
    protocol::FolderSnapshot,
};

use crate::{entry::GuildEntry, source::GuildSource};

/// Position of a folder in the snapshot it was built from. Stable until the
/// next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderIndex(pub usize);

impl fmt::Display for FolderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    index: FolderIndex,
    folder_id: Option<FolderId>,
    name: Option<String>,
    color: Option<u32>,
    guilds: Vec<GuildEntry>,
    selected: bool,
}

impl Folder {
    pub fn new(index: FolderIndex) -> Self {
        Self {
            index,
            folder_id: None,
            name: None,
            color: None,
            guilds: Vec::new(),
            selected: false,
        }
    }

    pub fn index(&self) -> FolderIndex {
        self.index
    }

    pub fn folder_id(&self) -> Option<FolderId> {
        self.folder_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn color(&self) -> Option<u32> {
        self.color
    }

    pub fn guilds(&self) -> &[GuildEntry] {
        &self.guilds
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Aggregate unread state of every child.
    pub fn unread(&self) -> ReadIndicator {
        self.guilds
            .iter()
            .fold(ReadIndicator::Read, |acc, guild| acc.merge(guild.unread()))
    }

    /// Replaces all children with the guilds named by the snapshot, in
    /// snapshot order. Duplicate IDs after the first are ignored.
    pub fn set(&mut self, snapshot: &FolderSnapshot, source: &dyn GuildSource) {
        self.folder_id = snapshot.folder_id;
        self.name.clone_from(&snapshot.name);
        self.color = snapshot.color;
        self.selected = false;
        self.guilds.clear();

        for &guild_id in &snapshot.guild_ids {
            if self.guild(guild_id).is_some() {
                continue;
            }
            let mut entry = GuildEntry::new(guild_id);
            entry.set_parent(Some(self.index));
            entry.invalidate(source);
            self.guilds.push(entry);
        }
    }

    pub fn guild(&self, guild_id: GuildId) -> Option<&GuildEntry> {
        self.guilds.iter().find(|g| g.id() == guild_id)
    }

    pub fn guild_mut(&mut self, guild_id: GuildId) -> Option<&mut GuildEntry> {
        self.guilds.iter_mut().find(|g| g.id() == guild_id)
    }

    /// Removes the child with the given ID. The caller owns the decision of
    /// what to do with a folder left with fewer than two children.
    pub fn remove(&mut self, guild_id: GuildId) -> Option<GuildEntry> {
        let index = self.guilds.iter().position(|g| g.id() == guild_id)?;
        let mut entry = self.guilds.remove(index);
        entry.set_parent(None);
        if entry.is_selected() {
            self.selected = false;
        }
        Some(entry)
    }

    /// Selects one child and the folder with it.
    pub(crate) fn select(&mut self, guild_id: GuildId) -> bool {
        match self.guild_mut(guild_id) {
            Some(entry) => {
                entry.select();
                self.selected = true;
                true
            }
            None => false,
        }
    }

    pub fn unselect(&mut self) {
        self.selected = false;
        for guild in &mut self.guilds {
            guild.unselect();
        }
    }

    /// Dissolves the folder, handing its children back as bare entries.
    pub(crate) fn into_guilds(self) -> Vec<GuildEntry> {
        self.guilds
            .into_iter()
            .map(|mut entry| {
                entry.set_parent(None);
                entry
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/folder_tests.rs"]
mod tests;
