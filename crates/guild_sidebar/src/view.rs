//! The guild list: top-level guilds and folders, the current selection, and
//! the owner-thread inbox that serializes every rebuild.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use shared::{
    domain::GuildId,
    protocol::{FolderSnapshot, GatewayEvent, GuildSnapshot},
};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::{
    config::SidebarConfig,
    controller::Controller,
    entry::GuildEntry,
    error::SidebarError,
    events::EventAdapter,
    folder::{Folder, FolderIndex},
    sort::sort_by_positions,
    source::GuildSource,
};

/// A top-level row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChild {
    Guild(GuildEntry),
    Folder(Folder),
}

impl ViewChild {
    pub fn as_guild(&self) -> Option<&GuildEntry> {
        match self {
            ViewChild::Guild(guild) => Some(guild),
            ViewChild::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            ViewChild::Folder(folder) => Some(folder),
            ViewChild::Guild(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Empty,
    /// Built from a guild list in fetch order.
    Unsorted,
    /// Built from a guild list sorted by stored positions.
    Ordered,
    /// Built from the account's folder layout.
    FolderStructured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CurrentGuild {
    guild: GuildId,
    folder: Option<FolderIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    TopLevel(usize),
    InFolder(usize),
}

pub(crate) struct FetchedGuilds {
    pub(crate) guilds: Vec<GuildSnapshot>,
    pub(crate) ordered: bool,
}

pub(crate) enum ViewMessage {
    Fetched {
        generation: u64,
        result: Result<FetchedGuilds, SidebarError>,
    },
    Gateway {
        epoch: u64,
        event: GatewayEvent,
    },
    Resync {
        epoch: u64,
    },
}

pub struct GuildListView {
    children: Vec<ViewChild>,
    current: Option<CurrentGuild>,
    state: ViewState,

    ctrl: Box<dyn Controller>,
    source: Arc<dyn GuildSource>,
    runtime: Handle,
    config: SidebarConfig,

    inbox_tx: Sender<ViewMessage>,
    inbox_rx: Receiver<ViewMessage>,
    requested_generation: u64,
    applied_generation: u64,
    /// Raised off-thread when a message could not be queued.
    dropped: Arc<AtomicBool>,

    pub(crate) events: EventAdapter,
}

impl GuildListView {
    /// Creates an empty view. Fetches and event forwarding run on `runtime`;
    /// everything else runs on the calling thread, which owns the view.
    pub fn new(
        source: Arc<dyn GuildSource>,
        ctrl: Box<dyn Controller>,
        runtime: Handle,
        config: SidebarConfig,
    ) -> Self {
        let (inbox_tx, inbox_rx) = bounded(config.inbox_capacity.max(1));
        Self {
            children: Vec::new(),
            current: None,
            state: ViewState::Empty,
            ctrl,
            source,
            runtime,
            config,
            inbox_tx,
            inbox_rx,
            requested_generation: 0,
            applied_generation: 0,
            dropped: Arc::new(AtomicBool::new(false)),
            events: EventAdapter::default(),
        }
    }

    pub fn children(&self) -> &[ViewChild] {
        &self.children
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn selected(&self) -> Option<GuildId> {
        self.current.map(|current| current.guild)
    }

    /// True while a requested rebuild has not been applied or reported yet.
    pub fn is_fetching(&self) -> bool {
        self.requested_generation > self.applied_generation
    }

    pub fn source(&self) -> &Arc<dyn GuildSource> {
        &self.source
    }

    pub(crate) fn controller_mut(&mut self) -> &mut dyn Controller {
        self.ctrl.as_mut()
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub(crate) fn inbox(&self) -> Sender<ViewMessage> {
        self.inbox_tx.clone()
    }

    pub(crate) fn dropped_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }

    #[cfg(test)]
    pub(crate) fn pending_messages(&self) -> usize {
        self.inbox_rx.len()
    }

    #[cfg(test)]
    pub(crate) fn has_dropped_messages(&self) -> bool {
        self.dropped.load(Ordering::Acquire)
    }

    /// Rebuilds everything. A stored folder layout is applied right away;
    /// otherwise the guild list is fetched off-thread and applied once
    /// drained from the inbox.
    pub fn invalidate(&mut self) {
        let ready = self.source.ready();
        self.requested_generation += 1;
        let generation = self.requested_generation;

        if let Some(folders) = ready.as_ref().and_then(|ready| ready.folders.as_ref()) {
            self.applied_generation = generation;
            self.set_folders(folders);
            return;
        }

        let positions = ready.map(|ready| ready.guild_positions).unwrap_or_default();
        let source = Arc::clone(&self.source);
        let inbox = self.inbox_tx.clone();
        let dropped = Arc::clone(&self.dropped);
        let fetch_timeout = self.config.fetch_timeout;

        debug!(generation, "fetching guild list");
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(fetch_timeout, source.fetch_guilds()).await {
                Ok(Ok(mut guilds)) => {
                    let ordered = !positions.is_empty();
                    sort_by_positions(&mut guilds, &positions);
                    Ok(FetchedGuilds { guilds, ordered })
                }
                Ok(Err(err)) => Err(SidebarError::from(err)),
                Err(_) => Err(SidebarError::FetchTimeout {
                    after: fetch_timeout,
                }),
            };

            match inbox.try_send(ViewMessage::Fetched { generation, result }) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(generation, "sidebar inbox is full; guild list will be refetched");
                    dropped.store(true, Ordering::Release);
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!(generation, "sidebar dropped before guild list arrived");
                }
            }
        });
    }

    /// Replaces every row with the given folder layout. Folders holding a
    /// single guild are shown as that guild; empty folders are skipped.
    pub fn set_folders(&mut self, folders: &[FolderSnapshot]) {
        let mut children = Vec::with_capacity(folders.len());

        for (i, snapshot) in folders.iter().enumerate() {
            match snapshot.guild_ids.as_slice() {
                [] => {
                    debug!(folder = i, "skipping empty folder");
                }
                [guild_id] => {
                    let mut entry = GuildEntry::new(*guild_id);
                    entry.invalidate(self.source.as_ref());
                    children.push(ViewChild::Guild(entry));
                }
                _ => {
                    let mut folder = Folder::new(FolderIndex(i));
                    folder.set(snapshot, self.source.as_ref());
                    if folder.len() == 1 {
                        children.extend(folder.into_guilds().into_iter().map(ViewChild::Guild));
                    } else {
                        children.push(ViewChild::Folder(folder));
                    }
                }
            }
        }

        self.replace_children(children, ViewState::FolderStructured);
    }

    /// Replaces every row with bare guilds in the given order.
    pub fn set_guilds(&mut self, guilds: &[GuildSnapshot]) {
        self.set_guild_list(guilds, ViewState::Unsorted);
    }

    fn set_guild_list(&mut self, guilds: &[GuildSnapshot], state: ViewState) {
        let mut children: Vec<ViewChild> = Vec::with_capacity(guilds.len());

        for snapshot in guilds {
            let duplicate = children
                .iter()
                .filter_map(ViewChild::as_guild)
                .any(|g| g.id() == snapshot.guild_id);
            if duplicate {
                warn!(guild_id = %snapshot.guild_id, "duplicate guild in list");
                continue;
            }

            let mut entry = GuildEntry::from_snapshot(snapshot);
            entry.invalidate_unread(self.source.as_ref());
            children.push(ViewChild::Guild(entry));
        }

        self.replace_children(children, state);
    }

    /// Swaps in a new set of rows, carrying the selection over by guild ID.
    /// Capture, clear, rebuild and reselect happen without yielding.
    fn replace_children(&mut self, children: Vec<ViewChild>, state: ViewState) {
        let restore = self.selected();

        self.clear();
        self.children = children;
        self.state = if self.children.is_empty() {
            ViewState::Empty
        } else {
            state
        };
        info!(rows = self.children.len(), state = ?self.state, "guild list rebuilt");

        if let Some(guild_id) = restore {
            if self.guild(guild_id).is_some() {
                self.select_guild(guild_id);
            } else {
                debug!(%guild_id, "selected guild is gone after rebuild");
            }
        }
    }

    fn clear(&mut self) {
        self.children.clear();
        self.current = None;
        self.state = ViewState::Empty;
    }

    /// Prepends a single guild. A guild that is already shown is updated in
    /// place instead.
    pub fn add_guild(&mut self, snapshot: &GuildSnapshot) {
        if self.guild(snapshot.guild_id).is_some() {
            debug!(guild_id = %snapshot.guild_id, "guild already listed; updating");
            self.update_guild(snapshot);
            return;
        }

        let mut entry = GuildEntry::from_snapshot(snapshot);
        entry.invalidate_unread(self.source.as_ref());
        self.children.insert(0, ViewChild::Guild(entry));
        if self.state == ViewState::Empty {
            self.state = ViewState::Unsorted;
        }
    }

    /// Overwrites a listed guild from a fresh snapshot. Returns false if the
    /// guild is not listed.
    pub fn update_guild(&mut self, snapshot: &GuildSnapshot) -> bool {
        let source = Arc::clone(&self.source);
        match self.guild_mut(snapshot.guild_id) {
            Some(entry) => {
                entry.update(snapshot);
                entry.invalidate_unread(source.as_ref());
                true
            }
            None => false,
        }
    }

    /// Reloads a listed guild from the source's cache.
    pub fn invalidate_guild(&mut self, guild_id: GuildId) -> bool {
        let source = Arc::clone(&self.source);
        match self.guild_mut(guild_id) {
            Some(entry) => {
                entry.invalidate(source.as_ref());
                true
            }
            None => false,
        }
    }

    pub fn invalidate_unread(&mut self, guild_id: GuildId) -> bool {
        let source = Arc::clone(&self.source);
        match self.guild_mut(guild_id) {
            Some(entry) => {
                entry.invalidate_unread(source.as_ref());
                true
            }
            None => false,
        }
    }

    pub fn set_unavailable(&mut self, guild_id: GuildId) -> bool {
        match self.guild_mut(guild_id) {
            Some(entry) => {
                entry.set_unavailable();
                true
            }
            None => false,
        }
    }

    /// Refreshes the unread state of top-level guilds. Guilds inside folders
    /// are left alone.
    pub fn invalidate_unreads(&mut self) {
        let source = Arc::clone(&self.source);
        for child in &mut self.children {
            if let ViewChild::Guild(entry) = child {
                entry.invalidate_unread(source.as_ref());
            }
        }
    }

    /// Removes a guild. If it was selected the controller is told to leave
    /// it for good. A folder left empty disappears; a folder left with one
    /// guild is replaced by that guild.
    pub fn remove_guild(&mut self, guild_id: GuildId) {
        let Some(location) = self.locate(guild_id) else {
            debug!(%guild_id, "remove for unknown guild");
            return;
        };

        if self.selected() == Some(guild_id) {
            self.ctrl.close_guild(true);
            self.current = None;
        }

        match location {
            Location::TopLevel(index) => {
                self.children.remove(index);
            }
            Location::InFolder(index) => {
                let remaining = match &mut self.children[index] {
                    ViewChild::Folder(folder) => {
                        folder.remove(guild_id);
                        folder.len()
                    }
                    ViewChild::Guild(_) => return,
                };
                match remaining {
                    0 => {
                        self.children.remove(index);
                    }
                    1 => self.unbox_folder(index),
                    _ => {}
                }
            }
        }

        if self.children.is_empty() {
            self.state = ViewState::Empty;
        }
    }

    fn unbox_folder(&mut self, index: usize) {
        if !matches!(self.children.get(index), Some(ViewChild::Folder(_))) {
            return;
        }
        let ViewChild::Folder(folder) = self.children.remove(index) else {
            return;
        };
        debug!(folder = %folder.index(), "unboxing single-guild folder");

        for (offset, entry) in folder.into_guilds().into_iter().enumerate() {
            if let Some(current) = self.current.as_mut() {
                if current.guild == entry.id() {
                    current.folder = None;
                }
            }
            self.children.insert(index + offset, ViewChild::Guild(entry));
        }
    }

    fn locate(&self, guild_id: GuildId) -> Option<Location> {
        self.children
            .iter()
            .enumerate()
            .find_map(|(index, child)| match child {
                ViewChild::Guild(entry) if entry.id() == guild_id => {
                    Some(Location::TopLevel(index))
                }
                ViewChild::Folder(folder) if folder.guild(guild_id).is_some() => {
                    Some(Location::InFolder(index))
                }
                _ => None,
            })
    }

    /// Finds a guild at the top level or inside a folder.
    pub fn guild(&self, guild_id: GuildId) -> Option<&GuildEntry> {
        self.children.iter().find_map(|child| match child {
            ViewChild::Guild(entry) => (entry.id() == guild_id).then_some(entry),
            ViewChild::Folder(folder) => folder.guild(guild_id),
        })
    }

    pub fn guild_mut(&mut self, guild_id: GuildId) -> Option<&mut GuildEntry> {
        self.children.iter_mut().find_map(|child| match child {
            ViewChild::Guild(entry) => (entry.id() == guild_id).then_some(entry),
            ViewChild::Folder(folder) => folder.guild_mut(guild_id),
        })
    }

    pub fn folder(&self, index: FolderIndex) -> Option<&Folder> {
        self.children
            .iter()
            .filter_map(ViewChild::as_folder)
            .find(|folder| folder.index() == index)
    }

    fn folder_mut(&mut self, index: FolderIndex) -> Option<&mut Folder> {
        self.children.iter_mut().find_map(|child| match child {
            ViewChild::Folder(folder) if folder.index() == index => Some(folder),
            _ => None,
        })
    }

    /// Selects a guild and asks the controller to open it. An unknown guild
    /// closes the guild view instead.
    pub fn select_guild(&mut self, guild_id: GuildId) {
        let Some(target) = self.guild(guild_id).map(|entry| CurrentGuild {
            guild: entry.id(),
            folder: entry.parent_folder(),
        }) else {
            debug!(%guild_id, "select for unknown guild");
            self.ctrl.close_guild(true);
            return;
        };

        if self.current != Some(target) {
            self.unselect();
            self.mark_selected(target);
            self.current = Some(target);
        }

        self.ctrl.open_guild(guild_id);
    }

    fn mark_selected(&mut self, target: CurrentGuild) {
        match target.folder {
            Some(index) => {
                if let Some(folder) = self.folder_mut(index) {
                    folder.select(target.guild);
                }
            }
            None => {
                if let Some(entry) = self.guild_mut(target.guild) {
                    entry.select();
                }
            }
        }
    }

    /// Clears the selection. Use when the window shows something that does
    /// not belong to any guild.
    pub fn unselect(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };

        if let Some(index) = current.folder {
            if let Some(folder) = self.folder_mut(index) {
                folder.unselect();
            }
        }
        if let Some(entry) = self.guild_mut(current.guild) {
            entry.unselect();
        }
    }

    /// Applies everything already waiting in the inbox. Returns the number of
    /// messages handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox_rx.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        if self.recover_dropped() {
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one message and applies it. A pending
    /// recovery from a dropped message counts as one.
    pub fn process_next(&mut self, timeout: Duration) -> bool {
        if self.recover_dropped() {
            return true;
        }
        // The view holds both ends of the inbox, so only a timeout can end the wait.
        match self.inbox_rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_message(message);
                true
            }
            Err(_) => self.recover_dropped(),
        }
    }

    /// Rebuilds from scratch once something could not be queued. Whatever
    /// was lost, a dropped guild list or a gateway event, the rebuild
    /// supersedes it.
    fn recover_dropped(&mut self) -> bool {
        if !self.dropped.swap(false, Ordering::AcqRel) {
            return false;
        }
        info!("sidebar inbox overflowed; rebuilding guild list");
        self.applied_generation = self.requested_generation;
        self.invalidate();
        true
    }

    fn handle_message(&mut self, message: ViewMessage) {
        match message {
            ViewMessage::Fetched { generation, result } => self.apply_fetched(generation, result),
            ViewMessage::Gateway { epoch, event } => {
                if self.events.accepts(epoch) {
                    self.handle_event(event);
                } else {
                    debug!(epoch, "dropping event from revoked subscription");
                }
            }
            ViewMessage::Resync { epoch } => {
                if self.events.accepts(epoch) {
                    info!("gateway events were lost; rebuilding guild list");
                    self.invalidate();
                }
            }
        }
    }

    fn apply_fetched(&mut self, generation: u64, result: Result<FetchedGuilds, SidebarError>) {
        if generation < self.applied_generation {
            debug!(
                generation,
                applied = self.applied_generation,
                "discarding stale guild list"
            );
            return;
        }
        self.applied_generation = generation;

        match result {
            Ok(FetchedGuilds { guilds, ordered }) => {
                let state = if ordered {
                    ViewState::Ordered
                } else {
                    ViewState::Unsorted
                };
                self.set_guild_list(&guilds, state);
            }
            Err(err) => {
                warn!(generation, "guild list fetch failed: {err}");
                self.ctrl.show_error(&err);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
