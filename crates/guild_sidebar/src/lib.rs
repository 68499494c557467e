//! Guild sidebar synchronization: keeps an ordered list of guilds and guild
//! folders consistent with the gateway event stream while preserving the
//! user's selection across rebuilds.

pub mod config;
pub mod controller;
pub mod entry;
pub mod error;
mod events;
pub mod folder;
pub mod sort;
pub mod source;
pub mod view;

pub use config::SidebarConfig;
pub use controller::{Controller, ControllerCall, RecordingController};
pub use entry::GuildEntry;
pub use error::SidebarError;
pub use folder::{Folder, FolderIndex};
pub use source::{GuildSource, InMemorySource};
pub use view::{GuildListView, ViewChild, ViewState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
