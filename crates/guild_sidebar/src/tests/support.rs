use std::{sync::Arc, time::Duration};

use shared::{
    domain::GuildId,
    protocol::{FolderSnapshot, GuildSnapshot},
};
use tokio::runtime::{Builder, Runtime};

use crate::{
    config::SidebarConfig,
    controller::RecordingController,
    source::InMemorySource,
    view::{GuildListView, ViewChild},
};

pub(crate) const SETTLE: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Row {
    Guild(i64),
    Folder(Vec<i64>),
}

pub(crate) struct Harness {
    pub(crate) view: GuildListView,
    pub(crate) source: Arc<InMemorySource>,
    pub(crate) ctrl: RecordingController,
    _runtime: Runtime,
}

impl Harness {
    /// View over a source caching guilds named "guild N" for each ID.
    pub(crate) fn new(ids: &[i64]) -> Self {
        Self::with_config(ids, SidebarConfig::default())
    }

    pub(crate) fn with_config(ids: &[i64], config: SidebarConfig) -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("runtime");
        let source = Arc::new(InMemorySource::with_guilds(snapshots(ids)));
        let ctrl = RecordingController::new();
        let view = GuildListView::new(
            source.clone(),
            Box::new(ctrl.clone()),
            runtime.handle().clone(),
            config,
        );

        Self {
            view,
            source,
            ctrl,
            _runtime: runtime,
        }
    }

    /// Same as [`Harness::new`] with every cached guild shown bare.
    pub(crate) fn listed(ids: &[i64]) -> Self {
        let mut harness = Self::new(ids);
        harness.view.set_guilds(&snapshots(ids));
        harness
    }

    pub(crate) fn layout(&self) -> Vec<Row> {
        layout(&self.view)
    }
}

pub(crate) fn snapshot(id: i64) -> GuildSnapshot {
    GuildSnapshot::new(GuildId(id), format!("guild {id}"))
}

pub(crate) fn snapshots(ids: &[i64]) -> Vec<GuildSnapshot> {
    ids.iter().map(|&id| snapshot(id)).collect()
}

pub(crate) fn folder(ids: &[i64]) -> FolderSnapshot {
    FolderSnapshot::new(ids.iter().copied().map(GuildId).collect())
}

pub(crate) fn layout(view: &GuildListView) -> Vec<Row> {
    view.children()
        .iter()
        .map(|child| match child {
            ViewChild::Guild(entry) => Row::Guild(entry.id().0),
            ViewChild::Folder(folder) => {
                Row::Folder(folder.guilds().iter().map(|g| g.id().0).collect())
            }
        })
        .collect()
}

/// Every guild currently flagged selected, wherever it sits.
pub(crate) fn selected_ids(view: &GuildListView) -> Vec<i64> {
    let mut selected = Vec::new();
    for child in view.children() {
        match child {
            ViewChild::Guild(entry) if entry.is_selected() => selected.push(entry.id().0),
            ViewChild::Guild(_) => {}
            ViewChild::Folder(folder) => selected.extend(
                folder
                    .guilds()
                    .iter()
                    .filter(|g| g.is_selected())
                    .map(|g| g.id().0),
            ),
        }
    }
    selected
}
