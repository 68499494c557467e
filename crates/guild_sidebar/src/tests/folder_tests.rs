use super::*;

use shared::protocol::GuildSnapshot;

use crate::source::InMemorySource;

fn source_with(ids: &[i64]) -> InMemorySource {
    InMemorySource::with_guilds(
        ids.iter()
            .map(|&id| GuildSnapshot::new(GuildId(id), format!("guild {id}")))
            .collect(),
    )
}

fn snapshot(ids: &[i64]) -> FolderSnapshot {
    FolderSnapshot {
        folder_id: Some(FolderId(77)),
        name: Some("friends".to_string()),
        color: Some(0x00ff00),
        guild_ids: ids.iter().copied().map(GuildId).collect(),
    }
}

fn child_ids(folder: &Folder) -> Vec<i64> {
    folder.guilds().iter().map(|g| g.id().0).collect()
}

#[test]
fn set_keeps_snapshot_order_and_display_fields() {
    let source = source_with(&[1, 2, 3]);
    let mut folder = Folder::new(FolderIndex(4));
    folder.set(&snapshot(&[3, 1, 2]), &source);

    assert_eq!(child_ids(&folder), vec![3, 1, 2]);
    assert_eq!(folder.name(), Some("friends"));
    assert_eq!(folder.color(), Some(0x00ff00));
    assert_eq!(folder.folder_id(), Some(FolderId(77)));
    assert!(folder
        .guilds()
        .iter()
        .all(|g| g.parent_folder() == Some(FolderIndex(4))));
    assert_eq!(folder.guilds()[0].name(), "guild 3");
}

#[test]
fn set_replaces_previous_children_and_skips_duplicates() {
    let source = source_with(&[1, 2, 3]);
    let mut folder = Folder::new(FolderIndex(0));
    folder.set(&snapshot(&[1, 2]), &source);
    folder.set(&snapshot(&[3, 2, 3]), &source);

    assert_eq!(child_ids(&folder), vec![3, 2]);
}

#[test]
fn uncached_children_are_unavailable() {
    let source = source_with(&[1]);
    let mut folder = Folder::new(FolderIndex(0));
    folder.set(&snapshot(&[1, 5]), &source);

    assert!(!folder.guilds()[0].is_unavailable());
    assert!(folder.guilds()[1].is_unavailable());
}

#[test]
fn remove_detaches_child_and_clears_selection() {
    let source = source_with(&[1, 2, 3]);
    let mut folder = Folder::new(FolderIndex(0));
    folder.set(&snapshot(&[1, 2, 3]), &source);
    assert!(folder.select(GuildId(2)));
    assert!(folder.is_selected());

    let removed = folder.remove(GuildId(2)).expect("removed");
    assert_eq!(removed.parent_folder(), None);
    assert!(!folder.is_selected());
    assert_eq!(child_ids(&folder), vec![1, 3]);
    assert!(folder.remove(GuildId(2)).is_none());
}

#[test]
fn unselect_propagates_to_children() {
    let source = source_with(&[1, 2]);
    let mut folder = Folder::new(FolderIndex(0));
    folder.set(&snapshot(&[1, 2]), &source);
    folder.select(GuildId(1));

    folder.unselect();
    assert!(!folder.is_selected());
    assert!(folder.guilds().iter().all(|g| !g.is_selected()));
}

#[test]
fn unread_aggregates_children() {
    let source = source_with(&[1, 2, 3]);
    source.set_read_state(GuildId(1), ReadIndicator::Mentioned(2));
    source.set_read_state(GuildId(2), ReadIndicator::Unread);
    source.set_read_state(GuildId(3), ReadIndicator::Mentioned(1));

    let mut folder = Folder::new(FolderIndex(0));
    folder.set(&snapshot(&[1, 2, 3]), &source);
    assert_eq!(folder.unread(), ReadIndicator::Mentioned(3));

    folder.remove(GuildId(1));
    folder.remove(GuildId(3));
    assert_eq!(folder.unread(), ReadIndicator::Unread);
}
