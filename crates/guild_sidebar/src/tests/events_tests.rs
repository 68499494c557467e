use std::{
    thread,
    time::{Duration, Instant},
};

use super::*;

use shared::{
    domain::{GuildId, ReadIndicator},
    protocol::{GuildSnapshot, ReadyState},
};

use crate::{
    config::SidebarConfig,
    controller::ControllerCall,
    test_support::{folder, selected_ids, snapshot, Harness, Row, SETTLE},
    view::ViewState,
};

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + SETTLE;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn ready_event_rebuilds_from_folder_layout() {
    let mut h = Harness::listed(&[1, 2, 3]);
    h.source.set_ready(Some(ReadyState {
        folders: Some(vec![folder(&[3, 1]), folder(&[2])]),
        guild_positions: Vec::new(),
    }));

    h.view.handle_event(GatewayEvent::Ready);

    assert_eq!(h.layout(), vec![Row::Folder(vec![3, 1]), Row::Guild(2)]);
    assert_eq!(h.view.state(), ViewState::FolderStructured);
}

#[test]
fn ready_event_without_settings_fetches_flat_list() {
    let mut h = Harness::new(&[1, 2, 3]);

    h.view.handle_event(GatewayEvent::Ready);
    assert!(h.view.process_next(SETTLE));

    assert_eq!(
        h.layout(),
        vec![Row::Guild(1), Row::Guild(2), Row::Guild(3)]
    );
    assert!(selected_ids(&h.view).is_empty());
    assert!(h.ctrl.calls().is_empty());
}

#[test]
fn read_state_update_touches_only_that_guild() {
    let mut h = Harness::listed(&[1, 2]);
    h.source.set_read_state(GuildId(1), ReadIndicator::Mentioned(3));
    h.source.set_read_state(GuildId(2), ReadIndicator::Unread);

    h.view.handle_event(GatewayEvent::ReadStateUpdated {
        guild_id: GuildId(1),
    });

    assert_eq!(
        h.view.guild(GuildId(1)).map(|g| g.unread()),
        Some(ReadIndicator::Mentioned(3))
    );
    assert_eq!(
        h.view.guild(GuildId(2)).map(|g| g.unread()),
        Some(ReadIndicator::Read)
    );
}

#[test]
fn read_state_update_reaches_guilds_in_folders() {
    let mut h = Harness::new(&[1, 2]);
    h.view.set_folders(&[folder(&[1, 2])]);
    h.source.set_read_state(GuildId(2), ReadIndicator::Unread);

    h.view.handle_event(GatewayEvent::ReadStateUpdated {
        guild_id: GuildId(2),
    });

    assert_eq!(
        h.view.guild(GuildId(2)).map(|g| g.unread()),
        Some(ReadIndicator::Unread)
    );
}

#[test]
fn created_guild_is_prepended_or_updated() {
    let mut h = Harness::listed(&[1, 2]);

    h.view.handle_event(GatewayEvent::GuildCreated { guild: snapshot(3) });
    h.view.handle_event(GatewayEvent::GuildCreated {
        guild: GuildSnapshot::new(GuildId(1), "renamed"),
    });

    assert_eq!(
        h.layout(),
        vec![Row::Guild(3), Row::Guild(1), Row::Guild(2)]
    );
    assert_eq!(h.view.guild(GuildId(1)).map(|g| g.name()), Some("renamed"));
}

#[test]
fn created_guild_comes_back_from_unavailable() {
    let mut h = Harness::listed(&[1]);
    h.view.handle_event(GatewayEvent::GuildDeleted {
        guild_id: GuildId(1),
        unavailable: true,
    });
    assert!(h.view.guild(GuildId(1)).expect("listed").is_unavailable());

    h.view.handle_event(GatewayEvent::GuildCreated { guild: snapshot(1) });
    assert!(!h.view.guild(GuildId(1)).expect("listed").is_unavailable());
}

#[test]
fn updated_guild_reloads_from_cache() {
    let mut h = Harness::listed(&[1, 2]);
    h.source
        .upsert_guild(GuildSnapshot::new(GuildId(2), "new name"));
    h.source.remove_guild(GuildId(1));

    h.view.handle_event(GatewayEvent::GuildUpdated {
        guild_id: GuildId(2),
    });
    h.view.handle_event(GatewayEvent::GuildUpdated {
        guild_id: GuildId(1),
    });

    assert_eq!(h.view.guild(GuildId(2)).map(|g| g.name()), Some("new name"));
    assert!(h.view.guild(GuildId(1)).expect("listed").is_unavailable());
}

#[test]
fn unavailable_selected_guild_closes_temporarily_and_stays() {
    let mut h = Harness::listed(&[1, 2, 3]);
    h.view.select_guild(GuildId(2));
    h.ctrl.take_calls();

    h.view.handle_event(GatewayEvent::GuildDeleted {
        guild_id: GuildId(2),
        unavailable: true,
    });

    assert_eq!(h.ctrl.calls(), vec![ControllerCall::Close { permanent: false }]);
    let entry = h.view.guild(GuildId(2)).expect("still listed");
    assert!(entry.is_unavailable());
    assert_eq!(
        h.layout(),
        vec![Row::Guild(1), Row::Guild(2), Row::Guild(3)]
    );
}

#[test]
fn deleted_guild_is_removed() {
    let mut h = Harness::listed(&[1, 2]);
    h.view.select_guild(GuildId(1));
    h.ctrl.take_calls();

    h.view.handle_event(GatewayEvent::GuildDeleted {
        guild_id: GuildId(1),
        unavailable: false,
    });

    assert_eq!(h.ctrl.calls(), vec![ControllerCall::Close { permanent: true }]);
    assert_eq!(h.layout(), vec![Row::Guild(2)]);
}

#[test]
fn unavailable_unknown_guild_is_ignored() {
    let mut h = Harness::listed(&[1]);
    h.view.handle_event(GatewayEvent::GuildDeleted {
        guild_id: GuildId(5),
        unavailable: true,
    });
    assert!(h.ctrl.calls().is_empty());
    assert_eq!(h.layout(), vec![Row::Guild(1)]);
}

#[test]
fn visible_view_receives_published_events() {
    let mut h = Harness::listed(&[1]);
    h.view.set_visible(true);
    assert!(h.view.is_visible());
    assert_eq!(h.source.subscriber_count(), 1);

    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(2) });
    assert!(h.view.process_next(SETTLE));

    assert_eq!(h.layout(), vec![Row::Guild(2), Row::Guild(1)]);
}

#[test]
fn showing_twice_keeps_one_subscription() {
    let mut h = Harness::listed(&[1]);
    h.view.set_visible(true);
    h.view.set_visible(true);
    assert_eq!(h.source.subscriber_count(), 1);
}

#[test]
fn hidden_view_drops_queued_events_and_unsubscribes() {
    let mut h = Harness::listed(&[1]);
    h.view.set_visible(true);
    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(2) });
    assert!(wait_until(|| h.view.pending_messages() > 0));

    h.view.set_visible(false);
    assert!(!h.view.is_visible());
    assert_eq!(h.view.process_pending(), 1);
    assert_eq!(h.layout(), vec![Row::Guild(1)]);

    let source = h.source.clone();
    assert!(wait_until(|| source.subscriber_count() == 0));
    assert_eq!(h.source.publish(GatewayEvent::Ready), 0);
}

#[test]
fn resubscribing_ignores_events_from_the_old_subscription() {
    let mut h = Harness::listed(&[1]);
    h.view.set_visible(true);
    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(2) });
    assert!(wait_until(|| h.view.pending_messages() > 0));

    h.view.set_visible(false);
    h.view.set_visible(true);
    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(3) });
    assert!(wait_until(|| h.view.pending_messages() > 1));

    assert_eq!(h.view.process_pending(), 2);
    assert_eq!(h.layout(), vec![Row::Guild(3), Row::Guild(1)]);
}

#[test]
fn dropping_the_view_revokes_its_subscription() {
    let mut h = Harness::listed(&[1]);
    h.view.set_visible(true);
    assert_eq!(h.source.subscriber_count(), 1);

    drop(h.view);
    let source = h.source.clone();
    assert!(wait_until(|| source.subscriber_count() == 0));
}

#[test]
fn event_lost_to_a_full_inbox_triggers_rebuild() {
    let mut h = Harness::with_config(&[1], SidebarConfig::default().with_inbox_capacity(1));
    h.view.set_guilds(&[snapshot(1)]);
    h.source.upsert_guild(snapshot(2));
    h.source.upsert_guild(snapshot(3));
    h.view.set_visible(true);

    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(2) });
    h.source.publish(GatewayEvent::GuildCreated { guild: snapshot(3) });
    assert!(wait_until(|| h.view.has_dropped_messages()));

    assert_eq!(h.view.process_pending(), 2);
    assert!(h.view.is_fetching());
    assert!(h.view.process_next(SETTLE));

    assert!(!h.view.is_fetching());
    assert_eq!(
        h.layout(),
        vec![Row::Guild(1), Row::Guild(2), Row::Guild(3)]
    );
}
