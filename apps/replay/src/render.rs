//! Plain-text rendering of the sidebar for terminal output.

use std::fmt::Write as _;

use guild_sidebar::{ControllerCall, GuildEntry, GuildListView, ViewChild};
use shared::domain::ReadIndicator;

pub fn render_sidebar(view: &GuildListView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "sidebar ({:?})", view.state());

    if view.children().is_empty() {
        out.push_str("  (no guilds)\n");
    }

    for child in view.children() {
        match child {
            ViewChild::Guild(entry) => render_entry(&mut out, entry, 1),
            ViewChild::Folder(folder) => {
                let marker = if folder.is_selected() { '*' } else { '+' };
                let name = folder.name().unwrap_or("folder");
                let _ = writeln!(
                    out,
                    "  {marker} [{name} {}]{}",
                    folder.index(),
                    unread_suffix(folder.unread())
                );
                for entry in folder.guilds() {
                    render_entry(&mut out, entry, 2);
                }
            }
        }
    }
    out
}

fn render_entry(out: &mut String, entry: &GuildEntry, depth: usize) {
    let marker = if entry.is_selected() { '*' } else { '-' };
    let indent = "  ".repeat(depth);
    let unavailable = if entry.is_unavailable() {
        " (unavailable)"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "{indent}{marker} {} <{}>{}{unavailable}",
        entry.name(),
        entry.id(),
        unread_suffix(entry.unread())
    );
}

fn unread_suffix(unread: ReadIndicator) -> String {
    match unread {
        ReadIndicator::Read => String::new(),
        ReadIndicator::Unread => " •".to_string(),
        ReadIndicator::Mentioned(count) => format!(" @{count}"),
    }
}

pub fn describe_call(call: &ControllerCall) -> String {
    match call {
        ControllerCall::Open(guild_id) => format!("open guild {guild_id}"),
        ControllerCall::Close { permanent: true } => "close guild (leave)".to_string(),
        ControllerCall::Close { permanent: false } => "close guild (loading)".to_string(),
        ControllerCall::Error(message) => format!("error: {message}"),
    }
}
