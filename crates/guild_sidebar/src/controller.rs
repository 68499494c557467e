//! Parent controller boundary: the window that actually shows a guild.

use std::sync::{Arc, Mutex, PoisonError};

use shared::domain::GuildId;
use tracing::error;

use crate::error::SidebarError;

pub trait Controller {
    /// Shows the given guild.
    fn open_guild(&mut self, guild_id: GuildId);

    /// Called when the shown guild is no longer available. When `permanent`
    /// is true the window must navigate away entirely, otherwise a loading
    /// placeholder is fine because the guild may come back.
    fn close_guild(&mut self, permanent: bool);

    /// Reports a non-fatal failure to the user.
    fn show_error(&mut self, err: &SidebarError) {
        error!("sidebar error: {err}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCall {
    Open(GuildId),
    Close { permanent: bool },
    Error(String),
}

/// Controller that only remembers what it was asked to do. Clones share the
/// same log, so a handle can be kept after the controller is boxed.
#[derive(Debug, Clone, Default)]
pub struct RecordingController {
    calls: Arc<Mutex<Vec<ControllerCall>>>,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ControllerCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_calls(&self) -> Vec<ControllerCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, call: ControllerCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Controller for RecordingController {
    fn open_guild(&mut self, guild_id: GuildId) {
        self.push(ControllerCall::Open(guild_id));
    }

    fn close_guild(&mut self, permanent: bool) {
        self.push(ControllerCall::Close { permanent });
    }

    fn show_error(&mut self, err: &SidebarError) {
        self.push(ControllerCall::Error(err.to_string()));
    }
}
