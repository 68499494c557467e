//! Gateway event intake.
//!
//! Events arrive on whatever thread the gateway delivers them on. While the
//! sidebar is visible a forwarder task moves them into the view's inbox,
//! tagged with the subscription epoch; the owner thread applies them when it
//! drains the inbox. Hiding the sidebar aborts the forwarder and bumps the
//! epoch, so anything still queued from the old subscription is dropped.
//! An event that does not fit in the inbox raises the view's dropped flag,
//! which the owner thread answers with a full rebuild.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::GatewayEvent;
use tokio::{
    runtime::Handle,
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::view::{GuildListView, ViewMessage};

#[derive(Debug, Default)]
pub(crate) struct EventAdapter {
    forwarder: Option<JoinHandle<()>>,
    epoch: u64,
}

impl EventAdapter {
    pub(crate) fn is_bound(&self) -> bool {
        self.forwarder.is_some()
    }

    pub(crate) fn accepts(&self, epoch: u64) -> bool {
        self.forwarder.is_some() && self.epoch == epoch
    }

    fn bind(
        &mut self,
        runtime: &Handle,
        events: broadcast::Receiver<GatewayEvent>,
        inbox: Sender<ViewMessage>,
        dropped: Arc<AtomicBool>,
    ) {
        if self.is_bound() {
            return;
        }
        self.epoch += 1;
        let epoch = self.epoch;
        self.forwarder = Some(runtime.spawn(forward(epoch, events, inbox, dropped)));
        debug!(epoch, "subscribed to gateway events");
    }

    /// Revokes the active subscription. Returns false when there was none.
    fn revoke(&mut self) -> bool {
        match self.forwarder.take() {
            Some(forwarder) => {
                forwarder.abort();
                debug!(epoch = self.epoch, "gateway subscription revoked");
                true
            }
            None => false,
        }
    }
}

impl Drop for EventAdapter {
    fn drop(&mut self) {
        self.revoke();
    }
}

async fn forward(
    epoch: u64,
    mut events: broadcast::Receiver<GatewayEvent>,
    inbox: Sender<ViewMessage>,
    dropped: Arc<AtomicBool>,
) {
    loop {
        let message = match events.recv().await {
            Ok(event) => ViewMessage::Gateway { epoch, event },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "sidebar lagged behind gateway events");
                ViewMessage::Resync { epoch }
            }
            Err(RecvError::Closed) => {
                debug!(epoch, "gateway event stream closed");
                return;
            }
        };

        match inbox.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(epoch, "sidebar inbox is full; guild list will be rebuilt");
                dropped.store(true, Ordering::Release);
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

impl GuildListView {
    /// Binds event intake to the sidebar's visibility. Becoming visible
    /// subscribes; becoming hidden revokes the subscription.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            if self.events.is_bound() {
                return;
            }
            let receiver = self.source().subscribe();
            let inbox = self.inbox();
            let dropped = self.dropped_flag();
            let runtime = self.runtime().clone();
            self.events.bind(&runtime, receiver, inbox, dropped);
        } else {
            self.events.revoke();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.events.is_bound()
    }

    /// Applies one gateway event to the list.
    pub fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready => {
                info!("session ready; rebuilding guild list");
                self.invalidate();
            }
            GatewayEvent::ReadStateUpdated { guild_id } => {
                self.invalidate_unread(guild_id);
            }
            GatewayEvent::GuildCreated { guild } => {
                if !self.update_guild(&guild) {
                    self.add_guild(&guild);
                }
            }
            GatewayEvent::GuildUpdated { guild_id } => {
                self.invalidate_guild(guild_id);
            }
            GatewayEvent::GuildDeleted {
                guild_id,
                unavailable,
            } => {
                if unavailable && self.set_unavailable(guild_id) {
                    self.controller_mut().close_guild(false);
                    return;
                }
                self.remove_guild(guild_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
