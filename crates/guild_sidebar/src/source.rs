//! Data the sidebar reads from the chat client: the ready payload, the guild
//! cache, read states, and the gateway event stream.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use shared::{
    domain::{GuildId, ReadIndicator},
    error::ApiException,
    protocol::{GatewayEvent, GuildSnapshot, ReadyState},
};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[async_trait]
pub trait GuildSource: Send + Sync {
    /// Settings from the last ready payload, if a session is established.
    fn ready(&self) -> Option<ReadyState>;

    /// Guild from the local cache. Never touches the network.
    fn cached_guild(&self, guild_id: GuildId) -> Option<GuildSnapshot>;

    fn read_state(&self, guild_id: GuildId) -> ReadIndicator;

    fn subscribe(&self) -> broadcast::Receiver<GatewayEvent>;

    /// Full guild list. May block on the network, so it is only ever awaited
    /// off the owner thread.
    async fn fetch_guilds(&self) -> Result<Vec<GuildSnapshot>, ApiException>;
}

#[derive(Default)]
struct MemoryState {
    ready: Option<ReadyState>,
    guilds: Vec<GuildSnapshot>,
    read_states: HashMap<GuildId, ReadIndicator>,
    fetch_failure: Option<ApiException>,
}

/// Source backed by process memory. Guilds are fetched in insertion order.
pub struct InMemorySource {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<GatewayEvent>,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
        }
    }

    pub fn with_guilds(guilds: Vec<GuildSnapshot>) -> Self {
        let source = Self::new();
        source.lock().guilds = guilds;
        source
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_ready(&self, ready: Option<ReadyState>) {
        self.lock().ready = ready;
    }

    /// Inserts or replaces a cached guild, keeping its fetch position.
    pub fn upsert_guild(&self, guild: GuildSnapshot) {
        let mut state = self.lock();
        match state
            .guilds
            .iter_mut()
            .find(|cached| cached.guild_id == guild.guild_id)
        {
            Some(cached) => *cached = guild,
            None => state.guilds.push(guild),
        }
    }

    pub fn remove_guild(&self, guild_id: GuildId) -> Option<GuildSnapshot> {
        let mut state = self.lock();
        let index = state.guilds.iter().position(|g| g.guild_id == guild_id)?;
        Some(state.guilds.remove(index))
    }

    pub fn set_read_state(&self, guild_id: GuildId, indicator: ReadIndicator) {
        self.lock().read_states.insert(guild_id, indicator);
    }

    /// Makes every following fetch fail with `err`, or succeed again on `None`.
    pub fn set_fetch_failure(&self, err: Option<ApiException>) {
        self.lock().fetch_failure = err;
    }

    /// Delivers an event to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: GatewayEvent) -> usize {
        match self.events.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("gateway event published with no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl GuildSource for InMemorySource {
    fn ready(&self) -> Option<ReadyState> {
        self.lock().ready.clone()
    }

    fn cached_guild(&self, guild_id: GuildId) -> Option<GuildSnapshot> {
        self.lock()
            .guilds
            .iter()
            .find(|g| g.guild_id == guild_id)
            .cloned()
    }

    fn read_state(&self, guild_id: GuildId) -> ReadIndicator {
        self.lock()
            .read_states
            .get(&guild_id)
            .copied()
            .unwrap_or_default()
    }

    fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    async fn fetch_guilds(&self) -> Result<Vec<GuildSnapshot>, ApiException> {
        let state = self.lock();
        if let Some(err) = &state.fetch_failure {
            return Err(err.clone());
        }
        Ok(state.guilds.clone())
    }
}
