// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! Server events, delivered either by polling or through callbacks.
//!
//! Capturing an event type starts with the first poll or callback registration for it and
//! continues until [EventHandler::stop_polling_and_clear_callbacks]. Each captured type gets
//! its own stream and tokio task. Without callbacks, events are queued up to
//! `max_queue_size`; anything beyond that is dropped. With callbacks, events go straight to
//! the callbacks and polling that type is an error.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use mcpb_core::{
    protocol::{self, event, projectile_hit_event, EventStreamRequest, EventType},
    Direction, Vec3,
};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::{Code, Streaming};

use crate::{
    connection::Connection,
    entity::Entity,
    error::{Error, Result},
    player::Player,
    settings::EventSettings,
};

#[derive(Clone, Debug)]
pub struct PlayerJoinEvent {
    pub timestamp: Instant,
    pub player: Player,
}

#[derive(Clone, Debug)]
pub struct PlayerLeaveEvent {
    pub timestamp: Instant,
    pub player: Player,
}

#[derive(Clone, Debug)]
pub struct PlayerDeathEvent {
    pub timestamp: Instant,
    pub player: Player,
    pub death_message: String,
}

/// A chat message typed by a player. Commands and server messages don't count.
#[derive(Clone, Debug)]
pub struct ChatEvent {
    pub timestamp: Instant,
    pub player: Player,
    pub message: String,
}

/// A player clicked a block within reach, whether or not it had any effect in game.
#[derive(Clone, Debug)]
pub struct BlockHitEvent {
    pub timestamp: Instant,
    pub player: Player,
    pub right_hand: bool,
    pub held_item: String,
    pub pos: Vec3,
    pub face: Direction,
}

#[derive(Clone, Debug)]
pub enum ProjectileTarget {
    Player(Player),
    Entity(Entity),
    /// Block type.
    Block(String),
}

/// A projectile shot by a player hit something.
#[derive(Clone, Debug)]
pub struct ProjectileHitEvent {
    pub timestamp: Instant,
    /// The shooter.
    pub player: Player,
    pub target: ProjectileTarget,
    pub projectile_type: String,
    /// Block position for blocks, otherwise where the projectile hit.
    pub pos: Vec3,
    /// Only set when a block was hit.
    pub face: Option<Direction>,
}

impl ProjectileHitEvent {
    pub fn target_player(&self) -> Option<&Player> {
        match &self.target {
            ProjectileTarget::Player(player) => Some(player),
            _ => None,
        }
    }

    /// The target if it is an entity other than a player.
    pub fn target_entity(&self) -> Option<&Entity> {
        match &self.target {
            ProjectileTarget::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn target_block(&self) -> Option<&str> {
        match &self.target {
            ProjectileTarget::Block(block) => Some(block),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    PlayerJoin(PlayerJoinEvent),
    PlayerLeave(PlayerLeaveEvent),
    PlayerDeath(PlayerDeathEvent),
    Chat(ChatEvent),
    BlockHit(BlockHitEvent),
    ProjectileHit(ProjectileHitEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::PlayerJoin(_) => EventType::EventPlayerJoin,
            Event::PlayerLeave(_) => EventType::EventPlayerLeave,
            Event::PlayerDeath(_) => EventType::EventPlayerDeath,
            Event::Chat(_) => EventType::EventChatMessage,
            Event::BlockHit(_) => EventType::EventBlockHit,
            Event::ProjectileHit(_) => EventType::EventProjectileHit,
        }
    }

    pub fn timestamp(&self) -> Instant {
        match self {
            Event::PlayerJoin(e) => e.timestamp,
            Event::PlayerLeave(e) => e.timestamp,
            Event::PlayerDeath(e) => e.timestamp,
            Event::Chat(e) => e.timestamp,
            Event::BlockHit(e) => e.timestamp,
            Event::ProjectileHit(e) => e.timestamp,
        }
    }

    pub(crate) fn from_proto(conn: &Connection, raw: protocol::Event) -> Result<Event> {
        let timestamp = Instant::now();
        let event_type = EventType::try_from(raw.r#type)
            .map_err(|_| Error::Protocol(format!("unknown event type {}", raw.r#type)))?;
        let event = match (event_type, raw.data) {
            (EventType::EventPlayerJoin, Some(event::Data::PlayerMsg(msg))) => {
                Event::PlayerJoin(PlayerJoinEvent {
                    timestamp,
                    player: trigger(conn, msg.trigger.as_ref())?,
                })
            }
            (EventType::EventPlayerLeave, Some(event::Data::PlayerMsg(msg))) => {
                Event::PlayerLeave(PlayerLeaveEvent {
                    timestamp,
                    player: trigger(conn, msg.trigger.as_ref())?,
                })
            }
            (EventType::EventPlayerDeath, Some(event::Data::PlayerMsg(msg))) => {
                Event::PlayerDeath(PlayerDeathEvent {
                    timestamp,
                    player: trigger(conn, msg.trigger.as_ref())?,
                    death_message: msg.message,
                })
            }
            (EventType::EventChatMessage, Some(event::Data::PlayerMsg(msg))) => {
                Event::Chat(ChatEvent {
                    timestamp,
                    player: trigger(conn, msg.trigger.as_ref())?,
                    message: msg.message,
                })
            }
            (EventType::EventBlockHit, Some(event::Data::BlockHit(hit))) => {
                Event::BlockHit(BlockHitEvent {
                    timestamp,
                    player: trigger(conn, hit.trigger.as_ref())?,
                    right_hand: hit.right_hand,
                    held_item: hit.item_type,
                    pos: hit.pos.map(Vec3::from).unwrap_or_default(),
                    face: parse_face(&hit.face)?,
                })
            }
            (EventType::EventProjectileHit, Some(event::Data::ProjectileHit(hit))) => {
                let target = match hit.target {
                    Some(projectile_hit_event::Target::Player(player)) => {
                        ProjectileTarget::Player(conn.player(&player.name))
                    }
                    Some(projectile_hit_event::Target::Entity(raw_entity)) => {
                        let entity = conn.entity(&raw_entity.id);
                        entity.set_type(&raw_entity.r#type);
                        ProjectileTarget::Entity(entity)
                    }
                    Some(projectile_hit_event::Target::Block(block)) => {
                        ProjectileTarget::Block(block)
                    }
                    None => {
                        return Err(Error::Protocol(
                            "projectile hit without a target".to_string(),
                        ))
                    }
                };
                let face = if hit.face.is_empty() {
                    None
                } else {
                    Some(parse_face(&hit.face)?)
                };
                Event::ProjectileHit(ProjectileHitEvent {
                    timestamp,
                    player: trigger(conn, hit.trigger.as_ref())?,
                    target,
                    projectile_type: hit.projectile,
                    pos: hit.pos.map(Vec3::from).unwrap_or_default(),
                    face,
                })
            }
            (event_type, data) => {
                return Err(Error::Protocol(format!(
                    "{:?} event with unexpected payload {:?}",
                    event_type, data
                )))
            }
        };
        Ok(event)
    }
}

fn trigger(conn: &Connection, player: Option<&protocol::Player>) -> Result<Player> {
    player
        .map(|p| conn.player(&p.name))
        .ok_or_else(|| Error::Protocol("event without a triggering player".to_string()))
}

fn parse_face(face: &str) -> Result<Direction> {
    face.parse()
        .map_err(|_| Error::Protocol(format!("unknown block face {:?}", face)))
}

/// Links an event struct to its [EventType].
pub trait EventKind: Sized + Send + 'static {
    const TYPE: EventType;
    fn from_event(event: Event) -> Option<Self>;
}

macro_rules! event_kind {
    ($ty:ident, $variant:ident, $event_type:ident) => {
        impl EventKind for $ty {
            const TYPE: EventType = EventType::$event_type;
            fn from_event(event: Event) -> Option<Self> {
                match event {
                    Event::$variant(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}

event_kind!(PlayerJoinEvent, PlayerJoin, EventPlayerJoin);
event_kind!(PlayerLeaveEvent, PlayerLeave, EventPlayerLeave);
event_kind!(PlayerDeathEvent, PlayerDeath, EventPlayerDeath);
event_kind!(ChatEvent, Chat, EventChatMessage);
event_kind!(BlockHitEvent, BlockHit, EventBlockHit);
event_kind!(ProjectileHitEvent, ProjectileHit, EventProjectileHit);

type Callback = Arc<dyn Fn(Event) + Send + Sync>;

struct EventPoller {
    event_type: EventType,
    queue: Mutex<VecDeque<Event>>,
    callbacks: Mutex<Vec<Callback>>,
    max_queue_size: usize,
    warn_dropped_interval: Duration,
    last_drop_warning: Mutex<Option<Instant>>,
    dropped: AtomicUsize,
    drop_warnings: AtomicUsize,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventPoller {
    async fn run(self: Arc<Self>, conn: Connection, mut stream: Streaming<protocol::Event>) {
        log::debug!("Started polling {:?}", self.event_type);
        while !self.cancel.is_cancelled() {
            tokio::select! {
                message = stream.message() => {
                    match message {
                        Ok(Some(raw)) => match Event::from_proto(&conn, raw) {
                            Ok(event) if event.event_type() == self.event_type => self.dispatch(event),
                            Ok(event) => log::warn!(
                                "Got a {:?} event on the {:?} stream",
                                event.event_type(),
                                self.event_type
                            ),
                            Err(e) => log::warn!("Failed to parse {:?} event: {:?}", self.event_type, e),
                        },
                        Ok(None) => {
                            log::info!("Plugin closed the {:?} stream", self.event_type);
                            break;
                        }
                        Err(status) if status.code() == Code::Cancelled => {
                            log::debug!("{:?} stream was cancelled", self.event_type);
                            break;
                        }
                        Err(status) => {
                            log::error!("{:?} stream failed: {:?}", self.event_type, status);
                            break;
                        }
                    }
                },
                _ = self.cancel.cancelled() => {
                    log::debug!("Stopped polling {:?}", self.event_type);
                }
            }
        }
    }

    fn dispatch(&self, event: Event) {
        let callbacks = self.callbacks.lock().clone();
        if !callbacks.is_empty() {
            for callback in callbacks {
                callback(event.clone());
            }
            return;
        }
        let mut queue = self.queue.lock();
        if queue.len() < self.max_queue_size {
            queue.push_back(event);
            return;
        }
        drop(queue);
        self.dropped.fetch_add(1, Ordering::Relaxed);
        let mut last_warning = self.last_drop_warning.lock();
        if last_warning.map_or(true, |t| t.elapsed() >= self.warn_dropped_interval) {
            log::warn!(
                "Dropping {:?} events, {} are queued already. Poll more often or raise max_queue_size",
                self.event_type,
                self.max_queue_size
            );
            *last_warning = Some(Instant::now());
            self.drop_warnings.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub struct EventHandler {
    conn: Connection,
    settings: EventSettings,
    pollers: RwLock<HashMap<EventType, Arc<EventPoller>>>,
    cancel: CancellationToken,
}

impl EventHandler {
    pub(crate) fn new(conn: Connection) -> Self {
        let settings = conn.settings().events.clone();
        Self {
            conn,
            settings,
            pollers: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn poll_default(&self) -> Option<usize> {
        self.settings.poll_default
    }

    async fn poller(&self, event_type: EventType) -> Result<Arc<EventPoller>> {
        let existing = self.pollers.read().get(&event_type).cloned();
        if let Some(poller) = existing {
            return Ok(poller);
        }
        let stream = self
            .conn
            .client()
            .get_event_stream(EventStreamRequest {
                event_type: event_type as i32,
            })
            .await?
            .into_inner();

        let mut pollers = self.pollers.write();
        if let Some(poller) = pollers.get(&event_type) {
            // Lost the race, our stream is dropped and thereby cancelled.
            return Ok(poller.clone());
        }
        let poller = Arc::new(EventPoller {
            event_type,
            queue: Mutex::new(VecDeque::new()),
            callbacks: Mutex::new(Vec::new()),
            max_queue_size: self.settings.max_queue_size,
            warn_dropped_interval: self.settings.warn_dropped_interval,
            last_drop_warning: Mutex::new(None),
            dropped: AtomicUsize::new(0),
            drop_warnings: AtomicUsize::new(0),
            cancel: self.cancel.child_token(),
            task: Mutex::new(None),
        });
        let task = tokio::spawn(poller.clone().run(self.conn.clone(), stream));
        *poller.task.lock() = Some(task);
        pollers.insert(event_type, poller.clone());
        Ok(poller)
    }

    /// Takes up to `maximum` queued events of type `E` (all of them for `None`), oldest first.
    pub async fn poll<E: EventKind>(&self, maximum: Option<usize>) -> Result<Vec<E>> {
        let poller = self.poller(E::TYPE).await?;
        if !poller.callbacks.lock().is_empty() {
            return Err(Error::EventCallbackRegistered(E::TYPE));
        }
        let mut queue = poller.queue.lock();
        let count = maximum.unwrap_or(usize::MAX).min(queue.len());
        let events = queue.drain(..count).filter_map(E::from_event).collect();
        Ok(events)
    }

    /// Calls `callback` for every future event of type `E`, after the ones registered before
    /// it. Callbacks run on the polling task and should hand longer work off to their own task.
    pub async fn register_callback<E: EventKind>(
        &self,
        callback: impl Fn(E) + Send + Sync + 'static,
    ) -> Result<()> {
        let poller = self.poller(E::TYPE).await?;
        poller.callbacks.lock().push(Arc::new(move |event| {
            if let Some(event) = E::from_event(event) {
                callback(event)
            }
        }));
        Ok(())
    }

    /// Stops all streams and forgets queued events and callbacks. Polling or registering
    /// afterwards starts capturing anew.
    pub async fn stop_polling_and_clear_callbacks(&self) {
        let pollers: Vec<_> = self.pollers.write().drain().map(|(_, p)| p).collect();
        for poller in &pollers {
            poller.cancel.cancel();
        }
        for poller in pollers {
            let task = poller.task.lock().take();
            if let Some(task) = task {
                if let Err(e) = task.await {
                    log::warn!("{:?} poller failed: {:?}", poller.event_type, e);
                }
            }
        }
        log::debug!("Stopped all event polling");
    }

    /// Event types currently captured.
    pub fn active(&self) -> Vec<EventType> {
        let mut types: Vec<_> = self.pollers.read().keys().copied().collect();
        types.sort();
        types
    }

    #[cfg(test)]
    pub(crate) fn queue_stats(&self, event_type: EventType) -> Option<(usize, usize)> {
        self.pollers.read().get(&event_type).map(|p| {
            (
                p.queue.lock().len(),
                p.dropped.load(Ordering::Relaxed),
            )
        })
    }

    #[cfg(test)]
    pub(crate) fn drop_warnings(&self, event_type: EventType) -> Option<usize> {
        self.pollers
            .read()
            .get(&event_type)
            .map(|p| p.drop_warnings.load(Ordering::Relaxed))
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
