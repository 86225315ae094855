//! Synchronous publish/subscribe bus.
//!
//! Delivery is in registration order to the listeners subscribed when a
//! message's dispatch starts. Messages published from inside a handler are
//! queued and delivered, FIFO, once the current dispatch finishes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::calendar::CalendarTime;
use crate::catalog::{CreatureTemplateId, ObjectId};
use crate::entity::{EntityId, NeedKind};
use crate::geometry::Point;

/// Channel a message is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Commands from the input layer.
    Control,
    /// One simulated second elapsed.
    TimeSecondPassed,
    /// The clock was paused or resumed.
    TimeStatusChanged,
    /// A tile's occupying object changed.
    TileObjectReplace,
    /// Result of a creature's resource search.
    SpatialQueryResponse,
    /// An entity was spawned at runtime.
    EntitySpawned,
    /// A snapshot replaced the world.
    WorldLoaded,
}

/// Whether the clock is now paused or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStatus {
    /// Clock stopped.
    Paused,
    /// Clock running again.
    Resumed,
}

/// Commands the input layer can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    /// Reload from a save file, or regenerate when `path` is `None`.
    ReloadWorld {
        /// Save file to load.
        path: Option<PathBuf>,
    },
    /// Spawn a creature from a catalog template.
    AddCreature {
        /// Creature template id.
        creature_id: CreatureTemplateId,
        /// Where to place it.
        position: Point,
    },
    /// Place an object on a new tile.
    AddObject {
        /// Object id.
        object_id: ObjectId,
        /// Where to place it.
        position: Point,
    },
    /// Flip the clock between paused and running.
    TogglePause,
    /// Write a snapshot.
    SaveWorld {
        /// Destination file.
        path: PathBuf,
    },
}

/// Everything that travels over the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`ControlAction`].
    Control(ControlAction),
    /// One simulated second elapsed.
    TimeSecondPassed {
        /// Calendar time after the second.
        calendar_time: CalendarTime,
        /// Scaled frame delta that produced the second.
        dt: f32,
    },
    /// The clock was paused or resumed.
    TimeStatusChanged(TimeStatus),
    /// A tile now shows a different object.
    TileObjectReplace {
        /// Tile that changed.
        tile_id: EntityId,
        /// Object now occupying it.
        new_object_id: ObjectId,
    },
    /// Tiles that can satisfy a creature's need, nearest first.
    SpatialQueryResponse {
        /// Creature that searched.
        entity_id: EntityId,
        /// Need being resolved.
        need: NeedKind,
        /// Matching tiles.
        tiles: Vec<EntityId>,
    },
    /// An entity was added at runtime.
    EntitySpawned {
        /// The new entity.
        entity_id: EntityId,
        /// Tile the entity sits on (the entity itself for tiles).
        tile_id: EntityId,
    },
    /// The world was replaced wholesale.
    WorldLoaded {
        /// Save file that was loaded, `None` after regeneration.
        path: Option<PathBuf>,
    },
}

impl Message {
    /// Topic the message is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::Control(_) => Topic::Control,
            Self::TimeSecondPassed { .. } => Topic::TimeSecondPassed,
            Self::TimeStatusChanged(_) => Topic::TimeStatusChanged,
            Self::TileObjectReplace { .. } => Topic::TileObjectReplace,
            Self::SpatialQueryResponse { .. } => Topic::SpatialQueryResponse,
            Self::EntitySpawned { .. } => Topic::EntitySpawned,
            Self::WorldLoaded { .. } => Topic::WorldLoaded,
        }
    }
}

/// Returned by [`MessageBus::subscribe`]; pass to
/// [`MessageBus::unsubscribe`] to stop delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

type Handler = Rc<RefCell<dyn FnMut(&Message)>>;

struct Listener {
    handle: SubscriptionHandle,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    listeners: Vec<Listener>,
    queue: VecDeque<Message>,
    dispatching: bool,
    next_handle: u64,
}

/// Cheap, clonable handle to a shared single-threaded bus.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MessageBus")
            .field("listeners", &inner.listeners.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl MessageBus {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionHandle
    where
        F: FnMut(&Message) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        let handle = SubscriptionHandle(inner.next_handle);
        let handler: Handler = Rc::new(RefCell::new(handler));
        inner.listeners.push(Listener {
            handle,
            topic,
            handler,
        });
        handle
    }

    /// Remove a listener. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|l| l.handle != handle);
        inner.listeners.len() != before
    }

    /// Listeners currently subscribed to `topic`.
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.topic == topic)
            .count()
    }

    /// Subscribe a [`Mailbox`] that collects every message on `topic`.
    pub fn mailbox(&self, topic: Topic) -> (SubscriptionHandle, Mailbox) {
        let mailbox = Mailbox::default();
        let sink = mailbox.clone();
        let handle = self.subscribe(topic, move |msg| sink.push(msg.clone()));
        (handle, mailbox)
    }

    /// Deliver a message to every listener of its topic.
    ///
    /// Called from inside a handler, the message is queued behind the one
    /// being dispatched.
    pub fn publish(&self, message: Message) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(message);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop_front() {
                    Some(message) => {
                        let topic = message.topic();
                        let targets: Vec<Handler> = inner
                            .listeners
                            .iter()
                            .filter(|l| l.topic == topic)
                            .map(|l| Rc::clone(&l.handler))
                            .collect();
                        Some((message, targets))
                    }
                    None => {
                        inner.dispatching = false;
                        None
                    }
                }
            };

            let Some((message, targets)) = next else {
                break;
            };
            for handler in targets {
                let mut handler = handler.borrow_mut();
                (*handler)(&message);
            }
        }
    }
}

/// Shared queue filled by a bus subscription and drained by its owner.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    messages: Rc<RefCell<Vec<Message>>>,
}

impl Mailbox {
    fn push(&self, message: Message) {
        self.messages.borrow_mut().push(message);
    }

    /// Take every collected message, oldest first.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }

    /// Number of collected messages.
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Drop every collected message.
    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}
