use core::fmt;

use log::debug;
use ordermap::OrderMap;

use crate::animation::SceneId;
use crate::geometry::Coord;
use crate::motion::PathId;

/// Transitions raised by a character's motion and animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    PathActivated,
    PathComplete,
    /// The path reached its final waypoint and started its hold time.
    PathHolding,
    SceneActivated,
    SceneComplete,
}

impl Event {
    /// Whether this kind of event is raised by paths (as opposed to scenes).
    pub fn is_path_event(self) -> bool {
        matches!(
            self,
            Event::PathActivated | Event::PathComplete | Event::PathHolding
        )
    }
}

/// The path or scene an event originates from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSource {
    Path(PathId),
    Scene(SceneId),
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventSource::Path(id) => write!(f, "path '{}'", id),
            EventSource::Scene(id) => write!(f, "scene '{}'", id),
        }
    }
}

impl From<PathId> for EventSource {
    fn from(id: PathId) -> Self {
        EventSource::Path(id)
    }
}

impl From<SceneId> for EventSource {
    fn from(id: SceneId) -> Self {
        EventSource::Scene(id)
    }
}

/// Reaction applied to the owning character when a bound event fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    ActivatePath(PathId),
    DeactivatePath(PathId),
    ActivateScene(SceneId),
    DeactivateScene(SceneId),
    /// Show the input symbol with the default color.
    ResetAppearance,
    SetLayer(i32),
    SetCoordinate(Coord),
}

/// Declarative table of `(event, source) -> actions` bindings.
///
/// Actions bound to the same key keep their registration order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EventHandler {
    bindings: OrderMap<(Event, EventSource), Vec<Action>>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding. Ids are not checked here, see
    /// [`EffectCharacter::register_event`](crate::EffectCharacter::register_event).
    pub fn register_event(&mut self, event: Event, source: EventSource, action: Action) {
        debug!("binding {:?} of {} -> {:?}", event, source, action);
        self.bindings
            .entry((event, source))
            .or_insert_with(Vec::new)
            .push(action);
    }

    /// Actions bound to `(event, source)` in registration order.
    pub fn actions(&self, event: Event, source: &EventSource) -> &[Action] {
        // OrderMap lookups need an owned key for tuple keys.
        self.bindings
            .get(&(event, source.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Snapshot of the actions to run for an occurrence of `(event, source)`.
    ///
    /// The returned list is detached from the table, so reactions may
    /// register further bindings without disturbing the current firing.
    pub fn fire(&self, event: Event, source: &EventSource) -> Vec<Action> {
        self.actions(event, source).to_vec()
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
