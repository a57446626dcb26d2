use std::collections::VecDeque;

use log::{debug, error, warn};

use crate::animation::{Animation, CharacterVisual};
use crate::error::{Error, Result};
use crate::events::{Action, Event, EventHandler, EventSource};
use crate::geometry::Coord;
use crate::motion::{Motion, PathId};

/// Upper bound on events resolved in one go. Bindings that re-trigger each
/// other forever are cut off here.
pub const MAX_CASCADE_EVENTS: usize = 4096;

/// Index of a character inside its [`Terminal`](crate::Terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(pub usize);

/// One animated glyph: identity, placement, motion, animation and the
/// bindings that choreograph them.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectCharacter {
    id: CharacterId,
    input_symbol: char,
    input_coord: Coord,
    pub(crate) is_visible: bool,
    /// Z-order; higher layers are drawn over lower ones.
    pub layer: i32,
    pub motion: Motion,
    pub animation: Animation,
    event_handler: EventHandler,
    pub(crate) activation_stamp: u64,
    activated: bool,
}

impl EffectCharacter {
    pub fn new(id: CharacterId, symbol: char, coord: Coord) -> Self {
        Self {
            id,
            input_symbol: symbol,
            input_coord: coord,
            is_visible: false,
            layer: 0,
            motion: Motion::new(coord),
            animation: Animation::new(symbol),
            event_handler: EventHandler::new(),
            activation_stamp: 0,
            activated: false,
        }
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn input_symbol(&self) -> char {
        self.input_symbol
    }

    pub fn input_coord(&self) -> Coord {
        self.input_coord
    }

    pub fn current_coord(&self) -> Coord {
        self.motion.current_coord()
    }

    pub fn visual(&self) -> CharacterVisual {
        self.animation.current_visual()
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// True while a path or a scene still has something to advance.
    pub fn is_active(&self) -> bool {
        self.motion.is_moving() || self.animation.is_animating()
    }

    pub fn event_handler(&self) -> &EventHandler {
        &self.event_handler
    }

    /// Binds `action` to `event` raised by `source`.
    ///
    /// Every id involved must already be registered on this character and
    /// the event kind must match the source kind. Paths and scenes the
    /// action activates must already have waypoints or frames.
    pub fn register_event(
        &mut self,
        event: Event,
        source: impl Into<EventSource>,
        action: Action,
    ) -> Result<()> {
        let source = source.into();
        match &source {
            EventSource::Path(id) => {
                self.motion.query_path(id)?;
            }
            EventSource::Scene(id) => {
                self.animation.query_scene(id)?;
            }
        }
        if event.is_path_event() != matches!(source, EventSource::Path(_)) {
            return Err(Error::MismatchedEventSource(event, source));
        }
        match &action {
            Action::ActivatePath(id) => {
                if self.motion.query_path(id)?.waypoints().is_empty() {
                    return Err(Error::EmptyPath(id.to_string()));
                }
            }
            Action::ActivateScene(id) => {
                if self.animation.query_scene(id)?.frames().is_empty() {
                    return Err(Error::EmptyScene(id.to_string()));
                }
            }
            Action::DeactivatePath(id) => {
                self.motion.query_path(id)?;
            }
            Action::DeactivateScene(id) => {
                self.animation.query_scene(id)?;
            }
            Action::ResetAppearance | Action::SetLayer(_) | Action::SetCoordinate(_) => {}
        }
        self.event_handler.register_event(event, source, action);
        Ok(())
    }

    /// Wires each path's completion to the activation of the next one; with
    /// `looping` the last path leads back to the first.
    pub fn chain_paths(&mut self, ids: &[PathId], looping: bool) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::EmptyChain);
        }
        for id in ids {
            self.motion.query_path(id)?;
        }
        for pair in ids.windows(2) {
            self.register_event(
                Event::PathComplete,
                pair[0].clone(),
                Action::ActivatePath(pair[1].clone()),
            )?;
        }
        if looping {
            self.register_event(
                Event::PathComplete,
                ids[ids.len() - 1].clone(),
                Action::ActivatePath(ids[0].clone()),
            )?;
        }
        Ok(())
    }

    /// Activates a path and resolves the reactions it triggers.
    pub fn activate_path(&mut self, id: &str) -> Result<()> {
        self.motion.activate_path(id)?;
        self.activated = true;
        self.resolve_events();
        Ok(())
    }

    /// Activates a scene and resolves the reactions it triggers.
    pub fn activate_scene(&mut self, id: &str) -> Result<()> {
        self.animation.activate_scene(id)?;
        self.activated = true;
        self.resolve_events();
        Ok(())
    }

    pub fn deactivate_path(&mut self, id: &str) -> Result<()> {
        self.motion.deactivate_path(id)
    }

    pub fn deactivate_scene(&mut self, id: &str) -> Result<()> {
        self.animation.deactivate_scene(id)
    }

    /// Advances motion then animation by one tick, then resolves the events
    /// they raised.
    pub fn tick(&mut self) {
        self.advance();
        self.resolve_events();
    }

    /// Moves and animates without reacting to the resulting events.
    pub(crate) fn advance(&mut self) {
        let progress = self.motion.advance();
        self.animation.advance(progress);
    }

    /// Runs the bindings of every pending event, breadth first.
    ///
    /// Events raised by a reaction queue behind those already pending, so a
    /// cascade resolves in the order its events occurred.
    pub(crate) fn resolve_events(&mut self) {
        let mut queue = VecDeque::new();
        self.collect_emitted(&mut queue);
        let mut resolved = 0;
        while let Some((event, source)) = queue.pop_front() {
            resolved += 1;
            if resolved > MAX_CASCADE_EVENTS {
                warn!(
                    "character {:?}: event cascade exceeded {} events, dropping {} pending",
                    self.id,
                    MAX_CASCADE_EVENTS,
                    queue.len() + 1
                );
                break;
            }
            for action in self.event_handler.fire(event, &source) {
                debug!(
                    "character {:?}: {:?} of {} -> {:?}",
                    self.id, event, source, action
                );
                if let Err(err) = self.apply(action) {
                    // targets are checked at registration
                    error!("character {:?}: {}", self.id, err);
                }
                self.collect_emitted(&mut queue);
            }
        }
    }

    fn collect_emitted(&mut self, queue: &mut VecDeque<(Event, EventSource)>) {
        queue.extend(self.motion.take_emitted());
        queue.extend(self.animation.take_emitted());
    }

    fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::ActivatePath(id) => {
                self.motion.activate_path(&id)?;
                self.activated = true;
            }
            Action::DeactivatePath(id) => self.motion.deactivate_path(&id)?,
            Action::ActivateScene(id) => {
                self.animation.activate_scene(&id)?;
                self.activated = true;
            }
            Action::DeactivateScene(id) => self.animation.deactivate_scene(&id)?,
            Action::ResetAppearance => self.animation.reset_appearance(),
            Action::SetLayer(layer) => self.layer = layer,
            Action::SetCoordinate(coord) => self.motion.set_coordinate(coord),
        }
        Ok(())
    }

    /// Clears the activation flag, returning whether a path or scene was
    /// activated since the last call.
    pub(crate) fn take_activated(&mut self) -> bool {
        std::mem::take(&mut self.activated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{SceneId, SyncMetric};

    fn character() -> EffectCharacter {
        EffectCharacter::new(CharacterId(0), 'A', Coord::new(0, 0))
    }

    #[test]
    fn path_reaches_target_on_third_tick() {
        let mut ch = character();
        let path = ch.motion.new_path(1.0, None, Some("p")).unwrap();
        path.new_waypoint(Coord::new(0, 0), None)
            .new_waypoint(Coord::new(0, 3), None);
        let scene = ch.animation.new_scene(Some("done"), SyncMetric::Step, None).unwrap();
        scene.add_frame('!', 1, None).unwrap();
        ch.register_event(
            Event::PathComplete,
            PathId::from("p"),
            Action::ActivateScene("done".into()),
        )
        .unwrap();
        ch.activate_path("p").unwrap();

        ch.tick();
        ch.tick();
        assert_eq!(ch.current_coord(), Coord::new(0, 2));
        assert!(!ch.animation.is_animating());
        ch.tick();
        assert_eq!(ch.current_coord(), Coord::new(0, 3));
        assert!(ch.animation.is_animating());
        assert_eq!(ch.visual().symbol, '!');
    }

    #[test]
    fn actions_fire_in_registration_order_every_time() {
        let mut ch = character();
        let scene = ch.animation.new_scene(Some("s"), SyncMetric::Step, None).unwrap();
        scene.add_frame('s', 1, None).unwrap();
        ch.register_event(Event::SceneComplete, SceneId::from("s"), Action::SetLayer(1))
            .unwrap();
        ch.register_event(Event::SceneComplete, SceneId::from("s"), Action::SetLayer(2))
            .unwrap();
        for _ in 0..3 {
            ch.layer = 0;
            ch.activate_scene("s").unwrap();
            ch.tick();
            // the later binding wins because it runs second
            assert_eq!(ch.layer, 2);
        }
    }

    #[test]
    fn cascade_resolves_breadth_first() {
        let mut ch = character();
        for id in ["a", "b", "c"] {
            let scene = ch.animation.new_scene(Some(id), SyncMetric::Step, None).unwrap();
            scene.add_frame(id.chars().next().unwrap(), 1, None).unwrap();
        }
        // a activated -> [layer 1, activate b]; b activated -> layer 3
        // a activated also -> layer 2, registered after "activate b"
        ch.register_event(Event::SceneActivated, SceneId::from("a"), Action::SetLayer(1))
            .unwrap();
        ch.register_event(
            Event::SceneActivated,
            SceneId::from("a"),
            Action::ActivateScene("b".into()),
        )
        .unwrap();
        ch.register_event(Event::SceneActivated, SceneId::from("a"), Action::SetLayer(2))
            .unwrap();
        ch.register_event(Event::SceneActivated, SceneId::from("b"), Action::SetLayer(3))
            .unwrap();
        ch.activate_scene("a").unwrap();
        // depth-first would end with layer 2
        assert_eq!(ch.layer, 3);
        assert_eq!(ch.animation.active_scene().unwrap().id().to_string(), "b");
    }

    #[test]
    fn runaway_cascade_is_bounded() {
        let mut ch = character();
        let scene = ch.animation.new_scene(Some("x"), SyncMetric::Step, None).unwrap();
        scene.add_frame('x', 1, None).unwrap();
        ch.register_event(
            Event::SceneActivated,
            SceneId::from("x"),
            Action::ActivateScene("x".into()),
        )
        .unwrap();
        ch.activate_scene("x").unwrap();
        assert!(ch.animation.is_animating());
    }

    #[test]
    fn chained_paths_loop() {
        let mut ch = character();
        let mut ids = Vec::new();
        for (i, target) in [Coord::new(2, 0), Coord::new(2, 2), Coord::new(0, 0)]
            .iter()
            .enumerate()
        {
            let path = ch.motion.new_path(1.0, None, Some(i.to_string().as_str())).unwrap();
            path.new_waypoint(*target, None);
            ids.push(path.id().clone());
        }
        ch.chain_paths(&ids, true).unwrap();
        ch.activate_path("0").unwrap();
        for _ in 0..2 {
            ch.tick();
        }
        assert_eq!(ch.current_coord(), Coord::new(2, 0));
        assert_eq!(ch.motion.active_path().unwrap().id().to_string(), "1");
        for _ in 0..2 {
            ch.tick();
        }
        assert_eq!(ch.motion.active_path().unwrap().id().to_string(), "2");
        // back to the first path after the diagonal home leg
        while ch.motion.active_path().unwrap().id().to_string() == "2" {
            ch.tick();
        }
        assert_eq!(ch.current_coord(), Coord::new(0, 0));
        assert_eq!(ch.motion.active_path().unwrap().id().to_string(), "0");
        assert_eq!(ch.motion.active_path().unwrap().current_step(), 0);
        assert!(ch.is_active());
    }

    #[test]
    fn chain_without_loop_ends_inactive() {
        let mut ch = character();
        let a = ch.motion.new_path(1.0, None, Some("a")).unwrap();
        a.new_waypoint(Coord::new(1, 0), None);
        let b = ch.motion.new_path(1.0, None, Some("b")).unwrap();
        b.new_waypoint(Coord::new(1, 1), None);
        ch.chain_paths(&[PathId::from("a"), PathId::from("b")], false).unwrap();
        ch.activate_path("a").unwrap();
        ch.tick();
        ch.tick();
        assert_eq!(ch.current_coord(), Coord::new(1, 1));
        assert!(!ch.is_active());
        // exhausted characters tick as a no-op
        ch.tick();
        assert_eq!(ch.current_coord(), Coord::new(1, 1));
    }

    #[test]
    fn registration_is_validated() {
        let mut ch = character();
        ch.motion.new_path(1.0, None, Some("p")).unwrap();
        assert_eq!(
            ch.chain_paths(&[], false).unwrap_err(),
            Error::EmptyChain
        );
        assert!(ch
            .register_event(
                Event::PathComplete,
                PathId::from("missing"),
                Action::SetLayer(1)
            )
            .unwrap_err()
            .is_not_found());
        assert!(ch
            .register_event(
                Event::PathComplete,
                PathId::from("p"),
                Action::ActivateScene("missing".into())
            )
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            ch.register_event(Event::SceneComplete, PathId::from("p"), Action::SetLayer(1))
                .unwrap_err(),
            Error::MismatchedEventSource(Event::SceneComplete, EventSource::Path("p".into()))
        );
    }

    #[test]
    fn empty_targets_are_rejected_at_registration() {
        let mut ch = character();
        let scene = ch.animation.new_scene(Some("s"), SyncMetric::Step, None).unwrap();
        scene.add_frame('s', 1, None).unwrap();
        ch.animation.new_scene(Some("blank"), SyncMetric::Step, None).unwrap();
        ch.motion.new_path(1.0, None, Some("empty")).unwrap();
        assert_eq!(
            ch.register_event(
                Event::SceneComplete,
                SceneId::from("s"),
                Action::ActivatePath("empty".into())
            )
            .unwrap_err(),
            Error::EmptyPath("empty".into())
        );
        assert_eq!(
            ch.register_event(
                Event::SceneComplete,
                SceneId::from("s"),
                Action::ActivateScene("blank".into())
            )
            .unwrap_err(),
            Error::EmptyScene("blank".into())
        );
        assert!(ch.event_handler().is_empty());
        assert_eq!(
            ch.chain_paths(&[PathId::from("empty")], true).unwrap_err(),
            Error::EmptyPath("empty".into())
        );
        // deactivating needs nothing but the id
        ch.register_event(
            Event::SceneComplete,
            SceneId::from("s"),
            Action::DeactivatePath("empty".into()),
        )
        .unwrap();
    }

    #[test]
    fn set_coordinate_and_reset_actions() {
        let mut ch = character();
        let scene = ch.animation.new_scene(Some("s"), SyncMetric::Step, None).unwrap();
        scene.add_frame('#', 1, None).unwrap();
        ch.register_event(
            Event::SceneComplete,
            SceneId::from("s"),
            Action::SetCoordinate(Coord::new(9, 9)),
        )
        .unwrap();
        ch.register_event(Event::SceneComplete, SceneId::from("s"), Action::ResetAppearance)
            .unwrap();
        ch.activate_scene("s").unwrap();
        assert_eq!(ch.visual().symbol, '#');
        ch.tick();
        assert_eq!(ch.current_coord(), Coord::new(9, 9));
        assert_eq!(ch.visual().symbol, 'A');
        assert!(!ch.is_active());
    }
}
