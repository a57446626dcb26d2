use core::fmt;
use std::ops::Deref;

use log::trace;
use ordermap::OrderMap;

use crate::colors::Color;
use crate::easing::Easing;
use crate::error::{Error, Result};
use crate::events::{Event, EventSource};
use crate::gradient::Gradient;

/// Identifier of a [`Scene`], unique within one character's [`Animation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(String);

impl Deref for SceneId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SceneId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for SceneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a character looks like on a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacterVisual {
    pub symbol: char,
    /// `None` renders with the terminal's default foreground.
    pub color: Option<Color>,
}

/// An atomic keyframe: a glyph shown for `duration` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub visual: CharacterVisual,
    pub duration: usize,
}

/// How a scene chooses its current frame.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMetric {
    /// One tick of frame duration is consumed per advance.
    #[default]
    Step,
    /// The frame follows the travel progress of the active path.
    Distance,
}

/// An ordered sequence of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    id: SceneId,
    frames: Vec<Frame>,
    /// Cumulative tick count at the end of each frame.
    frame_ends: Vec<usize>,
    sync: SyncMetric,
    easing: Option<Easing>,
    /// Restart from the first frame instead of completing.
    pub is_looping: bool,
    ticks_elapsed: usize,
}

impl Scene {
    fn new(id: SceneId, sync: SyncMetric, easing: Option<Easing>) -> Self {
        Self {
            id,
            frames: Vec::new(),
            frame_ends: Vec::new(),
            sync,
            easing,
            is_looping: false,
            ticks_elapsed: 0,
        }
    }

    pub fn id(&self) -> &SceneId {
        &self.id
    }

    pub fn sync(&self) -> SyncMetric {
        self.sync
    }

    pub fn easing(&self) -> Option<Easing> {
        self.easing
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Sum of all frame durations.
    pub fn total_duration(&self) -> usize {
        self.frame_ends.last().copied().unwrap_or(0)
    }

    /// Appends a frame lasting `duration` ticks.
    pub fn add_frame(&mut self, symbol: char, duration: usize, color: Option<Color>) -> Result<()> {
        if duration == 0 {
            return Err(Error::ZeroFrameDuration(symbol));
        }
        let end = self.total_duration() + duration;
        self.frames.push(Frame {
            visual: CharacterVisual { symbol, color },
            duration,
        });
        self.frame_ends.push(end);
        Ok(())
    }

    /// Appends one frame per gradient color, all showing `symbol`.
    pub fn apply_gradient_to_symbols(
        &mut self,
        gradient: &Gradient,
        symbol: char,
        frames_per_step: usize,
    ) -> Result<()> {
        for color in gradient {
            self.add_frame(symbol, frames_per_step, Some(*color))?;
        }
        Ok(())
    }

    /// Index of the frame covering cumulative tick `position`.
    fn frame_at(&self, position: usize) -> usize {
        let idx = self.frame_ends.partition_point(|&end| end <= position);
        idx.min(self.frames.len() - 1)
    }

    /// Index of the frame shown for a path progress ratio, `None` while the
    /// scene has no frames.
    pub fn frame_index_for_progress(&self, ratio: f64) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        let ratio = ratio.clamp(0.0, 1.0);
        let eased = self.easing.map_or(ratio, |e| e.ease(ratio));
        let idx = (eased * self.frames.len() as f64).floor().max(0.0) as usize;
        Some(idx.min(last))
    }

    fn reset(&mut self) -> Result<CharacterVisual> {
        if self.frames.is_empty() {
            return Err(Error::EmptyScene(self.id.to_string()));
        }
        self.ticks_elapsed = 0;
        Ok(self.frames[0].visual)
    }

    /// Consumes one tick. Returns the visual for this tick and whether the
    /// scene has played through.
    fn step(&mut self) -> (CharacterVisual, bool) {
        let total = self.total_duration();
        let position = match self.easing {
            Some(easing) => {
                let eased = easing.ease(self.ticks_elapsed as f64 / total as f64);
                (eased * total as f64).floor().max(0.0) as usize
            }
            None => self.ticks_elapsed,
        };
        let visual = self.frames[self.frame_at(position)].visual;
        self.ticks_elapsed += 1;
        if self.ticks_elapsed < total {
            return (visual, false);
        }
        if self.is_looping {
            self.ticks_elapsed = 0;
            return (visual, false);
        }
        (visual, true)
    }
}

/// Drives the appearance of one character through its registered scenes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    scenes: OrderMap<SceneId, Scene>,
    active_scene: Option<SceneId>,
    input_symbol: char,
    current_visual: CharacterVisual,
    emitted: Vec<(Event, EventSource)>,
}

impl Animation {
    pub fn new(input_symbol: char) -> Self {
        Self {
            scenes: OrderMap::new(),
            active_scene: None,
            input_symbol,
            current_visual: CharacterVisual {
                symbol: input_symbol,
                color: None,
            },
            emitted: Vec::new(),
        }
    }

    /// Creates and registers a new scene.
    ///
    /// Without an explicit id the scene is named after the number of scenes
    /// registered before it ("0", "1", ...).
    pub fn new_scene(
        &mut self,
        id: Option<&str>,
        sync: SyncMetric,
        easing: Option<Easing>,
    ) -> Result<&mut Scene> {
        let id = SceneId::from(match id {
            Some(id) => id.to_string(),
            None => self.scenes.len().to_string(),
        });
        if self.scenes.contains_key(&id) {
            return Err(Error::DuplicateSceneId(id.to_string()));
        }
        let scene = Scene::new(id.clone(), sync, easing);
        Ok(self.scenes.entry(id).or_insert(scene))
    }

    pub fn query_scene(&self, id: &str) -> Result<&Scene> {
        self.scenes
            .get(id)
            .ok_or_else(|| Error::SceneNotFound(id.to_string()))
    }

    pub fn query_scene_mut(&mut self, id: &str) -> Result<&mut Scene> {
        self.scenes
            .get_mut(id)
            .ok_or_else(|| Error::SceneNotFound(id.to_string()))
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active_scene.as_ref().and_then(|id| self.scenes.get(id))
    }

    pub fn is_animating(&self) -> bool {
        self.active_scene.is_some()
    }

    pub fn current_visual(&self) -> CharacterVisual {
        self.current_visual
    }

    pub fn input_symbol(&self) -> char {
        self.input_symbol
    }

    /// Pins an appearance outside the scene model. The next advance of an
    /// active scene replaces it.
    pub fn set_appearance(&mut self, symbol: char, color: Option<Color>) {
        self.current_visual = CharacterVisual { symbol, color };
    }

    /// Back to the input symbol with the default color.
    pub fn reset_appearance(&mut self) {
        self.set_appearance(self.input_symbol, None);
    }

    /// Makes `id` the active scene, restarting it from its first frame.
    pub(crate) fn activate_scene(&mut self, id: &str) -> Result<()> {
        let scene = self.query_scene_mut(id)?;
        let visual = scene.reset()?;
        let id = scene.id.clone();
        trace!("scene '{}' activated", id);
        self.current_visual = visual;
        self.active_scene = Some(id.clone());
        self.emitted
            .push((Event::SceneActivated, EventSource::Scene(id)));
        Ok(())
    }

    /// Stops `id` if it is the active scene, keeping the current appearance.
    pub(crate) fn deactivate_scene(&mut self, id: &str) -> Result<()> {
        self.query_scene(id)?;
        if self.active_scene.as_deref() == Some(id) {
            self.active_scene = None;
        }
        Ok(())
    }

    /// Advances the active scene by one tick.
    ///
    /// `path_progress` is the progress of the path the character moved along
    /// this tick and only matters for [`SyncMetric::Distance`] scenes.
    pub(crate) fn advance(&mut self, path_progress: Option<f64>) {
        let Some(id) = self.active_scene.clone() else {
            return;
        };
        let Some(scene) = self.scenes.get_mut(&id) else {
            self.active_scene = None;
            return;
        };
        match scene.sync {
            SyncMetric::Distance => {
                if let Some(idx) = scene.frame_index_for_progress(path_progress.unwrap_or(0.0)) {
                    self.current_visual = scene.frames[idx].visual;
                }
            }
            SyncMetric::Step => {
                let (visual, complete) = scene.step();
                self.current_visual = visual;
                if complete {
                    self.active_scene = None;
                    self.emitted
                        .push((Event::SceneComplete, EventSource::Scene(id)));
                }
            }
        }
    }

    pub(crate) fn take_emitted(&mut self) -> Vec<(Event, EventSource)> {
        std::mem::take(&mut self.emitted)
    }
}
