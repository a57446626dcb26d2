pub mod animation;
pub mod canvas;
pub mod character;
pub mod colors;
pub mod easing;
pub mod effect;
pub mod error;
pub mod events;
pub mod geometry;
pub mod gradient;
pub mod motion;
pub mod terminal;

pub use animation::{Animation, CharacterVisual, Frame, Scene, SceneId, SyncMetric};
pub use canvas::Canvas;
pub use character::{CharacterId, EffectCharacter, MAX_CASCADE_EVENTS};
pub use colors::{adjust_color_brightness, Color};
pub use easing::Easing;
pub use effect::{Effect, EffectIterator};
pub use error::{Error, ErrorKind, Result};
pub use events::{Action, Event, EventHandler, EventSource};
pub use geometry::Coord;
pub use gradient::{Gradient, GradientDirection};
pub use motion::{Motion, Path, PathId, Waypoint};
pub use terminal::{CharacterGroup, Terminal, TerminalConfig};
