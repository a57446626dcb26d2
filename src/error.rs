use core::fmt::Display;

use crate::events::{Event, EventSource};

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup of an id that was never registered on the character.
    NotFound,
    /// Invalid construction of an engine primitive.
    Configuration,
}

/// Errors raised while wiring characters, paths, scenes and gradients.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No path with this id is registered on the character.
    PathNotFound(String),
    /// No scene with this id is registered on the character.
    SceneNotFound(String),

    /// Path speed must be strictly positive.
    NonPositiveSpeed(f64),
    /// Frame duration must be at least one tick.
    ZeroFrameDuration(char),
    /// Path activated without any waypoints.
    EmptyPath(String),
    /// Scene activated without any frames.
    EmptyScene(String),
    /// Path chain built from an empty list.
    EmptyChain,
    /// Gradient built without stops.
    EmptyGradient,
    /// Gradient segment with zero steps.
    ZeroGradientSteps,
    /// Path id already registered on the character.
    DuplicatePathId(String),
    /// Scene id already registered on the character.
    DuplicateSceneId(String),
    /// Event kind cannot be raised by the given source.
    MismatchedEventSource(Event, EventSource),

    /// Failed to parse color string.
    ColorParsing(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PathNotFound(_) | Error::SceneNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PathNotFound(id) => write!(f, "path '{}' is not registered", id),
            Error::SceneNotFound(id) => write!(f, "scene '{}' is not registered", id),
            Error::NonPositiveSpeed(speed) => {
                write!(f, "path speed must be greater than 0, got {}", speed)
            }
            Error::ZeroFrameDuration(symbol) => {
                write!(f, "frame '{}' must last at least one tick", symbol)
            }
            Error::EmptyPath(id) => write!(f, "path '{}' has no waypoints", id),
            Error::EmptyScene(id) => write!(f, "scene '{}' has no frames", id),
            Error::EmptyChain => write!(f, "cannot chain an empty list of paths"),
            Error::EmptyGradient => write!(f, "gradient needs at least one stop"),
            Error::ZeroGradientSteps => write!(f, "gradient steps must be greater than 0"),
            Error::DuplicatePathId(id) => write!(f, "path id '{}' is already registered", id),
            Error::DuplicateSceneId(id) => write!(f, "scene id '{}' is already registered", id),
            Error::MismatchedEventSource(event, source) => {
                write!(f, "event {:?} cannot be raised by {}", event, source)
            }
            Error::ColorParsing(s) => write!(f, "failed to parse color: {}", s),
        }
    }
}

impl std::error::Error for Error {}
