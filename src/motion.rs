use core::fmt;
use std::ops::Deref;

use log::trace;
use ordermap::OrderMap;

use crate::easing::Easing;
use crate::error::{Error, Result};
use crate::events::{Event, EventSource};
use crate::geometry::{bezier_length, bezier_point, lerp_point, point_distance, Coord};

/// Identifier of a [`Path`], unique within one character's [`Motion`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(String);

impl Deref for PathId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for PathId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PathId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for PathId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One destination on a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Waypoint {
    pub coord: Coord,
    /// When set, the segment ending at this waypoint is a quadratic curve
    /// pulled towards this point.
    pub bezier_control: Option<Coord>,
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    start: (f64, f64),
    end: (f64, f64),
    control: Option<(f64, f64)>,
    length: f64,
    /// Distance travelled along the path before this segment begins.
    offset: f64,
}

impl Segment {
    fn new(start: (f64, f64), end: (f64, f64), control: Option<(f64, f64)>, offset: f64) -> Self {
        let length = match control {
            Some(control) => bezier_length(start, control, end),
            None => point_distance(start, end),
        };
        Self {
            start,
            end,
            control,
            length,
            offset,
        }
    }

    fn point_at(&self, t: f64) -> (f64, f64) {
        match self.control {
            Some(control) => bezier_point(self.start, control, self.end, t),
            None => lerp_point(self.start, self.end, t),
        }
    }
}

/// A speed-paced route of waypoints.
///
/// The route starts wherever the character stands when the path is
/// activated, so the first segment leads from that coordinate to the first
/// waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    id: PathId,
    waypoints: Vec<Waypoint>,
    speed: f64,
    easing: Option<Easing>,
    /// Ticks to linger on the final waypoint before completing.
    pub hold_time: usize,
    /// Restart from the first waypoint on arrival instead of completing.
    pub looping: bool,

    segments: Vec<Segment>,
    total_distance: f64,
    current_step: usize,
    max_steps: usize,
    hold_remaining: usize,
}

impl Path {
    fn new(id: PathId, speed: f64, easing: Option<Easing>) -> Result<Self> {
        if !(speed > 0.0) {
            return Err(Error::NonPositiveSpeed(speed));
        }
        Ok(Self {
            id,
            waypoints: Vec::new(),
            speed,
            easing,
            hold_time: 0,
            looping: false,
            segments: Vec::new(),
            total_distance: 0.0,
            current_step: 0,
            max_steps: 0,
            hold_remaining: 0,
        })
    }

    pub fn id(&self) -> &PathId {
        &self.id
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn easing(&self) -> Option<Easing> {
        self.easing
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Appends a waypoint; `bezier_control` curves the segment leading to it.
    pub fn new_waypoint(&mut self, coord: Coord, bezier_control: Option<Coord>) -> &mut Self {
        self.waypoints.push(Waypoint {
            coord,
            bezier_control,
        });
        self
    }

    /// Total arc length, origin segment included. Zero until activated.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Number of ticks the traversal takes, hold time excluded.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Share of the distance covered so far, before easing.
    pub fn progress(&self) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        if self.current_step >= self.max_steps {
            return 1.0;
        }
        (self.current_step as f64 * self.speed / self.total_distance).min(1.0)
    }

    fn final_coord(&self) -> Coord {
        self.waypoints[self.waypoints.len() - 1].coord
    }

    fn reset(&mut self, origin: Coord) -> Result<()> {
        if self.waypoints.is_empty() {
            return Err(Error::EmptyPath(self.id.to_string()));
        }
        self.segments.clear();
        let mut previous = origin.to_point();
        let mut offset = 0.0;
        for waypoint in &self.waypoints {
            let end = waypoint.coord.to_point();
            let control = waypoint.bezier_control.map(Coord::to_point);
            let segment = Segment::new(previous, end, control, offset);
            offset += segment.length;
            previous = end;
            self.segments.push(segment);
        }
        self.total_distance = offset;
        // Guard against float noise turning an exact multiple into an extra tick.
        self.max_steps = (self.total_distance / self.speed - 1e-9).ceil().max(0.0) as usize;
        self.current_step = 0;
        self.hold_remaining = self.hold_time;
        Ok(())
    }

    fn coord_at_distance(&self, distance: f64) -> Coord {
        let distance = distance.clamp(0.0, self.total_distance);
        let segment = self
            .segments
            .iter()
            .find(|s| s.length > 0.0 && distance <= s.offset + s.length)
            .unwrap_or(&self.segments[self.segments.len() - 1]);
        let t = if segment.length > 0.0 {
            ((distance - segment.offset) / segment.length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Coord::from_point(segment.point_at(t))
    }

    /// Advances one tick and returns the new coordinate.
    fn step(&mut self) -> Coord {
        if self.current_step < self.max_steps {
            self.current_step += 1;
        }
        if self.current_step >= self.max_steps {
            return self.final_coord();
        }
        let progress = self.progress();
        let eased = self.easing.map_or(progress, |e| e.ease(progress));
        self.coord_at_distance(eased * self.total_distance)
    }

    fn is_traversed(&self) -> bool {
        self.current_step >= self.max_steps
    }
}

/// Moves one character along its registered paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    paths: OrderMap<PathId, Path>,
    active_path: Option<PathId>,
    current_coord: Coord,
    previous_coord: Coord,
    emitted: Vec<(Event, EventSource)>,
}

impl Motion {
    pub fn new(coord: Coord) -> Self {
        Self {
            paths: OrderMap::new(),
            active_path: None,
            current_coord: coord,
            previous_coord: coord,
            emitted: Vec::new(),
        }
    }

    /// Creates and registers a new path.
    ///
    /// Without an explicit id the path is named after the number of paths
    /// registered before it ("0", "1", ...).
    pub fn new_path(
        &mut self,
        speed: f64,
        easing: Option<Easing>,
        id: Option<&str>,
    ) -> Result<&mut Path> {
        let id = PathId::from(match id {
            Some(id) => id.to_string(),
            None => self.paths.len().to_string(),
        });
        if self.paths.contains_key(&id) {
            return Err(Error::DuplicatePathId(id.to_string()));
        }
        let path = Path::new(id.clone(), speed, easing)?;
        Ok(self.paths.entry(id).or_insert(path))
    }

    pub fn query_path(&self, id: &str) -> Result<&Path> {
        self.paths
            .get(id)
            .ok_or_else(|| Error::PathNotFound(id.to_string()))
    }

    pub fn query_path_mut(&mut self, id: &str) -> Result<&mut Path> {
        self.paths
            .get_mut(id)
            .ok_or_else(|| Error::PathNotFound(id.to_string()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    pub fn current_coord(&self) -> Coord {
        self.current_coord
    }

    pub fn previous_coord(&self) -> Coord {
        self.previous_coord
    }

    /// Teleports the character. Does not touch the active path.
    pub fn set_coordinate(&mut self, coord: Coord) {
        self.previous_coord = self.current_coord;
        self.current_coord = coord;
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active_path.as_ref().and_then(|id| self.paths.get(id))
    }

    /// Raw progress of the active path, `None` when nothing is moving.
    pub fn active_progress(&self) -> Option<f64> {
        self.active_path().map(Path::progress)
    }

    pub fn is_moving(&self) -> bool {
        self.active_path.is_some()
    }

    /// Makes `id` the active path, restarting it from the current coordinate.
    pub(crate) fn activate_path(&mut self, id: &str) -> Result<()> {
        let origin = self.current_coord;
        let path = self.query_path_mut(id)?;
        path.reset(origin)?;
        let id = path.id.clone();
        trace!(
            "path '{}' activated at {}, {} steps",
            id,
            origin,
            path.max_steps
        );
        self.active_path = Some(id.clone());
        self.emitted
            .push((Event::PathActivated, EventSource::Path(id)));
        Ok(())
    }

    /// Stops `id` if it is the active path. No event is emitted.
    pub(crate) fn deactivate_path(&mut self, id: &str) -> Result<()> {
        self.query_path(id)?;
        if self.active_path.as_deref() == Some(id) {
            self.active_path = None;
        }
        Ok(())
    }

    /// Moves one tick along the active path.
    ///
    /// Returns the progress of the path that moved, taken before it
    /// completes or loops, or `None` when nothing is moving.
    pub(crate) fn advance(&mut self) -> Option<f64> {
        let id = self.active_path.clone()?;
        let Some(path) = self.paths.get_mut(&id) else {
            self.active_path = None;
            return None;
        };
        let coord = path.step();
        let progress = path.progress();
        self.previous_coord = self.current_coord;
        self.current_coord = coord;
        if !path.is_traversed() {
            return Some(progress);
        }
        if path.hold_time > 0 && path.hold_remaining == path.hold_time {
            self.emitted
                .push((Event::PathHolding, EventSource::Path(id.clone())));
        }
        if path.hold_remaining > 0 {
            path.hold_remaining -= 1;
            return Some(progress);
        }
        if path.looping && path.waypoints.len() > 1 {
            // activation only fails for paths without waypoints
            let _ = self.activate_path(&id);
            return Some(progress);
        }
        self.active_path = None;
        self.emitted.push((Event::PathComplete, EventSource::Path(id)));
        Some(progress)
    }

    pub(crate) fn take_emitted(&mut self) -> Vec<(Event, EventSource)> {
        std::mem::take(&mut self.emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(motion: &mut Motion, speed: f64, to: Coord) -> PathId {
        let path = motion.new_path(speed, None, None).unwrap();
        path.new_waypoint(to, None);
        path.id().clone()
    }

    #[test]
    fn three_ticks_to_arrive() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let path = motion.new_path(1.0, None, Some("home")).unwrap();
        path.new_waypoint(Coord::new(0, 0), None)
            .new_waypoint(Coord::new(0, 3), None);
        motion.activate_path("home").unwrap();
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathActivated, EventSource::Path("home".into()))]
        );

        motion.advance();
        assert_eq!(motion.current_coord(), Coord::new(0, 1));
        motion.advance();
        assert_eq!(motion.current_coord(), Coord::new(0, 2));
        assert!(motion.take_emitted().is_empty());
        motion.advance();
        assert_eq!(motion.current_coord(), Coord::new(0, 3));
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathComplete, EventSource::Path("home".into()))]
        );
        assert!(!motion.is_moving());

        motion.advance();
        assert_eq!(motion.current_coord(), Coord::new(0, 3));
        assert!(motion.take_emitted().is_empty());
    }

    #[test]
    fn fractional_speed_lands_exactly() {
        for speed in [0.1, 0.3, 0.7, 1.5, 2.5, 4.0] {
            let mut motion = Motion::new(Coord::new(1, 1));
            let id = straight(&mut motion, speed, Coord::new(8, 5));
            let total = crate::geometry::find_length_of_line(
                Coord::new(1, 1),
                Coord::new(8, 5),
                false,
            );
            let budget = (total / speed).ceil() as usize;
            motion.activate_path(&id).unwrap();
            motion.take_emitted();
            let mut ticks = 0;
            while motion.is_moving() {
                motion.advance();
                ticks += 1;
                assert!(ticks <= budget, "speed {} overran", speed);
            }
            assert_eq!(ticks, budget, "speed {}", speed);
            assert_eq!(motion.current_coord(), Coord::new(8, 5));
            assert_eq!(
                motion.take_emitted(),
                vec![(Event::PathComplete, EventSource::Path(id.clone()))]
            );
        }
    }

    #[test]
    fn distance_carries_across_waypoints() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let path = motion.new_path(1.5, None, Some("zig")).unwrap();
        path.new_waypoint(Coord::new(3, 0), None)
            .new_waypoint(Coord::new(3, 3), None);
        motion.activate_path("zig").unwrap();
        assert_eq!(motion.active_path().unwrap().max_steps(), 4);
        motion.advance();
        motion.advance();
        // 3.0 travelled: exactly on the corner
        assert_eq!(motion.current_coord(), Coord::new(3, 0));
        motion.advance();
        // 4.5 travelled: 1.5 into the second segment
        assert_eq!(motion.current_coord(), Coord::new(3, 2));
        motion.advance();
        assert_eq!(motion.current_coord(), Coord::new(3, 3));
        assert!(!motion.is_moving());
    }

    #[test]
    fn zero_length_completes_on_first_advance() {
        let mut motion = Motion::new(Coord::new(4, 4));
        let id = straight(&mut motion, 1.0, Coord::new(4, 4));
        motion.activate_path(&id).unwrap();
        assert_eq!(motion.active_progress(), Some(1.0));
        motion.take_emitted();
        motion.advance();
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathComplete, EventSource::Path(id))]
        );
    }

    #[test]
    fn curved_segment_ends_on_target() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let path = motion.new_path(1.0, Some(Easing::InOutQuad), None).unwrap();
        path.new_waypoint(Coord::new(10, 0), Some(Coord::new(5, 8)));
        let id = path.id().clone();
        motion.activate_path(&id).unwrap();
        let steps = motion.active_path().unwrap().max_steps();
        assert!(steps > 10);
        let mut seen_above = false;
        for _ in 0..steps {
            motion.advance();
            seen_above |= motion.current_coord().row > 0;
        }
        assert!(seen_above);
        assert_eq!(motion.current_coord(), Coord::new(10, 0));
        assert!(!motion.is_moving());
    }

    #[test]
    fn progress_is_monotonic() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let id = straight(&mut motion, 0.4, Coord::new(0, 7));
        motion.activate_path(&id).unwrap();
        let mut last = motion.active_progress().unwrap();
        assert_eq!(last, 0.0);
        while let Some(p) = motion.active_progress() {
            assert!(p >= last);
            last = p;
            motion.advance();
        }
        assert_eq!(motion.query_path(&id).unwrap().progress(), 1.0);
    }

    #[test]
    fn arrival_reports_full_progress() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let id = straight(&mut motion, 1.0, Coord::new(2, 0));
        assert_eq!(motion.advance(), None);
        motion.activate_path(&id).unwrap();
        assert_eq!(motion.advance(), Some(0.5));
        assert_eq!(motion.advance(), Some(1.0));
        assert!(!motion.is_moving());
        assert_eq!(motion.advance(), None);
    }

    #[test]
    fn hold_then_complete() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let path = motion.new_path(1.0, None, Some("p")).unwrap();
        path.new_waypoint(Coord::new(1, 0), None);
        path.hold_time = 2;
        motion.activate_path("p").unwrap();
        motion.take_emitted();
        motion.advance();
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathHolding, EventSource::Path("p".into()))]
        );
        motion.advance();
        assert!(motion.is_moving());
        motion.advance();
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathComplete, EventSource::Path("p".into()))]
        );
    }

    #[test]
    fn looping_path_restarts() {
        let mut motion = Motion::new(Coord::new(0, 0));
        let path = motion.new_path(1.0, None, Some("loop")).unwrap();
        path.new_waypoint(Coord::new(2, 0), None)
            .new_waypoint(Coord::new(0, 0), None);
        path.looping = true;
        motion.activate_path("loop").unwrap();
        motion.take_emitted();
        for _ in 0..4 {
            motion.advance();
        }
        assert_eq!(motion.current_coord(), Coord::new(0, 0));
        assert!(motion.is_moving());
        assert_eq!(
            motion.take_emitted(),
            vec![(Event::PathActivated, EventSource::Path("loop".into()))]
        );
    }

    #[test]
    fn errors() {
        let mut motion = Motion::new(Coord::new(0, 0));
        assert_eq!(
            motion.new_path(0.0, None, None).unwrap_err(),
            Error::NonPositiveSpeed(0.0)
        );
        assert!(motion.new_path(-1.0, None, None).is_err());
        motion.new_path(1.0, None, Some("a")).unwrap();
        assert_eq!(
            motion.new_path(1.0, None, Some("a")).unwrap_err(),
            Error::DuplicatePathId("a".into())
        );
        assert_eq!(
            motion.activate_path("a").unwrap_err(),
            Error::EmptyPath("a".into())
        );
        assert!(motion.query_path("missing").unwrap_err().is_not_found());
        assert!(motion.activate_path("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn set_coordinate_tracks_previous() {
        let mut motion = Motion::new(Coord::new(1, 1));
        motion.set_coordinate(Coord::new(5, 5));
        assert_eq!(motion.previous_coord(), Coord::new(1, 1));
        assert_eq!(motion.current_coord(), Coord::new(5, 5));
    }
}
