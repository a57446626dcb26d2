use core::fmt;

/// A position on the character grid.
///
/// Columns grow to the right and rows grow upwards: row 1 is the bottom line
/// of the canvas. Coordinates outside the canvas are valid and are used to
/// stage characters off-screen.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub column: i32,
    pub row: i32,
}

impl Coord {
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    pub(crate) fn from_point(point: (f64, f64)) -> Self {
        Self {
            column: point.0.round() as i32,
            row: point.1.round() as i32,
        }
    }

    pub(crate) fn to_point(self) -> (f64, f64) {
        (self.column as f64, self.row as f64)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

impl From<(i32, i32)> for Coord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

pub(crate) fn lerp_point(start: (f64, f64), end: (f64, f64), t: f64) -> (f64, f64) {
    (
        start.0 + (end.0 - start.0) * t,
        start.1 + (end.1 - start.1) * t,
    )
}

pub(crate) fn bezier_point(
    start: (f64, f64),
    control: (f64, f64),
    end: (f64, f64),
    t: f64,
) -> (f64, f64) {
    let inv = 1.0 - t;
    (
        inv * inv * start.0 + 2.0 * inv * t * control.0 + t * t * end.0,
        inv * inv * start.1 + 2.0 * inv * t * control.1 + t * t * end.1,
    )
}

pub(crate) fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

/// Number of chords used to approximate the length of a curve.
const BEZIER_SAMPLES: usize = 10;

pub(crate) fn bezier_length(start: (f64, f64), control: (f64, f64), end: (f64, f64)) -> f64 {
    let mut length = 0.0;
    let mut previous = start;
    for i in 1..=BEZIER_SAMPLES {
        let t = i as f64 / BEZIER_SAMPLES as f64;
        let point = bezier_point(start, control, end, t);
        length += point_distance(previous, point);
        previous = point;
    }
    length
}

/// Length of the straight line between two coordinates.
///
/// With `double_row_diff` the vertical distance counts twice, which roughly
/// compensates for terminal cells being twice as tall as they are wide.
pub fn find_length_of_line(a: Coord, b: Coord, double_row_diff: bool) -> f64 {
    let column_diff = (b.column - a.column) as f64;
    let mut row_diff = (b.row - a.row) as f64;
    if double_row_diff {
        row_diff *= 2.0;
    }
    (column_diff * column_diff + row_diff * row_diff).sqrt()
}

/// Coordinate at fraction `t` of the straight line from `start` to `end`.
pub fn find_coord_on_line(start: Coord, end: Coord, t: f64) -> Coord {
    Coord::from_point(lerp_point(start.to_point(), end.to_point(), t))
}

/// Coordinate at parameter `t` of the quadratic curve from `start` to `end`
/// pulled towards `control`.
pub fn find_coord_on_bezier_curve(start: Coord, control: Coord, end: Coord, t: f64) -> Coord {
    Coord::from_point(bezier_point(
        start.to_point(),
        control.to_point(),
        end.to_point(),
        t,
    ))
}

/// Approximate arc length of a quadratic curve.
pub fn find_length_of_bezier_curve(start: Coord, control: Coord, end: Coord) -> f64 {
    bezier_length(start.to_point(), control.to_point(), end.to_point())
}

/// Coordinate `distance` units from `origin` in the direction of `target`.
pub fn find_coord_at_distance(origin: Coord, target: Coord, distance: f64) -> Coord {
    let total = find_length_of_line(origin, target, false);
    if total == 0.0 {
        return origin;
    }
    find_coord_on_line(origin, target, distance / total)
}

/// All coordinates inside the ellipse around `center`.
///
/// The horizontal radius is `radius`, the vertical one half of it, so the
/// shape looks round on a terminal.
pub fn find_coords_in_circle(center: Coord, radius: i32) -> Vec<Coord> {
    let mut coords = Vec::new();
    if radius <= 0 {
        return coords;
    }
    let x_radius = radius as f64;
    let y_radius = (radius as f64 / 2.0).max(1.0);
    let y_span = y_radius.ceil() as i32;
    for row in (center.row - y_span)..=(center.row + y_span) {
        for column in (center.column - radius)..=(center.column + radius) {
            let dx = (column - center.column) as f64 / x_radius;
            let dy = (row - center.row) as f64 / y_radius;
            if dx * dx + dy * dy <= 1.0 {
                coords.push(Coord::new(column, row));
            }
        }
    }
    coords
}

/// All coordinates within `distance` cells of `origin` along both axes.
pub fn find_coords_in_rect(origin: Coord, distance: i32) -> Vec<Coord> {
    let mut coords = Vec::new();
    for row in (origin.row - distance)..=(origin.row + distance) {
        for column in (origin.column - distance)..=(origin.column + distance) {
            coords.push(Coord::new(column, row));
        }
    }
    coords
}

/// Evenly spaced coordinates on the ellipse around `origin`.
pub fn find_coords_on_circle(origin: Coord, radius: i32, points: usize) -> Vec<Coord> {
    if points == 0 || radius <= 0 {
        return Vec::new();
    }
    let step = std::f64::consts::TAU / points as f64;
    (0..points)
        .map(|i| {
            let angle = step * i as f64;
            Coord::from_point((
                origin.column as f64 + radius as f64 * angle.cos(),
                origin.row as f64 + radius as f64 / 2.0 * angle.sin(),
            ))
        })
        .collect()
}

/// Distance of `coord` from the centre of a `max_column` x `max_row` box,
/// normalized to 0.0 at the centre and 1.0 at the corners.
///
/// Rows are weighted double, see [`find_length_of_line`].
pub fn find_normalized_distance_from_center(max_row: i32, max_column: i32, coord: Coord) -> f64 {
    let center_x = max_column as f64 / 2.0;
    let center_y = max_row as f64 / 2.0;
    let max_distance = (center_x * center_x + (center_y * 2.0).powi(2)).sqrt();
    if max_distance == 0.0 {
        return 0.0;
    }
    let dx = coord.column as f64 - center_x;
    let dy = (coord.row as f64 - center_y) * 2.0;
    ((dx * dx + dy * dy).sqrt() / max_distance).min(1.0)
}
