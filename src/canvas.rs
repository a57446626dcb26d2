use rand::Rng;

use crate::geometry::Coord;

/// The visible rectangle characters are rendered into.
///
/// Coordinates are 1-based with row 1 at the bottom, so `bottom` and `left`
/// are always 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Canvas {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    pub center_row: i32,
    pub center_column: i32,
}

impl Canvas {
    /// A canvas `width` columns wide and `height` rows tall. Zero sizes are
    /// bumped to one.
    pub fn new(width: usize, height: usize) -> Self {
        let right = width.max(1) as i32;
        let top = height.max(1) as i32;
        Self {
            top,
            right,
            bottom: 1,
            left: 1,
            center_row: (top + 1) / 2,
            center_column: (right + 1) / 2,
        }
    }

    pub fn width(&self) -> usize {
        (self.right - self.left + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.top - self.bottom + 1) as usize
    }

    pub fn center(&self) -> Coord {
        Coord::new(self.center_column, self.center_row)
    }

    pub fn coord_is_in_canvas(&self, coord: Coord) -> bool {
        (self.left..=self.right).contains(&coord.column)
            && (self.bottom..=self.top).contains(&coord.row)
    }

    /// Random coordinate inside the canvas, or with `outside_scope` one cell
    /// beyond a randomly chosen edge.
    pub fn random_coord<R: Rng + ?Sized>(&self, rng: &mut R, outside_scope: bool) -> Coord {
        if !outside_scope {
            return Coord::new(
                rng.gen_range(self.left..=self.right),
                rng.gen_range(self.bottom..=self.top),
            );
        }
        let column = rng.gen_range(self.left..=self.right);
        let row = rng.gen_range(self.bottom..=self.top);
        match rng.gen_range(0..4) {
            0 => Coord::new(column, self.top + 1),
            1 => Coord::new(column, self.bottom - 1),
            2 => Coord::new(self.left - 1, row),
            _ => Coord::new(self.right + 1, row),
        }
    }

    /// Random column within the canvas.
    pub fn random_column<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.left..=self.right)
    }

    /// Random row within the canvas.
    pub fn random_row<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.bottom..=self.top)
    }
}
