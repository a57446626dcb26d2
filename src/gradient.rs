use std::collections::HashMap;

use crate::colors::Color;
use crate::error::{Error, Result};
use crate::geometry::{find_normalized_distance_from_center, Coord};

/// Axis used to map canvas coordinates onto a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientDirection {
    /// Bottom row to top row.
    Vertical,
    /// Left column to right column.
    Horizontal,
    /// Bottom-left corner to top-right corner.
    Diagonal,
    /// Centre outwards, rows weighted double to look round on a terminal.
    Center,
    /// Centre outwards by plain euclidean distance.
    Radial,
}

/// An ordered spectrum of colors interpolated between stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    stops: Vec<Color>,
    steps: Vec<usize>,
    spectrum: Vec<Color>,
}

impl Gradient {
    /// Builds a gradient through `stops`.
    ///
    /// `steps` holds the number of colors for each consecutive pair of stops;
    /// when it is shorter than the number of pairs its last value is reused.
    /// Each segment runs from its start stop to its end stop inclusive, the
    /// shared stop between two segments appears once, so every segment after
    /// the first adds `steps - 1` colors. Stops black, white, red with steps
    /// `[2, 3]` give black, white, pink, red. A single stop yields that color
    /// repeated `steps[0]` times.
    pub fn new(stops: &[Color], steps: &[usize]) -> Result<Self> {
        if stops.is_empty() {
            return Err(Error::EmptyGradient);
        }
        if steps.is_empty() || steps.contains(&0) {
            return Err(Error::ZeroGradientSteps);
        }
        let spectrum = if stops.len() == 1 {
            vec![stops[0]; steps[0]]
        } else {
            let mut spectrum = Vec::new();
            for (i, pair) in stops.windows(2).enumerate() {
                let count = *steps.get(i).unwrap_or(&steps[steps.len() - 1]);
                let segment = interpolate(pair[0], pair[1], count);
                let skip = if i > 0 && count > 1 { 1 } else { 0 };
                spectrum.extend(segment.into_iter().skip(skip));
            }
            spectrum
        };
        Ok(Self {
            stops: stops.to_vec(),
            steps: steps.to_vec(),
            spectrum,
        })
    }

    /// Shorthand for a gradient with the same step count on every segment.
    pub fn with_steps(stops: &[Color], steps: usize) -> Result<Self> {
        Self::new(stops, &[steps])
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn spectrum(&self) -> &[Color] {
        &self.spectrum
    }

    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Color> {
        self.spectrum.iter()
    }

    /// Color nearest to `fraction` (clamped to [0, 1]) along the spectrum.
    pub fn get_color_at_fraction(&self, fraction: f64) -> Color {
        let fraction = fraction.clamp(0.0, 1.0);
        let idx = (fraction * (self.spectrum.len() - 1) as f64).round() as usize;
        self.spectrum[idx.min(self.spectrum.len() - 1)]
    }

    /// Maps every coordinate of the `right` x `top` box (1-based) to a color.
    pub fn build_coordinate_color_mapping(
        &self,
        top: i32,
        right: i32,
        direction: GradientDirection,
    ) -> HashMap<Coord, Color> {
        let top = top.max(1);
        let right = right.max(1);
        let center_column = (right as f64 + 1.0) / 2.0;
        let center_row = (top as f64 + 1.0) / 2.0;
        let max_radial = ((center_column - 1.0).powi(2) + (center_row - 1.0).powi(2)).sqrt();
        let mut mapping = HashMap::with_capacity((top * right) as usize);
        for row in 1..=top {
            for column in 1..=right {
                let coord = Coord::new(column, row);
                let fraction = match direction {
                    GradientDirection::Vertical => row as f64 / top as f64,
                    GradientDirection::Horizontal => column as f64 / right as f64,
                    GradientDirection::Diagonal => (row + column) as f64 / (top + right) as f64,
                    GradientDirection::Center => {
                        find_normalized_distance_from_center(top, right, coord)
                    }
                    GradientDirection::Radial => {
                        if max_radial == 0.0 {
                            0.0
                        } else {
                            ((column as f64 - center_column).powi(2)
                                + (row as f64 - center_row).powi(2))
                            .sqrt()
                                / max_radial
                        }
                    }
                };
                mapping.insert(coord, self.get_color_at_fraction(fraction));
            }
        }
        mapping
    }
}

impl<'a> IntoIterator for &'a Gradient {
    type Item = &'a Color;
    type IntoIter = std::slice::Iter<'a, Color>;
    fn into_iter(self) -> Self::IntoIter {
        self.spectrum.iter()
    }
}

/// `count` evenly spaced colors from `start` to `end` inclusive; a single
/// step yields just `start`.
fn interpolate(start: Color, end: Color, count: usize) -> Vec<Color> {
    if count == 1 {
        return vec![start];
    }
    let (sr, sg, sb) = start.rgb();
    let (er, eg, eb) = end.rgb();
    let channel = |s: u8, e: u8, t: f64| (s as f64 + (e as f64 - s as f64) * t).round() as u8;
    (0..count)
        .map(|i| {
            if i == 0 {
                return start;
            }
            if i == count - 1 {
                return end;
            }
            let t = i as f64 / (count - 1) as f64;
            Color::Rgb(channel(sr, er, t), channel(sg, eg, t), channel(sb, eb, t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = Color::Rgb(0, 0, 0);
    const WHITE: Color = Color::Rgb(255, 255, 255);
    const RED: Color = Color::Rgb(255, 0, 0);

    #[test]
    fn two_stops() {
        let g = Gradient::with_steps(&[BLACK, WHITE], 3).unwrap();
        assert_eq!(g.spectrum(), &[BLACK, Color::Rgb(128, 128, 128), WHITE]);
    }

    #[test]
    fn single_step_is_start() {
        let g = Gradient::with_steps(&[RED, WHITE], 1).unwrap();
        assert_eq!(g.spectrum(), &[RED]);
    }

    #[test]
    fn constant_gradient() {
        let g = Gradient::with_steps(&[RED, RED], 5).unwrap();
        assert_eq!(g.spectrum(), &[RED; 5]);
        let g = Gradient::with_steps(&[RED], 4).unwrap();
        assert_eq!(g.spectrum(), &[RED; 4]);
    }

    #[test]
    fn per_segment_steps() {
        let g = Gradient::new(&[BLACK, WHITE, RED], &[2, 3]).unwrap();
        assert_eq!(
            g.spectrum(),
            &[BLACK, WHITE, Color::Rgb(255, 128, 128), RED]
        );
        // last step value is reused for later segments
        let g = Gradient::new(&[BLACK, WHITE, BLACK], &[3]).unwrap();
        assert_eq!(g.len(), 5);
        assert_eq!(g.spectrum()[2], WHITE);
    }

    #[test]
    fn invalid() {
        assert_eq!(Gradient::with_steps(&[], 3), Err(Error::EmptyGradient));
        assert_eq!(Gradient::with_steps(&[RED], 0), Err(Error::ZeroGradientSteps));
        assert_eq!(Gradient::new(&[RED, BLACK], &[]), Err(Error::ZeroGradientSteps));
    }

    #[test]
    fn fraction_lookup() {
        let g = Gradient::with_steps(&[BLACK, WHITE], 3).unwrap();
        assert_eq!(g.get_color_at_fraction(0.0), BLACK);
        assert_eq!(g.get_color_at_fraction(1.0), WHITE);
        assert_eq!(g.get_color_at_fraction(0.5), Color::Rgb(128, 128, 128));
        assert_eq!(g.get_color_at_fraction(7.0), WHITE);
    }

    #[test]
    fn vertical_mapping() {
        let g = Gradient::with_steps(&[BLACK, WHITE], 2).unwrap();
        let map = g.build_coordinate_color_mapping(2, 3, GradientDirection::Vertical);
        assert_eq!(map.len(), 6);
        assert_eq!(map[&Coord::new(1, 2)], WHITE);
        assert_eq!(map[&Coord::new(3, 2)], WHITE);
    }

    #[test]
    fn horizontal_mapping() {
        let g = Gradient::with_steps(&[BLACK, WHITE], 5).unwrap();
        let map = g.build_coordinate_color_mapping(1, 4, GradientDirection::Horizontal);
        assert_eq!(map[&Coord::new(4, 1)], WHITE);
    }

    #[test]
    fn radial_mapping_is_dark_at_center() {
        let g = Gradient::with_steps(&[BLACK, WHITE], 10).unwrap();
        let map = g.build_coordinate_color_mapping(5, 5, GradientDirection::Radial);
        assert_eq!(map[&Coord::new(3, 3)], BLACK);
        assert_eq!(map[&Coord::new(1, 1)], WHITE);
        assert_eq!(map[&Coord::new(5, 5)], WHITE);
    }
}
