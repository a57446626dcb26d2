use std::collections::{BTreeMap, HashMap};
use std::ops::{Index, IndexMut};

use log::debug;

use crate::animation::CharacterVisual;
use crate::canvas::Canvas;
use crate::character::{CharacterId, EffectCharacter};
use crate::colors::{to_ansi_rel, Color, ANSI_RESET};
use crate::geometry::Coord;

/// Rendering and layout options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Number of spaces a tab in the input expands to.
    pub tab_width: usize,
    /// Emit RGB colors as their nearest xterm-256 palette index.
    pub xterm_colors: bool,
    /// Render without any escape sequences.
    pub no_color: bool,
    /// Override the canvas width derived from the input.
    pub canvas_width: Option<usize>,
    /// Override the canvas height derived from the input.
    pub canvas_height: Option<usize>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            xterm_colors: false,
            no_color: false,
            canvas_width: None,
            canvas_height: None,
        }
    }
}

/// Spatial orderings used to stage reveals and wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterGroup {
    ColumnLeftToRight,
    ColumnRightToLeft,
    RowTopToBottom,
    RowBottomToTop,
    DiagonalTopLeftToBottomRight,
    DiagonalBottomLeftToTopRight,
    DiagonalTopRightToBottomLeft,
    DiagonalBottomRightToTopLeft,
    CenterToOutsideDiamonds,
    OutsideToCenterDiamonds,
}

/// Registry of every character of an effect plus the canvas they render to.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    config: TerminalConfig,
    canvas: Canvas,
    characters: Vec<EffectCharacter>,
    input_characters: Vec<CharacterId>,
    fill_characters: Vec<CharacterId>,
    added_characters: Vec<CharacterId>,
    by_input_coord: HashMap<Coord, CharacterId>,
    clock: u64,
}

impl Terminal {
    /// Lays out `input` on a canvas, top line on the highest row.
    ///
    /// Every non-whitespace glyph becomes an input character; every other
    /// cell of the canvas gets a blank fill character. All characters start
    /// invisible.
    pub fn new(input: &str, config: TerminalConfig) -> Self {
        let tab = " ".repeat(config.tab_width);
        let lines: Vec<Vec<char>> = input
            .lines()
            .map(|line| line.replace('\t', &tab).chars().collect())
            .collect();
        let width = config
            .canvas_width
            .unwrap_or_else(|| lines.iter().map(Vec::len).max().unwrap_or(0));
        let height = config.canvas_height.unwrap_or(lines.len());
        let canvas = Canvas::new(width, height);

        let mut terminal = Self {
            config,
            canvas,
            characters: Vec::new(),
            input_characters: Vec::new(),
            fill_characters: Vec::new(),
            added_characters: Vec::new(),
            by_input_coord: HashMap::new(),
            clock: 0,
        };
        for (i, line) in lines.iter().enumerate() {
            let row = canvas.top - i as i32;
            for (j, symbol) in line.iter().enumerate() {
                if symbol.is_whitespace() {
                    continue;
                }
                let coord = Coord::new(j as i32 + 1, row);
                let id = terminal.push_character(*symbol, coord);
                terminal.input_characters.push(id);
                terminal.by_input_coord.insert(coord, id);
            }
        }
        for row in (canvas.bottom..=canvas.top).rev() {
            for column in canvas.left..=canvas.right {
                let coord = Coord::new(column, row);
                if terminal.by_input_coord.contains_key(&coord) {
                    continue;
                }
                let id = terminal.push_character(' ', coord);
                terminal.fill_characters.push(id);
                terminal.by_input_coord.insert(coord, id);
            }
        }
        debug!(
            "terminal {}x{}: {} input characters, {} fill characters",
            canvas.width(),
            canvas.height(),
            terminal.input_characters.len(),
            terminal.fill_characters.len()
        );
        terminal
    }

    fn push_character(&mut self, symbol: char, coord: Coord) -> CharacterId {
        let id = CharacterId(self.characters.len());
        self.characters
            .push(EffectCharacter::new(id, symbol, coord));
        id
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Input characters in reading order, followed by fill characters when
    /// `fill_chars` is set.
    pub fn get_characters(&self, fill_chars: bool) -> Vec<CharacterId> {
        let mut ids = self.input_characters.clone();
        if fill_chars {
            ids.extend_from_slice(&self.fill_characters);
        }
        ids
    }

    /// Characters created by [`Terminal::add_character`].
    pub fn added_characters(&self) -> &[CharacterId] {
        &self.added_characters
    }

    /// Creates a character that is not part of the input text.
    pub fn add_character(&mut self, symbol: char, coord: Coord) -> CharacterId {
        let id = self.push_character(symbol, coord);
        self.added_characters.push(id);
        id
    }

    pub fn get(&self, id: CharacterId) -> Option<&EffectCharacter> {
        self.characters.get(id.0)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut EffectCharacter> {
        self.characters.get_mut(id.0)
    }

    pub fn characters(&self) -> impl Iterator<Item = &EffectCharacter> {
        self.characters.iter()
    }

    /// The input or fill character placed at `coord` by the input layout.
    pub fn get_character_by_input_coord(&self, coord: Coord) -> Option<CharacterId> {
        self.by_input_coord.get(&coord).copied()
    }

    /// Shows or hides a character. Activity is unaffected.
    pub fn set_character_visibility(&mut self, id: CharacterId, is_visible: bool) {
        self.clock += 1;
        let clock = self.clock;
        let character = &mut self[id];
        if is_visible && !character.is_visible {
            character.activation_stamp = clock;
        }
        character.is_visible = is_visible;
    }

    pub fn visible_characters(&self) -> impl Iterator<Item = &EffectCharacter> {
        self.characters.iter().filter(|c| c.is_visible)
    }

    pub fn has_active_characters(&self) -> bool {
        self.characters.iter().any(EffectCharacter::is_active)
    }

    /// Partitions the input characters (and fill characters when asked)
    /// into ordered groups.
    pub fn get_characters_grouped(
        &self,
        grouping: CharacterGroup,
        fill_chars: bool,
    ) -> Vec<Vec<CharacterId>> {
        let center = self.canvas.center();
        let key = |coord: Coord| -> i32 {
            use CharacterGroup::*;
            match grouping {
                ColumnLeftToRight | ColumnRightToLeft => coord.column,
                RowTopToBottom | RowBottomToTop => coord.row,
                DiagonalTopLeftToBottomRight | DiagonalBottomRightToTopLeft => {
                    coord.column - coord.row
                }
                DiagonalBottomLeftToTopRight | DiagonalTopRightToBottomLeft => {
                    coord.column + coord.row
                }
                CenterToOutsideDiamonds | OutsideToCenterDiamonds => {
                    (coord.column - center.column).abs() + (coord.row - center.row).abs()
                }
            }
        };
        let mut groups: BTreeMap<i32, Vec<CharacterId>> = BTreeMap::new();
        for id in self.get_characters(fill_chars) {
            groups
                .entry(key(self[id].input_coord()))
                .or_default()
                .push(id);
        }
        let descending = matches!(
            grouping,
            CharacterGroup::ColumnRightToLeft
                | CharacterGroup::RowTopToBottom
                | CharacterGroup::DiagonalBottomRightToTopLeft
                | CharacterGroup::DiagonalTopRightToBottomLeft
                | CharacterGroup::OutsideToCenterDiamonds
        );
        let mut groups: Vec<Vec<CharacterId>> = groups.into_values().collect();
        if descending {
            groups.reverse();
        }
        groups
    }

    /// Advances every active character by one tick.
    ///
    /// All characters move and animate first; event cascades run only once
    /// every character has advanced.
    pub fn tick(&mut self) {
        self.stamp_activations();
        let active: Vec<usize> = (0..self.characters.len())
            .filter(|&i| self.characters[i].is_active())
            .collect();
        for &i in &active {
            self.characters[i].advance();
        }
        for &i in &active {
            self.characters[i].resolve_events();
        }
        self.stamp_activations();
    }

    fn stamp_activations(&mut self) {
        for character in &mut self.characters {
            if character.take_activated() {
                self.clock += 1;
                character.activation_stamp = self.clock;
            }
        }
    }

    /// The visible character drawn on top of each canvas cell, rows from
    /// top to bottom.
    fn compose(&self) -> Vec<Vec<Option<CharacterVisual>>> {
        let mut grid = vec![vec![None; self.canvas.width()]; self.canvas.height()];
        let mut visible: Vec<&EffectCharacter> = self.visible_characters().collect();
        visible.sort_by_key(|c| (c.layer, c.activation_stamp, c.id()));
        for character in visible {
            let coord = character.current_coord();
            if !self.canvas.coord_is_in_canvas(coord) {
                continue;
            }
            let row = (self.canvas.top - coord.row) as usize;
            let column = (coord.column - self.canvas.left) as usize;
            grid[row][column] = Some(character.visual());
        }
        grid
    }

    /// Plain text of the current frame.
    pub fn render(&self) -> String {
        self.compose()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(' ', |v| v.symbol))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The current frame with ANSI foreground colors.
    pub fn render_formatted(&self) -> String {
        if self.config.no_color {
            return self.render();
        }
        let grid = self.compose();
        let mut acum = String::new();
        for (r, row) in grid.iter().enumerate() {
            let mut prev: Option<Option<Color>> = None;
            for cell in row {
                let (symbol, color) = cell.map_or((' ', None), |v| (v.symbol, v.color));
                let color = match color {
                    Some(c) if self.config.xterm_colors => Some(Color::Xterm(c.to_xterm())),
                    _ => color,
                };
                acum += &to_ansi_rel(color, &prev);
                prev = Some(color);
                acum.push(symbol);
            }
            acum += ANSI_RESET;
            if r + 1 < grid.len() {
                acum += "\n";
            }
        }
        acum
    }
}

impl Index<CharacterId> for Terminal {
    type Output = EffectCharacter;
    fn index(&self, id: CharacterId) -> &EffectCharacter {
        &self.characters[id.0]
    }
}

impl IndexMut<CharacterId> for Terminal {
    fn index_mut(&mut self, id: CharacterId) -> &mut EffectCharacter {
        &mut self.characters[id.0]
    }
}
