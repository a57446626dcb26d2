//! Some characters start in each other's place, flash an error and are
//! corrected pair by pair.
//!
//! Usage: `cargo run --example errorcorrect [FILE]`

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::{env, fs, thread, time::Duration};

use rand::seq::SliceRandom;
use rand::thread_rng;
use textfx::{
    Action, CharacterId, Color, Effect, EffectIterator, Event, Gradient, GradientDirection,
    PathId, Result, SceneId, SyncMetric, Terminal, TerminalConfig,
};

const SAMPLE: &str = "\
Error correction swaps every misplaced
character back where it belongs, one
pair at a time.";

const BLOCK_WIPE_START: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BLOCK_WIPE_END: [char; 7] = ['▇', '▆', '▅', '▄', '▃', '▂', '▁'];

struct ErrorCorrect {
    error_pairs: f64,
    swap_delay: usize,
    error_color: Color,
    correct_color: Color,
    final_gradient: Gradient,
    movement_speed: f64,

    swapped: VecDeque<(CharacterId, CharacterId)>,
    delay: usize,
}

impl ErrorCorrect {
    fn new() -> Result<Self> {
        Ok(Self {
            error_pairs: 0.1,
            swap_delay: 10,
            error_color: "e74c3c".parse()?,
            correct_color: "45bf55".parse()?,
            final_gradient: Gradient::with_steps(
                &["8A008A".parse::<Color>()?, "00D1FF".parse()?, "FFFFFF".parse()?],
                12,
            )?,
            movement_speed: 0.5,
            swapped: VecDeque::new(),
            delay: 0,
        })
    }

    fn wire_swapped(
        &self,
        terminal: &mut Terminal,
        id: CharacterId,
        final_color: Color,
    ) -> Result<()> {
        let correcting = Gradient::with_steps(&[self.error_color, self.correct_color], 10)?;
        let settling = Gradient::with_steps(&[self.correct_color, final_color], 10)?;
        let character = &mut terminal[id];
        let symbol = character.input_symbol();

        let first_wipe = character
            .animation
            .new_scene(Some("first_wipe"), SyncMetric::Step, None)?;
        for block in BLOCK_WIPE_START {
            first_wipe.add_frame(block, 3, Some(self.error_color))?;
        }
        let last_wipe = character
            .animation
            .new_scene(Some("last_wipe"), SyncMetric::Step, None)?;
        for block in BLOCK_WIPE_END {
            last_wipe.add_frame(block, 3, Some(self.correct_color))?;
        }
        let initial = character
            .animation
            .new_scene(Some("initial"), SyncMetric::Step, None)?;
        initial.add_frame(symbol, 1, Some(self.error_color))?;
        let error = character
            .animation
            .new_scene(Some("error"), SyncMetric::Step, None)?;
        for _ in 0..10 {
            error.add_frame('▓', 3, Some(self.error_color))?;
            error.add_frame(symbol, 3, Some(Color::Rgb(255, 255, 255)))?;
        }
        character
            .animation
            .new_scene(Some("correcting"), SyncMetric::Distance, None)?
            .apply_gradient_to_symbols(&correcting, '█', 3)?;
        character
            .animation
            .new_scene(Some("final"), SyncMetric::Step, None)?
            .apply_gradient_to_symbols(&settling, symbol, 3)?;
        character.activate_scene("initial")?;

        let home = PathId::from("input_coord");
        let scene = |id: &str| SceneId::from(id);
        character.register_event(
            Event::SceneComplete,
            scene("error"),
            Action::ActivateScene(scene("first_wipe")),
        )?;
        character.register_event(
            Event::SceneComplete,
            scene("first_wipe"),
            Action::ActivateScene(scene("correcting")),
        )?;
        character.register_event(
            Event::SceneComplete,
            scene("first_wipe"),
            Action::ActivatePath(home.clone()),
        )?;
        character.register_event(Event::PathActivated, home.clone(), Action::SetLayer(1))?;
        character.register_event(Event::PathComplete, home.clone(), Action::SetLayer(0))?;
        character.register_event(
            Event::PathComplete,
            home,
            Action::ActivateScene(scene("last_wipe")),
        )?;
        character.register_event(
            Event::SceneComplete,
            scene("last_wipe"),
            Action::ActivateScene(scene("final")),
        )?;
        Ok(())
    }
}

impl Effect for ErrorCorrect {
    fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
        let canvas = terminal.canvas();
        let mapping = self.final_gradient.build_coordinate_color_mapping(
            canvas.top,
            canvas.right,
            GradientDirection::Vertical,
        );
        let mut final_colors = HashMap::new();
        for id in terminal.get_characters(false) {
            let character = &mut terminal[id];
            let color = mapping
                .get(&character.input_coord())
                .copied()
                .unwrap_or(self.correct_color);
            final_colors.insert(id, color);
            let symbol = character.input_symbol();
            character
                .animation
                .new_scene(Some("spawn"), SyncMetric::Step, None)?
                .add_frame(symbol, 1, Some(color))?;
            character.activate_scene("spawn")?;
            terminal.set_character_visibility(id, true);
        }

        let mut pool = terminal.get_characters(false);
        pool.shuffle(&mut thread_rng());
        let pairs = (self.error_pairs * pool.len() as f64) as usize;
        for pair in pool.chunks_exact(2).take(pairs) {
            let (a, b) = (pair[0], pair[1]);
            let (home_a, home_b) = (terminal[a].input_coord(), terminal[b].input_coord());
            for (id, start, home) in [(a, home_b, home_a), (b, home_a, home_b)] {
                let character = &mut terminal[id];
                character.motion.set_coordinate(start);
                character
                    .motion
                    .new_path(self.movement_speed, None, Some("input_coord"))?
                    .new_waypoint(home, None);
                self.wire_swapped(terminal, id, final_colors[&id])?;
            }
            self.swapped.push_back((a, b));
        }
        Ok(())
    }

    fn stage(&mut self, terminal: &mut Terminal) {
        if self.delay > 0 {
            self.delay -= 1;
            return;
        }
        let Some((a, b)) = self.swapped.pop_front() else {
            return;
        };
        for id in [a, b] {
            if let Err(err) = terminal[id].activate_scene("error") {
                log::error!("{}", err);
            }
        }
        self.delay = self.swap_delay;
    }

    fn is_complete(&self, _: &Terminal) -> bool {
        self.swapped.is_empty()
    }
}

fn main() {
    let input = match env::args().nth(1) {
        Some(path) => fs::read_to_string(path).unwrap(),
        None => SAMPLE.to_string(),
    };
    let terminal = Terminal::new(&input, TerminalConfig::default());
    let frames = EffectIterator::new(ErrorCorrect::new().unwrap(), terminal).unwrap();

    let mut stdout = std::io::stdout();
    for frame in frames {
        // clear, home, draw
        write!(stdout, "\x1b[2J\x1b[H{}", frame).unwrap();
        stdout.flush().unwrap();
        thread::sleep(Duration::from_millis(16));
    }
    writeln!(stdout).unwrap();
}
