use crate::error::Result;
use crate::terminal::Terminal;

/// An effect wires the engine once, then feeds it work frame by frame.
pub trait Effect {
    /// One-time setup: paths, scenes and event bindings. Wiring mistakes
    /// surface here rather than mid-animation.
    fn build(&mut self, terminal: &mut Terminal) -> Result<()>;

    /// Called before every tick to activate whatever is due this frame.
    fn stage(&mut self, terminal: &mut Terminal);

    /// True once nothing is left to stage.
    fn is_complete(&self, terminal: &Terminal) -> bool;
}

/// Pulls frames out of an [`Effect`].
///
/// Each item is one rendered frame. Once the effect is complete and every
/// character has settled, one final frame is yielded and iteration ends.
#[derive(Debug)]
pub struct EffectIterator<E> {
    effect: E,
    terminal: Terminal,
    finished: bool,
}

impl<E: Effect> EffectIterator<E> {
    pub fn new(mut effect: E, mut terminal: Terminal) -> Result<Self> {
        effect.build(&mut terminal)?;
        Ok(Self {
            effect,
            terminal,
            finished: false,
        })
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }
}

impl<E: Effect> Iterator for EffectIterator<E> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.effect.is_complete(&self.terminal) && !self.terminal.has_active_characters() {
            self.finished = true;
            return Some(self.terminal.render_formatted());
        }
        self.effect.stage(&mut self.terminal);
        self.terminal.tick();
        Some(self.terminal.render_formatted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::SyncMetric;
    use crate::character::CharacterId;
    use crate::terminal::TerminalConfig;

    /// Reveals one character per frame, each flashing '#' for two ticks.
    struct Reveal {
        pending: Vec<CharacterId>,
    }

    impl Effect for Reveal {
        fn build(&mut self, terminal: &mut Terminal) -> Result<()> {
            for id in terminal.get_characters(false) {
                let symbol = terminal[id].input_symbol();
                let scene = terminal[id]
                    .animation
                    .new_scene(Some("flash"), SyncMetric::Step, None)?;
                scene.add_frame('#', 2, None)?;
                scene.add_frame(symbol, 1, None)?;
                self.pending.push(id);
            }
            self.pending.reverse();
            Ok(())
        }

        fn stage(&mut self, terminal: &mut Terminal) {
            if let Some(id) = self.pending.pop() {
                terminal.set_character_visibility(id, true);
                terminal[id].activate_scene("flash").unwrap();
            }
        }

        fn is_complete(&self, _: &Terminal) -> bool {
            self.pending.is_empty()
        }
    }

    fn plain() -> TerminalConfig {
        TerminalConfig {
            no_color: true,
            ..Default::default()
        }
    }

    #[test]
    fn frames_then_one_settled_frame() {
        let terminal = Terminal::new("ab", plain());
        let frames: Vec<String> = EffectIterator::new(Reveal { pending: vec![] }, terminal)
            .unwrap()
            .collect();
        assert_eq!(frames, vec!["# ", "##", "a#", "ab", "ab"]);
    }

    #[test]
    fn exhausted_iterator_stays_exhausted() {
        let terminal = Terminal::new("", plain());
        let mut iter = EffectIterator::new(Reveal { pending: vec![] }, terminal).unwrap();
        assert_eq!(iter.next(), Some(" ".to_string()));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }
}
