//! Difficulty picker and the timed-session configurator modal.

use crate::exercise::Difficulty;
use crate::timer::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorChoice {
    Tier(Difficulty),
    OpenConfigurator,
}

/// Cursor over the three tiers. Rebuilt every time the picker is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifficultySelector {
    cursor: usize,
}

impl DifficultySelector {
    pub fn tiers(&self) -> &'static [Difficulty] {
        &Difficulty::ALL
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn highlighted(&self) -> Difficulty {
        Difficulty::ALL[self.cursor]
    }

    pub fn move_by(&mut self, delta: isize) {
        let len = Difficulty::ALL.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    pub fn choose(&self) -> SelectorChoice {
        SelectorChoice::Tier(self.highlighted())
    }

    /// 1-based shortcut, `None` when out of range.
    pub fn choose_number(&self, number: usize) -> Option<SelectorChoice> {
        number
            .checked_sub(1)
            .and_then(|idx| Difficulty::ALL.get(idx))
            .map(|d| SelectorChoice::Tier(*d))
    }
}

/// One entry of the duration menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationOption {
    pub secs: u64,
}

impl DurationOption {
    pub fn label(&self) -> String {
        if self.secs % 60 == 0 {
            format!("{} min", self.secs / 60)
        } else {
            format_clock(self.secs)
        }
    }

    pub fn description(&self) -> &'static str {
        match self.secs {
            0..=300 => "Quick warm-up",
            301..=600 => "Short session",
            601..=900 => "Focused practice",
            _ => "Full session",
        }
    }
}

/// Modal holding one pending duration choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configurator {
    options: Vec<DurationOption>,
    pending: Option<usize>,
}

impl Configurator {
    pub fn new(durations: &[u64]) -> Self {
        Self {
            options: durations
                .iter()
                .map(|&secs| DurationOption { secs })
                .collect(),
            pending: None,
        }
    }

    pub fn options(&self) -> &[DurationOption] {
        &self.options
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    pub fn pick(&mut self, index: usize) {
        if index < self.options.len() {
            self.pending = Some(index);
        }
    }

    pub fn move_by(&mut self, delta: isize) {
        let len = self.options.len() as isize;
        if len == 0 {
            return;
        }
        let next = match self.pending {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.pending = Some(next as usize);
    }

    pub fn can_confirm(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the modal; the caller drops it, so a confirmation emits once.
    pub fn confirm(self) -> Result<u64, Self> {
        let secs = self
            .pending
            .and_then(|idx| self.options.get(idx))
            .map(|option| option.secs);
        secs.ok_or(self)
    }
}
