use crate::exercise::{Exercise, OPTION_LETTERS};

/// Tentative answer for the current round.
///
/// `selected` can only change while `submitted` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerState {
    selected: Option<usize>,
    submitted: bool,
}

impl AnswerState {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}

/// Emitted once per round when the answer is locked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub answer: String,
    pub is_correct: bool,
}

/// How an option is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Idle,
    Selected,
    Correct,
    WronglySelected,
    Other,
}

/// One exercise plus the user's answer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    exercise: Exercise,
    answer: AnswerState,
}

impl Round {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            answer: AnswerState::default(),
        }
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn answer(&self) -> &AnswerState {
        &self.answer
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.answer
            .selected
            .and_then(|idx| self.exercise.options.get(idx))
            .map(String::as_str)
    }

    /// Returns false when the click was ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if self.answer.submitted || index >= self.exercise.options.len() {
            return false;
        }
        self.answer.selected = Some(index);
        true
    }

    /// Move the selection by `delta`, wrapping. Starts at the first option.
    pub fn cycle(&mut self, delta: isize) -> bool {
        let len = self.exercise.options.len() as isize;
        if len == 0 {
            return false;
        }
        let next = match self.answer.selected {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.select(next as usize)
    }

    pub fn can_submit(&self) -> bool {
        !self.answer.submitted && self.answer.selected.is_some()
    }

    /// Lock the answer. `None` when there is nothing to submit or it was already submitted.
    pub fn submit(&mut self) -> Option<SubmittedAnswer> {
        if !self.can_submit() {
            return None;
        }
        let answer = self.selected_text()?.to_string();
        self.answer.submitted = true;
        Some(SubmittedAnswer {
            is_correct: self.exercise.is_correct(&answer),
            answer,
        })
    }

    pub fn mark(&self, index: usize) -> OptionMark {
        let selected = self.answer.selected == Some(index);
        if !self.answer.submitted {
            return if selected {
                OptionMark::Selected
            } else {
                OptionMark::Idle
            };
        }

        let is_correct = self
            .exercise
            .options
            .get(index)
            .is_some_and(|o| self.exercise.is_correct(o));
        match (is_correct, selected) {
            (true, _) => OptionMark::Correct,
            (false, true) => OptionMark::WronglySelected,
            (false, false) => OptionMark::Other,
        }
    }

    /// Letter, text and mark for every option, in order.
    pub fn option_rows(&self) -> Vec<(char, &str, OptionMark)> {
        self.exercise
            .options
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let letter = OPTION_LETTERS.get(idx).copied().unwrap_or('?');
                (letter, text.as_str(), self.mark(idx))
            })
            .collect()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.answer
            .submitted
            .then_some(self.exercise.explanation.as_str())
    }
}
