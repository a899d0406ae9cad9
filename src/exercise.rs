use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

pub const OPTION_COUNT: usize = 4;
pub const OPTION_LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Warm up and review the basics",
            Difficulty::Medium => "Challenge yourself with intermediate questions",
            Difficulty::Hard => "For those looking for advanced problems",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Subject {
    Algebra,
    Geometry,
    Calculus,
    Statistics,
    Trigonometry,
    Arithmetic,
}

impl Subject {
    pub const ALL: [Subject; 6] = [
        Subject::Algebra,
        Subject::Geometry,
        Subject::Calculus,
        Subject::Statistics,
        Subject::Trigonometry,
        Subject::Arithmetic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Subject::Algebra => "Algebra",
            Subject::Geometry => "Geometry",
            Subject::Calculus => "Calculus",
            Subject::Statistics => "Statistics",
            Subject::Trigonometry => "Trigonometry",
            Subject::Arithmetic => "Arithmetic",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Subject::Algebra => "x²",
            Subject::Geometry => "△",
            Subject::Calculus => "∫",
            Subject::Statistics => "σ",
            Subject::Trigonometry => "θ",
            Subject::Arithmetic => "±",
        }
    }
}

/// One multiple-choice question. Immutable for the round it is shown in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl Exercise {
    /// Shown whenever the provider has nothing for the requested pair.
    pub fn fallback() -> Self {
        Self {
            question: "What is 2 + 2?".to_string(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: "4".to_string(),
            explanation: "2 + 2 = 4. Basic addition.".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), BankError> {
        let invalid = |reason: String| BankError::InvalidExercise {
            question: self.question.clone(),
            reason,
        };

        if self.options.len() != OPTION_COUNT {
            return Err(invalid(format!(
                "expected {} options, found {}",
                OPTION_COUNT,
                self.options.len()
            )));
        }
        if !self.options.iter().all_unique() {
            return Err(invalid("options are not distinct".to_string()));
        }
        if self.correct_answer_index().is_none() {
            return Err(invalid(format!(
                "correct answer `{}` is not one of the options",
                self.correct_answer
            )));
        }
        Ok(())
    }

    pub fn correct_answer_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}
