//! Exercise supply: the embedded question bank, the random pick seam, and
//! the provider the session fetches from.

use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::BankError;
use crate::exercise::{Difficulty, Exercise, Subject};

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/bank");

/// Source of exercises for a (subject, difficulty) pair.
pub trait ExerciseProvider: Send {
    /// `None` when there is nothing to offer for the pair.
    fn fetch(&mut self, subject: Subject, difficulty: Difficulty) -> Option<Exercise>;
}

/// Strategy for choosing one exercise among the candidates
pub trait ExercisePicker: Send {
    fn pick<'a>(&mut self, candidates: &'a [Exercise]) -> Option<&'a Exercise>;
}

/// Uniform pick from the thread RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl ExercisePicker for RandomPicker {
    fn pick<'a>(&mut self, candidates: &'a [Exercise]) -> Option<&'a Exercise> {
        candidates.choose(&mut rand::thread_rng())
    }
}

/// Reproducible pick sequence for a given seed
#[derive(Debug, Clone)]
pub struct SeededPicker {
    rng: StdRng,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ExercisePicker for SeededPicker {
    fn pick<'a>(&mut self, candidates: &'a [Exercise]) -> Option<&'a Exercise> {
        candidates.choose(&mut self.rng)
    }
}

/// On-disk shape of one subject's bank file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectBank {
    pub subject: Subject,
    #[serde(default)]
    pub exercises: HashMap<Difficulty, Vec<Exercise>>,
}

/// A user bank file holds either one subject or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum BankFile {
    Many(Vec<SubjectBank>),
    One(SubjectBank),
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseBank {
    entries: HashMap<(Subject, Difficulty), Vec<Exercise>>,
}

impl ExerciseBank {
    /// Bank compiled into the binary, one JSON file per subject.
    pub fn embedded() -> Result<Self, BankError> {
        let mut bank = Self::default();
        for subject in Subject::ALL {
            let file_name = format!("{subject}.json");
            let file = BANK_DIR
                .get_file(&file_name)
                .ok_or_else(|| BankError::MissingSubject(subject.to_string()))?;
            let contents = file
                .contents_utf8()
                .ok_or_else(|| BankError::Encoding(file_name.clone()))?;
            bank.merge(serde_json::from_str(contents)?);
        }
        Ok(bank)
    }

    /// User-supplied bank: one subject bank, or a JSON array of them.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BankError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, BankError> {
        let subjects = match serde_json::from_str(contents)? {
            BankFile::Many(subjects) => subjects,
            BankFile::One(subject) => vec![subject],
        };
        let mut bank = Self::default();
        for subject_bank in subjects {
            bank.merge(subject_bank);
        }
        Ok(bank)
    }

    /// Add a subject's exercises, dropping any that fail validation.
    pub fn merge(&mut self, subject_bank: SubjectBank) {
        let subject = subject_bank.subject;
        for (difficulty, exercises) in subject_bank.exercises {
            let valid = exercises.into_iter().filter(|ex| match ex.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(%subject, %difficulty, error = %err, "skipping exercise");
                    false
                }
            });
            self.entries
                .entry((subject, difficulty))
                .or_default()
                .extend(valid);
        }
    }

    pub fn candidates(&self, subject: Subject, difficulty: Difficulty) -> &[Exercise] {
        self.entries
            .get(&(subject, difficulty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Provider backed by an in-memory bank and a picker
pub struct BankProvider<P: ExercisePicker> {
    bank: ExerciseBank,
    picker: P,
}

impl<P: ExercisePicker> BankProvider<P> {
    pub fn new(bank: ExerciseBank, picker: P) -> Self {
        Self { bank, picker }
    }
}

impl<P: ExercisePicker> ExerciseProvider for BankProvider<P> {
    fn fetch(&mut self, subject: Subject, difficulty: Difficulty) -> Option<Exercise> {
        let candidates = self.bank.candidates(subject, difficulty);
        debug!(%subject, %difficulty, candidates = candidates.len(), "fetching exercise");
        self.picker.pick(candidates).cloned()
    }
}
