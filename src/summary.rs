use serde::{Deserialize, Serialize};

use crate::timer::format_clock;

/// Running totals for a timed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    attempted: u32,
    correct: u32,
}

impl SessionStats {
    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn record(&mut self, is_correct: bool) {
        self.attempted += 1;
        if is_correct {
            self.correct += 1;
        }
    }
}

/// Rounded percentage; zero when nothing was attempted.
pub fn accuracy(correct: u32, attempted: u32) -> u32 {
    if attempted == 0 {
        return 0;
    }
    (100.0 * correct as f64 / attempted as f64).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    KeepPracticing,
}

impl Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent!",
            Grade::Good => "Very good!",
            Grade::Fair => "Good progress!",
            Grade::KeepPracticing => "Keep practicing!",
        }
    }
}

/// Lower accuracy bounds for each grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeBands {
    pub excellent: u32,
    pub good: u32,
    pub fair: u32,
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            excellent: 90,
            good: 70,
            fair: 50,
        }
    }
}

impl GradeBands {
    pub fn grade(&self, accuracy: u32) -> Grade {
        if accuracy >= self.excellent {
            Grade::Excellent
        } else if accuracy >= self.good {
            Grade::Good
        } else if accuracy >= self.fair {
            Grade::Fair
        } else {
            Grade::KeepPracticing
        }
    }
}

/// Frozen result of a finished timed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub attempted: u32,
    pub correct: u32,
    pub elapsed_secs: u64,
    pub duration_secs: u64,
    pub grade: Grade,
}

impl SessionSummary {
    pub fn new(stats: SessionStats, elapsed_secs: u64, duration_secs: u64, bands: &GradeBands) -> Self {
        Self {
            attempted: stats.attempted(),
            correct: stats.correct(),
            elapsed_secs,
            duration_secs,
            grade: bands.grade(accuracy(stats.correct(), stats.attempted())),
        }
    }

    pub fn accuracy(&self) -> u32 {
        accuracy(self.correct, self.attempted)
    }

    pub fn score_line(&self) -> String {
        format!("{}/{}", self.correct, self.attempted)
    }

    pub fn elapsed_line(&self) -> String {
        format_clock(self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_zero_attempts() {
        assert_eq!(accuracy(0, 0), 0);
    }

    #[test]
    fn test_accuracy_rounding() {
        assert_eq!(accuracy(3, 4), 75);
        assert_eq!(accuracy(2, 3), 67);
        assert_eq!(accuracy(1, 3), 33);
        assert_eq!(accuracy(5, 5), 100);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = SessionStats::default();
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.attempted(), 3);
        assert_eq!(stats.correct(), 2);
    }

    #[test]
    fn test_grade_bands() {
        let bands = GradeBands::default();
        assert_eq!(bands.grade(100), Grade::Excellent);
        assert_eq!(bands.grade(90), Grade::Excellent);
        assert_eq!(bands.grade(89), Grade::Good);
        assert_eq!(bands.grade(70), Grade::Good);
        assert_eq!(bands.grade(50), Grade::Fair);
        assert_eq!(bands.grade(49), Grade::KeepPracticing);
        assert_eq!(bands.grade(0), Grade::KeepPracticing);
    }

    #[test]
    fn test_custom_grade_bands() {
        let bands = GradeBands {
            excellent: 95,
            good: 80,
            fair: 60,
        };
        assert_eq!(bands.grade(90), Grade::Good);
        assert_eq!(bands.grade(59), Grade::KeepPracticing);
    }

    #[test]
    fn test_summary_lines() {
        let mut stats = SessionStats::default();
        stats.record(true);
        stats.record(true);
        stats.record(false);
        let summary = SessionSummary::new(stats, 125, 600, &GradeBands::default());
        assert_eq!(summary.accuracy(), 67);
        assert_eq!(summary.score_line(), "2/3");
        assert_eq!(summary.elapsed_line(), "2:05");
        assert_eq!(summary.grade, Grade::Fair);
    }
}
