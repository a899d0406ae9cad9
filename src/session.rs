//! Practice session state machine.
//!
//! [`PracticeSession`] owns every piece of mutable practice state: the two
//! timers, the current round, the session totals and the active screen.
//! Views never touch it directly; they turn user input into [`Intent`]s and
//! the session reduces each one, returning the [`Effect`]s (fetches, writes)
//! the caller has to carry out. Results of those effects come back as
//! intents tagged with the [`Ticket`] they were issued under, which lets the
//! session drop replies that belong to a screen the user already left.
//!
//! ```text
//! Selecting --tier--> Practicing{AwaitingGeneration -> Presenting -> Submitted -> ...}
//!     ^   \--duration--/        |                                   |
//!     |                         +--exit-----------------------------+--> Selecting
//!     +--continue-- Summary <---+--session timer expired
//! ```

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::exercise::{Difficulty, Exercise, Subject};
use crate::presenter::Round;
use crate::selector::{Configurator, DifficultySelector, SelectorChoice};
use crate::stats::AttemptRecord;
use crate::summary::{accuracy, GradeBands, SessionStats, SessionSummary};
use crate::timer::{Timer, TimerEvent};

const NOTICE_SECS: u8 = 3;

/// Identifies the visit and round an async request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    visit: u64,
    round: u64,
}

impl Ticket {
    pub fn visit(&self) -> u64 {
        self.visit
    }
}

/// What the user picked on the selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub duration_secs: Option<u64>,
}

impl SessionConfig {
    pub fn is_timed(&self) -> bool {
        self.duration_secs.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingGeneration { in_flight: Option<Ticket> },
    Presenting(Round),
    Submitted(Round),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Practice {
    pub config: SessionConfig,
    pub phase: Phase,
}

impl Practice {
    pub fn round(&self) -> Option<&Round> {
        match &self.phase {
            Phase::Presenting(round) | Phase::Submitted(round) => Some(round),
            Phase::AwaitingGeneration { .. } => None,
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::AwaitingGeneration { in_flight: Some(_) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Selecting {
        selector: DifficultySelector,
        configurator: Option<Configurator>,
    },
    Practicing(Practice),
    Summary(SessionSummary),
}

impl Screen {
    fn selecting(configurator: Option<Configurator>) -> Self {
        Screen::Selecting {
            selector: DifficultySelector::default(),
            configurator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Transient one-line message, gone after a few clock seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    ttl: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub subject: Subject,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReply {
    pub ticket: Ticket,
    pub exercise: Option<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReply {
    pub ticket: Ticket,
    pub result: Result<(), String>,
}

/// Row appended to the session log when a timed session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub finished_at: DateTime<Local>,
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    pub elapsed_secs: u64,
    pub attempted: u32,
    pub correct: u32,
    pub accuracy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CycleSubject(isize),
    HighlightTier(isize),
    ChooseHighlightedTier,
    ChooseTierNumber(usize),
    ChooseTier(Difficulty),
    OpenConfigurator,
    MoveDuration(isize),
    PickDuration(usize),
    ConfirmDuration,
    CancelConfigurator,
    RequestExercise,
    SelectOption(usize),
    CycleOption(isize),
    Submit,
    Next,
    ToggleExerciseTimer,
    ExitToSelection,
    Continue,
    NewSession,
    ClockSecond,
    ExerciseArrived(FetchReply),
    AttemptSaved(PersistReply),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    RecordAttempt { ticket: Ticket, record: AttemptRecord },
    SessionEnded(SessionRecord),
}

/// Knobs that come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub durations: Vec<u64>,
    pub timed_difficulty: Difficulty,
    pub grade_bands: GradeBands,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            durations: vec![300, 600, 900, 1800],
            timed_difficulty: Difficulty::Medium,
            grade_bands: GradeBands::default(),
        }
    }
}

#[derive(Debug)]
pub struct PracticeSession {
    subject: Subject,
    settings: SessionSettings,
    screen: Screen,
    stats: SessionStats,
    exercise_timer: Timer,
    session_timer: Timer,
    visit: u64,
    round_seq: u64,
    notice: Option<Notice>,
}

impl PracticeSession {
    pub fn new(subject: Subject, settings: SessionSettings) -> Self {
        Self {
            subject,
            settings,
            screen: Screen::selecting(None),
            stats: SessionStats::default(),
            exercise_timer: Timer::count_up(),
            session_timer: Timer::count_down(0),
            visit: 0,
            round_seq: 0,
            notice: None,
        }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn exercise_timer(&self) -> &Timer {
        &self.exercise_timer
    }

    pub fn session_timer(&self) -> &Timer {
        &self.session_timer
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn practice(&self) -> Option<&Practice> {
        match &self.screen {
            Screen::Practicing(practice) => Some(practice),
            _ => None,
        }
    }

    /// True while the configurator modal is open.
    pub fn configurator_open(&self) -> bool {
        matches!(
            self.screen,
            Screen::Selecting {
                configurator: Some(_),
                ..
            }
        )
    }

    /// Reduce a batch of intents that arrived together. Clock pulses go last
    /// so an answer submitted in the same tick as expiry is still counted.
    pub fn process(&mut self, mut intents: Vec<Intent>) -> Vec<Effect> {
        intents.sort_by_key(|intent| matches!(intent, Intent::ClockSecond));
        intents
            .into_iter()
            .flat_map(|intent| self.dispatch(intent))
            .collect()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::CycleSubject(delta) => {
                self.cycle_subject(delta);
                vec![]
            }
            Intent::HighlightTier(delta) => {
                if let Screen::Selecting {
                    selector,
                    configurator: None,
                } = &mut self.screen
                {
                    selector.move_by(delta);
                }
                vec![]
            }
            Intent::ChooseHighlightedTier => match &self.screen {
                Screen::Selecting {
                    selector,
                    configurator: None,
                } => {
                    let choice = selector.choose();
                    self.on_selector_choice(choice)
                }
                _ => vec![],
            },
            Intent::ChooseTierNumber(number) => match &self.screen {
                Screen::Selecting {
                    selector,
                    configurator: None,
                } => match selector.choose_number(number) {
                    Some(choice) => self.on_selector_choice(choice),
                    None => vec![],
                },
                _ => vec![],
            },
            Intent::ChooseTier(difficulty) => {
                self.on_selector_choice(SelectorChoice::Tier(difficulty))
            }
            Intent::OpenConfigurator => self.on_selector_choice(SelectorChoice::OpenConfigurator),
            Intent::MoveDuration(delta) => {
                if let Screen::Selecting {
                    configurator: Some(configurator),
                    ..
                } = &mut self.screen
                {
                    configurator.move_by(delta);
                }
                vec![]
            }
            Intent::PickDuration(index) => {
                if let Screen::Selecting {
                    configurator: Some(configurator),
                    ..
                } = &mut self.screen
                {
                    configurator.pick(index);
                }
                vec![]
            }
            Intent::ConfirmDuration => self.confirm_duration(),
            Intent::CancelConfigurator => {
                if let Screen::Selecting { configurator, .. } = &mut self.screen {
                    *configurator = None;
                }
                vec![]
            }
            Intent::RequestExercise => self.request_exercise(),
            Intent::SelectOption(index) => {
                if let Some(round) = self.presenting_round_mut() {
                    round.select(index);
                }
                vec![]
            }
            Intent::CycleOption(delta) => {
                if let Some(round) = self.presenting_round_mut() {
                    round.cycle(delta);
                }
                vec![]
            }
            Intent::Submit => self.submit(),
            Intent::Next => self.next(),
            Intent::ToggleExerciseTimer => {
                self.toggle_exercise_timer();
                vec![]
            }
            Intent::ExitToSelection => {
                self.exit_to_selection();
                vec![]
            }
            Intent::Continue => {
                if matches!(self.screen, Screen::Summary(_)) {
                    self.stats = SessionStats::default();
                    self.screen = Screen::selecting(None);
                }
                vec![]
            }
            Intent::NewSession => {
                if matches!(self.screen, Screen::Summary(_)) {
                    self.stats = SessionStats::default();
                    self.screen =
                        Screen::selecting(Some(Configurator::new(&self.settings.durations)));
                }
                vec![]
            }
            Intent::ClockSecond => self.on_clock_second(),
            Intent::ExerciseArrived(reply) => {
                self.on_exercise_arrived(reply);
                vec![]
            }
            Intent::AttemptSaved(reply) => {
                self.on_attempt_saved(reply);
                vec![]
            }
        }
    }

    fn cycle_subject(&mut self, delta: isize) {
        if !matches!(
            self.screen,
            Screen::Selecting {
                configurator: None,
                ..
            }
        ) {
            return;
        }
        let all = Subject::ALL;
        let idx = all.iter().position(|s| *s == self.subject).unwrap_or(0) as isize;
        let next = (idx + delta).rem_euclid(all.len() as isize) as usize;
        self.subject = all[next];
    }

    fn on_selector_choice(&mut self, choice: SelectorChoice) -> Vec<Effect> {
        let Screen::Selecting { configurator, .. } = &mut self.screen else {
            return vec![];
        };
        if configurator.is_some() {
            return vec![];
        }

        match choice {
            SelectorChoice::Tier(difficulty) => {
                self.enter_practice(SessionConfig {
                    difficulty,
                    duration_secs: None,
                });
            }
            SelectorChoice::OpenConfigurator => {
                *configurator = Some(Configurator::new(&self.settings.durations));
            }
        }
        vec![]
    }

    fn confirm_duration(&mut self) -> Vec<Effect> {
        let Screen::Selecting { configurator, .. } = &mut self.screen else {
            return vec![];
        };
        let Some(modal) = configurator.take() else {
            return vec![];
        };

        match modal.confirm() {
            Ok(secs) => {
                self.stats = SessionStats::default();
                self.session_timer.set_total(secs);
                self.session_timer.reset(secs);
                self.session_timer.start();
                self.enter_practice(SessionConfig {
                    difficulty: self.settings.timed_difficulty,
                    duration_secs: Some(secs),
                });
            }
            Err(modal) => *configurator = Some(modal),
        }
        vec![]
    }

    fn enter_practice(&mut self, config: SessionConfig) {
        self.visit += 1;
        self.exercise_timer.pause();
        self.exercise_timer.reset(0);
        info!(
            subject = %self.subject,
            difficulty = %config.difficulty,
            timed = ?config.duration_secs,
            "entering practice"
        );
        self.screen = Screen::Practicing(Practice {
            config,
            phase: Phase::AwaitingGeneration { in_flight: None },
        });
    }

    fn request_exercise(&mut self) -> Vec<Effect> {
        let subject = self.subject;
        let visit = self.visit;
        let Screen::Practicing(practice) = &mut self.screen else {
            return vec![];
        };
        let Phase::AwaitingGeneration { in_flight } = &mut practice.phase else {
            return vec![];
        };
        if in_flight.is_some() {
            return vec![];
        }

        self.round_seq += 1;
        let ticket = Ticket {
            visit,
            round: self.round_seq,
        };
        *in_flight = Some(ticket);
        vec![Effect::Fetch(FetchRequest {
            ticket,
            subject,
            difficulty: practice.config.difficulty,
        })]
    }

    fn on_exercise_arrived(&mut self, reply: FetchReply) {
        let Screen::Practicing(practice) = &mut self.screen else {
            debug!(ticket = ?reply.ticket, "dropping exercise for a closed practice screen");
            return;
        };
        if practice.phase
            != (Phase::AwaitingGeneration {
                in_flight: Some(reply.ticket),
            })
        {
            debug!(ticket = ?reply.ticket, "dropping stale exercise");
            return;
        }

        let exercise = reply.exercise.unwrap_or_else(|| {
            info!(
                subject = %self.subject,
                difficulty = %practice.config.difficulty,
                "no exercise available, using fallback"
            );
            Exercise::fallback()
        });
        practice.phase = Phase::Presenting(Round::new(exercise));
        self.exercise_timer.reset(0);
        self.exercise_timer.start();
    }

    fn presenting_round_mut(&mut self) -> Option<&mut Round> {
        match &mut self.screen {
            Screen::Practicing(Practice {
                phase: Phase::Presenting(round),
                ..
            }) => Some(round),
            _ => None,
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        let subject = self.subject;
        let visit = self.visit;
        let Screen::Practicing(practice) = &mut self.screen else {
            return vec![];
        };
        let Phase::Presenting(round) = &mut practice.phase else {
            return vec![];
        };
        let Some(submitted) = round.submit() else {
            return vec![];
        };

        self.exercise_timer.pause();
        if practice.config.is_timed() {
            self.stats.record(submitted.is_correct);
        }

        let exercise = round.exercise().clone();
        self.notice = Some(Notice {
            text: if submitted.is_correct {
                "Correct answer!".to_string()
            } else {
                format!("Incorrect. The correct answer was: {}", exercise.correct_answer)
            },
            kind: if submitted.is_correct {
                NoticeKind::Success
            } else {
                NoticeKind::Failure
            },
            ttl: NOTICE_SECS,
        });

        let record = AttemptRecord {
            subject,
            difficulty: practice.config.difficulty,
            exercise,
            user_answer: submitted.answer,
            is_correct: submitted.is_correct,
            time_spent_secs: self.exercise_timer.value(),
            timestamp: Local::now(),
        };

        let phase = std::mem::replace(
            &mut practice.phase,
            Phase::AwaitingGeneration { in_flight: None },
        );
        if let Phase::Presenting(round) = phase {
            practice.phase = Phase::Submitted(round);
        }

        self.round_seq += 1;
        vec![Effect::RecordAttempt {
            ticket: Ticket {
                visit,
                round: self.round_seq,
            },
            record,
        }]
    }

    fn next(&mut self) -> Vec<Effect> {
        let Screen::Practicing(practice) = &mut self.screen else {
            return vec![];
        };
        if !matches!(practice.phase, Phase::Submitted(_)) {
            return vec![];
        }
        if practice.config.is_timed() && self.session_timer.value() == 0 {
            return self.finish_session();
        }

        practice.phase = Phase::AwaitingGeneration { in_flight: None };
        self.request_exercise()
    }

    fn toggle_exercise_timer(&mut self) {
        let Screen::Practicing(Practice {
            config,
            phase: Phase::Presenting(_),
        }) = &self.screen
        else {
            return;
        };
        if config.is_timed() {
            return;
        }
        if self.exercise_timer.is_running() {
            self.exercise_timer.pause();
        } else {
            self.exercise_timer.start();
        }
    }

    fn exit_to_selection(&mut self) {
        if !matches!(self.screen, Screen::Practicing(_)) {
            return;
        }
        info!(subject = %self.subject, "leaving practice");
        self.exercise_timer.pause();
        self.session_timer.pause();
        self.stats = SessionStats::default();
        self.visit += 1;
        self.screen = Screen::selecting(None);
    }

    fn on_clock_second(&mut self) -> Vec<Effect> {
        if let Some(notice) = &mut self.notice {
            notice.ttl = notice.ttl.saturating_sub(1);
            if notice.ttl == 0 {
                self.notice = None;
            }
        }

        self.exercise_timer.tick();
        match self.session_timer.tick() {
            Some(TimerEvent::Expired) if matches!(self.screen, Screen::Practicing(_)) => {
                self.finish_session()
            }
            _ => vec![],
        }
    }

    fn finish_session(&mut self) -> Vec<Effect> {
        let Screen::Practicing(practice) = &self.screen else {
            return vec![];
        };
        let Some(duration_secs) = practice.config.duration_secs else {
            return vec![];
        };
        let difficulty = practice.config.difficulty;

        self.exercise_timer.pause();
        self.session_timer.pause();
        self.visit += 1;

        let elapsed_secs = self.session_timer.elapsed();
        let summary = SessionSummary::new(
            self.stats,
            elapsed_secs,
            duration_secs,
            &self.settings.grade_bands,
        );
        info!(
            attempted = summary.attempted,
            correct = summary.correct,
            accuracy = summary.accuracy(),
            "timed session finished"
        );

        let record = SessionRecord {
            finished_at: Local::now(),
            subject: self.subject,
            difficulty,
            duration_secs,
            elapsed_secs,
            attempted: summary.attempted,
            correct: summary.correct,
            accuracy: accuracy(summary.correct, summary.attempted),
        };
        self.screen = Screen::Summary(summary);
        vec![Effect::SessionEnded(record)]
    }

    fn on_attempt_saved(&mut self, reply: PersistReply) {
        if reply.ticket.visit != self.visit || !matches!(self.screen, Screen::Practicing(_)) {
            debug!(ticket = ?reply.ticket, "ignoring persistence reply for a closed visit");
            return;
        }
        if let Err(err) = reply.result {
            self.notice = Some(Notice {
                text: format!("Could not save attempt: {err}"),
                kind: NoticeKind::Failure,
                ttl: NOTICE_SECS,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn exercise() -> Exercise {
        Exercise {
            question: "What is 5 - 3?".into(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_answer: "2".into(),
            explanation: "5 - 3 = 2".into(),
        }
    }

    fn session() -> PracticeSession {
        PracticeSession::new(Subject::Arithmetic, SessionSettings::default())
    }

    /// Fulfil every fetch with `exercise`, mimicking a synchronous provider.
    fn run(session: &mut PracticeSession, intent: Intent) -> Vec<Effect> {
        let effects = session.dispatch(intent);
        let mut rest = vec![];
        for effect in effects {
            match effect {
                Effect::Fetch(req) => {
                    rest.extend(session.dispatch(Intent::ExerciseArrived(FetchReply {
                        ticket: req.ticket,
                        exercise: Some(exercise()),
                    })));
                }
                other => rest.push(other),
            }
        }
        rest
    }

    fn start_timed(session: &mut PracticeSession, index: usize) {
        session.dispatch(Intent::OpenConfigurator);
        session.dispatch(Intent::PickDuration(index));
        session.dispatch(Intent::ConfirmDuration);
    }

    fn answer(session: &mut PracticeSession, index: usize) -> Vec<Effect> {
        session.dispatch(Intent::SelectOption(index));
        let effects = session.dispatch(Intent::Submit);
        run(session, Intent::Next);
        effects
    }

    #[test]
    fn test_starts_selecting() {
        let s = session();
        assert_matches!(s.screen(), Screen::Selecting { configurator: None, .. });
        assert!(!s.exercise_timer().is_running());
        assert!(!s.session_timer().is_running());
    }

    #[test]
    fn test_choose_tier_enters_untimed_practice() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Hard));
        let practice = s.practice().unwrap();
        assert_eq!(practice.config.difficulty, Difficulty::Hard);
        assert!(!practice.config.is_timed());
        assert_eq!(practice.phase, Phase::AwaitingGeneration { in_flight: None });
    }

    #[test]
    fn test_highlight_and_number_shortcuts() {
        let mut s = session();
        s.dispatch(Intent::HighlightTier(1));
        s.dispatch(Intent::ChooseHighlightedTier);
        assert_eq!(s.practice().unwrap().config.difficulty, Difficulty::Medium);

        let mut s = session();
        s.dispatch(Intent::ChooseTierNumber(3));
        assert_eq!(s.practice().unwrap().config.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_tier_ignored_while_configurator_open() {
        let mut s = session();
        s.dispatch(Intent::OpenConfigurator);
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        assert!(s.configurator_open());
        assert!(s.practice().is_none());
    }

    #[test]
    fn test_confirm_without_choice_keeps_modal_open() {
        let mut s = session();
        s.dispatch(Intent::OpenConfigurator);
        s.dispatch(Intent::ConfirmDuration);
        assert!(s.configurator_open());
        assert!(!s.session_timer().is_running());
    }

    #[test]
    fn test_cancel_configurator_discards_choice() {
        let mut s = session();
        s.dispatch(Intent::OpenConfigurator);
        s.dispatch(Intent::PickDuration(2));
        s.dispatch(Intent::CancelConfigurator);
        assert!(!s.configurator_open());

        // Confirm after cancel has nothing to emit
        s.dispatch(Intent::ConfirmDuration);
        assert!(s.practice().is_none());
        assert!(!s.session_timer().is_running());

        s.dispatch(Intent::OpenConfigurator);
        assert_matches!(
            s.screen(),
            Screen::Selecting { configurator: Some(c), .. } if c.pending().is_none()
        );
    }

    #[test]
    fn test_confirm_duration_starts_timed_medium_session() {
        let mut s = session();
        start_timed(&mut s, 0);

        let practice = s.practice().unwrap();
        assert_eq!(practice.config.difficulty, Difficulty::Medium);
        assert_eq!(practice.config.duration_secs, Some(300));
        assert!(s.session_timer().is_running());
        assert_eq!(s.session_timer().value(), 300);
        assert!(!s.configurator_open());

        // A second confirm is a no-op
        s.dispatch(Intent::ConfirmDuration);
        assert_eq!(s.session_timer().value(), 300);
    }

    #[test]
    fn test_request_exercise_issues_single_fetch() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        let effects = s.dispatch(Intent::RequestExercise);
        assert_matches!(
            effects.as_slice(),
            [Effect::Fetch(FetchRequest { subject: Subject::Arithmetic, difficulty: Difficulty::Easy, .. })]
        );
        assert!(s.practice().unwrap().is_generating());

        assert!(s.dispatch(Intent::RequestExercise).is_empty());
    }

    #[test]
    fn test_arrival_starts_exercise_timer_from_zero() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        run(&mut s, Intent::RequestExercise);

        assert_matches!(s.practice().unwrap().phase, Phase::Presenting(_));
        assert!(s.exercise_timer().is_running());
        assert_eq!(s.exercise_timer().value(), 0);

        s.dispatch(Intent::ClockSecond);
        s.dispatch(Intent::ClockSecond);
        assert_eq!(s.exercise_timer().value(), 2);
    }

    #[test]
    fn test_empty_provider_reply_uses_fallback() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Hard));
        let Effect::Fetch(req) = s.dispatch(Intent::RequestExercise).remove(0) else {
            panic!("expected fetch");
        };
        s.dispatch(Intent::ExerciseArrived(FetchReply {
            ticket: req.ticket,
            exercise: None,
        }));

        let round = s.practice().unwrap().round().unwrap();
        assert_eq!(round.exercise(), &Exercise::fallback());
    }

    #[test]
    fn test_stale_fetch_reply_is_ignored() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        let Effect::Fetch(req) = s.dispatch(Intent::RequestExercise).remove(0) else {
            panic!("expected fetch");
        };
        s.dispatch(Intent::ExitToSelection);
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));

        s.dispatch(Intent::ExerciseArrived(FetchReply {
            ticket: req.ticket,
            exercise: Some(exercise()),
        }));
        assert_eq!(
            s.practice().unwrap().phase,
            Phase::AwaitingGeneration { in_flight: None }
        );
        assert!(!s.exercise_timer().is_running());
    }

    #[test]
    fn test_submit_untimed_leaves_stats_alone() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Medium));
        run(&mut s, Intent::RequestExercise);
        s.dispatch(Intent::SelectOption(1));
        let effects = s.dispatch(Intent::Submit);

        assert_matches!(
            effects.as_slice(),
            [Effect::RecordAttempt { record, .. }] if record.is_correct && record.user_answer == "2"
        );
        assert_eq!(s.stats(), SessionStats::default());
        assert!(!s.exercise_timer().is_running());

        let round = s.practice().unwrap().round().unwrap();
        assert_eq!(round.mark(1), crate::presenter::OptionMark::Correct);
        assert_eq!(s.notice().unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn test_submit_without_selection_and_double_submit_are_noops() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Medium));
        run(&mut s, Intent::RequestExercise);

        assert!(s.dispatch(Intent::Submit).is_empty());
        assert_matches!(s.practice().unwrap().phase, Phase::Presenting(_));

        s.dispatch(Intent::SelectOption(0));
        assert_eq!(s.dispatch(Intent::Submit).len(), 1);
        assert!(s.dispatch(Intent::Submit).is_empty());
        s.dispatch(Intent::SelectOption(1));
        assert_eq!(
            s.practice().unwrap().round().unwrap().answer().selected(),
            Some(0)
        );
    }

    #[test]
    fn test_timed_stats_counted_per_submission() {
        let mut s = session();
        start_timed(&mut s, 1);
        run(&mut s, Intent::RequestExercise);

        answer(&mut s, 1);
        answer(&mut s, 0);
        answer(&mut s, 1);

        assert_eq!(s.stats().attempted(), 3);
        assert_eq!(s.stats().correct(), 2);
        assert!(s.stats().correct() <= s.stats().attempted());
    }

    #[test]
    fn test_exercise_timer_recorded_as_time_spent() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        run(&mut s, Intent::RequestExercise);
        for _ in 0..7 {
            s.dispatch(Intent::ClockSecond);
        }
        s.dispatch(Intent::SelectOption(3));
        let effects = s.dispatch(Intent::Submit);
        assert_matches!(
            effects.as_slice(),
            [Effect::RecordAttempt { record, .. }] if record.time_spent_secs == 7 && !record.is_correct
        );
    }

    #[test]
    fn test_expiry_mid_question_goes_to_summary() {
        let mut s = session();
        start_timed(&mut s, 0);
        run(&mut s, Intent::RequestExercise);
        answer(&mut s, 1);
        s.dispatch(Intent::SelectOption(1));

        let mut ended = vec![];
        for _ in 0..300 {
            ended.extend(s.dispatch(Intent::ClockSecond));
        }

        assert_matches!(ended.as_slice(), [Effect::SessionEnded(r)] if r.attempted == 1 && r.elapsed_secs == 300);
        assert_matches!(s.screen(), Screen::Summary(summary) if summary.attempted == 1 && summary.correct == 1);
        assert!(!s.exercise_timer().is_running());

        // The pending selection was never submitted
        assert!(s.dispatch(Intent::Submit).is_empty());
        assert_eq!(s.stats().attempted(), 1);
    }

    #[test]
    fn test_submit_in_expiry_tick_is_counted() {
        let mut s = session();
        start_timed(&mut s, 0);
        run(&mut s, Intent::RequestExercise);
        for _ in 0..299 {
            s.dispatch(Intent::ClockSecond);
        }
        s.dispatch(Intent::SelectOption(1));

        let effects = s.process(vec![Intent::ClockSecond, Intent::Submit]);
        assert_matches!(
            effects.as_slice(),
            [Effect::RecordAttempt { .. }, Effect::SessionEnded(r)] if r.attempted == 1 && r.correct == 1
        );
        assert_matches!(s.screen(), Screen::Summary(summary) if summary.accuracy() == 100);
    }

    #[test]
    fn test_next_after_expiry_is_inert() {
        let mut s = session();
        start_timed(&mut s, 0);
        for _ in 0..300 {
            s.dispatch(Intent::ClockSecond);
        }
        assert!(s.dispatch(Intent::Next).is_empty());
        assert_matches!(s.screen(), Screen::Summary(_));
    }

    #[test]
    fn test_exit_mid_question_discards_round() {
        let mut s = session();
        start_timed(&mut s, 0);
        run(&mut s, Intent::RequestExercise);
        answer(&mut s, 1);
        s.dispatch(Intent::ClockSecond);
        s.dispatch(Intent::SelectOption(2));

        s.dispatch(Intent::ExitToSelection);
        assert_matches!(s.screen(), Screen::Selecting { configurator: None, .. });
        assert!(!s.exercise_timer().is_running());
        assert!(!s.session_timer().is_running());
        assert_eq!(s.stats(), SessionStats::default());

        // Paused timers stay put
        let remaining = s.session_timer().value();
        s.dispatch(Intent::ClockSecond);
        assert_eq!(s.session_timer().value(), remaining);

        s.dispatch(Intent::ChooseTier(Difficulty::Medium));
        assert!(!s.practice().unwrap().config.is_timed());
        run(&mut s, Intent::RequestExercise);
        assert_eq!(s.exercise_timer().value(), 0);
        assert_eq!(
            s.practice().unwrap().round().unwrap().answer().selected(),
            None
        );
    }

    #[test]
    fn test_toggle_exercise_timer_only_untimed() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        run(&mut s, Intent::RequestExercise);
        s.dispatch(Intent::ToggleExerciseTimer);
        assert!(!s.exercise_timer().is_running());
        s.dispatch(Intent::ToggleExerciseTimer);
        assert!(s.exercise_timer().is_running());

        let mut s = session();
        start_timed(&mut s, 0);
        run(&mut s, Intent::RequestExercise);
        s.dispatch(Intent::ToggleExerciseTimer);
        assert!(s.exercise_timer().is_running());
    }

    #[test]
    fn test_summary_continue_and_new_session() {
        let mut s = session();
        start_timed(&mut s, 0);
        for _ in 0..300 {
            s.dispatch(Intent::ClockSecond);
        }
        s.dispatch(Intent::Continue);
        assert_matches!(s.screen(), Screen::Selecting { configurator: None, .. });

        start_timed(&mut s, 0);
        for _ in 0..300 {
            s.dispatch(Intent::ClockSecond);
        }
        s.dispatch(Intent::NewSession);
        assert!(s.configurator_open());
        s.dispatch(Intent::PickDuration(1));
        s.dispatch(Intent::ConfirmDuration);
        assert_eq!(s.session_timer().value(), 600);
        assert_eq!(s.stats(), SessionStats::default());
    }

    #[test]
    fn test_persist_failure_sets_notice_without_touching_stats() {
        let mut s = session();
        start_timed(&mut s, 0);
        run(&mut s, Intent::RequestExercise);
        s.dispatch(Intent::SelectOption(1));
        let Effect::RecordAttempt { ticket, .. } = s.dispatch(Intent::Submit).remove(0) else {
            panic!("expected record");
        };

        s.dispatch(Intent::AttemptSaved(PersistReply {
            ticket,
            result: Err("disk full".into()),
        }));
        let notice = s.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Failure);
        assert!(notice.text.contains("disk full"));
        assert_eq!(s.stats().attempted(), 1);
        assert_eq!(s.stats().correct(), 1);

        for _ in 0..NOTICE_SECS {
            s.dispatch(Intent::ClockSecond);
        }
        assert!(s.notice().is_none());
    }

    #[test]
    fn test_persist_reply_after_exit_is_ignored() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        run(&mut s, Intent::RequestExercise);
        s.dispatch(Intent::SelectOption(0));
        let Effect::RecordAttempt { ticket, .. } = s.dispatch(Intent::Submit).remove(0) else {
            panic!("expected record");
        };
        for _ in 0..NOTICE_SECS {
            s.dispatch(Intent::ClockSecond);
        }
        s.dispatch(Intent::ExitToSelection);

        s.dispatch(Intent::AttemptSaved(PersistReply {
            ticket,
            result: Err("locked".into()),
        }));
        assert!(s.notice().is_none());
    }

    #[test]
    fn test_cycle_subject_only_on_selection() {
        let mut s = session();
        s.dispatch(Intent::CycleSubject(1));
        assert_eq!(s.subject(), Subject::Algebra);
        s.dispatch(Intent::CycleSubject(-1));
        assert_eq!(s.subject(), Subject::Arithmetic);

        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        s.dispatch(Intent::CycleSubject(1));
        assert_eq!(s.subject(), Subject::Arithmetic);
    }
}
