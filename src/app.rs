use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::runtime::{AppEvent, SecondPulse};
use crate::session::{
    Effect, FetchReply, Intent, Phase, PersistReply, PracticeSession, Screen,
};
use crate::session_log::SessionLog;
use crate::worker::{FetchWorker, PersistWorker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Translate a key press into intents for the current screen.
pub fn key_intents(session: &PracticeSession, key: KeyEvent) -> (Control, Vec<Intent>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return (Control::Quit, vec![]);
    }

    let intents = match session.screen() {
        Screen::Selecting {
            configurator: Some(_),
            ..
        } => match key.code {
            KeyCode::Esc => vec![Intent::CancelConfigurator],
            KeyCode::Up | KeyCode::Char('k') => vec![Intent::MoveDuration(-1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Intent::MoveDuration(1)],
            KeyCode::Char(c @ '1'..='9') => vec![Intent::PickDuration(digit(c) - 1)],
            KeyCode::Enter => vec![Intent::ConfirmDuration],
            _ => vec![],
        },
        Screen::Selecting { .. } => match key.code {
            KeyCode::Esc => return (Control::Quit, vec![]),
            KeyCode::Up | KeyCode::Char('k') => vec![Intent::HighlightTier(-1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Intent::HighlightTier(1)],
            KeyCode::Left | KeyCode::Char('h') => vec![Intent::CycleSubject(-1)],
            KeyCode::Right | KeyCode::Char('l') => vec![Intent::CycleSubject(1)],
            KeyCode::Enter => vec![Intent::ChooseHighlightedTier],
            KeyCode::Char(c @ '1'..='3') => vec![Intent::ChooseTierNumber(digit(c))],
            KeyCode::Char('t') => vec![Intent::OpenConfigurator],
            _ => vec![],
        },
        Screen::Practicing(practice) => match (key.code, &practice.phase) {
            (KeyCode::Esc, _) => return (Control::Quit, vec![]),
            (KeyCode::Backspace, _) => vec![Intent::ExitToSelection],
            (KeyCode::Enter | KeyCode::Char('g'), Phase::AwaitingGeneration { .. }) => {
                vec![Intent::RequestExercise]
            }
            (KeyCode::Char(c @ 'a'..='d'), Phase::Presenting(_)) => {
                vec![Intent::SelectOption((c as u8 - b'a') as usize)]
            }
            (KeyCode::Up | KeyCode::Char('k'), Phase::Presenting(_)) => {
                vec![Intent::CycleOption(-1)]
            }
            (KeyCode::Down | KeyCode::Char('j'), Phase::Presenting(_)) => {
                vec![Intent::CycleOption(1)]
            }
            (KeyCode::Enter, Phase::Presenting(_)) => vec![Intent::Submit],
            (KeyCode::Char('p'), Phase::Presenting(_)) => vec![Intent::ToggleExerciseTimer],
            (KeyCode::Enter | KeyCode::Char('n'), Phase::Submitted(_)) => vec![Intent::Next],
            _ => vec![],
        },
        Screen::Summary(_) => match key.code {
            KeyCode::Esc => return (Control::Quit, vec![]),
            KeyCode::Char('c') | KeyCode::Enter => vec![Intent::Continue],
            KeyCode::Char('n') => vec![Intent::NewSession],
            _ => vec![],
        },
    };

    (Control::Continue, intents)
}

fn digit(c: char) -> usize {
    c.to_digit(10).unwrap_or(0) as usize
}

/// Glue between the event queue, the session and the background workers.
pub struct App {
    pub session: PracticeSession,
    fetcher: FetchWorker,
    persister: PersistWorker,
    session_log: Option<SessionLog>,
    pulse: SecondPulse,
}

impl App {
    pub fn new(
        session: PracticeSession,
        fetcher: FetchWorker,
        persister: PersistWorker,
        session_log: Option<SessionLog>,
    ) -> Self {
        Self {
            session,
            fetcher,
            persister,
            session_log,
            pulse: SecondPulse::default(),
        }
    }

    /// Feed one runner event plus the wall time since the previous one.
    pub fn handle_event(&mut self, event: AppEvent, elapsed: Duration) -> Control {
        let (control, mut intents) = match event {
            AppEvent::Key(key) => key_intents(&self.session, key),
            AppEvent::ExerciseReady(reply) => (Control::Continue, vec![Intent::ExerciseArrived(reply)]),
            AppEvent::AttemptSaved(reply) => (Control::Continue, vec![Intent::AttemptSaved(reply)]),
            AppEvent::Tick | AppEvent::Resize => (Control::Continue, vec![]),
        };
        if control == Control::Quit {
            return Control::Quit;
        }

        for _ in 0..self.pulse.advance(elapsed) {
            intents.push(Intent::ClockSecond);
        }
        self.apply(intents);
        Control::Continue
    }

    pub fn apply(&mut self, intents: Vec<Intent>) {
        let effects = self.session.process(intents);
        for effect in effects {
            self.perform(effect);
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Fetch(req) => {
                let ticket = req.ticket;
                if !self.fetcher.request(req) {
                    warn!("fetch worker unavailable, using fallback exercise");
                    self.apply(vec![Intent::ExerciseArrived(FetchReply {
                        ticket,
                        exercise: None,
                    })]);
                }
            }
            Effect::RecordAttempt { ticket, record } => {
                if let Err(err) = self.persister.submit(ticket, record) {
                    warn!(error = %err, "could not queue attempt");
                    self.apply(vec![Intent::AttemptSaved(PersistReply {
                        ticket,
                        result: Err(err.to_string()),
                    })]);
                }
            }
            Effect::SessionEnded(record) => {
                if let Some(log) = &self.session_log {
                    if let Err(err) = log.append(&record) {
                        warn!(path = %log.path().display(), error = %err, "could not append session log");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{Difficulty, Subject};
    use crate::session::SessionSettings;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn session() -> PracticeSession {
        PracticeSession::new(Subject::Algebra, SessionSettings::default())
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let s = session();
        let (control, intents) =
            key_intents(&s, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(control, Control::Quit);
        assert!(intents.is_empty());
    }

    #[test]
    fn esc_closes_modal_before_quitting() {
        let mut s = session();
        s.dispatch(Intent::OpenConfigurator);
        assert_eq!(
            key_intents(&s, key(KeyCode::Esc)),
            (Control::Continue, vec![Intent::CancelConfigurator])
        );

        s.dispatch(Intent::CancelConfigurator);
        assert_eq!(key_intents(&s, key(KeyCode::Esc)).0, Control::Quit);
    }

    #[test]
    fn selection_keys() {
        let s = session();
        assert_eq!(
            key_intents(&s, key(KeyCode::Char('2'))).1,
            vec![Intent::ChooseTierNumber(2)]
        );
        assert_eq!(
            key_intents(&s, key(KeyCode::Char('t'))).1,
            vec![Intent::OpenConfigurator]
        );
        assert_eq!(
            key_intents(&s, key(KeyCode::Right)).1,
            vec![Intent::CycleSubject(1)]
        );
    }

    #[test]
    fn modal_digits_are_zero_based_picks() {
        let mut s = session();
        s.dispatch(Intent::OpenConfigurator);
        assert_eq!(
            key_intents(&s, key(KeyCode::Char('1'))).1,
            vec![Intent::PickDuration(0)]
        );
    }

    #[test]
    fn practice_keys_depend_on_phase() {
        let mut s = session();
        s.dispatch(Intent::ChooseTier(Difficulty::Easy));
        assert_eq!(
            key_intents(&s, key(KeyCode::Enter)).1,
            vec![Intent::RequestExercise]
        );
        assert!(key_intents(&s, key(KeyCode::Char('a'))).1.is_empty());
        assert_eq!(
            key_intents(&s, key(KeyCode::Backspace)).1,
            vec![Intent::ExitToSelection]
        );
    }
}
