//! Background threads for the two collaborators that may block: the
//! exercise provider and the attempt recorder. Each owns its collaborator,
//! takes requests over a channel and posts replies into the app event queue.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::PersistError;
use crate::provider::ExerciseProvider;
use crate::runtime::AppEvent;
use crate::session::{FetchReply, FetchRequest, PersistReply, Ticket};
use crate::stats::{AttemptRecord, AttemptRecorder};

pub struct FetchWorker {
    tx: Option<Sender<FetchRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl FetchWorker {
    pub fn spawn<P: ExerciseProvider + 'static>(mut provider: P, replies: Sender<AppEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<FetchRequest>();
        let handle = thread::spawn(move || {
            for req in rx {
                let exercise = provider.fetch(req.subject, req.difficulty);
                let reply = FetchReply {
                    ticket: req.ticket,
                    exercise,
                };
                if replies.send(AppEvent::ExerciseReady(reply)).is_err() {
                    break;
                }
            }
            debug!("fetch worker stopped");
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queue a fetch. `false` when the worker is gone.
    pub fn request(&self, req: FetchRequest) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(req).is_ok())
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct PersistJob {
    ticket: Ticket,
    record: AttemptRecord,
}

/// Writer thread owning the recorder. Write failures are logged and reported
/// back, never retried.
pub struct PersistWorker {
    tx: Option<Sender<PersistJob>>,
    handle: Option<JoinHandle<()>>,
}

impl PersistWorker {
    pub fn spawn(mut recorder: Box<dyn AttemptRecorder>, replies: Sender<AppEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<PersistJob>();
        let handle = thread::spawn(move || {
            for job in rx {
                let result = recorder.record(&job.record).map_err(|err| {
                    warn!(
                        subject = %job.record.subject,
                        question = %job.record.exercise.question,
                        error = %err,
                        "failed to record attempt"
                    );
                    err.to_string()
                });
                let reply = PersistReply {
                    ticket: job.ticket,
                    result,
                };
                if replies.send(AppEvent::AttemptSaved(reply)).is_err() {
                    break;
                }
            }
            debug!("persist worker stopped");
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn submit(&self, ticket: Ticket, record: AttemptRecord) -> Result<(), PersistError> {
        let tx = self.tx.as_ref().ok_or(PersistError::Closed)?;
        tx.send(PersistJob { ticket, record })
            .map_err(|_| PersistError::Closed)
    }
}

impl Drop for PersistWorker {
    /// Pending writes are flushed before the thread exits.
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
