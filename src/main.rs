use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{info, warn};

use mathdrill::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::AppError,
    exercise::{Difficulty, Subject},
    logging,
    provider::{BankProvider, ExerciseBank, RandomPicker, SeededPicker},
    runtime::{AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::{Intent, PracticeSession},
    session_log::SessionLog,
    stats::{AttemptDb, AttemptRecorder, NullRecorder},
    worker::{FetchWorker, PersistWorker},
};

/// terminal math practice with timed sessions and instant feedback
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Multiple-choice math practice in the terminal. Pick a difficulty for open-ended practice, or start a timed session and get a graded summary when the clock runs out."
)]
pub struct Cli {
    /// subject to practice
    #[clap(short = 's', long, value_enum)]
    subject: Option<Subject>,

    /// jump straight into untimed practice at this difficulty
    #[clap(short = 'd', long, value_enum, conflicts_with = "timed")]
    difficulty: Option<Difficulty>,

    /// start a timed session of this many minutes
    #[clap(short = 't', long)]
    timed: Option<u64>,

    /// JSON exercise bank to use instead of the built-in one
    #[clap(long)]
    bank: Option<PathBuf>,

    /// seed for a reproducible exercise order
    #[clap(long)]
    seed: Option<u64>,

    /// do not record attempts for this run
    #[clap(long)]
    no_persist: bool,

    /// print recorded accuracy and average answer times per subject, then exit
    #[clap(long, conflicts_with = "clear_stats")]
    stats: bool,

    /// delete every recorded attempt, then exit
    #[clap(long)]
    clear_stats: bool,
}

impl Cli {
    /// Fold the flags that outlive this run into the stored config.
    /// `--bank`, `--seed` and `--no-persist` only apply to this run.
    fn apply_to(&self, config: &mut Config) {
        if let Some(subject) = self.subject {
            config.subject = subject;
        }
    }

    fn timed_secs(&self) -> Option<u64> {
        self.timed
            .and_then(|minutes| minutes.checked_mul(60))
            .filter(|secs| *secs > 0)
    }

    /// Intents that put the session where the flags ask to start
    fn startup_intents(&self, durations: &[u64]) -> Vec<Intent> {
        if let Some(secs) = self.timed_secs() {
            if let Some(idx) = durations.iter().position(|d| *d == secs) {
                return vec![
                    Intent::OpenConfigurator,
                    Intent::PickDuration(idx),
                    Intent::ConfirmDuration,
                    Intent::RequestExercise,
                ];
            }
        }
        match self.difficulty {
            Some(difficulty) => vec![Intent::ChooseTier(difficulty), Intent::RequestExercise],
            None => vec![],
        }
    }
}

/// A bank named on the command line must load. One remembered in the
/// config falls back to the built-in bank when it can no longer be read.
fn load_bank(cli_bank: Option<&Path>, config: &Config) -> Result<ExerciseBank, AppError> {
    let bank = match (cli_bank, &config.bank_path) {
        (Some(path), _) => ExerciseBank::from_path(path)?,
        (None, Some(path)) => match ExerciseBank::from_path(path) {
            Ok(bank) => bank,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "configured bank unusable, using built-in bank");
                ExerciseBank::embedded()?
            }
        },
        (None, None) => ExerciseBank::embedded()?,
    };
    info!(exercises = bank.len(), "exercise bank loaded");
    Ok(bank)
}

/// Output of `--stats` or `--clear-stats`.
fn run_stats_command(cli: &Cli, db: &AttemptDb) -> Result<String, AppError> {
    if cli.clear_stats {
        let cleared = db.attempt_count()?;
        db.clear_all()?;
        info!(cleared, "attempt history cleared");
        return Ok(format!("Cleared {cleared} recorded attempts."));
    }
    Ok(db.report()?)
}

fn open_recorder(persist: bool) -> Box<dyn AttemptRecorder> {
    if !persist {
        return Box::new(NullRecorder);
    }
    match AttemptDb::new() {
        Ok(db) => Box::new(db),
        Err(err) => {
            warn!(error = %err, "attempt database unavailable, attempts will not be saved");
            Box::new(NullRecorder)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.stats || cli.clear_stats {
        println!("{}", run_stats_command(&cli, &AttemptDb::new()?)?);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(err) = logging::init(&path) {
            eprintln!("mathdrill: logging disabled: {err}");
        }
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply_to(&mut config);

    let bank = load_bank(cli.bank.as_deref(), &config)?;

    let mut settings = config.session_settings();
    if let Some(secs) = cli.timed_secs() {
        if !settings.durations.contains(&secs) {
            settings.durations.insert(0, secs);
        }
    }
    let startup = cli.startup_intents(&settings.durations);

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(config.tick_rate_ms())),
    );
    let fetcher = match cli.seed {
        Some(seed) => FetchWorker::spawn(BankProvider::new(bank, SeededPicker::new(seed)), runner.sender()),
        None => FetchWorker::spawn(BankProvider::new(bank, RandomPicker), runner.sender()),
    };
    let persister = PersistWorker::spawn(open_recorder(config.persist && !cli.no_persist), runner.sender());
    let session_log = AppDirs::session_log_path().map(SessionLog::new);

    let mut app = App::new(
        PracticeSession::new(config.subject, settings),
        fetcher,
        persister,
        session_log,
    );
    app.apply(startup);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &runner, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    config.subject = app.session.subject();
    if let Err(err) = store.save(&config) {
        warn!(error = %err, "could not save config");
    }

    result
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    runner: &Runner<E, T>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut last = Instant::now();

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        if app.handle_event(event, elapsed) == Control::Quit {
            info!("quitting");
            break;
        }
    }

    Ok(())
}
