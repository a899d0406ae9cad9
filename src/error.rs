use thiserror::Error;

/// Problems loading an exercise bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("no bank file for subject `{0}`")]
    MissingSubject(String),

    #[error("bank file is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("failed to parse bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid exercise `{question}`: {reason}")]
    InvalidExercise { question: String, reason: String },
}

/// Failure to record an attempt. Never surfaced to session state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("failed to encode exercise: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("persistence worker has shut down")]
    Closed,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
