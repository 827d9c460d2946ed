#[derive(thiserror::Error, Debug)]
pub enum CliArgumentError {
    #[error("invalid log format: {0}")]
    InvalidLogFormat(String),
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),
    #[error("missing subcommand")]
    MissingSubcommand,
}

/// Returned when a configuration cannot be turned into mass assignments at all.
#[derive(thiserror::Error, Debug)]
pub enum EvaluationError {
    #[error("invalid frame '{0}': {1}")]
    Frame(String, shafer_mass::FrameError),
    #[error(transparent)]
    Resolution(#[from] shafer_config::ResolutionError),
}

/// Returned in place of a single combination result. Other entries of the report are unaffected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CombinationError {
    #[error(transparent)]
    Combine(#[from] shafer_mass::CombineError),
    #[error("input '{0}' could not be evaluated")]
    FailedInput(String),
}
