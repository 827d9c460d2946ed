/// This error will be returned if an attempt to load a configuration file fails.
#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("file not found: '{0}'")]
    NotFound(std::path::PathBuf),
    #[error(transparent)]
    Deserialization(#[from] toml::de::Error),
    #[error(transparent)]
    Validation(#[from] validator::ValidationError),
    #[error(transparent)]
    Validations(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("missing parent: '{0}'")]
    MissingParent(String),
    #[error("invalid circular include: '{0}'")]
    CircularInclude(String),
    #[error("include outside of a config file: '{0}'")]
    UnresolvedInclude(String),
    #[error("duplicate named frame, evidence or combination: '{0}'")]
    Duplicate(String),
    #[error("invalid combination rule: '{0}'")]
    InvalidRule(String),
}

/// This error will be returned if attempting to resolve references fails.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("missing named frame, evidence or combination: '{0}'")]
    Missing(String),
    #[error("invalid circular combination reference: '{0}'")]
    CircularCombination(String),
}
