use thiserror::Error;

pub type BindingResult<T> = Result<T, BindingError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("engine init failed: {0}")]
    EngineInit(String),

    #[error("set option failed: {0}")]
    SetOption(String),

    #[error("platform primitive unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
