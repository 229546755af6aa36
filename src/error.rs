use thiserror::Error;

/// Every failure the simulator can surface. None of them are fatal to the session.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Transport or status failure talking to the assistant service.
    #[error("http error: {0}")]
    Http(#[from] ureq::Error),

    #[error("assistant API key not set (expected in ${0})")]
    MissingApiKey(String),
}

pub type AppResult<T> = Result<T, AppError>;
