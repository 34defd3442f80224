/// Result alias that carries the custom [`GameError`] type.
pub type Result<T> = std::result::Result<T, GameError>;

/// Common error type for the core crate.
///
/// Gameplay itself never fails: rejected taps and commands are reported as
/// [`Ignored`](crate::Ignored) values. This type only covers the edges that
/// touch the outside world, such as loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Free-form message, mostly raised by the command line front end.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),
    /// Configuration parsed but holds values the engine cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl GameError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for GameError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for GameError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
