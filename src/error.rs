use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the lamp client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("frame: {0}")]
    Frame(#[from] FrameError),

    #[error("weather: {0}")]
    Weather(#[from] WeatherError),

    #[error("command: {0}")]
    Command(#[from] CommandError),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Whether the error should end the current session and trigger a retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Frame(_))
    }
}

/// Connection-related errors.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("handshake rejected")]
    HandshakeRejected,

    #[error("timeout")]
    Timeout,

    #[error("closed by peer")]
    Disconnected,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame decoding errors.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("declared payload of {len} bytes exceeds limit of {max}")]
    TooLarge { len: u64, max: usize },

    #[error("invalid opcode {0:#x}")]
    InvalidOpcode(u8),

    #[error("read: {0}")]
    Io(#[from] std::io::Error),
}

/// Weather lookup errors.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no api key configured")]
    MissingApiKey,
}

/// Inbound command payload errors. Always logged and dropped.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("action {0:?} requires a value")]
    MissingValue(String),
}
