use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("allocation error: {0}")]
    Allocation(String),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("process error: {0}")]
    Process(String),
    #[error("cli error: {0}")]
    Cli(String),
}
