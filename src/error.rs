use thiserror::Error;

/// The error type for mpc-stats
#[derive(Debug, Error)]
pub enum Error {
    #[error("shares have different types")]
    DifferentShareTypes,
    #[error("invalid party id {0}")]
    InvalidPartyId(u32),
    #[error("unknown party {0}")]
    UnknownParty(String),
    #[error("invalid task request: {0}")]
    InvalidTaskRequest(String),
    #[error("channel closed by peer")]
    ChannelClosed,
    #[error("unexpected message")]
    UnexpectedMessage,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    #[error(transparent)]
    Config(#[from] Box<figment::Error>),
    #[error("failed to get triple")]
    BeaverTriple,
    #[error("{0} can not be embedded as fixed-point value")]
    FixedPointEmbedding(f64),
    #[error("tried to divide by 0 in column {0}")]
    DivByZero(usize),
    #[error("negative weight {1} in column {0}")]
    NegativeWeight(usize, f64),
    #[error("values and weights differ in length ({0} != {1})")]
    LengthMismatch(usize, usize),
    #[error("input shape {local} does not match peer shape {remote}")]
    ShapeMismatch { local: usize, remote: usize },
    #[error("operation {local} does not match peer operation {remote}")]
    OperationMismatch { local: String, remote: String },
    #[error("sub task id {local} does not match peer sub task id {remote}")]
    SubTaskMismatch { local: String, remote: String },
}

impl From<figment::Error> for Error {
    fn from(value: figment::Error) -> Self {
        Error::Config(Box::new(value))
    }
}

/// [`Result`] type with mpc-stats [`enum@Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
