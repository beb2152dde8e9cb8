use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuestionError>;

#[derive(Error, Debug)]
pub enum QuestionError {
    #[error("Completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion API unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected completion response: {0}")]
    MalformedResponse(String),

    #[error("Could not parse a question from completion: {0}")]
    Unparsable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
