use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{message}")]
    GatewayRequestFailed { status: u16, message: String },

    #[error("Payment gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transaction not found: {reference}")]
    TransactionNotFound { reference: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Closed set of error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPhoneNumber,
    InvalidAmount,
    GatewayRequestFailed,
    GatewayUnreachable,
    MalformedResponse,
    Storage,
    Config,
    NotFound,
    Internal,
}

impl PaymentError {
    pub fn invalid_phone(msg: impl Into<String>) -> Self {
        Self::InvalidPhoneNumber(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn request_failed(status: u16, msg: impl Into<String>) -> Self {
        Self::GatewayRequestFailed {
            status,
            message: msg.into(),
        }
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::GatewayUnreachable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPhoneNumber(_) => ErrorKind::InvalidPhoneNumber,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::GatewayRequestFailed { .. } => ErrorKind::GatewayRequestFailed,
            Self::GatewayUnreachable(_) => ErrorKind::GatewayUnreachable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::TransactionNotFound { .. } => ErrorKind::NotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for failures detected before any request left the process.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidPhoneNumber | ErrorKind::InvalidAmount
        )
    }
}

/// `{success, data?, error?}` envelope for callers that prefer a flat shape
/// over matching on [`PaymentError`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> From<Result<T>> for PaymentResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_kind: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.to_string()),
                error_kind: Some(e.kind()),
            },
        }
    }
}
