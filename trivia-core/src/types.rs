use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier the provider hands back for an accepted request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionReference(String);

impl TransactionReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransactionReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for TransactionReference {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

/// Provider-side transaction state as observed by polling.
///
/// `Queued` is the only non-terminal state. `TimedOut` is never sent by the
/// provider; the poller produces it when a configured deadline elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransactionStatus {
    #[default]
    Queued,
    Success,
    Failed,
    TimedOut,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMEOUT",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued)
    }

    /// Parse a status as the provider reports it. `TIMEOUT` only ever comes
    /// from the poller, so the provider sending it is an error.
    pub fn from_provider(s: &str) -> std::result::Result<Self, String> {
        match s.parse::<Self>()? {
            Self::TimedOut => Err(format!("unknown transaction status '{}'", s.trim())),
            status => Ok(status),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Ok(Self::Queued),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "TIMEOUT" => Ok(Self::TimedOut),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

impl TryFrom<String> for TransactionStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

/// A 2xx acknowledgement means the provider took the request, so a status it
/// reports that we do not recognize (or `null`) is read as still queued.
fn receipt_status<'de, D>(deserializer: D) -> std::result::Result<TransactionStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let status = match raw {
        None | Some(serde_json::Value::Null) => TransactionStatus::Queued,
        Some(serde_json::Value::String(s)) => {
            TransactionStatus::from_provider(&s).unwrap_or_else(|e| {
                tracing::warn!("Treating accepted request as QUEUED: {}", e);
                TransactionStatus::Queued
            })
        }
        Some(other) => {
            tracing::warn!("Treating accepted request as QUEUED: status was {}", other);
            TransactionStatus::Queued
        }
    };
    Ok(status)
}

/// Provider acknowledgement of an STK push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub reference: TransactionReference,
    #[serde(default, deserialize_with = "receipt_status")]
    pub status: TransactionStatus,
    #[serde(
        rename = "CheckoutRequestID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub checkout_request_id: Option<String>,
}

/// Provider acknowledgement of a B2C disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub merchant_reference: TransactionReference,
    #[serde(default, deserialize_with = "receipt_status")]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_request_id: Option<String>,
}

/// The authenticated actor, supplied by whatever owns user accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub phone_number: String,
}

/// Locally recorded transaction initiated through this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub reference: TransactionReference,
    pub kind: TransactionKind,
    pub amount: u64,
    pub phone_number: String,
    pub external_reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
