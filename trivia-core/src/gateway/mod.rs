//! Provider-facing half of the payment client.
//!
//! [`PaymentGateway`] is the seam the poller and service are written
//! against; [`PayHeroClient`] is the HTTP implementation.

pub mod payhero;

pub use payhero::PayHeroClient;

use crate::error::Result;
use crate::request::{DepositRequest, WithdrawalRequest};
use crate::types::{DepositReceipt, TransactionReference, TransactionStatus, WithdrawalReceipt};
use async_trait::async_trait;

/// One provider round trip per call, no retries.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_deposit(&self, request: &DepositRequest) -> Result<DepositReceipt>;

    async fn initiate_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt>;

    async fn query_status(&self, reference: &TransactionReference) -> Result<TransactionStatus>;
}

#[cfg(test)]
pub(crate) mod stub;
