//! Trivia payments core
//!
//! Mobile-money plumbing for the trivia-for-cash platform: M-Pesa STK push
//! deposits, B2C withdrawals, and status polling against the PayHero API,
//! plus the locally persisted channel settings and transaction ledger.

pub mod channels;
pub mod config;
pub mod error;
pub mod gateway;
pub mod phone;
pub mod poller;
pub mod request;
pub mod service;
pub mod storage;
pub mod types;

pub use channels::ChannelConfig;
pub use config::{GatewayConfig, PollerConfig};
pub use error::{ErrorKind, PaymentError, PaymentResponse, Result};
pub use gateway::{PayHeroClient, PaymentGateway};
pub use poller::{StatusPoller, StatusSink};
pub use request::{DepositRequest, RequestBuilder, WithdrawalRequest};
pub use service::PaymentService;
pub use types::{
    DepositReceipt, TransactionKind, TransactionRecord, TransactionReference, TransactionStatus,
    UserRecord, WithdrawalReceipt,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_service_open() {
        let temp_dir = tempdir().unwrap();
        let service = PaymentService::open(
            temp_dir.path(),
            GatewayConfig::new("user", "secret"),
            PollerConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(service.deposit_channel_id(), "1487");
        service.set_deposit_channel_id("2002").await.unwrap();
        drop(service);

        let service = PaymentService::open(
            temp_dir.path(),
            GatewayConfig::new("user", "secret"),
            PollerConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(service.deposit_channel_id(), "2002");
        assert_eq!(service.withdrawal_channel_id(), "1487");
    }
}
