use crate::channels::ChannelConfig;
use crate::config::{GatewayConfig, PollerConfig};
use crate::error::Result;
use crate::gateway::{PayHeroClient, PaymentGateway};
use crate::poller::{StatusPoller, StatusSink};
use crate::request::RequestBuilder;
use crate::storage::{SettingsStore, Storage, TransactionStore};
use crate::types::{
    DepositReceipt, TransactionKind, TransactionRecord, TransactionReference, TransactionStatus,
    UserRecord, WithdrawalReceipt,
};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const DATABASE_FILE: &str = "trivia.db";

/// Everything the front end needs to move money: build, send, record and
/// follow deposits and withdrawals.
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    channels: Arc<ChannelConfig>,
    requests: RequestBuilder,
    poller: StatusPoller,
    transactions: TransactionStore,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        channels: Arc<ChannelConfig>,
        transactions: TransactionStore,
        callback_url: impl Into<String>,
        poller_config: PollerConfig,
    ) -> Result<Self> {
        poller_config.validate()?;

        Ok(Self {
            requests: RequestBuilder::new(channels.clone(), callback_url),
            poller: StatusPoller::new(gateway.clone(), poller_config)
                .with_sink(Arc::new(transactions.clone())),
            gateway,
            channels,
            transactions,
        })
    }

    /// Open (or create) the local database under `data_dir` and talk to
    /// PayHero with `gateway_config`.
    pub async fn open(
        data_dir: &Path,
        gateway_config: GatewayConfig,
        poller_config: PollerConfig,
    ) -> Result<Self> {
        let storage = Arc::new(Storage::new(&data_dir.join(DATABASE_FILE)).await?);
        let channels = ChannelConfig::load(Arc::new(SettingsStore::new(storage.clone()))).await?;
        let callback_url = gateway_config.callback_url.clone();
        let gateway = PayHeroClient::new(gateway_config)?;

        Self::new(
            Arc::new(gateway),
            Arc::new(channels),
            TransactionStore::new(storage),
            callback_url,
            poller_config,
        )
    }

    /// Send an STK push prompting `phone` to pay `amount`.
    pub async fn initiate_deposit(&self, amount: f64, phone: &str) -> Result<DepositReceipt> {
        let request = self.requests.deposit(amount, phone)?;
        let receipt = self.gateway.initiate_deposit(&request).await?;

        self.record(
            &receipt.reference,
            TransactionKind::Deposit,
            request.amount,
            &request.phone_number,
            &request.external_reference,
            receipt.status,
        )
        .await;

        Ok(receipt)
    }

    /// Pay `amount` out to `phone` over M-Pesa B2C.
    pub async fn withdraw_to_mobile(&self, amount: f64, phone: &str) -> Result<WithdrawalReceipt> {
        let request = self.requests.withdrawal(amount, phone)?;
        let receipt = self.gateway.initiate_withdrawal(&request).await?;

        self.record(
            &receipt.merchant_reference,
            TransactionKind::Withdrawal,
            request.amount,
            &request.phone_number,
            &request.external_reference,
            receipt.status,
        )
        .await;

        Ok(receipt)
    }

    pub async fn deposit_for_user(&self, user: &UserRecord, amount: f64) -> Result<DepositReceipt> {
        tracing::debug!("Deposit of {} requested by user {}", amount, user.id);
        self.initiate_deposit(amount, &user.phone_number).await
    }

    pub async fn withdraw_for_user(
        &self,
        user: &UserRecord,
        amount: f64,
    ) -> Result<WithdrawalReceipt> {
        tracing::debug!("Withdrawal of {} requested by user {}", amount, user.id);
        self.withdraw_to_mobile(amount, &user.phone_number).await
    }

    /// Ask the provider once, outside of any running poll.
    pub async fn check_transaction_status(
        &self,
        reference: &TransactionReference,
    ) -> Result<TransactionStatus> {
        let status = self.gateway.query_status(reference).await?;
        self.transactions.record_status(reference, status).await;
        Ok(status)
    }

    /// Poll `reference` until it settles, forwarding each status to
    /// `on_status`. The ledger already holds a status by the time
    /// `on_status` sees it.
    pub fn start_status_check<F>(&self, reference: TransactionReference, on_status: F) -> Result<bool>
    where
        F: Fn(TransactionStatus) + Send + 'static,
    {
        self.poller.start(reference, on_status)
    }

    pub fn stop_status_check(&self, reference: &TransactionReference) -> bool {
        self.poller.stop(reference)
    }

    pub fn stop_all_status_checks(&self) -> usize {
        self.poller.stop_all()
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn deposit_channel_id(&self) -> String {
        self.channels.deposit_channel_id()
    }

    pub async fn set_deposit_channel_id(&self, channel_id: &str) -> Result<()> {
        self.channels.set_deposit_channel_id(channel_id).await
    }

    pub fn withdrawal_channel_id(&self) -> String {
        self.channels.withdrawal_channel_id()
    }

    pub async fn set_withdrawal_channel_id(&self, channel_id: &str) -> Result<()> {
        self.channels.set_withdrawal_channel_id(channel_id).await
    }

    pub async fn transaction(&self, reference: &TransactionReference) -> Result<TransactionRecord> {
        self.transactions.get(reference).await
    }

    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        self.transactions.list(limit).await
    }

    /// The provider already accepted the request, so a ledger failure is
    /// logged rather than reported as a failed payment.
    async fn record(
        &self,
        reference: &TransactionReference,
        kind: TransactionKind,
        amount: u64,
        phone_number: &str,
        external_reference: &str,
        status: TransactionStatus,
    ) {
        let now = Utc::now();
        let record = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            reference: reference.clone(),
            kind,
            amount,
            phone_number: phone_number.to_string(),
            external_reference: external_reference.to_string(),
            status,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.transactions.record(&record).await {
            tracing::warn!("Failed to record {} {}: {}", kind.as_str(), reference, e);
        }
    }
}
