use super::PaymentGateway;
use crate::error::{PaymentError, Result};
use crate::request::{DepositRequest, WithdrawalRequest};
use crate::types::{DepositReceipt, TransactionReference, TransactionStatus, WithdrawalReceipt};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Gateway double that replays scripted status results and records what it
/// was asked to send. Once the script runs dry every query reports `QUEUED`.
#[derive(Default)]
pub struct ScriptedGateway {
    statuses: Mutex<VecDeque<Result<TransactionStatus>>>,
    pub deposits: Mutex<Vec<DepositRequest>>,
    pub withdrawals: Mutex<Vec<WithdrawalRequest>>,
    pub queries: Mutex<Vec<TransactionReference>>,
    calls: AtomicUsize,
    pub reject_initiation: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(statuses: Vec<Result<TransactionStatus>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn push_status(&self, status: Result<TransactionStatus>) {
        self.statuses.lock().push_back(status);
    }

    /// Total network calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    fn check_rejection(&self) -> Result<()> {
        match self.reject_initiation.lock().clone() {
            Some(message) => Err(PaymentError::request_failed(400, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initiate_deposit(&self, request: &DepositRequest) -> Result<DepositReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_rejection()?;
        let mut deposits = self.deposits.lock();
        deposits.push(request.clone());
        Ok(DepositReceipt {
            reference: TransactionReference::new(format!("ref-{}", deposits.len())),
            status: TransactionStatus::Queued,
            checkout_request_id: None,
        })
    }

    async fn initiate_withdrawal(&self, request: &WithdrawalRequest) -> Result<WithdrawalReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_rejection()?;
        let mut withdrawals = self.withdrawals.lock();
        withdrawals.push(request.clone());
        Ok(WithdrawalReceipt {
            merchant_reference: TransactionReference::new(format!("wd-{}", withdrawals.len())),
            status: TransactionStatus::Queued,
            checkout_request_id: None,
        })
    }

    async fn query_status(&self, reference: &TransactionReference) -> Result<TransactionStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(reference.clone());
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or(Ok(TransactionStatus::Queued))
    }
}
