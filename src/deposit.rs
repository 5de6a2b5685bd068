//! Deposit workflow: validate the amount, have the wallet sign the transfer,
//! then record the deposit with the backend.

use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::boc::{self, BocError};
use crate::config::Config;
use crate::rewards::{format_timestamp, projected_reward};
use crate::services::DepositBackend;
use crate::types::*;
use crate::wallet::{WalletConnector, WalletError};

/// 0.01 TON
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(8594, 0, 0, false, 0);

const NANO_PER_TON: u64 = 1_000_000_000;

/// Missing, unparsable and out-of-range entries all show the bound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount must be between {} and {}", MIN_AMOUNT, MAX_AMOUNT)]
    Required,
    #[error("Amount must be between {} and {}", MIN_AMOUNT, MAX_AMOUNT)]
    NotANumber,
    #[error("Amount must be between {} and {}", MIN_AMOUNT, MAX_AMOUNT)]
    OutOfRange,
    #[error("Amount cannot have more than 9 decimal places")]
    TooPrecise,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("Connect a wallet first")]
    WalletNotConnected,
    #[error("The transfer was not approved: {0}")]
    WalletRejected(String),
    #[error("The wallet did not return a transaction")]
    NoWalletResult,
    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Could not read the signed transaction: {0}")]
    Transaction(#[from] BocError),
    #[error("Payment {hash} was sent but the deposit could not be recorded: {message}")]
    Request { hash: String, message: String },
    #[error("Payment {hash} was sent but the server answered {status}")]
    BackendStatus { hash: String, status: u16 },
}

impl From<WalletError> for DepositError {
    fn from(error: WalletError) -> Self {
        match error {
            WalletError::NotConnected => DepositError::WalletNotConnected,
            WalletError::Rejected(reason) => DepositError::WalletRejected(reason),
            other => DepositError::Wallet(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DepositState {
    #[default]
    Idle,
    AmountEntered,
    TransactionRequested,
    TransactionConfirmed,
    RecordSubmitted,
    Navigated,
    Failed(DepositError),
}

impl DepositState {
    /// A wallet request or backend call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            DepositState::TransactionRequested | DepositState::TransactionConfirmed
        )
    }

    /// State after the user edits the amount field.
    pub fn after_edit(&self, raw: &str) -> DepositState {
        if self.is_busy() {
            return self.clone();
        }
        if raw.trim().is_empty() {
            DepositState::Idle
        } else {
            DepositState::AmountEntered
        }
    }
}

/// Allows one deposit in flight per form, independent of render timing.
#[derive(Debug, Clone, Default)]
pub struct SubmitLock(Rc<Cell<bool>>);

impl SubmitLock {
    pub fn try_acquire(&self) -> Option<SubmitGuard> {
        if self.0.replace(true) {
            None
        } else {
            Some(SubmitGuard(self.0.clone()))
        }
    }

    pub fn is_held(&self) -> bool {
        self.0.get()
    }
}

/// Releases the lock on drop.
#[derive(Debug)]
pub struct SubmitGuard(Rc<Cell<bool>>);

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOrder {
    pub amount: Decimal,
    pub period: Period,
}

pub fn validate_amount(raw: &str) -> Result<Decimal, AmountError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AmountError::Required);
    }
    let plain_decimal = raw.chars().all(|c| c.is_ascii_digit() || c == '.')
        && raw.matches('.').count() <= 1
        && raw.chars().any(|c| c.is_ascii_digit());
    if !plain_decimal {
        return Err(AmountError::NotANumber);
    }
    let amount = Decimal::from_str(raw).map_err(|_| AmountError::NotANumber)?;
    if amount < MIN_AMOUNT || amount > MAX_AMOUNT {
        return Err(AmountError::OutOfRange);
    }
    to_nano(amount)?;
    Ok(amount.normalize())
}

pub fn to_nano(amount: Decimal) -> Result<u64, AmountError> {
    let nano = amount
        .checked_mul(Decimal::from(NANO_PER_TON))
        .ok_or(AmountError::OutOfRange)?;
    if !nano.fract().is_zero() {
        return Err(AmountError::TooPrecise);
    }
    u64::try_from(nano).map_err(|_| AmountError::OutOfRange)
}

pub fn receiving_date(now: DateTime<Utc>, period: Period) -> DateTime<Utc> {
    now + Duration::days(i64::from(period.terms().duration_days))
}

pub fn build_transfer_request(
    config: &Config,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<WalletTransactionRequest, AmountError> {
    Ok(WalletTransactionRequest {
        valid_until: now.timestamp() + config.transfer_validity_secs,
        messages: vec![WalletMessage {
            address: config.recipient_address.clone(),
            amount: to_nano(amount)?.to_string(),
        }],
    })
}

pub fn build_deposit_record(
    result: &WalletTransactionResult,
    wallet_address: &str,
    order: &DepositOrder,
    now: DateTime<Utc>,
    timezone: &FixedOffset,
) -> Result<DepositRecord, BocError> {
    let hash = boc::root_hash_hex(&result.boc)?;
    let terms = order.period.terms();

    Ok(DepositRecord {
        header: DepositHeader { hash },
        body: DepositBody {
            user_wallet_address: wallet_address.to_string(),
            deposite_date: format_timestamp(&now, timezone),
            receiving_date: format_timestamp(&receiving_date(now, order.period), timezone),
            amount: order.amount.normalize().to_string(),
            rewards: projected_reward(Some(order.amount), terms.reward_percent),
        },
    })
}

/// Runs one deposit from wallet request to backend record.
///
/// `on_state` sees each intermediate state. Nothing is retried; a failure
/// after the wallet signed still leaves the payment on chain.
pub async fn submit_deposit(
    wallet: &dyn WalletConnector,
    backend: &dyn DepositBackend,
    config: &Config,
    order: DepositOrder,
    now: DateTime<Utc>,
    mut on_state: impl FnMut(DepositState),
) -> Result<DepositRecord, DepositError> {
    let wallet_address = wallet.address().ok_or(DepositError::WalletNotConnected)?;
    let request = build_transfer_request(config, order.amount, now)?;

    on_state(DepositState::TransactionRequested);
    log::info!(
        "Requesting transfer of {} nanoton to {}",
        request.messages[0].amount,
        config.recipient_address
    );
    let result = wallet
        .send_transaction(&request)
        .await?
        .ok_or(DepositError::NoWalletResult)?;

    on_state(DepositState::TransactionConfirmed);
    let record = build_deposit_record(&result, &wallet_address, &order, now, &config.timezone)?;
    match serde_json::to_string(&record) {
        Ok(json) => log::info!("Deposit payload: {}", json),
        Err(e) => log::warn!("Could not serialize deposit payload for logging: {}", e),
    }

    let status = backend
        .record_deposit(&record)
        .await
        .map_err(|e| DepositError::Request {
            hash: record.header.hash.clone(),
            message: format!("{:#}", e),
        })?;

    if status != 200 {
        return Err(DepositError::BackendStatus {
            hash: record.header.hash.clone(),
            status,
        });
    }

    on_state(DepositState::RecordSubmitted);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};

    const EMPTY_CELL: &str = "te6ccgEBAQEAAgAAAA==";
    const EMPTY_CELL_HASH: &str =
        "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7";
    const RECIPIENT: &str = "EQDrecipient";
    const USER: &str = "UQDuser";

    struct MockWallet {
        address: Option<String>,
        response: Result<Option<WalletTransactionResult>, WalletError>,
        requests: RefCell<Vec<WalletTransactionRequest>>,
    }

    impl MockWallet {
        fn signing(boc: &str) -> Self {
            Self {
                address: Some(USER.to_string()),
                response: Ok(Some(WalletTransactionResult {
                    boc: boc.to_string(),
                })),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl WalletConnector for MockWallet {
        fn address(&self) -> Option<String> {
            self.address.clone()
        }

        async fn send_transaction(
            &self,
            request: &WalletTransactionRequest,
        ) -> Result<Option<WalletTransactionResult>, WalletError> {
            self.requests.borrow_mut().push(request.clone());
            self.response.clone()
        }
    }

    struct MockBackend {
        status: u16,
        posted: RefCell<Vec<DepositRecord>>,
        fail: Cell<bool>,
    }

    impl MockBackend {
        fn answering(status: u16) -> Self {
            Self {
                status,
                posted: RefCell::new(Vec::new()),
                fail: Cell::new(false),
            }
        }
    }

    #[async_trait(?Send)]
    impl DepositBackend for MockBackend {
        async fn record_deposit(&self, record: &DepositRecord) -> anyhow::Result<u16> {
            self.posted.borrow_mut().push(record.clone());
            if self.fail.get() {
                anyhow::bail!("connection reset");
            }
            Ok(self.status)
        }

        async fn get_statistics(&self) -> anyhow::Result<StatisticsSnapshot> {
            Ok(Vec::new())
        }
    }

    fn config() -> Config {
        Config::from_values(Some(RECIPIENT), None).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap()
    }

    fn order(amount: &str, period: Period) -> DepositOrder {
        DepositOrder {
            amount: validate_amount(amount).unwrap(),
            period,
        }
    }

    #[test]
    fn amount_bounds() {
        for ok in ["0.01", "1", "10", "8594", "8594.0", " 42.5 "] {
            assert!(validate_amount(ok).is_ok(), "{ok} should be accepted");
        }
        assert_eq!(validate_amount("0.009"), Err(AmountError::OutOfRange));
        assert_eq!(validate_amount("0"), Err(AmountError::OutOfRange));
        assert_eq!(validate_amount("-5"), Err(AmountError::NotANumber));
        assert_eq!(validate_amount("8594.01"), Err(AmountError::OutOfRange));
        assert_eq!(validate_amount(""), Err(AmountError::Required));
        assert_eq!(validate_amount("   "), Err(AmountError::Required));
        assert_eq!(validate_amount("ten"), Err(AmountError::NotANumber));
        assert_eq!(validate_amount("1.0000000001"), Err(AmountError::TooPrecise));
    }

    #[test]
    fn bound_message() {
        assert_eq!(
            AmountError::OutOfRange.to_string(),
            "Amount must be between 0.01 and 8594"
        );
    }

    #[test]
    fn missing_or_garbled_amount_shows_bound_message() {
        for raw in ["", "  ", "abc", "1.2.3"] {
            assert_eq!(
                validate_amount(raw).unwrap_err().to_string(),
                "Amount must be between 0.01 and 8594",
                "{raw:?}"
            );
        }
    }

    #[test]
    fn only_plain_decimals_are_accepted() {
        for raw in ["1_0", "1e1", "+5", "1,5", ".", "0x10"] {
            assert_eq!(validate_amount(raw), Err(AmountError::NotANumber), "{raw:?}");
        }
        assert_eq!(validate_amount("10.50"), Ok(Decimal::new(105, 1)));
    }

    #[test]
    fn submit_lock_allows_one_deposit_at_a_time() {
        let lock = SubmitLock::default();
        let form_copy = lock.clone();

        let guard = lock.try_acquire().unwrap();
        assert!(form_copy.is_held());
        assert!(form_copy.try_acquire().is_none());

        drop(guard);
        assert!(!lock.is_held());
        assert!(form_copy.try_acquire().is_some());
    }

    #[test]
    fn nano_conversion() {
        assert_eq!(to_nano(Decimal::from(10)), Ok(10_000_000_000));
        assert_eq!(to_nano(MIN_AMOUNT), Ok(10_000_000));
        assert_eq!(to_nano(MAX_AMOUNT), Ok(8_594_000_000_000));
    }

    #[test]
    fn seven_day_plan_ends_nine_days_later() {
        let end = receiving_date(now(), Period::SevenDay);
        assert_eq!(end - now(), Duration::days(9));
        assert_eq!(receiving_date(now(), Period::OneDay) - now(), Duration::days(1));
        assert_eq!(receiving_date(now(), Period::ThirtyDay) - now(), Duration::days(40));
    }

    #[test]
    fn transfer_request() {
        let request = build_transfer_request(&config(), Decimal::from(10), now()).unwrap();
        assert_eq!(request.valid_until, now().timestamp() + 60);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].address, RECIPIENT);
        assert_eq!(request.messages[0].amount, "10000000000");
    }

    #[test]
    fn state_after_edit() {
        assert_eq!(DepositState::Idle.after_edit("5"), DepositState::AmountEntered);
        assert_eq!(DepositState::AmountEntered.after_edit(""), DepositState::Idle);
        assert_eq!(
            DepositState::Failed(DepositError::NoWalletResult).after_edit("5"),
            DepositState::AmountEntered
        );
        assert_eq!(
            DepositState::TransactionRequested.after_edit(""),
            DepositState::TransactionRequested
        );
    }

    #[tokio::test]
    async fn happy_path() {
        let wallet = MockWallet::signing(EMPTY_CELL);
        let backend = MockBackend::answering(200);
        let mut states = Vec::new();

        let record = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("10", Period::OneDay),
            now(),
            |state| states.push(state),
        )
        .await
        .unwrap();

        let requests = wallet.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].amount, "10000000000");
        assert_eq!(requests[0].messages[0].address, RECIPIENT);
        assert_eq!(requests[0].valid_until, now().timestamp() + 60);

        assert_eq!(record.header.hash, EMPTY_CELL_HASH);
        assert_eq!(record.body.user_wallet_address, USER);
        assert_eq!(record.body.amount, "10");
        assert_eq!(record.body.rewards, "10.10");
        assert_eq!(record.body.deposite_date, "1.5.2024::12:30:5");
        assert_eq!(record.body.receiving_date, "2.5.2024::12:30:5");

        assert_eq!(backend.posted.borrow().as_slice(), &[record]);
        assert_eq!(
            states,
            vec![
                DepositState::TransactionRequested,
                DepositState::TransactionConfirmed,
                DepositState::RecordSubmitted,
            ]
        );
    }

    #[tokio::test]
    async fn backend_error_status_is_reported_once() {
        let wallet = MockWallet::signing(EMPTY_CELL);
        let backend = MockBackend::answering(500);
        let mut states = Vec::new();

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("10", Period::ThirtyDay),
            now(),
            |state| states.push(state),
        )
        .await;

        assert_eq!(
            result,
            Err(DepositError::BackendStatus {
                hash: EMPTY_CELL_HASH.to_string(),
                status: 500,
            })
        );
        assert_eq!(backend.posted.borrow().len(), 1);
        assert!(!states.contains(&DepositState::RecordSubmitted));
    }

    #[tokio::test]
    async fn request_failure_keeps_hash() {
        let wallet = MockWallet::signing(EMPTY_CELL);
        let backend = MockBackend::answering(200);
        backend.fail.set(true);

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("1", Period::OneDay),
            now(),
            |_| {},
        )
        .await;

        match result {
            Err(DepositError::Request { hash, message }) => {
                assert_eq!(hash, EMPTY_CELL_HASH);
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn wallet_without_result_skips_backend() {
        let mut wallet = MockWallet::signing(EMPTY_CELL);
        wallet.response = Ok(None);
        let backend = MockBackend::answering(200);

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("5", Period::SevenDay),
            now(),
            |_| {},
        )
        .await;

        assert_eq!(result, Err(DepositError::NoWalletResult));
        assert!(backend.posted.borrow().is_empty());
    }

    #[tokio::test]
    async fn wallet_rejection() {
        let mut wallet = MockWallet::signing(EMPTY_CELL);
        wallet.response = Err(WalletError::Rejected("user declined".to_string()));
        let backend = MockBackend::answering(200);

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("5", Period::SevenDay),
            now(),
            |_| {},
        )
        .await;

        assert_eq!(
            result,
            Err(DepositError::WalletRejected("user declined".to_string()))
        );
        assert!(backend.posted.borrow().is_empty());
    }

    #[tokio::test]
    async fn disconnected_wallet_is_not_asked() {
        let mut wallet = MockWallet::signing(EMPTY_CELL);
        wallet.address = None;
        let backend = MockBackend::answering(200);

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("5", Period::OneDay),
            now(),
            |_| {},
        )
        .await;

        assert_eq!(result, Err(DepositError::WalletNotConnected));
        assert!(wallet.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn malformed_boc_is_not_posted() {
        let wallet = MockWallet::signing("AAAA");
        let backend = MockBackend::answering(200);

        let result = submit_deposit(
            &wallet,
            &backend,
            &config(),
            order("5", Period::OneDay),
            now(),
            |_| {},
        )
        .await;

        assert!(matches!(result, Err(DepositError::Transaction(_))));
        assert!(backend.posted.borrow().is_empty());
    }
}
