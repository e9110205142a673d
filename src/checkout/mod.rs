//! Checkout
//!
//! Pays for the cart in two transactions: a token approval for the marketplace, then the order
//! itself. The steps are not atomic. If the order fails after the approval was mined, the
//! allowance stays in place and the workflow only reports a failure.

use std::{fmt, sync::Arc, time::Duration};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    amounts::{AmountError, ScaledAmount, TOKEN_DECIMALS},
    cart::{Cart, SharedCart},
    chain::{Address, ContractError, Marketplace, PaymentToken, TransactionHash},
    pricing::{Price, PricingError},
};

mod shipping;

pub use shipping::ShippingAddress;

/// Delay between a successful checkout and the cart being emptied.
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// Checkout progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutStatus {
    /// Waiting for the form to be submitted.
    #[default]
    Idle,

    /// Transactions in flight.
    Processing,

    /// Order placed.
    Success,

    /// A transaction failed; see [`CheckoutWorkflow::retry`].
    Error,
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Transaction that failed during checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    /// Token approval
    Approval,

    /// Order placement
    Order,
}

impl fmt::Display for FailedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approval => "approval",
            Self::Order => "order",
        })
    }
}

/// A failed checkout transaction and the reason it failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{step} transaction failed: {source}")]
pub struct CheckoutFailure {
    /// Failed step
    pub step: FailedStep,

    /// Contract error
    pub source: ContractError,
}

/// Errors that can occur while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No wallet account is connected.
    #[error("Connect your wallet to check out")]
    NotConnected,

    /// There is nothing to pay for.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A required shipping field is blank.
    #[error("Missing shipping field: {0}")]
    MissingShippingField(&'static str),

    /// A checkout is already in flight.
    #[error("Checkout already in progress")]
    AlreadyProcessing,

    /// The order was already placed.
    #[error("Order already placed")]
    AlreadyCompleted,

    /// The last attempt failed and has not been retried.
    #[error("Previous checkout failed; retry before submitting again")]
    AwaitingRetry,

    /// The total could not be converted into a token amount.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// The total could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A transaction failed.
    #[error("Transaction failed. Please try again.")]
    Failed(#[source] CheckoutFailure),
}

/// Checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Fee added to every order
    pub service_fee: Price,

    /// Decimals of the payment token
    pub token_decimals: u32,

    /// Marketplace contract allowed to spend the approved amount
    pub spender: Address,

    /// Delay before the cart is emptied after success
    pub clear_delay: Duration,
}

impl CheckoutSettings {
    /// Defaults: a 2.50 fee in `currency`, an 18-decimal token and a three second clear delay.
    pub fn new(currency: &'static Currency, spender: Address) -> Self {
        Self {
            service_fee: Money::from_decimal(Decimal::new(250, 2), currency),
            token_decimals: TOKEN_DECIMALS,
            spender,
            clear_delay: DEFAULT_CLEAR_DELAY,
        }
    }

    /// Set the service fee.
    #[must_use]
    pub fn with_service_fee(mut self, service_fee: Price) -> Self {
        self.service_fee = service_fee;
        self
    }

    /// Set the payment token decimals.
    #[must_use]
    pub fn with_token_decimals(mut self, token_decimals: u32) -> Self {
        self.token_decimals = token_decimals;
        self
    }

    /// Set the delay before the cart is emptied.
    #[must_use]
    pub fn with_clear_delay(mut self, clear_delay: Duration) -> Self {
        self.clear_delay = clear_delay;
        self
    }
}

/// Amounts to be paid for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderQuote {
    /// Cart total
    pub subtotal: Price,

    /// Service fee
    pub service_fee: Price,

    /// Amount charged
    pub total: Price,
}

impl OrderQuote {
    /// The total as a token amount.
    ///
    /// # Errors
    ///
    /// See [`ScaledAmount::from_price`].
    pub fn token_amount(&self, decimals: u32) -> Result<ScaledAmount, AmountError> {
        ScaledAmount::from_price(&self.total, decimals)
    }
}

/// Checkout Workflow
pub struct CheckoutWorkflow {
    token: Arc<dyn PaymentToken>,
    marketplace: Arc<dyn Marketplace>,
    settings: CheckoutSettings,
    status: CheckoutStatus,
    transaction: Option<TransactionHash>,
    failure: Option<CheckoutFailure>,
    pending_clear: Option<JoinHandle<()>>,
}

impl CheckoutWorkflow {
    /// Workflow paying through `token` and `marketplace`.
    pub fn new(
        token: Arc<dyn PaymentToken>,
        marketplace: Arc<dyn Marketplace>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            token,
            marketplace,
            settings,
            status: CheckoutStatus::Idle,
            transaction: None,
            failure: None,
            pending_clear: None,
        }
    }

    /// Price the cart with the service fee.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Pricing`] if the cart total overflows or the fee is in another
    /// currency.
    pub fn quote(&self, cart: &Cart) -> Result<OrderQuote, CheckoutError> {
        let subtotal = cart.total_price()?;
        let service_fee = self.settings.service_fee;
        let total = subtotal.add(service_fee).map_err(PricingError::from)?;

        Ok(OrderQuote {
            subtotal,
            service_fee,
            total,
        })
    }

    /// Pay for the cart and place the order.
    ///
    /// Approves the marketplace for the quoted total, then places the order with the shipping
    /// details. On success the cart is emptied after the configured delay. On failure the cart is
    /// left as it was and the workflow waits for [`CheckoutWorkflow::retry`].
    ///
    /// Dropping the returned future mid-flight leaves the status at
    /// [`CheckoutStatus::Processing`]; only [`CheckoutWorkflow::reset`] leaves that state.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadyProcessing`], [`CheckoutError::AlreadyCompleted`] or
    ///   [`CheckoutError::AwaitingRetry`]: the workflow is not idle.
    /// - [`CheckoutError::NotConnected`]: no account.
    /// - [`CheckoutError::MissingShippingField`]: a required shipping field is blank.
    /// - [`CheckoutError::EmptyCart`]: nothing to pay for.
    /// - [`CheckoutError::Pricing`] or [`CheckoutError::Amount`]: the total cannot be paid.
    /// - [`CheckoutError::Failed`]: a transaction failed; the status is now
    ///   [`CheckoutStatus::Error`].
    pub async fn submit(
        &mut self,
        account: Option<&Address>,
        cart: &SharedCart,
        shipping: &ShippingAddress,
    ) -> Result<TransactionHash, CheckoutError> {
        match self.status {
            CheckoutStatus::Idle => {}
            CheckoutStatus::Processing => return Err(CheckoutError::AlreadyProcessing),
            CheckoutStatus::Success => return Err(CheckoutError::AlreadyCompleted),
            CheckoutStatus::Error => return Err(CheckoutError::AwaitingRetry),
        }

        let account = account.ok_or(CheckoutError::NotConnected)?;

        shipping
            .validate()
            .map_err(CheckoutError::MissingShippingField)?;

        let quote = {
            let cart = cart.lock().await;

            if cart.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }

            self.quote(&cart)?
        };

        let amount = quote.token_amount(self.settings.token_decimals)?;

        self.status = CheckoutStatus::Processing;

        info!(
            account = %account,
            total = %quote.total,
            %amount,
            "checkout started"
        );

        let approval = self.token.approve(&self.settings.spender, amount).await;

        let approval = match approval {
            Ok(receipt) => receipt,
            Err(source) => return Err(self.fail(FailedStep::Approval, source)),
        };

        info!(tx = %approval.transaction_hash, "payment approved");

        let details = shipping.to_string();

        let order = self.marketplace.place_order(&details, amount).await;

        let order = match order {
            Ok(receipt) => receipt,
            Err(source) => return Err(self.fail(FailedStep::Order, source)),
        };

        info!(tx = %order.transaction_hash, "order placed");

        self.status = CheckoutStatus::Success;
        self.transaction = Some(order.transaction_hash.clone());
        self.pending_clear = Some(schedule_clear(Arc::clone(cart), self.settings.clear_delay));

        Ok(order.transaction_hash)
    }

    fn fail(&mut self, step: FailedStep, source: ContractError) -> CheckoutError {
        warn!(%step, error = %source, "checkout failed");

        let failure = CheckoutFailure { step, source };

        self.status = CheckoutStatus::Error;
        self.failure = Some(failure.clone());

        CheckoutError::Failed(failure)
    }

    /// Return to [`CheckoutStatus::Idle`] after a failure. Returns whether the status changed.
    ///
    /// Does nothing while [`CheckoutStatus::Processing`], including after an abandoned
    /// [`CheckoutWorkflow::submit`]; use [`CheckoutWorkflow::reset`] there.
    pub fn retry(&mut self) -> bool {
        if self.status != CheckoutStatus::Error {
            return false;
        }

        self.status = CheckoutStatus::Idle;
        self.failure = None;

        true
    }

    /// Return to [`CheckoutStatus::Idle`] from any state, cancelling a scheduled cart clear.
    pub fn reset(&mut self) {
        if let Some(handle) = self.pending_clear.take() {
            handle.abort();
        }

        self.status = CheckoutStatus::Idle;
        self.transaction = None;
        self.failure = None;
    }

    /// Hand over the scheduled cart clear, e.g. to wait for it before exiting.
    pub fn take_pending_clear(&mut self) -> Option<JoinHandle<()>> {
        self.pending_clear.take()
    }

    /// Current status.
    pub fn status(&self) -> CheckoutStatus {
        self.status
    }

    /// Order transaction of a successful checkout.
    pub fn transaction(&self) -> Option<&TransactionHash> {
        self.transaction.as_ref()
    }

    /// Failure of the last attempt.
    pub fn failure(&self) -> Option<&CheckoutFailure> {
        self.failure.as_ref()
    }

    /// Configuration.
    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }
}

impl fmt::Debug for CheckoutWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutWorkflow")
            .field("settings", &self.settings)
            .field("status", &self.status)
            .field("transaction", &self.transaction)
            .field("failure", &self.failure)
            .field("clear_scheduled", &self.pending_clear.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for CheckoutWorkflow {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_clear.take() {
            handle.abort();
        }
    }
}

fn schedule_clear(cart: SharedCart, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        cart.lock().await.clear_cart();

        info!("cart cleared after checkout");
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        chain::{MockMarketplace, MockPaymentToken, TransactionReceipt},
        products::Product,
    };

    use super::*;

    const TOTAL: u128 = 122_550_000_000_000_000_000;

    fn receipt(hash: &str, block_number: u64) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: TransactionHash::new(hash),
            block_number,
        }
    }

    fn shipping() -> ShippingAddress {
        ShippingAddress {
            full_name: "Amina Nakato".to_string(),
            phone_number: "+256 700 000000".to_string(),
            street_address: "Plot 4 Kampala Road".to_string(),
            city: "Kampala".to_string(),
            parish: "Nakasero".to_string(),
            division: "Central".to_string(),
            region: "KL".to_string(),
        }
    }

    fn flex_cart() -> TestResult<SharedCart> {
        let mut cart = Cart::new(USD);

        cart.add_to_cart(
            &Product::new("prod-001", "Ledger Flex", Money::from_minor(12_005, USD)).with_stock(5),
            1,
        )?;

        Ok(cart.shared())
    }

    fn workflow(token: MockPaymentToken, marketplace: MockMarketplace) -> CheckoutWorkflow {
        CheckoutWorkflow::new(
            Arc::new(token),
            Arc::new(marketplace),
            CheckoutSettings::new(USD, Address::new("0xmarket")),
        )
    }

    fn approving_token() -> MockPaymentToken {
        let mut token = MockPaymentToken::new();

        token
            .expect_approve()
            .once()
            .withf(|spender, amount| {
                spender.as_str() == "0xmarket" && *amount == ScaledAmount::from_atomic(TOTAL)
            })
            .return_once(|_, _| Ok(receipt("0xapprove", 1)));

        token
    }

    /// Token whose approval never confirms.
    #[derive(Debug)]
    struct StalledToken;

    #[async_trait]
    impl PaymentToken for StalledToken {
        async fn approve(
            &self,
            _spender: &Address,
            _amount: ScaledAmount,
        ) -> Result<TransactionReceipt, ContractError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;

            Ok(receipt("0xlate", 1))
        }
    }

    #[test]
    fn quote_adds_service_fee() -> TestResult {
        let cart = Cart::new(USD);
        let checkout = workflow(MockPaymentToken::new(), MockMarketplace::new());

        let quote = checkout.quote(&cart)?;

        assert_eq!(quote.subtotal, Money::from_minor(0, USD));
        assert_eq!(quote.total, Money::from_minor(250, USD));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn successful_checkout_clears_cart_after_delay() -> TestResult {
        let cart = flex_cart()?;
        let mut marketplace = MockMarketplace::new();

        marketplace
            .expect_place_order()
            .once()
            .withf(|details, amount| {
                details.to_string() == shipping().to_string()
                    && *amount == ScaledAmount::from_atomic(TOTAL)
            })
            .return_once(|_, _| Ok(receipt("0xorder", 2)));

        let mut checkout = workflow(approving_token(), marketplace);
        let account = Address::new("0xbuyer");

        let hash = checkout.submit(Some(&account), &cart, &shipping()).await?;

        assert_eq!(hash.as_str(), "0xorder");
        assert_eq!(checkout.status(), CheckoutStatus::Success);
        assert_eq!(checkout.transaction(), Some(&hash));
        assert_eq!(cart.lock().await.cart_count(), 1);

        tokio::time::sleep(DEFAULT_CLEAR_DELAY).await;

        if let Some(handle) = checkout.take_pending_clear() {
            handle.await?;
        }

        assert!(cart.lock().await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn order_failure_keeps_cart() -> TestResult {
        let cart = flex_cart()?;
        let mut marketplace = MockMarketplace::new();

        marketplace
            .expect_place_order()
            .once()
            .return_once(|_, _| Err(ContractError::Reverted("paused".to_string())));

        let mut checkout = workflow(approving_token(), marketplace);
        let account = Address::new("0xbuyer");

        let result = checkout.submit(Some(&account), &cart, &shipping()).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Failed(CheckoutFailure {
                step: FailedStep::Order,
                ..
            }))
        ));
        assert_eq!(checkout.status(), CheckoutStatus::Error);
        assert!(checkout.take_pending_clear().is_none());
        assert_eq!(cart.lock().await.cart_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn approval_failure_skips_order() -> TestResult {
        let cart = flex_cart()?;
        let mut token = MockPaymentToken::new();

        token
            .expect_approve()
            .once()
            .return_once(|_, _| Err(ContractError::Rejected));

        let mut checkout = workflow(token, MockMarketplace::new());
        let account = Address::new("0xbuyer");

        let result = checkout.submit(Some(&account), &cart, &shipping()).await;

        assert!(matches!(
            result,
            Err(CheckoutError::Failed(CheckoutFailure {
                step: FailedStep::Approval,
                source: ContractError::Rejected,
            }))
        ));
        assert_eq!(
            checkout.failure().map(|failure| failure.step),
            Some(FailedStep::Approval)
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_never_processes() {
        let cart = Cart::new(USD).shared();
        let mut checkout = workflow(MockPaymentToken::new(), MockMarketplace::new());
        let account = Address::new("0xbuyer");

        let result = checkout.submit(Some(&account), &cart, &shipping()).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(checkout.status(), CheckoutStatus::Idle);
    }

    #[tokio::test]
    async fn requires_connected_account() -> TestResult {
        let cart = flex_cart()?;
        let mut checkout = workflow(MockPaymentToken::new(), MockMarketplace::new());

        let result = checkout.submit(None, &cart, &shipping()).await;

        assert!(matches!(result, Err(CheckoutError::NotConnected)));
        assert_eq!(checkout.status(), CheckoutStatus::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn requires_shipping_fields() -> TestResult {
        let cart = flex_cart()?;
        let mut checkout = workflow(MockPaymentToken::new(), MockMarketplace::new());
        let account = Address::new("0xbuyer");
        let address = ShippingAddress {
            phone_number: String::new(),
            ..shipping()
        };

        let result = checkout.submit(Some(&account), &cart, &address).await;

        assert!(matches!(
            result,
            Err(CheckoutError::MissingShippingField("phone number"))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn completed_checkout_rejects_resubmission() -> TestResult {
        let cart = flex_cart()?;
        let mut marketplace = MockMarketplace::new();

        marketplace
            .expect_place_order()
            .once()
            .return_once(|_, _| Ok(receipt("0xorder", 2)));

        let mut checkout = workflow(approving_token(), marketplace);
        let account = Address::new("0xbuyer");

        checkout.submit(Some(&account), &cart, &shipping()).await?;

        let again = checkout.submit(Some(&account), &cart, &shipping()).await;

        assert!(matches!(again, Err(CheckoutError::AlreadyCompleted)));

        checkout.reset();

        assert_eq!(checkout.status(), CheckoutStatus::Idle);
        assert!(checkout.take_pending_clear().is_none());
        assert_eq!(cart.lock().await.cart_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn retry_only_after_error() -> TestResult {
        let cart = flex_cart()?;
        let mut token = MockPaymentToken::new();

        token
            .expect_approve()
            .once()
            .return_once(|_, _| Err(ContractError::Network("timeout".to_string())));

        let mut checkout = workflow(token, MockMarketplace::new());
        let account = Address::new("0xbuyer");

        assert!(!checkout.retry());

        let _failed = checkout.submit(Some(&account), &cart, &shipping()).await;

        let blocked = checkout.submit(Some(&account), &cart, &shipping()).await;

        assert!(matches!(blocked, Err(CheckoutError::AwaitingRetry)));
        assert!(checkout.retry());
        assert_eq!(checkout.status(), CheckoutStatus::Idle);
        assert!(checkout.failure().is_none());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submission_needs_reset() -> TestResult {
        let cart = flex_cart()?;
        let mut checkout = CheckoutWorkflow::new(
            Arc::new(StalledToken),
            Arc::new(MockMarketplace::new()),
            CheckoutSettings::new(USD, Address::new("0xmarket")),
        );
        let account = Address::new("0xbuyer");

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            checkout.submit(Some(&account), &cart, &shipping()),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(checkout.status(), CheckoutStatus::Processing);
        assert!(!checkout.retry());
        assert!(matches!(
            checkout.submit(Some(&account), &cart, &shipping()).await,
            Err(CheckoutError::AlreadyProcessing)
        ));

        checkout.reset();

        assert_eq!(checkout.status(), CheckoutStatus::Idle);
        assert_eq!(cart.lock().await.cart_count(), 1);

        Ok(())
    }
}
