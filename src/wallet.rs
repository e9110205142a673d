//! Wallet
//!
//! Connection state for the injected wallet provider. A [`WalletSession`] is owned by the
//! storefront; provider notifications are only applied after [`WalletSession::subscribe`] and
//! while the receiver is held.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::chain::{Address, ChainId};

/// Notification pushed by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The set of exposed accounts changed; empty when the wallet was locked or disconnected.
    AccountsChanged(Vec<Address>),

    /// The wallet switched network.
    ChainChanged(ChainId),
}

/// Wallet connection errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet provider is available.
    #[error("No Ethereum wallet found. Please install MetaMask or another wallet.")]
    NoProvider,

    /// The connection was declined or failed; the user may retry.
    #[error("Failed to connect to wallet. Please try again.")]
    Rejected,

    /// The provider answered with an error.
    #[error("Wallet provider error: {0}")]
    Provider(String),
}

/// Injected wallet provider.
#[automock]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to expose their accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Current network.
    async fn chain_id(&self) -> Result<ChainId, WalletError>;

    /// Native balance of `address` in wei.
    async fn balance(&self, address: &Address) -> Result<u128, WalletError>;

    /// Receive account and chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Wallet Session
#[derive(Default)]
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    account: Option<Address>,
    chain_id: Option<ChainId>,
    balance: Option<u128>,
    is_connecting: bool,
    error: Option<WalletError>,
    events: Option<broadcast::Receiver<WalletEvent>>,
}

impl WalletSession {
    /// Session backed by `provider`.
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Session with no provider available. Connecting always fails with
    /// [`WalletError::NoProvider`].
    pub fn without_provider() -> Self {
        Self::default()
    }

    /// Request accounts, chain and balance from the provider.
    ///
    /// On success the first exposed account becomes the connected account. Failures are kept
    /// in [`WalletSession::error`] until the next attempt.
    ///
    /// # Errors
    ///
    /// - [`WalletError::NoProvider`]: no provider is available.
    /// - [`WalletError::Rejected`]: the user declined or the provider failed.
    pub async fn connect(&mut self) -> Result<Address, WalletError> {
        let Some(provider) = self.provider.clone() else {
            self.error = Some(WalletError::NoProvider);

            return Err(WalletError::NoProvider);
        };

        self.is_connecting = true;
        self.error = None;

        let result = Self::request_connection(provider.as_ref()).await;

        self.is_connecting = false;

        match result {
            Ok((account, chain_id, balance)) => {
                info!(account = %account, chain = %chain_id, "wallet connected");

                self.account = Some(account.clone());
                self.chain_id = Some(chain_id);
                self.balance = Some(balance);

                Ok(account)
            }
            Err(source) => {
                warn!(error = %source, "wallet connection failed");

                self.error = Some(WalletError::Rejected);

                Err(WalletError::Rejected)
            }
        }
    }

    async fn request_connection(
        provider: &dyn WalletProvider,
    ) -> Result<(Address, ChainId, u128), WalletError> {
        let account = provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::Rejected)?;

        let chain_id = provider.chain_id().await?;
        let balance = provider.balance(&account).await?;

        Ok((account, chain_id, balance))
    }

    /// Forget the connected account. The provider itself is not notified.
    pub fn disconnect(&mut self) {
        if let Some(account) = self.account.take() {
            info!(account = %account, "wallet disconnected");
        }

        self.chain_id = None;
        self.balance = None;
    }

    /// Start listening for provider notifications. Replaces any existing subscription.
    pub fn subscribe(&mut self) {
        if let Some(provider) = &self.provider {
            self.events = Some(provider.subscribe());
        }
    }

    /// Stop listening for provider notifications.
    pub fn unsubscribe(&mut self) {
        self.events = None;
    }

    /// Whether notifications are being received.
    pub fn is_subscribed(&self) -> bool {
        self.events.is_some()
    }

    /// Apply every pending provider notification. Returns how many were applied.
    pub async fn sync(&mut self) -> usize {
        let mut applied = 0;

        loop {
            let Some(events) = self.events.as_mut() else {
                break;
            };

            match events.try_recv() {
                Ok(event) => {
                    self.handle_event(event).await;
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "wallet notifications dropped");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.events = None;
                    break;
                }
            }
        }

        applied
    }

    /// Apply a single provider notification.
    pub async fn handle_event(&mut self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let Some(first) = accounts.into_iter().next() else {
                    info!("wallet accounts cleared");

                    self.account = None;
                    self.balance = None;

                    return;
                };

                if self.account.as_ref() == Some(&first) {
                    return;
                }

                info!(account = %first, "wallet account changed");

                self.balance = self.fetch_balance(&first).await;
                self.account = Some(first);
            }
            WalletEvent::ChainChanged(chain_id) => {
                debug!(chain = %chain_id, "wallet chain changed");

                self.chain_id = Some(chain_id);
            }
        }
    }

    async fn fetch_balance(&self, account: &Address) -> Option<u128> {
        let provider = self.provider.as_ref()?;

        match provider.balance(account).await {
            Ok(balance) => Some(balance),
            Err(error) => {
                warn!(%error, account = %account, "balance refresh failed");

                None
            }
        }
    }

    /// Connected account.
    pub fn account(&self) -> Option<&Address> {
        self.account.as_ref()
    }

    /// Network of the connected wallet.
    pub fn chain_id(&self) -> Option<&ChainId> {
        self.chain_id.as_ref()
    }

    /// Native balance of the connected account in wei.
    pub fn balance(&self) -> Option<u128> {
        self.balance
    }

    /// Whether a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.is_connecting
    }

    /// Last connection error.
    pub fn error(&self) -> Option<&WalletError> {
        self.error.as_ref()
    }

    /// Whether a provider is available.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("has_provider", &self.provider.is_some())
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("balance", &self.balance)
            .field("is_connecting", &self.is_connecting)
            .field("error", &self.error)
            .field("subscribed", &self.events.is_some())
            .finish()
    }
}
