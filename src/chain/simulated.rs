//! Simulated Chain
//!
//! In-memory wallet, payment token and marketplace. Every call mines one block; approvals set
//! the spender allowance and order placement spends it, moving tokens from the account to the
//! marketplace.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::{
    amounts::ScaledAmount,
    chain::{
        Address, ChainId, ContractError, Marketplace, PaymentToken, TransactionHash,
        TransactionReceipt,
    },
    wallet::{WalletError, WalletEvent, WalletProvider},
};

const EVENT_CAPACITY: usize = 16;

/// Order recorded by the simulated marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Paying account
    pub buyer: Address,

    /// Free-text shipping details
    pub shipping_details: String,

    /// Amount transferred to the marketplace
    pub amount: ScaledAmount,

    /// Order transaction
    pub transaction_hash: TransactionHash,
}

#[derive(Debug)]
struct Ledger {
    account: Address,
    chain_id: ChainId,
    wei_balances: FxHashMap<Address, u128>,
    token_balances: FxHashMap<Address, ScaledAmount>,
    allowances: FxHashMap<(Address, Address), ScaledAmount>,
    orders: Vec<PlacedOrder>,
    block_number: u64,
    locked: bool,
    reject_next: bool,
}

impl Ledger {
    fn mine(&mut self) -> TransactionReceipt {
        self.block_number += 1;

        TransactionReceipt {
            transaction_hash: TransactionHash::new(format!("0x{:064x}", self.block_number)),
            block_number: self.block_number,
        }
    }

    fn take_rejection(&mut self) -> bool {
        std::mem::take(&mut self.reject_next)
    }
}

/// Simulated Chain
#[derive(Debug)]
pub struct SimulatedChain {
    marketplace: Address,
    ledger: Mutex<Ledger>,
    events: broadcast::Sender<WalletEvent>,
}

impl SimulatedChain {
    /// Chain with `account` connected and holding `wei` of native balance and `tokens` of the
    /// payment token.
    pub fn new(
        account: Address,
        chain_id: ChainId,
        marketplace: Address,
        wei: u128,
        tokens: ScaledAmount,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut wei_balances = FxHashMap::default();
        wei_balances.insert(account.clone(), wei);

        let mut token_balances = FxHashMap::default();
        token_balances.insert(account.clone(), tokens);

        Self {
            marketplace,
            ledger: Mutex::new(Ledger {
                account,
                chain_id,
                wei_balances,
                token_balances,
                allowances: FxHashMap::default(),
                orders: Vec::new(),
                block_number: 0,
                locked: false,
                reject_next: false,
            }),
            events,
        }
    }

    /// Address of the marketplace contract.
    pub fn marketplace(&self) -> &Address {
        &self.marketplace
    }

    /// Switch the wallet to `account`, with `wei` of native balance, and notify subscribers.
    pub async fn switch_account(&self, account: Address, wei: u128) {
        let mut ledger = self.ledger.lock().await;

        ledger.wei_balances.insert(account.clone(), wei);
        ledger.account = account.clone();
        ledger.locked = false;

        self.notify(WalletEvent::AccountsChanged(vec![account]));
    }

    /// Switch network and notify subscribers.
    pub async fn switch_chain(&self, chain_id: ChainId) {
        self.ledger.lock().await.chain_id = chain_id.clone();

        self.notify(WalletEvent::ChainChanged(chain_id));
    }

    /// Lock the wallet: no accounts are exposed until the next account switch.
    pub async fn lock_accounts(&self) {
        self.ledger.lock().await.locked = true;

        self.notify(WalletEvent::AccountsChanged(Vec::new()));
    }

    /// Make the next signing request (connect, approve or order) fail as declined by the user.
    pub async fn reject_next_request(&self) {
        self.ledger.lock().await.reject_next = true;
    }

    /// Token balance of `account`.
    pub async fn token_balance(&self, account: &Address) -> ScaledAmount {
        self.ledger
            .lock()
            .await
            .token_balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Remaining allowance `owner` has granted `spender`.
    pub async fn allowance(&self, owner: &Address, spender: &Address) -> ScaledAmount {
        self.ledger
            .lock()
            .await
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Orders placed so far.
    pub async fn orders(&self) -> Vec<PlacedOrder> {
        self.ledger.lock().await.orders.clone()
    }

    fn notify(&self, event: WalletEvent) {
        // No receivers is fine: nobody is subscribed.
        if self.events.send(event).is_err() {
            debug!("no wallet subscribers");
        }
    }
}

#[async_trait]
impl WalletProvider for SimulatedChain {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let mut ledger = self.ledger.lock().await;

        if ledger.take_rejection() {
            return Err(WalletError::Provider("User rejected the request.".to_string()));
        }

        if ledger.locked {
            return Ok(Vec::new());
        }

        Ok(vec![ledger.account.clone()])
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        Ok(self.ledger.lock().await.chain_id.clone())
    }

    async fn balance(&self, address: &Address) -> Result<u128, WalletError> {
        let ledger = self.ledger.lock().await;

        Ok(ledger.wei_balances.get(address).copied().unwrap_or_default())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl PaymentToken for SimulatedChain {
    async fn approve(
        &self,
        spender: &Address,
        amount: ScaledAmount,
    ) -> Result<TransactionReceipt, ContractError> {
        let mut ledger = self.ledger.lock().await;

        if ledger.take_rejection() {
            return Err(ContractError::Rejected);
        }

        let owner = ledger.account.clone();

        ledger
            .allowances
            .insert((owner.clone(), spender.clone()), amount);

        let receipt = ledger.mine();

        debug!(
            owner = %owner,
            spender = %spender,
            %amount,
            tx = %receipt.transaction_hash,
            "approval mined"
        );

        Ok(receipt)
    }
}

#[async_trait]
impl Marketplace for SimulatedChain {
    async fn place_order(
        &self,
        shipping_details: &str,
        amount: ScaledAmount,
    ) -> Result<TransactionReceipt, ContractError> {
        let mut ledger = self.ledger.lock().await;

        if ledger.take_rejection() {
            return Err(ContractError::Rejected);
        }

        let buyer = ledger.account.clone();
        let allowance_key = (buyer.clone(), self.marketplace.clone());

        let remaining_allowance = ledger
            .allowances
            .get(&allowance_key)
            .copied()
            .unwrap_or_default()
            .checked_sub(amount)
            .ok_or_else(|| ContractError::Reverted("insufficient allowance".to_string()))?;

        let remaining_balance = ledger
            .token_balances
            .get(&buyer)
            .copied()
            .unwrap_or_default()
            .checked_sub(amount)
            .ok_or_else(|| ContractError::Reverted("transfer amount exceeds balance".to_string()))?;

        let marketplace_balance = ledger
            .token_balances
            .get(&self.marketplace)
            .copied()
            .unwrap_or_default()
            .saturating_add(amount);

        ledger.allowances.insert(allowance_key, remaining_allowance);
        ledger.token_balances.insert(buyer.clone(), remaining_balance);
        ledger
            .token_balances
            .insert(self.marketplace.clone(), marketplace_balance);

        let receipt = ledger.mine();

        ledger.orders.push(PlacedOrder {
            buyer,
            shipping_details: shipping_details.to_string(),
            amount,
            transaction_hash: receipt.transaction_hash.clone(),
        });

        debug!(%amount, tx = %receipt.transaction_hash, "order mined");

        Ok(receipt)
    }
}
