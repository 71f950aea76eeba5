//! In-memory development chain with a scriptable wallet.
//!
//! Hosts a single GetSet contract (`set(uint256)`, `get()`,
//! `getBalance(address)`, payable `receive`) and lets the caller decide how
//! the "user" answers prompts, when blocks are mined, and whether the network
//! is reachable.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy::primitives::{address, keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::blockchain::provider::{ProviderEvent, WalletProvider};
use crate::blockchain::types::{ProviderError, ProviderResult, TxReceipt};

/// First two Hardhat development accounts.
pub const DEV_ACCOUNTS: [Address; 2] = [
    address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
    address!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
];

/// EIP-1193 code for a request from an account the user has not authorized.
const UNAUTHORIZED_CODE: i64 = 4100;

/// How the simulated user answers a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// A transaction the simulated wallet signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

#[derive(Debug)]
struct QueuedTx {
    sent: SentTransaction,
    force_revert: bool,
}

#[derive(Debug)]
struct ChainState {
    chain_id: u64,
    accounts: Vec<Address>,
    block_number: u64,
    nonce: u64,
    stored_value: U256,
    deposits: HashMap<Address, U256>,
    mempool: Vec<QueuedTx>,
    receipts: HashMap<TxHash, TxReceipt>,
    sent: Vec<SentTransaction>,
    authorized: bool,
    access: Decision,
    signing: Decision,
    auto_mine: bool,
    revert_next: bool,
    offline: bool,
    account_prompts: usize,
    signing_prompts: usize,
}

/// Simulated wallet provider hosting GetSet at `contract`.
#[derive(Debug)]
pub struct SimulatedWallet {
    contract: Address,
    state: Mutex<ChainState>,
    events: broadcast::Sender<ProviderEvent>,
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

fn reverted() -> ProviderError {
    ProviderError::Rpc {
        code: 3,
        message: "execution reverted".to_string(),
    }
}

impl SimulatedWallet {
    /// A chain with the development accounts, auto-mining, and a user who
    /// approves everything.
    pub fn new(chain_id: u64, contract: Address) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            contract,
            state: Mutex::new(ChainState {
                chain_id,
                accounts: DEV_ACCOUNTS.to_vec(),
                block_number: 0,
                nonce: 0,
                stored_value: U256::ZERO,
                deposits: HashMap::new(),
                mempool: Vec::new(),
                receipts: HashMap::new(),
                sent: Vec::new(),
                authorized: false,
                access: Decision::Approve,
                signing: Decision::Approve,
                auto_mine: true,
                revert_next: false,
                offline: false,
                account_prompts: 0,
                signing_prompts: 0,
            }),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        // A poisoned lock only means a test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Address the GetSet contract lives at.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// How the account-access prompt is answered.
    pub fn set_access(&self, decision: Decision) {
        self.state().access = decision;
    }

    /// How signing prompts are answered.
    pub fn set_signing(&self, decision: Decision) {
        self.state().signing = decision;
    }

    /// Mine every broadcast transaction immediately (the default) or only on
    /// [`SimulatedWallet::mine`].
    pub fn set_auto_mine(&self, auto_mine: bool) {
        self.state().auto_mine = auto_mine;
    }

    /// The next broadcast transaction reverts when mined.
    pub fn revert_next(&self) {
        self.state().revert_next = true;
    }

    /// Make every request fail as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Mine one block containing every queued transaction. Returns how many
    /// were included.
    pub fn mine(&self) -> usize {
        let mut state = self.state();
        Self::mine_block(&mut state, self.contract)
    }

    /// Advance the chain by empty blocks.
    pub fn advance_blocks(&self, count: u64) {
        self.state().block_number += count;
    }

    /// Switch the selected account and notify subscribers.
    pub fn switch_account(&self, account: Address) {
        {
            let mut state = self.state();
            state.accounts.retain(|a| *a != account);
            state.accounts.insert(0, account);
        }
        self.emit(ProviderEvent::AccountsChanged(self.state().accounts.clone()));
    }

    /// Switch networks and notify subscribers.
    pub fn switch_chain(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
        self.emit(ProviderEvent::ChainChanged(chain_id));
    }

    /// Revoke authorization for every account and notify subscribers.
    pub fn lock(&self) {
        self.state().authorized = false;
        self.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }

    /// Push an arbitrary event to subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Number of times the user was shown the account-access prompt.
    pub fn account_prompts(&self) -> usize {
        self.state().account_prompts
    }

    /// Number of times the user was asked to sign.
    pub fn signing_prompts(&self) -> usize {
        self.state().signing_prompts
    }

    /// Every transaction broadcast so far, in order.
    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }

    /// Transactions broadcast but not yet mined.
    pub fn pending_count(&self) -> usize {
        self.state().mempool.len()
    }

    /// Value currently held by the contract's `get()`.
    pub fn stored_value(&self) -> U256 {
        self.state().stored_value
    }

    /// Amount deposited by `account`.
    pub fn deposit_of(&self, account: Address) -> U256 {
        self.state().deposits.get(&account).copied().unwrap_or_default()
    }

    fn mine_block(state: &mut ChainState, contract: Address) -> usize {
        let queued = std::mem::take(&mut state.mempool);
        if queued.is_empty() {
            return 0;
        }
        state.block_number += 1;
        let block_number = state.block_number;
        let count = queued.len();

        for tx in queued {
            let success = !tx.force_revert && Self::execute(state, contract, &tx.sent);
            state.receipts.insert(
                tx.sent.tx_hash,
                TxReceipt {
                    tx_hash: tx.sent.tx_hash,
                    block_number,
                    success,
                },
            );
        }
        count
    }

    fn execute(state: &mut ChainState, contract: Address, tx: &SentTransaction) -> bool {
        if tx.to != Some(contract) {
            // Plain transfer to an externally owned account.
            return true;
        }
        if tx.input.is_empty() {
            *state.deposits.entry(tx.from).or_default() += tx.value;
            return true;
        }
        if tx.input.len() == 36 && tx.input[..4] == selector("set(uint256)") && tx.value.is_zero() {
            state.stored_value = U256::from_be_slice(&tx.input[4..36]);
            return true;
        }
        false
    }
}

#[async_trait]
impl WalletProvider for SimulatedWallet {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        let mut state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }
        if !state.authorized {
            state.account_prompts += 1;
            match state.access {
                Decision::Approve => state.authorized = true,
                Decision::Reject => return Err(ProviderError::UserRejected),
            }
        }
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        let state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }
        Ok(state.chain_id)
    }

    async fn call(&self, request: TransactionRequest) -> ProviderResult<Bytes> {
        let state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }
        let to = request.to.and_then(|kind| kind.to().copied());
        if to != Some(self.contract) {
            return Ok(Bytes::new());
        }
        let input = request.input.input().cloned().unwrap_or_default();

        if input.len() == 4 && input[..4] == selector("get()") {
            return Ok(word(state.stored_value));
        }
        if input.len() == 36 && input[..4] == selector("getBalance(address)") {
            let account = Address::from_slice(&input[16..36]);
            let deposited = state.deposits.get(&account).copied().unwrap_or_default();
            return Ok(word(deposited));
        }
        Err(reverted())
    }

    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<TxHash> {
        let mut state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }

        let from = request
            .from
            .or_else(|| state.accounts.first().copied())
            .unwrap_or_default();
        if !state.authorized || !state.accounts.contains(&from) {
            return Err(ProviderError::Rpc {
                code: UNAUTHORIZED_CODE,
                message: format!("account {} is not authorized", from),
            });
        }

        state.signing_prompts += 1;
        if state.signing == Decision::Reject {
            return Err(ProviderError::UserRejected);
        }

        let mut preimage = Vec::with_capacity(36);
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        preimage.extend_from_slice(&state.chain_id.to_be_bytes());
        let tx_hash = keccak256(&preimage);
        state.nonce += 1;

        let sent = SentTransaction {
            tx_hash,
            from,
            to: request.to.and_then(|kind| kind.to().copied()),
            value: request.value.unwrap_or_default(),
            input: request.input.input().cloned().unwrap_or_default(),
        };
        let force_revert = std::mem::take(&mut state.revert_next);
        state.sent.push(sent.clone());
        state.mempool.push(QueuedTx { sent, force_revert });

        if state.auto_mine {
            Self::mine_block(&mut state, self.contract);
        }

        tracing::debug!(tx_hash = %tx_hash, from = %from, "Simulated transaction broadcast");
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ProviderResult<Option<TxReceipt>> {
        let state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }
        Ok(state.receipts.get(&tx_hash).copied())
    }

    async fn block_number(&self) -> ProviderResult<u64> {
        let state = self.state();
        if state.offline {
            return Err(ProviderError::Network("simulated network outage".to_string()));
        }
        Ok(state.block_number)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::network::TransactionBuilder;

    const CONTRACT: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");

    fn set_call(value: u64) -> Bytes {
        let mut input = selector("set(uint256)").to_vec();
        input.extend_from_slice(&U256::from(value).to_be_bytes::<32>());
        Bytes::from(input)
    }

    #[tokio::test]
    async fn test_account_prompt_shown_once() {
        let wallet = SimulatedWallet::new(1337, CONTRACT);
        wallet.request_accounts().await.unwrap();
        wallet.request_accounts().await.unwrap();
        assert_eq!(wallet.account_prompts(), 1);
    }

    #[tokio::test]
    async fn test_rejected_access() {
        let wallet = SimulatedWallet::new(1337, CONTRACT);
        wallet.set_access(Decision::Reject);
        let result = wallet.request_accounts().await;
        assert_eq!(result, Err(ProviderError::UserRejected));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let wallet = SimulatedWallet::new(1337, CONTRACT);
        wallet.request_accounts().await.unwrap();

        let tx = TransactionRequest::default()
            .with_from(DEV_ACCOUNTS[0])
            .with_to(CONTRACT)
            .with_input(set_call(42));
        let hash = wallet.send_transaction(tx).await.unwrap();
        let receipt = wallet.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.success);

        let query = TransactionRequest::default()
            .with_to(CONTRACT)
            .with_input(Bytes::from(selector("get()").to_vec()));
        let output = wallet.call(query).await.unwrap();
        assert_eq!(U256::from_be_slice(&output), U256::from(42));
    }

    #[tokio::test]
    async fn test_manual_mining_and_revert() {
        let wallet = SimulatedWallet::new(1337, CONTRACT);
        wallet.request_accounts().await.unwrap();
        wallet.set_auto_mine(false);
        wallet.revert_next();

        let tx = TransactionRequest::default()
            .with_from(DEV_ACCOUNTS[0])
            .with_to(CONTRACT)
            .with_input(set_call(7));
        let hash = wallet.send_transaction(tx).await.unwrap();
        assert!(wallet.transaction_receipt(hash).await.unwrap().is_none());
        assert_eq!(wallet.pending_count(), 1);

        assert_eq!(wallet.mine(), 1);
        let receipt = wallet.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(!receipt.success);
        assert_eq!(wallet.stored_value(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_unauthorized_send_is_refused() {
        let wallet = SimulatedWallet::new(1337, CONTRACT);
        let tx = TransactionRequest::default()
            .with_from(DEV_ACCOUNTS[0])
            .with_to(CONTRACT);
        let result = wallet.send_transaction(tx).await;
        assert!(matches!(result, Err(ProviderError::Rpc { code: 4100, .. })));
        assert_eq!(wallet.signing_prompts(), 0);
    }
}
