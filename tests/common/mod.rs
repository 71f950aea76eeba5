//! Shared wiring for integration tests.

use std::sync::Arc;
use std::time::Duration;

use getset::blockchain::{ConfirmationPolicy, SimulatedWallet, TransactionCoordinator, WalletProvider};
use getset::config::ArtifactConfig;
use getset::contract::artifact::load_descriptor;
use getset::contract::ContractDescriptor;
use getset::session::WalletConnector;
use getset::view::{ViewController, ViewState};

pub const CHAIN_ID: u64 = 1337;

/// The GetSet descriptor shipped in `contract_data/`.
pub fn descriptor() -> Arc<ContractDescriptor> {
    let config = ArtifactConfig {
        dir: concat!(env!("CARGO_MANIFEST_DIR"), "/contract_data").to_string(),
        contract_name: "GetSet".to_string(),
    };
    Arc::new(load_descriptor(&config).unwrap())
}

/// Fast polling so tests settle in milliseconds.
pub fn coordinator() -> TransactionCoordinator {
    TransactionCoordinator::new(ConfirmationPolicy {
        confirmations: 0,
        poll_interval: Duration::from_millis(5),
        timeout: Duration::from_secs(2),
    })
}

/// A controller backed by a simulated wallet on `chain_id`.
pub fn setup_on_chain(chain_id: u64) -> (Arc<SimulatedWallet>, ViewController) {
    let descriptor = descriptor();
    let wallet = Arc::new(SimulatedWallet::new(chain_id, descriptor.address()));
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    let controller = ViewController::new(
        WalletConnector::new(Some(provider), CHAIN_ID),
        descriptor,
        coordinator(),
    );
    (wallet, controller)
}

pub fn setup() -> (Arc<SimulatedWallet>, ViewController) {
    setup_on_chain(CHAIN_ID)
}

/// Wait until the controller's state satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for_state<F>(controller: &ViewController, predicate: F) -> ViewState
where
    F: FnMut(&ViewState) -> bool,
{
    let mut rx = controller.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("state did not settle in time")
        .expect("controller dropped");
    state.clone()
}

/// Wait until the wallet has broadcast `count` transactions.
#[allow(dead_code)]
pub async fn wait_for_broadcast(wallet: &SimulatedWallet, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while wallet.sent_transactions().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("transaction was not broadcast in time");
}
