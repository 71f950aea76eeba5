//! Session re-derivation on wallet events, and the single-writer rule.

use alloy::primitives::U256;
use getset::blockchain::simulated::DEV_ACCOUNTS;
use getset::blockchain::ProviderEvent;
use getset::view::SessionStatus;
use getset::SessionError;

mod common;

#[tokio::test]
async fn test_account_switch_rebinds() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    controller.deposit_funds("1").await.unwrap();
    controller.get_balance().await.unwrap();
    let watcher = controller.watch_provider_events().unwrap();

    wallet.switch_account(DEV_ACCOUNTS[1]);
    let state = common::wait_for_state(&controller, |s| s.account == Some(DEV_ACCOUNTS[1])).await;
    assert_eq!(state.session, SessionStatus::Connected);
    assert!(state.balance.is_none());

    assert_eq!(controller.get_balance().await.unwrap(), "0.0");
    controller.set_value("9").await.unwrap();
    assert_eq!(wallet.sent_transactions().last().unwrap().from, DEV_ACCOUNTS[1]);

    watcher.abort();
}

#[tokio::test]
async fn test_locked_wallet_clears_session() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    wallet.lock();
    controller
        .handle_provider_event(ProviderEvent::AccountsChanged(Vec::new()))
        .await;

    let state = controller.state();
    assert_eq!(state.session, SessionStatus::Disconnected);
    assert!(state.account.is_none());
    assert_eq!(
        controller.get_value().await.unwrap_err(),
        SessionError::NotConnected
    );
}

#[tokio::test]
async fn test_chain_switch_drops_identity() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    wallet.switch_chain(5);
    controller
        .handle_provider_event(ProviderEvent::ChainChanged(5))
        .await;

    assert!(matches!(
        controller.set_value("1").await.unwrap_err(),
        SessionError::NotConnected
    ));
    assert_eq!(wallet.signing_prompts(), 0);
}

#[tokio::test]
async fn test_second_write_is_rejected_while_pending() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    wallet.set_auto_mine(false);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.set_value("42").await })
    };
    common::wait_for_broadcast(&wallet, 1).await;

    let state = common::wait_for_state(&controller, |s| s.pending_tx.is_some()).await;
    assert_eq!(state.stored_value.as_deref(), Some("42"));

    assert_eq!(
        controller.set_value("7").await.unwrap_err(),
        SessionError::OperationInProgress
    );
    assert_eq!(
        controller.deposit_funds("0.1").await.unwrap_err(),
        SessionError::OperationInProgress
    );
    assert_eq!(wallet.sent_transactions().len(), 1);

    assert_eq!(wallet.mine(), 1);
    first.await.unwrap().unwrap();

    assert_eq!(wallet.stored_value(), U256::from(42));
    let state = controller.state();
    assert!(state.pending_tx.is_none());
    assert_eq!(state.stored_value.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_no_provider_ends_session() {
    let controller = getset::view::ViewController::new(
        getset::session::WalletConnector::new(None, common::CHAIN_ID),
        common::descriptor(),
        common::coordinator(),
    );
    assert!(controller.watch_provider_events().is_none());

    assert_eq!(
        controller.connect_wallet().await.unwrap_err(),
        SessionError::ProviderUnavailable
    );
    assert_eq!(controller.state().session, SessionStatus::Ended);
    assert_eq!(
        controller.deposit_funds("1").await.unwrap_err(),
        SessionError::ProviderUnavailable
    );
}

#[tokio::test]
async fn test_account_round_trip_keeps_pending_write_exclusive() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    wallet.set_auto_mine(false);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.set_value("42").await })
    };
    common::wait_for_broadcast(&wallet, 1).await;

    wallet.switch_account(DEV_ACCOUNTS[1]);
    controller
        .handle_provider_event(ProviderEvent::AccountsChanged(vec![DEV_ACCOUNTS[1], DEV_ACCOUNTS[0]]))
        .await;
    wallet.switch_account(DEV_ACCOUNTS[0]);
    controller
        .handle_provider_event(ProviderEvent::AccountsChanged(vec![DEV_ACCOUNTS[0], DEV_ACCOUNTS[1]]))
        .await;
    assert_eq!(controller.state().account, Some(DEV_ACCOUNTS[0]));

    assert_eq!(
        controller.set_value("7").await.unwrap_err(),
        SessionError::OperationInProgress
    );
    assert_eq!(wallet.sent_transactions().len(), 1);

    wallet.mine();
    first.await.unwrap().unwrap();
    controller.set_value("7").await.unwrap();
    assert_eq!(wallet.stored_value(), U256::from(7));
}

#[tokio::test]
async fn test_confirmed_write_wins_over_stale_read() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    wallet.set_auto_mine(false);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.set_value("42").await })
    };
    common::wait_for_broadcast(&wallet, 1).await;
    common::wait_for_state(&controller, |s| s.pending_tx.is_some()).await;

    // Still the old value on chain while the write is pending.
    assert_eq!(controller.get_value().await.unwrap(), "0");
    assert_eq!(controller.state().stored_value.as_deref(), Some("0"));

    wallet.mine();
    first.await.unwrap().unwrap();

    assert_eq!(wallet.stored_value(), U256::from(42));
    assert_eq!(controller.state().stored_value.as_deref(), Some("42"));
}
