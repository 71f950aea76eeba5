//! End-to-end user flows against the simulated wallet.

use alloy::primitives::U256;
use getset::blockchain::simulated::{Decision, DEV_ACCOUNTS};
use getset::view::{NotificationLevel, SessionStatus};
use getset::SessionError;

mod common;

#[tokio::test]
async fn test_set_then_get() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    let confirmed = controller.set_value("42").await.unwrap();
    assert_eq!(confirmed.label, "set(uint256)");
    assert_eq!(wallet.stored_value(), U256::from(42));

    assert_eq!(controller.get_value().await.unwrap(), "42");

    let state = controller.state();
    assert_eq!(state.stored_value.as_deref(), Some("42"));
    assert!(state.pending_tx.is_none());
    let notification = state.notification.unwrap();
    assert_eq!(notification.level, NotificationLevel::Info);
    assert_eq!(notification.message, "Value set successfully!");
}

#[tokio::test]
async fn test_deposit_sends_exact_wei() {
    let (wallet, controller) = common::setup();
    let account = controller.connect_wallet().await.unwrap();
    assert_eq!(account, DEV_ACCOUNTS[0]);

    controller.deposit_funds("0.5").await.unwrap();

    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value, U256::from(500_000_000_000_000_000u64));
    assert!(sent[0].input.is_empty());
    assert_eq!(wallet.deposit_of(account), U256::from(500_000_000_000_000_000u64));

    assert_eq!(controller.get_balance().await.unwrap(), "0.5");
    assert_eq!(controller.state().balance.as_deref(), Some("0.5"));
}

#[tokio::test]
async fn test_reads_never_prompt() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    controller.get_value().await.unwrap();
    controller.get_balance().await.unwrap();

    assert_eq!(wallet.signing_prompts(), 0);
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let (wallet, controller) = common::setup();
    let first = controller.connect_wallet().await.unwrap();
    let second = controller.connect_wallet().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(wallet.account_prompts(), 1);
}

#[tokio::test]
async fn test_rejected_signature() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    controller.set_value("42").await.unwrap();

    wallet.set_signing(Decision::Reject);
    let err = controller.set_value("7").await.unwrap_err();
    assert!(matches!(err, SessionError::SubmissionRejected(_)));

    let state = controller.state();
    assert_eq!(state.stored_value.as_deref(), Some("42"));
    assert!(state.pending_tx.is_none());
    assert_eq!(state.notification.unwrap().level, NotificationLevel::Error);
    assert_eq!(wallet.stored_value(), U256::from(42));

    // The write slot was released by the failed submission.
    wallet.set_signing(Decision::Approve);
    controller.set_value("7").await.unwrap();
    assert_eq!(wallet.stored_value(), U256::from(7));
}

#[tokio::test]
async fn test_reverted_write_restores_value() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();
    controller.set_value("42").await.unwrap();

    wallet.revert_next();
    let err = controller.set_value("7").await.unwrap_err();
    assert!(matches!(err, SessionError::TxFailed(_)));

    assert_eq!(controller.state().stored_value.as_deref(), Some("42"));
    assert_eq!(controller.get_value().await.unwrap(), "42");
}

#[tokio::test]
async fn test_access_rejected_then_approved() {
    let (wallet, controller) = common::setup();
    wallet.set_access(Decision::Reject);

    assert_eq!(
        controller.connect_wallet().await.unwrap_err(),
        SessionError::UserRejected
    );
    assert_eq!(controller.state().session, SessionStatus::Disconnected);

    wallet.set_access(Decision::Approve);
    controller.connect_wallet().await.unwrap();
    assert_eq!(controller.state().session, SessionStatus::Connected);
    assert_eq!(wallet.account_prompts(), 2);
}

#[tokio::test]
async fn test_wrong_chain() {
    let (_wallet, controller) = common::setup_on_chain(5);
    let err = controller.connect_wallet().await.unwrap_err();
    assert_eq!(
        err,
        SessionError::ChainMismatch {
            expected: common::CHAIN_ID,
            actual: 5
        }
    );
    assert!(controller.state().account.is_none());
}

#[tokio::test]
async fn test_network_outage_is_recoverable() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    wallet.set_offline(true);
    assert!(matches!(
        controller.get_value().await.unwrap_err(),
        SessionError::NetworkError(_)
    ));
    assert_eq!(controller.state().session, SessionStatus::Connected);

    wallet.set_offline(false);
    assert_eq!(controller.get_value().await.unwrap(), "0");
}

#[tokio::test]
async fn test_invalid_amounts_are_rejected_locally() {
    let (wallet, controller) = common::setup();
    controller.connect_wallet().await.unwrap();

    for amount in ["0", "", "abc", "-1", "0.0000000000000000001"] {
        assert!(
            matches!(
                controller.deposit_funds(amount).await.unwrap_err(),
                SessionError::InvalidInput(_)
            ),
            "amount {:?} should be rejected",
            amount
        );
    }
    assert_eq!(wallet.signing_prompts(), 0);
}
