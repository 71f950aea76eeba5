//! Session and transaction metrics.
//!
//! # Metrics
//! - `getset_wallet_connections_total` (counter): connection attempts by outcome
//! - `getset_tx_submitted_total` (counter): transactions broadcast
//! - `getset_tx_confirmed_total` (counter): transactions confirmed
//! - `getset_tx_failed_total` (counter): submissions or confirmations that failed, by stage
//! - `getset_tx_confirmation_seconds` (histogram): submit-to-terminal latency
//!
//! Only the `metrics` facade is used here; installing a recorder is up to
//! the embedding application.

use std::time::Duration;

/// Record a connection attempt.
pub fn record_connection(outcome: &'static str) {
    metrics::counter!("getset_wallet_connections_total", "outcome" => outcome).increment(1);
}

/// Record a broadcast transaction.
pub fn record_tx_submitted(kind: &'static str) {
    metrics::counter!("getset_tx_submitted_total", "kind" => kind).increment(1);
}

/// Record a confirmed transaction.
pub fn record_tx_confirmed(elapsed: Duration) {
    metrics::counter!("getset_tx_confirmed_total").increment(1);
    metrics::histogram!("getset_tx_confirmation_seconds", "outcome" => "confirmed")
        .record(elapsed.as_secs_f64());
}

/// Record a failure at `stage` ("submit" or "confirm").
pub fn record_tx_failed(stage: &'static str, elapsed: Option<Duration>) {
    metrics::counter!("getset_tx_failed_total", "stage" => stage).increment(1);
    if let Some(elapsed) = elapsed {
        metrics::histogram!("getset_tx_confirmation_seconds", "outcome" => "failed")
            .record(elapsed.as_secs_f64());
    }
}
