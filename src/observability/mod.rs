//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connector / coordinator / controller produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! Private keys and raw calldata are never logged; addresses and
//! transaction hashes are.

pub mod logging;
pub mod metrics;
