//! Wallet session and transaction lifecycle controller for a GetSet contract.

pub mod blockchain;
pub mod config;
pub mod contract;
pub mod error;
pub mod observability;
pub mod session;
pub mod view;

pub use config::schema::AppConfig;
pub use error::{SessionError, SessionResult};
pub use view::{ViewController, ViewState};
