//! Wallet session: connection, identity, and its invalidation.

pub mod connector;
pub mod identity;

pub use connector::WalletConnector;
pub use identity::{AccountSlot, SigningIdentity, WriteSlot};
