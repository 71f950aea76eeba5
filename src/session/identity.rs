//! Signing identity produced by a successful connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::blockchain::provider::WalletProvider;
use crate::error::{SessionError, SessionResult};

#[derive(Debug, Default)]
struct IdentityToken {
    revoked: AtomicBool,
}

/// Per-account write lock, shared by every identity built for one address.
pub type AccountSlot = Arc<Mutex<()>>;

/// An authorized account plus the capability to sign and send through the
/// provider that authorized it.
///
/// Clones share one revocation token: once the connector revokes the
/// identity, every clone (and every binding built from one) stops working.
/// The write slot outlives the identity: a reconnection to the same account
/// gets the same slot, so a write still pending from an earlier connection
/// keeps blocking new ones.
#[derive(Clone)]
pub struct SigningIdentity {
    address: Address,
    chain_id: u64,
    provider: Arc<dyn WalletProvider>,
    token: Arc<IdentityToken>,
    write_slot: AccountSlot,
}

/// Exclusive right to have one write in flight for an account.
///
/// Released when dropped.
#[derive(Debug)]
pub struct WriteSlot {
    _guard: OwnedMutexGuard<()>,
}

impl SigningIdentity {
    pub(crate) fn new(
        address: Address,
        chain_id: u64,
        provider: Arc<dyn WalletProvider>,
        write_slot: AccountSlot,
    ) -> Self {
        Self {
            address,
            chain_id,
            provider,
            token: Arc::new(IdentityToken::default()),
            write_slot,
        }
    }

    /// The account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Chain the identity was authorized on.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Provider that signs for this identity.
    pub(crate) fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// Whether the identity is still the session's live identity.
    pub fn is_active(&self) -> bool {
        !self.token.revoked.load(Ordering::SeqCst)
    }

    /// Fail with `NotConnected` once revoked.
    pub fn ensure_active(&self) -> SessionResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::NotConnected)
        }
    }

    pub(crate) fn revoke(&self) {
        if !self.token.revoked.swap(true, Ordering::SeqCst) {
            tracing::info!(address = %self.address, "Signing identity revoked");
        }
    }

    /// Claim the write slot, or fail with `OperationInProgress` if another
    /// write is still pending.
    pub(crate) fn try_acquire_write_slot(&self) -> SessionResult<WriteSlot> {
        self.write_slot
            .clone()
            .try_lock_owned()
            .map(|guard| WriteSlot { _guard: guard })
            .map_err(|_| SessionError::OperationInProgress)
    }

    /// Whether both handles come from the same connection.
    pub fn same_session(&self, other: &SigningIdentity) -> bool {
        Arc::ptr_eq(&self.token, &other.token)
    }
}

impl PartialEq for SigningIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.same_session(other)
    }
}

impl Eq for SigningIdentity {}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("active", &self.is_active())
            .finish()
    }
}
