//! Contract subsystem.
//!
//! # Data Flow
//! ```text
//! contract_data/<Name>-address.json + <Name>.json
//!     → artifact.rs (read files)
//!     → descriptor.rs (address + ABI, immutable, shared via Arc)
//!     → binding.rs (descriptor + signing identity → typed handle)
//!         → schema.rs (argument/return kinds, validation, ABI coding)
//!     → units.rs (ether ↔ wei, UI boundary only)
//! ```

pub mod artifact;
pub mod binding;
pub mod descriptor;
pub mod schema;
pub mod units;

pub use binding::ContractBindingHandle;
pub use descriptor::ContractDescriptor;
pub use schema::{CallKind, InterfaceSchema, MethodSchema};
