//! Pooled-contribution escrow with deterministic payout strategies.
//!
//! # Overview
//!
//! A Splitpool escrow is one named, owner-scoped record tracking pooled
//! deposits and their eventual distribution. Independent contributors
//! deposit a fungible token into a custody vault whose only authority is a
//! derived, keyless address; the owner later closes the escrow by
//! distributing the pooled balance under one of the deterministic payout
//! strategies (winner-take-all, or an equal split that excludes one party).
//!
//! This crate is the ledger-side core: address derivation, entry
//! bookkeeping, token custody, and the atomic initialize / deposit /
//! distribute state machine. It assumes a host platform that executes each
//! operation as one serialized unit against durable account storage;
//! consensus, transaction transport, and key management stay with the host.
//!
//! # Usage
//!
//! ```
//! use splitpool_core::{Address, EscrowLedger, Identity};
//!
//! # fn main() -> splitpool_core::Result<()> {
//! let mut ledger = EscrowLedger::new();
//! let mint = Identity::digest("token-mint");
//! let owner = Identity::digest("owner");
//! let alice = Identity::digest("alice");
//!
//! let escrow = ledger.initialize(&owner, "launch-pool", mint)?;
//!
//! let alice_account = ledger
//!     .tokens_mut()
//!     .create_associated(Address::from(alice), mint)?;
//! ledger.tokens_mut().mint_to(&alice_account, 25)?;
//!
//! ledger.deposit(&alice, &escrow, "launch-pool", 25)?;
//! assert_eq!(ledger.vault_balance(&escrow)?, 25);
//!
//! let destinations = [alice_account];
//! ledger.distribute(&owner, &escrow, "launch-pool", 0, alice, &destinations)?;
//! assert_eq!(ledger.vault_balance(&escrow)?, 0);
//! # Ok(())
//! # }
//! ```

/// Deterministic derivation of escrow and vault-authority addresses.
pub mod address;
/// Payout strategy planning.
pub mod distribute;
pub mod error;
/// Escrow ledger entries and contributor bookkeeping.
pub mod escrow;
/// Identities of parties and token kinds.
pub mod identity;
/// Host-facing serialization surfaces.
pub mod interface;
/// The instruction-level state machine.
pub mod ledger;
/// Fungible-token custody model.
pub mod token;

pub use address::{
    derive_escrow_address, derive_vault_authority, Address, DerivedAddress, VaultAuthority,
    MAX_NAME_LEN,
};
pub use distribute::{
    plan_payouts, DistributionMode, Payout, MODE_EQUAL_SPLIT_EXCLUDING, MODE_WINNER_TAKE_ALL,
};
pub use error::{AddressError, EscrowError, IdentityError, TokenError};
pub use escrow::{Contribution, EscrowEntry, EscrowStatus, MAX_CONTRIBUTORS};
pub use identity::{Identity, IDENTITY_LEN};
pub use interface::{EscrowMetadata, EscrowParams, Instruction};
pub use ledger::EscrowLedger;
pub use token::{associated_token_address, Authorization, TokenAccount, TokenStore};

pub type Result<T> = std::result::Result<T, error::EscrowError>;
