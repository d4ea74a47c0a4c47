use thiserror::Error;

use crate::address::Address;

/// Escrow-related errors.
///
/// Every error is detected synchronously, aborts the triggering operation
/// before it mutates any state, and is reported verbatim to the caller.
#[derive(Debug, Error, PartialEq)]
pub enum EscrowError {
    /// An entry already exists for this `(owner, name)` pair.
    #[error("escrow already initialized for this owner and name")]
    AlreadyInitialized,

    /// A derivation seed failed validation.
    #[error("invalid derivation seed: {0}")]
    InvalidSeed(#[from] AddressError),

    /// The entry is terminal; no further deposits or distributions.
    #[error("escrow is closed to further operations")]
    EscrowClosed,

    /// The contributor ledger is at capacity.
    #[error("contributor ledger is at capacity")]
    TooManyContributors,

    /// The signer is not the entry's owner.
    #[error("signer is not the escrow owner")]
    Unauthorized,

    /// The supplied destination list does not align with the contributor
    /// ledger, by length or by position.
    #[error("destination accounts do not match the contributor ledger")]
    AccountMismatch,

    /// Distribution mode outside the supported set.
    #[error("unsupported distribution mode {0}")]
    UnsupportedMode(u8),

    /// An exclusion left nobody to pay.
    #[error("no eligible recipients for distribution")]
    NoEligibleRecipients,

    /// A caller-supplied address does not recompute to its derivation.
    #[error("supplied address does not match its derivation")]
    AddressMismatch,

    /// No entry exists at the supplied address.
    #[error("no escrow entry at {0}")]
    UnknownEscrow(Address),

    /// The vault holds nothing to distribute.
    #[error("vault holds no funds to distribute")]
    EmptyVault,

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Errors that might occur while parsing an [`Identity`](crate::Identity).
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,

    #[error("identity must be {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },

    #[error("unsupported identity format")]
    UnsupportedFormat,
}

/// Errors from address derivation.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("derivation seed is empty")]
    EmptySeed,

    #[error("derivation seed too long: {0} bytes")]
    SeedTooLong(usize),

    #[error("no viable bump for these derivation seeds")]
    BumpExhausted,

    #[error("stored bump {actual} does not reproduce the derivation (expected {expected})")]
    BumpMismatch { expected: u8, actual: u8 },
}

/// Errors from the token custody layer.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("no token account at {0}")]
    UnknownAccount(Address),

    #[error("token account already exists at {0}")]
    AccountExists(Address),

    #[error("token account mint does not match")]
    MintMismatch,

    #[error("authority cannot move funds from this account")]
    WrongAuthority,
}
