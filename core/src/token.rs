//! Fungible-token custody: accounts, balances, authorized transfers.
//!
//! Models the host platform's token service to the extent custody requires:
//! an account arena keyed by address, one canonical associated account per
//! `(authority, mint)`, and a transfer primitive that honors either an
//! external signer or the ledger's internally held vault authority.

use std::collections::BTreeMap;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{Address, VaultAuthority};
use crate::error::TokenError;
use crate::identity::Identity;

const ASSOCIATED_SEED: &[u8] = b"associated-token";

/// One token-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TokenAccount {
    /// Token kind held by this account.
    pub mint: Identity,
    /// Address allowed to debit the account.
    pub authority: Address,
    /// Current balance, in base units.
    pub balance: u64,
}

/// Who authorizes a debit.
#[derive(Debug, Clone, Copy)]
pub enum Authorization<'a> {
    /// The transaction signer owns the source account.
    Signer(&'a Identity),
    /// The core's derived vault authority owns the source account.
    Vault(&'a VaultAuthority),
}

impl Authorization<'_> {
    fn address(&self) -> Address {
        match self {
            Self::Signer(identity) => Address::from(**identity),
            Self::Vault(authority) => authority.address(),
        }
    }
}

/// Canonical token-account address for an authority and mint.
pub fn associated_token_address(authority: &Address, mint: &Identity) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ASSOCIATED_SEED);
    hasher.update(authority.as_bytes());
    hasher.update(mint.as_bytes());
    Address::new(hasher.finalize().into())
}

/// Arena of token accounts keyed by address.
#[derive(Debug, Default, Clone)]
pub struct TokenStore {
    accounts: BTreeMap<Address, TokenAccount>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty account at `address`.
    pub fn create_account(
        &mut self,
        address: Address,
        mint: Identity,
        authority: Address,
    ) -> Result<(), TokenError> {
        if self.accounts.contains_key(&address) {
            return Err(TokenError::AccountExists(address));
        }
        self.accounts.insert(
            address,
            TokenAccount {
                mint,
                authority,
                balance: 0,
            },
        );
        Ok(())
    }

    /// Create the canonical account for `(authority, mint)`; returns its address.
    pub fn create_associated(
        &mut self,
        authority: Address,
        mint: Identity,
    ) -> Result<Address, TokenError> {
        let address = associated_token_address(&authority, &mint);
        self.create_account(address, mint, authority)?;
        Ok(address)
    }

    pub fn account(&self, address: &Address) -> Result<&TokenAccount, TokenError> {
        self.accounts
            .get(address)
            .ok_or(TokenError::UnknownAccount(*address))
    }

    pub fn balance(&self, address: &Address) -> Result<u64, TokenError> {
        Ok(self.account(address)?.balance)
    }

    /// Issuance primitive for hosts funding accounts.
    pub fn mint_to(&mut self, address: &Address, amount: u64) -> Result<(), TokenError> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or(TokenError::UnknownAccount(*address))?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        Ok(())
    }

    /// Move `amount` between two accounts of the same mint.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u64,
        authorization: Authorization<'_>,
    ) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let source = self.account(from)?;
        let destination = self.account(to)?;
        if source.mint != destination.mint {
            return Err(TokenError::MintMismatch);
        }
        if source.authority != authorization.address() {
            return Err(TokenError::WrongAuthority);
        }
        if source.balance < amount {
            return Err(TokenError::InsufficientFunds {
                balance: source.balance,
                requested: amount,
            });
        }
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or(TokenError::BalanceOverflow)?;
        if from == to {
            // Debit and credit cancel out on the same account.
            return Ok(());
        }
        let debited = source.balance - amount;
        if let Some(account) = self.accounts.get_mut(from) {
            account.balance = debited;
        }
        if let Some(account) = self.accounts.get_mut(to) {
            account.balance = credited;
        }
        Ok(())
    }
}
