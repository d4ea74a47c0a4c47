//! The ledger-side escrow state machine: initialize, deposit, distribute.
//!
//! [`EscrowLedger`] owns the entry arena and the token custody layer. The
//! host platform executes each operation as one serialized unit with
//! exclusive write access to the accounts it touches; within an operation,
//! every check runs before the first mutation, so an error leaves the ledger
//! untouched and a success completes in full.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::address::{
    derive_escrow_address, derive_vault_authority, Address, VaultAuthority,
};
use crate::distribute::{plan_payouts, DistributionMode};
use crate::error::{EscrowError, TokenError};
use crate::escrow::EscrowEntry;
use crate::identity::Identity;
use crate::token::{associated_token_address, Authorization, TokenStore};
use crate::Result;

/// Escrow entries and token custody, keyed by derived address.
///
/// The derivation functions are the sole constructors of valid keys: every
/// caller-supplied address is recomputed and compared before use.
#[derive(Debug, Default, Clone)]
pub struct EscrowLedger {
    entries: BTreeMap<Address, EscrowEntry>,
    tokens: TokenStore,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token custody layer, for hosts creating and funding accounts.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenStore {
        &mut self.tokens
    }

    /// Read an entry for audit. Entries are never deleted.
    pub fn entry(&self, escrow: &Address) -> Result<&EscrowEntry> {
        self.entries
            .get(escrow)
            .ok_or(EscrowError::UnknownEscrow(*escrow))
    }

    /// Current balance of an escrow's custody vault.
    pub fn vault_balance(&self, escrow: &Address) -> Result<u64> {
        let entry = self.entry(escrow)?;
        Ok(self.tokens.balance(&entry.vault)?)
    }

    /// Create an escrow entry and its custody vault.
    ///
    /// `owner` is the authorizing signer. Returns the derived entry address,
    /// which every later operation against this escrow must supply.
    pub fn initialize(&mut self, owner: &Identity, name: &str, token: Identity) -> Result<Address> {
        let derived = derive_escrow_address(owner, name)?;
        if self.entries.contains_key(&derived.address) {
            return Err(EscrowError::AlreadyInitialized);
        }
        let authority = derive_vault_authority(&derived.address)?;
        let vault = self.tokens.create_associated(authority.address, token)?;
        let entry = EscrowEntry::new(*owner, name.to_string(), token, vault, authority.bump);
        self.entries.insert(derived.address, entry);
        info!(escrow = %derived.address, owner = %owner, name, "escrow initialized");
        Ok(derived.address)
    }

    /// Record a contributor's deposit and move funds into the vault.
    ///
    /// `contributor` is the authorizing signer; funds come from their
    /// associated token account for the escrow's mint.
    pub fn deposit(
        &mut self,
        contributor: &Identity,
        escrow: &Address,
        name: &str,
        amount: u64,
    ) -> Result<()> {
        let entry = self.entry(escrow)?;
        Self::verify_entry_address(entry, escrow, name)?;
        entry.check_deposit(contributor, amount)?;
        let vault = entry.vault;
        let source = associated_token_address(&Address::from(*contributor), &entry.token);
        self.tokens
            .transfer(&source, &vault, amount, Authorization::Signer(contributor))?;
        self.entries
            .get_mut(escrow)
            .ok_or(EscrowError::UnknownEscrow(*escrow))?
            .record_deposit(*contributor, amount)?;
        debug!(escrow = %escrow, contributor = %contributor, amount, "deposit recorded");
        Ok(())
    }

    /// Pay out the vault under `mode` and close the escrow.
    ///
    /// `signer` must be the entry's owner. `destinations` lists each
    /// contributor's payout account in ledger order; any length or
    /// positional discrepancy fails closed before funds move.
    pub fn distribute(
        &mut self,
        signer: &Identity,
        escrow: &Address,
        name: &str,
        mode: u8,
        target: Identity,
        destinations: &[Address],
    ) -> Result<()> {
        let entry = self.entry(escrow)?;
        Self::verify_entry_address(entry, escrow, name)?;
        if entry.owner != *signer {
            return Err(EscrowError::Unauthorized);
        }
        if !entry.is_open() {
            return Err(EscrowError::EscrowClosed);
        }
        let mode = DistributionMode::from_wire(mode, target)?;
        Self::verify_destinations(entry, destinations)?;

        let token = entry.token;
        let vault = entry.vault;
        let bump = entry.vault_authority_bump;
        let vault_balance = self.tokens.balance(&vault)?;
        let plan = plan_payouts(entry, vault_balance, &mode)?;

        let transfers: Vec<(Address, u64)> = plan
            .iter()
            .filter(|payout| payout.amount > 0)
            .map(|payout| {
                (
                    associated_token_address(&Address::from(payout.recipient), &token),
                    payout.amount,
                )
            })
            .collect();
        for (destination, amount) in &transfers {
            let account = self.tokens.account(destination)?;
            if account.mint != token {
                return Err(TokenError::MintMismatch.into());
            }
            account
                .balance
                .checked_add(*amount)
                .ok_or(TokenError::BalanceOverflow)?;
        }

        // All checks passed; the transfers below operate on validated state
        // and the status transition commits with them as one unit.
        let authority = VaultAuthority::reconstruct(escrow, bump)?;
        for (destination, amount) in &transfers {
            self.tokens
                .transfer(&vault, destination, *amount, Authorization::Vault(&authority))?;
        }
        self.entries
            .get_mut(escrow)
            .ok_or(EscrowError::UnknownEscrow(*escrow))?
            .mark_distributed()?;
        debug_assert_eq!(self.tokens.balance(&vault), Ok(0));
        info!(
            escrow = %escrow,
            mode = mode.wire_code(),
            recipients = transfers.len(),
            "escrow distributed"
        );
        Ok(())
    }

    fn verify_entry_address(entry: &EscrowEntry, supplied: &Address, name: &str) -> Result<()> {
        let derived = derive_escrow_address(&entry.owner, name)?;
        if !derived.address.ct_matches(supplied) {
            return Err(EscrowError::AddressMismatch);
        }
        Ok(())
    }

    /// Pair the supplied destination list with the contributor ledger,
    /// failing closed on any length or positional mismatch.
    fn verify_destinations(entry: &EscrowEntry, destinations: &[Address]) -> Result<()> {
        if destinations.len() != entry.contributors.len() {
            return Err(EscrowError::AccountMismatch);
        }
        for (line, supplied) in entry.contributors.iter().zip(destinations) {
            let expected =
                associated_token_address(&Address::from(line.contributor), &entry.token);
            if !expected.ct_matches(supplied) {
                return Err(EscrowError::AccountMismatch);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_creates_an_empty_open_entry_and_vault() {
        let mut ledger = EscrowLedger::new();
        let owner = Identity::digest("owner");
        let mint = Identity::digest("mint");
        let escrow = ledger.initialize(&owner, "pool", mint).unwrap();

        let entry = ledger.entry(&escrow).unwrap();
        assert_eq!(entry.owner, owner);
        assert_eq!(entry.token, mint);
        assert!(entry.contributors.is_empty());
        assert!(entry.is_open());
        assert_eq!(ledger.vault_balance(&escrow).unwrap(), 0);
    }

    #[test]
    fn initialize_rejects_bad_names() {
        let mut ledger = EscrowLedger::new();
        let owner = Identity::digest("owner");
        let mint = Identity::digest("mint");
        assert!(matches!(
            ledger.initialize(&owner, "", mint).unwrap_err(),
            EscrowError::InvalidSeed(_)
        ));
        assert!(matches!(
            ledger.initialize(&owner, &"n".repeat(40), mint).unwrap_err(),
            EscrowError::InvalidSeed(_)
        ));
    }

    #[test]
    fn operations_against_unknown_addresses_fail_closed() {
        let mut ledger = EscrowLedger::new();
        let owner = Identity::digest("owner");
        let nowhere = Address::new([9u8; 32]);
        assert_eq!(
            ledger.deposit(&owner, &nowhere, "pool", 1).unwrap_err(),
            EscrowError::UnknownEscrow(nowhere)
        );
        assert_eq!(
            ledger
                .distribute(&owner, &nowhere, "pool", 0, owner, &[])
                .unwrap_err(),
            EscrowError::UnknownEscrow(nowhere)
        );
    }
}
