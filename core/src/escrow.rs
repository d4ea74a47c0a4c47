//! Escrow ledger entries and contributor bookkeeping.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{EscrowError, TokenError};
use crate::identity::Identity;
use crate::Result;

/// Most contributors one distribution can address in a single execution.
pub const MAX_CONTRIBUTORS: usize = 5;

/// One contributor's cumulative stake in an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Contribution {
    pub contributor: Identity,
    pub amount: u64,
}

/// Lifecycle of an escrow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum EscrowStatus {
    /// Accepting deposits.
    Open,
    /// Paid out. Terminal.
    Distributed,
}

/// The persisted record for one named escrow.
///
/// Entries are never deleted: a distributed escrow remains as an auditable
/// terminal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct EscrowEntry {
    /// Controlling party. Immutable after creation.
    pub owner: Identity,
    /// With `owner`, uniquely identifies the escrow instance.
    pub name: String,
    /// Token kind this escrow accepts. Immutable.
    pub token: Identity,
    /// Custody vault token account.
    pub vault: Address,
    /// Derivation metadata for the vault authority's signing capability.
    pub vault_authority_bump: u8,
    /// Deposit ledger in insertion order, one line per contributor.
    pub contributors: Vec<Contribution>,
    pub status: EscrowStatus,
}

impl EscrowEntry {
    pub(crate) fn new(
        owner: Identity,
        name: String,
        token: Identity,
        vault: Address,
        vault_authority_bump: u8,
    ) -> Self {
        Self {
            owner,
            name,
            token,
            vault,
            vault_authority_bump,
            contributors: Vec::new(),
            status: EscrowStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == EscrowStatus::Open
    }

    /// Cumulative amount deposited by `contributor`, if any.
    pub fn contribution_of(&self, contributor: &Identity) -> Option<u64> {
        self.contributors
            .iter()
            .find(|line| line.contributor == *contributor)
            .map(|line| line.amount)
    }

    /// Sum of all recorded contributions.
    pub fn total_deposited(&self) -> u64 {
        self.contributors
            .iter()
            .fold(0u64, |sum, line| sum.saturating_add(line.amount))
    }

    /// Validate a prospective deposit without mutating the entry.
    pub fn check_deposit(&self, contributor: &Identity, amount: u64) -> Result<()> {
        if !self.is_open() {
            return Err(EscrowError::EscrowClosed);
        }
        if amount == 0 {
            return Err(TokenError::ZeroAmount.into());
        }
        match self.contribution_of(contributor) {
            Some(existing) => {
                existing
                    .checked_add(amount)
                    .ok_or(TokenError::BalanceOverflow)?;
            }
            None if self.contributors.len() >= MAX_CONTRIBUTORS => {
                return Err(EscrowError::TooManyContributors);
            }
            None => {}
        }
        Ok(())
    }

    /// Accumulate onto an existing ledger line, or append a new one.
    pub(crate) fn record_deposit(&mut self, contributor: Identity, amount: u64) -> Result<()> {
        self.check_deposit(&contributor, amount)?;
        match self
            .contributors
            .iter_mut()
            .find(|line| line.contributor == contributor)
        {
            Some(line) => {
                line.amount = line
                    .amount
                    .checked_add(amount)
                    .ok_or(TokenError::BalanceOverflow)?;
            }
            None => self.contributors.push(Contribution {
                contributor,
                amount,
            }),
        }
        Ok(())
    }

    /// Move to the terminal state.
    pub(crate) fn mark_distributed(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(EscrowError::EscrowClosed);
        }
        self.status = EscrowStatus::Distributed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_escrow_address;

    fn entry() -> EscrowEntry {
        let owner = Identity::digest("owner");
        let escrow = derive_escrow_address(&owner, "pool").unwrap();
        EscrowEntry::new(
            owner,
            "pool".to_string(),
            Identity::digest("mint"),
            escrow.address,
            7,
        )
    }

    #[test]
    fn repeat_deposits_accumulate_into_one_line() {
        let mut entry = entry();
        let alice = Identity::digest("alice");
        entry.record_deposit(alice, 5).unwrap();
        entry.record_deposit(alice, 3).unwrap();
        assert_eq!(entry.contributors.len(), 1);
        assert_eq!(entry.contribution_of(&alice), Some(8));
        assert_eq!(entry.total_deposited(), 8);
    }

    #[test]
    fn ledger_preserves_insertion_order() {
        let mut entry = entry();
        for index in 0..3 {
            entry
                .record_deposit(Identity::digest(format!("c{index}")), 10)
                .unwrap();
        }
        let order: Vec<Identity> = entry
            .contributors
            .iter()
            .map(|line| line.contributor)
            .collect();
        assert_eq!(
            order,
            vec![
                Identity::digest("c0"),
                Identity::digest("c1"),
                Identity::digest("c2"),
            ]
        );
    }

    #[test]
    fn capacity_bound_rejects_new_contributors_only() {
        let mut entry = entry();
        for index in 0..MAX_CONTRIBUTORS {
            entry
                .record_deposit(Identity::digest(format!("c{index}")), 1)
                .unwrap();
        }
        assert_eq!(
            entry.record_deposit(Identity::digest("late"), 1).unwrap_err(),
            EscrowError::TooManyContributors
        );
        // Accumulating onto an existing line still works at capacity.
        entry.record_deposit(Identity::digest("c0"), 4).unwrap();
        assert_eq!(entry.contribution_of(&Identity::digest("c0")), Some(5));
    }

    #[test]
    fn closed_entries_reject_deposits() {
        let mut entry = entry();
        entry.record_deposit(Identity::digest("alice"), 5).unwrap();
        entry.mark_distributed().unwrap();
        assert_eq!(
            entry.record_deposit(Identity::digest("alice"), 5).unwrap_err(),
            EscrowError::EscrowClosed
        );
        assert_eq!(entry.mark_distributed().unwrap_err(), EscrowError::EscrowClosed);
    }

    #[test]
    fn deposit_validation_catches_zero_and_overflow() {
        let mut entry = entry();
        let alice = Identity::digest("alice");
        assert_eq!(
            entry.check_deposit(&alice, 0).unwrap_err(),
            EscrowError::Token(TokenError::ZeroAmount)
        );
        entry.record_deposit(alice, u64::MAX).unwrap();
        assert_eq!(
            entry.check_deposit(&alice, 1).unwrap_err(),
            EscrowError::Token(TokenError::BalanceOverflow)
        );
    }
}
