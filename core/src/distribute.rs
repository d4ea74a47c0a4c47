//! Payout strategies over a pooled vault balance.
//!
//! Planning is pure: it reads the contributor ledger and a balance, and
//! produces the exact transfers a distribution will execute. A plan's
//! amounts always sum to the full balance, so applying one empties the
//! vault.

use crate::error::EscrowError;
use crate::escrow::EscrowEntry;
use crate::identity::Identity;
use crate::Result;

/// Wire value selecting [`DistributionMode::WinnerTakeAll`].
pub const MODE_WINNER_TAKE_ALL: u8 = 0;
/// Wire value selecting [`DistributionMode::EqualSplitExcluding`].
pub const MODE_EQUAL_SPLIT_EXCLUDING: u8 = 1;

/// A payout strategy, decoded from its wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionMode {
    /// The entire balance goes to one party, contributor or not.
    WinnerTakeAll { winner: Identity },
    /// Equal shares to every contributor except one. The division remainder
    /// goes to the first eligible contributor in ledger order. Excluding an
    /// identity that never contributed leaves every contributor eligible.
    EqualSplitExcluding { excluded: Identity },
}

impl DistributionMode {
    /// Decode `(mode, target)` as supplied on the instruction surface.
    pub fn from_wire(mode: u8, target: Identity) -> Result<Self> {
        match mode {
            MODE_WINNER_TAKE_ALL => Ok(Self::WinnerTakeAll { winner: target }),
            MODE_EQUAL_SPLIT_EXCLUDING => Ok(Self::EqualSplitExcluding { excluded: target }),
            other => Err(EscrowError::UnsupportedMode(other)),
        }
    }

    pub fn wire_code(&self) -> u8 {
        match self {
            Self::WinnerTakeAll { .. } => MODE_WINNER_TAKE_ALL,
            Self::EqualSplitExcluding { .. } => MODE_EQUAL_SPLIT_EXCLUDING,
        }
    }
}

/// One planned transfer out of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub recipient: Identity,
    pub amount: u64,
}

/// Plan the payouts for `vault_balance` under `mode`.
pub fn plan_payouts(
    entry: &EscrowEntry,
    vault_balance: u64,
    mode: &DistributionMode,
) -> Result<Vec<Payout>> {
    if vault_balance == 0 {
        return Err(EscrowError::EmptyVault);
    }
    match mode {
        DistributionMode::WinnerTakeAll { winner } => Ok(vec![Payout {
            recipient: *winner,
            amount: vault_balance,
        }]),
        DistributionMode::EqualSplitExcluding { excluded } => {
            let eligible: Vec<Identity> = entry
                .contributors
                .iter()
                .map(|line| line.contributor)
                .filter(|contributor| contributor != excluded)
                .collect();
            if eligible.is_empty() {
                return Err(EscrowError::NoEligibleRecipients);
            }
            let count = eligible.len() as u64;
            let share = vault_balance / count;
            let remainder = vault_balance % count;
            Ok(eligible
                .into_iter()
                .enumerate()
                .map(|(index, recipient)| Payout {
                    recipient,
                    amount: if index == 0 { share + remainder } else { share },
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_escrow_address;

    fn entry_with(deposits: &[(&str, u64)]) -> EscrowEntry {
        let owner = Identity::digest("owner");
        let escrow = derive_escrow_address(&owner, "pool").unwrap();
        let mut entry = EscrowEntry::new(
            owner,
            "pool".to_string(),
            Identity::digest("mint"),
            escrow.address,
            3,
        );
        for (label, amount) in deposits {
            entry
                .record_deposit(Identity::digest(label), *amount)
                .unwrap();
        }
        entry
    }

    #[test]
    fn wire_decoding_covers_the_supported_set() {
        let target = Identity::digest("t");
        assert_eq!(
            DistributionMode::from_wire(0, target).unwrap(),
            DistributionMode::WinnerTakeAll { winner: target }
        );
        assert_eq!(
            DistributionMode::from_wire(1, target).unwrap(),
            DistributionMode::EqualSplitExcluding { excluded: target }
        );
        assert_eq!(
            DistributionMode::from_wire(2, target).unwrap_err(),
            EscrowError::UnsupportedMode(2)
        );
    }

    #[test]
    fn winner_takes_the_whole_balance() {
        let entry = entry_with(&[("a", 10), ("b", 15)]);
        let outsider = Identity::digest("outsider");
        let plan = plan_payouts(
            &entry,
            25,
            &DistributionMode::WinnerTakeAll { winner: outsider },
        )
        .unwrap();
        assert_eq!(
            plan,
            vec![Payout {
                recipient: outsider,
                amount: 25,
            }]
        );
    }

    #[test]
    fn split_assigns_remainder_to_first_eligible() {
        let entry = entry_with(&[("a", 5), ("b", 5), ("c", 5), ("d", 5), ("e", 5)]);
        let plan = plan_payouts(
            &entry,
            25,
            &DistributionMode::EqualSplitExcluding {
                excluded: Identity::digest("e"),
            },
        )
        .unwrap();
        let amounts: Vec<u64> = plan.iter().map(|payout| payout.amount).collect();
        assert_eq!(amounts, vec![7, 6, 6, 6]);
        assert_eq!(plan[0].recipient, Identity::digest("a"));
        assert_eq!(amounts.iter().sum::<u64>(), 25);
    }

    #[test]
    fn split_with_exact_division_has_no_remainder() {
        let entry = entry_with(&[("a", 8), ("b", 8)]);
        let plan = plan_payouts(
            &entry,
            16,
            &DistributionMode::EqualSplitExcluding {
                excluded: Identity::digest("outsider"),
            },
        )
        .unwrap();
        let amounts: Vec<u64> = plan.iter().map(|payout| payout.amount).collect();
        assert_eq!(amounts, vec![8, 8]);
    }

    #[test]
    fn excluding_the_sole_contributor_fails() {
        let entry = entry_with(&[("a", 10)]);
        assert_eq!(
            plan_payouts(
                &entry,
                10,
                &DistributionMode::EqualSplitExcluding {
                    excluded: Identity::digest("a"),
                },
            )
            .unwrap_err(),
            EscrowError::NoEligibleRecipients
        );
    }

    #[test]
    fn empty_vault_cannot_be_planned() {
        let entry = entry_with(&[("a", 10)]);
        assert_eq!(
            plan_payouts(
                &entry,
                0,
                &DistributionMode::WinnerTakeAll {
                    winner: Identity::digest("a"),
                },
            )
            .unwrap_err(),
            EscrowError::EmptyVault
        );
    }

    #[test]
    fn share_smaller_than_one_still_sums_to_balance() {
        let entry = entry_with(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
        let plan = plan_payouts(
            &entry,
            3,
            &DistributionMode::EqualSplitExcluding {
                excluded: Identity::digest("outsider"),
            },
        )
        .unwrap();
        let amounts: Vec<u64> = plan.iter().map(|payout| payout.amount).collect();
        assert_eq!(amounts, vec![3, 0, 0, 0]);
    }
}
