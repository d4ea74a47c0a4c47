//! Deterministic derivation of escrow and vault-authority addresses.
//!
//! Derived addresses are domain-tagged SHA-256 digests pushed off the Ed25519
//! key plane, so no independently held private key can sign for them. The
//! derivation is a pure function of its seeds: the initializer and every
//! later caller recompute the same addresses with no shared off-band state.

use std::fmt;

use bincode::{Decode, Encode};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AddressError;
use crate::identity::Identity;

/// Seed tag for escrow entry addresses.
const ESCROW_SEED: &[u8] = b"escrow";
/// Seed tag for vault authority addresses.
const VAULT_AUTHORITY_SEED: &[u8] = b"vault-auth";
/// Trailing marker keeping derived addresses in their own digest domain.
const DERIVED_MARKER: &[u8] = b"SplitpoolDerivedAddress";

/// Longest accepted `name` seed, in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// A 32-byte account address.
#[serde_as]
#[derive(
    Serialize, Deserialize, Encode, Decode, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Address(#[serde_as(as = "Hex")] [u8; 32]);

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time equality, for comparisons on the authorization path.
    pub fn ct_matches(&self, other: &Address) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).unwrap_u8() == 1
    }
}

impl From<Identity> for Address {
    /// The wallet address of an identity.
    fn from(identity: Identity) -> Self {
        Self(*identity.as_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// An address together with the bump byte that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

fn seed_digest(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(DERIVED_MARKER);
    hasher.finalize().into()
}

/// A candidate sits on the key plane when its bytes decode to a valid
/// Ed25519 point, i.e. a private key could exist for it.
fn on_key_plane(candidate: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(candidate).is_ok()
}

/// Walk bumps from 255 downward until a candidate lands off the key plane.
fn find_derived_address(seeds: &[&[u8]]) -> Result<DerivedAddress, AddressError> {
    for bump in (0..=u8::MAX).rev() {
        let candidate = seed_digest(seeds, bump);
        if !on_key_plane(&candidate) {
            return Ok(DerivedAddress {
                address: Address(candidate),
                bump,
            });
        }
    }
    Err(AddressError::BumpExhausted)
}

fn validate_name(name: &str) -> Result<(), AddressError> {
    if name.is_empty() {
        return Err(AddressError::EmptySeed);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AddressError::SeedTooLong(name.len()));
    }
    Ok(())
}

/// Derive the entry address for `(owner, name)`.
pub fn derive_escrow_address(
    owner: &Identity,
    name: &str,
) -> Result<DerivedAddress, AddressError> {
    validate_name(name)?;
    find_derived_address(&[ESCROW_SEED, owner.as_bytes(), name.as_bytes()])
}

/// Derive the vault authority for an escrow entry address.
pub fn derive_vault_authority(escrow: &Address) -> Result<DerivedAddress, AddressError> {
    find_derived_address(&[VAULT_AUTHORITY_SEED, escrow.as_bytes()])
}

/// Signing capability over a vault authority address.
///
/// There is no public constructor: the ledger reconstructs one from an
/// entry's stored bump and hands it to the token layer to authorize vault
/// debits. Callers can never forge the capability, so vault funds move only
/// through the core's own deposit and distribution paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAuthority {
    address: Address,
    bump: u8,
}

impl VaultAuthority {
    pub(crate) fn reconstruct(escrow: &Address, bump: u8) -> Result<Self, AddressError> {
        let derived = derive_vault_authority(escrow)?;
        if derived.bump != bump {
            return Err(AddressError::BumpMismatch {
                expected: derived.bump,
                actual: bump,
            });
        }
        Ok(Self {
            address: derived.address,
            bump,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn bump(&self) -> u8 {
        self.bump
    }
}
