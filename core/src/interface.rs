//! Host-facing (de)serialization: creation parameters, placement metadata,
//! wire instructions, and durable entry encoding.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use bincode::{Decode, Encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::{derive_vault_authority, Address};
use crate::error::EscrowError;
use crate::escrow::{EscrowEntry, EscrowStatus};
use crate::identity::Identity;
use crate::ledger::EscrowLedger;
use crate::Result;

/// Parameters required to create an escrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowParams {
    /// Who will own (and eventually distribute) the escrow.
    pub owner: Identity,
    /// Escrow name; with `owner`, the derivation seed.
    pub name: String,
    /// Token kind the escrow accepts.
    pub token: Identity,
}

/// Placement data a host needs to address a live escrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowMetadata {
    pub escrow_address: Address,
    pub vault: Address,
    pub vault_authority: Address,
    pub vault_authority_bump: u8,
    pub status: EscrowStatus,
}

impl EscrowMetadata {
    /// Snapshot the placement data for a live entry.
    pub fn for_entry(ledger: &EscrowLedger, escrow: &Address) -> Result<Self> {
        let entry = ledger.entry(escrow)?;
        let authority = derive_vault_authority(escrow)?;
        Ok(Self {
            escrow_address: *escrow,
            vault: entry.vault,
            vault_authority: authority.address,
            vault_authority_bump: entry.vault_authority_bump,
            status: entry.status,
        })
    }
}

/// Wire form of the operation surface.
///
/// The signer and any derived addresses travel outside the instruction, as
/// transaction-level facts established by the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum Instruction {
    /// Create an entry and vault. Signed by the owner.
    Initialize { name: String, token: Identity },
    /// Credit the vault and the contributor's ledger line. Signed by the
    /// contributor.
    Deposit { name: String, amount: u64 },
    /// Pay out the vault and close the escrow. Signed by the owner.
    Distribute {
        name: String,
        mode: u8,
        target: Identity,
    },
}

impl Instruction {
    /// Encode for submission.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard()).context("encoding instruction")
    }

    /// Decode from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let (instruction, _) =
            bincode::decode_from_slice::<Self, _>(bytes, bincode::config::standard())
                .context("decoding instruction")?;
        Ok(instruction)
    }
}

impl EscrowLedger {
    /// Dispatch one wire instruction against the ledger.
    ///
    /// `escrow` carries the caller-supplied entry address for deposit and
    /// distribute; `destinations` carries the payout accounts for
    /// distribute. Returns the new entry address for `Initialize`.
    pub fn execute(
        &mut self,
        signer: &Identity,
        escrow: Option<&Address>,
        instruction: Instruction,
        destinations: &[Address],
    ) -> Result<Option<Address>> {
        match instruction {
            Instruction::Initialize { name, token } => {
                Ok(Some(self.initialize(signer, &name, token)?))
            }
            Instruction::Deposit { name, amount } => {
                let escrow = escrow.ok_or(EscrowError::AddressMismatch)?;
                self.deposit(signer, escrow, &name, amount)?;
                Ok(None)
            }
            Instruction::Distribute { name, mode, target } => {
                let escrow = escrow.ok_or(EscrowError::AddressMismatch)?;
                self.distribute(signer, escrow, &name, mode, target, destinations)?;
                Ok(None)
            }
        }
    }
}

/// Encode an entry as durable account data.
pub fn encode_entry(entry: &EscrowEntry) -> anyhow::Result<Vec<u8>> {
    bincode::encode_to_vec(entry, bincode::config::standard()).context("encoding escrow entry")
}

/// Decode an entry from durable account data.
pub fn decode_entry(bytes: &[u8]) -> anyhow::Result<EscrowEntry> {
    let (entry, _) =
        bincode::decode_from_slice::<EscrowEntry, _>(bytes, bincode::config::standard())
            .context("decoding escrow entry")?;
    Ok(entry)
}

/// Reads a JSON-encoded file from `path` and deserializes it into `T`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be opened, read, or parsed.
pub fn load_escrow_data<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading escrow data: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes `data` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or the data
/// cannot be serialized.
pub fn save_escrow_data<P, T>(path: P, data: &T) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, data)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}
