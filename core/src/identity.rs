//! Identities of parties and token kinds participating in an escrow.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;
use sha2::{Digest, Sha256};

use crate::error::IdentityError;

/// Fixed byte length of every identity.
pub const IDENTITY_LEN: usize = 32;

/// Cryptographic identity of a participant or token kind.
///
/// Identities are opaque 32-byte values: a wallet's public key hash, a token
/// mint, or whatever stable identifier the host platform assigns. They parse
/// from hex (`0x`-prefixed or bare), base58, or base64 strings, and display
/// as base58.
#[serde_as]
#[derive(
    Serialize, Deserialize, Encode, Decode, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Identity(#[serde_as(as = "Hex")] [u8; IDENTITY_LEN]);

impl Identity {
    pub fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Identity derived as the SHA-256 digest of arbitrary material.
    pub fn digest(material: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(material.as_ref()).into())
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        let bytes = if let Some(stripped) = s.strip_prefix("0x") {
            hex::decode(stripped)?
        } else if s.len() == 2 * IDENTITY_LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(s)?
        } else if let Ok(decoded) = bs58::decode(s).into_vec() {
            decoded
        } else if let Ok(decoded) = BASE64.decode(s) {
            decoded
        } else {
            return Err(IdentityError::UnsupportedFormat);
        };
        let actual = bytes.len();
        let bytes: [u8; IDENTITY_LEN] = bytes.try_into().map_err(|_| IdentityError::BadLength {
            expected: IDENTITY_LEN,
            actual,
        })?;
        Ok(Self(bytes))
    }
}
