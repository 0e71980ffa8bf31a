//! Member identities.
//!
//! A member is addressed by an opaque 20-byte identifier. Two values are
//! reserved and can never be members: [`MemberId::NULL`] marks absence and
//! [`MemberId::SENTINEL`] anchors the ring.

use std::fmt;
use std::str::FromStr;

/// Length of a member identity in bytes.
pub const ID_LEN: usize = 20;

/// An opaque, address-like member identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MemberId(pub [u8; ID_LEN]);

impl MemberId {
    /// The absence marker.
    pub const NULL: Self = Self([0; ID_LEN]);

    /// The ring anchor: `0x00..01`.
    pub const SENTINEL: Self = {
        let mut bytes = [0u8; ID_LEN];
        bytes[ID_LEN - 1] = 1;
        Self(bytes)
    };

    /// Create an identity from raw bytes.
    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Derive a deterministic identity from a label.
    ///
    /// Takes the first 20 bytes of the BLAKE3 hash of the label, which makes
    /// collisions with the reserved values practically impossible.
    pub fn derive(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; ID_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..ID_LEN]);
        Self(bytes)
    }

    /// True for `NULL` and `SENTINEL`.
    pub fn is_reserved(&self) -> bool {
        *self == Self::NULL || *self == Self::SENTINEL
    }

    /// Convert to hex string (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)?;
        if bytes.len() != ID_LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps ring dumps readable
        write!(f, "MemberId(0x{}..)", &self.to_hex()[..8])
    }
}

impl FromStr for MemberId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; ID_LEN]> for MemberId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MemberId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MemberId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
