use std::fmt;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Number of random bytes drawn from the operating system CSPRNG per
/// certificate identifier.
pub const CERTIFICATE_ID_BYTES: usize = 16;

/// Length of the encoded identifier. Identifiers are lowercase hex, two
/// characters per byte.
pub const CERTIFICATE_ID_LEN: usize = CERTIFICATE_ID_BYTES * 2;

/// Public, unguessable identifier of one issued certificate.
///
/// Identifiers are never derived from a counter or from attendee data, and
/// a parsed identifier is guaranteed to contain only `[0-9a-f]`, so it is
/// safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId(String);

impl CertificateId {
    /// Mint a fresh identifier from the operating system's secure RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; CERTIFICATE_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse an identifier received from the outside world.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.len() != CERTIFICATE_ID_LEN {
            return Err(IdentifierError::InvalidLength {
                expected: CERTIFICATE_ID_LEN,
                actual: value.len(),
            });
        }
        if !value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(IdentifierError::InvalidCharacter(value.to_owned()));
        }
        Ok(Self(value.to_owned()))
    }

    /// Return the encoded identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CertificateId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.0
    }
}

impl AsRef<str> for CertificateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
