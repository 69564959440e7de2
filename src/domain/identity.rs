//! Model identity: the name and version pair a service is bound to.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::IdentityError;

/// Longest model name accepted.
///
/// Leaves room for the `model_server.` prefix, two version numbers and the
/// `.outputs` suffix inside the broker's 249 character topic name limit.
pub const MAX_NAME_LEN: usize = 200;

/// Name and version of a prediction capability.
///
/// Fields are private so every identity has been validated through
/// [`ModelIdentity::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity", into = "RawIdentity")]
pub struct ModelIdentity {
    name: String,
    major_version: u32,
    minor_version: u32,
}

impl ModelIdentity {
    /// Create a validated identity.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the name is empty, too long, or uses
    /// characters outside `[A-Za-z0-9._-]`.
    pub fn try_new(
        name: impl Into<String>,
        major_version: u32,
        minor_version: u32,
    ) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(IdentityError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(IdentityError::IllegalCharacter { name, ch });
        }

        Ok(Self {
            name,
            major_version,
            minor_version,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn major_version(&self) -> u32 {
        self.major_version
    }

    #[must_use]
    pub const fn minor_version(&self) -> u32 {
        self.minor_version
    }

    /// Version rendered as `major.minor`, used as a log field.
    #[must_use]
    pub fn version(&self) -> String {
        format!("{}.{}", self.major_version, self.minor_version)
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{}",
            self.name, self.major_version, self.minor_version
        )
    }
}

#[derive(Serialize, Deserialize)]
struct RawIdentity {
    name: String,
    major_version: u32,
    minor_version: u32,
}

impl TryFrom<RawIdentity> for ModelIdentity {
    type Error = IdentityError;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        Self::try_new(raw.name, raw.major_version, raw.minor_version)
    }
}

impl From<ModelIdentity> for RawIdentity {
    fn from(identity: ModelIdentity) -> Self {
        Self {
            name: identity.name,
            major_version: identity.major_version,
            minor_version: identity.minor_version,
        }
    }
}
