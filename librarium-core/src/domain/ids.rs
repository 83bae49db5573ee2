use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Newtype pattern for LibraryUid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LibraryUid(pub Uuid);

impl LibraryUid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LibraryUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LibraryUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LibraryUid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<LibraryUid> for Uuid {
    fn from(id: LibraryUid) -> Self {
        id.0
    }
}

/// Newtype pattern for BookUid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BookUid(pub Uuid);

impl BookUid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BookUid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<BookUid> for Uuid {
    fn from(id: BookUid) -> Self {
        id.0
    }
}

/// Newtype pattern for ReservationUid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ReservationUid(pub Uuid);

impl ReservationUid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReservationUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReservationUid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ReservationUid> for Uuid {
    fn from(id: ReservationUid) -> Self {
        id.0
    }
}

/// User identity as carried on the X-User-Name channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parse an identity value as carried on the wire, rejecting blanks.
    pub fn parse(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(crate::CoreError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Username {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
