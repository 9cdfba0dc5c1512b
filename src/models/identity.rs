use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of an authenticated caller.
///
/// Every store operation is scoped to one of these; records are only
/// visible to the identity that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(uuid::Uuid);

impl Identity {
    pub fn new(id: uuid::Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
