//! Opaque resource identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque handle to a loaded resource (texture, shader, data file).
///
/// Zero is reserved as "no resource"; loaders hand out ids starting at 1.
#[derive(Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl ResourceId {
    pub const NONE: Self = Self(0);

    /// Create a ResourceId from a raw value (for deserialization/testing)
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        let id = ResourceId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert!(!id.is_none());
    }

    #[test]
    fn test_default_is_none() {
        assert!(ResourceId::default().is_none());
        assert_eq!(ResourceId::default(), ResourceId::NONE);
    }
}
