//! Agent network address.
//!
//! # Examples
//!
//! ```
//! use parley_core::models::Aid;
//!
//! let aid = Aid::from("alice.agents.example");
//! assert_eq!(aid.prefix(), "alice");
//! ```

use serde::{Deserialize, Serialize};

/// Unique network address of one agent identity ("AID").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aid(pub String);

impl Aid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading label of the address, up to the first `.`.
    pub fn prefix(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Aid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Aid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Aid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
