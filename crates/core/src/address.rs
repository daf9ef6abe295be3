//! BankAddress - Identifier of a bank (lending pool)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of a bank account on the ledger.
///
/// Opaque to the engine; it is only compared and used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankAddress(String);

impl BankAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First and last four characters, for log lines
    pub fn short(&self) -> String {
        if self.0.len() <= 8 || !self.0.is_ascii() {
            return self.0.clone();
        }
        format!("{}..{}", &self.0[..4], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for BankAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BankAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl From<&str> for BankAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
