//! Enforcement mode: the switch between the vulnerable and hardened path of
//! each lab.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Which behavior path a lab component takes.
///
/// The same component demonstrates a flaw (`Permissive`) and its fix
/// (`Enforced`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Deliberately insecure: no lockout, no ownership check, no escaping.
    Permissive,
    /// Hardened behavior.
    Enforced,
}

impl EnforcementMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EnforcementMode::Permissive => "permissive",
            EnforcementMode::Enforced => "enforced",
        }
    }

    pub fn is_enforced(self) -> bool {
        matches!(self, EnforcementMode::Enforced)
    }
}

impl core::fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcementMode {
    type Err = DomainError;

    /// Accepts the lab UI's names too (`weak`/`vulnerable`, `secure`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" | "weak" | "vulnerable" => Ok(EnforcementMode::Permissive),
            "enforced" | "secure" => Ok(EnforcementMode::Enforced),
            other => Err(DomainError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lab_aliases() {
        assert_eq!("weak".parse::<EnforcementMode>().unwrap(), EnforcementMode::Permissive);
        assert_eq!("Vulnerable".parse::<EnforcementMode>().unwrap(), EnforcementMode::Permissive);
        assert_eq!("secure".parse::<EnforcementMode>().unwrap(), EnforcementMode::Enforced);
        assert_eq!("enforced".parse::<EnforcementMode>().unwrap(), EnforcementMode::Enforced);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "strict".parse::<EnforcementMode>().unwrap_err();
        assert_eq!(err, DomainError::UnknownMode("strict".to_string()));
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EnforcementMode::Enforced).unwrap(),
            "\"enforced\""
        );
    }
}
