//! Ad-block method definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// AdBlockMethod selects the mechanism that enforces blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdBlockMethod {
    /// System-level blocking (hosts file with root access)
    Root,
    /// Local VPN intercepting DNS queries
    #[default]
    Vpn,
}

impl AdBlockMethod {
    /// Parse a method from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "root" => Some(AdBlockMethod::Root),
            "vpn" => Some(AdBlockMethod::Vpn),
            _ => None,
        }
    }

    /// Get the internal name of this method.
    pub fn name(&self) -> &'static str {
        match self {
            AdBlockMethod::Root => "root",
            AdBlockMethod::Vpn => "vpn",
        }
    }

    /// Get the display name of this method.
    pub fn display_name(&self) -> &'static str {
        match self {
            AdBlockMethod::Root => "Root",
            AdBlockMethod::Vpn => "VPN",
        }
    }

    /// Whether this method intercepts queries itself and keeps a host cache and query log.
    pub fn intercepts_queries(&self) -> bool {
        matches!(self, AdBlockMethod::Vpn)
    }
}

impl fmt::Display for AdBlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AdBlockMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::InvalidMethod(s.to_string()))
    }
}

/// Information about an ad-block method (for UI listings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Internal name of the method
    pub name: String,
    /// Display name for UI
    pub display_name: String,
}

impl MethodInfo {
    /// Create a new MethodInfo.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Get information about all available ad-block methods.
pub fn available_methods() -> Vec<MethodInfo> {
    [AdBlockMethod::Root, AdBlockMethod::Vpn]
        .iter()
        .map(|m| MethodInfo::new(m.name(), m.display_name()))
        .collect()
}
