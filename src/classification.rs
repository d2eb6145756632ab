//! Classification verdicts for host names.

use std::fmt;

/// Classification is the verdict for a host name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Let the query through
    Allowed,
    /// Answer with a blocked (null) address
    Blocked,
    /// Answer with the given redirection target
    Redirected(String),
}

impl Classification {
    /// Parse a list type name (case-insensitive).
    ///
    /// `REDIRECTED` needs a target and is therefore not accepted here,
    /// use [`Classification::redirect`] instead.
    pub fn parse_list(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALLOWED" | "ALLOW" => Some(Classification::Allowed),
            "BLOCKED" | "BLOCK" => Some(Classification::Blocked),
            _ => None,
        }
    }

    /// Create a redirection to `target`.
    pub fn redirect(target: impl Into<String>) -> Self {
        Classification::Redirected(target.into())
    }

    /// Get the list type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Allowed => "ALLOWED",
            Classification::Blocked => "BLOCKED",
            Classification::Redirected(_) => "REDIRECTED",
        }
    }

    /// Whether queries for this host must be intercepted.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Classification::Allowed)
    }

    /// Get the redirection target, if any.
    pub fn redirection(&self) -> Option<&str> {
        match self {
            Classification::Redirected(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Redirected(target) => write!(f, "REDIRECTED({})", target),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// HostEntry is the result of classifying a host name.
///
/// `host` holds the rule key that produced the verdict, which is either the
/// queried host itself or a `*.suffix` wildcard key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostEntry {
    pub host: String,
    pub classification: Classification,
}

impl HostEntry {
    /// Create a new HostEntry.
    pub fn new(host: impl Into<String>, classification: Classification) -> Self {
        Self {
            host: host.into(),
            classification,
        }
    }

    /// Whether this entry came from a wildcard rule.
    pub fn is_wildcard(&self) -> bool {
        self.host.starts_with('*')
    }
}
