//! Finding types for lint results

use serde::{Deserialize, Serialize};

/// Severity level derived from a rule's priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

impl Severity {
    /// Map a rule priority to a severity (1 = error, 2 = warning, 3+ = info)
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            1 => Severity::Error,
            2 => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// The priority ordinal this severity corresponds to
    pub fn priority(self) -> u8 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// One reported issue produced by a rule against a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule name that produced this finding
    pub rule: String,

    /// Priority copied from the rule at evaluation time (1 = error, 2 = warning, 3 = info)
    pub priority: u8,

    /// Human-readable message
    pub message: String,

    /// Path of the document evaluated
    pub file_path: String,

    /// Line number (1-based), 0 when the report omitted it
    pub line: u32,
}

impl Finding {
    /// Severity derived from the finding's priority
    pub fn severity(&self) -> Severity {
        Severity::from_priority(self.priority)
    }
}
