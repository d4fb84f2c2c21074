//! Check conclusions and the aggregate build status they reduce to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The result of a single named status check, as reported by the forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckConclusion {
    Success,
    Failure,
    Error,
    Pending,
    InProgress,

    /// Neutral, skipped, cancelled, or anything else the forge invents.
    Other,
}

impl CheckConclusion {
    /// Map a forge conclusion or state string (e.g. `SUCCESS`, `IN_PROGRESS`).
    ///
    /// Matching is case-insensitive.
    pub fn from_forge(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "ERROR" => Self::Error,
            "PENDING" | "EXPECTED" => Self::Pending,
            "IN_PROGRESS" | "QUEUED" => Self::InProgress,
            _ => Self::Other,
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::Error)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Aggregate build status of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failure,
    Pending,
    Unknown,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_strings_map_case_insensitively() {
        let cases = [
            ("SUCCESS", CheckConclusion::Success),
            ("failure", CheckConclusion::Failure),
            ("ERROR", CheckConclusion::Error),
            ("EXPECTED", CheckConclusion::Pending),
            ("QUEUED", CheckConclusion::InProgress),
            ("SKIPPED", CheckConclusion::Other),
            ("", CheckConclusion::Other),
        ];
        for (raw, expected) in cases {
            assert_eq!(CheckConclusion::from_forge(raw), expected, "{raw}");
        }
    }
}
