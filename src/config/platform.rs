// ABOUTME: Platform marker recorded on apps and configs.
// ABOUTME: Distinguishes the release-based scheduler from per-machine orchestration.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Legacy backend: versioned releases scheduled by the control plane.
    #[serde(alias = "nomad")]
    Releases,
    /// Modern backend: machines leased and rolled individually.
    Machines,
}

impl Platform {
    /// Parse a marker recorded by the control plane. Empty or unknown
    /// markers are treated as no marker at all.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "releases" | "nomad" => Some(Platform::Releases),
            "machines" => Some(Platform::Machines),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Releases => "releases",
            Platform::Machines => "machines",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_parse_case_insensitively() {
        assert_eq!(Platform::from_marker("Machines"), Some(Platform::Machines));
        assert_eq!(Platform::from_marker("nomad"), Some(Platform::Releases));
        assert_eq!(Platform::from_marker(""), None);
        assert_eq!(Platform::from_marker("detached"), None);
    }
}
