// ABOUTME: Diagnostics accumulator for non-fatal advisories during a deploy.
// ABOUTME: Advisories are shown to the user but never fail the deploy.

use crate::output::Output;

/// Collects non-fatal warnings during a deploy.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Record a warning and show it to the user immediately.
    pub fn report(&mut self, output: &Output, warning: Warning) {
        output.warning(&warning.message);
        self.warn(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning collected during a deploy.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Advisory text produced by config validation.
    pub fn config_advisory(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ConfigAdvisory,
            message: message.into(),
        }
    }

    /// A Dockerfile found in the working directory lost to the configured one.
    pub fn ignored_dockerfile(path: &std::path::Path) -> Self {
        Self {
            kind: WarningKind::IgnoredDockerfile,
            message: format!("Ignoring {} due to config", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    ConfigAdvisory,
    IgnoredDockerfile,
}
