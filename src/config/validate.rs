// ABOUTME: Structural validation of a resolved app config.
// ABOUTME: Separates advisories (printed) from hard errors (abort the deploy).

use super::{AppConfig, ConfigError, Result};

const KNOWN_STRATEGIES: &[&str] = &["rolling", "immediate", "canary", "bluegreen"];

/// Outcome of validating a config.
#[derive(Debug, Default)]
pub struct Validation {
    pub advisories: Vec<String>,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse the hard errors into a single `ConfigError`.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.errors.join("; ")))
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Validation {
        let mut report = Validation::default();

        if self.app.is_none() {
            report.errors.push("missing app name".to_string());
        }

        if self.primary_region.is_empty() {
            report
                .advisories
                .push("no primary_region set; the platform will pick one".to_string());
        } else if !self
            .primary_region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            report.errors.push(format!(
                "primary_region '{}' must be a lowercase region code",
                self.primary_region
            ));
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains(char::is_whitespace) {
                report
                    .errors
                    .push(format!("env key '{key}' is not a valid variable name"));
            }
        }

        if let Some(build) = &self.build
            && build.args.keys().any(|k| k.trim().is_empty())
        {
            report.errors.push("build args cannot have empty names".to_string());
        }

        let strategies = self.build_strategies();
        if strategies.len() > 1 {
            report.advisories.push(format!(
                "more than one build configuration found: [{}]",
                strategies.join(", ")
            ));
        }

        if let Some(strategy) = self.deploy_strategy() {
            let normalized = strategy.to_ascii_lowercase().replace(['-', '_'], "");
            if !KNOWN_STRATEGIES.contains(&normalized.as_str()) {
                report.errors.push(format!(
                    "unknown deploy strategy '{strategy}', expected one of: {}",
                    KNOWN_STRATEGIES.join(", ")
                ));
            }
        }

        report
    }
}
