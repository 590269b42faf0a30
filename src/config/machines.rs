// ABOUTME: Structural normalization required before a machines rollout.
// ABOUTME: Rejects process/service/check combinations machines can't express.

use super::{AppConfig, CheckKind, ConfigError, Result};

/// Process group used when the config declares none.
pub const DEFAULT_PROCESS_GROUP: &str = "app";

fn valid_group_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

impl AppConfig {
    /// Names of all process groups, or the default group when none are declared.
    pub fn process_groups(&self) -> Vec<String> {
        if self.processes.is_empty() {
            vec![DEFAULT_PROCESS_GROUP.to_string()]
        } else {
            self.processes.keys().cloned().collect()
        }
    }

    /// Check that this config can be expressed as a set of machines.
    ///
    /// Calling this more than once is harmless; it never mutates the config.
    pub fn ensure_machines_config(&self) -> Result<()> {
        let groups = self.process_groups();
        let mut problems = Vec::new();

        for (name, command) in &self.processes {
            if !valid_group_name(name) {
                problems.push(format!(
                    "process group '{name}' may only contain lowercase letters, digits, '-' and '_'"
                ));
            }
            if command.trim().is_empty() {
                problems.push(format!("process group '{name}' has an empty command"));
            }
        }

        for (idx, service) in self.services.iter().enumerate() {
            if service.internal_port == 0 {
                problems.push(format!("services[{idx}] needs an internal_port"));
            }
            for group in &service.processes {
                if !groups.contains(group) {
                    problems.push(format!(
                        "services[{idx}] references unknown process group '{group}'"
                    ));
                }
            }
        }

        for (name, check) in &self.checks {
            if check.port.is_none() {
                problems.push(format!("check '{name}' needs a port"));
            }
            if check.kind == CheckKind::Http && check.path.as_deref().is_none_or(str::is_empty) {
                problems.push(format!("http check '{name}' needs a path"));
            }
            for group in &check.processes {
                if !groups.contains(group) {
                    problems.push(format!(
                        "check '{name}' references unknown process group '{group}'"
                    ));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MachinesIncompatible(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_compatible() {
        assert!(AppConfig::default().ensure_machines_config().is_ok());
    }

    #[test]
    fn default_group_is_implicit() {
        let config = AppConfig::from_yaml(
            r#"
services:
  - internal_port: 8080
    processes: [app]
"#,
        )
        .unwrap();
        assert_eq!(config.process_groups(), vec!["app".to_string()]);
        assert!(config.ensure_machines_config().is_ok());
    }

    #[test]
    fn unknown_process_group_is_rejected() {
        let config = AppConfig::from_yaml(
            r#"
processes:
  web: "bin/server"
services:
  - internal_port: 8080
    processes: [worker]
"#,
        )
        .unwrap();
        let err = config.ensure_machines_config().unwrap_err();
        assert!(err.to_string().contains("unknown process group 'worker'"));
    }

    #[test]
    fn http_check_needs_path_and_port() {
        let config = AppConfig::from_yaml(
            r#"
checks:
  alive:
    type: http
    interval: 10s
"#,
        )
        .unwrap();
        let err = config.ensure_machines_config().unwrap_err().to_string();
        assert!(err.contains("needs a port"));
        assert!(err.contains("needs a path"));
    }
}
