// ABOUTME: Integration tests for app config parsing, discovery, and resolution.
// ABOUTME: Tests YAML parsing, env overrides, remote fallback, and validation.

mod support;

use hangar::config::*;
use hangar::diagnostics::{Diagnostics, WarningKind};
use hangar::options::DeployOptions;
use hangar::output::Output;
use hangar::types::AppName;
use std::time::Duration;
use support::{FakeControlPlane, app, summary};

mod parsing {
    use super::*;

    #[test]
    fn parse_full_config() {
        let yaml = r#"
app: web
primary_region: ams
platform: machines

env:
  RAILS_ENV: production
  LOG_LEVEL: info

build:
  dockerfile: Dockerfile.prod
  build_target: release
  args:
    RUBY_VERSION: "3.3"

deploy:
  strategy: rolling
  release_command: bin/rails db:migrate

processes:
  app: bin/rails server
  worker: bin/jobs

services:
  - internal_port: 3000
    processes: [app]
    ports:
      - port: 443
        handlers: [tls, http]

checks:
  alive:
    type: http
    port: 3000
    path: /up
    interval: 15s
    timeout: 2s
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.app.as_ref().map(AppName::as_str), Some("web"));
        assert_eq!(config.platform, Some(Platform::Machines));
        assert_eq!(config.env.len(), 2);
        assert_eq!(config.dockerfile(), Some("Dockerfile.prod"));
        assert_eq!(config.docker_build_target(), Some("release"));
        assert_eq!(config.deploy_strategy(), Some("rolling"));
        assert_eq!(
            config.process_groups(),
            vec!["app".to_string(), "worker".to_string()]
        );
        assert_eq!(config.services[0].protocol, "tcp");
        assert_eq!(config.services[0].ports[0].handlers, vec!["tls", "http"]);

        let check = &config.checks["alive"];
        assert_eq!(check.kind, CheckKind::Http);
        assert_eq!(check.interval, Some(Duration::from_secs(15)));
        assert!(config.ensure_machines_config().is_ok());
    }

    #[test]
    fn legacy_platform_alias_parses() {
        let config = AppConfig::from_yaml("platform: nomad\n").unwrap();
        assert_eq!(config.platform, Some(Platform::Releases));
    }

    #[test]
    fn invalid_app_name_is_rejected() {
        assert!(AppConfig::from_yaml("app: Web_App\n").is_err());
    }

    #[test]
    fn build_strategies_are_listed() {
        let config = AppConfig::from_yaml(
            "build:\n  image: nginx:1.27\n  dockerfile: Dockerfile\n",
        )
        .unwrap();
        assert_eq!(
            config.build_strategies(),
            vec!["the \"nginx:1.27\" docker image", "a dockerfile"]
        );
    }
}

mod discovery {
    use super::*;
    use std::fs;

    #[test]
    fn finds_hangar_yml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hangar.yml"), "app: web\n").unwrap();

        let config = AppConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(config.config_path(), dir.path().join("hangar.yml"));
    }

    #[test]
    fn finds_config_in_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".hangar")).unwrap();
        fs::write(dir.path().join(".hangar/config.yml"), "app: web\n").unwrap();

        assert!(AppConfig::discover(dir.path()).unwrap().is_some());
    }

    #[test]
    fn missing_config_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::discover(dir.path()).unwrap().is_none());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}

mod resolution {
    use super::*;

    fn control_plane() -> FakeControlPlane {
        FakeControlPlane::new(summary(true, None))
    }

    #[tokio::test]
    async fn env_overrides_merge_last_write_wins() {
        let cp = control_plane();
        let output = Output::quiet();
        let mut opts = DeployOptions::new(app(), "/srv/web");
        opts.env = vec![
            "LOG_LEVEL=debug".to_string(),
            "NEW=1".to_string(),
            "NEW=2".to_string(),
        ];
        let local = AppConfig::from_yaml("primary_region: ams\nenv:\n  LOG_LEVEL: info\n  KEEP: yes\n")
            .unwrap();

        let config = ConfigResolver::new(&cp, &output)
            .resolve(&opts, Some(local), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(config.env["LOG_LEVEL"], "debug");
        assert_eq!(config.env["NEW"], "2");
        assert_eq!(config.env["KEEP"], "yes");
        assert!(cp.calls().is_empty(), "local config needs no remote calls");
    }

    #[tokio::test]
    async fn malformed_env_aborts_resolution() {
        let cp = control_plane();
        let output = Output::quiet();
        let mut opts = DeployOptions::new(app(), "/srv/web");
        opts.env = vec!["BROKEN".to_string()];

        let err = ConfigResolver::new(&cp, &output)
            .resolve(&opts, Some(AppConfig::default()), &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed parsing environment: "));
    }

    #[tokio::test]
    async fn app_flag_wins_over_config_name() {
        let cp = control_plane();
        let output = Output::quiet();
        let opts = DeployOptions::new(AppName::new("web-staging").unwrap(), "/srv/web");
        let local = AppConfig::from_yaml("app: web\nprimary_region: ams\n").unwrap();

        let config = ConfigResolver::new(&cp, &output)
            .resolve(&opts, Some(local), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(config.app.as_ref().map(AppName::as_str), Some("web-staging"));
    }

    #[tokio::test]
    async fn region_flag_overwrites_primary_region() {
        let cp = control_plane();
        let output = Output::quiet();
        let mut opts = DeployOptions::new(app(), "/srv/web");
        opts.region = Some("syd".to_string());
        let local = AppConfig::from_yaml("primary_region: ams\n").unwrap();

        let config = ConfigResolver::new(&cp, &output)
            .resolve(&opts, Some(local), &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(config.primary_region, "syd");
    }

    #[tokio::test]
    async fn falls_back_to_remote_config() {
        let mut cp = control_plane();
        cp.remote_config = Some(AppConfig::from_yaml("primary_region: ord\n").unwrap());
        let output = Output::quiet();

        let config = ConfigResolver::new(&cp, &output)
            .resolve(&DeployOptions::new(app(), "/srv/web"), None, &mut Diagnostics::default())
            .await
            .unwrap();

        assert_eq!(config.primary_region, "ord");
        assert_eq!(cp.calls(), vec!["config_source"]);
    }

    #[tokio::test]
    async fn remote_client_failure_is_reported() {
        let cp = control_plane();
        let output = Output::quiet();

        let err = ConfigResolver::new(&cp, &output)
            .resolve(&DeployOptions::new(app(), "/srv/web"), None, &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("could not create config client: "));
    }

    #[tokio::test]
    async fn advisories_are_reported_but_not_fatal() {
        let cp = control_plane();
        let output = Output::quiet();
        let mut diag = Diagnostics::default();

        ConfigResolver::new(&cp, &output)
            .resolve(&DeployOptions::new(app(), "/srv/web"), Some(AppConfig::default()), &mut diag)
            .await
            .unwrap();

        assert!(diag.has(WarningKind::ConfigAdvisory));
    }

    #[tokio::test]
    async fn hard_validation_errors_abort() {
        let cp = control_plane();
        let output = Output::quiet();
        let local = AppConfig::from_yaml("primary_region: ams\ndeploy:\n  strategy: yolo\n").unwrap();

        let err = ConfigResolver::new(&cp, &output)
            .resolve(&DeployOptions::new(app(), "/srv/web"), Some(local), &mut Diagnostics::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("unknown deploy strategy 'yolo'"));
    }
}
