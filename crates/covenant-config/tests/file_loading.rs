//! Loading gateway and service configuration from disk.

use std::io::Write;

use covenant_config::{ConfigError, ConfigLoader, LogFormat, ServiceConfig, UnknownRulePolicy};
use tempfile::{Builder, TempDir};

#[test]
fn test_load_complete_toml_file() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
        [server]
        http_addr = "127.0.0.1:9443"
        request_timeout_ms = 5000
        trust_forwarded_headers = true

        [manifest]
        root = "/srv/manifest"
        service_file = "svc.toml"

        [validation]
        unknown_rules = "allow"

        [diagnostics]
        log_failures = false
        expose_in_response = true

        [logging]
        level = "debug"
        format = "pretty"
        "#
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.server.http_addr, "127.0.0.1:9443");
    assert_eq!(config.server.request_timeout_ms, 5000);
    assert!(config.server.trust_forwarded_headers);
    assert_eq!(
        config.manifest.service_file_path().to_str(),
        Some("/srv/manifest/svc.toml")
    );
    assert_eq!(config.validation.unknown_rules, UnknownRulePolicy::Allow);
    assert!(!config.diagnostics.log_failures);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_load_json_file() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"server": {{"http_addr": "127.0.0.1:3000"}}}}"#).unwrap();

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.server.http_addr, "127.0.0.1:3000");
}

#[test]
fn test_unknown_field_in_file_is_rejected() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[server]\nport = 8080").unwrap();

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let file = Builder::new().suffix(".ini").tempfile().unwrap();
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn test_service_file_from_manifest_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("service.toml"),
        "[auth]\nsvcA = \"k1\"\n\n[ident]\niss = \"gateway\"\n",
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_string(
            &format!("[manifest]\nroot = {:?}\n", dir.path().display().to_string()),
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let service = ServiceConfig::from_file(config.manifest.service_file_path()).unwrap();
    assert_eq!(service.key_for("svcA"), Some("k1"));
    assert_eq!(service.own_issuer(), "gateway");
}

#[test]
fn test_missing_service_file() {
    let dir = TempDir::new().unwrap();
    let result = ServiceConfig::from_file(dir.path().join("service.toml"));
    assert!(matches!(result, Err(ConfigError::MissingServiceFile { .. })));
}

#[test]
fn test_log_level_accepts_filter_directive() {
    let config = ConfigLoader::new()
        .with_string(
            "[logging]\nlevel = \"covenant_sentinel=debug,info\"\n",
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.logging.level, "covenant_sentinel=debug,info");
}

#[test]
fn test_log_level_rejects_bad_directive() {
    let result = ConfigLoader::new()
        .with_string("[logging]\nlevel = \"covenant=loud\"\n", "toml")
        .unwrap()
        .load();
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
