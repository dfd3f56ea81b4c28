//! Tests for the configuration loader: file merge over defaults, gate
//! object transport, validation, and save/reload round-trips.

use modwire_engine::config::{ConfigBuilder, ConfigLoader, EngineConfig};
use modwire_engine::container::Container;
use modwire_domain::condition::Condition;
use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::Token;

#[test]
fn defaults_apply_without_a_file() {
    let config = ConfigLoader::new()
        .with_config_path("/nonexistent/modwire.toml")
        .load()
        .unwrap();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.events.history_limit, None);
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modwire.toml");
    std::fs::write(
        &path,
        r#"
[logging]
level = "debug"
json_format = true

[events]
history_limit = 256

[gate.cache]
provider = "redis"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
    assert_eq!(config.events.history_limit, Some(256));
    assert_eq!(
        config.gate.pointer("/cache/provider"),
        Some(&serde_json::json!("redis"))
    );
}

#[test]
fn invalid_log_level_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modwire.toml");
    std::fs::write(&path, "[logging]\nlevel = \"verbose\"\n").unwrap();

    assert!(ConfigLoader::new().with_config_path(&path).load().is_err());
}

#[test]
fn saved_configuration_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modwire.toml");

    let config = ConfigBuilder::new()
        .with_history_limit(64)
        .with_gate(serde_json::json!({ "features": { "audit": "on" } }))
        .build();

    let loader = ConfigLoader::new().with_config_path(&path);
    loader.save_to_file(&config, &path).unwrap();
    let reloaded: EngineConfig = loader.load().unwrap();

    assert_eq!(reloaded.events.history_limit, Some(64));
    assert_eq!(
        reloaded.gate.pointer("/features/audit"),
        Some(&serde_json::json!("on"))
    );
}

#[test]
fn loader_output_drives_the_conditional_gate() {
    let config = ConfigBuilder::new()
        .with_gate(serde_json::json!({ "features": { "audit": "on" } }))
        .build();

    let container = Container::builder()
        .without_process_env()
        .with_engine_config(&config)
        .build();

    container.register_provider(
        ProviderDescriptor::value_of(Token::named("AUDIT_SINK"), "stdout")
            .when(Condition::config_equals("features.audit", "on")),
    );
    assert!(container.resolve(&Token::named("AUDIT_SINK")).is_ok());
}
