//! Tests for conditional registration: env-equality gating, dotted-path
//! configuration gating, custom predicate precedence, and the
//! treated-as-unregistered failure mode.

use modwire_domain::condition::Condition;
use modwire_domain::error::Error;
use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::Token;
use modwire_engine::container::{Container, RegistrationOutcome};
use serde_json::json;

#[test]
fn env_gated_provider_is_unregistered_when_env_differs() {
    let container = Container::builder()
        .without_process_env()
        .with_env_var("NODE_ENV", "development")
        .build();

    let outcome = container.register_provider(
        ProviderDescriptor::value_of(Token::named("LOG_LEVEL"), "warn")
            .when(Condition::env_equals("NODE_ENV", "production")),
    );
    assert_eq!(outcome, RegistrationOutcome::SkippedByCondition);

    match container.resolve(&Token::named("LOG_LEVEL")) {
        Err(Error::NoProvider { token }) => assert_eq!(token, "LOG_LEVEL"),
        other => panic!("expected NoProvider, got {other:?}"),
    }
}

#[test]
fn env_gated_provider_registers_when_env_matches() {
    let container = Container::builder()
        .without_process_env()
        .with_env_var("NODE_ENV", "production")
        .build();

    container.register_provider(
        ProviderDescriptor::value_of(Token::named("LOG_LEVEL"), "warn")
            .when(Condition::env_equals("NODE_ENV", "production")),
    );

    let value = container.resolve(&Token::named("LOG_LEVEL")).unwrap();
    assert_eq!(*value.downcast::<&str>().unwrap(), "warn");
}

#[test]
fn config_path_condition_walks_the_gate_object() {
    let container = Container::builder()
        .without_process_env()
        .with_gate_config(json!({ "cache": { "provider": "redis" } }))
        .build();

    container.register_provider(
        ProviderDescriptor::value_of(Token::named("REDIS_URL"), "redis://localhost")
            .when(Condition::config_equals("cache.provider", "redis")),
    );
    container.register_provider(
        ProviderDescriptor::value_of(Token::named("MOKA_SIZE"), 10_000_u64)
            .when(Condition::config_equals("cache.provider", "moka")),
    );

    assert!(container.resolve(&Token::named("REDIS_URL")).is_ok());
    assert!(container.resolve(&Token::named("MOKA_SIZE")).is_err());
}

#[test]
fn custom_predicate_outranks_env_checks() {
    let container = Container::builder()
        .without_process_env()
        .with_env_var("NODE_ENV", "production")
        .build();

    let condition = Condition {
        predicate: Some(std::sync::Arc::new(|_| false)),
        env: Some(modwire_domain::condition::EnvEquals {
            var: "NODE_ENV".to_string(),
            expected: "production".to_string(),
        }),
        config: None,
    };
    let outcome = container.register_provider(
        ProviderDescriptor::value_of(Token::named("FEATURE"), true).when(condition),
    );

    assert_eq!(outcome, RegistrationOutcome::SkippedByCondition);
}

#[test]
fn unconditional_provider_under_another_token_is_unaffected() {
    let container = Container::builder()
        .without_process_env()
        .with_env_var("NODE_ENV", "development")
        .build();

    container.register_provider(
        ProviderDescriptor::value_of(Token::named("GATED_CACHE"), "redis")
            .when(Condition::env_equals("NODE_ENV", "production")),
    );
    container.register_provider(ProviderDescriptor::value_of(
        Token::named("FALLBACK_CACHE"),
        "memory",
    ));

    assert!(container.resolve(&Token::named("GATED_CACHE")).is_err());
    assert!(container.resolve(&Token::named("FALLBACK_CACHE")).is_ok());
}

#[test]
fn skipped_registrations_emit_an_event() {
    let container = Container::builder().without_process_env().build();

    container.register_provider(
        ProviderDescriptor::value_of(Token::named("NEVER"), 0_u8)
            .when(Condition::predicate(|_| false)),
    );

    assert_eq!(container.events().history_by_prefix("provider.skipped").len(), 1);
}
