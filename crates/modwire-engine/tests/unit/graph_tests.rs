//! Tests for the module graph walker: depth-first order, diamond-import
//! idempotence, dynamic and forward module references, and the flattened
//! controller/bootstrap surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use modwire_domain::error::Error;
use modwire_domain::events::LifecycleEventKind;
use modwire_domain::module::{ModuleDescriptor, ModuleRef};
use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::Token;
use modwire_engine::container::Container;

fn container() -> Container {
    Container::builder().without_process_env().build()
}

#[test]
fn diamond_import_registers_the_shared_module_once() {
    let container = container();

    let shared = Arc::new(
        ModuleDescriptor::new("shared")
            .with_provider(ProviderDescriptor::value_of(Token::named("SHARED"), 1_u32))
            .with_controller(Token::named("SharedController")),
    );
    let left = ModuleDescriptor::new("left")
        .with_import(ModuleRef::Direct(shared.clone()))
        .into_ref();
    let right = ModuleDescriptor::new("right")
        .with_import(ModuleRef::Direct(shared.clone()))
        .into_ref();
    let root = ModuleDescriptor::new("root")
        .with_import(left)
        .with_import(right)
        .into_ref();

    let summary = container.register_module(&root).unwrap();

    assert_eq!(summary.modules, vec!["shared", "left", "right", "root"]);
    assert_eq!(summary.controllers.len(), 1);

    let registrations = container
        .events()
        .history()
        .into_iter()
        .filter(|event| {
            matches!(
                &event.kind,
                LifecycleEventKind::ProviderRegistered { token, .. } if token == "SHARED"
            )
        })
        .count();
    assert_eq!(registrations, 1);
}

#[test]
fn imports_register_before_the_importing_module() {
    let container = container();

    let base = ModuleDescriptor::new("base")
        .with_provider(ProviderDescriptor::value_of(Token::named("BASE"), 1_u32))
        .into_ref();
    let app = ModuleDescriptor::new("app")
        .with_import(base)
        .with_provider(ProviderDescriptor::value_of(Token::named("DERIVED"), 2_u32))
        .into_ref();

    container.register_module(&app).unwrap();

    let tokens: Vec<String> = container
        .events()
        .history_by_prefix("provider.registered")
        .into_iter()
        .filter_map(|event| match event.kind {
            LifecycleEventKind::ProviderRegistered { token, .. } => Some(token),
            _ => None,
        })
        .collect();
    assert_eq!(tokens, vec!["BASE", "DERIVED"]);
}

#[test]
fn dynamic_modules_materialize_before_registration() {
    let container = container();

    let dynamic = ModuleRef::dynamic(|| {
        Ok(Arc::new(ModuleDescriptor::new("generated").with_provider(
            ProviderDescriptor::value_of(Token::named("GENERATED"), 3_u32),
        )))
    });
    let root = ModuleDescriptor::new("root").with_import(dynamic).into_ref();

    container.register_module(&root).unwrap();
    assert!(container.resolve(&Token::named("GENERATED")).is_ok());
}

#[test]
fn failing_module_thunk_aborts_the_walk() {
    let container = container();

    let broken = ModuleRef::forward(|| Err(Error::deferred_reference("module not compiled yet")));
    let root = ModuleDescriptor::new("root")
        .with_provider(ProviderDescriptor::value_of(Token::named("ROOT"), 1_u32))
        .with_import(broken)
        .into_ref();

    match container.register_module(&root) {
        Err(Error::DeferredReference { message }) => {
            assert!(message.contains("module not compiled"));
        }
        other => panic!("expected DeferredReference, got {other:?}"),
    }
    // No partial-graph recovery: the root module itself never registered.
    assert!(container.resolve(&Token::named("ROOT")).is_err());
}

#[test]
fn controller_duplicates_are_preserved() {
    let container = container();

    let first = ModuleDescriptor::new("first")
        .with_controller(Token::named("HealthController"))
        .into_ref();
    let second = ModuleDescriptor::new("second")
        .with_controller(Token::named("HealthController"))
        .into_ref();
    let root = ModuleDescriptor::new("root")
        .with_import(first)
        .with_import(second)
        .into_ref();

    container.register_module(&root).unwrap();
    // Duplicates allowed; callers deduplicate if needed.
    assert_eq!(container.controllers().len(), 2);
}

#[test]
fn bootstrap_resolves_every_bootstrap_token_eagerly() {
    struct Warmup;

    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = constructed.clone();

    let container = container();
    container.register_class::<Warmup, _>(vec![], move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Warmup)
    });

    let root = ModuleDescriptor::new("root")
        .with_bootstrap(Token::of::<Warmup>())
        .into_ref();
    container.register_module(&root).unwrap();

    assert_eq!(constructed.load(Ordering::SeqCst), 0);
    container.bootstrap().unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(container.bootstrap_tokens().len(), 1);
}

#[test]
fn summaries_accumulate_across_registrations() {
    let container = container();

    let first = ModuleDescriptor::new("first")
        .with_controller(Token::named("A"))
        .into_ref();
    let second = ModuleDescriptor::new("second")
        .with_controller(Token::named("B"))
        .into_ref();

    container.register_module(&first).unwrap();
    container.register_module(&second).unwrap();

    let summary = container.graph_summary();
    assert_eq!(summary.modules, vec!["first", "second"]);
    assert_eq!(summary.controllers.len(), 2);
}
