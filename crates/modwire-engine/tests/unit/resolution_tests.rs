//! Tests for the core resolution semantics: scope caching, factory argument
//! order, implicit class providers, value precedence, and lazy stand-ins.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use modwire_domain::error::Error;
use modwire_domain::provider::{ProviderDescriptor, ProviderScope};
use modwire_domain::token::{Token, TokenRef};
use modwire_engine::container::Container;
use modwire_engine::resolve::LazyRef;

fn container() -> Container {
    Container::builder().without_process_env().build()
}

struct Widget;

struct Sensor;

#[test]
fn singleton_resolves_to_the_same_instance() {
    let container = container();
    container.register_provider(ProviderDescriptor::class_of::<Widget, _>(vec![], |_| {
        Ok(Widget)
    }));

    let first = container.resolve_as::<Widget>().unwrap();
    let second = container.resolve_as::<Widget>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn transient_resolves_to_fresh_instances() {
    let container = container();
    container.register_provider(
        ProviderDescriptor::class_of::<Widget, _>(vec![], |_| Ok(Widget))
            .with_scope(ProviderScope::Transient),
    );

    let first = container.resolve_as::<Widget>().unwrap();
    let second = container.resolve_as::<Widget>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn factory_receives_dependencies_in_declared_order() {
    struct Reading {
        raw: u32,
    }

    let container = container();
    container.register_provider(ProviderDescriptor::value_of(Token::named("X"), 42_u32));
    container.register_provider(ProviderDescriptor::class_of::<Sensor, _>(vec![], |_| {
        Ok(Sensor)
    }));
    container.register_provider(ProviderDescriptor::factory(
        Token::named("F"),
        vec![
            TokenRef::Direct(Token::named("X")),
            TokenRef::of::<Sensor>(),
        ],
        |deps| {
            let raw = *deps[0].downcast::<u32>()?;
            // the second argument must be the sensor instance
            deps[1].downcast::<Sensor>()?;
            Ok(Reading { raw })
        },
    ));

    let reading = container
        .resolve(&Token::named("F"))
        .unwrap()
        .downcast::<Reading>()
        .unwrap();
    assert_eq!(reading.raw, 42);
}

#[test]
fn factory_results_are_cached_per_scope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let container = container();
    container.register_provider(ProviderDescriptor::factory(
        Token::named("COUNTED"),
        vec![],
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7_u32)
        },
    ));

    container.resolve(&Token::named("COUNTED")).unwrap();
    container.resolve(&Token::named("COUNTED")).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_provider_error_names_the_token() {
    let container = container();
    match container.resolve(&Token::named("MISSING")) {
        Err(Error::NoProvider { token }) => assert_eq!(token, "MISSING"),
        other => panic!("expected NoProvider, got {other:?}"),
    }
}

#[test]
fn cataloged_class_resolves_without_explicit_registration() {
    let container = container();
    container.register_class::<Widget, _>(vec![], |_| Ok(Widget));

    let first = container.resolve_as::<Widget>().unwrap();
    let second = container.resolve_as::<Widget>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn value_registration_survives_later_class_registration() {
    let container = container();
    let token = Token::named("GREETING");

    container.register_provider(ProviderDescriptor::value_of(token.clone(), "configured"));
    container.register_provider(ProviderDescriptor::class(
        token.clone(),
        modwire_domain::provider::ClassSpec::new(Vec::<TokenRef>::new(), |_| Ok(Widget)),
    ));

    let value = container.resolve(&token).unwrap();
    assert_eq!(*value.downcast::<&str>().unwrap(), "configured");

    // A later value registration replaces the earlier value.
    container.register_provider(ProviderDescriptor::value_of(token.clone(), "replaced"));
    let value = container.resolve(&token).unwrap();
    assert_eq!(*value.downcast::<&str>().unwrap(), "replaced");
}

#[test]
fn lazy_provider_defers_construction_until_first_access() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = constructed.clone();

    let container = container();
    container.register_provider(
        ProviderDescriptor::class_of::<Widget, _>(vec![], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Widget)
        })
        .with_lazy(),
    );

    let stand_in = container
        .resolve(&Token::of::<Widget>())
        .unwrap()
        .downcast::<LazyRef>()
        .unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 0);

    let first = stand_in.get_as::<Widget>().unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 1);

    // Subsequent accesses delegate to the resolved target.
    let second = stand_in.get_as::<Widget>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn singleton_lazy_provider_hands_out_one_stand_in() {
    let container = container();
    container.register_provider(
        ProviderDescriptor::class_of::<Widget, _>(vec![], |_| Ok(Widget)).with_lazy(),
    );

    let first = container
        .resolve(&Token::of::<Widget>())
        .unwrap()
        .downcast::<LazyRef>()
        .unwrap();
    let second = container
        .resolve(&Token::of::<Widget>())
        .unwrap()
        .downcast::<LazyRef>()
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn async_factory_is_rejected_by_the_sync_path() {
    use futures::FutureExt;
    use modwire_domain::instance::AnyInstance;

    let container = container();
    container.register_provider(ProviderDescriptor::async_factory(
        Token::named("ASYNC_ONLY"),
        vec![],
        Arc::new(|_| async { Ok(Arc::new(5_u32) as AnyInstance) }.boxed()),
    ));

    match container.resolve(&Token::named("ASYNC_ONLY")) {
        Err(Error::SyncResolveUnsupported { token }) => assert_eq!(token, "ASYNC_ONLY"),
        other => panic!("expected SyncResolveUnsupported, got {other:?}"),
    }
}

#[test]
fn containers_are_independent() {
    let first = container();
    let second = container();

    first.register_provider(ProviderDescriptor::value_of(Token::named("ONLY_FIRST"), 1_u8));

    assert!(first.resolve(&Token::named("ONLY_FIRST")).is_ok());
    assert!(second.resolve(&Token::named("ONLY_FIRST")).is_err());

    first.register_class::<Widget, _>(vec![], |_| Ok(Widget));
    second.register_class::<Widget, _>(vec![], |_| Ok(Widget));
    let a = first.resolve_as::<Widget>().unwrap();
    let b = second.resolve_as::<Widget>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn failed_construction_leaves_no_cached_state() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let container = container();
    container.register_provider(ProviderDescriptor::factory(
        Token::named("FLAKY"),
        vec![],
        move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::from("first attempt fails"))
            } else {
                Ok(11_u32)
            }
        },
    ));

    assert!(container.resolve(&Token::named("FLAKY")).is_err());
    // The failure is not cached; the next call constructs successfully.
    let value = container.resolve(&Token::named("FLAKY")).unwrap();
    assert_eq!(*value.downcast::<u32>().unwrap(), 11);
}
