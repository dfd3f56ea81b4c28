//! Tests for the asynchronous resolution path: cache equivalence with the
//! sync path, async factories, parallel dependency subtrees, waiting on a
//! concurrently-constructing singleton, and async cycle recovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use modwire_domain::instance::{AnyInstance, LateBound};
use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::{Token, TokenRef, forward_ref};
use modwire_engine::container::Container;

fn container() -> Container {
    Container::builder().without_process_env().build()
}

struct Widget;

#[tokio::test]
async fn async_resolution_shares_the_sync_cache() {
    let container = container();
    container.register_provider(ProviderDescriptor::class_of::<Widget, _>(vec![], |_| {
        Ok(Widget)
    }));

    let sync = container.resolve_as::<Widget>().unwrap();
    let asynchronous = container.resolve_as_async::<Widget>().await.unwrap();
    assert!(Arc::ptr_eq(&sync, &asynchronous));
}

#[tokio::test]
async fn async_factory_constructs_once_for_singletons() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let container = container();
    container.register_provider(ProviderDescriptor::async_factory(
        Token::named("CFG"),
        vec![],
        Arc::new(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new("loaded".to_string()) as AnyInstance)
            }
            .boxed()
        }),
    ));

    let first = container.resolve_async(&Token::named("CFG")).await.unwrap();
    let second = container.resolve_async(&Token::named("CFG")).await.unwrap();

    assert!(Arc::ptr_eq(
        &first.downcast::<String>().unwrap(),
        &second.downcast::<String>().unwrap()
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn independent_dependencies_resolve_in_parallel() {
    // Each leaf factory waits on a two-party barrier; the parent only
    // completes if both leaves progress concurrently.
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let container = container();
    for name in ["LEFT", "RIGHT"] {
        let barrier = barrier.clone();
        container.register_provider(ProviderDescriptor::async_factory(
            Token::named(name),
            vec![],
            Arc::new(move |_| {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    Ok(Arc::new(1_u32) as AnyInstance)
                }
                .boxed()
            }),
        ));
    }
    container.register_provider(ProviderDescriptor::factory(
        Token::named("PARENT"),
        vec![
            TokenRef::Direct(Token::named("LEFT")),
            TokenRef::Direct(Token::named("RIGHT")),
        ],
        |deps| {
            let left = *deps[0].downcast::<u32>()?;
            let right = *deps[1].downcast::<u32>()?;
            Ok(left + right)
        },
    ));

    let resolved = tokio::time::timeout(
        Duration::from_secs(5),
        container.resolve_async(&Token::named("PARENT")),
    )
    .await
    .expect("parallel dependency resolution must not deadlock")
    .unwrap();
    assert_eq!(*resolved.downcast::<u32>().unwrap(), 2);
}

#[tokio::test]
async fn concurrent_resolution_waits_for_the_first_construction() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let container = container();
    container.register_provider(ProviderDescriptor::async_factory(
        Token::named("SHARED"),
        vec![],
        Arc::new(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(Arc::new("shared".to_string()) as AnyInstance)
            }
            .boxed()
        }),
    ));

    let first_handle = {
        let container = container.clone();
        tokio::spawn(async move { container.resolve_async(&Token::named("SHARED")).await })
    };
    // Let the first resolution mark the token in-flight before the second
    // arrives.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second_handle = {
        let container = container.clone();
        tokio::spawn(async move { container.resolve_async(&Token::named("SHARED")).await })
    };

    let first = first_handle.await.unwrap().unwrap();
    let second = second_handle.await.unwrap().unwrap();

    assert!(Arc::ptr_eq(
        &first.downcast::<String>().unwrap(),
        &second.downcast::<String>().unwrap()
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_path_recovers_class_cycles_via_placeholders() {
    struct ServiceA {
        peer: LateBound<ServiceB>,
    }
    struct ServiceB {
        peer: LateBound<ServiceA>,
    }

    let container = container();
    container.register_provider(ProviderDescriptor::class_of::<ServiceA, _>(
        vec![forward_ref(Token::of::<ServiceB>)],
        |deps| {
            Ok(ServiceA {
                peer: deps[0].late_bound(),
            })
        },
    ));
    container.register_provider(ProviderDescriptor::class_of::<ServiceB, _>(
        vec![forward_ref(Token::of::<ServiceA>)],
        |deps| {
            Ok(ServiceB {
                peer: deps[0].late_bound(),
            })
        },
    ));

    let a = container.resolve_as_async::<ServiceA>().await.unwrap();
    let b = container.resolve_as_async::<ServiceB>().await.unwrap();

    assert!(Arc::ptr_eq(&a, &b.peer.get().expect("wired after construction")));
    assert!(Arc::ptr_eq(&b, &a.peer.get().expect("wired after construction")));
}

#[tokio::test]
async fn async_request_scope_matches_sync_semantics() {
    struct Session;

    let container = container();
    container.register_provider(
        ProviderDescriptor::class_of::<Session, _>(vec![], |_| Ok(Session))
            .with_scope(modwire_domain::provider::ProviderScope::Request),
    );

    let token = Token::of::<Session>();
    let first = container
        .resolve_with_request_async(&token, "req-a")
        .await
        .unwrap();
    let second = container
        .resolve_with_request_async(&token, "req-a")
        .await
        .unwrap();
    let other = container
        .resolve_with_request_async(&token, "req-b")
        .await
        .unwrap();

    assert!(Arc::ptr_eq(
        &first.clone().downcast::<Session>().unwrap(),
        &second.downcast::<Session>().unwrap()
    ));
    assert!(!Arc::ptr_eq(
        &first.downcast::<Session>().unwrap(),
        &other.downcast::<Session>().unwrap()
    ));
}

#[tokio::test]
async fn bootstrap_async_constructs_eagerly() {
    use modwire_domain::module::ModuleDescriptor;

    struct Warmup;

    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = constructed.clone();

    let container = container();
    container.register_class::<Warmup, _>(vec![], move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Warmup)
    });
    container
        .register_module(
            &ModuleDescriptor::new("root")
                .with_bootstrap(Token::of::<Warmup>())
                .into_ref(),
        )
        .unwrap();

    container.bootstrap_async().await.unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}
