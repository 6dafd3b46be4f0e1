//! Tests for the thread-exclusive generator wrapper.
//!
//! A context's generator is bound to the thread that first touched it and to
//! the lifetime of its scope. Every access path has to enforce both.

use randomized_testing_core_rs::{
    ContextTree, ExclusiveRandom, FactoryKind, RandomAccessError, RunConfig, SeedChain,
};
use std::error::Error;
use std::sync::Arc;

fn guarded_tree(chain_text: &str) -> ContextTree {
    let chain = SeedChain::parse(chain_text).unwrap();
    ContextTree::new("root", &chain, FactoryKind::default().factory(), true)
}

/// Run every guarded operation once, returning the first error.
fn probe(random: &ExclusiveRandom) -> Vec<Result<(), RandomAccessError>> {
    let mut buf = [0u8; 16];
    let factory = FactoryKind::default().factory();
    let other = ExclusiveRandom::new(factory.as_ref()(1), true);
    vec![
        random.next_bool().map(|_| ()),
        random.next_i32().map(|_| ()),
        random.next_i32_bounded(10).map(|_| ()),
        random.next_i64().map(|_| ()),
        random.next_u64().map(|_| ()),
        random.next_f32().map(|_| ()),
        random.next_f64().map(|_| ()),
        random.next_gaussian().map(|_| ()),
        random.fill_bytes(&mut buf),
        random.describe().map(|_| ()),
        random.fingerprint().map(|_| ()),
        random.state_eq(&other).map(|_| ()),
    ]
}

#[test]
fn test_same_seed_same_sequence() {
    let a = guarded_tree("dead");
    let b = guarded_tree("dead");
    let ra = a.random(a.root());
    let rb = b.random(b.root());
    for _ in 0..100 {
        assert_eq!(ra.next_u64().unwrap(), rb.next_u64().unwrap());
    }
}

#[test]
fn test_owner_thread_has_full_access() {
    let t = guarded_tree("dead");
    let random = t.random(t.root());
    for result in probe(&random) {
        assert!(result.is_ok());
    }
}

#[test]
fn test_cross_thread_access_fails_on_every_method() {
    let t = guarded_tree("dead");
    // Bind the generator to this thread before handing it away.
    let random = t.random(t.root());
    let _ = random.next_u64().unwrap();

    let shared = Arc::clone(&random);
    let results = std::thread::spawn(move || probe(&shared)).join().unwrap();

    assert_eq!(results.len(), 12);
    for result in results {
        match result {
            Err(RandomAccessError::CrossThreadAccess { owner, current, .. }) => {
                assert_ne!(owner, current);
            }
            other => panic!("expected CrossThreadAccess, got {:?}", other),
        }
    }

    // The owner is unaffected.
    assert!(random.next_u64().is_ok());
}

#[test]
fn test_cross_thread_error_carries_allocation_site() {
    let t = guarded_tree("dead");
    let random = t.random(t.root());

    let shared = Arc::clone(&random);
    let err = std::thread::spawn(move || shared.next_u64().unwrap_err())
        .join()
        .unwrap();

    // Allocation stack rides along as nested diagnostic context.
    let source = err.source().expect("cross-thread error should have a source");
    assert!(source.to_string().contains("allocation"));
}

#[test]
fn test_invalidation_kills_every_method() {
    let t = guarded_tree("dead");
    let child = t.derive_child(t.root(), "classA", None).unwrap();
    let random = t.random(child);
    assert!(random.next_u64().is_ok());

    t.invalidate(child);
    for result in probe(&random) {
        match result {
            Err(RandomAccessError::UseAfterInvalidation) => {}
            other => panic!("expected UseAfterInvalidation, got {:?}", other),
        }
    }
}

#[test]
fn test_invalidation_before_first_generator_access() {
    // The scope ends before anyone touches its generator; the lazily
    // constructed wrapper must come out dead, not freshly valid.
    let t = guarded_tree("dead");
    let child = t.derive_child(t.root(), "classA", None).unwrap();
    t.invalidate(child);

    let random = t.random(child);
    assert!(!random.is_valid());
    for result in probe(&random) {
        match result {
            Err(RandomAccessError::UseAfterInvalidation) => {}
            other => panic!("expected UseAfterInvalidation, got {:?}", other),
        }
    }
}

#[test]
fn test_invalidation_is_idempotent() {
    let t = guarded_tree("dead");
    let child = t.derive_child(t.root(), "classA", None).unwrap();
    let random = t.random(child);

    t.invalidate(child);
    t.invalidate(child);
    assert!(!random.is_valid());
    assert!(matches!(
        random.next_bool(),
        Err(RandomAccessError::UseAfterInvalidation)
    ));
}

#[test]
fn test_reseed_always_rejected() {
    let t = guarded_tree("dead");
    let random = t.random(t.root());
    assert!(matches!(
        random.reseed(42),
        Err(RandomAccessError::ImmutableSeed)
    ));

    // Still rejected after invalidation, and the reason stays "immutable".
    random.invalidate();
    assert!(matches!(
        random.reseed(42),
        Err(RandomAccessError::ImmutableSeed)
    ));
}

#[test]
fn test_unguarded_mode_passes_through() {
    let config = RunConfig {
        seed: Some("dead".to_string()),
        random_factory: None,
        asserting: false,
    };
    let t = config.build("root").unwrap();
    let random = t.random(t.root());
    let _ = random.next_u64().unwrap();

    // Cross-thread access is tolerated without the guard.
    let shared = Arc::clone(&random);
    let ok = std::thread::spawn(move || shared.next_u64().is_ok())
        .join()
        .unwrap();
    assert!(ok);

    // So is post-invalidation access.
    random.invalidate();
    assert!(random.next_u64().is_ok());
}

#[test]
fn test_generator_is_lazy_and_cached() {
    let t = guarded_tree("dead");
    let child = t.derive_child(t.root(), "classA", None).unwrap();
    let first = t.random(child);
    let second = t.random(child);
    // Same instance: consuming through one handle advances the other.
    let via_first = first.next_u64().unwrap();
    let via_second = second.next_u64().unwrap();
    assert_ne!(via_first, via_second);
    assert!(Arc::ptr_eq(&first, &second));
}
