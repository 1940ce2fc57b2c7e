use std::sync::Arc;
use std::thread;
use std::time::Duration;

use datum_query as dq;
use dq::{Context, ParseError, QueryCache, QueryStore};
use pretty_assertions::assert_eq;

#[test]
fn test_context_shares_its_store_across_threads() {
    let store = Arc::new(QueryCache::new());
    let ctx = Context::new(store.clone(), Duration::from_secs(60));
    let specs = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ctx = ctx.clone();
                s.spawn(move || ctx.parse("a.$b.+").unwrap().spec().to_string())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert!(specs.iter().all(|spec| spec == "a.$b.+"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_failed_parses_are_cached() {
    let store = Arc::new(QueryCache::new());
    let ctx = Context::new(store.clone(), Duration::from_secs(60));
    assert_eq!(ctx.parse("a..b"), ctx.parse("a..b"));
    assert!(matches!(
        store.get("a..b"),
        Some(Err(ParseError::UnexpectedToken { .. }))
    ));
}

#[test]
fn test_expired_entries_are_reparsed() {
    let store = Arc::new(QueryCache::new());
    let ctx = Context::new(store.clone(), Duration::ZERO);
    let first = ctx.parse("k").unwrap();
    assert!(store.get("k").is_none());
    assert_eq!(ctx.parse("k").unwrap(), first);
    assert_eq!(store.purge_expired(), 1);
}

#[test]
fn test_default_context() {
    let ctx = Context::default();
    assert_eq!(ctx.ttl(), dq::context::DEFAULT_TTL);
    assert_eq!(ctx.parse("x.0").unwrap().leaf().index(), Some(0));
}

#[test]
fn test_many_distinct_specs_do_not_pile_up() {
    let store = Arc::new(QueryCache::new());
    let ctx = Context::new(store.clone(), Duration::ZERO);
    for i in 0..dq::cache::PURGE_INTERVAL {
        ctx.parse(&format!("k{i}")).unwrap();
    }
    assert!(store.is_empty());
}
