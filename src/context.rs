use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{QueryCache, QueryStore};
use crate::errors::ParseError;
use crate::parser;
use crate::query::Query;

/// Default lifetime of a cached parse.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Parser entry point and its options.
///
/// Holds the store that memoizes parse results. Construct one per process
/// (or per test) and share it by cloning; clones use the same store.
#[derive(Clone)]
pub struct Context {
    store: Option<Arc<dyn QueryStore>>,
    ttl: Duration,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Arc::new(QueryCache::new()), DEFAULT_TTL)
    }
}

impl Context {
    pub fn new(store: Arc<dyn QueryStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// A context that parses every time.
    pub fn uncached() -> Self {
        Self {
            store: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Parse `spec`, consulting the store first.
    pub fn parse(&self, spec: &str) -> Result<Query, ParseError> {
        let Some(store) = &self.store else {
            return parser::parse(spec);
        };
        if let Some(result) = store.get(spec) {
            return result;
        }
        let result = parser::parse(spec);
        debug!(spec, ok = result.is_ok(), "parsed query");
        store.set(spec, result.clone(), self.ttl);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        inner: QueryCache,
        sets: AtomicUsize,
    }

    impl QueryStore for CountingStore {
        fn get(&self, spec: &str) -> Option<Result<Query, ParseError>> {
            self.inner.get(spec)
        }

        fn set(&self, spec: &str, result: Result<Query, ParseError>, ttl: Duration) {
            self.sets.fetch_add(1, Ordering::Relaxed);
            self.inner.set(spec, result, ttl);
        }
    }

    #[test]
    fn second_parse_is_served_from_store() {
        let store = Arc::new(CountingStore::default());
        let ctx = Context::new(store.clone(), DEFAULT_TTL);
        let a = ctx.parse("k0.k1").unwrap();
        let b = ctx.parse("k0.k1").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.sets.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn zero_ttl_reparses() {
        let store = Arc::new(CountingStore::default());
        let ctx = Context::new(store.clone(), DEFAULT_TTL).with_ttl(Duration::ZERO);
        ctx.parse("a").unwrap();
        ctx.parse("a").unwrap();
        assert_eq!(store.sets.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn uncached_context_parses_directly() {
        let ctx = Context::uncached();
        assert_eq!(ctx.parse(""), Err(ParseError::Empty));
        assert_eq!(ctx.parse("a.b").unwrap().len(), 2);
    }
}
