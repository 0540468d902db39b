use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::query::Query;
use crate::{Error, Result};

use super::Record;

/// A join resolver: takes a query and returns it augmented with a join
/// (and usually the joined columns).
pub type JoinFn = Arc<dyn Fn(Query) -> Query + Send + Sync>;

/// Named join resolvers for one record type.
///
/// Replaces lookup-by-method-name with an explicit table: a join requested
/// as `"author"` resolves to whatever was registered under `"author"`.
pub struct JoinRegistry<R> {
    resolvers: HashMap<String, JoinFn>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JoinRegistry<R> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
            _record: PhantomData,
        }
    }

    /// A registry filled by [`Record::register_joins`].
    pub fn for_record() -> Self {
        let mut registry = Self::new();
        R::register_joins(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, resolver: F) -> &mut Self
    where
        F: Fn(Query) -> Query + Send + Sync + 'static,
    {
        self.resolvers.insert(name.into(), Arc::new(resolver));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&JoinFn> {
        self.resolvers.get(name).ok_or_else(|| {
            Error::configuration(format!(
                "no join resolver registered for '{name}' on {}",
                R::NAME
            ))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<R: Record> Default for JoinRegistry<R> {
    fn default() -> Self {
        Self::for_record()
    }
}

impl<R> Clone for JoinRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            resolvers: self.resolvers.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for JoinRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.resolvers.keys().collect();
        names.sort_unstable();
        f.debug_struct("JoinRegistry").field("joins", &names).finish()
    }
}
