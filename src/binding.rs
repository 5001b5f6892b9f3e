//! Binding registry entries
//!
//! A binding pairs an abstract key with its concrete resolution target
//! and a shared (singleton) flag. The target is either another key or a
//! factory closure that performs its own construction.

use crate::value::{Params, Value};
use crate::{Container, Result};
use std::sync::Arc;

/// Type-erased factory closure.
///
/// Receives the container (factories may resolve their own dependencies
/// by calling back into it) and the caller's named overrides.
pub type FactoryFn = Arc<dyn Fn(&Container, &Params) -> Result<Value> + Send + Sync>;

/// The concrete target of a binding
#[derive(Clone)]
pub enum Concrete {
    /// Resolve another key (the same key means self-binding: construct
    /// the type directly via the reflector)
    Key(String),
    /// Invoke a factory closure; it is fully responsible for its own
    /// instantiation logic
    Factory(FactoryFn),
}

impl Concrete {
    /// Target another key
    #[inline]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Target a factory closure
    #[inline]
    pub fn factory<F, T>(factory: F) -> Self
    where
        F: Fn(&Container, &Params) -> Result<T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move |container, params| {
            factory(container, params).map(crate::value::erase)
        }))
    }

    /// Target a factory closure that already returns an erased [`Value`]
    #[inline]
    pub fn factory_value<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Params) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// The target key, if this is not a factory
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Factory(_) => None,
        }
    }
}

impl From<&str> for Concrete {
    #[inline]
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Concrete {
    #[inline]
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl std::fmt::Debug for Concrete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// One registry entry: concrete target plus lifecycle flag.
///
/// `shared` means the first resolved instance is cached and reused for
/// every later request of the same abstract key.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) concrete: Concrete,
    pub(crate) shared: bool,
}

impl Binding {
    #[inline]
    pub(crate) fn new(concrete: Concrete, shared: bool) -> Self {
        Self { concrete, shared }
    }
}
