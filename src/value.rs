//! Type-erased instance values and named parameter overrides
//!
//! Every object the container hands out is a [`Value`]: a shared,
//! type-erased `Arc`. Singleton identity is observable with
//! [`Arc::ptr_eq`]. Factories and construction closures receive and
//! return `Value`s and use the helpers here to get at the payload.

use crate::{DiError, Result};
use ahash::RandomState;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved instance, shared and type-erased
pub type Value = Arc<dyn Any + Send + Sync>;

/// Erase a concrete value into a [`Value`]
#[inline]
pub fn erase<T: Send + Sync + 'static>(value: T) -> Value {
    Arc::new(value) as Value
}

/// Downcast a [`Value`] to a concrete type.
///
/// Keys are user-supplied strings, so unlike a `TypeId`-keyed container
/// there is no registration-time guarantee to lean on; the cast is checked.
#[inline]
pub fn downcast<T: Send + Sync + 'static>(value: Value) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::type_mismatch::<T>())
}

/// Fetch and downcast a positional argument inside a construction or
/// method closure.
///
/// The resolver always delivers a complete argument list (a missing
/// primitive fails resolution before the closure runs), so an
/// out-of-range index means the registered parameter list disagrees
/// with the closure itself.
#[inline]
pub fn arg<T: Send + Sync + 'static>(args: &[Value], index: usize) -> Result<Arc<T>> {
    let value = args.get(index).cloned().ok_or_else(|| {
        DiError::creation_failed(
            std::any::type_name::<T>(),
            format!("no argument at position {index}"),
        )
    })?;
    downcast::<T>(value)
}

/// Named parameter overrides for a single `get`, `build` or `call`.
///
/// An entry keyed by a parameter's name takes precedence over the
/// parameter's declared class binding and over its default value.
///
/// # Examples
///
/// ```rust
/// use bindery::Params;
///
/// let params = Params::new()
///     .with("url", "postgres://localhost".to_string())
///     .with("pool_size", 8i64);
///
/// assert!(params.contains("url"));
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Params {
    entries: HashMap<String, Value, RandomState>,
}

impl Params {
    /// Create an empty override map
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent insert, for building override maps inline
    #[inline]
    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Fluent insert of an already-erased value.
    ///
    /// Use this to override a class-typed parameter with a shared
    /// instance: an `Arc<T>` coerces to [`Value`] directly, so the
    /// receiving constructor sees the same `Arc<T>` auto-wiring would
    /// have produced.
    #[inline]
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert_value(name, value);
        self
    }

    /// Insert an override, erasing the value
    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), erase(value));
    }

    /// Insert an already-erased override
    #[inline]
    pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Look up an override by parameter name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Check whether an override exists for a parameter name
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of overrides
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no overrides are present
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
