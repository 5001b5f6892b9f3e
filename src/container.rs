//! The inversion-of-control container
//!
//! The `Container` owns two maps: the binding registry (abstract key to
//! concrete target plus lifecycle flag) and the instance cache (abstract
//! key to constructed singleton). Resolution walks bindings recursively,
//! auto-wiring constructor parameters through the [`Reflector`]
//! capability.

use crate::binding::{Binding, Concrete};
use crate::reflect::{ParamSpec, Reflector, TypeInfo, TypeRegistry};
use crate::value::{downcast, erase, Params, Value};
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// String-keyed IoC container with reflective auto-wiring.
///
/// Cloning is cheap and shares the underlying registry and cache, so a
/// container can be handed to factories and host code freely.
///
/// # Examples
///
/// ```rust
/// use bindery::reflect::{TypeDef, TypeRegistry};
/// use bindery::Container;
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let types = TypeRegistry::new();
/// types.define(TypeDef::<Clock>::new("Clock").nullary(|| Clock));
///
/// let container = Container::with_reflector(Arc::new(types));
/// container.singleton_self("Clock");
///
/// let a = container.get("Clock").unwrap();
/// let b = container.get("Clock").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct Container {
    /// Binding registry: abstract key -> (concrete target, shared flag)
    bindings: Arc<DashMap<String, Binding, RandomState>>,
    /// Instance cache: abstract key -> constructed singleton
    instances: Arc<DashMap<String, Value, RandomState>>,
    /// Introspection capability used for reflective construction
    reflector: Arc<dyn Reflector>,
}

impl Container {
    /// Create a container with an empty [`TypeRegistry`] as its reflector.
    ///
    /// Only useful when every binding is a factory; reflective
    /// construction needs type metadata, see [`Container::with_reflector`].
    pub fn new() -> Self {
        Self::with_reflector(Arc::new(TypeRegistry::new()))
    }

    /// Create a container resolving through the given reflector
    pub fn with_reflector(reflector: Arc<dyn Reflector>) -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "bindery", "Creating new container");

        Self {
            bindings: Arc::new(DashMap::with_hasher(RandomState::new())),
            instances: Arc::new(DashMap::with_hasher(RandomState::new())),
            reflector,
        }
    }

    /// The reflector this container resolves through
    #[inline]
    pub fn reflector(&self) -> &Arc<dyn Reflector> {
        &self.reflector
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register or replace the binding for an abstract key.
    ///
    /// No validation happens here; an unresolvable target surfaces as an
    /// error at resolution time. The last write for a key wins.
    pub fn bind(&self, abstract_key: impl Into<String>, concrete: impl Into<Concrete>) {
        self.insert_binding(abstract_key.into(), concrete.into(), false);
    }

    /// Register a self-binding: construct the key's own type directly
    pub fn bind_self(&self, abstract_key: impl Into<String>) {
        let key = abstract_key.into();
        let concrete = Concrete::key(key.clone());
        self.insert_binding(key, concrete, false);
    }

    /// Register a factory binding.
    ///
    /// The factory must not resolve its own key through the container it
    /// receives: each `get` starts a fresh resolution path, so a factory
    /// self-cycle recurses unbounded rather than failing as
    /// [`DiError::CircularDependency`].
    pub fn bind_factory<F, T>(&self, abstract_key: impl Into<String>, factory: F)
    where
        F: Fn(&Container, &Params) -> Result<T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.insert_binding(abstract_key.into(), Concrete::factory(factory), false);
    }

    /// Register or replace a shared binding: the first resolved instance
    /// is cached and reused for every later request of this key
    pub fn singleton(&self, abstract_key: impl Into<String>, concrete: impl Into<Concrete>) {
        self.insert_binding(abstract_key.into(), concrete.into(), true);
    }

    /// Register a shared self-binding
    pub fn singleton_self(&self, abstract_key: impl Into<String>) {
        let key = abstract_key.into();
        let concrete = Concrete::key(key.clone());
        self.insert_binding(key, concrete, true);
    }

    /// Register a shared factory binding; the factory runs at most once.
    ///
    /// As with [`Container::bind_factory`], the factory must not resolve
    /// its own key.
    pub fn singleton_factory<F, T>(&self, abstract_key: impl Into<String>, factory: F)
    where
        F: Fn(&Container, &Params) -> Result<T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.insert_binding(abstract_key.into(), Concrete::factory(factory), true);
    }

    /// Place a pre-built object directly into the instance cache.
    ///
    /// Later `get` calls for the key return this object without
    /// consulting the registry.
    pub fn instance<T: Send + Sync + 'static>(&self, abstract_key: impl Into<String>, value: T) {
        let key = abstract_key.into();

        #[cfg(feature = "logging")]
        debug!(target: "bindery", key = %key, "Registering existing instance");

        self.instances.insert(key, erase(value));
    }

    fn insert_binding(&self, key: String, concrete: Concrete, shared: bool) {
        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            key = %key,
            concrete = ?concrete,
            shared = shared,
            "Registering binding"
        );

        self.bindings.insert(key, Binding::new(concrete, shared));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check whether a binding exists for a key (registry only; the
    /// reflector may still be able to construct unbound keys)
    #[inline]
    pub fn has(&self, abstract_key: &str) -> bool {
        self.bindings.contains_key(abstract_key)
    }

    /// Check whether a key is shared: either an instance is already
    /// cached or its binding carries the singleton flag
    #[inline]
    pub fn is_shared(&self, abstract_key: &str) -> bool {
        self.instances.contains_key(abstract_key)
            || self
                .bindings
                .get(abstract_key)
                .map(|b| b.shared)
                .unwrap_or(false)
    }

    /// Number of registered bindings
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no bindings are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve an abstract key into an instance.
    ///
    /// Cache hit for a shared key short-circuits everything else;
    /// otherwise the binding's concrete target is built (self-binding or
    /// factory) or resolution recurses into the aliased key. Unbound
    /// keys self-resolve through the reflector when constructible.
    #[inline]
    pub fn get(&self, abstract_key: &str) -> Result<Value> {
        self.get_with(abstract_key, &Params::new())
    }

    /// Resolve with named parameter overrides.
    ///
    /// Overrides apply to the top-level construction (and follow alias
    /// hops), not to recursively resolved dependencies. For a shared key
    /// they are only honored on the first, cache-populating call.
    pub fn get_with(&self, abstract_key: &str, params: &Params) -> Result<Value> {
        let mut path = Vec::new();
        self.resolve(abstract_key, params, &mut path)
    }

    /// Resolve and downcast to a concrete type
    pub fn get_as<T: Send + Sync + 'static>(&self, abstract_key: &str) -> Result<Arc<T>> {
        downcast::<T>(self.get(abstract_key)?)
    }

    /// Construct directly from a concrete target, bypassing the registry
    /// and the instance cache.
    ///
    /// Dependencies of the constructed type still resolve with full
    /// container semantics.
    #[inline]
    pub fn build(&self, concrete: impl Into<Concrete>) -> Result<Value> {
        self.build_with(concrete, &Params::new())
    }

    /// [`Container::build`] with named parameter overrides
    pub fn build_with(&self, concrete: impl Into<Concrete>, params: &Params) -> Result<Value> {
        match concrete.into() {
            Concrete::Factory(factory) => factory(self, params),
            Concrete::Key(key) => {
                // The key itself goes on the path so a self-referential
                // constructor fails as a cycle, not a stack overflow.
                let mut path = vec![key.clone()];
                self.construct(&key, params, &mut path)
            }
        }
    }

    /// Invoke a method on a target with dependency-injected arguments.
    ///
    /// The method's parameters resolve exactly like constructor
    /// parameters: named overrides first, then declared class keys via
    /// `get`, then defaults. A key target is first resolved via `get`.
    #[inline]
    pub fn call(&self, target: impl Into<Target>, method: &str) -> Result<Value> {
        self.call_with(target, method, &Params::new())
    }

    /// [`Container::call`] with named parameter overrides for the method
    pub fn call_with(
        &self,
        target: impl Into<Target>,
        method: &str,
        params: &Params,
    ) -> Result<Value> {
        let (label, receiver) = match target.into() {
            Target::Key(key) => {
                let receiver = self.get(&key)?;
                (key, receiver)
            }
            Target::Instance(value) => {
                let label = self
                    .reflector
                    .type_info_by_id(value.as_ref().type_id())
                    .map(|info| info.key().to_string())
                    .unwrap_or_else(|| "<instance>".to_string());
                (label, value)
            }
        };

        // Method tables live on the concrete type, which for an aliased
        // or factory-built key can differ from the requested key.
        let info = self
            .reflector
            .type_info_by_id(receiver.as_ref().type_id())
            .or_else(|| self.reflector.type_info(&label))
            .ok_or_else(|| DiError::unknown_method(label.as_str(), method))?;

        let spec = info
            .method(method)
            .ok_or_else(|| DiError::unknown_method(info.key(), method))?;

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            receiver = info.key(),
            method = method,
            "Invoking method with injected arguments"
        );

        let owner = format!("{}::{}", info.key(), method);
        let mut path = Vec::new();
        let args = self.resolve_dependencies(&owner, spec.params(), params, &mut path)?;
        spec.invoke(receiver, &args)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Drop the cached instance for a key, if any.
    ///
    /// Rebinding never evicts implicitly; this is the explicit escape
    /// hatch. Returns whether an instance was present.
    pub fn forget_instance(&self, abstract_key: &str) -> bool {
        let removed = self.instances.remove(abstract_key).is_some();

        #[cfg(feature = "logging")]
        if removed {
            debug!(target: "bindery", key = abstract_key, "Cached instance forgotten");
        }

        removed
    }

    /// Clear all bindings and cached instances
    pub fn flush(&self) {
        #[cfg(feature = "logging")]
        debug!(
            target: "bindery",
            bindings = self.bindings.len(),
            instances = self.instances.len(),
            "Flushing container"
        );

        self.bindings.clear();
        self.instances.clear();
    }

    // =========================================================================
    // Resolver internals
    // =========================================================================

    /// Recursive resolution entry point. `path` is the ordered set of
    /// keys currently being resolved; re-entering one of them is a cycle.
    fn resolve(&self, key: &str, params: &Params, path: &mut Vec<String>) -> Result<Value> {
        // The cache is authoritative once populated, even if the binding
        // was overwritten afterwards.
        if let Some(hit) = self.instances.get(key) {
            #[cfg(feature = "logging")]
            trace!(target: "bindery", key = key, "Instance cache hit");
            return Ok(Value::clone(&hit));
        }

        if path.iter().any(|k| k == key) {
            #[cfg(feature = "logging")]
            debug!(target: "bindery", key = key, "Circular dependency detected");
            return Err(DiError::circular(path, key));
        }

        path.push(key.to_string());
        let result = self.resolve_concrete(key, params, path);
        path.pop();
        let value = result?;

        let shared = self.bindings.get(key).map(|b| b.shared).unwrap_or(false);
        if shared {
            #[cfg(feature = "logging")]
            debug!(target: "bindery", key = key, "Caching singleton instance");

            // First writer wins if two threads raced into the build; both
            // callers observe the published instance.
            let cached = self
                .instances
                .entry(key.to_string())
                .or_insert(value)
                .clone();
            return Ok(cached);
        }

        Ok(value)
    }

    /// Determine the concrete target and build or recurse accordingly
    fn resolve_concrete(&self, key: &str, params: &Params, path: &mut Vec<String>) -> Result<Value> {
        // Clone the target out of the map so no shard lock is held
        // across recursion or factory callbacks.
        let concrete = self.bindings.get(key).map(|b| b.concrete.clone());

        match concrete {
            Some(Concrete::Factory(factory)) => {
                #[cfg(feature = "logging")]
                trace!(target: "bindery", key = key, "Resolving via factory");
                factory(self, params)
            }
            Some(Concrete::Key(target)) if target != key => {
                #[cfg(feature = "logging")]
                trace!(target: "bindery", key = key, alias = %target, "Following alias");
                self.resolve(&target, params, path)
            }
            // Self-binding, or no binding at all: construct the key's own
            // type through the reflector.
            Some(Concrete::Key(_)) | None => self.construct(key, params, path),
        }
    }

    /// Reflective construction of a key's own type
    fn construct(&self, key: &str, params: &Params, path: &mut Vec<String>) -> Result<Value> {
        let Some(info) = self.reflector.type_info(key) else {
            #[cfg(feature = "logging")]
            debug!(target: "bindery", key = key, "No type information for key");

            // A bound key the reflector cannot construct is a dead-end
            // target; an unbound one is simply unknown.
            return if self.bindings.contains_key(key) {
                Err(DiError::not_instantiable(key))
            } else {
                Err(DiError::unresolvable(key))
            };
        };

        self.construct_info(&info, params, path)
    }

    fn construct_info(
        &self,
        info: &TypeInfo,
        params: &Params,
        path: &mut Vec<String>,
    ) -> Result<Value> {
        let Some(ctor) = info.constructor() else {
            #[cfg(feature = "logging")]
            debug!(target: "bindery", key = info.key(), "Key is not instantiable");
            return Err(DiError::not_instantiable(info.key()));
        };

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            key = info.key(),
            dependencies = ctor.params().len(),
            "Constructing reflectively"
        );

        let owner = format!("{}::constructor", info.key());
        let args = self.resolve_dependencies(&owner, ctor.params(), params, path)?;
        ctor.construct(&args)
    }

    /// Turn a declared parameter list into a positional argument list.
    ///
    /// Precedence per parameter: caller override by name, then declared
    /// class key (recursive resolution, overrides not forwarded), then
    /// declared default. A primitive with none of these is a hard error.
    fn resolve_dependencies(
        &self,
        owner: &str,
        specs: &[ParamSpec],
        params: &Params,
        path: &mut Vec<String>,
    ) -> Result<Vec<Value>> {
        let mut args = Vec::with_capacity(specs.len());

        for spec in specs {
            if let Some(value) = params.get(spec.name()) {
                args.push(Value::clone(value));
            } else if let Some(class) = spec.class() {
                args.push(self.resolve(class, &Params::new(), path)?);
            } else if let Some(default) = spec.default() {
                args.push(Value::clone(default));
            } else {
                return Err(DiError::missing_argument(spec.name(), owner));
            }
        }

        Ok(args)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .field("instances", &self.instances.len())
            .finish()
    }
}

/// Target of a [`Container::call`]: an abstract key to resolve first, or
/// an already-resolved instance
pub enum Target {
    /// Resolve this key via `get`, then invoke on the result
    Key(String),
    /// Invoke directly on this instance
    Instance(Value),
}

impl Target {
    /// Wrap a typed instance as a call target
    #[inline]
    pub fn of<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self::Instance(instance as Value)
    }
}

impl From<&str> for Target {
    #[inline]
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Target {
    #[inline]
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<Value> for Target {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Instance(value)
    }
}
