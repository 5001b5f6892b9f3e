//! Type introspection as an explicit capability
//!
//! Rust has no runtime constructor reflection, so the container consumes
//! introspection through the [`Reflector`] trait: given a type key, yield
//! the ordered parameter descriptors of its constructor (or of a named
//! method) together with a closure that performs the actual construction
//! or invocation. Metadata can come from explicit registration (the
//! bundled [`TypeRegistry`]), from generated code, or from any other
//! implementation of the trait.

use crate::value::{downcast, erase, Value};
use crate::Result;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Descriptor for one constructor or method parameter
#[derive(Clone)]
pub struct ParamSpec {
    name: &'static str,
    class: Option<&'static str>,
    default: Option<Value>,
}

impl ParamSpec {
    /// A parameter whose declared type is another container key;
    /// auto-wired by recursive resolution
    #[inline]
    pub fn of_type(name: &'static str, class: &'static str) -> Self {
        Self {
            name,
            class: Some(class),
            default: None,
        }
    }

    /// A primitive parameter with no default; the caller must supply it
    /// as a named override
    #[inline]
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            class: None,
            default: None,
        }
    }

    /// A primitive parameter with a declared default value
    #[inline]
    pub fn with_default<T: Send + Sync + 'static>(name: &'static str, default: T) -> Self {
        Self {
            name,
            class: None,
            default: Some(erase(default)),
        }
    }

    /// Parameter name, used for named-override lookup
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared class key, if the parameter is type-hinted
    #[inline]
    pub fn class(&self) -> Option<&'static str> {
        self.class
    }

    /// Declared default value, if any
    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl std::fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

type ConstructFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;
type InvokeFn = Arc<dyn Fn(Value, &[Value]) -> Result<Value> + Send + Sync>;

/// A type's constructor: ordered parameters plus the construction closure
pub struct ConstructorSpec {
    params: Vec<ParamSpec>,
    construct: ConstructFn,
}

impl ConstructorSpec {
    /// Ordered parameter descriptors, in declaration order
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Construct an instance from a complete positional argument list
    #[inline]
    pub fn construct(&self, args: &[Value]) -> Result<Value> {
        (self.construct)(args)
    }
}

/// An injectable method: ordered parameters plus the invocation closure
pub struct MethodSpec {
    params: Vec<ParamSpec>,
    invoke: InvokeFn,
}

impl MethodSpec {
    /// Ordered parameter descriptors, in declaration order
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invoke on a receiver with a complete positional argument list
    #[inline]
    pub fn invoke(&self, receiver: Value, args: &[Value]) -> Result<Value> {
        (self.invoke)(receiver, args)
    }
}

/// Introspection record for one type key.
///
/// Built through [`TypeDef`] for constructible types, or
/// [`TypeInfo::interface`] for keys that exist only to be bound to
/// something else.
pub struct TypeInfo {
    key: String,
    type_id: Option<TypeId>,
    constructor: Option<ConstructorSpec>,
    methods: HashMap<&'static str, MethodSpec, RandomState>,
}

impl TypeInfo {
    /// Register an interface-style key: known to the reflector but not
    /// constructible. Resolving it without a binding fails with a
    /// not-instantiable error instead of an unknown-key error.
    pub fn interface(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            type_id: None,
            constructor: None,
            methods: HashMap::default(),
        }
    }

    /// The type key this record describes
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `TypeId` of the concrete Rust type, absent for interfaces
    #[inline]
    pub fn rust_type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Whether the type can be constructed directly
    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Constructor descriptor, if the type is instantiable
    #[inline]
    pub fn constructor(&self) -> Option<&ConstructorSpec> {
        self.constructor.as_ref()
    }

    /// Look up an injectable method by name
    #[inline]
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("key", &self.key)
            .field("instantiable", &self.is_instantiable())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Typed builder for a [`TypeInfo`] record.
///
/// # Examples
///
/// ```rust
/// use bindery::reflect::{ParamSpec, TypeDef};
/// use bindery::value;
///
/// struct Mailer { from: String }
///
/// let info = TypeDef::<Mailer>::new("Mailer")
///     .constructor(
///         vec![ParamSpec::with_default("from", "noreply@localhost".to_string())],
///         |args| {
///             Ok(Mailer { from: value::arg::<String>(args, 0)?.as_ref().clone() })
///         },
///     )
///     .build();
///
/// assert!(info.is_instantiable());
/// ```
pub struct TypeDef<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDef<T> {
    /// Start a definition for a concrete Rust type under a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            info: TypeInfo {
                key: key.into(),
                type_id: Some(TypeId::of::<T>()),
                constructor: None,
                methods: HashMap::default(),
            },
            _marker: PhantomData,
        }
    }

    /// Declare the constructor: ordered parameters and a closure that
    /// builds the value from the complete positional argument list
    pub fn constructor<F>(mut self, params: Vec<ParamSpec>, construct: F) -> Self
    where
        F: Fn(&[Value]) -> Result<T> + Send + Sync + 'static,
    {
        self.info.constructor = Some(ConstructorSpec {
            params,
            construct: Arc::new(move |args| construct(args).map(erase)),
        });
        self
    }

    /// Declare a parameterless constructor
    pub fn nullary<F>(self, construct: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor(Vec::new(), move |_| Ok(construct()))
    }

    /// Declare an injectable method; the closure receives the typed
    /// receiver and the complete positional argument list
    pub fn method<F>(mut self, name: &'static str, params: Vec<ParamSpec>, invoke: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.info.methods.insert(
            name,
            MethodSpec {
                params,
                invoke: Arc::new(move |receiver, args| {
                    let receiver = downcast::<T>(receiver)?;
                    invoke(&receiver, args)
                }),
            },
        );
        self
    }

    /// Finish the definition
    #[inline]
    pub fn build(self) -> TypeInfo {
        self.info
    }
}

/// The introspection capability the container resolves through
pub trait Reflector: Send + Sync {
    /// Introspection record for a type key, if known
    fn type_info(&self, key: &str) -> Option<Arc<TypeInfo>>;

    /// Introspection record by the concrete Rust `TypeId`; used by `call`
    /// when the target is a bare instance rather than a key
    fn type_info_by_id(&self, id: TypeId) -> Option<Arc<TypeInfo>>;
}

/// The standard [`Reflector`]: explicitly registered type metadata.
///
/// Thread-safe; types may be defined at any point, though the usual shape
/// is to populate the registry once at bootstrap.
pub struct TypeRegistry {
    by_key: DashMap<String, Arc<TypeInfo>, RandomState>,
    by_id: DashMap<TypeId, Arc<TypeInfo>, RandomState>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_key: DashMap::with_hasher(RandomState::new()),
            by_id: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register a completed definition
    pub fn define<T: Send + Sync + 'static>(&self, def: TypeDef<T>) {
        self.insert(def.build());
    }

    /// Register a [`TypeInfo`] record directly
    pub fn insert(&self, info: TypeInfo) {
        let info = Arc::new(info);
        if let Some(id) = info.rust_type_id() {
            self.by_id.insert(id, Arc::clone(&info));
        }
        self.by_key.insert(info.key().to_string(), info);
    }

    /// Number of registered type keys
    #[inline]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Check if no types are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Reflector for TypeRegistry {
    #[inline]
    fn type_info(&self, key: &str) -> Option<Arc<TypeInfo>> {
        self.by_key.get(key).map(|r| Arc::clone(&r))
    }

    #[inline]
    fn type_info_by_id(&self, id: TypeId) -> Option<Arc<TypeInfo>> {
        self.by_id.get(&id).map(|r| Arc::clone(&r))
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    struct Greeter {
        greeting: String,
    }

    #[test]
    fn define_and_look_up_by_key() {
        let registry = TypeRegistry::new();
        registry.define(TypeDef::<Greeter>::new("Greeter").constructor(
            vec![ParamSpec::with_default("greeting", "hi".to_string())],
            |args| {
                Ok(Greeter {
                    greeting: value::arg::<String>(args, 0)?.as_ref().clone(),
                })
            },
        ));

        let info = registry.type_info("Greeter").unwrap();
        assert!(info.is_instantiable());
        assert_eq!(info.constructor().unwrap().params().len(), 1);
    }

    #[test]
    fn look_up_by_rust_type_id() {
        let registry = TypeRegistry::new();
        registry.define(TypeDef::<Greeter>::new("Greeter").nullary(|| Greeter {
            greeting: "hi".into(),
        }));

        let info = registry.type_info_by_id(TypeId::of::<Greeter>()).unwrap();
        assert_eq!(info.key(), "Greeter");
    }

    #[test]
    fn interface_is_known_but_not_instantiable() {
        let registry = TypeRegistry::new();
        registry.insert(TypeInfo::interface("Mailer"));

        let info = registry.type_info("Mailer").unwrap();
        assert!(!info.is_instantiable());
        assert!(info.rust_type_id().is_none());
    }

    #[test]
    fn method_invokes_with_typed_receiver() {
        let registry = TypeRegistry::new();
        registry.define(
            TypeDef::<Greeter>::new("Greeter")
                .nullary(|| Greeter {
                    greeting: "hello".into(),
                })
                .method(
                    "greet",
                    vec![ParamSpec::required("name")],
                    |greeter, args| {
                        let name = value::arg::<String>(args, 0)?;
                        Ok(value::erase(format!("{}, {}", greeter.greeting, name)))
                    },
                ),
        );

        let info = registry.type_info("Greeter").unwrap();
        let receiver = info.constructor().unwrap().construct(&[]).unwrap();
        let method = info.method("greet").unwrap();
        let out = method
            .invoke(receiver, &[value::erase("world".to_string())])
            .unwrap();
        assert_eq!(*value::downcast::<String>(out).unwrap(), "hello, world");
    }

    #[test]
    fn redefinition_last_write_wins() {
        let registry = TypeRegistry::new();
        registry.define(TypeDef::<Greeter>::new("Greeter").nullary(|| Greeter {
            greeting: "first".into(),
        }));
        registry.define(TypeDef::<Greeter>::new("Greeter").nullary(|| Greeter {
            greeting: "second".into(),
        }));

        let info = registry.type_info("Greeter").unwrap();
        let built = info.constructor().unwrap().construct(&[]).unwrap();
        let greeter = value::downcast::<Greeter>(built).unwrap();
        assert_eq!(greeter.greeting, "second");
    }
}
