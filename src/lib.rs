//! # Bindery - String-Keyed IoC Container for Rust
//!
//! An inversion-of-control container that maps abstract keys (interface
//! names, string tokens) to concrete construction strategies, and
//! instantiates a requested key by recursively resolving its dependency
//! graph.
//!
//! ## Features
//!
//! - **Bindings** - self-bindings, alias chains, and factory closures
//! - **Auto-wiring** - constructor and method parameters resolve through
//!   the same recursive algorithm
//! - **Singleton cache** - shared bindings construct once, by identity
//! - **Named overrides** - per-call parameter maps beat bindings and defaults
//! - **Reflection as a capability** - introspection lives behind the
//!   [`reflect::Reflector`] trait, supplied by explicit registration
//! - **Cycle detection** - circular binding chains fail with the full path
//!   instead of blowing the stack
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bindery::reflect::{ParamSpec, TypeDef, TypeRegistry};
//! use bindery::{value, Container};
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Database { config: Arc<Config> }
//!
//! // Describe the types once; this stands in for runtime reflection.
//! let types = TypeRegistry::new();
//! types.define(TypeDef::<Config>::new("Config").constructor(
//!     vec![ParamSpec::with_default("url", "sqlite://memory".to_string())],
//!     |args| Ok(Config { url: value::arg::<String>(args, 0)?.as_ref().clone() }),
//! ));
//! types.define(TypeDef::<Database>::new("Database").constructor(
//!     vec![ParamSpec::of_type("config", "Config")],
//!     |args| Ok(Database { config: value::arg::<Config>(args, 0)? }),
//! ));
//!
//! let container = Container::with_reflector(Arc::new(types));
//! container.singleton_self("Config");
//!
//! // Database is unbound but constructible: implicit self-resolution,
//! // with Config auto-wired from the singleton cache.
//! let db = container.get_as::<Database>("Database").unwrap();
//! assert_eq!(db.config.url, "sqlite://memory");
//! ```
//!
//! ## Lifecycle
//!
//! A binding registered with `bind` yields a fresh instance on every
//! `get`; one registered with `singleton` caches its first instance for
//! the container's lifetime. Rebinding a key never evicts an already
//! cached instance; eviction is only ever explicit
//! ([`Container::forget_instance`], [`Container::flush`]).

mod binding;
mod container;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod reflect;
pub mod value;

pub use binding::{Concrete, FactoryFn};
pub use container::{Container, Target};
pub use error::{DiError, Result};
pub use value::{Params, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::reflect::{ParamSpec, Reflector, TypeDef, TypeInfo, TypeRegistry};
    pub use crate::{Concrete, Container, DiError, Params, Result, Target, Value};
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // A small application graph: an abstract "Logger" key bound to a
    // concrete sink, a service depending on it, and a handler invoked
    // through `call`.

    struct MemoryLogger {
        lines: Mutex<Vec<String>>,
    }

    impl MemoryLogger {
        fn log(&self, line: impl Into<String>) {
            self.lines.lock().unwrap().push(line.into());
        }
    }

    struct Notifier {
        logger: Arc<MemoryLogger>,
    }

    struct OrderHandler;

    fn types() -> Arc<TypeRegistry> {
        let types = TypeRegistry::new();

        types.insert(TypeInfo::interface("Logger"));

        types.define(TypeDef::<MemoryLogger>::new("MemoryLogger").nullary(|| MemoryLogger {
            lines: Mutex::new(Vec::new()),
        }));

        types.define(TypeDef::<Notifier>::new("Notifier").constructor(
            vec![ParamSpec::of_type("logger", "Logger")],
            |args| {
                Ok(Notifier {
                    logger: value::arg::<MemoryLogger>(args, 0)?,
                })
            },
        ));

        types.define(
            TypeDef::<OrderHandler>::new("OrderHandler")
                .nullary(|| OrderHandler)
                .method(
                    "handle",
                    vec![
                        ParamSpec::of_type("notifier", "Notifier"),
                        ParamSpec::required("order_id"),
                        ParamSpec::with_default("priority", 1i64),
                    ],
                    |_, args| {
                        let notifier = value::arg::<Notifier>(args, 0)?;
                        let order_id = value::arg::<String>(args, 1)?;
                        let priority = value::arg::<i64>(args, 2)?;
                        notifier
                            .logger
                            .log(format!("order {order_id} (priority {priority})"));
                        Ok(value::erase(*priority))
                    },
                ),
        );

        Arc::new(types)
    }

    fn app() -> Container {
        let container = Container::with_reflector(types());
        container.singleton("Logger", "MemoryLogger");
        container
    }

    #[test]
    fn interface_binding_resolves_to_implementation() {
        let container = app();
        let logger = container.get_as::<MemoryLogger>("Logger").unwrap();
        logger.log("hello");
        assert_eq!(logger.lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn end_to_end_handler_dispatch() {
        let container = app();

        let result = container
            .call_with(
                "OrderHandler",
                "handle",
                &Params::new().with("order_id", "ord-7".to_string()),
            )
            .unwrap();
        assert_eq!(*value::downcast::<i64>(result).unwrap(), 1);

        // The notifier wired into the call shares the singleton logger.
        let logger = container.get_as::<MemoryLogger>("Logger").unwrap();
        assert_eq!(*logger.lines.lock().unwrap(), ["order ord-7 (priority 1)"]);
    }

    #[test]
    fn call_on_resolved_instance() {
        let container = app();
        let handler = container.get("OrderHandler").unwrap();

        container
            .call_with(
                handler,
                "handle",
                &Params::new()
                    .with("order_id", "ord-9".to_string())
                    .with("priority", 5i64),
            )
            .unwrap();

        let logger = container.get_as::<MemoryLogger>("Logger").unwrap();
        assert_eq!(*logger.lines.lock().unwrap(), ["order ord-9 (priority 5)"]);
    }

    #[test]
    fn call_missing_method_fails() {
        let container = app();
        let err = container.call("OrderHandler", "missing").unwrap_err();
        assert!(matches!(err, DiError::UnknownMethod { method, .. } if method == "missing"));
    }

    #[test]
    fn call_missing_required_argument_fails() {
        let container = app();
        let err = container.call("OrderHandler", "handle").unwrap_err();
        match err {
            DiError::MissingArgument { parameter, owner } => {
                assert_eq!(parameter, "order_id");
                assert_eq!(owner, "OrderHandler::handle");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn call_on_unregistered_instance_fails() {
        struct Stranger;

        let container = app();
        let err = container
            .call(Target::of(Arc::new(Stranger)), "handle")
            .unwrap_err();
        match err {
            DiError::UnknownMethod { target, method } => {
                assert_eq!(target, "<instance>");
                assert_eq!(method, "handle");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn container_is_shareable_across_threads() {
        static BUILDS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.singleton_factory("Seq", |_, _| {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            Ok(0u64)
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = container.clone();
                std::thread::spawn(move || c.get("Seq").unwrap())
            })
            .collect();

        let values: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // At most one instance is ever published; racing builders all
        // end up holding the published one.
        let published = container.get("Seq").unwrap();
        for value in &values {
            assert!(Arc::ptr_eq(value, &published));
        }
        assert!(BUILDS.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn each_container_is_isolated() {
        let a = app();
        let b = app();

        a.get_as::<MemoryLogger>("Logger").unwrap().log("only in a");

        let logger_b = b.get_as::<MemoryLogger>("Logger").unwrap();
        assert!(logger_b.lines.lock().unwrap().is_empty());
    }
}
