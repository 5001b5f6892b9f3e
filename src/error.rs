//! Error types for container resolution

use thiserror::Error;

/// Errors that can occur while registering or resolving bindings
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// The key has no binding and the reflector does not know it
    #[error("unresolvable key: '{key}' has no binding and no type information")]
    Unresolvable { key: String },

    /// The concrete target is an interface or otherwise cannot be constructed
    #[error("'{key}' is not instantiable (interface or missing constructor)")]
    NotInstantiable { key: String },

    /// A primitive parameter had no override and no default value
    #[error("missing argument '{parameter}' for {owner}: no override supplied and no default declared")]
    MissingArgument { parameter: String, owner: String },

    /// Resolution re-entered a key already being resolved
    #[error("circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    /// `call` named a method the reflector does not list for the target
    #[error("unknown method '{method}' on '{target}'")]
    UnknownMethod { target: String, method: String },

    /// A factory or construction closure failed
    #[error("failed to construct '{key}': {reason}")]
    CreationFailed { key: String, reason: String },

    /// A resolved value was downcast to the wrong type
    #[error("resolved value is not a {expected}")]
    TypeMismatch { expected: &'static str },
}

impl DiError {
    /// Create an Unresolvable error for a key
    #[inline]
    pub fn unresolvable(key: impl Into<String>) -> Self {
        Self::Unresolvable { key: key.into() }
    }

    /// Create a NotInstantiable error for a key
    #[inline]
    pub fn not_instantiable(key: impl Into<String>) -> Self {
        Self::NotInstantiable { key: key.into() }
    }

    /// Create a MissingArgument error; `owner` names the constructor or
    /// method whose parameter list could not be completed
    #[inline]
    pub fn missing_argument(parameter: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
            owner: owner.into(),
        }
    }

    /// Create a CircularDependency error from the in-progress resolution path
    #[inline]
    pub fn circular(path: &[String], key: &str) -> Self {
        let mut chain = path.join(" -> ");
        chain.push_str(" -> ");
        chain.push_str(key);
        Self::CircularDependency { chain }
    }

    /// Create an UnknownMethod error
    #[inline]
    pub fn unknown_method(target: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            target: target.into(),
            method: method.into(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for type T
    #[inline]
    pub fn type_mismatch<T>() -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
