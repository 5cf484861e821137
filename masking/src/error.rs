//! Error taxonomy for discovery, field access, and algorithm resolution.
//!
//! Only [`RedactionError`] crosses the engine's public entrypoint. The other
//! types are surfaced by the individual components; the fatal ones are wrapped
//! on the way out.

use thiserror::Error;

use crate::graph::ValueType;

/// An accessor could not be bound for a `(declaring type, field)` pair.
///
/// Binding failures are never cached: the next lookup for the same key
/// retries construction. During redaction the unbindable field is skipped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// The declaring type has no field with this name.
    #[error("`{declaring}` has no field named `{field}`")]
    UnknownField {
        declaring: &'static str,
        field: String,
    },
    /// The field's declared type has no scalar representation to read or write.
    #[error("field `{declaring}.{field}` of type `{declared}` cannot be bound to a scalar accessor")]
    Unsupported {
        declaring: &'static str,
        field: &'static str,
        declared: &'static str,
    },
}

/// A value was not assignable to the slot it was read from or written to.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("type mismatch on `{field}`: expected {expected}, found {found}")]
pub struct TypeMismatchError {
    pub field: String,
    pub expected: String,
    pub found: String,
}

impl TypeMismatchError {
    pub(crate) fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn slot(expected: Option<ValueType>, found: impl Into<String>) -> Self {
        Self::new(
            "<slot>",
            expected.map_or_else(|| "an unbound leaf".to_string(), |ty| ty.to_string()),
            found,
        )
    }

    pub(crate) fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// An algorithm implementation refused to construct itself.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ConstructError(pub String);

impl ConstructError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Neither the requested algorithm nor the default algorithm could be obtained.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("masking algorithm `{requested}` is unavailable")]
pub struct AlgorithmUnavailableError {
    pub requested: &'static str,
    #[source]
    pub source: ConstructError,
}

/// A record could not report its fields.
///
/// Returned from hand-written [`Maskable::visit_fields`](crate::Maskable::visit_fields)
/// impls. The walker recovers locally: the failing record contributes no
/// bindings and discovery continues with its siblings.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DiscoveryError(pub String);

impl DiscoveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Fatal failure of a single `redact` call.
///
/// The payload may already be partially masked when this is returned and
/// should not be served.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RedactionError {
    #[error("failed to write masked value")]
    TypeMismatch(#[from] TypeMismatchError),
    #[error("failed to resolve masking algorithm")]
    AlgorithmUnavailable(#[from] AlgorithmUnavailableError),
}
