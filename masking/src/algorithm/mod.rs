//! Masking algorithms and their identifiers.
//!
//! An algorithm is identified by its Rust type. [`AlgorithmId`] erases that
//! type into a `TypeId` plus a constructor, which is what directives carry and
//! what the [`AlgorithmRegistry`] caches instances under.

use std::{
    any::{type_name, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::error::ConstructError;

mod registry;
#[cfg(feature = "algorithms")]
mod routine;

pub use registry::{AlgorithmProvider, AlgorithmRegistry};
#[cfg(feature = "algorithms")]
pub use routine::{
    ChineseNameCover, EmailCover, EnglishNameCover, IdCardCover, MaskEmail, MaskIdCard, MaskName,
    MaskPhone, NameCover, PhoneCover,
};

/// Replacement text produced by [`DefaultCover`].
pub const DEFAULT_MASK: &str = "*****";

/// A pure string-to-string masking transform.
///
/// Instances are shared across threads and constructed at most once per
/// registry.
pub trait Algorithm: Send + Sync + 'static {
    fn mask(&self, content: &str) -> String;

    /// Builds a fresh instance. Failure makes the registry fall back to the
    /// default algorithm.
    fn construct() -> Result<Self, ConstructError>
    where
        Self: Sized;
}

/// Type-erased identity of an [`Algorithm`] implementation.
#[derive(Clone, Copy)]
pub struct AlgorithmId {
    type_id: TypeId,
    name: &'static str,
    construct: fn() -> Result<Arc<dyn Algorithm>, ConstructError>,
}

impl AlgorithmId {
    pub fn of<A: Algorithm>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name: type_name::<A>(),
            construct: construct_erased::<A>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self) -> Result<Arc<dyn Algorithm>, ConstructError> {
        (self.construct)()
    }
}

fn construct_erased<A: Algorithm>() -> Result<Arc<dyn Algorithm>, ConstructError> {
    let algorithm: Arc<dyn Algorithm> = Arc::new(A::construct()?);
    Ok(algorithm)
}

impl Default for AlgorithmId {
    fn default() -> Self {
        Self::of::<DefaultCover>()
    }
}

impl PartialEq for AlgorithmId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for AlgorithmId {}

impl Hash for AlgorithmId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AlgorithmId").field(&self.name).finish()
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Replaces any value with [`DEFAULT_MASK`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCover;

impl Algorithm for DefaultCover {
    fn mask(&self, _content: &str) -> String {
        DEFAULT_MASK.to_string()
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self)
    }
}
