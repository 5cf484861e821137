//! Identifier-to-instance resolution with caching and default fallback.

use std::{fmt, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, warn};

use super::{Algorithm, AlgorithmId};
use crate::error::{AlgorithmUnavailableError, ConstructError};

/// External source of algorithm instances, consulted before construction.
///
/// Returning `None` falls through to the identifier's own constructor.
/// Closures of the matching signature implement this trait.
pub trait AlgorithmProvider: Send + Sync {
    fn lookup(&self, id: AlgorithmId) -> Option<Arc<dyn Algorithm>>;
}

impl<F> AlgorithmProvider for F
where
    F: Fn(AlgorithmId) -> Option<Arc<dyn Algorithm>> + Send + Sync,
{
    fn lookup(&self, id: AlgorithmId) -> Option<Arc<dyn Algorithm>> {
        self(id)
    }
}

/// Concurrent cache of algorithm instances.
///
/// Resolution order: cached instance, provider, constructor, then the same
/// two steps for the default algorithm. A fallback instance is cached under
/// the identifier that was requested. Nothing is cached when resolution fails.
///
/// Provider lookups and constructors run while the entry for their identifier
/// is locked, so they must not resolve algorithms from the same registry.
pub struct AlgorithmRegistry {
    instances: DashMap<AlgorithmId, Arc<dyn Algorithm>>,
    provider: Option<Arc<dyn AlgorithmProvider>>,
    default: AlgorithmId,
}

impl AlgorithmRegistry {
    pub fn new(provider: Option<Arc<dyn AlgorithmProvider>>, default: AlgorithmId) -> Self {
        Self {
            instances: DashMap::new(),
            provider,
            default,
        }
    }

    pub fn default_algorithm(&self) -> AlgorithmId {
        self.default
    }

    /// Registers an instance for `A`, replacing any cached one.
    pub fn register<A: Algorithm>(&self, algorithm: A) {
        self.register_instance(AlgorithmId::of::<A>(), Arc::new(algorithm));
    }

    /// Registers an instance under an arbitrary identifier.
    pub fn register_instance(&self, id: AlgorithmId, algorithm: Arc<dyn Algorithm>) {
        debug!(algorithm = %id, "registered algorithm instance");
        self.instances.insert(id, algorithm);
    }

    pub fn resolve(&self, id: AlgorithmId) -> Result<Arc<dyn Algorithm>, AlgorithmUnavailableError> {
        if let Some(algorithm) = self.instances.get(&id).map(|entry| Arc::clone(entry.value())) {
            return Ok(algorithm);
        }

        match self.instances.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let algorithm = self.obtain(id)?;
                entry.insert(Arc::clone(&algorithm));
                Ok(algorithm)
            }
        }
    }

    pub fn contains(&self, id: AlgorithmId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&self) {
        debug!(cached = self.instances.len(), "clearing algorithm registry");
        self.instances.clear();
    }

    fn obtain(&self, id: AlgorithmId) -> Result<Arc<dyn Algorithm>, AlgorithmUnavailableError> {
        let err = match self.lookup_or_construct(id) {
            Ok(algorithm) => return Ok(algorithm),
            Err(err) => err,
        };

        if id == self.default {
            return Err(AlgorithmUnavailableError {
                requested: id.name(),
                source: err,
            });
        }

        warn!(algorithm = %id, error = %err, fallback = %self.default, "algorithm construction failed, using default");
        self.lookup_or_construct(self.default)
            .map_err(|source| AlgorithmUnavailableError {
                requested: id.name(),
                source,
            })
    }

    fn lookup_or_construct(&self, id: AlgorithmId) -> Result<Arc<dyn Algorithm>, ConstructError> {
        if let Some(algorithm) = self.provider.as_ref().and_then(|provider| provider.lookup(id)) {
            debug!(algorithm = %id, "algorithm supplied by provider");
            return Ok(algorithm);
        }
        debug!(algorithm = %id, "constructing algorithm");
        id.construct()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new(None, AlgorithmId::default())
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("cached", &self.instances.len())
            .field("provider", &self.provider.is_some())
            .field("default", &self.default)
            .finish()
    }
}
