//! The redaction driver and its shared caches.
//!
//! A [`MaskingEngine`] owns the three process-wide caches (directives,
//! accessors, algorithms). [`MaskingEngine::redact`] is the single
//! transformation entry point: it dispatches pages and sequences element by
//! element, walks each record for bindings, and rewrites every binding whose
//! effective mask is on.
//!
//! Whether to call `redact` at all is the caller's decision, usually taken from
//! [`ActivationContext::is_active`]; [`MaskingEngine::redact_if_active`] wraps
//! that check.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::{
    accessor::AccessorCache,
    algorithm::{Algorithm, AlgorithmId, AlgorithmProvider, AlgorithmRegistry},
    context::ActivationContext,
    directive::DirectiveResolver,
    error::RedactionError,
    graph::{FieldBinding, Maskable, ScalarValue, Shape, Walker},
};

static GLOBAL: OnceLock<MaskingEngine> = OnceLock::new();

/// Directive resolution, accessor binding, and algorithm lookup, with their caches.
#[derive(Debug, Default)]
pub struct MaskingEngine {
    directives: DirectiveResolver,
    accessors: AccessorCache,
    algorithms: AlgorithmRegistry,
}

impl MaskingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MaskingEngineBuilder {
        MaskingEngineBuilder::default()
    }

    /// The process-wide engine, created with defaults on first use.
    pub fn global() -> &'static MaskingEngine {
        GLOBAL.get_or_init(MaskingEngine::new)
    }

    /// Installs `engine` as the process-wide engine.
    ///
    /// Fails, handing the engine back, once the global engine exists.
    pub fn install(engine: MaskingEngine) -> Result<(), MaskingEngine> {
        GLOBAL.set(engine)
    }

    pub fn directives(&self) -> &DirectiveResolver {
        &self.directives
    }

    pub fn accessors(&self) -> &AccessorCache {
        &self.accessors
    }

    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }

    /// Empties every cache.
    pub fn reset(&self) {
        self.directives.clear();
        self.accessors.clear();
        self.algorithms.clear();
    }

    /// Collects the bindings under `root`.
    ///
    /// `ambient_mask` is the decision to apply where no row override says
    /// otherwise; `None` leaves bindings masked by default.
    pub fn discover<'a>(
        &'a self,
        root: &'a mut dyn Maskable,
        ambient_mask: Option<bool>,
    ) -> Vec<FieldBinding<'a>> {
        Walker::new(&self.directives, &self.accessors).discover(root, ambient_mask)
    }

    /// Masks `payload` in place and hands it back.
    ///
    /// On error the payload may be partially masked and must not be served.
    pub fn redact<'p, T: Maskable>(&self, payload: &'p mut T) -> Result<&'p mut T, RedactionError> {
        self.redact_dyn(payload)?;
        Ok(payload)
    }

    /// [`redact`](Self::redact) for type-erased payloads.
    pub fn redact_dyn(&self, payload: &mut dyn Maskable) -> Result<(), RedactionError> {
        if let Some(records) = payload.page_records() {
            return self.redact_dyn(records);
        }
        match payload.shape() {
            Shape::Null => Ok(()),
            Shape::Sequence => {
                for element in payload.elements_mut() {
                    self.redact_dyn(element)?;
                }
                Ok(())
            }
            Shape::Leaf | Shape::Record | Shape::Map => self.redact_single(payload),
        }
    }

    /// Masks `payload` only while the current activation context is active.
    pub fn redact_if_active<'p, T: Maskable>(
        &self,
        payload: &'p mut T,
    ) -> Result<&'p mut T, RedactionError> {
        if ActivationContext::is_active() {
            self.redact(payload)
        } else {
            Ok(payload)
        }
    }

    fn redact_single(&self, payload: &mut dyn Maskable) -> Result<(), RedactionError> {
        let record = payload.type_name();
        let bindings = self.discover(payload, Some(true));
        if bindings.is_empty() {
            return Ok(());
        }
        debug!(record, bindings = bindings.len(), "masking fields");

        for mut binding in bindings {
            if !binding.effective_mask() {
                continue;
            }
            let Some(value) = binding.read()? else {
                continue;
            };
            let ScalarValue::Text(content) = value else {
                debug!(field = %binding.key(), kind = %value.kind(), "skipping non-text field");
                continue;
            };
            let algorithm = self.algorithms.resolve(binding.directive().algorithm())?;
            binding.write(Some(ScalarValue::Text(algorithm.mask(&content))))?;
        }
        Ok(())
    }
}

/// Configures a [`MaskingEngine`].
#[derive(Default)]
pub struct MaskingEngineBuilder {
    provider: Option<Arc<dyn AlgorithmProvider>>,
    default_algorithm: Option<AlgorithmId>,
    instances: Vec<(AlgorithmId, Arc<dyn Algorithm>)>,
}

impl MaskingEngineBuilder {
    /// External source consulted before algorithms are constructed.
    #[must_use]
    pub fn provider(mut self, provider: impl AlgorithmProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Algorithm used when a requested one cannot be constructed.
    #[must_use]
    pub fn default_algorithm<A: Algorithm>(mut self) -> Self {
        self.default_algorithm = Some(AlgorithmId::of::<A>());
        self
    }

    /// Pre-registers an instance, bypassing construction for `A`.
    #[must_use]
    pub fn register<A: Algorithm>(mut self, algorithm: A) -> Self {
        self.instances.push((AlgorithmId::of::<A>(), Arc::new(algorithm)));
        self
    }

    /// Pre-registers an instance under another algorithm's identifier.
    #[must_use]
    pub fn register_as<A: Algorithm>(mut self, algorithm: Arc<dyn Algorithm>) -> Self {
        self.instances.push((AlgorithmId::of::<A>(), algorithm));
        self
    }

    pub fn build(self) -> MaskingEngine {
        let algorithms =
            AlgorithmRegistry::new(self.provider, self.default_algorithm.unwrap_or_default());
        for (id, algorithm) in self.instances {
            algorithms.register_instance(id, algorithm);
        }
        MaskingEngine {
            directives: DirectiveResolver::new(),
            accessors: AccessorCache::new(),
            algorithms,
        }
    }
}

impl std::fmt::Debug for MaskingEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskingEngineBuilder")
            .field("provider", &self.provider.is_some())
            .field("default_algorithm", &self.default_algorithm)
            .field("instances", &self.instances.len())
            .finish()
    }
}

/// `.redact()` on any maskable value, through the global engine.
pub trait Redact: Maskable + Sized {
    /// Masks `self` and returns it.
    fn redact(mut self) -> Result<Self, RedactionError> {
        MaskingEngine::global().redact(&mut self)?;
        Ok(self)
    }

    /// Masks `self` in place.
    fn redact_in_place(&mut self) -> Result<&mut Self, RedactionError> {
        MaskingEngine::global().redact(self)
    }
}

impl<T> Redact for T where T: Maskable {}
