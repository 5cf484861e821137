//! Masking directives and their resolution.
//!
//! A field's directive comes either from its own `#[mask]` attribute or, when
//! absent, from the first of its `#[mask_preset(..)]` markers that carries one.
//! Presets are looked at one level deep only.

use std::fmt;

use dashmap::DashMap;

use crate::{
    accessor::{FieldKey, FieldSpec},
    algorithm::{Algorithm, AlgorithmId},
};

/// Instruction to mask a field with a particular algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Directive {
    algorithm: AlgorithmId,
    inherit_from_parent: bool,
}

impl Directive {
    pub fn new(algorithm: AlgorithmId) -> Self {
        Self {
            algorithm,
            inherit_from_parent: false,
        }
    }

    pub fn with<A: Algorithm>() -> Self {
        Self::new(AlgorithmId::of::<A>())
    }

    /// Makes the directive apply only under a parent field that has one.
    #[must_use]
    pub fn inherit_from_parent(mut self, inherit: bool) -> Self {
        self.inherit_from_parent = inherit;
        self
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    pub fn inherits_from_parent(&self) -> bool {
        self.inherit_from_parent
    }
}

/// A marker that carries a directive on behalf of the fields it annotates.
///
/// ```
/// use masking::{Directive, Preset, PhoneCover};
///
/// struct MaskMobile;
///
/// impl Preset for MaskMobile {
///     fn directive() -> Option<Directive> {
///         Some(Directive::with::<PhoneCover>())
///     }
/// }
/// ```
pub trait Preset: 'static {
    fn directive() -> Option<Directive> {
        None
    }
}

/// A preset attached to a field, by name.
#[derive(Clone, Copy)]
pub struct PresetRef {
    name: &'static str,
    directive: fn() -> Option<Directive>,
}

impl PresetRef {
    pub fn of<P: Preset>() -> Self {
        Self {
            name: std::any::type_name::<P>(),
            directive: P::directive,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn directive(&self) -> Option<Directive> {
        (self.directive)()
    }
}

impl fmt::Debug for PresetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PresetRef").field(&self.name).finish()
    }
}

/// Attribute metadata of one field, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct FieldMetadata {
    directive: Option<Directive>,
    presets: Vec<PresetRef>,
}

impl FieldMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directive = Some(directive);
        self
    }

    #[must_use]
    pub fn with_preset<P: Preset>(mut self) -> Self {
        self.presets.push(PresetRef::of::<P>());
        self
    }

    pub fn directive(&self) -> Option<Directive> {
        self.directive
    }

    pub fn presets(&self) -> &[PresetRef] {
        &self.presets
    }

    /// The field's own directive, else the first preset's.
    pub fn resolve(&self) -> Option<Directive> {
        self.directive
            .or_else(|| self.presets.iter().find_map(PresetRef::directive))
    }
}

/// Memoized directive lookup per field.
#[derive(Debug, Default)]
pub struct DirectiveResolver {
    resolved: DashMap<FieldKey, Option<Directive>>,
}

impl DirectiveResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, spec: &FieldSpec) -> Option<Directive> {
        if let Some(directive) = self.resolved.get(&spec.key()).map(|entry| *entry.value()) {
            return directive;
        }
        *self
            .resolved
            .entry(spec.key())
            .or_insert_with(|| spec.metadata().resolve())
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn clear(&self) {
        self.resolved.clear();
    }
}
