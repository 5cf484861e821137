//! Field accessors and the process-wide accessor cache.
//!
//! A [`FieldSpec`] is the static description `#[derive(Mask)]` emits for each
//! field: its key, its directive metadata, and projections from the owner to
//! the field's slot. Binding a spec yields an [`Accessor`], which reads and
//! writes the field with exact type checks. The [`AccessorCache`] binds each
//! `(declaring type, field)` at most once and shares the result.

use std::{
    any::{type_name, Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, info};

use crate::{
    directive::FieldMetadata,
    error::{BindingError, TypeMismatchError},
    graph::{describe, Maskable, Record, ScalarValue, ValueType},
};

/// Identity of a Rust type, with its name kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `(declaring type, field name)`: the cache key for accessors and directives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    declaring: TypeKey,
    field: &'static str,
}

impl FieldKey {
    pub fn new(declaring: TypeKey, field: &'static str) -> Self {
        Self { declaring, field }
    }

    pub fn declaring(self) -> TypeKey {
        self.declaring
    }

    pub fn field(self) -> &'static str {
        self.field
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring, self.field)
    }
}

type Project = fn(&dyn Any) -> Option<&dyn Maskable>;
type ProjectMut = fn(&mut dyn Any) -> Option<&mut dyn Maskable>;

/// Static description of one record field.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    key: FieldKey,
    declared: &'static str,
    slot_type: fn() -> Option<ValueType>,
    metadata: fn() -> FieldMetadata,
    project: Project,
    project_mut: ProjectMut,
}

impl FieldSpec {
    /// Describes field `name` of type `F` declared on `O`.
    ///
    /// `project` and `project_mut` must return `None` exactly when the owner is
    /// not an `O` (or is an enum variant that lacks the field).
    pub fn new<O: 'static, F: Maskable>(
        name: &'static str,
        metadata: fn() -> FieldMetadata,
        project: Project,
        project_mut: ProjectMut,
    ) -> Self {
        Self {
            key: FieldKey::new(TypeKey::of::<O>(), name),
            declared: type_name::<F>(),
            slot_type: F::slot_type,
            metadata,
            project,
            project_mut,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.field
    }

    /// Name of the field's declared type.
    pub fn declared(&self) -> &'static str {
        self.declared
    }

    pub fn metadata(&self) -> FieldMetadata {
        (self.metadata)()
    }

    pub(crate) fn bind(&self) -> Result<Accessor, BindingError> {
        let value_type = (self.slot_type)().ok_or(BindingError::Unsupported {
            declaring: self.key.declaring.name,
            field: self.key.field,
            declared: self.declared,
        })?;
        Ok(Accessor {
            key: self.key,
            value_type,
            project: self.project,
            project_mut: self.project_mut,
        })
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

/// Typed read/write handle for one field.
///
/// Reads yield `None` for an absent nullable value. Writes are checked
/// against the declared [`ValueType`] before touching the owner.
#[derive(Clone, Copy)]
pub struct Accessor {
    key: FieldKey,
    value_type: ValueType,
    project: Project,
    project_mut: ProjectMut,
}

impl Accessor {
    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn declaring(&self) -> TypeKey {
        self.key.declaring
    }

    pub fn field(&self) -> &'static str {
        self.key.field
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Reads the field from `owner`.
    pub fn get(&self, owner: &dyn Any) -> Result<Option<ScalarValue>, TypeMismatchError> {
        let slot = (self.project)(owner).ok_or_else(|| self.foreign_owner())?;
        self.read_slot(slot)
    }

    /// Reads a text field from `owner`.
    pub fn get_text(&self, owner: &dyn Any) -> Result<Option<String>, TypeMismatchError> {
        match self.get(owner)? {
            None => Ok(None),
            Some(ScalarValue::Text(text)) => Ok(Some(text)),
            Some(other) => Err(self.mismatch(Some(&other))),
        }
    }

    /// Writes `value` into the field of `owner`.
    pub fn set(
        &self,
        owner: &mut dyn Any,
        value: Option<ScalarValue>,
    ) -> Result<(), TypeMismatchError> {
        if !self.value_type.accepts(value.as_ref()) {
            return Err(self.mismatch(value.as_ref()));
        }
        let slot = (self.project_mut)(owner).ok_or_else(|| self.foreign_owner())?;
        self.write_slot(slot, value)
    }

    pub fn set_text(&self, owner: &mut dyn Any, text: impl Into<String>) -> Result<(), TypeMismatchError> {
        self.set(owner, Some(ScalarValue::Text(text.into())))
    }

    pub(crate) fn read_slot(&self, slot: &dyn Maskable) -> Result<Option<ScalarValue>, TypeMismatchError> {
        slot.read_slot()
            .map_err(|err| err.with_field(self.key.to_string()))
    }

    pub(crate) fn write_slot(
        &self,
        slot: &mut dyn Maskable,
        value: Option<ScalarValue>,
    ) -> Result<(), TypeMismatchError> {
        if !self.value_type.accepts(value.as_ref()) {
            return Err(self.mismatch(value.as_ref()));
        }
        slot.write_slot(value)
            .map_err(|err| err.with_field(self.key.to_string()))
    }

    fn mismatch(&self, found: Option<&ScalarValue>) -> TypeMismatchError {
        TypeMismatchError::new(self.key.to_string(), self.value_type.to_string(), describe(found))
    }

    fn foreign_owner(&self) -> TypeMismatchError {
        TypeMismatchError::new(
            self.key.to_string(),
            self.key.declaring.name,
            "an owner of another type or variant",
        )
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("key", &self.key)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AccessorCache
// =============================================================================

/// Hit/miss counters of an [`AccessorCache`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={}, hits={}, misses={}, hit_rate={:.2}%",
            self.size,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )
    }
}

/// Concurrent `FieldKey -> Arc<Accessor>` cache.
///
/// Construction for a key runs at most once even under contention: racing
/// callers wait on the entry and then observe the same `Arc`. A failed
/// construction inserts nothing.
#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: DashMap<FieldKey, Arc<Accessor>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, spec: &FieldSpec) -> Result<Arc<Accessor>, BindingError> {
        let key = spec.key();
        if let Some(accessor) = self.entries.get(&key).map(|entry| Arc::clone(entry.value())) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(accessor);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let accessor = Arc::new(spec.bind()?);
                debug!(field = %key, value_type = %accessor.value_type(), "bound field accessor");
                entry.insert(Arc::clone(&accessor));
                Ok(accessor)
            }
        }
    }

    /// Looks up `field` in `T`'s field table and binds it.
    pub fn get_for<T: Record>(&self, field: &str) -> Result<Arc<Accessor>, BindingError> {
        let spec = T::field_spec(field).ok_or_else(|| BindingError::UnknownField {
            declaring: type_name::<T>(),
            field: field.to_owned(),
        })?;
        self.get(&spec)
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops the accessor for one field of `T`. Returns whether one was cached.
    pub fn invalidate<T: 'static>(&self, field: &str) -> bool {
        let declaring = TypeKey::of::<T>();
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !(key.declaring == declaring && key.field == field));
        self.entries.len() < before
    }

    /// Drops every accessor declared on `T`. Returns how many were removed.
    pub fn invalidate_type<T: 'static>(&self) -> usize {
        let declaring = TypeKey::of::<T>();
        let before = self.entries.len();
        self.entries.retain(|key, _| key.declaring != declaring);
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        info!(stats = %self.stats(), "clearing accessor cache");
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
