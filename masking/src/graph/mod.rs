//! Object-graph model: what a payload looks like to the walker.
//!
//! - [`Maskable`]: every node type the walker can visit (records, leaves,
//!   sequences, maps, and the `Option`/`Box` wrappers around them)
//! - [`Record`]: a node with a static, named field table
//! - [`RowOverride`]: a record-level flag that beats the ambient mask decision
//! - [`LeafValue`]: leaves that may sit in sets, which are never walked
//! - [`Walker`]: discovery of [`FieldBinding`]s
//!
//! Implementations for standard library types live in `impls`. User records
//! get theirs from `#[derive(Mask)]`.

mod impls;
mod value;
mod walker;

pub use value::{ScalarKind, ScalarValue, ValueType};
pub(crate) use value::describe;
pub use walker::{FieldBinding, Walker};

use crate::error::{DiscoveryError, TypeMismatchError};
use crate::FieldSpec;

/// Structural category of a node, decided per value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// An absent value (`None`). Never traversed, never bound.
    Null,
    /// A terminal value: text, numbers, flags, opaque std types.
    Leaf,
    /// A value with named fields.
    Record,
    /// An ordered or unordered collection whose elements are traversed.
    Sequence,
    /// A key/value mapping whose values (never keys) are traversed.
    Map,
}

impl Shape {
    /// Complex nodes are descended into; leaves are candidates for binding.
    pub fn is_complex(self) -> bool {
        matches!(self, Self::Record | Self::Sequence | Self::Map)
    }
}

/// A node in a payload graph.
///
/// The walker only ever sees `&mut dyn Maskable`. Nothing here is called
/// per-field by user code; use `#[derive(Mask)]` for records and
/// [`impl_leaf!`](crate::impl_leaf) for opaque domain leaves.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be walked for masking",
    label = "this type does not implement `Maskable`",
    note = "use `#[derive(Mask)]` on the type definition",
    note = "or `masking::impl_leaf!({Self})` if it is an opaque leaf value"
)]
pub trait Maskable: 'static {
    fn shape(&self) -> Shape;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The record's own mask decision, if it carries one.
    ///
    /// `None` defers to the enclosing decision.
    fn row_override(&self) -> Option<bool> {
        None
    }

    /// The records of a paginated wrapper, if this is one.
    fn page_records(&mut self) -> Option<&mut dyn Maskable> {
        None
    }

    /// Reports each traversable field of a record to `walker`.
    fn visit_fields<'a>(&'a mut self, walker: &mut Walker<'a>) -> Result<(), DiscoveryError> {
        let _ = walker;
        Ok(())
    }

    /// Elements of a sequence, or values of a map.
    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(std::iter::empty())
    }

    /// Declared scalar type of this leaf, or `None` if it cannot be bound.
    fn slot_type() -> Option<ValueType>
    where
        Self: Sized,
    {
        None
    }

    /// Builds a fresh value from a scalar, handing the scalar back on mismatch.
    fn from_scalar(value: ScalarValue) -> Result<Self, ScalarValue>
    where
        Self: Sized,
    {
        Err(value)
    }

    fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
        Err(TypeMismatchError::slot(None, self.type_name()))
    }

    fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
        Err(TypeMismatchError::slot(None, describe(value.as_ref())))
    }
}

/// A leaf type that never contains maskable fields.
///
/// Set members cannot be borrowed mutably, so sets are only walkable when
/// their members are plain leaves. Implemented for the std leaves, for
/// [`impl_leaf!`](crate::impl_leaf) types and for derived unit-only enums.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be a member of a set that is walked for masking",
    label = "set members cannot be masked in place",
    note = "collect the records into a `Vec`, or mark the field `#[mask(skip)]`"
)]
pub trait LeafValue: Maskable {}

/// A node with a static table of named fields.
///
/// Field names are the declared identifiers, positional indices (`"0"`) for
/// tuple structs, and `"Variant.field"` for enum variants.
pub trait Record: Maskable + Sized {
    fn field_spec(name: &str) -> Option<FieldSpec>;
}

/// Record-level mask flag, for types that compute it rather than store it.
///
/// Wire it up with `#[mask(row_override)]` on the container.
pub trait RowOverride {
    fn mask_flag(&self) -> Option<bool>;
}
