//! Discovery of maskable leaf fields.
//!
//! The walker visits a payload depth-first and produces one [`FieldBinding`]
//! per leaf field that carries a directive and is eligible for masking. It
//! threads two values down the tree:
//!
//! - the ambient mask decision (`Option<bool>`), replaced by a record's row
//!   override when the record has one
//! - whether the field that led to the current record carried a directive,
//!   which gates `inherit`-only directives
//!
//! Sequence and map elements keep the mask decision but start without a parent
//! directive: a directive on a collection field does not reach the records
//! inside it. A field that cannot be bound is skipped on its own. A record whose
//! `visit_fields` fails contributes no bindings; its siblings are unaffected.

use std::{fmt, sync::Arc};

use tracing::{trace, warn};

use super::{Maskable, ScalarValue, Shape};
use crate::{
    accessor::{Accessor, AccessorCache, FieldKey, FieldSpec},
    directive::{Directive, DirectiveResolver},
    error::TypeMismatchError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frame {
    mask: Option<bool>,
    parent_had_directive: bool,
}

/// Collects bindings while descending a payload.
///
/// Handed to [`Maskable::visit_fields`]; derived impls call
/// [`visit_field`](Self::visit_field) once per traversable field.
pub struct Walker<'a> {
    directives: &'a DirectiveResolver,
    accessors: &'a AccessorCache,
    frame: Frame,
    bindings: Vec<FieldBinding<'a>>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(directives: &'a DirectiveResolver, accessors: &'a AccessorCache) -> Self {
        Self {
            directives,
            accessors,
            frame: Frame {
                mask: None,
                parent_had_directive: false,
            },
            bindings: Vec::new(),
        }
    }

    /// Walks `root` and returns every binding found, in traversal order.
    pub(crate) fn discover(
        mut self,
        root: &'a mut dyn Maskable,
        ambient_mask: Option<bool>,
    ) -> Vec<FieldBinding<'a>> {
        self.descend(
            root,
            Frame {
                mask: ambient_mask,
                parent_had_directive: false,
            },
        );
        self.bindings
    }

    /// Reports one field of the record currently being visited.
    ///
    /// Complex values are descended into. Leaves become bindings when they
    /// carry a directive, unless the directive is inherit-only and the field
    /// that led here had none. A leaf whose accessor cannot be bound is left
    /// out; the other fields of the record are still reported.
    pub fn visit_field(&mut self, spec: FieldSpec, value: &'a mut dyn Maskable) {
        let directive = self.directives.resolve(&spec);
        let shape = value.shape();

        if shape == Shape::Null {
            return;
        }

        if shape.is_complex() {
            self.descend(
                value,
                Frame {
                    mask: self.frame.mask,
                    parent_had_directive: directive.is_some(),
                },
            );
            return;
        }

        let Some(directive) = directive else {
            return;
        };

        if directive.inherits_from_parent() && !self.frame.parent_had_directive {
            trace!(field = %spec.key(), "inherit-only directive without a directive on the parent");
            return;
        }

        let accessor = match self.accessors.get(&spec) {
            Ok(accessor) => accessor,
            Err(err) => {
                warn!(field = %spec.key(), error = %err, "field cannot be bound, left unmasked");
                return;
            }
        };
        self.bindings.push(FieldBinding {
            directive,
            effective_mask: self.frame.mask.unwrap_or(true),
            accessor,
            slot: value,
        });
    }

    /// Descends into a field-less child, such as the records of a page.
    ///
    /// The child is treated as if reached through a field without a directive.
    pub fn visit_nested(&mut self, value: &'a mut dyn Maskable) {
        if value.shape().is_complex() {
            self.descend(
                value,
                Frame {
                    mask: self.frame.mask,
                    parent_had_directive: false,
                },
            );
        }
    }

    fn descend(&mut self, node: &'a mut dyn Maskable, frame: Frame) {
        let frame = Frame {
            mask: node.row_override().or(frame.mask),
            ..frame
        };

        match node.shape() {
            Shape::Null | Shape::Leaf => {}
            Shape::Sequence | Shape::Map => {
                let frame = Frame {
                    parent_had_directive: false,
                    ..frame
                };
                for element in node.elements_mut() {
                    if element.shape().is_complex() {
                        self.descend(element, frame);
                    }
                }
            }
            Shape::Record => self.descend_record(node, frame),
        }
    }

    fn descend_record(&mut self, node: &'a mut dyn Maskable, frame: Frame) {
        let record = node.type_name();
        let mark = self.bindings.len();
        let outer = std::mem::replace(&mut self.frame, frame);

        if let Err(err) = node.visit_fields(self) {
            warn!(record, error = %err, "field discovery failed, record skipped");
            self.bindings.truncate(mark);
        }

        self.frame = outer;
    }
}

impl fmt::Debug for Walker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("frame", &self.frame)
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

/// A discovered leaf field paired with its directive and accessor.
///
/// Borrows the leaf's slot mutably for the duration of the redaction call.
pub struct FieldBinding<'a> {
    directive: Directive,
    effective_mask: bool,
    accessor: Arc<Accessor>,
    slot: &'a mut dyn Maskable,
}

impl FieldBinding<'_> {
    pub fn key(&self) -> FieldKey {
        self.accessor.key()
    }

    pub fn directive(&self) -> Directive {
        self.directive
    }

    /// The resolved mask decision for the record that owns this field.
    pub fn effective_mask(&self) -> bool {
        self.effective_mask
    }

    pub fn accessor(&self) -> &Arc<Accessor> {
        &self.accessor
    }

    pub fn read(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
        self.accessor.read_slot(&*self.slot)
    }

    pub fn write(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
        self.accessor.write_slot(&mut *self.slot, value)
    }
}

impl fmt::Debug for FieldBinding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("key", &self.key())
            .field("directive", &self.directive)
            .field("effective_mask", &self.effective_mask)
            .finish_non_exhaustive()
    }
}
