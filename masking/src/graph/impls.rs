//! `Maskable` implementations for standard library types.
//!
//! Text-like and primitive types are bindable leaves. `Option<T>` is the
//! nullable form of `T`'s slot and is `Null` when empty. Collections are
//! sequences; maps expose only their values. Sets are only implemented for
//! [`LeafValue`] members, which are never masked on their own, so a set of
//! records is rejected at compile time instead of going out unmasked.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use super::{describe, LeafValue, Maskable, ScalarKind, ScalarValue, Shape, ValueType, Walker};
use crate::error::{DiscoveryError, TypeMismatchError};

/// Implements [`Maskable`](crate::Maskable) for opaque leaf types.
///
/// Such leaves are never traversed and cannot be bound to an accessor, so a
/// directive on a field of this type leaves that field unmasked with a warning.
///
/// ```
/// struct Checksum([u8; 32]);
/// masking::impl_leaf!(Checksum);
/// ```
#[macro_export]
macro_rules! impl_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Maskable for $ty {
                fn shape(&self) -> $crate::Shape {
                    $crate::Shape::Leaf
                }
            }

            impl $crate::LeafValue for $ty {}
        )+
    };
}

// =============================================================================
// Bindable leaves
// =============================================================================

fn write_plain<T: Maskable>(slot: &mut T, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
    let expected = T::slot_type();
    let Some(value) = value else {
        return Err(TypeMismatchError::slot(expected, describe(None)));
    };
    *slot = T::from_scalar(value).map_err(|rejected| {
        TypeMismatchError::slot(expected, describe(Some(&rejected)))
    })?;
    Ok(())
}

macro_rules! text_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Maskable for $ty {
                fn shape(&self) -> Shape {
                    Shape::Leaf
                }

                fn slot_type() -> Option<ValueType> {
                    Some(ValueType::new(ScalarKind::Text))
                }

                fn from_scalar(value: ScalarValue) -> Result<Self, ScalarValue> {
                    match value {
                        ScalarValue::Text(text) => Ok(text.into()),
                        other => Err(other),
                    }
                }

                fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
                    Ok(Some(ScalarValue::Text(AsRef::<str>::as_ref(self).to_owned())))
                }

                fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
                    write_plain(self, value)
                }
            }

            impl LeafValue for $ty {}
        )+
    };
}

text_leaf!(String, Cow<'static, str>, Box<str>, Arc<str>);

macro_rules! scalar_leaf {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Maskable for $ty {
                fn shape(&self) -> Shape {
                    Shape::Leaf
                }

                fn slot_type() -> Option<ValueType> {
                    Some(ValueType::new(ScalarKind::$variant))
                }

                fn from_scalar(value: ScalarValue) -> Result<Self, ScalarValue> {
                    match value {
                        ScalarValue::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }

                fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
                    Ok(Some(ScalarValue::$variant(*self)))
                }

                fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
                    write_plain(self, value)
                }
            }

            impl LeafValue for $ty {}
        )+
    };
}

scalar_leaf!(
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
);

crate::impl_leaf!(
    (),
    &'static str,
    Duration,
    Instant,
    SystemTime,
    IpAddr,
    Ipv4Addr,
    Ipv6Addr,
    SocketAddr,
    PathBuf,
);

// =============================================================================
// Wrappers
// =============================================================================

impl<T: Maskable> Maskable for Option<T> {
    fn shape(&self) -> Shape {
        self.as_ref().map_or(Shape::Null, |inner| inner.shape())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Some(inner) => inner.type_name(),
            None => std::any::type_name::<Self>(),
        }
    }

    fn row_override(&self) -> Option<bool> {
        self.as_ref().and_then(|inner| inner.row_override())
    }

    fn page_records(&mut self) -> Option<&mut dyn Maskable> {
        self.as_mut().and_then(|inner| inner.page_records())
    }

    fn visit_fields<'a>(&'a mut self, walker: &mut Walker<'a>) -> Result<(), DiscoveryError> {
        match self {
            Some(inner) => inner.visit_fields(walker),
            None => Ok(()),
        }
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        match self {
            Some(inner) => inner.elements_mut(),
            None => Box::new(std::iter::empty()),
        }
    }

    fn slot_type() -> Option<ValueType> {
        T::slot_type().map(ValueType::nullable)
    }

    fn from_scalar(value: ScalarValue) -> Result<Self, ScalarValue> {
        T::from_scalar(value).map(Some)
    }

    fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
        match self {
            Some(inner) => inner.read_slot(),
            None if T::slot_type().is_some() => Ok(None),
            None => Err(TypeMismatchError::slot(None, std::any::type_name::<Self>())),
        }
    }

    fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
        let expected = Self::slot_type();
        match value {
            None if expected.is_some() => {
                *self = None;
                Ok(())
            }
            None => Err(TypeMismatchError::slot(expected, describe(None))),
            Some(value) => match self {
                Some(inner) => inner.write_slot(Some(value)),
                None => {
                    let fresh = T::from_scalar(value).map_err(|rejected| {
                        TypeMismatchError::slot(expected, describe(Some(&rejected)))
                    })?;
                    *self = Some(fresh);
                    Ok(())
                }
            },
        }
    }
}

impl<T: Maskable> Maskable for Box<T> {
    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn row_override(&self) -> Option<bool> {
        (**self).row_override()
    }

    fn page_records(&mut self) -> Option<&mut dyn Maskable> {
        (**self).page_records()
    }

    fn visit_fields<'a>(&'a mut self, walker: &mut Walker<'a>) -> Result<(), DiscoveryError> {
        (**self).visit_fields(walker)
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        (**self).elements_mut()
    }

    fn slot_type() -> Option<ValueType> {
        T::slot_type()
    }

    fn from_scalar(value: ScalarValue) -> Result<Self, ScalarValue> {
        T::from_scalar(value).map(Box::new)
    }

    fn read_slot(&self) -> Result<Option<ScalarValue>, TypeMismatchError> {
        (**self).read_slot()
    }

    fn write_slot(&mut self, value: Option<ScalarValue>) -> Result<(), TypeMismatchError> {
        (**self).write_slot(value)
    }
}

// =============================================================================
// Collections
// =============================================================================

fn erase<T: Maskable>(item: &mut T) -> &mut dyn Maskable {
    item
}

impl<T: Maskable> Maskable for Vec<T> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.iter_mut().map(erase))
    }
}

impl<T: Maskable> Maskable for VecDeque<T> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.iter_mut().map(erase))
    }
}

impl<T: Maskable> Maskable for LinkedList<T> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.iter_mut().map(erase))
    }
}

impl<T: Maskable, const N: usize> Maskable for [T; N] {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.iter_mut().map(erase))
    }
}

impl<K: 'static, V: Maskable, S: 'static> Maskable for HashMap<K, V, S> {
    fn shape(&self) -> Shape {
        Shape::Map
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.values_mut().map(erase))
    }
}

impl<K: 'static, V: Maskable> Maskable for BTreeMap<K, V> {
    fn shape(&self) -> Shape {
        Shape::Map
    }

    fn elements_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Maskable> + '_> {
        Box::new(self.values_mut().map(erase))
    }
}

impl<T: LeafValue, S: 'static> Maskable for HashSet<T, S> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }
}

impl<T: LeafValue> Maskable for BTreeSet<T> {
    fn shape(&self) -> Shape {
        Shape::Sequence
    }
}
