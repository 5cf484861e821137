//! Scalar values carried between field accessors and algorithms.
//!
//! A leaf slot exposes its content as a [`ScalarValue`]. Its declared type is a
//! [`ValueType`]: a [`ScalarKind`] plus whether the slot admits "no value"
//! (`Option<T>`). A plain `T` slot never accepts `None`; an `Option<T>` slot
//! does. No widening or narrowing happens between kinds.

use std::fmt;

/// Value read from or written to a leaf slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Text(_) => ScalarKind::Text,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Char(_) => ScalarKind::Char,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::I128(_) => ScalarKind::I128,
            Self::Isize(_) => ScalarKind::Isize,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::U128(_) => ScalarKind::U128,
            Self::Usize(_) => ScalarKind::Usize,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
        }
    }

    /// Borrows the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => v.fmt(f),
            Self::Char(v) => v.fmt(f),
            Self::I8(v) => v.fmt(f),
            Self::I16(v) => v.fmt(f),
            Self::I32(v) => v.fmt(f),
            Self::I64(v) => v.fmt(f),
            Self::I128(v) => v.fmt(f),
            Self::Isize(v) => v.fmt(f),
            Self::U8(v) => v.fmt(f),
            Self::U16(v) => v.fmt(f),
            Self::U32(v) => v.fmt(f),
            Self::U64(v) => v.fmt(f),
            Self::U128(v) => v.fmt(f),
            Self::Usize(v) => v.fmt(f),
            Self::F32(v) => v.fmt(f),
            Self::F64(v) => v.fmt(f),
        }
    }
}

/// Kind of a scalar slot, without nullability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a bindable leaf slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    kind: ScalarKind,
    nullable: bool,
}

impl ValueType {
    pub const fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// The same kind, admitting "no value".
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            kind: self.kind,
            nullable: true,
        }
    }

    pub const fn kind(self) -> ScalarKind {
        self.kind
    }

    pub const fn is_nullable(self) -> bool {
        self.nullable
    }

    pub fn is_text(self) -> bool {
        self.kind == ScalarKind::Text
    }

    /// Whether `value` may be assigned to a slot of this type.
    ///
    /// `None` is assignable only to nullable slots; a present value must have
    /// exactly this kind.
    pub fn accepts(self, value: Option<&ScalarValue>) -> bool {
        match value {
            None => self.nullable,
            Some(value) => value.kind() == self.kind,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Names the value for a [`TypeMismatchError`](crate::TypeMismatchError).
pub(crate) fn describe(value: Option<&ScalarValue>) -> String {
    value.map_or_else(|| "no value".to_string(), |value| value.kind().to_string())
}
