//! Runtime values and their type tags
//!
//! Port values are carried by a closed tagged enum rather than boxed
//! `Any` payloads: every value knows its discriminant, and bond validity
//! is a discriminant-compatibility check performed once at bond time,
//! never per evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::Writer;

/// The declared type of a port.
///
/// `Any` is only meaningful as an *input* declaration: an `Any` input
/// accepts a bond from any output, while outputs always carry a concrete
/// tag. `Custom` names an extension type registered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Accepts any value (input declarations only)
    Any,
    Bool,
    U8,
    I8,
    Char,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Str,
    /// A host-registered extension type, identified by its stable name
    Custom(String),
}

impl TypeTag {
    /// Check whether a value of type `source` may be assigned to a port
    /// declared as `self`.
    pub fn accepts(&self, source: &TypeTag) -> bool {
        matches!(self, TypeTag::Any) || self == source
    }

    /// Stable name used as the on-disk type descriptor.
    pub fn descriptor_name(&self) -> &str {
        match self {
            TypeTag::Any => "any",
            TypeTag::Bool => "bool",
            TypeTag::U8 => "u8",
            TypeTag::I8 => "i8",
            TypeTag::Char => "char",
            TypeTag::I16 => "i16",
            TypeTag::U16 => "u16",
            TypeTag::I32 => "i32",
            TypeTag::U32 => "u32",
            TypeTag::I64 => "i64",
            TypeTag::U64 => "u64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Str => "str",
            TypeTag::Custom(name) => name,
        }
    }

    /// Reconstruct a tag from an on-disk type descriptor.
    ///
    /// Names that are not one of the built-in descriptors are treated as
    /// custom type names, so the descriptor space is total.
    pub fn from_descriptor(name: &str) -> TypeTag {
        match name {
            "any" => TypeTag::Any,
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "i8" => TypeTag::I8,
            "char" => TypeTag::Char,
            "i16" => TypeTag::I16,
            "u16" => TypeTag::U16,
            "i32" => TypeTag::I32,
            "u32" => TypeTag::U32,
            "i64" => TypeTag::I64,
            "u64" => TypeTag::U64,
            "f32" => TypeTag::F32,
            "f64" => TypeTag::F64,
            "str" => TypeTag::Str,
            other => TypeTag::Custom(other.to_string()),
        }
    }
}

/// An extension value carried by [`Value::Custom`].
///
/// Extension types supply their own binary encoding; the matching decoder
/// is registered on the [`Registry`](crate::Registry) under the same stable
/// type name.
pub trait CustomValue: fmt::Debug + Send + Sync {
    /// Stable type name, used for bond checks and as the on-disk descriptor.
    fn type_name(&self) -> &str;

    /// Clone into a fresh box.
    fn clone_box(&self) -> Box<dyn CustomValue>;

    /// Equality against another custom value (downcast as needed).
    fn eq_value(&self, other: &dyn CustomValue) -> bool;

    /// Append this value's binary encoding to the writer.
    fn encode(&self, writer: &mut Writer);
}

impl Clone for Box<dyn CustomValue> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A runtime value flowing through port bonds.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    Char(char),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Custom(Box<dyn CustomValue>),
}

impl Value {
    /// The concrete type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::U8(_) => TypeTag::U8,
            Value::I8(_) => TypeTag::I8,
            Value::Char(_) => TypeTag::Char,
            Value::I16(_) => TypeTag::I16,
            Value::U16(_) => TypeTag::U16,
            Value::I32(_) => TypeTag::I32,
            Value::U32(_) => TypeTag::U32,
            Value::I64(_) => TypeTag::I64,
            Value::U64(_) => TypeTag::U64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Str(_) => TypeTag::Str,
            Value::Custom(v) => TypeTag::Custom(v.type_name().to_string()),
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The `i32` payload, if this is an `I32`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The `i64` payload, if this is an `I64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The `f64` payload, if this is an `F64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_value(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Custom(v) => write!(f, "{v:?}"),
        }
    }
}
