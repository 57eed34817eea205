//! Dynamically-typed values exchanged with remote objects

use crate::{same_object, DispatchError, RemoteHandle, Result};
use std::fmt;

/// A value crossing the dispatch boundary
///
/// Objects travel as live handles, never as copies.
#[derive(Clone, Default)]
pub enum Variant {
    /// No value (also used for omitted optional arguments)
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Variant>),
    Object(RemoteHandle),
}

impl Variant {
    /// Name of the variant kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Variant::Empty => "empty",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Str(_) => "string",
            Variant::Array(_) => "array",
            Variant::Object(_) => "object",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Borrow the handle if this is an object
    pub fn as_object(&self) -> Option<&RemoteHandle> {
        match self {
            Variant::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// Borrow the string if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "Empty"),
            Variant::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Variant::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Variant::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Variant::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Variant::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Variant::Object(handle) => write!(f, "Object(<{}>)", handle.describe()),
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variant::Empty, Variant::Empty) => true,
            (Variant::Bool(a), Variant::Bool(b)) => a == b,
            (Variant::Int(a), Variant::Int(b)) => a == b,
            (Variant::Float(a), Variant::Float(b)) => a == b,
            (Variant::Str(a), Variant::Str(b)) => a == b,
            (Variant::Array(a), Variant::Array(b)) => a == b,
            (Variant::Object(a), Variant::Object(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(i64::from(value))
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Float(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::Str(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::Str(value)
    }
}

impl From<RemoteHandle> for Variant {
    fn from(value: RemoteHandle) -> Self {
        Variant::Object(value)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Variant::Array(value)
    }
}

impl From<Vec<f64>> for Variant {
    fn from(value: Vec<f64>) -> Self {
        Variant::Array(value.into_iter().map(Variant::Float).collect())
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Variant::Empty)
    }
}

/// Conversion out of a [`Variant`]
pub trait FromVariant: Sized {
    fn from_variant(value: Variant) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, found: &Variant) -> Result<T> {
    Err(DispatchError::TypeMismatch {
        expected,
        found: found.kind(),
    })
}

impl FromVariant for Variant {
    fn from_variant(value: Variant) -> Result<Self> {
        Ok(value)
    }
}

impl FromVariant for bool {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Bool(b) => Ok(b),
            // Automation hosts commonly report booleans as 0 / -1
            Variant::Int(i) => Ok(i != 0),
            other => mismatch("bool", &other),
        }
    }
}

impl FromVariant for i64 {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Int(i) => Ok(i),
            other => mismatch("int", &other),
        }
    }
}

impl FromVariant for i32 {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Int(i) => i32::try_from(i).or_else(|_| mismatch("int32", &Variant::Int(i))),
            other => mismatch("int32", &other),
        }
    }
}

impl FromVariant for f64 {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Float(x) => Ok(x),
            Variant::Int(i) => Ok(i as f64),
            other => mismatch("float", &other),
        }
    }
}

impl FromVariant for String {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Str(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl FromVariant for RemoteHandle {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Object(handle) => Ok(handle),
            other => mismatch("object", &other),
        }
    }
}

impl FromVariant for Vec<Variant> {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Array(items) => Ok(items),
            Variant::Empty => Ok(Vec::new()),
            other => mismatch("array", &other),
        }
    }
}

impl FromVariant for Vec<f64> {
    fn from_variant(value: Variant) -> Result<Self> {
        Vec::<Variant>::from_variant(value)?
            .into_iter()
            .map(f64::from_variant)
            .collect()
    }
}

impl FromVariant for Vec<String> {
    fn from_variant(value: Variant) -> Result<Self> {
        Vec::<Variant>::from_variant(value)?
            .into_iter()
            .map(String::from_variant)
            .collect()
    }
}

impl FromVariant for Vec<RemoteHandle> {
    fn from_variant(value: Variant) -> Result<Self> {
        Vec::<Variant>::from_variant(value)?
            .into_iter()
            .map(RemoteHandle::from_variant)
            .collect()
    }
}

impl<T: FromVariant> FromVariant for Option<T> {
    fn from_variant(value: Variant) -> Result<Self> {
        match value {
            Variant::Empty => Ok(None),
            other => T::from_variant(other).map(Some),
        }
    }
}
