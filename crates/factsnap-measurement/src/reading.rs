//! Scalar readings
//!
//! A [`Reading`] wraps exactly one scalar value collected from a host or
//! cluster. The wrapper is invisible on the wire: a reading holding `42`
//! serializes as the bare number `42`.

use std::any::Any;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A single typed scalar value
///
/// The variant is part of the value's identity: `Int(42)` and `Int64(42)`
/// are different readings.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Platform-width signed integer
    Int(isize),
    /// 64-bit signed integer
    Int64(i64),
    /// Platform-width unsigned integer
    Uint(usize),
    /// 64-bit unsigned integer
    Uint64(u64),
    /// 64-bit float
    Float64(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    Str(String),
}

/// Discriminant of a [`Reading`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    /// Platform-width signed integer
    Int,
    /// 64-bit signed integer
    Int64,
    /// Platform-width unsigned integer
    Uint,
    /// 64-bit unsigned integer
    Uint64,
    /// 64-bit float
    Float64,
    /// Boolean
    Bool,
    /// UTF-8 string
    String,
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingKind::Int => write!(f, "int"),
            ReadingKind::Int64 => write!(f, "int64"),
            ReadingKind::Uint => write!(f, "uint"),
            ReadingKind::Uint64 => write!(f, "uint64"),
            ReadingKind::Float64 => write!(f, "float64"),
            ReadingKind::Bool => write!(f, "bool"),
            ReadingKind::String => write!(f, "string"),
        }
    }
}

impl Reading {
    /// Create a platform-width signed integer reading
    #[must_use]
    pub fn int(v: isize) -> Self {
        Reading::Int(v)
    }

    /// Create a 64-bit signed integer reading
    #[must_use]
    pub fn int64(v: i64) -> Self {
        Reading::Int64(v)
    }

    /// Create a platform-width unsigned integer reading
    #[must_use]
    pub fn uint(v: usize) -> Self {
        Reading::Uint(v)
    }

    /// Create a 64-bit unsigned integer reading
    #[must_use]
    pub fn uint64(v: u64) -> Self {
        Reading::Uint64(v)
    }

    /// Create a float reading
    #[must_use]
    pub fn float64(v: f64) -> Self {
        Reading::Float64(v)
    }

    /// Create a boolean reading
    #[must_use]
    pub fn bool(v: bool) -> Self {
        Reading::Bool(v)
    }

    /// Create a string reading
    pub fn string(v: impl Into<String>) -> Self {
        Reading::Str(v.into())
    }

    /// Kind of the wrapped value
    #[must_use]
    pub fn kind(&self) -> ReadingKind {
        match self {
            Reading::Int(_) => ReadingKind::Int,
            Reading::Int64(_) => ReadingKind::Int64,
            Reading::Uint(_) => ReadingKind::Uint,
            Reading::Uint64(_) => ReadingKind::Uint64,
            Reading::Float64(_) => ReadingKind::Float64,
            Reading::Bool(_) => ReadingKind::Bool,
            Reading::Str(_) => ReadingKind::String,
        }
    }

    /// The wrapped value with its original static type
    ///
    /// Downcasts to `isize`, `i64`, `usize`, `u64`, `f64`, `bool` or `String`.
    #[must_use]
    pub fn as_any(&self) -> &dyn Any {
        match self {
            Reading::Int(v) => v,
            Reading::Int64(v) => v,
            Reading::Uint(v) => v,
            Reading::Uint64(v) => v,
            Reading::Float64(v) => v,
            Reading::Bool(v) => v,
            Reading::Str(v) => v,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Int(v) => write!(f, "{v}"),
            Reading::Int64(v) => write!(f, "{v}"),
            Reading::Uint(v) => write!(f, "{v}"),
            Reading::Uint64(v) => write!(f, "{v}"),
            Reading::Float64(v) => write!(f, "{v}"),
            Reading::Bool(v) => write!(f, "{v}"),
            Reading::Str(v) => f.write_str(v),
        }
    }
}

impl From<isize> for Reading {
    fn from(v: isize) -> Self {
        Reading::Int(v)
    }
}

impl From<i64> for Reading {
    fn from(v: i64) -> Self {
        Reading::Int64(v)
    }
}

impl From<usize> for Reading {
    fn from(v: usize) -> Self {
        Reading::Uint(v)
    }
}

impl From<u64> for Reading {
    fn from(v: u64) -> Self {
        Reading::Uint64(v)
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        Reading::Float64(v)
    }
}

impl From<bool> for Reading {
    fn from(v: bool) -> Self {
        Reading::Bool(v)
    }
}

impl From<String> for Reading {
    fn from(v: String) -> Self {
        Reading::Str(v)
    }
}

impl From<&str> for Reading {
    fn from(v: &str) -> Self {
        Reading::Str(v.to_string())
    }
}

/// Convert an arbitrary value into the best-matching reading
///
/// Never fails. Unrecognized types fall back to a string holding their
/// `Debug` rendering; use [`to_reading_exact`] to tell the two apart.
pub fn to_reading<T: Any + fmt::Debug>(value: &T) -> Reading {
    to_reading_exact(value).0
}

/// Convert an arbitrary value into a reading, reporting whether the match was exact
///
/// Candidate types are checked in order: `isize`, `i64`, `usize`, `u64`,
/// `f64`, `bool`, `String`, `&'static str`. An existing [`Reading`] is
/// passed through. Anything else yields `(Reading::Str(format!("{value:?}")), false)`.
pub fn to_reading_exact<T: Any + fmt::Debug>(value: &T) -> (Reading, bool) {
    let any: &dyn Any = value;

    if let Some(v) = any.downcast_ref::<isize>() {
        return (Reading::Int(*v), true);
    }
    if let Some(v) = any.downcast_ref::<i64>() {
        return (Reading::Int64(*v), true);
    }
    if let Some(v) = any.downcast_ref::<usize>() {
        return (Reading::Uint(*v), true);
    }
    if let Some(v) = any.downcast_ref::<u64>() {
        return (Reading::Uint64(*v), true);
    }
    if let Some(v) = any.downcast_ref::<f64>() {
        return (Reading::Float64(*v), true);
    }
    if let Some(v) = any.downcast_ref::<bool>() {
        return (Reading::Bool(*v), true);
    }
    if let Some(v) = any.downcast_ref::<String>() {
        return (Reading::Str(v.clone()), true);
    }
    if let Some(v) = any.downcast_ref::<&'static str>() {
        return (Reading::Str((*v).to_string()), true);
    }
    if let Some(v) = any.downcast_ref::<Reading>() {
        return (v.clone(), true);
    }

    (Reading::Str(format!("{value:?}")), false)
}

impl Serialize for Reading {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Reading::Int(v) => v.serialize(serializer),
            Reading::Int64(v) => serializer.serialize_i64(*v),
            Reading::Uint(v) => v.serialize(serializer),
            Reading::Uint64(v) => serializer.serialize_u64(*v),
            Reading::Float64(v) => serializer.serialize_f64(*v),
            Reading::Bool(v) => serializer.serialize_bool(*v),
            Reading::Str(v) => serializer.serialize_str(v),
        }
    }
}

/// Infers a reading from whatever native value the decoder produces.
///
/// Integers land in `Int` unless they do not fit a platform int; nested
/// sequences, maps and null become their JSON text.
struct ReadingVisitor;

impl<'de> Visitor<'de> for ReadingVisitor {
    type Value = Reading;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Reading, E> {
        Ok(Reading::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Reading, E> {
        Ok(isize::try_from(v).map_or(Reading::Int64(v), Reading::Int))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Reading, E> {
        Ok(isize::try_from(v).map_or(Reading::Uint64(v), Reading::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Reading, E> {
        Ok(Reading::Float64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Reading, E> {
        Ok(Reading::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Reading, E> {
        Ok(Reading::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Reading, E> {
        Ok(Reading::Str("null".to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Reading, E> {
        self.visit_unit()
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Reading, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, seq: A) -> Result<Reading, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let value =
            serde_json::Value::deserialize(de::value::SeqAccessDeserializer::new(seq))?;
        Ok(Reading::Str(value.to_string()))
    }

    fn visit_map<A>(self, map: A) -> Result<Reading, A::Error>
    where
        A: MapAccess<'de>,
    {
        let value =
            serde_json::Value::deserialize(de::value::MapAccessDeserializer::new(map))?;
        Ok(Reading::Str(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ReadingVisitor)
    }
}
