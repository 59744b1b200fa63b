//! Subtype: one homogeneous group of readings

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MeasurementError, Result};
use crate::filter;
use crate::reading::{Reading, ReadingKind};

/// A named bag of readings plus free-form string context
///
/// Represents one GPU, one systemd unit, one sysctl group and so on.
/// The name may be empty for single-subtype measurements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtype {
    /// Subtype label
    #[serde(rename = "subtype", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Readings keyed by fact name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: BTreeMap<String, Reading>,
    /// Descriptive metadata
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub context: BTreeMap<String, String>,
}

/// Writers may emit `null` for a map that was never populated
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Subtype {
    /// Create an empty subtype
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
            context: BTreeMap::new(),
        }
    }

    /// Create a subtype from an existing data map
    pub fn with_data(name: impl Into<String>, data: BTreeMap<String, Reading>) -> Self {
        Self {
            name: name.into(),
            data,
            context: BTreeMap::new(),
        }
    }

    /// Insert or overwrite a reading
    pub fn insert(&mut self, key: impl Into<String>, reading: impl Into<Reading>) {
        self.data.insert(key.into(), reading.into());
    }

    /// Check whether a key is present
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get a reading by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Reading> {
        self.data.get(key)
    }

    /// All data keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of readings
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the subtype holds no readings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a context value by key
    #[must_use]
    pub fn get_context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    fn lookup(&self, key: &str) -> Result<&Reading> {
        self.data
            .get(key)
            .ok_or_else(|| MeasurementError::KeyNotFound(key.to_string()))
    }

    fn wrong_type(key: &str, expected: ReadingKind, actual: &Reading) -> MeasurementError {
        MeasurementError::WrongType {
            key: key.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    /// Get a string reading
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the key is absent, `WrongType` if it holds
    /// anything but a string.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.lookup(key)? {
            Reading::Str(v) => Ok(v),
            other => Err(Self::wrong_type(key, ReadingKind::String, other)),
        }
    }

    /// Get a signed 64-bit reading, widening a platform int
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the key is absent, `WrongType` if it holds
    /// anything but `Int64` or `Int`.
    pub fn get_int64(&self, key: &str) -> Result<i64> {
        match self.lookup(key)? {
            Reading::Int64(v) => Ok(*v),
            Reading::Int(v) => i64::try_from(*v).map_err(|_| MeasurementError::WrongType {
                key: key.to_string(),
                expected: ReadingKind::Int64,
                actual: ReadingKind::Int,
            }),
            other => Err(Self::wrong_type(key, ReadingKind::Int64, other)),
        }
    }

    /// Get an unsigned 64-bit reading, widening a platform uint
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the key is absent, `WrongType` if it holds
    /// anything but `Uint64` or `Uint`.
    pub fn get_uint64(&self, key: &str) -> Result<u64> {
        match self.lookup(key)? {
            Reading::Uint64(v) => Ok(*v),
            Reading::Uint(v) => u64::try_from(*v).map_err(|_| MeasurementError::WrongType {
                key: key.to_string(),
                expected: ReadingKind::Uint64,
                actual: ReadingKind::Uint,
            }),
            other => Err(Self::wrong_type(key, ReadingKind::Uint64, other)),
        }
    }

    /// Get a float reading
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the key is absent, `WrongType` if it holds
    /// anything but a float. Integers are not converted.
    pub fn get_float64(&self, key: &str) -> Result<f64> {
        match self.lookup(key)? {
            Reading::Float64(v) => Ok(*v),
            other => Err(Self::wrong_type(key, ReadingKind::Float64, other)),
        }
    }

    /// Get a boolean reading
    ///
    /// # Errors
    /// Returns `KeyNotFound` if the key is absent, `WrongType` if it holds
    /// anything but a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.lookup(key)? {
            Reading::Bool(v) => Ok(*v),
            other => Err(Self::wrong_type(key, ReadingKind::Bool, other)),
        }
    }

    /// Check that the subtype carries data
    ///
    /// The name is not checked; empty names are legal.
    ///
    /// # Errors
    /// Returns `EmptyData` if there are no readings.
    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(MeasurementError::EmptyData);
        }
        Ok(())
    }

    /// Copy of this subtype keeping only keys matching at least one pattern
    #[must_use]
    pub fn filter_in<P: AsRef<str>>(&self, patterns: &[P]) -> Self {
        Self {
            name: self.name.clone(),
            data: filter::filter_in(&self.data, patterns),
            context: self.context.clone(),
        }
    }

    /// Copy of this subtype dropping keys matching any pattern
    #[must_use]
    pub fn filter_out<P: AsRef<str>>(&self, patterns: &[P]) -> Self {
        Self {
            name: self.name.clone(),
            data: filter::filter_out(&self.data, patterns),
            context: self.context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Subtype {
        let mut st = Subtype::new("gpu0");
        st.insert("model", "H100");
        st.insert("memory", Reading::uint64(81_559));
        st.insert("cores", Reading::int(132));
        st.insert("clock", Reading::int64(1_980));
        st.insert("slots", Reading::uint(8));
        st.insert("power", Reading::float64(700.5));
        st.insert("mig", Reading::bool(false));
        st
    }

    #[test]
    fn test_has_get_keys() {
        let st = sample();
        assert!(st.has("model"));
        assert!(!st.has("driver"));
        assert_eq!(st.get("model"), Some(&Reading::string("H100")));
        assert!(st.get("driver").is_none());

        let mut keys: Vec<&str> = st.keys().collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["clock", "cores", "memory", "mig", "model", "power", "slots"]
        );
    }

    #[test]
    fn test_typed_getters() {
        let st = sample();
        assert_eq!(st.get_string("model").unwrap(), "H100");
        assert_eq!(st.get_uint64("memory").unwrap(), 81_559);
        assert_eq!(st.get_int64("clock").unwrap(), 1_980);
        assert!((st.get_float64("power").unwrap() - 700.5).abs() < f64::EPSILON);
        assert!(!st.get_bool("mig").unwrap());
    }

    #[test]
    fn test_getters_widen_platform_ints_only() {
        let st = sample();
        assert_eq!(st.get_int64("cores").unwrap(), 132);
        assert_eq!(st.get_uint64("slots").unwrap(), 8);

        // no cross-sign or int-to-float conversion
        assert!(st.get_int64("memory").is_err());
        assert!(st.get_uint64("cores").is_err());
        assert!(st.get_float64("cores").is_err());
    }

    #[test]
    fn test_getter_errors() {
        let st = sample();

        let err = st.get_string("driver").unwrap_err();
        assert!(matches!(err, MeasurementError::KeyNotFound(ref k) if k == "driver"));
        assert!(err.is_lookup());

        let err = st.get_bool("model").unwrap_err();
        assert!(matches!(
            err,
            MeasurementError::WrongType {
                expected: ReadingKind::Bool,
                actual: ReadingKind::String,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "wrong type for key model: expected bool, got string"
        );
    }

    #[test]
    fn test_validate() {
        let err = Subtype::new("empty").validate().unwrap_err();
        assert!(matches!(err, MeasurementError::EmptyData));
        assert!(err.is_validation());

        let mut unnamed = Subtype::new("");
        unnamed.insert("k", "v");
        assert!(unnamed.validate().is_ok());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut st = Subtype::new("x");
        st.insert("k", "v1");
        st.insert("k", Reading::int(2));
        assert_eq!(st.len(), 1);
        assert_eq!(st.get("k"), Some(&Reading::int(2)));
    }

    #[test]
    fn test_filter_methods_keep_name_and_context() {
        let mut st = sample();
        st.context.insert("uuid".to_string(), "GPU-1234".to_string());

        let kept = st.filter_in(&["m*"]);
        assert_eq!(kept.name, "gpu0");
        assert_eq!(kept.get_context("uuid"), Some("GPU-1234"));
        assert_eq!(kept.len(), 3);

        let dropped = st.filter_out(&["m*"]);
        assert_eq!(dropped.len(), 4);
        assert!(!dropped.has("model"));

        // source untouched
        assert_eq!(st.len(), 7);
    }

    #[test]
    fn test_null_maps_decode_as_empty() {
        let st: Subtype =
            serde_json::from_str(r#"{"subtype":"gpu0","data":null,"context":null}"#).unwrap();
        assert_eq!(st.name, "gpu0");
        assert!(st.is_empty());
        assert!(st.context.is_empty());
        assert!(matches!(st.validate(), Err(MeasurementError::EmptyData)));

        let st: Subtype = serde_yaml::from_str("subtype: gpu1\ndata: ~\n").unwrap();
        assert!(st.data.is_empty());
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let mut st = Subtype::new("");
        st.insert("nodes", Reading::int(3));

        let json = serde_json::to_string(&st).unwrap();
        assert_eq!(json, r#"{"data":{"nodes":3}}"#);

        st.name = "cluster".to_string();
        st.context.insert("source".to_string(), "api".to_string());
        let json = serde_json::to_string(&st).unwrap();
        assert_eq!(
            json,
            r#"{"subtype":"cluster","data":{"nodes":3},"context":{"source":"api"}}"#
        );
    }
}
