//! Fluent construction of subtypes and measurements

use crate::measurement::{Measurement, MeasurementType};
use crate::reading::Reading;
use crate::subtype::Subtype;

/// Builder for a [`Subtype`]
///
/// Setting a key twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct SubtypeBuilder {
    subtype: Subtype,
}

impl SubtypeBuilder {
    /// Start a subtype with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            subtype: Subtype::new(name),
        }
    }

    /// Set a reading
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, reading: Reading) -> Self {
        self.subtype.data.insert(key.into(), reading);
        self
    }

    /// Set a string reading
    #[must_use]
    pub fn set_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, Reading::Str(value.into()))
    }

    /// Set a platform-width signed integer reading
    #[must_use]
    pub fn set_int(self, key: impl Into<String>, value: isize) -> Self {
        self.set(key, Reading::Int(value))
    }

    /// Set a 64-bit signed integer reading
    #[must_use]
    pub fn set_int64(self, key: impl Into<String>, value: i64) -> Self {
        self.set(key, Reading::Int64(value))
    }

    /// Set a platform-width unsigned integer reading
    #[must_use]
    pub fn set_uint(self, key: impl Into<String>, value: usize) -> Self {
        self.set(key, Reading::Uint(value))
    }

    /// Set a 64-bit unsigned integer reading
    #[must_use]
    pub fn set_uint64(self, key: impl Into<String>, value: u64) -> Self {
        self.set(key, Reading::Uint64(value))
    }

    /// Set a float reading
    #[must_use]
    pub fn set_float64(self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, Reading::Float64(value))
    }

    /// Set a boolean reading
    #[must_use]
    pub fn set_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, Reading::Bool(value))
    }

    /// Set a context entry
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.subtype.context.insert(key.into(), value.into());
        self
    }

    /// Finish the subtype
    #[must_use]
    pub fn build(self) -> Subtype {
        self.subtype
    }
}

/// Builder for a [`Measurement`]
///
/// Subtypes are kept in insertion order and never deduplicated.
#[derive(Debug, Clone)]
pub struct MeasurementBuilder {
    measurement: Measurement,
}

impl MeasurementBuilder {
    /// Start a measurement of the given type
    #[must_use]
    pub fn new(measurement_type: MeasurementType) -> Self {
        Self {
            measurement: Measurement::new(measurement_type),
        }
    }

    /// Append a subtype
    #[must_use]
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.measurement.subtypes.push(subtype);
        self
    }

    /// Build and append a subtype
    #[must_use]
    pub fn with_subtype_builder(self, builder: SubtypeBuilder) -> Self {
        self.with_subtype(builder.build())
    }

    /// Finish the measurement
    #[must_use]
    pub fn build(self) -> Measurement {
        self.measurement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_builder_typed_setters() {
        let st = SubtypeBuilder::new("gpu0")
            .set_string("model", "H100")
            .set_int("cores", 132)
            .set_int64("clock", 1_980)
            .set_uint("slots", 8)
            .set_uint64("memory", 81_559)
            .set_float64("power", 700.0)
            .set_bool("mig", false)
            .set("driver", Reading::string("550.54"))
            .with_context("uuid", "GPU-1234")
            .build();

        assert_eq!(st.name, "gpu0");
        assert_eq!(st.len(), 8);
        assert_eq!(st.get("cores"), Some(&Reading::Int(132)));
        assert_eq!(st.get("clock"), Some(&Reading::Int64(1_980)));
        assert_eq!(st.get("slots"), Some(&Reading::Uint(8)));
        assert_eq!(st.get("memory"), Some(&Reading::Uint64(81_559)));
        assert_eq!(st.get("power"), Some(&Reading::Float64(700.0)));
        assert_eq!(st.get("mig"), Some(&Reading::Bool(false)));
        assert_eq!(st.get_context("uuid"), Some("GPU-1234"));
    }

    #[test]
    fn test_last_set_wins() {
        let st = SubtypeBuilder::new("x")
            .set_string("k", "v1")
            .set_string("k", "v2")
            .build();

        assert_eq!(st.len(), 1);
        assert_eq!(st.get("k"), Some(&Reading::string("v2")));
    }

    #[test]
    fn test_measurement_builder_keeps_duplicates_in_order() {
        let m = MeasurementBuilder::new(MeasurementType::SystemD)
            .with_subtype_builder(
                SubtypeBuilder::new("kubelet.service").set_string("ActiveState", "active"),
            )
            .with_subtype(Subtype::new("containerd.service"))
            .with_subtype_builder(
                SubtypeBuilder::new("kubelet.service").set_string("ActiveState", "failed"),
            )
            .build();

        assert_eq!(m.measurement_type, MeasurementType::SystemD);
        assert_eq!(
            m.subtype_names().collect::<Vec<_>>(),
            vec!["kubelet.service", "containerd.service", "kubelet.service"]
        );
        assert_eq!(
            m.get_subtype("kubelet.service")
                .unwrap()
                .get_string("ActiveState")
                .unwrap(),
            "active"
        );
    }

    #[test]
    fn test_builder_does_not_validate() {
        let m = MeasurementBuilder::new(MeasurementType::Os)
            .with_subtype_builder(SubtypeBuilder::new("empty"))
            .build();

        assert_eq!(m.subtypes.len(), 1);
        assert!(m.validate().is_err());
    }
}
