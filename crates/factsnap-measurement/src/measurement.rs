//! Measurement: one snapshot from one collector category

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::diff;
use crate::error::{MeasurementError, Result};
use crate::reading::Reading;
use crate::subtype::Subtype;

/// Collector category a measurement belongs to
///
/// Measurements of different types are never comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    /// Kubernetes objects
    K8s,
    /// GPU attributes
    #[serde(rename = "GPU")]
    Gpu,
    /// Kernel and OS parameters
    #[serde(rename = "OS")]
    Os,
    /// systemd unit properties
    SystemD,
}

impl MeasurementType {
    /// All known measurement types
    pub const ALL: [MeasurementType; 4] = [
        MeasurementType::K8s,
        MeasurementType::Gpu,
        MeasurementType::Os,
        MeasurementType::SystemD,
    ];

    /// Wire name of the type
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::K8s => "K8s",
            MeasurementType::Gpu => "GPU",
            MeasurementType::Os => "OS",
            MeasurementType::SystemD => "SystemD",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementType {
    type Err = MeasurementError;

    fn from_str(s: &str) -> Result<Self> {
        MeasurementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MeasurementError::UnknownType(s.to_string()))
    }
}

/// A typed collection of subtypes
///
/// Subtype order is kept from construction. Names are not deduplicated:
/// when several subtypes share a name, lookups return the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Collector category
    #[serde(rename = "type")]
    pub measurement_type: MeasurementType,
    /// Groups of readings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtypes: Vec<Subtype>,
}

impl Measurement {
    /// Create an empty measurement
    #[must_use]
    pub fn new(measurement_type: MeasurementType) -> Self {
        Self {
            measurement_type,
            subtypes: Vec::new(),
        }
    }

    /// Get the first subtype with the given name
    #[must_use]
    pub fn get_subtype(&self, name: &str) -> Option<&Subtype> {
        self.subtypes.iter().find(|s| s.name == name)
    }

    /// Get the first subtype with the given name, appending an empty one if absent
    pub fn get_or_create_subtype(&mut self, name: &str) -> &mut Subtype {
        let idx = match self.subtypes.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.subtypes.push(Subtype::new(name));
                self.subtypes.len() - 1
            }
        };
        &mut self.subtypes[idx]
    }

    /// Check whether a subtype with the given name exists
    #[must_use]
    pub fn has_subtype(&self, name: &str) -> bool {
        self.get_subtype(name).is_some()
    }

    /// Subtype names in order, duplicates included
    pub fn subtype_names(&self) -> impl Iterator<Item = &str> {
        self.subtypes.iter().map(|s| s.name.as_str())
    }

    /// Check that the measurement has at least one subtype and all subtypes are valid
    ///
    /// # Errors
    /// Returns `NoSubtypes` for an empty measurement, or `InvalidSubtype`
    /// wrapping the first failing subtype's error.
    pub fn validate(&self) -> Result<()> {
        if self.subtypes.is_empty() {
            return Err(MeasurementError::NoSubtypes);
        }

        for (index, subtype) in self.subtypes.iter().enumerate() {
            subtype
                .validate()
                .map_err(|e| MeasurementError::InvalidSubtype {
                    index,
                    name: subtype.name.clone(),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }

    /// Merge another measurement of the same type into this one
    ///
    /// Incoming subtypes without a same-named counterpart are appended.
    /// Otherwise data and context are unioned into the first same-named
    /// subtype, incoming values winning conflicts.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the types differ; `self` is left untouched.
    #[instrument(skip_all, fields(measurement_type = %self.measurement_type))]
    pub fn merge(&mut self, other: Measurement) -> Result<()> {
        if self.measurement_type != other.measurement_type {
            return Err(MeasurementError::TypeMismatch {
                old_type: self.measurement_type,
                old_subtypes: self.subtypes.len(),
                new_type: other.measurement_type,
                new_subtypes: other.subtypes.len(),
            });
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, s) in self.subtypes.iter().enumerate() {
            index.entry(s.name.clone()).or_insert(i);
        }

        let (mut appended, mut updated) = (0_usize, 0_usize);
        for incoming in other.subtypes {
            match index.get(&incoming.name) {
                Some(&i) => {
                    let existing = &mut self.subtypes[i];
                    existing.data.extend(incoming.data);
                    existing.context.extend(incoming.context);
                    updated += 1;
                }
                None => {
                    index.insert(incoming.name.clone(), self.subtypes.len());
                    self.subtypes.push(incoming);
                    appended += 1;
                }
            }
        }

        debug!(appended, updated, "merged measurement");
        Ok(())
    }

    /// Subtypes changed or added in `new` relative to `self`
    ///
    /// See [`diff::compare`].
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the types differ.
    pub fn compare(&self, new: &Measurement) -> Result<Vec<Subtype>> {
        diff::compare(self, new)
    }

    fn ensure_finite(&self) -> Result<()> {
        for st in &self.subtypes {
            for (key, reading) in &st.data {
                if let Reading::Float64(v) = reading
                    && !v.is_finite()
                {
                    return Err(MeasurementError::NonFiniteFloat {
                        subtype: st.name.clone(),
                        key: key.clone(),
                        value: *v,
                    });
                }
            }
        }
        Ok(())
    }

    /// Encode as compact JSON
    ///
    /// # Errors
    /// Returns `NonFiniteFloat` for NaN or infinite readings, or an error if
    /// serialization fails.
    pub fn to_json(&self) -> Result<String> {
        self.ensure_finite()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as indented JSON
    ///
    /// # Errors
    /// Returns `NonFiniteFloat` for NaN or infinite readings, or an error if
    /// serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        self.ensure_finite()?;
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    ///
    /// Reading kinds are inferred from the decoded values; integer kinds
    /// come back as `Int`.
    ///
    /// # Errors
    /// Returns an error if the input is not a valid measurement.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Encode as YAML
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Decode from YAML
    ///
    /// # Errors
    /// Returns an error if the input is not a valid measurement.
    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}
