//! Redaction policy applied before measurements leave the collector
//!
//! Loaded from TOML:
//!
//! ```toml
//! [[rule]]
//! type = "OS"
//! subtypes = ["sysctl"]
//! exclude = ["kernel.random.*"]
//!
//! [[rule]]
//! # matching is case-sensitive
//! exclude = ["*password*", "*token*", "*TOKEN*"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{MeasurementError, Result};
use crate::filter;
use crate::measurement::{Measurement, MeasurementType};
use crate::subtype::Subtype;

/// A set of redaction rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Rules, applied in order
    #[serde(default, rename = "rule")]
    pub rules: Vec<RedactionRule>,
}

/// One redaction rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionRule {
    /// Only apply to this measurement type (all types when unset)
    #[serde(default, rename = "type")]
    pub measurement_type: Option<MeasurementType>,
    /// Wildcard patterns on subtype names (all subtypes when empty)
    #[serde(default)]
    pub subtypes: Vec<String>,
    /// Keep only keys matching one of these patterns
    #[serde(default)]
    pub include: Vec<String>,
    /// Drop keys matching any of these patterns
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RedactionRule {
    /// Check whether this rule targets the given subtype
    #[must_use]
    pub fn applies_to(&self, measurement_type: MeasurementType, subtype: &str) -> bool {
        if self.measurement_type.is_some_and(|t| t != measurement_type) {
            return false;
        }
        self.subtypes.is_empty()
            || self
                .subtypes
                .iter()
                .any(|p| filter::matches(subtype, p))
    }

    fn apply(&self, subtype: Subtype) -> Subtype {
        let subtype = if self.include.is_empty() {
            subtype
        } else {
            subtype.filter_in(&self.include)
        };
        if self.exclude.is_empty() {
            subtype
        } else {
            subtype.filter_out(&self.exclude)
        }
    }
}

impl RedactionPolicy {
    /// Load policy from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or fails validation
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy = Self::from_toml_str(&content)?;
        info!(path = %path.display(), rules = policy.rules.len(), "loaded redaction policy");
        Ok(policy)
    }

    /// Parse policy from a TOML string
    ///
    /// # Errors
    /// Returns error if the input cannot be parsed or fails validation
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let policy: RedactionPolicy = toml::from_str(s)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check that every rule does something
    ///
    /// # Errors
    /// Returns `Config` naming the first rule with neither include nor exclude patterns
    pub fn validate(&self) -> Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.include.is_empty() && rule.exclude.is_empty() {
                return Err(MeasurementError::Config(format!(
                    "rule {i} has neither include nor exclude patterns"
                )));
            }
        }
        Ok(())
    }

    /// Redacted copy of a measurement
    ///
    /// Every matching rule is applied to each subtype in order. The input
    /// is left untouched.
    #[must_use]
    #[instrument(skip_all, fields(measurement_type = %measurement.measurement_type))]
    pub fn apply(&self, measurement: &Measurement) -> Measurement {
        let mut removed = 0_usize;

        let subtypes = measurement
            .subtypes
            .iter()
            .map(|st| {
                let before = st.len();
                let redacted = self
                    .rules
                    .iter()
                    .filter(|r| r.applies_to(measurement.measurement_type, &st.name))
                    .fold(st.clone(), |acc, rule| rule.apply(acc));
                removed += before - redacted.len();
                redacted
            })
            .collect();

        debug!(removed, "applied redaction policy");

        Measurement {
            measurement_type: measurement.measurement_type,
            subtypes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MeasurementBuilder, SubtypeBuilder};

    const POLICY: &str = r#"
[[rule]]
type = "OS"
subtypes = ["sysctl"]
exclude = ["kernel.random.*"]

[[rule]]
exclude = ["*password*", "*token*", "*TOKEN*"]

[[rule]]
type = "K8s"
subtypes = ["node*"]
include = ["kubelet*", "os*"]
"#;

    fn os_measurement() -> Measurement {
        MeasurementBuilder::new(MeasurementType::Os)
            .with_subtype_builder(
                SubtypeBuilder::new("sysctl")
                    .set_int("vm.swappiness", 60)
                    .set_string("kernel.random.boot_id", "a1b2")
                    .set_string("kernel.hostname", "node-1"),
            )
            .with_subtype_builder(
                SubtypeBuilder::new("env")
                    .set_string("REGISTRY_TOKEN", "secret")
                    .set_string("Registry_Token", "mixed-case")
                    .set_string("kernel.random.note", "kept"),
            )
            .build()
    }

    #[test]
    fn test_parse_policy() {
        let policy = RedactionPolicy::from_toml_str(POLICY).unwrap();
        assert_eq!(policy.rules.len(), 3);
        assert_eq!(policy.rules[0].measurement_type, Some(MeasurementType::Os));
        assert!(policy.rules[1].measurement_type.is_none());
        assert!(policy.rules[1].subtypes.is_empty());
        assert_eq!(policy.rules[2].include, vec!["kubelet*", "os*"]);
    }

    #[test]
    fn test_empty_policy_is_valid() {
        let policy = RedactionPolicy::from_toml_str("").unwrap();
        assert!(policy.rules.is_empty());

        let m = os_measurement();
        assert_eq!(policy.apply(&m), m);
    }

    #[test]
    fn test_rule_without_patterns_is_rejected() {
        let err = RedactionPolicy::from_toml_str("[[rule]]\ntype = \"GPU\"\n").unwrap_err();
        assert!(matches!(err, MeasurementError::Config(_)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: rule 0 has neither include nor exclude patterns"
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = RedactionPolicy::from_toml_str("[[rule]]\ntype = \"Disk\"\nexclude = [\"*\"]\n")
            .unwrap_err();
        assert!(matches!(err, MeasurementError::Toml(_)));
    }

    #[test]
    fn test_applies_to() {
        let rule = RedactionRule {
            measurement_type: Some(MeasurementType::K8s),
            subtypes: vec!["node*".to_string()],
            include: Vec::new(),
            exclude: vec!["*".to_string()],
        };
        assert!(rule.applies_to(MeasurementType::K8s, "node-a"));
        assert!(!rule.applies_to(MeasurementType::K8s, "server"));
        assert!(!rule.applies_to(MeasurementType::Gpu, "node-a"));

        let any = RedactionRule {
            exclude: vec!["*".to_string()],
            ..RedactionRule::default()
        };
        assert!(any.applies_to(MeasurementType::SystemD, ""));
    }

    #[test]
    fn test_apply_scopes_rules() {
        let policy = RedactionPolicy::from_toml_str(POLICY).unwrap();
        let m = os_measurement();
        let redacted = policy.apply(&m);

        let sysctl = redacted.get_subtype("sysctl").unwrap();
        assert!(sysctl.has("vm.swappiness"));
        assert!(sysctl.has("kernel.hostname"));
        assert!(!sysctl.has("kernel.random.boot_id"));

        // type-wide rule hits every subtype, subtype-scoped rule does not leak
        let env = redacted.get_subtype("env").unwrap();
        assert!(!env.has("REGISTRY_TOKEN"));
        assert!(env.has("kernel.random.note"));
        // patterns are case-sensitive
        assert!(env.has("Registry_Token"));

        // source untouched
        assert_eq!(m.get_subtype("sysctl").unwrap().len(), 3);
    }

    #[test]
    fn test_apply_include_then_exclude() {
        let policy = RedactionPolicy::from_toml_str(POLICY).unwrap();
        let m = MeasurementBuilder::new(MeasurementType::K8s)
            .with_subtype_builder(
                SubtypeBuilder::new("node-a")
                    .set_string("kubeletVersion", "v1.29.0")
                    .set_string("kubelet_token", "abc")
                    .set_string("osImage", "Ubuntu 22.04")
                    .set_string("providerID", "aws:///i-123"),
            )
            .with_subtype_builder(SubtypeBuilder::new("server").set_string("version", "1.29.0"))
            .build();

        let redacted = policy.apply(&m);
        let node = redacted.get_subtype("node-a").unwrap();
        let mut keys: Vec<&str> = node.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["kubeletVersion", "osImage"]);
        assert_eq!(redacted.get_subtype("server").unwrap().len(), 1);
    }
}
