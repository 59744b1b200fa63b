//! factsnap-measurement: typed snapshot model for host and cluster facts
//!
//! Collectors turn kernel parameters, GPU attributes, systemd unit
//! properties and Kubernetes objects into [`Measurement`]s made of named
//! [`Subtype`]s holding scalar [`Reading`]s. On top of the model this
//! crate provides drift detection ([`compare`]), wildcard key selection
//! ([`filter_in`] / [`filter_out`]) and a TOML-driven [`RedactionPolicy`].
//!
//! # Examples
//!
//! ```
//! use factsnap_measurement::{MeasurementBuilder, MeasurementType, SubtypeBuilder, compare};
//!
//! let before = MeasurementBuilder::new(MeasurementType::K8s)
//!     .with_subtype_builder(
//!         SubtypeBuilder::new("cluster")
//!             .set_string("version", "1.28.0")
//!             .set_int("nodes", 3),
//!     )
//!     .build();
//!
//! let after = MeasurementBuilder::new(MeasurementType::K8s)
//!     .with_subtype_builder(
//!         SubtypeBuilder::new("cluster")
//!             .set_string("version", "1.29.0")
//!             .set_int("nodes", 3),
//!     )
//!     .build();
//!
//! let drift = compare(&before, &after).unwrap();
//! assert_eq!(drift.len(), 1);
//! assert_eq!(drift[0].get_string("version").unwrap(), "1.29.0");
//! assert!(!drift[0].has("nodes"));
//! ```

pub mod builder;
pub mod diff;
pub mod error;
pub mod filter;
pub mod measurement;
pub mod policy;
pub mod reading;
pub mod subtype;

pub use builder::{MeasurementBuilder, SubtypeBuilder};
pub use diff::compare;
pub use error::{MeasurementError, Result};
pub use filter::{filter_in, filter_out, matches};
pub use measurement::{Measurement, MeasurementType};
pub use policy::{RedactionPolicy, RedactionRule};
pub use reading::{Reading, ReadingKind, to_reading, to_reading_exact};
pub use subtype::Subtype;
