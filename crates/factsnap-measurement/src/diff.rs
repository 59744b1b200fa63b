//! Structural drift detection between two snapshots

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument};

use crate::error::{MeasurementError, Result};
use crate::measurement::Measurement;
use crate::reading::Reading;
use crate::subtype::Subtype;

/// Kind-and-value equality under which NaN equals NaN.
fn same(a: &Reading, b: &Reading) -> bool {
    match (a, b) {
        (Reading::Float64(x), Reading::Float64(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

/// Compute what changed or appeared in `new` relative to `old`
///
/// Subtypes are matched by name (first match in `old` wins). A subtype
/// absent from `old` is returned whole; otherwise only the keys that are
/// new or hold a different reading are returned, under the same name.
/// Readings compare by kind and value, so `Int(42)` differs from
/// `Int64(42)`. Deletions are not reported. Output follows `new`'s
/// subtype order; neither input is modified.
///
/// # Errors
/// Returns `TypeMismatch` if the two measurements have different types.
#[instrument(skip_all, fields(measurement_type = %new.measurement_type))]
pub fn compare(old: &Measurement, new: &Measurement) -> Result<Vec<Subtype>> {
    if old.measurement_type != new.measurement_type {
        return Err(MeasurementError::TypeMismatch {
            old_type: old.measurement_type,
            old_subtypes: old.subtypes.len(),
            new_type: new.measurement_type,
            new_subtypes: new.subtypes.len(),
        });
    }

    let mut previous: HashMap<&str, &Subtype> = HashMap::with_capacity(old.subtypes.len());
    for st in &old.subtypes {
        previous.entry(st.name.as_str()).or_insert(st);
    }

    let mut diffs = Vec::new();

    for st in &new.subtypes {
        let Some(before) = previous.get(st.name.as_str()) else {
            debug!(subtype = %st.name, "new subtype");
            diffs.push(st.clone());
            continue;
        };

        let changed: BTreeMap<_, _> = st
            .data
            .iter()
            .filter(|(key, value)| !before.data.get(*key).is_some_and(|old| same(old, value)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if !changed.is_empty() {
            debug!(subtype = %st.name, keys = changed.len(), "changed subtype");
            diffs.push(Subtype::with_data(st.name.clone(), changed));
        }
    }

    debug!(subtypes = diffs.len(), "comparison complete");
    Ok(diffs)
}
