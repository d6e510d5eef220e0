//! Weighted field reconciliation.
//!
//! Every import path funnels through [`apply_update`]. A value replaces the
//! stored one only when its weight is at least the stored weight, so later
//! imports of equal priority correct earlier ones while lower-priority
//! sources never clobber higher ones. Blank values carry no information and
//! are never written.

use std::collections::BTreeMap;

use serde::Serialize;

pub type Weight = i64;

/// Weight given to the default fields every entity starts with; any real
/// import outranks it.
pub const DEFAULT_WEIGHT: Weight = Weight::MIN;

/// Weight used for values the crate derives itself (lengths, adjacency).
pub const DERIVED_WEIGHT: Weight = Weight::MAX;

/// A value together with the weight that justified its last write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: Weight,
}

impl<T> Weighted<T> {
    pub fn new(value: T, weight: Weight) -> Self {
        Self { value, weight }
    }
}

pub type FieldValue = Weighted<String>;

/// Whether an incoming weight may overwrite a stored one. Ties go to the
/// incoming value.
pub fn outranks(incoming: Weight, current: Weight) -> bool {
    incoming >= current
}

/// Pure merge of a single value: returns the value that should be stored.
pub fn merge_value<T>(current: Option<Weighted<T>>, incoming: Weighted<T>) -> Weighted<T> {
    match current {
        Some(current) if !outranks(incoming.weight, current.weight) => current,
        _ => incoming,
    }
}

/// Lowercases a raw field name and collapses internal whitespace to single
/// underscores.
pub fn normalize_field_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Field name to weighted value mapping owned by every entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedFields {
    inner: BTreeMap<String, FieldValue>,
}

impl WeightedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a field at [`DEFAULT_WEIGHT`].
    pub fn with_default(mut self, name: &str, value: &str) -> Self {
        self.inner.insert(
            name.to_string(),
            FieldValue::new(value.to_string(), DEFAULT_WEIGHT),
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(|f| f.value.as_str())
    }

    pub fn weight_of(&self, name: &str) -> Option<Weight> {
        self.inner.get(name).map(|f| f.weight)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.value.as_str()))
    }

    /// Plain name to value view, without weights.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.inner
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Offers one value. Returns whether it was written. Values are stored
    /// exactly as given; only the blank check looks past whitespace.
    pub fn offer(&mut self, name: &str, value: &str, weight: Weight) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let name = normalize_field_name(name);
        if name.is_empty() {
            return false;
        }
        match self.inner.get_mut(&name) {
            Some(current) if !outranks(weight, current.weight) => false,
            Some(current) => {
                current.value = value.to_string();
                current.weight = weight;
                true
            }
            None => {
                self.inner
                    .insert(name, FieldValue::new(value.to_string(), weight));
                true
            }
        }
    }

    /// Writes a field the crate computes itself at [`DERIVED_WEIGHT`], or
    /// drops it when there is nothing to derive. Unlike [`offer`](Self::offer)
    /// this never leaves an imported value standing.
    pub fn set_derived(&mut self, name: &str, value: Option<&str>) {
        let name = normalize_field_name(name);
        match value {
            Some(value) => {
                self.inner
                    .insert(name, FieldValue::new(value.to_string(), DERIVED_WEIGHT));
            }
            None => {
                self.inner.remove(&name);
            }
        }
    }
}

/// Anything that owns a [`WeightedFields`] map.
pub trait Mergeable {
    fn fields_mut(&mut self) -> &mut WeightedFields;
}

/// Tally of one [`apply_update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub written: usize,
    pub kept: usize,
}

/// Applies a batch of raw fields at one weight to an entity.
pub fn apply_update<'a, E, I>(entity: &mut E, raw_fields: I, weight: Weight) -> MergeOutcome
where
    E: Mergeable + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let fields = entity.fields_mut();
    let mut outcome = MergeOutcome::default();
    for (name, value) in raw_fields {
        if fields.offer(name, value, weight) {
            outcome.written += 1;
        } else {
            outcome.kept += 1;
        }
    }
    outcome
}
