//! Decoded instrument data
//!
//! A [`Message`] is what one accepted frame from an engine monitor (EMS) or
//! flight instrument unit (EFIS) decodes to: an ordered list of
//! [`Measurement`]s. The order mirrors the byte offsets of the fields in the
//! frame.

use std::{
    borrow::Cow,
    fmt::{
        Debug,
        Display,
    },
};

#[cfg(feature = "serde")]
mod serde;

/// A single named, unit-tagged value.
///
/// `value` is `NaN` if the field it was decoded from could not be parsed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Measurement {
    pub label: Cow<'static, str>,

    /// Units, might be empty.
    pub units: Cow<'static, str>,

    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "crate::serde::deserialize_value")
    )]
    pub value: f64,
}

impl Measurement {
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        units: impl Into<Cow<'static, str>>,
        value: f64,
    ) -> Self {
        Self {
            label: label.into(),
            units: units.into(),
            value,
        }
    }

    /// Returns `false` if the value failed to decode.
    pub fn is_valid(&self) -> bool {
        !self.value.is_nan()
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.label, self.value)?;
        if !self.units.is_empty() {
            write!(f, " {}", self.units)?;
        }
        Ok(())
    }
}

/// Ordered sequence of measurements decoded from one frame.
///
/// Messages are immutable once they're produced.
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Message {
    measurements: Vec<Measurement>,
}

impl Message {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self { measurements }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Returns the first measurement with this label.
    pub fn get(&self, label: &str) -> Option<&Measurement> {
        self.measurements
            .iter()
            .find(|measurement| measurement.label == label)
    }

    /// Returns the value of the first measurement with this label, or `NaN`
    /// if there is none.
    pub fn value(&self, label: &str) -> f64 {
        self.get(label)
            .map_or(f64::NAN, |measurement| measurement.value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.measurements
            .iter()
            .map(|measurement| &*measurement.label)
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.measurements).finish()
    }
}

impl FromIterator<Measurement> for Message {
    fn from_iter<T: IntoIterator<Item = Measurement>>(iter: T) -> Self {
        Self {
            measurements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = Measurement;
    type IntoIter = std::vec::IntoIter<Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}
