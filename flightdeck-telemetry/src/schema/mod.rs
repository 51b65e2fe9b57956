//! Message schemas
//!
//! There are two kinds of instrument units on the bus, each with its own frame
//! layout: the engine monitor ([EMS][ems]) and the flight instrument unit
//! ([EFIS][efis]). Both layouts exist in two revisions that disagree on a few
//! fields, so the revision is part of the [`Schema`].

pub mod efis;
pub mod ems;

use std::{
    fmt::Display,
    str::FromStr,
};

use flightdeck_types::{
    Measurement,
    Message,
};

use crate::{
    cursor::FieldCursor,
    frame::{
        ChecksumPolicy,
        FOOTER_LENGTH,
        FrameError,
        Truncation,
        validate,
    },
};

/// Frame layout of one instrument unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Schema {
    Ems(ems::Version),
    Efis(efis::Version),
}

impl Schema {
    /// EMS with the general-purpose slots decoded.
    pub const fn ems() -> Self {
        Self::Ems(ems::Version::DispatchGeneralPurpose)
    }

    /// EFIS with the 5 character altitude field.
    pub const fn efis() -> Self {
        Self::Efis(efis::Version::WideAltitude)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ems(ems::Version::DispatchGeneralPurpose) => "ems-dispatch",
            Self::Ems(ems::Version::SkipGeneralPurpose) => "ems-skip",
            Self::Efis(efis::Version::WideAltitude) => "efis-wide",
            Self::Efis(efis::Version::NarrowAltitude) => "efis-narrow",
        }
    }

    /// Length of the payload, without checksum and line terminator.
    pub fn body_length(&self) -> usize {
        match self {
            Self::Ems(_) => ems::BODY_LENGTH,
            Self::Efis(_) => efis::BODY_LENGTH,
        }
    }

    /// Length of payload and checksum.
    pub fn total_length(&self) -> usize {
        self.body_length() + FOOTER_LENGTH
    }

    pub fn truncation(&self) -> Truncation {
        match self {
            Self::Ems(_) => Truncation::KeepLeft,
            Self::Efis(_) => Truncation::KeepRight,
        }
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        match self {
            Self::Ems(_) => ChecksumPolicy::ZeroSum,
            Self::Efis(_) => ChecksumPolicy::Sum,
        }
    }

    /// Decode an already validated payload.
    pub fn decode(&self, payload: &[u8]) -> Message {
        match self {
            Self::Ems(version) => ems::decode(*version, payload),
            Self::Efis(version) => efis::decode(*version, payload),
        }
    }

    /// Validate a line and decode its payload.
    pub fn decode_frame(&self, line: &[u8]) -> Result<Message, FrameError> {
        let payload = validate(self, line)?;
        Ok(self.decode(payload))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::ems()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Schema {
    type Err = SchemaFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ems" => Ok(Self::ems()),
            "efis" => Ok(Self::efis()),
            "ems-dispatch" => Ok(Self::Ems(ems::Version::DispatchGeneralPurpose)),
            "ems-skip" => Ok(Self::Ems(ems::Version::SkipGeneralPurpose)),
            "efis-wide" => Ok(Self::Efis(efis::Version::WideAltitude)),
            "efis-narrow" => Ok(Self::Efis(efis::Version::NarrowAltitude)),
            _ => {
                Err(SchemaFromStrError {
                    input: s.to_owned(),
                })
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown schema: {input}")]
pub struct SchemaFromStrError {
    pub input: String,
}

/// How the raw number of a field is turned into its physical value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scale {
    Raw,
    Divide(f64),
    Multiply(f64),
}

impl Scale {
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            Self::Raw => raw,
            Self::Divide(divisor) => raw / divisor,
            Self::Multiply(factor) => raw * factor,
        }
    }
}

/// A fixed-width decimal field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub width: usize,
    pub label: &'static str,
    pub units: &'static str,
    pub scale: Scale,
}

impl Field {
    pub const fn new(width: usize, label: &'static str, units: &'static str, scale: Scale) -> Self {
        Self {
            width,
            label,
            units,
            scale,
        }
    }

    pub fn read(&self, cursor: &mut FieldCursor) -> Measurement {
        self.measurement(cursor.read_decimal(self.width))
    }

    /// Creates a measurement for this field from a raw value.
    pub fn measurement(&self, raw: f64) -> Measurement {
        Measurement::new(self.label, self.units, self.scale.apply(raw))
    }
}

/// Time of day, leading both schemas.
pub(crate) const TIME: [Field; 4] = [
    Field::new(2, "hour", "", Scale::Raw),
    Field::new(2, "minute", "", Scale::Raw),
    Field::new(2, "second", "", Scale::Raw),
    // 1/64 s
    Field::new(2, "millisecond", "", Scale::Divide(64.0)),
];

#[cfg(test)]
pub(crate) fn table_width(fields: &[Field]) -> usize {
    fields.iter().map(|field| field.width).sum()
}
