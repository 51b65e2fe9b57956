//! Flight instrument (EFIS) frames
//!
//! 51 characters of payload. The unit sends one of two altitude/rate pairs in
//! the same two fields, and tells us which one in the status bitmask that
//! comes a few fields later. The fields are always at the same offsets and
//! scaled the same way, only their labels change.

use bitflags::bitflags;
use flightdeck_types::Message;

use crate::{
    cursor::FieldCursor,
    schema::{
        Field,
        Scale,
        TIME,
    },
};

pub const BODY_LENGTH: usize = 51;

pub const RATE_WIDTH: usize = 4;
pub const STATUS_WIDTH: usize = 6;

/// Revision of the EFIS field table.
///
/// Both revisions cover the same 51 characters, the narrow one just has a
/// wider reserved field at the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// 5 character (signed) altitude.
    #[default]
    WideAltitude,

    /// 4 character altitude.
    NarrowAltitude,
}

impl Version {
    pub fn altitude_width(&self) -> usize {
        match self {
            Self::WideAltitude => 5,
            Self::NarrowAltitude => 4,
        }
    }

    pub fn reserved_width(&self) -> usize {
        match self {
            Self::WideAltitude => 4,
            Self::NarrowAltitude => 5,
        }
    }
}

bitflags! {
    /// Status bitmask
    ///
    /// Only bit 0 is interpreted.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status: u32 {
        /// The altitude/rate fields hold pressure altitude and turn rate,
        /// instead of displayed altitude and vertical speed.
        const PRESSURE_ALTITUDE = 0x000001;
    }
}

impl Status {
    /// Returns the fields the altitude and rate values are emitted as.
    pub fn altitude_and_rate(&self) -> (Field, Field) {
        if self.contains(Self::PRESSURE_ALTITUDE) {
            (PRESSURE_ALTITUDE, TURN_RATE)
        }
        else {
            (DISPLAYED_ALTITUDE, VERTICAL_SPEED)
        }
    }
}

const LEADING: [Field; 8] = [
    TIME[0],
    TIME[1],
    TIME[2],
    TIME[3],
    Field::new(4, "pitch", "°", Scale::Divide(10.0)),
    Field::new(5, "roll", "°", Scale::Divide(10.0)),
    Field::new(3, "yaw", "°", Scale::Raw),
    Field::new(4, "airspeed", "m/s", Scale::Divide(10.0)),
];

const TRAILING: [Field; 3] = [
    Field::new(3, "lateral acceleration", "g", Scale::Divide(100.0)),
    Field::new(3, "vertical acceleration", "g", Scale::Divide(10.0)),
    Field::new(2, "angle of attack", "% of stall", Scale::Raw),
];

// width 0: the values are read with the widths above before the labels are
// known, these only carry label, units and scale.
const PRESSURE_ALTITUDE: Field = Field::new(0, "pressure altitude", "m", Scale::Raw);
const TURN_RATE: Field = Field::new(0, "turn rate", "°/s", Scale::Divide(10.0));
const DISPLAYED_ALTITUDE: Field = Field::new(0, "displayed altitude", "m", Scale::Raw);
const VERTICAL_SPEED: Field = Field::new(0, "vertical speed", "ft/s", Scale::Divide(10.0));

pub fn decode(version: Version, payload: &[u8]) -> Message {
    let mut cursor = FieldCursor::new(payload);
    let mut measurements = Vec::with_capacity(LEADING.len() + 2 + TRAILING.len());

    measurements.extend(LEADING.iter().map(|field| field.read(&mut cursor)));

    let altitude = cursor.read_decimal(version.altitude_width());
    let rate = cursor.read_decimal(RATE_WIDTH);

    let trailing = TRAILING
        .iter()
        .map(|field| field.read(&mut cursor))
        .collect::<Vec<_>>();

    let status = cursor.read_hex(STATUS_WIDTH).map_or_else(
        || {
            tracing::debug!("invalid status bitmask");
            Status::empty()
        },
        Status::from_bits_retain,
    );

    cursor.skip(version.reserved_width());

    let (altitude_field, rate_field) = status.altitude_and_rate();
    measurements.push(altitude_field.measurement(altitude));
    measurements.push(rate_field.measurement(rate));
    measurements.extend(trailing);

    Message::new(measurements)
}
