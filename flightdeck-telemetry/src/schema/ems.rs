//! Engine monitor (EMS) frames
//!
//! 119 characters of payload. After the fixed engine and fuel fields there
//! are three general-purpose slots, each a 3 letter code followed by a value.
//! The code decides what the value means. Older units don't fill these in
//! consistently, so the slots can also be skipped entirely (see [`Version`]).

use flightdeck_types::{
    Measurement,
    Message,
};

use crate::{
    cursor::FieldCursor,
    schema::{
        Field,
        Scale,
        TIME,
    },
};

pub const BODY_LENGTH: usize = 119;

pub const GENERAL_PURPOSE_SLOTS: usize = 3;
pub const GENERAL_PURPOSE_CODE_WIDTH: usize = 3;
pub const GENERAL_PURPOSE_VALUE_WIDTH: usize = 5;

/// Revision of the EMS field table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Decode the general-purpose slots through [`general_purpose_field`].
    #[default]
    DispatchGeneralPurpose,

    /// Treat the general-purpose slots as padding.
    SkipGeneralPurpose,
}

const LEADING: [Field; 15] = [
    TIME[0],
    TIME[1],
    TIME[2],
    TIME[3],
    Field::new(5, "manifold pressure", "inHg", Scale::Divide(100.0)),
    Field::new(4, "oil temperature", "°F", Scale::Raw),
    Field::new(3, "oil pressure", "PSI", Scale::Raw),
    Field::new(3, "fuel pressure", "PSI", Scale::Divide(10.0)),
    Field::new(3, "voltage", "V", Scale::Divide(10.0)),
    Field::new(4, "current", "A", Scale::Raw),
    Field::new(3, "RPM", "rpm", Scale::Multiply(10.0)),
    Field::new(3, "fuel flow", "GPH", Scale::Divide(10.0)),
    Field::new(4, "remaining fuel", "gal", Scale::Divide(10.0)),
    Field::new(3, "fuel level 1", "gal", Scale::Divide(10.0)),
    Field::new(3, "fuel level 2", "gal", Scale::Divide(10.0)),
];

const TAIL: [Field; 15] = [
    Field::new(5, "gp thermocouple", "°F", Scale::Raw),
    Field::new(4, "egt1", "°F", Scale::Raw),
    Field::new(4, "egt2", "°F", Scale::Raw),
    Field::new(4, "egt3", "°F", Scale::Raw),
    Field::new(4, "egt4", "°F", Scale::Raw),
    Field::new(4, "egt5", "°F", Scale::Raw),
    Field::new(4, "egt6", "°F", Scale::Raw),
    Field::new(3, "cht1", "°F", Scale::Raw),
    Field::new(3, "cht2", "°F", Scale::Raw),
    Field::new(3, "cht3", "°F", Scale::Raw),
    Field::new(3, "cht4", "°F", Scale::Raw),
    Field::new(3, "cht5", "°F", Scale::Raw),
    Field::new(3, "cht6", "°F", Scale::Raw),
    Field::new(1, "contact 1", "", Scale::Raw),
    Field::new(1, "contact 2", "", Scale::Raw),
];

/// Looks up what a general-purpose slot holds.
///
/// Returns `None` for codes we don't know.
pub fn general_purpose_field(code: &[u8]) -> Option<Field> {
    let (label, units, scale) = match code {
        b"OAT" => ("outside air temperature", "°F", Scale::Raw),
        b"CLT" => ("coolant temperature", "°F", Scale::Raw),
        b"CRB" => ("carburetor temperature", "°F", Scale::Raw),
        b"FL3" => ("fuel level 3", "gal", Scale::Divide(10.0)),
        b"FL4" => ("fuel level 4", "gal", Scale::Divide(10.0)),
        b"TRA" => ("aileron trim", "%", Scale::Raw),
        b"TRE" => ("elevator trim", "%", Scale::Raw),
        b"TRR" => ("rudder trim", "%", Scale::Raw),
        b"FLP" => ("flap position", "°", Scale::Raw),
        _ => return None,
    };
    Some(Field::new(GENERAL_PURPOSE_VALUE_WIDTH, label, units, scale))
}

pub fn decode(version: Version, payload: &[u8]) -> Message {
    let mut cursor = FieldCursor::new(payload);
    let mut measurements =
        Vec::with_capacity(LEADING.len() + GENERAL_PURPOSE_SLOTS + TAIL.len());

    read_fields(&LEADING, &mut cursor, &mut measurements);

    match version {
        Version::DispatchGeneralPurpose => {
            for _ in 0..GENERAL_PURPOSE_SLOTS {
                if let Some(measurement) = read_general_purpose(&mut cursor) {
                    measurements.push(measurement);
                }
            }
        }
        Version::SkipGeneralPurpose => {
            cursor.skip(
                GENERAL_PURPOSE_SLOTS * (GENERAL_PURPOSE_CODE_WIDTH + GENERAL_PURPOSE_VALUE_WIDTH),
            );
        }
    }

    read_fields(&TAIL, &mut cursor, &mut measurements);

    Message::new(measurements)
}

fn read_fields(fields: &[Field], cursor: &mut FieldCursor, measurements: &mut Vec<Measurement>) {
    measurements.extend(fields.iter().map(|field| field.read(cursor)));
}

fn read_general_purpose(cursor: &mut FieldCursor) -> Option<Measurement> {
    let code = cursor.read_code(GENERAL_PURPOSE_CODE_WIDTH);

    // the value is consumed even if we don't know the code
    let raw = cursor.read_decimal(GENERAL_PURPOSE_VALUE_WIDTH);

    match code.and_then(general_purpose_field) {
        Some(field) => Some(field.measurement(raw)),
        None => {
            tracing::debug!(
                code = ?code.map(|code| code.escape_ascii().to_string()),
                "unknown general-purpose code"
            );
            None
        }
    }
}
