//! Example frames for tests.

use crate::frame::ChecksumPolicy;

pub const EMS_PAYLOAD: &str = concat!(
    // time: 12:34:56 + 32/64
    "12", "34", "56", "32",
    // manifold pressure, oil temperature, oil pressure, fuel pressure
    "03000", "0185", "065", "045",
    // voltage, current, rpm, fuel flow
    "138", "+012", "240", "085",
    // remaining, fuel level 1, fuel level 2
    "0250", "120", "115",
    // general-purpose slots, the last one is unknown
    "OAT00059", "FL300080", "XXX00000",
    // gp thermocouple
    "00250",
    // egt
    "1350", "1351", "1352", "1353", "1354", "1355",
    // cht
    "380", "381", "382", "383", "384", "385",
    // contacts
    "1", "0",
);

pub const EFIS_PAYLOAD: &str = concat!(
    // time: 12:34:56 + 16/64
    "12", "34", "56", "16",
    // pitch, roll, yaw, airspeed
    "+025", "-0153", "270", "0515",
    // altitude, rate
    "+1524", "-015",
    // lateral and vertical acceleration, angle of attack
    "+05", "+10", "42",
    // status, reserved
    "000000", "0000",
);

pub const EFIS_STATUS_OFFSET: usize = 41;

pub const EFIS_NARROW_PAYLOAD: &str = concat!(
    "12", "34", "56", "16",
    "+025", "-0153", "270", "0515",
    "1524", "-015",
    "+05", "+10", "42",
    "000001", "00000",
);

/// Payload with the checksum appended, without line terminator.
pub fn ems_frame(payload: &str) -> String {
    with_checksum(ChecksumPolicy::ZeroSum, payload)
}

pub fn efis_frame(payload: &str) -> String {
    with_checksum(ChecksumPolicy::Sum, payload)
}

fn with_checksum(policy: ChecksumPolicy, payload: &str) -> String {
    format!("{payload}{:02X}", policy.calculate(payload.as_bytes()))
}

/// Overwrites part of a payload.
pub fn replace(payload: &str, offset: usize, with: &str) -> String {
    let mut payload = payload.to_owned();
    payload.replace_range(offset..offset + with.len(), with);
    payload
}
