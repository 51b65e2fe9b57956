//! Frame validation
//!
//! A frame is one line of the wire protocol: a fixed-size payload followed by
//! a checksum byte, written as two hex characters. Lines that are longer than
//! a frame are cut down to size first; which end is kept depends on the
//! schema.

use crate::{
    cursor::parse_hex,
    schema::Schema,
};

/// Length of the checksum footer in characters.
pub const FOOTER_LENGTH: usize = 2;

/// Which end of an overlong line is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Truncation {
    KeepLeft,
    KeepRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Payload bytes plus the checksum byte must add up to 0 (mod 256).
    ZeroSum,

    /// Payload bytes must add up to the checksum byte (mod 256).
    Sum,
}

impl ChecksumPolicy {
    /// Calculates the checksum byte a sender would put into the footer for
    /// this payload.
    pub fn calculate(&self, payload: &[u8]) -> u8 {
        let sum = payload
            .iter()
            .fold(0u8, |sum, byte| sum.wrapping_add(*byte));
        match self {
            Self::ZeroSum => sum.wrapping_neg(),
            Self::Sum => sum,
        }
    }

    pub fn verify(&self, payload: &[u8], checksum: u8) -> bool {
        self.calculate(payload) == checksum
    }
}

/// Reason why a line was rejected.
///
/// These are never passed on to subscribers, the frame is just dropped. They
/// are traced and counted though.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short: expected {expected} bytes, but got {length}")]
    TooShort { expected: usize, length: usize },
    #[error("checksum footer is not hex")]
    InvalidChecksumField,
    #[error("checksum mismatch: expected {expected:02X}, but calculated {calculated:02X}")]
    ChecksumMismatch { expected: u8, calculated: u8 },
}

/// Checks a line against `schema` and returns its payload.
pub fn validate<'a>(schema: &Schema, line: &'a [u8]) -> Result<&'a [u8], FrameError> {
    let expected = schema.total_length();
    if line.len() < expected {
        return Err(FrameError::TooShort {
            expected,
            length: line.len(),
        });
    }

    let frame = match schema.truncation() {
        Truncation::KeepLeft => &line[..expected],
        Truncation::KeepRight => &line[line.len() - expected..],
    };

    let (payload, footer) = frame.split_at(expected - FOOTER_LENGTH);
    let expected = parse_hex(footer)
        .and_then(|checksum| u8::try_from(checksum).ok())
        .ok_or(FrameError::InvalidChecksumField)?;

    let policy = schema.checksum_policy();
    let calculated = policy.calculate(payload);
    if calculated != expected {
        return Err(FrameError::ChecksumMismatch {
            expected,
            calculated,
        });
    }

    Ok(payload)
}

/// Counts accepted and dropped frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStatistics {
    pub accepted: usize,
    pub too_short: usize,
    pub invalid_checksum_field: usize,
    pub checksum_mismatch: usize,
}

impl FrameStatistics {
    pub fn record<T>(&mut self, result: &Result<T, FrameError>) {
        match result {
            Ok(_) => self.accepted += 1,
            Err(FrameError::TooShort { .. }) => self.too_short += 1,
            Err(FrameError::InvalidChecksumField) => self.invalid_checksum_field += 1,
            Err(FrameError::ChecksumMismatch { .. }) => self.checksum_mismatch += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.too_short + self.invalid_checksum_field + self.checksum_mismatch
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        frame::{
            ChecksumPolicy,
            FrameError,
            FrameStatistics,
            validate,
        },
        schema::Schema,
        test_util::{
            EFIS_PAYLOAD,
            EMS_PAYLOAD,
            efis_frame,
            ems_frame,
        },
    };

    #[test]
    fn zero_sum_includes_the_checksum_byte() {
        let payload = b"0123";
        let checksum = ChecksumPolicy::ZeroSum.calculate(payload);
        let total = payload
            .iter()
            .fold(checksum, |sum, byte| sum.wrapping_add(*byte));
        assert_eq!(total, 0);
        assert!(ChecksumPolicy::ZeroSum.verify(payload, checksum));
        assert!(!ChecksumPolicy::Sum.verify(payload, checksum));
    }

    #[test]
    fn sum_equals_the_checksum_byte() {
        // 0x30 + 0x31 + 0x32 + 0x33 = 0xc6
        assert_eq!(ChecksumPolicy::Sum.calculate(b"0123"), 0xc6);
        assert!(ChecksumPolicy::Sum.verify(b"0123", 0xc6));
    }

    #[test]
    fn it_accepts_valid_frames() {
        let frame = ems_frame(EMS_PAYLOAD);
        let payload = validate(&Schema::ems(), frame.as_bytes()).unwrap();
        assert_eq!(payload, EMS_PAYLOAD.as_bytes());

        let frame = efis_frame(EFIS_PAYLOAD);
        let payload = validate(&Schema::efis(), frame.as_bytes()).unwrap();
        assert_eq!(payload, EFIS_PAYLOAD.as_bytes());
    }

    #[test]
    fn it_rejects_short_frames() {
        let frame = ems_frame(EMS_PAYLOAD);
        assert_eq!(
            validate(&Schema::ems(), &frame.as_bytes()[1..]),
            Err(FrameError::TooShort {
                expected: 121,
                length: 120
            })
        );
        assert!(matches!(
            validate(&Schema::efis(), b""),
            Err(FrameError::TooShort { expected: 53, .. })
        ));
    }

    #[test]
    fn ems_keeps_the_left_end_of_long_lines() {
        let frame = format!("{}garbage", ems_frame(EMS_PAYLOAD));
        assert!(validate(&Schema::ems(), frame.as_bytes()).is_ok());

        let frame = format!("garbage{}", ems_frame(EMS_PAYLOAD));
        assert!(validate(&Schema::ems(), frame.as_bytes()).is_err());
    }

    #[test]
    fn efis_keeps_the_right_end_of_long_lines() {
        let frame = format!("garbage{}", efis_frame(EFIS_PAYLOAD));
        let payload = validate(&Schema::efis(), frame.as_bytes()).unwrap();
        assert_eq!(payload, EFIS_PAYLOAD.as_bytes());

        let frame = format!("{}garbage", efis_frame(EFIS_PAYLOAD));
        assert!(validate(&Schema::efis(), frame.as_bytes()).is_err());
    }

    #[test]
    fn it_rejects_checksum_mismatches() {
        let mut frame = ems_frame(EMS_PAYLOAD).into_bytes();
        frame[20] = if frame[20] == b'9' { b'8' } else { b'9' };
        assert!(matches!(
            validate(&Schema::ems(), &frame),
            Err(FrameError::ChecksumMismatch { .. })
        ));

        let mut frame = efis_frame(EFIS_PAYLOAD).into_bytes();
        let n = frame.len();
        frame[n - 2..].copy_from_slice(b"zz");
        assert_eq!(
            validate(&Schema::efis(), &frame),
            Err(FrameError::InvalidChecksumField)
        );
    }

    #[test]
    fn it_counts_frames() {
        let mut statistics = FrameStatistics::default();
        statistics.record(&validate(&Schema::efis(), efis_frame(EFIS_PAYLOAD).as_bytes()));
        statistics.record(&validate(&Schema::efis(), b"short"));
        statistics.record(&validate(&Schema::ems(), efis_frame(EFIS_PAYLOAD).as_bytes()));
        assert_eq!(statistics.accepted, 1);
        assert_eq!(statistics.too_short, 2);
        assert_eq!(statistics.dropped(), 2);
    }
}
