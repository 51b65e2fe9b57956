//! # Instrument bus telemetry decoder
//!
//! Decodes the serial output of an engine monitor (EMS) or a flight instrument
//! unit (EFIS) into [`Message`]s of named, unit-tagged [`Measurement`]s.
//!
//! Both units send a continuous stream of text frames, each terminated by
//! `CR LF`:
//!
//! | Schema | Payload | Checksum | Total |
//! |--------|---------|----------|-------|
//! | EMS    | 119     | 2 (hex)  | 121   |
//! | EFIS   | 51      | 2 (hex)  | 53    |
//!
//! The payload is a sequence of fixed-width ASCII fields. Frames that are cut
//! short or fail their checksum are dropped silently, the next one is only a
//! fraction of a second away. Fields that don't parse decode to `NaN` without
//! affecting the rest of the frame.
//!
//! The pipeline is: [`LineFramer`] -> [`frame::validate`] -> [`FieldCursor`] +
//! [`Schema::decode`] -> [`Emitter`]. [`TelemetryStream`] drives it from
//! "bytes available" notifications, [`Reader`] drives it from an
//! [`AsyncRead`][tokio::io::AsyncRead].

pub mod cursor;
pub mod emitter;
pub mod frame;
pub mod framer;
pub mod logger;
pub mod reader;
pub mod schema;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_util;

pub use cursor::FieldCursor;
pub use emitter::{
    Emitter,
    Event,
    LabelRouter,
    OnMessage,
    OnVariable,
    Subscriber,
};
pub use flightdeck_types::{
    Measurement,
    Message,
};
pub use frame::{
    FrameError,
    FrameStatistics,
};
pub use framer::LineFramer;
pub use logger::{
    AutoInclude,
    LogError,
    VariableLogger,
};
pub use reader::Reader;
pub use schema::Schema;
pub use stream::TelemetryStream;

/// Nominal line speed of both units.
pub const BAUD_RATE: u32 = 115_200;

#[derive(Debug, thiserror::Error)]
#[error("telemetry error")]
pub enum Error {
    Io(#[from] std::io::Error),
}
