//! Synchronous, event-driven driver.

use flightdeck_types::Message;

use crate::{
    emitter::{
        Emitter,
        Subscriber,
    },
    frame::FrameStatistics,
    framer::LineFramer,
    schema::Schema,
};

/// Decodes the byte stream of one instrument unit.
///
/// Whoever owns the serial port calls
/// [`bytes_available`][Self::bytes_available] with whatever was received.
/// Every complete frame is decoded and emitted to the subscribers before the
/// call returns. Frames that are too short or fail their checksum are dropped
/// silently.
#[derive(Debug)]
pub struct TelemetryStream {
    schema: Schema,
    framer: LineFramer,
    emitter: Emitter,
    statistics: FrameStatistics,
}

impl TelemetryStream {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            framer: LineFramer::new(),
            emitter: Emitter::new(),
            statistics: FrameStatistics::default(),
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn statistics(&self) -> &FrameStatistics {
        &self.statistics
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + Send + 'static) {
        self.emitter.subscribe(subscriber);
    }

    /// Feeds received bytes in.
    ///
    /// Returns the number of messages that were decoded.
    pub fn bytes_available(&mut self, data: &[u8]) -> usize {
        self.framer.push(data);

        let mut num_messages = 0;
        while let Some(line) = self.framer.next_line() {
            if let Some(message) = self.decode_line(&line) {
                self.emitter.emit(&message);
                num_messages += 1;
            }
        }

        num_messages
    }

    /// Validates and decodes a single line, without emitting it.
    pub fn decode_line(&mut self, line: &[u8]) -> Option<Message> {
        decode_line(self.schema, &mut self.statistics, line)
    }

    /// Discards any partially received frame, e.g. after the port was closed.
    pub fn reset(&mut self) {
        self.framer.reset();
    }
}

pub(crate) fn decode_line(
    schema: Schema,
    statistics: &mut FrameStatistics,
    line: &[u8],
) -> Option<Message> {
    let result = schema.decode_frame(line);
    statistics.record(&result);

    match result {
        Ok(message) => {
            tracing::trace!(schema = %schema, num_measurements = message.len(), "decoded frame");
            Some(message)
        }
        Err(error) => {
            tracing::debug!(schema = %schema, %error, "dropped frame");
            None
        }
    }
}
