//! Async message stream over a byte reader.

use std::{
    pin::Pin,
    task::{
        Context,
        Poll,
    },
};

use flightdeck_types::Message;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::io::{
    AsyncRead,
    ReadBuf,
};

use crate::{
    Error,
    frame::FrameStatistics,
    framer::LineFramer,
    schema::Schema,
    stream::decode_line,
};

const RECEIVE_BUFFER_SIZE: usize = 512;

pin_project! {
    /// Reads frames from an [`AsyncRead`] and decodes them.
    ///
    /// Invalid frames are skipped. The stream ends when the reader reaches EOF;
    /// a partial frame at the end is discarded.
    #[derive(Debug)]
    pub struct Reader<R> {
        #[pin]
        reader: R,
        schema: Schema,
        framer: LineFramer,
        statistics: FrameStatistics,
        receive_buffer: [u8; RECEIVE_BUFFER_SIZE],
    }
}

impl<R> Reader<R> {
    pub fn new(reader: R, schema: Schema) -> Self {
        Self {
            reader,
            schema,
            framer: LineFramer::new(),
            statistics: FrameStatistics::default(),
            receive_buffer: [0; RECEIVE_BUFFER_SIZE],
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn statistics(&self) -> &FrameStatistics {
        &self.statistics
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead> Stream for Reader<R> {
    type Item = Result<Message, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let this = self.as_mut().project();

            if let Some(line) = this.framer.next_line() {
                if let Some(message) = decode_line(*this.schema, this.statistics, &line) {
                    return Poll::Ready(Some(Ok(message)));
                }
            }
            else {
                let mut read_buf = ReadBuf::new(this.receive_buffer);
                match this.reader.poll_read(cx, &mut read_buf) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(error)) => return Poll::Ready(Some(Err(error.into()))),
                    Poll::Ready(Ok(())) => {
                        let data = read_buf.filled();

                        // if no data was received, the underlying reader reached EOF
                        if data.is_empty() {
                            if this.framer.buffered() > 0 {
                                tracing::debug!(
                                    num_bytes = this.framer.buffered(),
                                    "discarding partial frame at EOF"
                                );
                                this.framer.reset();
                            }
                            return Poll::Ready(None);
                        }

                        this.framer.push(data);
                    }
                }
            }
        }
    }
}
