//! Tab-separated variable log.
//!
//! A logging session writes one row per message. Each logged label gets a
//! column; columns are assigned in the order labels are included and never
//! change during a session. Labels a message doesn't contain are written as
//! `NaN`. There is no header row.

use std::{
    collections::HashMap,
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::Path,
};

use flightdeck_types::Message;

use crate::emitter::Subscriber;

#[derive(Debug, thiserror::Error)]
#[error("variable logger error")]
pub enum LogError {
    Io(#[from] std::io::Error),
    #[error("not logging")]
    NotLogging,
}

#[derive(Debug)]
struct Session<W: Write> {
    writer: BufWriter<W>,
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
}

impl<W: Write> Session<W> {
    fn include(&mut self, label: &str) -> bool {
        if self.column_index.contains_key(label) {
            false
        }
        else {
            self.column_index
                .insert(label.to_owned(), self.columns.len());
            self.columns.push(label.to_owned());
            true
        }
    }

    fn write_row(&mut self, message: &Message) -> Result<(), std::io::Error> {
        for (i, label) in self.columns.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            write!(self.writer, "{:.6}", message.value(label))?;
        }
        self.writer.write_all(b"\n")?;

        // each row reaches the destination before the next frame arrives
        self.writer.flush()?;
        Ok(())
    }
}

/// Which labels are included automatically when a message is logged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AutoInclude {
    /// Only labels registered with [`VariableLogger::include`].
    #[default]
    Never,
    /// Labels on this allow-list.
    Listed(Vec<String>),
    /// Every label.
    Always,
}

impl AutoInclude {
    fn allows(&self, label: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Listed(labels) => labels.iter().any(|allowed| allowed == label),
            Self::Always => true,
        }
    }
}

/// Writes messages as rows of tab-separated values.
///
/// With an allow-list (see [`with_allow_list`][Self::with_allow_list]), labels
/// are included automatically the first time they show up in a logged
/// message, so columns end up in first-seen order.
#[derive(Debug)]
pub struct VariableLogger<W: Write> {
    session: Option<Session<W>>,
    auto_include: AutoInclude,
}

impl<W: Write> Default for VariableLogger<W> {
    fn default() -> Self {
        Self {
            session: None,
            auto_include: AutoInclude::Never,
        }
    }
}

impl<W: Write> VariableLogger<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_list<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auto_include = AutoInclude::Listed(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Include every label that shows up.
    pub fn with_all_labels(mut self) -> Self {
        self.auto_include = AutoInclude::Always;
        self
    }

    pub fn is_logging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a new session writing to `writer`.
    ///
    /// A running session is stopped first.
    pub fn start(&mut self, writer: W) -> Result<(), LogError> {
        self.stop()?;

        tracing::debug!("starting variable log");
        self.session = Some(Session {
            writer: BufWriter::new(writer),
            columns: vec![],
            column_index: HashMap::new(),
        });

        Ok(())
    }

    /// Stops the session and returns the writer.
    ///
    /// The column assignments are discarded, a new session starts from
    /// scratch.
    pub fn stop(&mut self) -> Result<Option<W>, LogError> {
        let Some(session) = self.session.take()
        else {
            return Ok(None);
        };

        tracing::debug!(columns = session.columns.len(), "stopping variable log");
        let writer = session
            .writer
            .into_inner()
            .map_err(|error| error.into_error())?;

        Ok(Some(writer))
    }

    /// Registers a label for logging.
    ///
    /// Returns `false` if the label was already registered.
    pub fn include(&mut self, label: &str) -> Result<bool, LogError> {
        let session = self.session.as_mut().ok_or(LogError::NotLogging)?;
        Ok(session.include(label))
    }

    /// Labels in column order.
    pub fn columns(&self) -> &[String] {
        self.session
            .as_ref()
            .map_or(&[][..], |session| session.columns.as_slice())
    }

    /// Writes one row for this message and flushes it.
    pub fn log(&mut self, message: &Message) -> Result<(), LogError> {
        let session = self.session.as_mut().ok_or(LogError::NotLogging)?;

        for label in message.labels() {
            if self.auto_include.allows(label) {
                session.include(label);
            }
        }

        session.write_row(message)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), LogError> {
        if let Some(session) = &mut self.session {
            session.writer.flush()?;
        }
        Ok(())
    }
}

impl VariableLogger<File> {
    /// Starts a new session writing to a file. The file is truncated.
    pub fn start_file(&mut self, path: impl AsRef<Path>) -> Result<(), LogError> {
        let file = File::create(path)?;
        self.start(file)
    }
}

impl<W: Write> Subscriber for VariableLogger<W> {
    fn message_received(&mut self, message: &Message) {
        if self.is_logging() {
            if let Err(error) = self.log(message) {
                tracing::warn!(%error, "failed to write variable log");
            }
        }
    }
}

impl<W: Write> Drop for VariableLogger<W> {
    fn drop(&mut self) {
        if let Err(error) = self.flush() {
            tracing::warn!(%error, "failed to flush variable log");
        }
    }
}
