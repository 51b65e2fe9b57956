use std::{
    path::PathBuf,
    pin::Pin,
    sync::Arc,
};

use clap::{
    Parser,
    ValueEnum,
};
use color_eyre::eyre::{
    Error,
    bail,
};
use flightdeck_telemetry::{
    BAUD_RATE,
    Emitter,
    Measurement,
    Message,
    Reader,
    Schema,
    Subscriber,
    VariableLogger,
    schema::{
        efis,
        ems,
    },
};
use futures_util::TryStreamExt;
use parking_lot::Mutex;
use tokio::io::AsyncRead;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) if error.use_stderr() => {
            // usage errors are printed to stdout
            println!("{}", error.render());
            std::process::exit(2);
        }
        Err(error) => error.exit(),
    };
    let schema = args.schema()?;

    let input: Pin<Box<dyn AsyncRead + Send>> = if args.replay {
        Box::pin(tokio::fs::File::open(&args.port).await?)
    }
    else {
        open_serial_port(&args.port, args.baud)?
    };
    tracing::info!(port = %args.port, %schema, "reading telemetry");

    let mut emitter = Emitter::new();
    emitter.subscribe(Dump { json: args.json });

    let logger = if let Some(path) = &args.log {
        let logger = if args.log_labels.is_empty() {
            VariableLogger::new().with_all_labels()
        }
        else {
            VariableLogger::new().with_allow_list(args.log_labels.iter().cloned())
        };
        let logger = Arc::new(Mutex::new(logger));
        logger.lock().start_file(path)?;
        emitter.subscribe(logger.clone());
        Some(logger)
    }
    else {
        None
    };

    let mut reader = Reader::new(input, schema);

    let mut i = 0;
    loop {
        let message = tokio::select! {
            message = reader.try_next() => message?,
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("interrupted");
                break;
            }
        };
        let Some(message) = message
        else {
            break;
        };

        emitter.emit(&message);
        i += 1;
        if args.limit.map_or(false, |limit| i >= limit) {
            break;
        }
    }

    if let Some(logger) = logger {
        logger.lock().stop()?;
    }

    if args.stats {
        let statistics = reader.statistics();
        println!("accepted:               {}", statistics.accepted);
        println!("too short:              {}", statistics.too_short);
        println!(
            "invalid checksum field: {}",
            statistics.invalid_checksum_field
        );
        println!("checksum mismatch:      {}", statistics.checksum_mismatch);
    }

    Ok(())
}

/// Dumps decoded telemetry from an EMS or EFIS serial port.
#[derive(Debug, Parser)]
struct Args {
    /// Serial port, or capture file with --replay
    port: String,

    schema: SchemaKind,

    #[clap(short, long, env = "FLIGHTDECK_BAUD", default_value_t = BAUD_RATE)]
    baud: u32,

    /// Read a captured byte stream from PORT instead of a serial device.
    #[clap(short, long)]
    replay: bool,

    /// EMS units that don't send the general-purpose slots.
    #[clap(long)]
    skip_general_purpose: bool,

    /// EFIS units with a 4 digit altitude field.
    #[clap(long)]
    narrow_altitude: bool,

    /// Write a tab-separated variable log.
    #[clap(long, env = "FLIGHTDECK_LOG")]
    log: Option<PathBuf>,

    /// Labels to log. Logs every label if none are given.
    #[clap(long = "log-label")]
    log_labels: Vec<String>,

    /// Print one JSON array per message.
    #[clap(short, long)]
    json: bool,

    #[clap(short, long)]
    limit: Option<usize>,

    /// Print frame statistics at the end.
    #[clap(long)]
    stats: bool,
}

impl Args {
    fn schema(&self) -> Result<Schema, Error> {
        let schema = match self.schema {
            SchemaKind::Ems => {
                if self.narrow_altitude {
                    bail!("--narrow-altitude only applies to efis");
                }
                if self.skip_general_purpose {
                    Schema::Ems(ems::Version::SkipGeneralPurpose)
                }
                else {
                    Schema::ems()
                }
            }
            SchemaKind::Efis => {
                if self.skip_general_purpose {
                    bail!("--skip-general-purpose only applies to ems");
                }
                if self.narrow_altitude {
                    Schema::Efis(efis::Version::NarrowAltitude)
                }
                else {
                    Schema::efis()
                }
            }
        };
        Ok(schema)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaKind {
    Ems,
    Efis,
}

#[derive(Debug)]
struct Dump {
    json: bool,
}

impl Subscriber for Dump {
    fn variable_updated(&mut self, measurement: &Measurement) {
        if !self.json {
            println!("{measurement}");
        }
    }

    fn message_received(&mut self, message: &Message) {
        if self.json {
            match serde_json::to_string(message) {
                Ok(json) => println!("{json}"),
                Err(error) => tracing::error!(%error, "failed to serialize message"),
            }
        }
    }
}

#[cfg(feature = "serial")]
fn open_serial_port(name: &str, baud: u32) -> Result<Pin<Box<dyn AsyncRead + Send>>, Error> {
    use std::{
        io::{
            ErrorKind,
            Read,
        },
        time::Duration,
    };

    use tokio::io::AsyncWriteExt;

    const PIPE_SIZE: usize = 4096;

    let mut port = serialport::new(name, baud)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(serialport::Parity::None)
        .timeout(Duration::from_millis(500))
        .open()?;

    let (mut sender, receiver) = tokio::io::duplex(PIPE_SIZE);
    let runtime = tokio::runtime::Handle::current();

    // must not be a blocking task, the runtime waits for those on shutdown
    std::thread::spawn(move || {
        let mut buffer = [0; 256];
        loop {
            match port.read(&mut buffer) {
                Ok(0) => break,
                Ok(num_bytes) => {
                    if runtime
                        .block_on(sender.write_all(&buffer[..num_bytes]))
                        .is_err()
                    {
                        // reader is gone
                        break;
                    }
                }
                Err(error)
                    if matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
                Err(error) => {
                    tracing::error!(%error, "serial port read failed");
                    break;
                }
            }
        }
    });

    Ok(Box::pin(receiver))
}

#[cfg(not(feature = "serial"))]
fn open_serial_port(name: &str, _baud: u32) -> Result<Pin<Box<dyn AsyncRead + Send>>, Error> {
    bail!("can't open {name}: built without serial port support, use --replay");
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use flightdeck_telemetry::{
        Schema,
        schema::{
            efis,
            ems,
        },
    };

    use crate::{
        Args,
        SchemaKind,
    };

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("flightdeck-dump").chain(args.iter().copied()))
    }

    #[test]
    fn it_parses_port_and_schema() {
        let args = parse(&["/dev/ttyUSB0", "efis"]).unwrap();
        assert_eq!(args.port, "/dev/ttyUSB0");
        assert!(matches!(args.schema, SchemaKind::Efis));
        assert_eq!(args.schema().unwrap(), Schema::efis());

        let args = parse(&["/dev/ttyUSB0", "ems"]).unwrap();
        assert_eq!(args.schema().unwrap(), Schema::ems());
    }

    #[test]
    fn unknown_schemas_are_usage_errors() {
        let error = parse(&["/dev/ttyUSB0", "gps"]).unwrap_err();
        assert!(error.use_stderr());
        assert_eq!(error.exit_code(), 2);

        assert!(parse(&["/dev/ttyUSB0", "EMS"]).unwrap_err().use_stderr());
    }

    #[test]
    fn missing_arguments_are_usage_errors() {
        let error = parse(&[]).unwrap_err();
        assert!(error.use_stderr());
        assert_eq!(error.exit_code(), 2);

        let error = parse(&["ems"]).unwrap_err();
        assert!(error.use_stderr());
    }

    #[test]
    fn help_is_not_a_usage_error() {
        let error = parse(&["--help"]).unwrap_err();
        assert!(!error.use_stderr());
    }

    #[test]
    fn it_selects_schema_versions() {
        let args = parse(&["/dev/ttyUSB0", "ems", "--skip-general-purpose"]).unwrap();
        assert_eq!(
            args.schema().unwrap(),
            Schema::Ems(ems::Version::SkipGeneralPurpose)
        );

        let args = parse(&["/dev/ttyUSB0", "efis", "--narrow-altitude"]).unwrap();
        assert_eq!(
            args.schema().unwrap(),
            Schema::Efis(efis::Version::NarrowAltitude)
        );
    }

    #[test]
    fn version_flags_must_match_the_schema() {
        let args = parse(&["/dev/ttyUSB0", "ems", "--narrow-altitude"]).unwrap();
        let error = args.schema().unwrap_err();
        assert!(error.to_string().contains("--narrow-altitude"));

        let args = parse(&["/dev/ttyUSB0", "efis", "--skip-general-purpose"]).unwrap();
        let error = args.schema().unwrap_err();
        assert!(error.to_string().contains("--skip-general-purpose"));
    }
}
