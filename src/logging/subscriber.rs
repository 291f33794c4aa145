//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use super::utils::{HEADER_TIME_FORMAT, LINE_TIME_FORMAT, log_file_path, strip_ansi, utc_now};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "dfi::stage";
/// Target used for dry-run action lines.
pub(super) const DRY_RUN_TARGET: &str = "dfi::dry_run";
/// Environment variable holding an optional console filter directive.
pub const LOG_ENV_VAR: &str = "DFI_LOG";

/// How a message is presented, derived from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Info,
    Warn,
    Error,
    Debug,
}

impl Kind {
    fn of(event: &Event<'_>) -> Self {
        let metadata = event.metadata();
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// The `message` field of an event.
fn message_of(event: &Event<'_>) -> String {
    struct Message(String);

    impl tracing::field::Visit for Message {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut visitor = Message(String::new());
    event.record(&mut visitor);
    visitor.0
}

/// One console line, with colours.
fn console_line(kind: Kind, msg: &str) -> String {
    match kind {
        Kind::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        Kind::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
        Kind::Info => format!("  {msg}"),
        Kind::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        Kind::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
        Kind::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// One log file line: timestamp, tag, and the message without escapes.
fn file_line(kind: Kind, time: &str, msg: &str) -> String {
    let msg = strip_ansi(msg);
    let tag = match kind {
        Kind::Stage => return format!("[{time}] ==> {msg}"),
        Kind::Info => return format!("[{time}]     {msg}"),
        Kind::DryRun => "dry run",
        Kind::Warn => "warn",
        Kind::Error => "error",
        Kind::Debug => "debug",
    };
    format!("[{time}]     [{tag}] {msg}")
}

/// Appends every event to `$XDG_CACHE_HOME/dfi/<command>.log`.
///
/// The file is truncated when the layer is created and starts with a line
/// naming the version and the UTC start time.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the log file for `command`, or `None` if it cannot be created.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let mut file = fs::File::create(&path).ok()?;
        writeln!(
            file,
            "# dfi {} started {} UTC",
            crate::VERSION,
            utc_now(HEADER_TIME_FORMAT)
        )
        .ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: Subscriber> Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = file_line(Kind::of(event), &utc_now(LINE_TIME_FORMAT), &message_of(event));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console [`FormatEvent`] rendering [`console_line`]s.
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writeln!(writer, "{}", console_line(Kind::of(event), &message_of(event)))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout.  The
/// console shows `info` and above (`debug` with `verbose`) unless
/// [`LOG_ENV_VAR`] holds a valid filter directive.  The log file always
/// receives `debug` and above.  Call once, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));
    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(writer)
        .with_filter(console_filter(
            verbose,
            std::env::var(LOG_ENV_VAR).ok().as_deref(),
        ));
    let file = FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}

/// Build the console [`EnvFilter`].
///
/// An invalid `directive` falls back to the verbosity default.
fn console_filter(verbose: bool, directive: Option<&str>) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}
