use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Mutex;

use log::LevelFilter;
use slog::{slog_o, Drain, Level, OwnedKVList, Record};
use slog_scope::GlobalLoggerGuard;

/// Plain-text drain: one `LEVEL message <module:line>` line per record.
pub struct PlainDrain<W: Write> {
    io: Mutex<W>,
}

impl<W: Write> PlainDrain<W> {
    pub fn new(io: W) -> Self {
        PlainDrain { io: Mutex::new(io) }
    }
}

impl<W: Write> Drain for PlainDrain<W> {
    type Ok = ();
    type Err = slog::Never;

    fn log(&self, record: &Record, _values: &OwnedKVList) -> Result<(), slog::Never> {
        let mut buf: Vec<u8> = Vec::with_capacity(128);
        let _ = write_plain(
            &mut buf,
            record.level(),
            record.msg(),
            Some((record.module(), record.line())),
        );
        if let Ok(mut io) = self.io.lock() {
            let _ = io.write_all(&buf);
            let _ = io.flush();
        }
        Ok(())
    }
}

fn write_plain<IO: Write>(
    io: &mut IO,
    level: Level,
    msg: &fmt::Arguments<'_>,
    location: Option<(&str, u32)>,
) -> io::Result<()> {
    write!(io, "{:<5} {msg}", level.as_str())?;
    if let Some((module, line)) = location {
        write!(io, " <{module}:{line}>")?;
    }
    writeln!(io)
}

/// Level from the config string, raised by each `-v`.
pub fn effective_level(configured: &str, verbose: u8) -> LevelFilter {
    let base = LevelFilter::from_str(configured).unwrap_or(LevelFilter::Warn);
    let from_flags = match verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    base.max(from_flags)
}

/// Routes the `log` facade through a stderr slog drain. Keep the guard alive for the
/// lifetime of the process.
pub fn setup(level: LevelFilter) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let drain = PlainDrain::new(io::stderr());
    let logger = slog::Logger::root(drain.fuse(), slog_o!());

    let scope_guard = slog_scope::set_global_logger(logger);

    slog_stdlog::init_with_level(level.to_level().unwrap_or(log::Level::Error))?;
    log::set_max_level(level);
    Ok(scope_guard)
}
