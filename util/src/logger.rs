//! Session logger
//!
//! Log lines go to the terminal with a coloured level tag and to the session's log file with a
//! plain one. Every line carries the seconds elapsed since the session epoch, so log lines can be
//! matched against the simulated time in the session transcript.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Level};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modules which are capped below the requested level, the in-memory world traces every contact
/// and would otherwise swamp the controllers' output.
const CAPPED_MODULES: [(&str, LevelFilter); 1] = [("ctrl_lib::sim", LevelFilter::Debug)];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be `Info` or more verbose, warnings alone are not enough to follow a run.
/// - This function must only be called once, a second call fails with `FernInitError`.
pub fn logger_init(min_level: LevelFilter, session: &session::Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let terminal = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(record.level(), level_tag(record.level()), record.target(), message)
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(record.level(), plain_tag(record.level()), record.target(), message)
            ))
        })
        .chain(log_file);

    let mut root = fern::Dispatch::new().level(min_level);
    for (module, cap) in CAPPED_MODULES.iter() {
        root = root.level_for(*module, min_level.min(*cap));
    }

    root.chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. Debug and trace lines name the module they came from.
fn format_line<T: std::fmt::Display>(
    level: Level,
    tag: T,
    target: &str,
    message: &std::fmt::Arguments,
) -> String {
    let elapsed_s = session::get_elapsed_seconds();

    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    } else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

fn plain_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn level_tag(level: Level) -> ColoredString {
    let tag = plain_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_line() {
        let line = format_line(Level::Info, plain_tag(Level::Info), "ctrl_lib::task_mgr", &format_args!("hello"));
        assert!(line.ends_with(" INF] hello"), "{}", line);

        let line = format_line(Level::Debug, plain_tag(Level::Debug), "ctrl_lib::task_mgr", &format_args!("hi"));
        assert!(line.ends_with(" DBG] ctrl_lib::task_mgr: hi"), "{}", line);
    }
}
