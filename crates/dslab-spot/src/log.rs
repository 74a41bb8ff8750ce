//! Logging facilities.
//!
//! Records of a worker are prefixed with the time elapsed since the group was started, the level and the worker's
//! rank out of the group size, e.g. `[0.012 DEBUG rank 1/3] solved 2 tenants`. The record target is the worker name,
//! so `RUST_LOG=worker-0=trace` narrows the output down to the coordinator.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::Level;

/// Applies the color to the string if stderr (log) goes to console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

/// Level name padded to a fixed width and colored by severity.
pub fn level_label(level: Level) -> ColoredString {
    let color = match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Cyan,
    };
    get_colored(&format!("{:<5}", level), color)
}

/// Logs a message on behalf of a worker.
///
/// The second argument is anything implementing [`Communicator`](crate::comm::Communicator), or a reference to it.
///
/// # Examples
///
/// ```rust,ignore
/// log_worker!(log::Level::Info, comm, "solved {} tenants", count);
/// ```
#[macro_export]
macro_rules! log_worker {
    ($level:expr, $comm:expr, $($arg:tt)+) => {{
        use $crate::comm::Communicator as _;
        let level: log::Level = $level;
        let comm = &$comm;
        if log::log_enabled!(target: comm.name(), level) {
            log::log!(
                target: comm.name(),
                level,
                "[{:.3} {} rank {}/{}] {}",
                comm.time(),
                $crate::log::level_label(level),
                comm.rank(),
                comm.size(),
                format_args!($($arg)+)
            );
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($comm:expr, $($arg:tt)+) => ($crate::log_worker!(log::Level::Error, $comm, $($arg)+));
}

#[macro_export]
macro_rules! log_warn {
    ($comm:expr, $($arg:tt)+) => ($crate::log_worker!(log::Level::Warn, $comm, $($arg)+));
}

#[macro_export]
macro_rules! log_info {
    ($comm:expr, $($arg:tt)+) => ($crate::log_worker!(log::Level::Info, $comm, $($arg)+));
}

#[macro_export]
macro_rules! log_debug {
    ($comm:expr, $($arg:tt)+) => ($crate::log_worker!(log::Level::Debug, $comm, $($arg)+));
}

#[macro_export]
macro_rules! log_trace {
    ($comm:expr, $($arg:tt)+) => ($crate::log_worker!(log::Level::Trace, $comm, $($arg)+));
}
