//! Diagnostic sink.
//!
//! The core has no I/O dependency of its own, so trace/debug output is
//! routed through a caller-supplied `Logger`. `NoopLogger` is the zero-cost
//! default; `log`/`defmt` adapters are available behind their Cargo
//! features for hosted and embedded use respectively.

/// Destination for diagnostic output produced while routing or reassembling frames.
pub trait Logger {
    fn log(&mut self, args: core::fmt::Arguments);
}

/// Discards everything. The default when no logging feature is enabled.
#[derive(Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    #[inline]
    fn log(&mut self, _args: core::fmt::Arguments) {}
}

/// Forwards to the `log` crate's `debug!` macro.
#[cfg(feature = "log")]
#[derive(Default)]
pub struct LogLogger;

#[cfg(feature = "log")]
impl Logger for LogLogger {
    fn log(&mut self, args: core::fmt::Arguments) {
        log::debug!("{}", args);
    }
}

/// Forwards to `defmt`.
#[cfg(feature = "defmt")]
#[derive(Default)]
pub struct DefmtLogger;

#[cfg(feature = "defmt")]
impl Logger for DefmtLogger {
    fn log(&mut self, args: core::fmt::Arguments) {
        if let Some(s) = args.as_str() {
            defmt::debug!("{=str}", s);
        } else {
            defmt::debug!("(formatted diagnostic)");
        }
    }
}

/// Format and forward to `logger.log`, matching the `log`/`defmt` macro call shape.
macro_rules! net_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(format_args!($($arg)*))
    };
}

pub(crate) use net_trace;
