//! Kernel Logger
//!
//! Routes the `log` facade to the console device. Every record becomes one
//! `[LEVEL] message` line.
//!
//! Diagnostic output only. The `"<name>: exit(<status>)"` line a process
//! prints on termination is written straight to the console by the exit path
//! and does not depend on the logger being installed.

use core::fmt::Write;

use log::{Log, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::config;
use crate::device::{Console, ConsoleWriter};

static SINK: Once<&'static dyn Console> = Once::new();
static LOGGER: KernelLogger = KernelLogger;

struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = SINK.get() {
            let _ = writeln!(
                ConsoleWriter(*console),
                "[{:>5}] {}",
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the kernel logger, writing to `console`.
///
/// The level comes from the `LOG` build-time variable.
/// Fails if another logger is already installed.
pub fn init(console: &'static dyn Console) -> Result<(), SetLoggerError> {
    init_with_level(console, config::log_level())
}

/// Install the kernel logger with an explicit level.
pub fn init_with_level(
    console: &'static dyn Console,
    level: log::LevelFilter,
) -> Result<(), SetLoggerError> {
    SINK.call_once(|| console);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
