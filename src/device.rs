//! Console and Keyboard Devices
//!
//! The syscall layer never touches device registers. It talks to the
//! console and keyboard drivers through these two traits.

use core::fmt;

/// Character output device.
pub trait Console: Sync {
    /// Write `bytes` to the console as one unit.
    fn write_bytes(&self, bytes: &[u8]);
}

/// Character input device.
pub trait Keyboard: Sync {
    /// Block until a key is available and return it.
    fn getc(&self) -> u8;
}

/// `core::fmt::Write` adapter over a [`Console`].
pub struct ConsoleWriter<'a>(pub &'a dyn Console);

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsole;
    use core::fmt::Write;

    #[test]
    fn test_console_writer_formats() {
        let console = MockConsole::new();
        write!(ConsoleWriter(&console), "{}: {}", "a", 7).unwrap();
        assert_eq!(console.output(), "a: 7");
    }
}
