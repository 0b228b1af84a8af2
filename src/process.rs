//! Process Context and Lifecycle
//!
//! A [`Process`] is the explicit per-process state every syscall handler
//! receives: the name, the exit status and the descriptor table. Creating
//! processes, waiting on them and scheduling threads belong to the process
//! subsystem, reached through [`ProcessControl`] and [`Lifecycle`].

use alloc::string::String;
use core::fmt::Write;

use crate::device::{Console, ConsoleWriter};
use crate::fd::FdTable;
use crate::fs::File;

/// Process identifier.
pub type Pid = i32;

/// Value returned to user code when `exec` fails.
pub const PID_ERROR: Pid = -1;

/// Process creation and reaping.
pub trait ProcessControl: Sync {
    /// Start a new process running `cmdline`.
    ///
    /// Returns None if the program could not be loaded.
    fn execute(&self, cmdline: &str) -> Option<Pid>;

    /// Block until child `pid` exits and return its status.
    ///
    /// Returns -1 if `pid` is not a direct child or was already waited on.
    fn wait(&self, pid: Pid) -> i32;
}

/// Thread and machine control. Neither call returns.
pub trait Lifecycle {
    /// Terminate the calling thread.
    fn thread_exit(&self) -> !;

    /// Power the machine off.
    fn power_off(&self) -> !;
}

/// Per-process state visible to the syscall layer.
pub struct Process<F> {
    name: String,
    exit_status: i32,
    exited: bool,
    fds: FdTable<F>,
}

impl<F: File> Process<F> {
    /// Create the syscall state for a freshly started process.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_status: 0,
            exited: false,
            fds: FdTable::new(),
        }
    }

    /// Process name, as printed in the exit line.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status recorded by `exit`. Zero until the process exits.
    #[inline]
    pub fn exit_status(&self) -> i32 {
        self.exit_status
    }

    /// Check whether `exit` has run.
    #[inline]
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// The descriptor table.
    #[inline]
    pub fn fds(&self) -> &FdTable<F> {
        &self.fds
    }

    /// The descriptor table, mutably.
    #[inline]
    pub fn fds_mut(&mut self) -> &mut FdTable<F> {
        &mut self.fds
    }

    /// Terminate the process with `status`.
    ///
    /// Prints `"<name>: exit(<status>)"` to the console, records the status
    /// and closes every open descriptor in ascending order. Runs at most once;
    /// later calls do nothing and return false.
    ///
    /// The caller must not let the thread resume user code afterwards.
    pub fn exit(&mut self, status: i32, console: &dyn Console) -> bool {
        if self.exited {
            return false;
        }
        self.exited = true;

        let _ = writeln!(ConsoleWriter(console), "{}: exit({})", self.name, status);
        self.exit_status = status;
        let closed = self.fds.release_all();
        log::info!("{} exited with {} ({} fds closed)", self.name, status, closed);
        true
    }
}
