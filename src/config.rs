//! Syscall Layer Configuration
//!
//! Compile-time layout constants plus the small runtime [`Config`] that the
//! dispatcher consults.
//!
//! # Policy knobs
//! - `user_top`: first address that belongs to the kernel
//! - `max_path_len`: longest user string copied into the kernel
//! - `unknown_syscall`: what to do with a syscall number nobody implements

use log::LevelFilter;

/// User/kernel address-space layout.
pub mod regions {
    /// Base of the kernel's mapping of physical memory.
    /// Every user virtual address is strictly below this.
    pub const PHYS_BASE: usize = 0xC000_0000;

    /// Page size (4 KiB)
    pub const PAGE_SIZE: usize = 4096;
}

/// Size of one argument word in the call frame.
pub const WORD_SIZE: usize = 4;

/// Number of slots in a process's file descriptor table.
pub const FD_TABLE_SIZE: usize = 128;

/// Longest user string (path or command line) copied into the kernel,
/// not counting the terminating NUL.
pub const MAX_PATH_LEN: usize = regions::PAGE_SIZE;

/// What the dispatcher does with a syscall number it does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownSyscall {
    /// Run nothing and leave the return slot untouched.
    ///
    /// The caller observes whatever value the slot held before the trap.
    Ignore,
    /// Treat the call as a fatal user fault and exit with -1.
    Terminate,
}

/// Runtime configuration for the syscall layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// First non-user address.
    pub user_top: usize,
    /// Longest user string accepted, excluding the NUL.
    pub max_path_len: usize,
    /// Unknown syscall policy.
    pub unknown_syscall: UnknownSyscall,
}

impl Config {
    /// The default layout: user space below `PHYS_BASE`, unknown calls ignored.
    pub const fn new() -> Self {
        Self {
            user_top: regions::PHYS_BASE,
            max_path_len: MAX_PATH_LEN,
            unknown_syscall: UnknownSyscall::Ignore,
        }
    }

    /// Same configuration with a different unknown-syscall policy.
    pub const fn with_unknown_syscall(mut self, policy: UnknownSyscall) -> Self {
        self.unknown_syscall = policy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Log level selected at build time through the `LOG` environment variable.
pub fn log_level() -> LevelFilter {
    parse_level(option_env!("LOG"))
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}
