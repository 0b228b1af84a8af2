//! Fatal user faults
//!
//! Anything in this enum ends the calling process with status -1.
//! Recoverable failures are not errors here; handlers return them as
//! ordinary values (-1 or false).

use core::fmt;

use crate::mm::VirtAddr;

/// A user fault that terminates the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A user address was null, kernel, unmapped or overflowed.
    BadAddress(VirtAddr),
    /// A required pointer argument was null.
    NullArgument,
    /// A descriptor that must be open was not.
    BadFd(i32),
    /// Unrecognised syscall number under the terminate policy.
    UnknownSyscall(u32),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAddress(addr) => write!(f, "bad user address {}", addr),
            Self::NullArgument => write!(f, "null pointer argument"),
            Self::BadFd(fd) => write!(f, "file descriptor {} not open", fd),
            Self::UnknownSyscall(n) => write!(f, "unknown syscall {}", n),
        }
    }
}
