//! System call numbers
//!
//! The numeric codes are part of the user ABI and must not change.

/// A recognised system call.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallNumber {
    /// Power the machine off.
    Halt = 0,
    /// Terminate the calling process.
    Exit = 1,
    /// Start a new process.
    Exec = 2,
    /// Wait for a child process to exit.
    Wait = 3,
    /// Create a file.
    Create = 4,
    /// Delete a file.
    Remove = 5,
    /// Open a file.
    Open = 6,
    /// Size of an open file.
    Filesize = 7,
    /// Read from a descriptor.
    Read = 8,
    /// Write to a descriptor.
    Write = 9,
    /// Move a file cursor.
    Seek = 10,
    /// Report a file cursor.
    Tell = 11,
    /// Close a descriptor.
    Close = 12,
}

impl SyscallNumber {
    /// Decode a raw syscall number.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            _ => return None,
        })
    }

    /// Number of argument words the call takes.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }
}
