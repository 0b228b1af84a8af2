//! System Call Interface
//!
//! The boundary between untrusted user code and the kernel.
//!
//! # Security Model
//! - The call frame is read only through validated word slots
//! - All pointer arguments are validated before use
//! - Invalid inputs terminate the caller with -1, never the kernel
//! - File content access is serialized by one global lock
//!
//! # Syscalls
//! halt, exit, exec, wait, create, remove, open, filesize, read, write,
//! seek, tell, close (see [`SyscallNumber`])

mod error;
mod frame;
mod handler;
mod number;
mod validate;


pub use error::Fault;
pub use frame::{decode, Args, Decoded, TrapFrame, MAX_ARGS};
pub use handler::{dispatch, Control, Kernel};
pub use number::SyscallNumber;
pub use validate::{UserBuffer, UserBufferMut, UserRange, UserWord, Validator};

use crate::fs::FileSystem;
use crate::mm::UserMemory;
use crate::process::{Lifecycle, Process};

/// Syscall trap entry.
///
/// Dispatches the call and, if the process exited or the machine is
/// halting, leaves through `lifecycle` instead of returning to user mode.
pub fn handle_trap<FS, M, L>(
    kernel: &Kernel<'_, FS>,
    process: &mut Process<FS::File>,
    mem: &mut M,
    frame: &mut TrapFrame,
    lifecycle: &L,
) where
    FS: FileSystem,
    M: UserMemory + ?Sized,
    L: Lifecycle + ?Sized,
{
    match dispatch(kernel, process, mem, frame) {
        Control::Resume => {}
        Control::Exit(_) => lifecycle.thread_exit(),
        Control::Halt => {
            log::info!("[SYSCALL] {}: halt", process.name());
            lifecycle.power_off()
        }
    }
}
